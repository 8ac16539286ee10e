//! The seam between the catalog model and whatever reads the catalog.
//!
//! Entities never hold a connection. Each collection accessor takes a
//! [`CatalogSource`] and consults it only when the collection has not been
//! loaded yet; the loaded value is kept for the lifetime of the entity.

use std::cell::OnceCell;

use crate::types::{Column, Constraint, Index, Relation};

/// Loads the child collections of catalog entities.
///
/// Implemented by the live catalog reader. Graphs rebuilt from a comment
/// document have every collection pre-loaded, so a source is never asked
/// for anything while synchronizing them.
pub trait CatalogSource {
    /// Error returned when a catalog read fails.
    type Error;

    /// Base tables of `schema`, ordered by name.
    fn load_tables(&self, schema: &str) -> Result<Vec<Relation>, Self::Error>;

    /// Views of `schema`, ordered by name.
    fn load_views(&self, schema: &str) -> Result<Vec<Relation>, Self::Error>;

    /// Columns of `schema.relation` in ordinal position order.
    fn load_columns(&self, schema: &str, relation: &str) -> Result<Vec<Column>, Self::Error>;

    /// Constraints defined on `schema.table`.
    fn load_constraints(&self, schema: &str, table: &str)
    -> Result<Vec<Constraint>, Self::Error>;

    /// Indexes defined on `schema.table`.
    fn load_indexes(&self, schema: &str, table: &str) -> Result<Vec<Index>, Self::Error>;
}

/// Returns the cached collection, running `load` on the first call only.
///
/// A failed load leaves the cell empty so the next call retries.
pub(crate) fn load_once<'a, T, E>(
    cell: &'a OnceCell<Vec<T>>,
    load: impl FnOnce() -> Result<Vec<T>, E>,
) -> Result<&'a [T], E> {
    if let Some(items) = cell.get() {
        return Ok(items.as_slice());
    }
    let items = load()?;
    Ok(cell.get_or_init(|| items).as_slice())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_once_runs_loader_a_single_time() {
        let cell: OnceCell<Vec<u32>> = OnceCell::new();
        let mut calls = 0;

        let first = load_once(&cell, || -> Result<_, ()> {
            calls += 1;
            Ok(vec![1, 2])
        })
        .unwrap()
        .to_vec();
        let second = load_once(&cell, || -> Result<_, ()> {
            calls += 1;
            Ok(vec![9])
        })
        .unwrap()
        .to_vec();

        assert_eq!(first, vec![1, 2]);
        assert_eq!(second, vec![1, 2]);
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_load_once_retries_after_error() {
        let cell: OnceCell<Vec<u32>> = OnceCell::new();
        assert!(load_once(&cell, || Err::<Vec<u32>, _>("boom")).is_err());
        assert!(cell.get().is_none());
        assert_eq!(load_once(&cell, || Ok::<_, &str>(vec![7])).unwrap(), &[7]);
    }
}
