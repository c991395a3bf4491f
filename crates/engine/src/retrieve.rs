//! Retrieval operations
//!
//! Retrieve ops:
//! - always have a single query
//! - single retrievals may allow 0 rows ([`fetch`]) or require 1
//!   ([`must_fetch`])
//! - lists may return any number ([`list`])
//!
//! Reads are safe outside a transaction, so these take whatever handle the
//! caller supplies and are not gated the way state changes are.

use plinth_core::{Entity, Error, Result, SelectQuery, StorageHandle};

/// Optional single retrieval: zero rows is a valid answer
///
/// # Errors
/// Returns [`Error::Integrity`] if the query matched more than one row;
/// a single retrieval with a predicate that wide is a caller bug.
pub fn fetch(handle: &mut dyn StorageHandle, query: &SelectQuery) -> Result<Option<Entity>> {
    let mut rows = handle.execute_select(query)?;
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        n => Err(Error::Integrity {
            operation: "retrieve",
            table: Entity::TABLE,
            rows_affected: n as u64,
        }),
    }
}

/// Required single retrieval: zero rows is [`Error::NotFound`]
///
/// # Errors
/// As [`fetch`], plus [`Error::NotFound`] when nothing matched.
pub fn must_fetch(handle: &mut dyn StorageHandle, query: &SelectQuery) -> Result<Entity> {
    fetch(handle, query)?.ok_or(Error::NotFound {
        table: Entity::TABLE,
    })
}

/// List retrieval: any number of rows
///
/// # Errors
/// Returns an error only if the underlying select fails.
pub fn list(handle: &mut dyn StorageHandle, query: &SelectQuery) -> Result<Vec<Entity>> {
    handle.execute_select(query)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testkit::ScriptedHandle;
    use plinth_core::{Predicate, PublicId, ResourceName};

    fn row(name: &str) -> Entity {
        Entity::new(ResourceName::new("widget"), name, "", None, false)
    }

    fn by_pub() -> SelectQuery {
        SelectQuery::live(Predicate::ByPublicId(PublicId::generate()))
    }

    #[test]
    fn test_fetch_zero_rows_is_none_not_an_error() {
        let mut handle = ScriptedHandle::new();
        handle.push_select(vec![]);
        assert!(fetch(&mut handle, &by_pub()).unwrap().is_none());
    }

    #[test]
    fn test_fetch_one_row() {
        let mut handle = ScriptedHandle::new();
        handle.push_select(vec![row("only")]);
        let entity = fetch(&mut handle, &by_pub()).unwrap().unwrap();
        assert_eq!(entity.name(), "only");
    }

    #[test]
    fn test_fetch_many_rows_is_an_integrity_fault() {
        let mut handle = ScriptedHandle::new();
        handle.push_select(vec![row("a"), row("b")]);
        let err = fetch(&mut handle, &by_pub()).unwrap_err();
        assert!(matches!(
            err,
            Error::Integrity {
                operation: "retrieve",
                rows_affected: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_must_fetch_zero_rows_is_not_found() {
        let mut handle = ScriptedHandle::new();
        handle.push_select(vec![]);
        let err = must_fetch(&mut handle, &by_pub()).unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[test]
    fn test_list_returns_everything() {
        let mut handle = ScriptedHandle::new();
        handle.push_select(vec![row("a"), row("b"), row("c")]);
        let rows = list(&mut handle, &SelectQuery::live(Predicate::All)).unwrap();
        assert_eq!(rows.len(), 3);
    }
}
