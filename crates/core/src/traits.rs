//! Storage boundary traits
//!
//! The core consumes a generic "relational transaction/connection"
//! capability. These traits define that boundary so backends can be swapped
//! without breaking the engine: the reference in-memory backend implements
//! them for tests, and a production deployment wires them to a real
//! relational engine.
//!
//! A [`StorageHandle`] executes one plan at a time; [`Connection`] adds the
//! ability to open a transaction, and [`TxnHandle`] is a handle whose effects
//! only become visible on commit.

use crate::entity::Entity;
use crate::error::Result;
use crate::plan::{Column, Predicate, QueryPlan, Value};

/// Outcome of applying one write plan
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    /// How many rows the plan affected
    pub rows_affected: u64,
    /// Columns the plan asked storage to hand back, with their values
    ///
    /// Empty unless exactly one row was affected; read-backs are only
    /// meaningful for single-row plans.
    pub returned: Vec<(Column, Value)>,
}

impl WriteOutcome {
    /// An outcome that affected nothing and returned nothing
    pub fn none() -> Self {
        WriteOutcome {
            rows_affected: 0,
            returned: Vec::new(),
        }
    }
}

/// Which rows a retrieval sees with respect to archival
///
/// Default retrieval excludes archived rows; reaching them is an explicit
/// opt-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArchivedFilter {
    /// Only live rows (`deleted_at` null); the default
    #[default]
    Live,
    /// Only archived rows
    Archived,
    /// Live and archived rows alike
    Any,
}

/// A read-only, single-query retrieval description
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectQuery {
    /// Which rows to match
    pub predicate: Predicate,
    /// Archival visibility
    pub archived: ArchivedFilter,
}

impl SelectQuery {
    /// Retrieve live rows matching a predicate
    pub fn live(predicate: Predicate) -> Self {
        SelectQuery {
            predicate,
            archived: ArchivedFilter::Live,
        }
    }

    /// Retrieve rows matching a predicate regardless of archival
    pub fn any(predicate: Predicate) -> Self {
        SelectQuery {
            predicate,
            archived: ArchivedFilter::Any,
        }
    }

    /// Retrieve only archived rows matching a predicate
    pub fn archived(predicate: Predicate) -> Self {
        SelectQuery {
            predicate,
            archived: ArchivedFilter::Archived,
        }
    }
}

/// Executes individual query plans against live storage
///
/// Implementations report faults through their own error values; the state
/// runner wraps them with operation/table context. Row counts are reported
/// honestly; the single-row invariant is enforced above this boundary, not
/// inside it.
pub trait StorageHandle {
    /// Insert a new row
    ///
    /// Storage assigns the internal id, the public id, and the creation
    /// timestamps, resolves the plan's [`crate::plan::OwnerSpec`] in the same
    /// round trip, and hands back the columns the plan's `returning` names.
    ///
    /// # Errors
    /// Returns an error if the insert fails, including when an owner public
    /// id does not resolve to an existing row.
    fn execute_insert(&mut self, plan: &QueryPlan) -> Result<WriteOutcome>;

    /// Update rows matching the plan's predicate
    ///
    /// # Errors
    /// Returns an error if the storage operation fails.
    fn execute_update(&mut self, plan: &QueryPlan) -> Result<WriteOutcome>;

    /// Soft- or hard-delete rows matching the plan's predicate, per the
    /// plan's [`crate::plan::ExecMode`]
    ///
    /// A soft delete marks live rows archived; a hard delete permanently
    /// removes rows that are already archived.
    ///
    /// # Errors
    /// Returns an error if the storage operation fails.
    fn execute_delete(&mut self, plan: &QueryPlan) -> Result<WriteOutcome>;

    /// Retrieve entities matching a query
    ///
    /// Zero rows is a valid result; required-row semantics live in the
    /// retrieval operations, not here.
    ///
    /// # Errors
    /// Returns an error if the storage operation fails.
    fn execute_select(&mut self, query: &SelectQuery) -> Result<Vec<Entity>>;
}

/// A connection that can open transactions
///
/// Executing plans directly on the connection applies them immediately
/// (autocommit); the engine only does that in its explicit unsafe test mode.
pub trait Connection: StorageHandle {
    /// The transaction handle type this connection produces
    type Txn: TxnHandle;

    /// Open a new transaction
    ///
    /// # Errors
    /// Returns an error if the backend cannot open a transaction.
    fn begin(&mut self) -> Result<Self::Txn>;
}

/// An open transaction
///
/// Effects applied through the handle become visible to other connections
/// only on [`TxnHandle::commit`]; dropping the handle or calling
/// [`TxnHandle::rollback`] discards them.
pub trait TxnHandle: StorageHandle {
    /// Commit the transaction, publishing its effects
    ///
    /// Consumes the handle either way: a failed commit leaves no usable
    /// transaction behind.
    ///
    /// # Errors
    /// Returns an error if the backend fails to commit.
    fn commit(self) -> Result<()>;

    /// Roll the transaction back, discarding its effects
    ///
    /// # Errors
    /// Returns an error if the backend fails to roll back.
    fn rollback(self) -> Result<()>;
}

// ============================================================================
// Tests
// ============================================================================
