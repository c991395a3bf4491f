//! In-memory database, connections, and transactions
//!
//! [`MemoryDb`] owns the shared state: the entity table behind a
//! `parking_lot::RwLock`, the internal-id counter, and the monotonic clock.
//! Connections are cheap clones of the shared handle.
//!
//! # Transaction model
//!
//! A transaction stages a full copy of the table at begin time. Writes apply
//! to the staged copy; commit publishes the copy wholesale, rollback (or
//! dropping the handle) discards it. Identity and timestamps still come from
//! the shared counter and clock, so ids stay unique even across rolled-back
//! transactions.
//!
//! This is the cloned-snapshot approach: simple, correct for the
//! one-manager-per-call-chain usage this core prescribes, and not a
//! concurrency-control implementation. The last committer wins.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::debug;

use plinth_core::{
    Connection, Entity, InternalId, QueryPlan, Result, SelectQuery, StorageHandle, Timestamp,
    TxnHandle, WriteOutcome,
};

use crate::clock::MonotonicClock;
use crate::table::EntityTable;

#[derive(Debug)]
struct DbInner {
    table: RwLock<EntityTable>,
    next_id: AtomicI64,
    clock: MonotonicClock,
}

impl DbInner {
    fn allocate_id(&self) -> InternalId {
        InternalId::from_raw(self.next_id.fetch_add(1, Ordering::SeqCst) + 1)
    }

    fn now(&self) -> Timestamp {
        self.clock.now()
    }
}

/// The shared in-memory database
#[derive(Debug, Clone)]
pub struct MemoryDb {
    inner: Arc<DbInner>,
}

impl MemoryDb {
    /// Create an empty database
    pub fn new() -> Self {
        MemoryDb {
            inner: Arc::new(DbInner {
                table: RwLock::new(EntityTable::new()),
                next_id: AtomicI64::new(0),
                clock: MonotonicClock::new(),
            }),
        }
    }

    /// Open a connection
    ///
    /// Connections share the database state; each call chain should hold its
    /// own connection (and its own manager).
    pub fn connect(&self) -> MemoryConn {
        MemoryConn {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for MemoryDb {
    fn default() -> Self {
        MemoryDb::new()
    }
}

/// A connection to the in-memory database
///
/// Plans executed directly on the connection apply immediately (autocommit);
/// the engine only takes this path in its explicit unsafe test mode.
pub struct MemoryConn {
    inner: Arc<DbInner>,
}

impl StorageHandle for MemoryConn {
    fn execute_insert(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        let id = self.inner.allocate_id();
        let now = self.inner.now();
        self.inner.table.write().insert(plan, id, now)
    }

    fn execute_update(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        let now = self.inner.now();
        self.inner.table.write().update(plan, now)
    }

    fn execute_delete(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        let now = self.inner.now();
        self.inner.table.write().delete(plan, now)
    }

    fn execute_select(&mut self, query: &SelectQuery) -> Result<Vec<Entity>> {
        self.inner.table.read().select(query)
    }
}

impl Connection for MemoryConn {
    type Txn = MemoryTxn;

    fn begin(&mut self) -> Result<MemoryTxn> {
        let staged = self.inner.table.read().clone();
        debug!("memory transaction opened");
        Ok(MemoryTxn {
            inner: Arc::clone(&self.inner),
            staged,
        })
    }
}

/// An open transaction against the in-memory database
pub struct MemoryTxn {
    inner: Arc<DbInner>,
    staged: EntityTable,
}

impl StorageHandle for MemoryTxn {
    fn execute_insert(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        let id = self.inner.allocate_id();
        let now = self.inner.now();
        self.staged.insert(plan, id, now)
    }

    fn execute_update(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        let now = self.inner.now();
        self.staged.update(plan, now)
    }

    fn execute_delete(&mut self, plan: &QueryPlan) -> Result<WriteOutcome> {
        let now = self.inner.now();
        self.staged.delete(plan, now)
    }

    fn execute_select(&mut self, query: &SelectQuery) -> Result<Vec<Entity>> {
        self.staged.select(query)
    }
}

impl TxnHandle for MemoryTxn {
    fn commit(self) -> Result<()> {
        *self.inner.table.write() = self.staged;
        debug!("memory transaction committed");
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        // Dropping the staged copy is the rollback.
        debug!("memory transaction rolled back");
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================
