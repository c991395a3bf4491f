//! The transaction manager
//!
//! Owns the mapping from "logical state change" to "physical transaction"
//! and prevents unsafe out-of-transaction writes.
//!
//! ## State machine
//!
//! `idle` (no active transaction) → `active` (one transaction open) → `idle`
//! (committed or rolled back). Exactly one transaction may be active per
//! manager instance; concurrent logical operations each own their own
//! manager, and therefore never share a transaction handle.
//!
//! ## The safety gate
//!
//! No state mutation is reachable without either an active transaction or
//! the explicit, named unsafe opt-out. The gate fires before any plan is
//! built, so a refused operation issues zero queries.

use tracing::{debug, warn};

use plinth_core::{
    Connection, Entity, Error, Record, Result, SelectQuery, StorageHandle, TxnHandle,
};

use crate::config::{DeployMode, EngineConfig};
use crate::ops::StateOp;
use crate::retrieve;
use crate::runner::run_state_op;

/// Owns one connection, at most one active transaction, and the engine
/// configuration
pub struct EntityManager<C: Connection> {
    conn: C,
    txn: Option<C::Txn>,
    config: EngineConfig,
}

impl<C: Connection> EntityManager<C> {
    /// Create a manager over a connection
    pub fn new(conn: C, config: EngineConfig) -> Self {
        EntityManager {
            conn,
            txn: None,
            config,
        }
    }

    /// The engine configuration in force
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Whether a transaction is currently active
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    // =========================================================================
    // Transaction lifecycle
    // =========================================================================

    /// Open a transaction
    ///
    /// # Errors
    /// [`Error::Protocol`] if one is already active.
    pub fn begin_transaction(&mut self) -> Result<()> {
        if self.txn.is_some() {
            return Err(Error::Protocol(
                "begin with a transaction already active".to_string(),
            ));
        }
        let txn = self.conn.begin()?;
        debug!("transaction opened");
        self.txn = Some(txn);
        Ok(())
    }

    /// Commit the active transaction
    ///
    /// The handle is taken out of the manager before the commit is
    /// attempted, so a failed commit cannot leave a stale handle behind:
    /// either way the manager is idle afterwards.
    ///
    /// # Errors
    /// [`Error::Protocol`] if no transaction is active; otherwise whatever
    /// the backend's commit reports.
    pub fn commit_transaction(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or_else(|| {
            Error::Protocol("commit with no active transaction".to_string())
        })?;
        debug!("transaction committing");
        txn.commit()
    }

    /// Roll the active transaction back
    ///
    /// Transitions to idle unconditionally.
    ///
    /// # Errors
    /// [`Error::Protocol`] if no transaction is active; otherwise whatever
    /// the backend's rollback reports.
    pub fn rollback_transaction(&mut self) -> Result<()> {
        let txn = self.txn.take().ok_or_else(|| {
            Error::Protocol("rollback with no active transaction".to_string())
        })?;
        debug!("transaction rolling back");
        txn.rollback()
    }

    // =========================================================================
    // State changes
    // =========================================================================

    /// Persist a new record
    ///
    /// # Errors
    /// - [`Error::Validation`] for a non-concrete record in production
    /// - [`Error::Protocol`] when idle without unsafe mode
    /// - runner errors ([`Error::Integrity`], [`Error::Backend`])
    pub fn create_raw(&mut self, record: &mut dyn Record) -> Result<()> {
        if !record.is_concrete() && self.config.deploy_mode == DeployMode::Production {
            return Err(Error::Validation(
                "attempt to create a non-concrete entity in production".to_string(),
            ));
        }
        self.run(record, StateOp::Create)
    }

    /// Persist the caller-editable columns of an existing record
    ///
    /// # Errors
    /// - [`Error::Validation`] for a record that was never persisted
    /// - [`Error::Protocol`] when idle without unsafe mode
    /// - runner errors
    pub fn update_raw(&mut self, record: &mut dyn Record) -> Result<()> {
        self.require_persisted(record, StateOp::Update)?;
        self.run(record, StateOp::Update)
    }

    /// Archive (soft-delete) an existing record
    ///
    /// # Errors
    /// - [`Error::Conflict`] if the record is already archived. Archive is
    ///   not idempotent; a repeat archive is a caller bug, not a no-op
    /// - [`Error::Validation`] for a record that was never persisted
    /// - [`Error::Protocol`] when idle without unsafe mode
    /// - runner errors
    pub fn archive_raw(&mut self, record: &mut dyn Record) -> Result<()> {
        self.require_persisted(record, StateOp::Archive)?;
        if record.entity().is_archived() {
            return Err(Error::conflict(
                StateOp::Archive.name(),
                Entity::TABLE,
                "entity is already archived",
            ));
        }
        self.run(record, StateOp::Archive)
    }

    /// Permanently remove an archived record
    ///
    /// Purge requires the record to be archived first; the pipeline then
    /// emits mark-then-remove so backends that need two physical statements
    /// get both under one logical purge.
    ///
    /// # Errors
    /// - [`Error::Conflict`] if the record is not archived
    /// - [`Error::Validation`] for a record that was never persisted
    /// - [`Error::Protocol`] when idle without unsafe mode
    /// - runner errors
    pub fn purge_raw(&mut self, record: &mut dyn Record) -> Result<()> {
        self.require_persisted(record, StateOp::Purge)?;
        if !record.entity().is_archived() {
            return Err(Error::conflict(
                StateOp::Purge.name(),
                Entity::TABLE,
                "entity is not archived",
            ));
        }
        self.run(record, StateOp::Purge)
    }

    // =========================================================================
    // Retrievals
    // =========================================================================

    /// Optional single retrieval with the current handle
    ///
    /// # Errors
    /// See [`retrieve::fetch`].
    pub fn fetch(&mut self, query: &SelectQuery) -> Result<Option<Entity>> {
        retrieve::fetch(self.read_handle(), query)
    }

    /// Required single retrieval with the current handle
    ///
    /// # Errors
    /// See [`retrieve::must_fetch`].
    pub fn must_fetch(&mut self, query: &SelectQuery) -> Result<Entity> {
        retrieve::must_fetch(self.read_handle(), query)
    }

    /// List retrieval with the current handle
    ///
    /// # Errors
    /// See [`retrieve::list`].
    pub fn list(&mut self, query: &SelectQuery) -> Result<Vec<Entity>> {
        retrieve::list(self.read_handle(), query)
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn run(&mut self, record: &mut dyn Record, op: StateOp) -> Result<()> {
        let config = self.config;
        let handle = self.write_handle(op)?;
        run_state_op(handle, record, op, &config)
    }

    /// The gate: a write handle exists only inside a transaction, or through
    /// the explicit unsafe opt-out.
    fn write_handle(&mut self, op: StateOp) -> Result<&mut dyn StorageHandle> {
        match self.txn {
            Some(ref mut txn) => Ok(txn),
            None if self.config.unsafe_writes => {
                warn!(
                    operation = op.name(),
                    "state change outside a transaction (unsafe mode)"
                );
                Ok(&mut self.conn)
            }
            None => Err(Error::Protocol(format!(
                "{} requires an active transaction (or the unsafe-writes opt-out)",
                op.name()
            ))),
        }
    }

    /// Reads run in the active transaction when there is one, else directly
    /// on the connection.
    fn read_handle(&mut self) -> &mut dyn StorageHandle {
        match self.txn {
            Some(ref mut txn) => txn,
            None => &mut self.conn,
        }
    }

    fn require_persisted(&self, record: &dyn Record, op: StateOp) -> Result<()> {
        if record.entity().is_persisted() {
            Ok(())
        } else {
            Err(Error::Validation(format!(
                "{} requires a persisted entity",
                op.name()
            )))
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
