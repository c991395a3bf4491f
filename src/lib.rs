//! Plinth - entity persistence core
//!
//! Plinth is the persistence plinth every domain object in an application
//! stands on: a base [`Entity`] carrying identity, ownership, visibility, and
//! audit state, plus a transactional runner for the four lifecycle operations
//! (create, update, archive, purge).
//!
//! # Quick Start
//!
//! ```
//! use plinth::{Entity, EntityManager, EngineConfig, MemoryDb, Record, ResourceName};
//!
//! struct Widget {
//!     entity: Entity,
//! }
//!
//! impl Record for Widget {
//!     fn entity(&self) -> &Entity { &self.entity }
//!     fn entity_mut(&mut self) -> &mut Entity { &mut self.entity }
//!     fn is_concrete(&self) -> bool { true }
//! }
//!
//! # fn main() -> plinth::Result<()> {
//! let db = MemoryDb::new();
//! let mut mgr = EntityManager::new(db.connect(), EngineConfig::default());
//!
//! let mut widget = Widget {
//!     entity: Entity::new(ResourceName::new("widget"), "alpha", "first", None, false),
//! };
//!
//! mgr.begin_transaction()?;
//! mgr.create_raw(&mut widget)?;
//! mgr.commit_transaction()?;
//!
//! assert!(widget.entity().is_persisted());
//! # Ok(())
//! # }
//! ```
//!
//! # Architecture
//!
//! All state changes go through an [`EntityManager`], which owns at most one
//! active transaction and refuses to issue a write without one (unless the
//! unsafe test mode is explicitly enabled). The manager delegates to the
//! state runner, which executes each operation's declarative query plans in
//! order against the storage boundary defined in `plinth-core`.
//!
//! The in-memory reference backend ([`MemoryDb`]) exists so the full
//! lifecycle can be exercised without a relational engine; production
//! deployments supply their own implementation of the storage traits.

// Re-export the public API.
pub use plinth_core::{
    ArchivedFilter, Cardinality, Column, Connection, Entity, Error, ExecMode, InternalId,
    OwnerSpec, Predicate, PublicId, QueryPlan, Record, ResourceName, Result, SelectQuery,
    StorageHandle, Timestamp, TxnHandle, Value, WriteOutcome,
};

pub use plinth_engine::{
    fetch, list, must_fetch, DeployMode, EngineConfig, EntityManager, StateOp,
};

pub use plinth_storage::{MemoryConn, MemoryDb, MemoryTxn};
