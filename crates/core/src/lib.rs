//! Core types and traits for Plinth
//!
//! This crate defines the foundational types used throughout the system:
//! - InternalId / PublicId: the dual-identifier scheme for entities
//! - ResourceName: type tag a concrete record supplies for the shared table
//! - Timestamp: microsecond-precision audit timestamps
//! - Entity: the base record every domain object embeds
//! - Record: the capability trait concrete record types implement
//! - QueryPlan and friends: declarative state-change descriptions
//! - Error: error type hierarchy
//! - Traits: storage boundary definitions (StorageHandle, Connection, TxnHandle)

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod entity;
pub mod error;
pub mod plan;
pub mod record;
pub mod timestamp;
pub mod traits;
pub mod types;

// Re-export commonly used types and traits
pub use entity::Entity;
pub use error::{Error, Result};
pub use plan::{Cardinality, Column, ExecMode, OwnerSpec, Predicate, QueryPlan, Value};
pub use record::Record;
pub use timestamp::Timestamp;
pub use traits::{
    ArchivedFilter, Connection, SelectQuery, StorageHandle, TxnHandle, WriteOutcome,
};
pub use types::{InternalId, PublicId, ResourceName};
