//! Identifier types for entities
//!
//! Entities have dual identity:
//! - **InternalId**: numeric, storage-assigned, used only inside the storage
//!   layer for joins and predicates. Never serialized to external consumers.
//! - **PublicId**: opaque, globally-unique, assigned exactly once by storage
//!   at creation. Safe to expose; the only identifier external callers ever
//!   supply.
//!
//! InternalId is the "which row", PublicId is the "which thing".
//!
//! A third newtype, [`ResourceName`], is the type tag a concrete record type
//! supplies so records of different kinds can share the `entities` table.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Storage-assigned numeric key for an entity
///
/// InternalIds are monotonically ordered and assigned exactly once by the
/// storage layer on creation. The zero value means "not yet persisted".
///
/// ## Invariants
///
/// - Never accepted as client input; only ever produced by storage
/// - Never serialized on the external JSON contract (the Entity field
///   carries `#[serde(skip)]`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InternalId(i64);

impl InternalId {
    /// The blank value: no storage row has been assigned yet
    pub const UNSET: InternalId = InternalId(0);

    /// Create an InternalId from a raw storage key
    ///
    /// Only the storage layer has a legitimate reason to call this.
    #[inline]
    pub const fn from_raw(raw: i64) -> Self {
        InternalId(raw)
    }

    /// Get the raw storage key
    #[inline]
    pub const fn as_raw(&self) -> i64 {
        self.0
    }

    /// Check whether storage has assigned this id
    #[inline]
    pub const fn is_set(&self) -> bool {
        self.0 != 0
    }
}

impl Default for InternalId {
    fn default() -> Self {
        InternalId::UNSET
    }
}

impl fmt::Display for InternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque, externally-safe identifier for an entity
///
/// A PublicId is a wrapper around a UUID v4, assigned once by storage at
/// creation time and immutable thereafter. The nil UUID means "not yet
/// persisted".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PublicId(Uuid);

impl PublicId {
    /// The blank value: storage has not assigned an id yet
    pub const UNSET: PublicId = PublicId(Uuid::nil());

    /// Generate a fresh random PublicId
    ///
    /// Called by the storage layer when a row is created; application code
    /// never assigns public ids itself.
    pub fn generate() -> Self {
        PublicId(Uuid::new_v4())
    }

    /// Parse a PublicId from its string representation
    ///
    /// Accepts standard UUID format (with or without hyphens).
    /// Returns None if the string is not a valid UUID.
    pub fn from_string(s: &str) -> Option<Self> {
        Uuid::parse_str(s).ok().map(PublicId)
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Check whether storage has assigned this id
    pub fn is_set(&self) -> bool {
        !self.0.is_nil()
    }
}

impl Default for PublicId {
    fn default() -> Self {
        PublicId::UNSET
    }
}

impl fmt::Display for PublicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Type tag for concrete record kinds sharing the entities table
///
/// Every concrete record type reports a ResourceName (e.g. "widget",
/// "account"). The tag is persisted with the row so retrievals can
/// disambiguate records of different kinds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceName(String);

impl ResourceName {
    /// Create a resource name
    pub fn new(name: impl Into<String>) -> Self {
        ResourceName(name.into())
    }

    /// Get the name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Tests
// ============================================================================
