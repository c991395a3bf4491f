//! Declarative query plans for state operations
//!
//! A state operation never talks to storage through a fluent query builder.
//! Instead it produces one or more [`QueryPlan`] values: small tagged
//! descriptions of "which predicate, which columns to write, which columns to
//! read back, applied how". The state runner hands each plan to the
//! storage boundary. This keeps the runner decoupled from any query API and
//! makes plans trivially constructible in tests.
//!
//! ## Schema contract
//!
//! [`Column`] enumerates the persisted schema external implementers must
//! preserve for compatibility: table `entities`, primary key `id` (internal),
//! unique-not-null `pub_id` (public), not-null `owner_id`, not-null
//! `publicly_readable`, timestamps `created_at` / `last_updated` /
//! `deleted_at` (the latter nullable, null = live).

use crate::timestamp::Timestamp;
use crate::types::{InternalId, PublicId};

/// Columns of the `entities` table
///
/// The explicit enumeration replaces any runtime field introspection: code
/// that needs to know which columns exist matches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Column {
    /// Primary key; internal identifier
    Id,
    /// Unique public identifier
    PubId,
    /// Concrete record type tag
    ResourceName,
    /// Display name
    Name,
    /// Free-form description
    Description,
    /// Internal id of the owning entity (self for self-owned)
    OwnerId,
    /// World-readability flag
    PubliclyReadable,
    /// Creation timestamp
    CreatedAt,
    /// Last state-change timestamp
    LastUpdated,
    /// Archival timestamp; null = live
    DeletedAt,
}

impl Column {
    /// The persisted column name
    pub const fn as_str(&self) -> &'static str {
        match self {
            Column::Id => "id",
            Column::PubId => "pub_id",
            Column::ResourceName => "resource_name",
            Column::Name => "name",
            Column::Description => "description",
            Column::OwnerId => "owner_id",
            Column::PubliclyReadable => "publicly_readable",
            Column::CreatedAt => "created_at",
            Column::LastUpdated => "last_updated",
            Column::DeletedAt => "deleted_at",
        }
    }
}

/// Cell value for a plan's writes and read-backs
///
/// Identifier and timestamp cells stay strongly typed end to end; there are
/// no implicit coercions between variants.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// SQL NULL
    Null,
    /// Boolean cell
    Bool(bool),
    /// Text cell
    Text(String),
    /// Internal identifier cell
    Id(InternalId),
    /// Public identifier cell
    Pub(PublicId),
    /// Timestamp cell
    Time(Timestamp),
}

/// Row-matching predicate for a plan
///
/// State plans match by internal identity; retrievals may also match by
/// public identity, since that is the only identifier external callers hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Predicate {
    /// Match every row (only meaningful for list retrievals)
    All,
    /// Match the single row with this internal id
    ById(InternalId),
    /// Match the single row with this public id
    ByPublicId(PublicId),
}

/// How a plan is applied at the storage boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecMode {
    /// Insert a new row
    Insert,
    /// Update rows matching the predicate
    Update,
    /// Mark rows matching the predicate as archived
    SoftDelete,
    /// Permanently remove rows matching the predicate
    HardDelete,
}

/// Whether a plan is expected to touch one entity or many
///
/// Explicit, rather than inferred from a value's shape: the single-row
/// invariant is only enforced for `Single` plans.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    /// At most one row may be affected
    Single,
    /// Any number of rows may be affected
    Many,
}

/// Ownership directive embedded in an insert plan
///
/// Owner linkage is part of the insert itself so creation is atomic with
/// owner resolution: there is never a window where a row exists with an
/// unresolved owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnerSpec {
    /// The new row owns itself: storage sets `owner_id` to the id it just
    /// assigned, as a storage-side default in the same round trip
    SelfOwned,
    /// Resolve this public id to an existing row's internal id and store it
    /// as `owner_id`; the insert fails if no such row exists
    Resolve(PublicId),
}

/// One declarative storage operation
///
/// Built by the state-operation set, executed by the state runner. Plans
/// within one operation execute strictly in declared order, because later
/// plans may depend on identifiers assigned by earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryPlan {
    /// Target table
    pub table: &'static str,
    /// How the plan is applied
    pub mode: ExecMode,
    /// Single-entity or bulk
    pub cardinality: Cardinality,
    /// Which rows the plan touches (ignored for inserts)
    pub predicate: Predicate,
    /// Columns to write, with their values
    pub writes: Vec<(Column, Value)>,
    /// Ownership directive (insert plans only)
    pub owner: Option<OwnerSpec>,
    /// Columns storage must hand back after applying the plan
    pub returning: Vec<Column>,
}

impl QueryPlan {
    /// Build an insert plan
    pub fn insert(
        table: &'static str,
        writes: Vec<(Column, Value)>,
        owner: OwnerSpec,
        returning: Vec<Column>,
    ) -> Self {
        QueryPlan {
            table,
            mode: ExecMode::Insert,
            cardinality: Cardinality::Single,
            predicate: Predicate::All,
            writes,
            owner: Some(owner),
            returning,
        }
    }

    /// Build a single-row update plan
    pub fn update(
        table: &'static str,
        predicate: Predicate,
        writes: Vec<(Column, Value)>,
        returning: Vec<Column>,
    ) -> Self {
        QueryPlan {
            table,
            mode: ExecMode::Update,
            cardinality: Cardinality::Single,
            predicate,
            writes,
            owner: None,
            returning,
        }
    }

    /// Build a single-row soft-delete (archive) plan
    pub fn soft_delete(table: &'static str, predicate: Predicate, returning: Vec<Column>) -> Self {
        QueryPlan {
            table,
            mode: ExecMode::SoftDelete,
            cardinality: Cardinality::Single,
            predicate,
            writes: Vec::new(),
            owner: None,
            returning,
        }
    }

    /// Build a single-row hard-delete (purge) plan
    pub fn hard_delete(table: &'static str, predicate: Predicate) -> Self {
        QueryPlan {
            table,
            mode: ExecMode::HardDelete,
            cardinality: Cardinality::Single,
            predicate,
            writes: Vec::new(),
            owner: None,
            returning: Vec::new(),
        }
    }

    /// Look up the value this plan writes to a column, if any
    pub fn write_value(&self, column: Column) -> Option<&Value> {
        self.writes.iter().find(|(c, _)| *c == column).map(|(_, v)| v)
    }
}

// ============================================================================
// Tests
// ============================================================================
