//! The state operation set
//!
//! The four lifecycle operations (create, update, archive, purge) are a
//! fixed enumeration. Each kind pairs a name (used in error context) with a
//! pure plan-builder function, held in a read-only table built once at
//! process start. The operations are stateless strategies: all state lives
//! in the entity and the storage handle.
//!
//! State ops:
//! - potentially have multiple plans (purge is mark-then-remove)
//! - should, at most, affect 1 row per plan
//! - must run inside a transaction (outside test harnesses)

use once_cell::sync::Lazy;

use plinth_core::{Column, Entity, OwnerSpec, Predicate, QueryPlan, Value};

use crate::config::EngineConfig;

/// The four entity lifecycle operations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateOp {
    /// Insert a new row, assigning identity and resolving ownership
    Create,
    /// Rewrite the caller-editable columns of one row
    Update,
    /// Soft-delete one row
    Archive,
    /// Permanently remove one (pre-archived) row
    Purge,
}

struct OpSpec {
    name: &'static str,
    build: fn(&Entity, &EngineConfig) -> Vec<QueryPlan>,
}

// Indexed by StateOp discriminant; order must match the enum.
static STATE_OPS: Lazy<[OpSpec; 4]> = Lazy::new(|| {
    [
        OpSpec {
            name: "create",
            build: create_plans,
        },
        OpSpec {
            name: "update",
            build: update_plans,
        },
        OpSpec {
            name: "archive",
            build: archive_plans,
        },
        OpSpec {
            name: "purge",
            build: purge_plans,
        },
    ]
});

impl StateOp {
    /// The operation's name, as used in error context
    pub fn name(self) -> &'static str {
        self.spec().name
    }

    /// Build the operation's plans for an entity, in execution order
    pub fn plans(self, entity: &Entity, config: &EngineConfig) -> Vec<QueryPlan> {
        (self.spec().build)(entity, config)
    }

    fn spec(self) -> &'static OpSpec {
        &STATE_OPS[self as usize]
    }
}

fn writable_columns(entity: &Entity) -> Vec<(Column, Value)> {
    vec![
        (Column::Name, Value::Text(entity.name().to_string())),
        (
            Column::Description,
            Value::Text(entity.description().to_string()),
        ),
        (
            Column::PubliclyReadable,
            Value::Bool(entity.is_publicly_readable()),
        ),
    ]
}

/// One insert carrying the writable columns and the ownership directive.
///
/// Owner linkage is embedded in the insert so creation is atomic with owner
/// resolution; self-ownership is left to the storage-side default to avoid a
/// race between "own id assigned" and "owner set".
fn create_plans(entity: &Entity, _config: &EngineConfig) -> Vec<QueryPlan> {
    let mut writes = vec![(
        Column::ResourceName,
        Value::Text(entity.resource_name().as_str().to_string()),
    )];
    writes.extend(writable_columns(entity));

    let owner = match entity.owner_public_id() {
        Some(pub_id) => OwnerSpec::Resolve(pub_id),
        None => OwnerSpec::SelfOwned,
    };

    vec![QueryPlan::insert(
        Entity::TABLE,
        writes,
        owner,
        vec![
            Column::Id,
            Column::PubId,
            Column::OwnerId,
            Column::CreatedAt,
            Column::LastUpdated,
        ],
    )]
}

/// One update matching by internal identity.
///
/// `last_updated` is always read back; `deleted_at` only when the engine is
/// configured to treat it as trigger-mutable on this backend.
fn update_plans(entity: &Entity, config: &EngineConfig) -> Vec<QueryPlan> {
    let mut returning = vec![Column::LastUpdated];
    if config.update_refreshes_deleted {
        returning.push(Column::DeletedAt);
    }
    vec![QueryPlan::update(
        Entity::TABLE,
        Predicate::ById(entity.internal_id()),
        writable_columns(entity),
        returning,
    )]
}

fn archive_plans(entity: &Entity, _config: &EngineConfig) -> Vec<QueryPlan> {
    vec![QueryPlan::soft_delete(
        Entity::TABLE,
        Predicate::ById(entity.internal_id()),
        vec![Column::LastUpdated, Column::DeletedAt],
    )]
}

/// Mark, then remove, in declared order: backends that require "mark then
/// remove" as two physical statements get both under one logical purge, and
/// the hard delete only ever sees a pre-archived row.
fn purge_plans(entity: &Entity, _config: &EngineConfig) -> Vec<QueryPlan> {
    let predicate = Predicate::ById(entity.internal_id());
    vec![
        QueryPlan::soft_delete(Entity::TABLE, predicate, vec![Column::DeletedAt]),
        QueryPlan::hard_delete(Entity::TABLE, predicate),
    ]
}

// ============================================================================
// Tests
// ============================================================================
