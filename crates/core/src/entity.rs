//! The base entity record
//!
//! Entity is the base type for all independent records in the application
//! model. Any item which is directly retrievable, an authorization target, or
//! an authorization subject embeds an Entity. An Entity is logically abstract
//! and is never persisted alone, only as part of a concrete record type (see
//! [`crate::record::Record`]).
//!
//! ## Lifecycle
//!
//! An entity is constructed in memory fully blank: no internal id, no public
//! id, no timestamps. The create operation persists it, at which point
//! storage assigns `internal_id`, `public_id`, `created_at`, `last_updated`,
//! and the resolved `owner_internal_id`. Updates refresh `last_updated`;
//! archive sets `deleted_at`; purge removes the row entirely.
//!
//! ## External serialization
//!
//! The serde contract mirrors what external consumers may see: camelCase
//! keys, and the internal identifiers are skipped outright. They exist only
//! inside the storage layer and are never echoed to clients.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::plan::{Column, Value};
use crate::timestamp::Timestamp;
use crate::types::{InternalId, PublicId, ResourceName};

/// The base record: identity, ownership, visibility, and audit state
///
/// Carries no I/O. All storage-assigned fields start blank and are only ever
/// filled in by the state operations writing back storage's returned columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    /// Internal storage key; never exposed externally
    #[serde(skip)]
    pub internal_id: InternalId,

    /// Public identifier, assigned once by storage at creation
    #[serde(rename = "pubId")]
    pub public_id: PublicId,

    /// Concrete record type tag
    pub resource_name: ResourceName,

    /// Display name
    pub name: String,

    /// Free-form description
    pub description: String,

    /// Resolved internal id of the owner; never exposed externally
    #[serde(skip)]
    pub owner_internal_id: InternalId,

    /// Public id of the owner; `None` means the entity owns itself
    #[serde(rename = "ownerPubId")]
    pub owner_public_id: Option<PublicId>,

    /// Whether the entity is readable without an ownership check
    pub publicly_readable: bool,

    /// Creation timestamp, storage-assigned
    pub created_at: Timestamp,

    /// Timestamp of the last persisted state change, storage-assigned
    pub last_updated: Timestamp,

    /// Archival timestamp; `None` means the entity is live
    pub deleted_at: Option<Timestamp>,
}

impl Entity {
    /// The persisted table all entities share
    pub const TABLE: &'static str = "entities";

    /// Construct a blank, not-yet-persisted entity
    ///
    /// Does not contact storage. Identity and audit fields stay blank until
    /// the create operation persists the entity.
    pub fn new(
        resource_name: ResourceName,
        name: impl Into<String>,
        description: impl Into<String>,
        owner_public_id: Option<PublicId>,
        publicly_readable: bool,
    ) -> Self {
        Entity {
            internal_id: InternalId::UNSET,
            public_id: PublicId::UNSET,
            resource_name,
            name: name.into(),
            description: description.into(),
            owner_internal_id: InternalId::UNSET,
            owner_public_id,
            publicly_readable,
            created_at: Timestamp::EPOCH,
            last_updated: Timestamp::EPOCH,
            deleted_at: None,
        }
    }

    /// Duplicate this entity as a template for a new record
    ///
    /// The copy inherits name, description, owner, and visibility, but has
    /// its identity and audit fields reset to blank, including the resolved
    /// owner id, which is re-resolved from `owner_public_id` on the next
    /// create.
    pub fn clone_new(&self) -> Self {
        let mut copy = self.clone();
        copy.internal_id = InternalId::UNSET;
        copy.public_id = PublicId::UNSET;
        copy.owner_internal_id = InternalId::UNSET;
        copy.created_at = Timestamp::EPOCH;
        copy.last_updated = Timestamp::EPOCH;
        copy.deleted_at = None;
        copy
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// Internal storage key (blank until persisted)
    pub fn internal_id(&self) -> InternalId {
        self.internal_id
    }

    /// Public identifier (blank until persisted)
    pub fn public_id(&self) -> PublicId {
        self.public_id
    }

    /// Concrete record type tag
    pub fn resource_name(&self) -> &ResourceName {
        &self.resource_name
    }

    /// Display name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Free-form description
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Resolved internal id of the owner (blank until persisted)
    pub fn owner_internal_id(&self) -> InternalId {
        self.owner_internal_id
    }

    /// Public id of the owner, if one was named
    pub fn owner_public_id(&self) -> Option<PublicId> {
        self.owner_public_id
    }

    /// Whether the entity is readable without an ownership check
    pub fn is_publicly_readable(&self) -> bool {
        self.publicly_readable
    }

    /// Creation timestamp (blank until persisted)
    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    /// Last state-change timestamp (blank until persisted)
    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// Archival timestamp, if archived
    pub fn deleted_at(&self) -> Option<Timestamp> {
        self.deleted_at
    }

    /// Whether storage has assigned this entity a row
    pub fn is_persisted(&self) -> bool {
        self.internal_id.is_set()
    }

    /// Whether the entity is archived (soft-deleted)
    pub fn is_archived(&self) -> bool {
        self.deleted_at.is_some()
    }

    // =========================================================================
    // Setters (in-memory only; persistence is a separate explicit step)
    // =========================================================================

    /// Set the display name
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Set the description
    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Set world-readability
    pub fn set_publicly_readable(&mut self, readable: bool) {
        self.publicly_readable = readable;
    }

    /// Name a different owner (takes effect on the next create)
    pub fn set_owner_public_id(&mut self, owner: Option<PublicId>) {
        self.owner_public_id = owner;
    }

    // =========================================================================
    // Storage write-back
    // =========================================================================

    /// Apply columns storage handed back after executing a plan
    ///
    /// This is the only path through which storage-assigned fields (identity,
    /// audit timestamps, resolved owner) change on an in-memory entity.
    ///
    /// # Errors
    /// Returns [`Error::Storage`] if a returned value's type does not match
    /// its column.
    pub fn apply_returned(&mut self, returned: &[(Column, Value)]) -> Result<()> {
        for (column, value) in returned {
            match (column, value) {
                (Column::Id, Value::Id(id)) => self.internal_id = *id,
                (Column::PubId, Value::Pub(id)) => self.public_id = *id,
                (Column::OwnerId, Value::Id(id)) => self.owner_internal_id = *id,
                (Column::ResourceName, Value::Text(s)) => {
                    self.resource_name = ResourceName::new(s.clone())
                }
                (Column::Name, Value::Text(s)) => self.name = s.clone(),
                (Column::Description, Value::Text(s)) => self.description = s.clone(),
                (Column::PubliclyReadable, Value::Bool(b)) => self.publicly_readable = *b,
                (Column::CreatedAt, Value::Time(t)) => self.created_at = *t,
                (Column::LastUpdated, Value::Time(t)) => self.last_updated = *t,
                (Column::DeletedAt, Value::Time(t)) => self.deleted_at = Some(*t),
                (Column::DeletedAt, Value::Null) => self.deleted_at = None,
                (column, value) => {
                    return Err(Error::Storage(format!(
                        "returned column {} carried mismatched value {:?}",
                        column.as_str(),
                        value
                    )))
                }
            }
        }
        Ok(())
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn blank() -> Entity {
        Entity::new(
            ResourceName::new("widget"),
            "name",
            "description",
            None,
            false,
        )
    }

    /// An entity as it looks after storage persisted it.
    fn persisted() -> Entity {
        let mut e = blank();
        e.apply_returned(&[
            (Column::Id, Value::Id(InternalId::from_raw(7))),
            (Column::PubId, Value::Pub(PublicId::generate())),
            (Column::OwnerId, Value::Id(InternalId::from_raw(7))),
            (Column::CreatedAt, Value::Time(Timestamp::from_micros(1_000))),
            (Column::LastUpdated, Value::Time(Timestamp::from_micros(1_000))),
        ])
        .unwrap();
        e
    }

    #[test]
    fn test_new_entity_is_blank() {
        let e = blank();
        assert!(!e.is_persisted());
        assert!(!e.is_archived());
        assert_eq!(e.internal_id(), InternalId::UNSET);
        assert_eq!(e.public_id(), PublicId::UNSET);
        assert_eq!(e.owner_internal_id(), InternalId::UNSET);
        assert_eq!(e.owner_public_id(), None);
        assert_eq!(e.created_at(), Timestamp::EPOCH);
        assert_eq!(e.last_updated(), Timestamp::EPOCH);
        assert_eq!(e.deleted_at(), None);
        assert_eq!(e.name(), "name");
        assert_eq!(e.description(), "description");
        assert!(!e.is_publicly_readable());
    }

    #[test]
    fn test_clone_is_independent() {
        let original = persisted();
        let mut copy = original.clone();
        assert_eq!(original, copy);

        copy.set_name("changed");
        copy.set_description("changed too");
        copy.set_publicly_readable(true);

        assert_eq!(original.name(), "name");
        assert_eq!(original.description(), "description");
        assert!(!original.is_publicly_readable());
    }

    #[test]
    fn test_clone_new_resets_identity_and_audit_fields() {
        let mut original = persisted();
        original
            .apply_returned(&[(
                Column::DeletedAt,
                Value::Time(Timestamp::from_micros(2_000)),
            )])
            .unwrap();

        let fresh = original.clone_new();
        assert_eq!(fresh.internal_id(), InternalId::UNSET);
        assert_eq!(fresh.public_id(), PublicId::UNSET);
        assert_eq!(fresh.owner_internal_id(), InternalId::UNSET);
        assert_eq!(fresh.created_at(), Timestamp::EPOCH);
        assert_eq!(fresh.last_updated(), Timestamp::EPOCH);
        assert_eq!(fresh.deleted_at(), None);

        // Inherited fields survive.
        assert_eq!(fresh.resource_name(), original.resource_name());
        assert_eq!(fresh.name(), original.name());
        assert_eq!(fresh.description(), original.description());
        assert_eq!(fresh.owner_public_id(), original.owner_public_id());
        assert_eq!(
            fresh.is_publicly_readable(),
            original.is_publicly_readable()
        );
    }

    #[test]
    fn test_apply_returned_assigns_identity() {
        let e = persisted();
        assert!(e.is_persisted());
        assert!(e.public_id().is_set());
        assert_eq!(e.owner_internal_id(), e.internal_id());
        assert_eq!(e.created_at(), e.last_updated());
    }

    #[test]
    fn test_apply_returned_deleted_at_null_clears_archive() {
        let mut e = persisted();
        e.apply_returned(&[(
            Column::DeletedAt,
            Value::Time(Timestamp::from_micros(5_000)),
        )])
        .unwrap();
        assert!(e.is_archived());

        e.apply_returned(&[(Column::DeletedAt, Value::Null)]).unwrap();
        assert!(!e.is_archived());
    }

    #[test]
    fn test_apply_returned_rejects_mismatched_value() {
        let mut e = blank();
        let err = e
            .apply_returned(&[(Column::Id, Value::Text("7".to_string()))])
            .unwrap_err();
        assert!(matches!(err, Error::Storage(_)));
    }

    #[test]
    fn test_serialization_skips_internal_ids() {
        let e = persisted();
        let json = serde_json::to_value(&e).unwrap();

        assert!(json.get("internalId").is_none());
        assert!(json.get("internal_id").is_none());
        assert!(json.get("ownerInternalId").is_none());

        // External contract keys.
        assert_eq!(
            json.get("pubId").and_then(|v| v.as_str()),
            Some(e.public_id().to_string().as_str())
        );
        assert!(json.get("resourceName").is_some());
        assert!(json.get("publiclyReadable").is_some());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("lastUpdated").is_some());
    }

    #[test]
    fn test_deserialization_cannot_smuggle_internal_ids() {
        // A client supplying internal ids gets ignored: the fields are
        // skipped, so they deserialize to their blank defaults.
        let json = r#"{
            "internal_id": 99,
            "pubId": "00000000-0000-0000-0000-000000000000",
            "resourceName": "widget",
            "name": "n",
            "description": "d",
            "ownerPubId": null,
            "publiclyReadable": true,
            "createdAt": 0,
            "lastUpdated": 0,
            "deletedAt": null
        }"#;
        let e: Entity = serde_json::from_str(json).unwrap();
        assert_eq!(e.internal_id(), InternalId::UNSET);
        assert_eq!(e.owner_internal_id(), InternalId::UNSET);
        assert!(e.is_publicly_readable());
    }

    proptest! {
        #[test]
        fn prop_clone_new_keeps_caller_fields_resets_storage_fields(
            name in ".{0,24}",
            description in ".{0,24}",
            publicly_readable in any::<bool>(),
            raw_id in 1i64..1_000_000,
            micros in 1u64..10_000_000_000,
        ) {
            let mut e = Entity::new(
                ResourceName::new("widget"),
                name.clone(),
                description.clone(),
                Some(PublicId::generate()),
                publicly_readable,
            );
            e.apply_returned(&[
                (Column::Id, Value::Id(InternalId::from_raw(raw_id))),
                (Column::PubId, Value::Pub(PublicId::generate())),
                (Column::OwnerId, Value::Id(InternalId::from_raw(raw_id))),
                (Column::CreatedAt, Value::Time(Timestamp::from_micros(micros))),
                (Column::LastUpdated, Value::Time(Timestamp::from_micros(micros))),
            ]).unwrap();

            let copy = e.clone();
            prop_assert_eq!(&copy, &e);

            let fresh = e.clone_new();
            prop_assert_eq!(fresh.name(), name.as_str());
            prop_assert_eq!(fresh.description(), description.as_str());
            prop_assert_eq!(fresh.owner_public_id(), e.owner_public_id());
            prop_assert_eq!(fresh.is_publicly_readable(), publicly_readable);
            prop_assert!(!fresh.is_persisted());
            prop_assert!(!fresh.public_id().is_set());
            prop_assert!(!fresh.created_at().is_set());
            prop_assert!(!fresh.last_updated().is_set());
            prop_assert_eq!(fresh.deleted_at(), None);
        }
    }
}
