//! Concrete-record capability trait
//!
//! The application's domain types do not inherit from Entity; they *hold*
//! one. A concrete record type embeds an [`Entity`] value and exposes it
//! through this trait, together with two facts about itself: its resource
//! name (the type tag stored with the row) and whether it is a fully
//! concrete type.
//!
//! The state operations, runner, and transaction manager operate purely on
//! `&mut dyn Record`, never on a subtype hierarchy.

use crate::entity::Entity;
use crate::types::ResourceName;

/// Capability a concrete record type provides to the persistence core
pub trait Record {
    /// The embedded base entity
    fn entity(&self) -> &Entity;

    /// Mutable access to the embedded base entity
    ///
    /// The state runner uses this to write storage-assigned columns back
    /// after executing an operation's plans.
    fn entity_mut(&mut self) -> &mut Entity;

    /// The type tag stored with the record's row
    ///
    /// Defaults to the embedded entity's resource name; override only if a
    /// type derives its tag some other way.
    fn resource_name(&self) -> ResourceName {
        self.entity().resource_name().clone()
    }

    /// Whether this is a fully concrete record type
    ///
    /// Entity itself is logically abstract. The transaction manager consults
    /// this before building any create plan and, in production mode, refuses
    /// non-concrete records.
    fn is_concrete(&self) -> bool;
}

/// Entity alone is an abstract record: usable in tests and as part of a
/// concrete type's create sequence, but refused by the production guard.
impl Record for Entity {
    fn entity(&self) -> &Entity {
        self
    }

    fn entity_mut(&mut self) -> &mut Entity {
        self
    }

    fn is_concrete(&self) -> bool {
        false
    }
}

// ============================================================================
// Tests
// ============================================================================
