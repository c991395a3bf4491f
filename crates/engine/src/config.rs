//! Engine configuration
//!
//! The engine carries three switches, all explicit rather than ambient
//! process state, so a deployment's behavior is visible at the call site
//! that constructs the manager.

/// Deployment mode the engine believes it is running in
///
/// Production tightens the construction-time guards: creating a
/// non-concrete (abstract) record is refused outright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DeployMode {
    /// Development/test: abstract entities may be created directly
    #[default]
    Development,
    /// Production: only fully concrete record types may be created
    Production,
}

/// Configuration for an [`crate::EntityManager`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Deployment mode (drives the concreteness guard)
    pub deploy_mode: DeployMode,

    /// Allow state changes without an active transaction
    ///
    /// Intended only for test harnesses; never enable in production. Every
    /// write taken through this opt-out is logged at warn level.
    pub unsafe_writes: bool,

    /// Whether update plans read `deleted_at` back
    ///
    /// Some storage engines mutate `deleted_at` as a side effect of triggers
    /// on update; when this is set the update plan's returning set includes
    /// the column so the in-memory entity cannot drift. Disable it for
    /// backends that guarantee updates never touch `deleted_at`.
    pub update_refreshes_deleted: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            deploy_mode: DeployMode::default(),
            unsafe_writes: false,
            update_refreshes_deleted: true,
        }
    }
}

impl EngineConfig {
    /// Set the deployment mode
    pub fn with_deploy_mode(mut self, mode: DeployMode) -> Self {
        self.deploy_mode = mode;
        self
    }

    /// Allow state changes outside a transaction (test harnesses only)
    pub fn with_unsafe_writes(mut self, unsafe_writes: bool) -> Self {
        self.unsafe_writes = unsafe_writes;
        self
    }

    /// Control whether updates read `deleted_at` back
    pub fn with_update_refreshes_deleted(mut self, refresh: bool) -> Self {
        self.update_refreshes_deleted = refresh;
        self
    }
}

// ============================================================================
// Tests
// ============================================================================
