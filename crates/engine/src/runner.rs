//! The state runner
//!
//! Executes one state operation's plans against a live handle, strictly in
//! declared order, and enforces the invariants:
//!
//! - A single-entity plan affecting more than one row aborts the operation
//!   immediately with an integrity error. This signals a missing or
//!   malformed predicate and is never tolerated; the caller's transaction
//!   is what makes the already-applied plans reversible.
//! - A backend failure aborts immediately, wrapped with the operation and
//!   table for context.
//!
//! No retry logic lives here; every fault surfaces to the caller.

use plinth_core::{
    Cardinality, Error, ExecMode, QueryPlan, Record, Result, StorageHandle, WriteOutcome,
};

use crate::config::EngineConfig;
use crate::ops::StateOp;

/// Execute one state operation against a handle
///
/// Builds the operation's plans from the record's entity, runs them in
/// order, and writes each plan's returned columns back onto the entity
/// (assigned identity, refreshed timestamps, resolved owner).
///
/// # Errors
/// - [`Error::Integrity`] if a single-entity plan affects more than one row
/// - [`Error::Backend`] if the handle reports a failure
pub fn run_state_op(
    handle: &mut dyn StorageHandle,
    record: &mut dyn Record,
    op: StateOp,
    config: &EngineConfig,
) -> Result<()> {
    let plans = op.plans(record.entity(), config);
    for plan in &plans {
        let outcome = dispatch(handle, plan).map_err(|source| Error::Backend {
            operation: op.name(),
            table: plan.table,
            source: Box::new(source),
        })?;

        if plan.cardinality == Cardinality::Single && outcome.rows_affected > 1 {
            return Err(Error::Integrity {
                operation: op.name(),
                table: plan.table,
                rows_affected: outcome.rows_affected,
            });
        }

        record.entity_mut().apply_returned(&outcome.returned)?;
    }
    Ok(())
}

fn dispatch(handle: &mut dyn StorageHandle, plan: &QueryPlan) -> Result<WriteOutcome> {
    match plan.mode {
        ExecMode::Insert => handle.execute_insert(plan),
        ExecMode::Update => handle.execute_update(plan),
        ExecMode::SoftDelete | ExecMode::HardDelete => handle.execute_delete(plan),
    }
}

// ============================================================================
// Tests
// ============================================================================
