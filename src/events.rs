//! Guard decision events.
//!
//! This module provides:
//! - `GuardEvent`: structured record of one guard decision
//! - `GuardTrail`: in-memory recorder for the events of one run
//! - `emit`: structured `tracing` emission of an event
//!
//! Events only carry origins, URLs and outcome labels. Report content never
//! appears in an event.

mod event;
mod trail;

pub use event::{GuardEvent, GuardEventKind, GuardOutcome};
pub use trail::GuardTrail;

/// Target used for every guard event emitted through `tracing`.
pub const EVENT_TARGET: &str = "embed_guard::events";

/// Emits an event as a structured `tracing` record.
pub fn emit(event: &GuardEvent) {
    tracing::info!(
        target: EVENT_TARGET,
        run_id = %event.run_id(),
        kind = %event.kind(),
        outcome = %event.outcome(),
        subject = ?event.subject(),
        detail = ?event.detail(),
        "guard event"
    );
}

/// Emits an event and records it to `trail`.
pub fn emit_and_record(event: GuardEvent, trail: &GuardTrail) {
    emit(&event);
    trail.record(event);
}
