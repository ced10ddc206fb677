//! In-memory recorder for guard events.

use super::{GuardEvent, GuardEventKind};
use std::cell::RefCell;

/// Records the guard events of one run, in order.
///
/// # Example
///
/// ```
/// use embed_guard::events::{GuardEvent, GuardEventKind, GuardOutcome, GuardTrail};
///
/// let trail = GuardTrail::new();
/// trail.record(GuardEvent::new("run-1", GuardEventKind::Injection, GuardOutcome::Success));
///
/// assert_eq!(trail.len(), 1);
/// ```
#[derive(Debug)]
pub struct GuardTrail {
    events: RefCell<Vec<GuardEvent>>,
}

impl GuardTrail {
    /// Creates an empty trail.
    pub fn new() -> Self {
        Self {
            events: RefCell::new(Vec::new()),
        }
    }

    /// Records an event.
    pub fn record(&self, event: GuardEvent) {
        self.events.borrow_mut().push(event);
    }

    /// Returns a snapshot of all recorded events.
    pub fn events(&self) -> Vec<GuardEvent> {
        self.events.borrow().clone()
    }

    /// Returns the number of recorded events.
    pub fn len(&self) -> usize {
        self.events.borrow().len()
    }

    /// Returns true if nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.events.borrow().is_empty()
    }

    /// Returns the recorded events of one kind, in order.
    pub fn of_kind(&self, kind: GuardEventKind) -> Vec<GuardEvent> {
        self.events
            .borrow()
            .iter()
            .filter(|e| e.kind() == kind)
            .cloned()
            .collect()
    }
}

impl Default for GuardTrail {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::GuardOutcome;

    #[test]
    fn starts_empty() {
        let trail = GuardTrail::new();
        assert!(trail.is_empty());
        assert_eq!(trail.len(), 0);
    }

    #[test]
    fn keeps_recording_order() {
        let trail = GuardTrail::new();
        trail.record(GuardEvent::new("run-1", GuardEventKind::AuditRun, GuardOutcome::Success));
        trail.record(GuardEvent::new("run-1", GuardEventKind::Injection, GuardOutcome::Warning));

        let events = trail.events();
        assert_eq!(events[0].kind(), GuardEventKind::AuditRun);
        assert_eq!(events[1].outcome(), GuardOutcome::Warning);
    }

    #[test]
    fn filters_by_kind() {
        let trail = GuardTrail::default();
        trail.record(GuardEvent::new("run-1", GuardEventKind::RequestCheck, GuardOutcome::Denied));
        trail.record(GuardEvent::new("run-1", GuardEventKind::Delivery, GuardOutcome::Success));
        trail.record(GuardEvent::new("run-1", GuardEventKind::RequestCheck, GuardOutcome::Success));

        let checks = trail.of_kind(GuardEventKind::RequestCheck);
        assert_eq!(checks.len(), 2);
        assert_eq!(checks[0].outcome(), GuardOutcome::Denied);
        assert!(trail.of_kind(GuardEventKind::AuditRun).is_empty());
    }
}
