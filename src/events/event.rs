//! Guard event schema.

use std::fmt;

/// Which step of the guard produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardEventKind {
    /// The external audit runner produced (or failed to produce) a report
    AuditRun,
    /// The report document was mutated
    Injection,
    /// Delivery headers were derived
    Delivery,
    /// A request's embedding context was evaluated
    RequestCheck,
}

impl fmt::Display for GuardEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardEventKind::AuditRun => write!(f, "audit_run"),
            GuardEventKind::Injection => write!(f, "injection"),
            GuardEventKind::Delivery => write!(f, "delivery"),
            GuardEventKind::RequestCheck => write!(f, "request_check"),
        }
    }
}

/// Result of the step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Step completed, or access was allowed
    Success,
    /// Access was denied by policy
    Denied,
    /// Step completed without effect and the caller should know
    Warning,
    /// Step failed
    Error,
}

impl fmt::Display for GuardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuardOutcome::Success => write!(f, "success"),
            GuardOutcome::Denied => write!(f, "denied"),
            GuardOutcome::Warning => write!(f, "warning"),
            GuardOutcome::Error => write!(f, "error"),
        }
    }
}

/// One guard decision.
///
/// # Example
///
/// ```
/// use embed_guard::events::{GuardEvent, GuardEventKind, GuardOutcome};
///
/// let event = GuardEvent::new("run-7", GuardEventKind::RequestCheck, GuardOutcome::Denied)
///     .with_subject("https://b.example")
///     .with_detail("origin not in allow-list");
///
/// assert_eq!(event.run_id(), "run-7");
/// assert_eq!(event.subject(), Some("https://b.example"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardEvent {
    run_id: String,
    kind: GuardEventKind,
    outcome: GuardOutcome,
    /// Audited URL or embedding origin
    subject: Option<String>,
    /// Short human-readable explanation
    detail: Option<String>,
}

impl GuardEvent {
    /// Creates an event with the required fields.
    pub fn new(run_id: impl Into<String>, kind: GuardEventKind, outcome: GuardOutcome) -> Self {
        Self {
            run_id: run_id.into(),
            kind,
            outcome,
            subject: None,
            detail: None,
        }
    }

    /// Sets the URL or origin the event is about.
    pub fn with_subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    /// Sets the explanation.
    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// Returns the run identifier.
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Returns the event kind.
    pub fn kind(&self) -> GuardEventKind {
        self.kind
    }

    /// Returns the outcome.
    pub fn outcome(&self) -> GuardOutcome {
        self.outcome
    }

    /// Returns the subject, if set.
    pub fn subject(&self) -> Option<&str> {
        self.subject.as_deref()
    }

    /// Returns the detail, if set.
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

impl fmt::Display for GuardEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "GuardEvent[kind={}, outcome={}, run_id={}",
            self.kind, self.outcome, self.run_id
        )?;
        if let Some(subject) = &self.subject {
            write!(f, ", subject={}", subject)?;
        }
        if let Some(detail) = &self.detail {
            write!(f, ", detail={}", detail)?;
        }
        write!(f, "]")
    }
}
