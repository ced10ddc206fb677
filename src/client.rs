//! The in-page validator that runs inside the viewing browser.
//!
//! The browser script (`client/guard.js`) and [`ClientValidator`] implement
//! the same state machine. The script is rendered from the constants in this
//! module, so the allow-list, recheck schedule and denial reasons it carries
//! are exactly those the Rust side evaluates with.
//!
//! ```text
//! Loading ──trigger──▶ Checking ──▶ Resolved(Allowed)   (final)
//!                          │
//!                          └──────▶ Resolved(Denied) ──later trigger──▶ Checking
//! ```
//!
//! Once `Allowed` is reached no trigger is evaluated again. `Denied` is
//! re-evaluated by later triggers so that a denial caused purely by timing
//! can recover when the embedding context becomes known.
//!
//! The validator judges the direct parent only, while `frame-ancestors`
//! checks every ancestor. For nested frames the two layers can disagree: an
//! allowed parent inside a disallowed top-level page passes this check and
//! is still refused by the header.

use serde_json::json;

use crate::allowed::AllowedOrigins;
use crate::context::{determine_context, ContextProbe};
use crate::policy::{evaluate, DenialReason, ValidationResult};

/// Delays, in milliseconds after document-ready, of the bounded re-checks.
pub const RECHECK_DELAYS_MS: [u32; 4] = [100, 500, 1000, 2000];

const SCRIPT_TEMPLATE: &str = include_str!("client/guard.js");

/// A lifecycle signal that prompts a check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The document finished parsing (`DOMContentLoaded`)
    DocumentReady,
    /// All resources finished loading (`load`)
    Loaded,
    /// A scheduled re-check fired; the index points into [`RECHECK_DELAYS_MS`]
    Recheck(usize),
    /// The structural-change observer saw the document mutate
    Mutation,
}

/// State of the in-page validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientState {
    /// No check has run yet
    Loading,
    /// A check is in progress
    Checking,
    /// The last check produced this result
    Resolved(ValidationResult),
}

/// What the page must do after a trigger was handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Effect {
    /// Nothing visible changes
    ///
    /// A repeated denial with the same reason lands here. The page only
    /// keeps report nodes added since the last check hidden.
    None,
    /// Hide the report and show the denial view with this reason
    ///
    /// Produced when the state moves into `Denied` or the reason changes.
    RenderDenial(DenialReason),
    /// Remove the denial view and show the report again
    RestoreReport,
}

/// Model of the in-page validator's state machine.
///
/// # Examples
///
/// ```
/// use embed_guard::client::{ClientState, ClientValidator, Effect, Trigger};
/// use embed_guard::{AllowedOrigins, ContextProbe, CrossOriginBlocked, ValidationResult};
///
/// struct TopWindow;
///
/// impl ContextProbe for TopWindow {
///     fn is_top_level(&self) -> bool { true }
///     fn embedder_location(&self) -> Result<Option<String>, CrossOriginBlocked> { Ok(None) }
///     fn referrer(&self) -> Option<String> { None }
/// }
///
/// let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
/// let mut validator = ClientValidator::new(allowed);
///
/// assert_eq!(validator.on_trigger(Trigger::DocumentReady, &TopWindow), Effect::None);
/// assert_eq!(validator.state(), ClientState::Resolved(ValidationResult::Allowed));
/// assert!(!validator.is_observing());
/// ```
#[derive(Debug, Clone)]
pub struct ClientValidator {
    allowed: AllowedOrigins,
    state: ClientState,
    observing: bool,
    rechecks_left: usize,
    report_hidden: bool,
}

impl ClientValidator {
    /// Creates a validator in the `Loading` state.
    pub fn new(allowed: AllowedOrigins) -> Self {
        Self {
            allowed,
            state: ClientState::Loading,
            observing: false,
            rechecks_left: RECHECK_DELAYS_MS.len(),
            report_hidden: false,
        }
    }

    /// Returns the current state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Returns true while the structural-change observer is connected.
    pub fn is_observing(&self) -> bool {
        self.observing
    }

    /// Returns true once the report has been allowed. No further check runs.
    pub fn is_settled(&self) -> bool {
        self.state == ClientState::Resolved(ValidationResult::Allowed)
    }

    /// Returns how many scheduled re-checks have not fired yet.
    pub fn rechecks_left(&self) -> usize {
        self.rechecks_left
    }

    /// Handles one trigger, probing the context and evaluating the policy.
    pub fn on_trigger(&mut self, trigger: Trigger, probe: &impl ContextProbe) -> Effect {
        if self.is_settled() {
            return Effect::None;
        }

        match trigger {
            Trigger::DocumentReady => self.observing = true,
            Trigger::Mutation if !self.observing => return Effect::None,
            Trigger::Recheck(_) => self.rechecks_left = self.rechecks_left.saturating_sub(1),
            Trigger::Loaded | Trigger::Mutation => {}
        }

        let effect = self.check(probe);

        if matches!(trigger, Trigger::Recheck(_)) && self.rechecks_left == 0 {
            self.observing = false;
        }

        tracing::trace!(?trigger, state = ?self.state, ?effect, "client check");
        effect
    }

    fn check(&mut self, probe: &impl ContextProbe) -> Effect {
        let previous = self.state;
        self.state = ClientState::Checking;
        let result = evaluate(&self.allowed, &determine_context(probe));
        self.state = ClientState::Resolved(result);

        match result {
            ValidationResult::Allowed => {
                self.observing = false;
                if self.report_hidden {
                    self.report_hidden = false;
                    Effect::RestoreReport
                } else {
                    Effect::None
                }
            }
            ValidationResult::Denied(_) if previous == self.state => Effect::None,
            ValidationResult::Denied(reason) => {
                self.report_hidden = true;
                Effect::RenderDenial(reason)
            }
        }
    }
}

/// Renders the browser script for an allow-list.
///
/// The allow-list is embedded as a JSON array literal. Every `<` is escaped
/// so the data can never close the surrounding `<script>` element.
pub fn render_script(allowed: &AllowedOrigins) -> String {
    let origins = script_literal(&json!(allowed.canonical()));
    let delays = script_literal(&json!(RECHECK_DELAYS_MS));
    let reasons = script_literal(&json!({
        "notAllowed": DenialReason::NotAllowed.to_string(),
        "unverifiable": DenialReason::Unverifiable.to_string(),
    }));

    SCRIPT_TEMPLATE
        .replace("/*@allowed*/[]", &origins)
        .replace("/*@delays*/[]", &delays)
        .replace("/*@reasons*/{}", &reasons)
}

fn script_literal(value: &serde_json::Value) -> String {
    value.to_string().replace('<', "\\u003c")
}
