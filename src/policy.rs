//! The embedding policy evaluator.

use std::fmt;

use crate::allowed::AllowedOrigins;
use crate::context::EmbeddingContext;

/// Why an embedding context was denied.
///
/// The reason is carried for display only; callers branch on
/// [`ValidationResult`], never on the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialReason {
    /// The embedder is known and not on the allow-list
    NotAllowed,
    /// The document is framed but the embedder could not be determined
    Unverifiable,
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenialReason::NotAllowed => write!(f, "origin not in allow-list"),
            DenialReason::Unverifiable => write!(f, "embedding origin could not be verified"),
        }
    }
}

/// Outcome of evaluating an embedding context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationResult {
    /// The report may be shown
    Allowed,
    /// The report must be replaced by the denial view
    Denied(DenialReason),
}

impl ValidationResult {
    /// Returns true for [`ValidationResult::Allowed`].
    pub fn is_allowed(&self) -> bool {
        matches!(self, ValidationResult::Allowed)
    }
}

impl fmt::Display for ValidationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationResult::Allowed => write!(f, "allowed"),
            ValidationResult::Denied(reason) => write!(f, "denied: {}", reason),
        }
    }
}

/// Decides whether a report may be displayed in `context`.
///
/// Rules, first match wins:
/// 1. an empty allow-list allows everything
/// 2. top-level viewing is always allowed
/// 3. a framed context with an equivalent listed embedder is allowed
/// 4. a framed context with an unlisted embedder is denied
/// 5. a framed context with an unknown embedder is denied
///
/// # Examples
///
/// ```
/// use embed_guard::{evaluate, AllowedOrigins, DenialReason, EmbeddingContext, Origin, ValidationResult};
///
/// let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
///
/// let ctx = EmbeddingContext::embedded_by(Origin::parse("https://a.example:443").unwrap());
/// assert_eq!(evaluate(&allowed, &ctx), ValidationResult::Allowed);
///
/// let ctx = EmbeddingContext::embedded_unknown();
/// assert_eq!(
///     evaluate(&allowed, &ctx),
///     ValidationResult::Denied(DenialReason::Unverifiable)
/// );
/// ```
pub fn evaluate(allowed: &AllowedOrigins, context: &EmbeddingContext) -> ValidationResult {
    if allowed.is_empty() {
        return ValidationResult::Allowed;
    }

    match context {
        EmbeddingContext::TopLevel => ValidationResult::Allowed,
        EmbeddingContext::Embedded(Some(origin)) if allowed.contains_equivalent(origin) => {
            ValidationResult::Allowed
        }
        EmbeddingContext::Embedded(Some(_)) => ValidationResult::Denied(DenialReason::NotAllowed),
        EmbeddingContext::Embedded(None) => ValidationResult::Denied(DenialReason::Unverifiable),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::origin::Origin;

    fn embedded(raw: &str) -> EmbeddingContext {
        EmbeddingContext::embedded_by(Origin::parse(raw).unwrap())
    }

    #[test]
    fn empty_allow_list_allows_everything() {
        let allowed = AllowedOrigins::unrestricted();
        for ctx in [
            EmbeddingContext::TopLevel,
            embedded("https://b.example"),
            EmbeddingContext::embedded_unknown(),
        ] {
            assert_eq!(evaluate(&allowed, &ctx), ValidationResult::Allowed);
        }
    }

    #[test]
    fn top_level_is_always_allowed() {
        let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
        assert!(evaluate(&allowed, &EmbeddingContext::TopLevel).is_allowed());
    }

    #[test]
    fn listed_embedder_is_allowed() {
        let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
        assert!(evaluate(&allowed, &embedded("https://a.example:443")).is_allowed());
    }

    #[test]
    fn unlisted_embedder_is_denied() {
        let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
        assert_eq!(
            evaluate(&allowed, &embedded("https://b.example")),
            ValidationResult::Denied(DenialReason::NotAllowed)
        );
    }

    #[test]
    fn scheme_mismatch_is_denied() {
        let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
        assert!(!evaluate(&allowed, &embedded("http://a.example")).is_allowed());
    }

    #[test]
    fn loopback_alias_is_allowed() {
        let allowed = AllowedOrigins::parse(["http://localhost:8000"]).unwrap();
        assert!(evaluate(&allowed, &embedded("http://127.0.0.1:8000")).is_allowed());
        assert!(!evaluate(&allowed, &embedded("http://127.0.0.1:9000")).is_allowed());
    }

    #[test]
    fn unknown_embedder_is_denied() {
        let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
        assert_eq!(
            evaluate(&allowed, &EmbeddingContext::embedded_unknown()),
            ValidationResult::Denied(DenialReason::Unverifiable)
        );
    }

    #[test]
    fn result_display() {
        assert_eq!(ValidationResult::Allowed.to_string(), "allowed");
        assert_eq!(
            ValidationResult::Denied(DenialReason::NotAllowed).to_string(),
            "denied: origin not in allow-list"
        );
    }
}
