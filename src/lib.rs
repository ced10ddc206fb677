//! Origin allow-listing and framing enforcement for generated audit reports.
//!
//! A generated report is a standalone HTML document. This crate decides who
//! may view or embed it and enforces that decision in two places:
//! - **At delivery**: [`headers`] derives `Content-Security-Policy:
//!   frame-ancestors` and `X-Frame-Options` values for the server
//! - **In the browser**: [`inject`] embeds a validator script that checks the
//!   embedding context and replaces the report with a denial view when the
//!   embedder is not allowed
//!
//! Both layers consult the same [`evaluate`] function and are built from the
//! same immutable [`AllowedOrigins`] value, carried by [`GuardConfig`].
//!
//! # Core Types
//!
//! - [`Origin`]: a fully resolved `(scheme, host, port)` triple
//! - [`AllowedOrigins`]: the immutable allow-list; empty means unrestricted
//! - [`EmbeddingContext`]: top-level, or framed by a known/unknown origin
//! - [`ValidationResult`]: `Allowed` or `Denied(reason)`
//! - [`Artifact`]: a guarded document and what the injection did
//! - [`ReportGuard`]: pipeline producing artifacts and headers from one config
//!
//! # Examples
//!
//! ```
//! use embed_guard::{evaluate, headers, inject, AllowedOrigins, EmbeddingContext, Origin};
//!
//! let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
//!
//! let framed = EmbeddingContext::embedded_by(Origin::parse("https://b.example").unwrap());
//! assert!(!evaluate(&allowed, &framed).is_allowed());
//!
//! let artifact = inject("<html><head></head><body></body></html>", &allowed);
//! assert!(artifact.is_guarded());
//!
//! let h = headers(&allowed);
//! assert_eq!(h.content_security_policy(), "frame-ancestors https://a.example");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod allowed;
mod artifact;
pub mod client;
mod config;
mod context;
mod delivery;
mod error;
pub mod events;
mod origin;
mod policy;
mod report;

pub use allowed::AllowedOrigins;
pub use artifact::{inject, is_guarded, Artifact, InjectOutcome, INJECTION_MARKER};
pub use config::{GuardConfig, ENV_ALLOWED_ORIGINS, ENV_FORM_FACTOR};
pub use context::{determine_context, ContextProbe, CrossOriginBlocked, EmbeddingContext};
pub use delivery::{
    headers, DeliveryHeaders, FRAME_OPTIONS_SAMEORIGIN, HEADER_CONTENT_SECURITY_POLICY,
    HEADER_X_FRAME_OPTIONS,
};
pub use error::{Error, ParseError, ParseErrorKind};
pub use origin::{normalize, Origin, Scheme};
pub use policy::{evaluate, DenialReason, ValidationResult};
pub use report::{
    AuditReport, AuditRunner, AuditSettings, AuditSummary, FormFactor, GuardedReport,
    ReportGuard, ScreenEmulation,
};
