//! The guarded report pipeline.
//!
//! The audit itself (driving a headless browser and scoring the page) is an
//! external collaborator behind [`AuditRunner`]. This module takes what it
//! produces, guards the document and derives the matching delivery headers
//! from one [`GuardConfig`].

use std::fmt;
use std::str::FromStr;

use crate::artifact::{inject, Artifact, InjectOutcome};
use crate::config::GuardConfig;
use crate::context::EmbeddingContext;
use crate::delivery::{headers, DeliveryHeaders};
use crate::error::Error;
use crate::events::{emit_and_record, GuardEvent, GuardEventKind, GuardOutcome, GuardTrail};
use crate::origin::Origin;
use crate::policy::{evaluate, ValidationResult};

/// Device class the audit emulates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FormFactor {
    /// Desktop browser (default; most report traffic is from PCs)
    #[default]
    Desktop,
    /// Mobile browser
    Mobile,
}

impl fmt::Display for FormFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FormFactor::Desktop => write!(f, "desktop"),
            FormFactor::Mobile => write!(f, "mobile"),
        }
    }
}

impl FromStr for FormFactor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(FormFactor::Desktop),
            "mobile" => Ok(FormFactor::Mobile),
            other => Err(Error::Config(format!(
                "unknown form factor {:?} (expected desktop or mobile)",
                other
            ))),
        }
    }
}

/// Screen emulation passed to the audit runner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenEmulation {
    /// Emulate a mobile device
    pub mobile: bool,
    /// Viewport width in CSS pixels
    pub width: u32,
    /// Viewport height in CSS pixels
    pub height: u32,
    /// Device pixel ratio
    pub device_scale_factor: f64,
    /// Disable emulation entirely
    pub disabled: bool,
}

impl ScreenEmulation {
    /// 1350×940 desktop viewport at 1x.
    pub const DESKTOP: ScreenEmulation = ScreenEmulation {
        mobile: false,
        width: 1350,
        height: 940,
        device_scale_factor: 1.0,
        disabled: false,
    };

    /// 360×640 phone viewport at 2x.
    pub const MOBILE: ScreenEmulation = ScreenEmulation {
        mobile: true,
        width: 360,
        height: 640,
        device_scale_factor: 2.0,
        disabled: false,
    };
}

/// Settings handed to the audit runner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AuditSettings {
    /// Device class
    pub form_factor: FormFactor,
    /// Viewport emulation matching the form factor
    pub screen: ScreenEmulation,
}

impl AuditSettings {
    /// Returns the preset for a form factor.
    pub fn for_form_factor(form_factor: FormFactor) -> Self {
        let screen = match form_factor {
            FormFactor::Desktop => ScreenEmulation::DESKTOP,
            FormFactor::Mobile => ScreenEmulation::MOBILE,
        };
        Self {
            form_factor,
            screen,
        }
    }
}

impl Default for AuditSettings {
    fn default() -> Self {
        Self::for_form_factor(FormFactor::Desktop)
    }
}

/// Headline results of an audit.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditSummary {
    /// URL shown after redirects
    pub final_displayed_url: String,
    /// Performance category score in `0.0..=1.0`, when computed
    pub performance_score: Option<f64>,
}

impl AuditSummary {
    /// Returns the performance score as a rounded percentage.
    ///
    /// ```
    /// use embed_guard::AuditSummary;
    ///
    /// let summary = AuditSummary {
    ///     final_displayed_url: "https://site.example/".into(),
    ///     performance_score: Some(0.876),
    /// };
    /// assert_eq!(summary.performance_percent(), Some(88));
    /// ```
    pub fn performance_percent(&self) -> Option<u8> {
        self.performance_score
            .filter(|s| s.is_finite())
            .map(|s| (s.clamp(0.0, 1.0) * 100.0).round() as u8)
    }
}

/// What the audit collaborator returns: the raw document and its summary.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditReport {
    /// Raw HTML report document
    pub html: String,
    /// Headline results
    pub summary: AuditSummary,
}

/// The external audit tool.
///
/// Implementations launch a browser, audit `url` with `settings` and return
/// the HTML report. They are responsible for releasing the browser whether
/// or not the audit succeeds.
pub trait AuditRunner {
    /// Failure reported by the runner.
    type Error: fmt::Display;

    /// Audits one URL.
    fn run(&self, url: &str, settings: &AuditSettings) -> Result<AuditReport, Self::Error>;
}

/// A guarded report ready to be stored or served.
#[derive(Debug, Clone)]
pub struct GuardedReport {
    /// The report document with the guard injected
    pub artifact: Artifact,
    /// Headers to send whenever the artifact is served
    pub headers: DeliveryHeaders,
    /// Headline audit results
    pub summary: AuditSummary,
}

/// Produces guarded reports and checks requests against one configuration.
///
/// Both the artifact and the headers come from the `GuardConfig` passed to
/// [`ReportGuard::new`]; there is no other way to obtain them from this type.
///
/// # Examples
///
/// ```
/// use embed_guard::{AllowedOrigins, AuditReport, AuditSummary, GuardConfig, ReportGuard};
///
/// let config = GuardConfig::new(AllowedOrigins::parse(["https://a.example"]).unwrap());
/// let guard = ReportGuard::new(config, "run-1");
///
/// let report = AuditReport {
///     html: "<html><head></head><body>report</body></html>".into(),
///     summary: AuditSummary {
///         final_displayed_url: "https://site.example/".into(),
///         performance_score: Some(0.93),
///     },
/// };
///
/// let guarded = guard.guard(&report);
/// assert!(guarded.artifact.is_guarded());
/// assert!(guarded.headers.is_restricted());
/// ```
#[derive(Debug)]
pub struct ReportGuard {
    config: GuardConfig,
    headers: DeliveryHeaders,
    run_id: String,
    trail: GuardTrail,
}

impl ReportGuard {
    /// Creates a guard for one run.
    pub fn new(config: GuardConfig, run_id: impl Into<String>) -> Self {
        let headers = headers(config.allowed());
        Self {
            config,
            headers,
            run_id: run_id.into(),
            trail: GuardTrail::new(),
        }
    }

    /// Returns the configuration.
    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    /// Returns the delivery headers for this configuration.
    pub fn headers(&self) -> &DeliveryHeaders {
        &self.headers
    }

    /// Returns the events recorded so far.
    pub fn trail(&self) -> &GuardTrail {
        &self.trail
    }

    /// Runs the audit collaborator on `url` and guards its report.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] if `url` is not an http(s) URL and
    /// [`Error::Audit`] if the runner fails.
    pub fn audit<R: AuditRunner>(&self, runner: &R, url: &str) -> Result<GuardedReport, Error> {
        Origin::parse(url)?;

        let report = match runner.run(url, self.config.audit()) {
            Ok(report) => report,
            Err(e) => {
                let message = e.to_string();
                tracing::error!(url, error = %message, "audit failed");
                self.record(
                    GuardEvent::new(&self.run_id, GuardEventKind::AuditRun, GuardOutcome::Error)
                        .with_subject(url)
                        .with_detail(message.clone()),
                );
                return Err(Error::Audit(message));
            }
        };

        self.record(
            GuardEvent::new(&self.run_id, GuardEventKind::AuditRun, GuardOutcome::Success)
                .with_subject(url)
                .with_detail(self.config.audit().form_factor.to_string()),
        );

        Ok(self.guard(&report))
    }

    /// Guards an audit report that was produced elsewhere.
    pub fn guard(&self, report: &AuditReport) -> GuardedReport {
        let summary = &report.summary;
        tracing::info!(
            url = %summary.final_displayed_url,
            performance = ?summary.performance_percent(),
            "audit completed"
        );

        let artifact = inject(&report.html, self.config.allowed());
        let outcome = match artifact.outcome() {
            InjectOutcome::Injected | InjectOutcome::AlreadyGuarded => GuardOutcome::Success,
            InjectOutcome::Replaced | InjectOutcome::InsertionPointMissing => {
                GuardOutcome::Warning
            }
        };
        self.record(
            GuardEvent::new(&self.run_id, GuardEventKind::Injection, outcome)
                .with_subject(summary.final_displayed_url.as_str())
                .with_detail(artifact.outcome().to_string()),
        );

        self.record(
            GuardEvent::new(&self.run_id, GuardEventKind::Delivery, GuardOutcome::Success)
                .with_detail(self.headers.content_security_policy()),
        );

        GuardedReport {
            artifact,
            headers: self.headers.clone(),
            summary: summary.clone(),
        }
    }

    /// Evaluates a request for the artifact using its fetch metadata.
    ///
    /// `sec_fetch_dest` and `referer` are the raw `Sec-Fetch-Dest` and
    /// `Referer` header values, if present.
    pub fn check_request(
        &self,
        sec_fetch_dest: Option<&str>,
        referer: Option<&str>,
    ) -> ValidationResult {
        let context = EmbeddingContext::from_fetch_metadata(sec_fetch_dest, referer);
        let result = evaluate(self.config.allowed(), &context);

        let outcome = match result {
            ValidationResult::Allowed => GuardOutcome::Success,
            ValidationResult::Denied(_) => GuardOutcome::Denied,
        };
        self.record(
            GuardEvent::new(&self.run_id, GuardEventKind::RequestCheck, outcome)
                .with_subject(context.to_string())
                .with_detail(result.to_string()),
        );

        result
    }

    fn record(&self, event: GuardEvent) {
        emit_and_record(event, &self.trail);
    }
}
