//! Guarding a report end to end.
//!
//! This example shows:
//! 1. Loading the allow-list from the environment
//! 2. Guarding a report document (a file, or a built-in sample)
//! 3. The headers a server must send with the guarded document
//! 4. Request-time checks against the same configuration
//!
//! Run with:
//! `EMBED_GUARD_ALLOWED_ORIGINS="https://a.example http://localhost:8000" cargo run --example guard_report [report.html]`

use embed_guard::events::{GuardEventKind, GuardOutcome};
use embed_guard::{AuditReport, AuditSummary, GuardConfig, ReportGuard};

const SAMPLE: &str = "<!doctype html><html><head><title>Sample report</title></head>\
<body><h1>Performance 93</h1></body></html>";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_target(false).init();

    let html = match std::env::args().nth(1) {
        Some(path) => std::fs::read_to_string(path)?,
        None => SAMPLE.to_string(),
    };

    let config = GuardConfig::from_env()?;
    println!("=== Embed Guard ===\n");
    println!("Allowed origins: {:?}", config.allowed());

    let guard = ReportGuard::new(config, "demo");
    let guarded = guard.guard(&AuditReport {
        html,
        summary: AuditSummary {
            final_displayed_url: "https://site.example/".to_string(),
            performance_score: Some(0.93),
        },
    });

    println!("\n--- Artifact ---");
    println!("Outcome: {}", guarded.artifact.outcome());
    if let Some(warning) = guarded.artifact.warning() {
        println!("Warning: {}", warning);
    }
    println!("Size: {} bytes", guarded.artifact.html().len());

    println!("\n--- Response headers ---");
    for (name, value) in guarded.headers.iter() {
        println!("{}: {}", name, value);
    }

    println!("\n--- Request checks ---");
    let requests = [
        (Some("document"), None),
        (Some("iframe"), Some("https://a.example/dashboard")),
        (Some("iframe"), Some("https://evil.example/")),
        (Some("iframe"), None),
    ];
    for (dest, referer) in requests {
        let result = guard.check_request(dest, referer);
        println!("dest={:?} referer={:?} -> {}", dest, referer, result);
    }

    let denied = guard
        .trail()
        .of_kind(GuardEventKind::RequestCheck)
        .iter()
        .filter(|e| e.outcome() == GuardOutcome::Denied)
        .count();
    println!("\nDenied requests: {}", denied);

    Ok(())
}
