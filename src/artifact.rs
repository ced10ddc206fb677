//! Injection of the guard into a static report document.
//!
//! The guard block is inserted directly after the document's `<head>` opening
//! tag, or after a charset declaration that immediately follows it. Nothing
//! else in the document changes. A document that already carries the guard
//! for the same allow-list is returned untouched, so injecting twice is the
//! same as injecting once.

use std::fmt;

use crate::allowed::AllowedOrigins;
use crate::client::render_script;
use crate::delivery::{frame_ancestors_directive, HEADER_CONTENT_SECURITY_POLICY};

/// Attribute carried by the injected script element.
pub const INJECTION_MARKER: &str = r#"data-embed-guard="v1""#;

/// What [`inject`] did to the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InjectOutcome {
    /// The guard block was inserted
    Injected,
    /// The document already carried the guard; it was returned unchanged
    AlreadyGuarded,
    /// The document carried a guard for another allow-list; it was swapped
    Replaced,
    /// No `<head>` tag was found; the document was returned unchanged
    InsertionPointMissing,
}

impl fmt::Display for InjectOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InjectOutcome::Injected => write!(f, "injected"),
            InjectOutcome::AlreadyGuarded => write!(f, "already guarded"),
            InjectOutcome::Replaced => write!(f, "stale guard replaced"),
            InjectOutcome::InsertionPointMissing => write!(f, "insertion point not found"),
        }
    }
}

/// A report document together with the result of guarding it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    html: String,
    outcome: InjectOutcome,
}

impl Artifact {
    /// Returns the document.
    pub fn html(&self) -> &str {
        &self.html
    }

    /// Consumes the artifact, returning the document.
    pub fn into_html(self) -> String {
        self.html
    }

    /// Returns what the mutation step did.
    pub fn outcome(&self) -> InjectOutcome {
        self.outcome
    }

    /// Returns true if the document carries the guard.
    pub fn is_guarded(&self) -> bool {
        self.outcome != InjectOutcome::InsertionPointMissing
    }

    /// Returns a warning when the document could not be guarded.
    pub fn warning(&self) -> Option<&'static str> {
        match self.outcome {
            InjectOutcome::InsertionPointMissing => {
                Some("no <head> tag found; report was left without the embedding guard")
            }
            _ => None,
        }
    }
}

/// Returns true if `document` carries the guard at its insertion point.
///
/// The marker only counts on the script element that directly follows the
/// `<head>` tag (and a leading charset declaration). The same text anywhere
/// else in the document is report content.
pub fn is_guarded(document: &str) -> bool {
    insertion_point(document)
        .and_then(|at| existing_block(document, at))
        .is_some()
}

/// Injects the embedding guard for `allowed` into `document`.
///
/// Never fails: a missing insertion point is reported through
/// [`Artifact::outcome`] and [`Artifact::warning`], with the document
/// returned byte-for-byte. A guard built for a different allow-list is
/// swapped for the current one and reported as [`InjectOutcome::Replaced`].
///
/// # Examples
///
/// ```
/// use embed_guard::{inject, AllowedOrigins, InjectOutcome};
///
/// let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
/// let doc = "<html><head><title>Report</title></head><body>ok</body></html>";
///
/// let once = inject(doc, &allowed);
/// assert_eq!(once.outcome(), InjectOutcome::Injected);
///
/// let twice = inject(once.html(), &allowed);
/// assert_eq!(twice.outcome(), InjectOutcome::AlreadyGuarded);
/// assert_eq!(twice.html(), once.html());
///
/// let bare = inject("<p>no head</p>", &allowed);
/// assert_eq!(bare.html(), "<p>no head</p>");
/// assert!(bare.warning().is_some());
/// ```
pub fn inject(document: &str, allowed: &AllowedOrigins) -> Artifact {
    let Some(at) = insertion_point(document) else {
        tracing::warn!(
            document_len = document.len(),
            "insertion point not found; report left unguarded"
        );
        return Artifact {
            html: document.to_string(),
            outcome: InjectOutcome::InsertionPointMissing,
        };
    };

    let block = guard_block(allowed);

    let (end, outcome) = match existing_block(document, at) {
        Some(end) if document[at..end] == block => {
            tracing::debug!("report already carries the embedding guard");
            return Artifact {
                html: document.to_string(),
                outcome: InjectOutcome::AlreadyGuarded,
            };
        }
        Some(end) => {
            tracing::warn!(
                origins = allowed.len(),
                "report carried a guard for another allow-list; replacing it"
            );
            (end, InjectOutcome::Replaced)
        }
        None => (at, InjectOutcome::Injected),
    };

    let mut html = String::with_capacity(document.len() + block.len());
    html.push_str(&document[..at]);
    html.push_str(&block);
    html.push_str(&document[end..]);

    tracing::debug!(
        origins = allowed.len(),
        restricted = !allowed.is_empty(),
        %outcome,
        "embedding guard injected"
    );

    Artifact { html, outcome }
}

fn guard_block(allowed: &AllowedOrigins) -> String {
    let mut block = String::new();
    if !allowed.is_empty() {
        block.push_str(&format!(
            r#"<meta http-equiv="{}" content="{}">"#,
            HEADER_CONTENT_SECURITY_POLICY,
            escape_attr(&frame_ancestors_directive(allowed))
        ));
    }
    block.push_str(&script_open_tag());
    block.push_str(&render_script(allowed));
    block.push_str(SCRIPT_CLOSE_TAG);
    block
}

const SCRIPT_CLOSE_TAG: &str = "</script>";

fn script_open_tag() -> String {
    format!("<script {}>", INJECTION_MARKER)
}

/// Returns the end offset of a guard block that starts exactly at `at`.
fn existing_block(document: &str, at: usize) -> Option<usize> {
    let mut pos = at;

    let meta_prefix = format!(r#"<meta http-equiv="{}""#, HEADER_CONTENT_SECURITY_POLICY);
    if document[pos..].starts_with(&meta_prefix) {
        pos += document[pos..].find('>')? + 1;
    }

    let open = script_open_tag();
    if !document[pos..].starts_with(&open) {
        return None;
    }
    pos += open.len();
    pos += document[pos..].find(SCRIPT_CLOSE_TAG)? + SCRIPT_CLOSE_TAG.len();
    Some(pos)
}

/// Returns where the guard block goes: right after the `<head>` tag, or
/// after a `<meta>` encoding declaration that directly follows it, so the
/// declaration stays within the browser's encoding prescan window.
fn insertion_point(document: &str) -> Option<usize> {
    let head_end = head_insertion_point(document)?;
    let bytes = document.as_bytes();

    let tag_start = head_end
        + bytes[head_end..]
            .iter()
            .take_while(|b| b.is_ascii_whitespace())
            .count();
    let tag = &bytes[tag_start..];
    if tag.len() < 5 || !tag[..5].eq_ignore_ascii_case(b"<meta") {
        return Some(head_end);
    }

    let Some(tag_len) = tag.iter().position(|&b| b == b'>') else {
        return Some(head_end);
    };
    let declares_charset = tag[..tag_len]
        .windows(b"charset".len())
        .any(|w| w.eq_ignore_ascii_case(b"charset"));

    Some(if declares_charset {
        tag_start + tag_len + 1
    } else {
        head_end
    })
}

/// Returns the byte offset just past the first `<head>` opening tag.
///
/// Matches case-insensitively and accepts attributes, but not `<header>`.
fn head_insertion_point(document: &str) -> Option<usize> {
    const NEEDLE: &[u8] = b"<head";
    let bytes = document.as_bytes();
    let mut from = 0;

    while let Some(rel) = bytes[from..]
        .windows(NEEDLE.len())
        .position(|w| w.eq_ignore_ascii_case(NEEDLE))
    {
        let after = from + rel + NEEDLE.len();
        match bytes.get(after) {
            Some(b'>') => return Some(after + 1),
            Some(c) if c.is_ascii_whitespace() || *c == b'/' => {
                return bytes[after..]
                    .iter()
                    .position(|&b| b == b'>')
                    .map(|p| after + p + 1);
            }
            _ => from = after,
        }
    }

    None
}

fn escape_attr(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('"', "&quot;")
        .replace('<', "&lt;")
}
