//! The browsing context a report is being viewed in.

use std::fmt;

use crate::origin::Origin;

/// Where the report document is being displayed.
///
/// # Examples
///
/// ```
/// use embed_guard::{EmbeddingContext, Origin};
///
/// let framed = EmbeddingContext::embedded_by(Origin::parse("https://a.example").unwrap());
/// assert!(framed.is_embedded());
/// assert!(!EmbeddingContext::TopLevel.is_embedded());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EmbeddingContext {
    /// The document is the outermost browsing context
    TopLevel,
    /// The document is framed; `None` means the embedder could not be determined
    Embedded(Option<Origin>),
}

impl EmbeddingContext {
    /// Creates a framed context with a known embedder.
    pub fn embedded_by(origin: Origin) -> Self {
        EmbeddingContext::Embedded(Some(origin))
    }

    /// Creates a framed context whose embedder is unknown.
    pub fn embedded_unknown() -> Self {
        EmbeddingContext::Embedded(None)
    }

    /// Returns true for any framed context.
    pub fn is_embedded(&self) -> bool {
        matches!(self, EmbeddingContext::Embedded(_))
    }

    /// Returns the embedding origin, if known.
    pub fn embedder(&self) -> Option<&Origin> {
        match self {
            EmbeddingContext::Embedded(origin) => origin.as_ref(),
            EmbeddingContext::TopLevel => None,
        }
    }

    /// Derives the context of an incoming request from fetch metadata.
    ///
    /// A `Sec-Fetch-Dest` of `iframe`, `frame`, `embed` or `object` marks the
    /// request as framed; the embedder is taken from the `Referer` header when
    /// it parses. Any other destination, or no header at all, is top-level.
    ///
    /// ```
    /// use embed_guard::EmbeddingContext;
    ///
    /// let ctx = EmbeddingContext::from_fetch_metadata(
    ///     Some("iframe"),
    ///     Some("https://a.example/dashboard"),
    /// );
    /// assert_eq!(ctx.embedder().unwrap().to_string(), "https://a.example");
    ///
    /// let ctx = EmbeddingContext::from_fetch_metadata(Some("document"), None);
    /// assert_eq!(ctx, EmbeddingContext::TopLevel);
    /// ```
    pub fn from_fetch_metadata(sec_fetch_dest: Option<&str>, referer: Option<&str>) -> Self {
        let framed = sec_fetch_dest
            .map(|dest| {
                let dest = dest.trim();
                FRAMED_DESTINATIONS
                    .iter()
                    .any(|d| d.eq_ignore_ascii_case(dest))
            })
            .unwrap_or(false);

        if !framed {
            return EmbeddingContext::TopLevel;
        }

        EmbeddingContext::Embedded(referer.and_then(|r| Origin::parse(r).ok()))
    }
}

impl fmt::Display for EmbeddingContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmbeddingContext::TopLevel => write!(f, "top-level"),
            EmbeddingContext::Embedded(Some(origin)) => write!(f, "embedded by {}", origin),
            EmbeddingContext::Embedded(None) => write!(f, "embedded by unknown origin"),
        }
    }
}

/// `Sec-Fetch-Dest` values that load a document into a nested context.
const FRAMED_DESTINATIONS: [&str; 4] = ["iframe", "frame", "embed", "object"];

/// Reading the embedder's location was blocked by the same-origin policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrossOriginBlocked;

/// Read access to the signals a viewing browser exposes about its embedder.
///
/// The in-page validator reads these from `window`; tests and server-side
/// simulations implement the trait directly.
pub trait ContextProbe {
    /// Returns true if the document is its own top-level window.
    fn is_top_level(&self) -> bool;

    /// Reads the embedding window's location.
    ///
    /// Returns `Err(CrossOriginBlocked)` when the browser refuses access, and
    /// `Ok(None)` when there is nothing usable to read.
    fn embedder_location(&self) -> Result<Option<String>, CrossOriginBlocked>;

    /// Returns the document referrer, if the browser sent one.
    fn referrer(&self) -> Option<String>;
}

/// Determines the embedding context from a probe.
///
/// Tries the embedder's location first. A cross-origin restriction, or a
/// location that is not a web origin, falls back to the referrer. If neither
/// yields an origin the context is `Embedded(None)`.
pub fn determine_context(probe: &impl ContextProbe) -> EmbeddingContext {
    if probe.is_top_level() {
        return EmbeddingContext::TopLevel;
    }

    let from_location = match probe.embedder_location() {
        Ok(location) => location.and_then(|l| Origin::parse(&l).ok()),
        Err(CrossOriginBlocked) => None,
    };

    let origin = from_location.or_else(|| {
        probe
            .referrer()
            .and_then(|r| Origin::parse(&r).ok())
    });

    EmbeddingContext::Embedded(origin)
}
