//! Response headers that enforce the embedding policy at delivery time.
//!
//! Headers are derived from the same [`AllowedOrigins`] value that the
//! artifact embeds, so the server and the in-page validator always agree on
//! whether embedding is restricted.

use crate::allowed::AllowedOrigins;

/// Content Security Policy header
pub const HEADER_CONTENT_SECURITY_POLICY: &str = "Content-Security-Policy";
/// X-Frame-Options header
pub const HEADER_X_FRAME_OPTIONS: &str = "X-Frame-Options";

/// Legacy frame-options value used whenever embedding is restricted.
pub const FRAME_OPTIONS_SAMEORIGIN: &str = "SAMEORIGIN";

const FRAME_ANCESTORS: &str = "frame-ancestors";

/// The pair of response headers for one allow-list.
///
/// `X-Frame-Options` cannot list origins, so it is only a coarse fallback:
/// browsers that understand `frame-ancestors` ignore it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryHeaders {
    content_security_policy: String,
    frame_options: Option<&'static str>,
}

impl DeliveryHeaders {
    /// Returns the `Content-Security-Policy` value.
    pub fn content_security_policy(&self) -> &str {
        &self.content_security_policy
    }

    /// Returns the `X-Frame-Options` value, absent when unrestricted.
    pub fn frame_options(&self) -> Option<&str> {
        self.frame_options
    }

    /// Returns true if embedding is limited to the allow-list.
    pub fn is_restricted(&self) -> bool {
        self.frame_options.is_some()
    }

    /// Iterates over `(name, value)` pairs to set on the response.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        std::iter::once((
            HEADER_CONTENT_SECURITY_POLICY,
            self.content_security_policy.as_str(),
        ))
        .chain(self.frame_options().map(|v| (HEADER_X_FRAME_OPTIONS, v)))
    }
}

/// Derives the delivery headers for an allow-list.
///
/// A non-empty list produces `frame-ancestors` with every origin in
/// canonical form (loopback origins are followed by their
/// `localhost`/`127.0.0.1` alias) and `X-Frame-Options: SAMEORIGIN`. An
/// empty list produces `frame-ancestors *` and no frame-options header.
///
/// # Examples
///
/// ```
/// use embed_guard::{headers, AllowedOrigins};
///
/// let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
/// let h = headers(&allowed);
/// assert_eq!(h.content_security_policy(), "frame-ancestors https://a.example");
/// assert_eq!(h.frame_options(), Some("SAMEORIGIN"));
///
/// let open = headers(&AllowedOrigins::unrestricted());
/// assert_eq!(open.content_security_policy(), "frame-ancestors *");
/// assert!(!open.is_restricted());
/// ```
pub fn headers(allowed: &AllowedOrigins) -> DeliveryHeaders {
    if allowed.is_empty() {
        return DeliveryHeaders {
            content_security_policy: format!("{} *", FRAME_ANCESTORS),
            frame_options: None,
        };
    }

    DeliveryHeaders {
        content_security_policy: frame_ancestors_directive(allowed),
        frame_options: Some(FRAME_OPTIONS_SAMEORIGIN),
    }
}

/// Builds the `frame-ancestors` directive for a non-empty allow-list.
pub(crate) fn frame_ancestors_directive(allowed: &AllowedOrigins) -> String {
    let mut sources: Vec<String> = Vec::with_capacity(allowed.len());
    for origin in allowed.iter() {
        let canonical = origin.to_string();
        if !sources.contains(&canonical) {
            sources.push(canonical);
        }
        if let Some(alias) = origin.loopback_alias() {
            let alias = alias.to_string();
            if !sources.contains(&alias) {
                sources.push(alias);
            }
        }
    }

    format!("{} {}", FRAME_ANCESTORS, sources.join(" "))
}
