//! The allow-list of origins permitted to embed a report.

use std::fmt;
use std::sync::Arc;

use crate::error::ParseError;
use crate::origin::Origin;

/// Immutable, ordered set of origins allowed to frame the report.
///
/// An empty set is meaningful: it places no restriction on embedding.
/// Cloning is cheap and every clone shares the same origins, so the artifact
/// and the response headers built from one configuration can never drift
/// apart.
///
/// # Examples
///
/// ```
/// use embed_guard::{AllowedOrigins, Origin};
///
/// let allowed = AllowedOrigins::parse(["https://a.example", "http://localhost:8000"]).unwrap();
/// assert_eq!(allowed.len(), 2);
///
/// let loopback = Origin::parse("http://127.0.0.1:8000").unwrap();
/// assert!(allowed.contains_equivalent(&loopback));
///
/// // Malformed entries are rejected, not dropped
/// assert!(AllowedOrigins::parse(["https://a.example", "not a url"]).is_err());
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct AllowedOrigins {
    origins: Arc<[Origin]>,
}

impl AllowedOrigins {
    /// Builds the set from configuration strings.
    ///
    /// Each entry must be a bare origin such as `https://a.example` or
    /// `http://localhost:8000`. Exact duplicates are collapsed, keeping the
    /// first occurrence.
    ///
    /// # Errors
    ///
    /// Returns the [`ParseError`] for the first invalid entry, carrying its
    /// position in the input.
    pub fn parse<I, S>(entries: I) -> Result<Self, ParseError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut origins: Vec<Origin> = Vec::new();
        for (index, entry) in entries.into_iter().enumerate() {
            let origin = Origin::parse_bare(entry.as_ref()).map_err(|e| e.at_index(index))?;
            if !origins.contains(&origin) {
                origins.push(origin);
            }
        }
        Ok(Self::from_origins(origins))
    }

    /// Builds the set from already parsed origins.
    pub fn from_origins(origins: Vec<Origin>) -> Self {
        Self {
            origins: origins.into(),
        }
    }

    /// Returns the empty set, which allows every embedder.
    pub fn unrestricted() -> Self {
        Self::from_origins(Vec::new())
    }

    /// Returns true if no origin is listed.
    pub fn is_empty(&self) -> bool {
        self.origins.is_empty()
    }

    /// Returns the number of listed origins.
    pub fn len(&self) -> usize {
        self.origins.len()
    }

    /// Iterates over the origins in configuration order.
    pub fn iter(&self) -> impl Iterator<Item = &Origin> {
        self.origins.iter()
    }

    /// Returns true if any listed origin is equivalent to `origin`.
    pub fn contains_equivalent(&self, origin: &Origin) -> bool {
        self.origins.iter().any(|o| o.is_equivalent(origin))
    }

    /// Returns the canonical string form of every origin, in order.
    pub fn canonical(&self) -> Vec<String> {
        self.origins.iter().map(ToString::to_string).collect()
    }
}

impl Default for AllowedOrigins {
    fn default() -> Self {
        Self::unrestricted()
    }
}

impl fmt::Debug for AllowedOrigins {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.canonical()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ParseErrorKind;

    #[test]
    fn empty_input_is_unrestricted() {
        let allowed = AllowedOrigins::parse(Vec::<String>::new()).unwrap();
        assert!(allowed.is_empty());
        assert_eq!(allowed, AllowedOrigins::unrestricted());
    }

    #[test]
    fn keeps_configuration_order() {
        let allowed =
            AllowedOrigins::parse(["https://b.example", "https://a.example:8443"]).unwrap();
        assert_eq!(
            allowed.canonical(),
            vec!["https://b.example", "https://a.example:8443"]
        );
    }

    #[test]
    fn collapses_exact_duplicates() {
        let allowed = AllowedOrigins::parse([
            "https://a.example",
            "https://a.example:443",
            "https://A.example/",
        ])
        .unwrap();
        assert_eq!(allowed.len(), 1);
    }

    #[test]
    fn loopback_aliases_are_kept_separately() {
        let allowed =
            AllowedOrigins::parse(["http://localhost:8000", "http://127.0.0.1:8000"]).unwrap();
        assert_eq!(allowed.len(), 2);
    }

    #[test]
    fn invalid_entry_reports_index() {
        let err = AllowedOrigins::parse(["https://a.example", "", "https://c.example"])
            .unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::Empty);
        assert_eq!(err.index(), Some(1));
    }

    #[test]
    fn entries_with_paths_are_rejected() {
        let err = AllowedOrigins::parse(["https://a.example/reports"]).unwrap_err();
        assert_eq!(err.kind(), ParseErrorKind::NotAnOrigin);
        assert_eq!(err.index(), Some(0));
    }

    #[test]
    fn clones_share_storage() {
        let allowed = AllowedOrigins::parse(["https://a.example"]).unwrap();
        let clone = allowed.clone();
        assert!(Arc::ptr_eq(&allowed.origins, &clone.origins));
    }

    #[test]
    fn debug_lists_canonical_origins() {
        let allowed = AllowedOrigins::parse(["http://localhost:8000"]).unwrap();
        assert_eq!(format!("{:?}", allowed), r#"["http://localhost:8000"]"#);
    }
}
