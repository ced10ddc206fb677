//! Origin parsing and equivalence.
//!
//! An [`Origin`] is the `(scheme, host, port)` triple that a browser uses as
//! a security boundary. Origins are always fully resolved: the port is filled
//! in from the scheme when the input omits it, so `https://a.example` and
//! `https://a.example:443` parse to the same value.

use std::fmt;

use url::Url;

use crate::error::{ParseError, ParseErrorKind};

/// Hostnames treated as the same machine when scheme and port agree.
const LOOPBACK_HOSTS: [&str; 2] = ["localhost", "127.0.0.1"];

/// URL scheme of an origin. Only web schemes can embed a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scheme {
    /// `http`
    Http,
    /// `https`
    Https,
}

impl Scheme {
    /// Returns the conventional port for this scheme.
    pub fn default_port(self) -> u16 {
        match self {
            Scheme::Http => 80,
            Scheme::Https => 443,
        }
    }

    /// Returns the scheme as written in a URL.
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully resolved web origin.
///
/// Equality (`==`) is exact. Use [`Origin::is_equivalent`] for policy
/// matching, which additionally treats `localhost` and `127.0.0.1` as the
/// same host.
///
/// # Examples
///
/// ```
/// use embed_guard::Origin;
///
/// let a = Origin::parse("https://a.example").unwrap();
/// let b = Origin::parse("https://a.example:443/some/page?q=1").unwrap();
/// assert_eq!(a, b);
/// assert_eq!(a.to_string(), "https://a.example");
///
/// let local = Origin::parse("http://localhost:8000").unwrap();
/// let loopback = Origin::parse("http://127.0.0.1:8000").unwrap();
/// assert!(local.is_equivalent(&loopback));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Origin {
    scheme: Scheme,
    host: String,
    port: u16,
}

impl Origin {
    /// Parses the origin of a URL-like string.
    ///
    /// Any path, query or fragment is ignored, so referrer URLs can be passed
    /// directly.
    ///
    /// # Errors
    ///
    /// Returns a [`ParseError`] if the input is empty, is not an absolute URL,
    /// uses a scheme other than `http`/`https`, or has no host.
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        Self::from_url(&parse_url(raw)?, raw)
    }

    /// Parses a string that must be a bare origin, as found in configuration.
    ///
    /// Unlike [`Origin::parse`] this rejects credentials, paths other than
    /// `/`, queries and fragments.
    pub(crate) fn parse_bare(raw: &str) -> Result<Self, ParseError> {
        let url = parse_url(raw)?;
        let origin = Self::from_url(&url, raw)?;

        let has_extras = !url.username().is_empty()
            || url.password().is_some()
            || url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some();
        if has_extras {
            return Err(ParseError::new(ParseErrorKind::NotAnOrigin, raw));
        }

        Ok(origin)
    }

    fn from_url(url: &Url, raw: &str) -> Result<Self, ParseError> {
        let scheme = match url.scheme() {
            "http" => Scheme::Http,
            "https" => Scheme::Https,
            _ => return Err(ParseError::new(ParseErrorKind::UnsupportedScheme, raw)),
        };

        let host = match url.host_str() {
            Some(h) if !h.is_empty() => h.to_ascii_lowercase(),
            _ => return Err(ParseError::new(ParseErrorKind::MissingHost, raw)),
        };

        let port = url.port().unwrap_or_else(|| scheme.default_port());

        Ok(Self { scheme, host, port })
    }

    /// Returns the scheme.
    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    /// Returns the lower-cased hostname (IPv6 literals keep their brackets).
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the resolved port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns true if the host is `localhost` or `127.0.0.1`.
    pub fn is_loopback_alias(&self) -> bool {
        is_loopback_host(&self.host)
    }

    /// Returns the same origin under the other loopback hostname, if any.
    ///
    /// `http://localhost:8000` maps to `http://127.0.0.1:8000` and back.
    pub fn loopback_alias(&self) -> Option<Origin> {
        if !self.is_loopback_alias() {
            return None;
        }
        let alias = LOOPBACK_HOSTS.iter().find(|h| **h != self.host)?;
        Some(Origin {
            scheme: self.scheme,
            host: (*alias).to_string(),
            port: self.port,
        })
    }

    /// Returns true if both origins identify the same embedding boundary.
    ///
    /// Scheme and port must match exactly. Hosts must match exactly, except
    /// that `localhost` and `127.0.0.1` are interchangeable.
    pub fn is_equivalent(&self, other: &Origin) -> bool {
        if self.scheme != other.scheme || self.port != other.port {
            return false;
        }
        self.host == other.host || (self.is_loopback_alias() && other.is_loopback_alias())
    }
}

impl fmt::Display for Origin {
    /// Writes the canonical form: the port is omitted when it is the default.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.port == self.scheme.default_port() {
            write!(f, "{}://{}", self.scheme, self.host)
        } else {
            write!(f, "{}://{}:{}", self.scheme, self.host, self.port)
        }
    }
}

impl std::str::FromStr for Origin {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Origin::parse(s)
    }
}

/// Parses an origin string. Shorthand for [`Origin::parse`].
pub fn normalize(raw: &str) -> Result<Origin, ParseError> {
    Origin::parse(raw)
}

fn parse_url(raw: &str) -> Result<Url, ParseError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ParseError::new(ParseErrorKind::Empty, raw));
    }

    Url::parse(trimmed).map_err(|e| {
        let kind = match e {
            url::ParseError::EmptyHost => ParseErrorKind::MissingHost,
            _ => ParseErrorKind::Malformed,
        };
        ParseError::new(kind, raw)
    })
}

fn is_loopback_host(host: &str) -> bool {
    LOOPBACK_HOSTS.contains(&host)
}
