use std::fmt;

/// Errors that can occur while configuring or running the report guard.
#[derive(Debug)]
pub enum Error {
    /// An origin string could not be parsed
    Parse(ParseError),
    /// A configuration value other than an origin was invalid
    Config(String),
    /// The external audit runner failed
    Audit(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(e) => write!(f, "invalid origin: {}", e),
            Error::Config(msg) => write!(f, "invalid configuration: {}", msg),
            Error::Audit(msg) => write!(f, "audit failed: {}", msg),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ParseError> for Error {
    fn from(e: ParseError) -> Self {
        Error::Parse(e)
    }
}

/// Error returned when a string cannot be turned into an [`Origin`](crate::Origin).
///
/// # Examples
///
/// ```
/// use embed_guard::{Origin, ParseErrorKind};
///
/// let err = Origin::parse("ftp://files.example").unwrap_err();
/// assert_eq!(err.kind(), ParseErrorKind::UnsupportedScheme);
/// assert_eq!(err.input(), "ftp://files.example");
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    kind: ParseErrorKind,
    input: String,
    index: Option<usize>,
}

impl ParseError {
    /// Creates a new parse error for the given input.
    pub fn new(kind: ParseErrorKind, input: impl Into<String>) -> Self {
        Self {
            kind,
            input: input.into(),
            index: None,
        }
    }

    /// Attaches the position of the offending entry in a configuration list.
    pub(crate) fn at_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Returns the error kind.
    pub fn kind(&self) -> ParseErrorKind {
        self.kind
    }

    /// Returns the rejected input.
    pub fn input(&self) -> &str {
        &self.input
    }

    /// Returns the 0-based position of the entry, when parsed from a list.
    pub fn index(&self) -> Option<usize> {
        self.index
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(i) => write!(f, "entry {} {:?}: {}", i, self.input, self.kind),
            None => write!(f, "{:?}: {}", self.input, self.kind),
        }
    }
}

impl std::error::Error for ParseError {}

/// Why an origin string was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// Input is empty or whitespace only
    Empty,
    /// Input is not a URL at all
    Malformed,
    /// Scheme is not `http` or `https`
    UnsupportedScheme,
    /// URL has no host component
    MissingHost,
    /// Input carries a path, query, fragment or credentials
    NotAnOrigin,
}

impl fmt::Display for ParseErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "empty origin"),
            Self::Malformed => write!(f, "malformed URL"),
            Self::UnsupportedScheme => write!(f, "scheme must be http or https"),
            Self::MissingHost => write!(f, "missing host"),
            Self::NotAnOrigin => write!(f, "expected a bare origin (scheme://host[:port])"),
        }
    }
}
