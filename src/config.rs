//! Guard configuration.
//!
//! A [`GuardConfig`] is built once and handed to
//! [`ReportGuard`](crate::ReportGuard), which derives both the injected
//! artifact and the delivery headers from it.

use std::env::VarError;

use crate::allowed::AllowedOrigins;
use crate::error::Error;
use crate::report::{AuditSettings, FormFactor};

/// Environment variable listing the allowed origins.
///
/// Entries are separated by commas and/or whitespace. Unset or blank means
/// embedding is unrestricted.
pub const ENV_ALLOWED_ORIGINS: &str = "EMBED_GUARD_ALLOWED_ORIGINS";

/// Environment variable selecting the audit form factor (`desktop` or `mobile`).
pub const ENV_FORM_FACTOR: &str = "EMBED_GUARD_FORM_FACTOR";

/// The single configuration value shared by every enforcement layer.
///
/// # Examples
///
/// ```
/// use embed_guard::{AllowedOrigins, FormFactor, GuardConfig};
///
/// let config = GuardConfig::new(AllowedOrigins::parse(["https://a.example"]).unwrap())
///     .with_form_factor(FormFactor::Mobile);
/// assert_eq!(config.allowed().len(), 1);
/// assert_eq!(config.audit().form_factor, FormFactor::Mobile);
/// ```
#[derive(Debug, Clone, Default)]
pub struct GuardConfig {
    allowed: AllowedOrigins,
    audit: AuditSettings,
}

impl GuardConfig {
    /// Creates a configuration with desktop audit settings.
    pub fn new(allowed: AllowedOrigins) -> Self {
        Self {
            allowed,
            audit: AuditSettings::default(),
        }
    }

    /// Replaces the audit settings with the preset for `form_factor`.
    pub fn with_form_factor(mut self, form_factor: FormFactor) -> Self {
        self.audit = AuditSettings::for_form_factor(form_factor);
        self
    }

    /// Loads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] for an invalid origin and [`Error::Config`]
    /// for an unknown form factor or a variable that is not valid Unicode.
    pub fn from_env() -> Result<Self, Error> {
        Self::load(env_var)
    }

    /// Loads the configuration through an arbitrary key lookup.
    ///
    /// ```
    /// use embed_guard::GuardConfig;
    ///
    /// let config = GuardConfig::from_lookup(|key| match key {
    ///     "EMBED_GUARD_ALLOWED_ORIGINS" => Some("https://a.example, http://localhost:8000".into()),
    ///     _ => None,
    /// })
    /// .unwrap();
    /// assert_eq!(config.allowed().len(), 2);
    /// ```
    pub fn from_lookup<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::load(|key| Ok(lookup(key)))
    }

    fn load<F>(lookup: F) -> Result<Self, Error>
    where
        F: Fn(&str) -> Result<Option<String>, Error>,
    {
        let allowed = match lookup(ENV_ALLOWED_ORIGINS)? {
            Some(raw) => AllowedOrigins::parse(split_entries(&raw))?,
            None => AllowedOrigins::unrestricted(),
        };

        let form_factor = match lookup(ENV_FORM_FACTOR)? {
            Some(raw) if !raw.trim().is_empty() => raw.parse()?,
            _ => FormFactor::default(),
        };

        tracing::debug!(
            origins = allowed.len(),
            form_factor = %form_factor,
            "guard configuration loaded"
        );

        Ok(Self::new(allowed).with_form_factor(form_factor))
    }

    /// Returns the allow-list.
    pub fn allowed(&self) -> &AllowedOrigins {
        &self.allowed
    }

    /// Returns the audit settings.
    pub fn audit(&self) -> &AuditSettings {
        &self.audit
    }
}

/// Only an absent variable counts as unset. An unreadable one must not
/// fall back to the unrestricted default.
fn env_var(key: &str) -> Result<Option<String>, Error> {
    match std::env::var(key) {
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(VarError::NotUnicode(_)) => Err(Error::Config(format!(
            "{key} is set but is not valid Unicode"
        ))),
    }
}

fn split_entries(raw: &str) -> impl Iterator<Item = &str> {
    raw.split(|c: char| c == ',' || c.is_whitespace())
        .filter(|entry| !entry.is_empty())
}
