//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. Services never read environment variables themselves; binaries
//! call [`from_env`] once, build a [`CoreConfig`] and share it as `Arc<CoreConfig>`.

use crate::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};
use crate::{ClinicError, ClinicResult};
use reqwest::Url;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    backend_url: Url,
    anon_key: String,
    page_size: usize,
    smoke_password: Option<String>,
}

impl CoreConfig {
    /// Create a new `CoreConfig` for the hosted backend at `backend_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] if the URL is not an absolute http(s) URL or the
    /// anon key is blank.
    pub fn new(backend_url: &str, anon_key: impl Into<String>) -> ClinicResult<Self> {
        let backend_url = parse_backend_url(backend_url)?;
        let anon_key = anon_key.into();
        if anon_key.trim().is_empty() {
            return Err(ClinicError::InvalidInput(
                "backend anon key cannot be empty".into(),
            ));
        }

        Ok(Self {
            backend_url,
            anon_key,
            page_size: DEFAULT_PAGE_SIZE,
            smoke_password: None,
        })
    }

    /// Override the default page size.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] unless `page_size` is in `1..=500`.
    pub fn with_page_size(mut self, page_size: usize) -> ClinicResult<Self> {
        if page_size == 0 || page_size > MAX_PAGE_SIZE {
            return Err(ClinicError::InvalidInput(format!(
                "page size must be between 1 and {MAX_PAGE_SIZE}, got {page_size}"
            )));
        }
        self.page_size = page_size;
        Ok(self)
    }

    /// Enable the smoke-test harness behind `password`. Blank passwords leave it disabled.
    pub fn with_smoke_password(mut self, password: Option<String>) -> Self {
        self.smoke_password = password.filter(|p| !p.trim().is_empty());
        self
    }

    pub fn backend_url(&self) -> &Url {
        &self.backend_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn smoke_password(&self) -> Option<&str> {
        self.smoke_password.as_deref()
    }
}

fn parse_backend_url(value: &str) -> ClinicResult<Url> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ClinicError::InvalidInput(
            "backend URL cannot be empty".into(),
        ));
    }

    // A trailing slash keeps `Url::join` from dropping the last path segment.
    let normalised = if trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    };
    let url = Url::parse(&normalised)
        .map_err(|e| ClinicError::InvalidInput(format!("invalid backend URL '{trimmed}': {e}")))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ClinicError::InvalidInput(format!(
            "backend URL must use http or https, got '{other}'"
        ))),
    }
}

/// Placeholder URL used when running against the in-memory backend.
pub const MEMORY_BACKEND_URL: &str = "http://localhost:54321";

/// Which backend the binaries talk to (`CLINIC_BACKEND`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BackendKind {
    #[default]
    Remote,
    Memory,
}

impl BackendKind {
    /// `None`, blank and `remote` select the hosted backend; `memory` the in-process one.
    pub fn from_env_value(value: Option<String>) -> ClinicResult<Self> {
        match value.as_deref().map(str::trim).unwrap_or_default() {
            "" | "remote" => Ok(BackendKind::Remote),
            "memory" => Ok(BackendKind::Memory),
            other => Err(ClinicError::InvalidInput(format!(
                "unknown backend '{other}', expected 'remote' or 'memory'"
            ))),
        }
    }
}

/// Raw environment values, kept separate from `std::env` so resolution can be tested.
#[derive(Clone, Debug, Default)]
pub struct EnvValues {
    pub backend: Option<String>,
    pub backend_url: Option<String>,
    pub anon_key: Option<String>,
    pub page_size: Option<String>,
    pub smoke_password: Option<String>,
}

impl EnvValues {
    pub fn read() -> Self {
        let var = |name: &str| std::env::var(name).ok();
        Self {
            backend: var("CLINIC_BACKEND"),
            backend_url: var("CLINIC_BACKEND_URL"),
            anon_key: var("CLINIC_ANON_KEY"),
            page_size: var("CLINIC_PAGE_SIZE"),
            smoke_password: var("CLINIC_SMOKE_PASSWORD"),
        }
    }

    /// Builds the configuration. The hosted backend needs both URL and anon key; the
    /// in-memory one falls back to placeholders.
    ///
    /// # Errors
    ///
    /// Returns [`ClinicError::InvalidInput`] for a missing or malformed value.
    pub fn resolve(self) -> ClinicResult<(CoreConfig, BackendKind)> {
        let kind = BackendKind::from_env_value(self.backend)?;
        let present = |v: Option<String>| v.filter(|v| !v.trim().is_empty());
        let (url, anon_key) = match kind {
            BackendKind::Remote => (
                present(self.backend_url).ok_or_else(|| {
                    ClinicError::InvalidInput("CLINIC_BACKEND_URL is not set".into())
                })?,
                present(self.anon_key).ok_or_else(|| {
                    ClinicError::InvalidInput("CLINIC_ANON_KEY is not set".into())
                })?,
            ),
            BackendKind::Memory => (
                present(self.backend_url).unwrap_or_else(|| MEMORY_BACKEND_URL.into()),
                present(self.anon_key).unwrap_or_else(|| "memory".into()),
            ),
        };

        let config = CoreConfig::new(&url, anon_key)?
            .with_page_size(page_size_from_env_value(self.page_size)?)?
            .with_smoke_password(self.smoke_password);
        Ok((config, kind))
    }
}

/// Reads and resolves the `CLINIC_*` variables.
pub fn from_env() -> ClinicResult<(CoreConfig, BackendKind)> {
    EnvValues::read().resolve()
}

/// Parse the page size from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_PAGE_SIZE`].
pub fn page_size_from_env_value(value: Option<String>) -> ClinicResult<usize> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_PAGE_SIZE),
        Some(v) => v
            .parse::<usize>()
            .map_err(|_| ClinicError::InvalidInput(format!("invalid page size '{v}'"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_normalises_trailing_slash() {
        let cfg = CoreConfig::new("https://abc.supabase.co", "anon").expect("valid config");
        assert_eq!(cfg.backend_url().as_str(), "https://abc.supabase.co/");
        assert_eq!(cfg.page_size(), DEFAULT_PAGE_SIZE);
        assert!(cfg.smoke_password().is_none());
    }

    #[test]
    fn new_rejects_bad_url_and_blank_key() {
        assert!(CoreConfig::new("not a url", "anon").is_err());
        assert!(CoreConfig::new("ftp://example.com", "anon").is_err());
        assert!(CoreConfig::new("", "anon").is_err());
        assert!(CoreConfig::new("http://localhost:54321", "  ").is_err());
    }

    #[test]
    fn page_size_must_be_in_range() {
        let cfg = CoreConfig::new("http://localhost:54321", "anon").expect("valid config");
        assert!(cfg.clone().with_page_size(0).is_err());
        assert!(cfg.clone().with_page_size(MAX_PAGE_SIZE + 1).is_err());
        assert_eq!(
            cfg.with_page_size(25).expect("25 is allowed").page_size(),
            25
        );
    }

    #[test]
    fn blank_smoke_password_stays_disabled() {
        let cfg = CoreConfig::new("http://localhost:54321", "anon")
            .expect("valid config")
            .with_smoke_password(Some("   ".into()));
        assert!(cfg.smoke_password().is_none());
    }

    #[test]
    fn page_size_env_value_defaults_and_parses() {
        assert_eq!(
            page_size_from_env_value(None).expect("default"),
            DEFAULT_PAGE_SIZE
        );
        assert_eq!(
            page_size_from_env_value(Some(" ".into())).expect("default"),
            DEFAULT_PAGE_SIZE
        );
        assert_eq!(
            page_size_from_env_value(Some("20".into())).expect("parsed"),
            20
        );
        assert!(page_size_from_env_value(Some("abc".into())).is_err());
    }

    #[test]
    fn backend_kind_parses_known_values() {
        assert_eq!(BackendKind::from_env_value(None).expect("default"), BackendKind::Remote);
        assert_eq!(
            BackendKind::from_env_value(Some(" memory ".into())).expect("memory"),
            BackendKind::Memory
        );
        assert!(BackendKind::from_env_value(Some("sqlite".into())).is_err());
    }

    #[test]
    fn remote_backend_requires_url_and_key() {
        let err = EnvValues::default().resolve().expect_err("url missing");
        assert!(err.to_string().contains("CLINIC_BACKEND_URL"));

        let err = EnvValues {
            backend_url: Some("https://abc.supabase.co".into()),
            ..EnvValues::default()
        }
        .resolve()
        .expect_err("key missing");
        assert!(err.to_string().contains("CLINIC_ANON_KEY"));
    }

    #[test]
    fn memory_backend_uses_placeholders() {
        let (cfg, kind) = EnvValues {
            backend: Some("memory".into()),
            page_size: Some("20".into()),
            smoke_password: Some("s3nha".into()),
            ..EnvValues::default()
        }
        .resolve()
        .expect("memory config");
        assert_eq!(kind, BackendKind::Memory);
        assert_eq!(cfg.backend_url().as_str(), "http://localhost:54321/");
        assert_eq!(cfg.page_size(), 20);
        assert_eq!(cfg.smoke_password(), Some("s3nha"));
    }
}
