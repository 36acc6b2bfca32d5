//! Core runtime configuration.
//!
//! This module defines configuration that should be resolved once at process startup and then
//! passed into core services. The intent is to avoid reading process-wide environment variables
//! during request handling, which can lead to inconsistent behaviour in multi-threaded runtimes
//! and test harnesses.

use crate::{PatientError, PatientResult};
use std::path::{Path, PathBuf};

/// Default HTTP port when `PORT` is unset.
pub const DEFAULT_PORT: u16 = 4000;
/// Default allowed CORS origin when `ALLOWED_ORIGINS` is unset.
pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:4000";
/// Default store file when `DB_FILENAME` is unset.
pub const DEFAULT_DB_FILENAME: &str = "./database.sqlite";

/// The runtime environment the process was started in.
///
/// Selects operational behaviour only: whether internal error detail is
/// exposed in 500 responses. It never changes request semantics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RuntimeEnv {
    Development,
    Production,
    Test,
}

impl RuntimeEnv {
    fn as_str(self) -> &'static str {
        match self {
            RuntimeEnv::Development => "development",
            RuntimeEnv::Production => "production",
            RuntimeEnv::Test => "test",
        }
    }
}

impl std::fmt::Display for RuntimeEnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Application configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct AppConfig {
    env: RuntimeEnv,
    port: u16,
    allowed_origins: Vec<String>,
    db_filename: PathBuf,
}

impl AppConfig {
    /// Create a new `AppConfig`.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if `allowed_origins` is empty or
    /// `db_filename` is empty.
    pub fn new(
        env: RuntimeEnv,
        port: u16,
        allowed_origins: Vec<String>,
        db_filename: PathBuf,
    ) -> PatientResult<Self> {
        if allowed_origins.is_empty() {
            return Err(PatientError::InvalidInput(
                "allowed_origins cannot be empty".into(),
            ));
        }
        if db_filename.as_os_str().is_empty() {
            return Err(PatientError::InvalidInput(
                "db_filename cannot be empty".into(),
            ));
        }

        Ok(Self {
            env,
            port,
            allowed_origins,
            db_filename,
        })
    }

    /// Resolve the configuration from process environment variables.
    ///
    /// Reads `APP_ENV`, `PORT`, `ALLOWED_ORIGINS` and `DB_FILENAME`, falling
    /// back to the documented defaults when a variable is unset or blank.
    ///
    /// # Errors
    ///
    /// Returns `PatientError::InvalidInput` if a variable is set but cannot be
    /// parsed (e.g. a non-numeric `PORT`).
    pub fn from_env() -> PatientResult<Self> {
        let env = runtime_env_from_env_value(std::env::var("APP_ENV").ok())?;
        let port = port_from_env_value(std::env::var("PORT").ok())?;
        let allowed_origins = origins_from_env_value(std::env::var("ALLOWED_ORIGINS").ok());
        let db_filename = std::env::var("DB_FILENAME")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILENAME));

        Self::new(env, port, allowed_origins, db_filename)
    }

    pub fn env(&self) -> RuntimeEnv {
        self.env
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn allowed_origins(&self) -> &[String] {
        &self.allowed_origins
    }

    pub fn db_filename(&self) -> &Path {
        &self.db_filename
    }

    /// Whether 500 responses may carry internal failure detail.
    ///
    /// Only the development environment exposes detail; everywhere else the
    /// detail stays in the logs.
    pub fn expose_error_detail(&self) -> bool {
        self.env == RuntimeEnv::Development
    }
}

/// Parse the runtime environment from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns `Development`.
pub fn runtime_env_from_env_value(value: Option<String>) -> PatientResult<RuntimeEnv> {
    let value = value
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| !v.is_empty());

    match value.as_deref() {
        None => Ok(RuntimeEnv::Development),
        Some("development") => Ok(RuntimeEnv::Development),
        Some("production") => Ok(RuntimeEnv::Production),
        Some("test") => Ok(RuntimeEnv::Test),
        Some(other) => Err(PatientError::InvalidInput(format!(
            "unknown APP_ENV value: {other}"
        ))),
    }
}

/// Parse the HTTP port from an optional string value.
///
/// If `value` is `None` or empty/whitespace, returns [`DEFAULT_PORT`].
pub fn port_from_env_value(value: Option<String>) -> PatientResult<u16> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    match value {
        None => Ok(DEFAULT_PORT),
        Some(raw) => raw
            .parse::<u16>()
            .map_err(|_| PatientError::InvalidInput(format!("PORT is not a valid port: {raw}"))),
    }
}

/// Parse the allowed CORS origins from an optional comma-separated value.
///
/// Blank entries are dropped. If nothing remains, the default origin is used.
pub fn origins_from_env_value(value: Option<String>) -> Vec<String> {
    let origins: Vec<String> = value
        .as_deref()
        .unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|o| !o.is_empty())
        .map(str::to_owned)
        .collect();

    if origins.is_empty() {
        vec![DEFAULT_ALLOWED_ORIGIN.to_owned()]
    } else {
        origins
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runtime_env_defaults_to_development() {
        assert_eq!(
            runtime_env_from_env_value(None).expect("default env"),
            RuntimeEnv::Development
        );
        assert_eq!(
            runtime_env_from_env_value(Some("  ".into())).expect("blank env"),
            RuntimeEnv::Development
        );
    }

    #[test]
    fn runtime_env_parses_known_values() {
        assert_eq!(
            runtime_env_from_env_value(Some("Production".into())).expect("production"),
            RuntimeEnv::Production
        );
        assert_eq!(
            runtime_env_from_env_value(Some("test".into())).expect("test"),
            RuntimeEnv::Test
        );
    }

    #[test]
    fn runtime_env_rejects_unknown_values() {
        let err = runtime_env_from_env_value(Some("staging".into())).expect_err("unknown env");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn port_defaults_when_unset() {
        assert_eq!(port_from_env_value(None).expect("default port"), DEFAULT_PORT);
    }

    #[test]
    fn port_rejects_garbage() {
        assert!(port_from_env_value(Some("not-a-port".into())).is_err());
        assert!(port_from_env_value(Some("70000".into())).is_err());
    }

    #[test]
    fn origins_split_and_trim() {
        let origins = origins_from_env_value(Some(
            "http://localhost:3000, http://example.com ,".into(),
        ));
        assert_eq!(origins, vec!["http://localhost:3000", "http://example.com"]);
    }

    #[test]
    fn origins_default_when_unset() {
        assert_eq!(
            origins_from_env_value(None),
            vec![DEFAULT_ALLOWED_ORIGIN.to_owned()]
        );
    }

    #[test]
    fn config_rejects_empty_origins() {
        let err = AppConfig::new(
            RuntimeEnv::Test,
            4000,
            vec![],
            PathBuf::from("./database.sqlite"),
        )
        .expect_err("empty origins");
        assert!(matches!(err, PatientError::InvalidInput(_)));
    }

    #[test]
    fn only_development_exposes_error_detail() {
        let dev = AppConfig::new(
            RuntimeEnv::Development,
            4000,
            vec![DEFAULT_ALLOWED_ORIGIN.into()],
            PathBuf::from(DEFAULT_DB_FILENAME),
        )
        .expect("dev config");
        let prod = AppConfig::new(
            RuntimeEnv::Production,
            4000,
            vec![DEFAULT_ALLOWED_ORIGIN.into()],
            PathBuf::from(DEFAULT_DB_FILENAME),
        )
        .expect("prod config");

        assert!(dev.expose_error_detail());
        assert!(!prod.expose_error_detail());
    }
}
