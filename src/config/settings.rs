//! Application settings loaded from an optional TOML file.
//!
//! Every field has a default, so the file may be absent or only name the values it changes.
//!
//! ```toml
//! database_url = "sqlite://data/stock_ledger.sqlite?mode=rwc"
//! direct_service_client = "direct-service"
//!
//! [category_prefixes]
//! "power supplies" = "PSU"
//! ```

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

/// Environment variable naming the settings file.
pub const SETTINGS_PATH_ENV: &str = "STOCK_LEDGER_CONFIG";

/// Settings file used when [`SETTINGS_PATH_ENV`] is not set.
pub const DEFAULT_SETTINGS_PATH: &str = "config.toml";

/// Code of the synthetic client used for visits without a client.
pub const DEFAULT_DIRECT_SERVICE_CLIENT: &str = "direct-service";

/// Settings for the ledger core
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Database URL; `DATABASE_URL` in the environment takes precedence
    pub database_url: Option<String>,
    /// Client code that visits without a client are booked against
    pub direct_service_client: String,
    /// Extra or overriding category → product-code prefix mappings
    pub category_prefixes: BTreeMap<String, String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            database_url: None,
            direct_service_client: DEFAULT_DIRECT_SERVICE_CLIENT.to_string(),
            category_prefixes: BTreeMap::new(),
        }
    }
}

/// Parses settings from TOML text.
///
/// # Errors
/// Returns [`Error::Config`] if the TOML is invalid or a value has the wrong type.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse settings: {e}"),
    })?;

    if settings.direct_service_client.trim().is_empty() {
        return Err(Error::Config {
            message: "direct_service_client cannot be empty".to_string(),
        });
    }

    Ok(settings)
}

/// Loads settings from `path`, falling back to defaults if the file does not exist.
///
/// # Errors
/// - [`Error::Io`] if the file exists but cannot be read
/// - [`Error::Config`] if it cannot be parsed
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path = path.as_ref();
    match std::fs::read_to_string(path) {
        Ok(contents) => parse_settings(&contents),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!("No settings file at {}, using defaults", path.display());
            Ok(Settings::default())
        }
        Err(e) => {
            tracing::error!("Failed to read settings file {}", path.display());
            Err(Error::Io(e))
        }
    }
}

/// Loads settings from the path in [`SETTINGS_PATH_ENV`], or [`DEFAULT_SETTINGS_PATH`].
pub fn load_default_settings() -> Result<Settings> {
    let path =
        std::env::var(SETTINGS_PATH_ENV).unwrap_or_else(|_| DEFAULT_SETTINGS_PATH.to_string());
    load_settings(path)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            database_url = "sqlite::memory:"
            direct_service_client = "walk-in"

            [category_prefixes]
            "power supplies" = "PSU"
            atm = "ATX"
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.database_url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(settings.direct_service_client, "walk-in");
        assert_eq!(settings.category_prefixes.len(), 2);
        assert_eq!(settings.category_prefixes["power supplies"], "PSU");
    }

    #[test]
    fn test_parse_empty_settings_uses_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings, Settings::default());
        assert_eq!(settings.direct_service_client, DEFAULT_DIRECT_SERVICE_CLIENT);
    }

    #[test]
    fn test_parse_rejects_bad_types() {
        let result = parse_settings("direct_service_client = 5");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_parse_rejects_blank_direct_service_client() {
        let result = parse_settings(r#"direct_service_client = "  ""#);
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let settings = load_settings("definitely/not/here/config.toml").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_unreadable_path_is_io_error() {
        // A directory exists but cannot be read as a file
        let err = load_settings(std::env::temp_dir()).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
        assert_eq!(err.kind(), crate::errors::ErrorKind::Internal);
    }
}
