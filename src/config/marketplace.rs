//! Marketplace configuration loading from config.toml
//!
//! The file has three optional sections: `[database]` with the connection url,
//! `[admin]` with the administrator seeded on startup, and `[registration]` with
//! sign-up rules. Missing sections and fields fall back to defaults, and a missing
//! file yields the default configuration.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings
    pub database: DatabaseConfig,
    /// Administrator seeded on startup
    pub admin: AdminConfig,
    /// Sign-up rules
    pub registration: RegistrationConfig,
}

/// Database settings
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// Connection url; `DATABASE_URL` takes precedence when set
    pub url: Option<String>,
}

/// Administrator account created when no account has its email
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Display name
    pub name: String,
    /// Login email
    pub email: String,
    /// Initial password
    pub password: String,
    /// Document stored verbatim on the account
    pub document: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            name: "Administrator".to_string(),
            email: "admin@ecotrade.com".to_string(),
            password: "admin123".to_string(),
            document: "000.000.000-00".to_string(),
        }
    }
}

/// Sign-up rules
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistrationConfig {
    /// Shortest accepted password, in characters
    pub min_password_length: usize,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            min_password_length: 6,
        }
    }
}

/// Parses configuration from a TOML string.
///
/// # Errors
/// Returns `Error::Config` if the TOML is malformed or a field has the wrong type.
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })
}

/// Loads marketplace configuration from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Returns
/// * `Ok(Config)` - Parsed configuration, or defaults if the file does not exist
/// * `Err(Error)` - The file exists but could not be read or parsed
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        info!("No config file at {}, using defaults", path.display());
        return Ok(Config::default());
    }

    debug!("Loading configuration from {}", path.display());
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path.display()),
    })?;
    parse_config(&contents)
}

/// Loads configuration from the default location (./config.toml)
pub fn load_default_config() -> Result<Config> {
    load_config(DEFAULT_CONFIG_PATH)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            [database]
            url = "sqlite::memory:"

            [admin]
            name = "Auditoria"
            email = "audit@ecotrade.com"
            password = "s3cret!"
            document = "111.444.777-35"

            [registration]
            min_password_length = 10
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.database.url.as_deref(), Some("sqlite::memory:"));
        assert_eq!(config.admin.name, "Auditoria");
        assert_eq!(config.admin.email, "audit@ecotrade.com");
        assert_eq!(config.admin.document, "111.444.777-35");
        assert_eq!(config.registration.min_password_length, 10);
    }

    #[test]
    fn test_parse_partial_config_uses_defaults() {
        let toml_str = r#"
            [admin]
            password = "changed"
        "#;

        let config = parse_config(toml_str).unwrap();
        assert!(config.database.url.is_none());
        assert_eq!(config.admin.email, "admin@ecotrade.com");
        assert_eq!(config.admin.password, "changed");
        assert_eq!(config.registration.min_password_length, 6);
    }

    #[test]
    fn test_parse_empty_config() {
        let config = parse_config("").unwrap();
        assert_eq!(config.admin.name, "Administrator");
    }

    #[test]
    fn test_parse_invalid_config() {
        let result = parse_config("[registration]\nmin_password_length = \"six\"");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_load_missing_file_yields_defaults() {
        let config = load_config("does/not/exist/config.toml").unwrap();
        assert_eq!(config.registration.min_password_length, 6);
    }
}
