//! Configuration file parsing for the server.
//!
//! Loads settings from TOML files including bind address, database path, JWT
//! secret, lending limits, validation limits, and staff accounts.

use libris_domain::{LendingPolicy, DEFAULT_MAX_ACTIVE_LOANS};
use libris_gatekeeper::ValidationConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Server configuration error
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse TOML
    #[error("Failed to parse config TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Missing required field
    #[error("Missing required configuration field: {0}")]
    MissingField(String),

    /// Field present but unusable
    #[error("Invalid configuration value: {0}")]
    Invalid(String),
}

/// Server configuration loaded from TOML
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "127.0.0.1")
    pub bind_address: String,

    /// Bind port (e.g., 8080)
    pub bind_port: u16,

    /// SQLite database file (`:memory:` for a throwaway store)
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// JWT secret for signing tokens
    pub jwt_secret: String,

    /// Token expiry in seconds (default: 3600 = 1 hour)
    #[serde(default = "default_token_expiry")]
    pub token_expiry_secs: u64,

    /// How long a write waits on a locked database, in milliseconds
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,

    /// Tracing filter used when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Lending rules
    #[serde(default)]
    pub lending: LendingConfig,

    /// Field validation limits
    #[serde(default)]
    pub validation: ValidationConfig,

    /// Accounts allowed to obtain tokens
    #[serde(default)]
    pub staff: Vec<StaffAccount>,
}

/// Lending section
#[derive(Debug, Clone, Deserialize)]
pub struct LendingConfig {
    /// Maximum books a reader may hold at once
    #[serde(default = "default_max_active_loans")]
    pub max_active_loans: u32,
}

impl Default for LendingConfig {
    fn default() -> Self {
        Self {
            max_active_loans: DEFAULT_MAX_ACTIVE_LOANS,
        }
    }
}

impl LendingConfig {
    /// The lending policy described by this section
    pub fn policy(&self) -> LendingPolicy {
        LendingPolicy::new(self.max_active_loans)
    }
}

/// A staff login
///
/// Passwords are stored as BLAKE3 hex digests, never in plain text.
#[derive(Debug, Clone, Deserialize)]
pub struct StaffAccount {
    /// Login name
    pub username: String,

    /// Hex-encoded BLAKE3 digest of the password
    pub password_blake3: String,
}

impl StaffAccount {
    /// Build an account from a plain-text password
    pub fn with_password(username: impl Into<String>, password: &str) -> Self {
        Self {
            username: username.into(),
            password_blake3: blake3::hash(password.as_bytes()).to_hex().to_string(),
        }
    }

    /// Check a presented password against the stored digest
    pub fn verify(&self, password: &str) -> bool {
        match blake3::Hash::from_hex(&self.password_blake3) {
            // blake3::Hash equality is constant-time
            Ok(expected) => expected == blake3::hash(password.as_bytes()),
            Err(_) => false,
        }
    }
}

fn default_database_path() -> String {
    "libris.db".to_string()
}

/// Default token expiry: 1 hour
fn default_token_expiry() -> u64 {
    3600
}

fn default_busy_timeout_ms() -> u64 {
    5000
}

fn default_log_filter() -> String {
    "info".to_string()
}

fn default_max_active_loans() -> u32 {
    DEFAULT_MAX_ACTIVE_LOANS
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    /// Parse and validate configuration from TOML text
    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        let config: ServerConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt_secret.is_empty() {
            return Err(ConfigError::MissingField("jwt_secret".to_string()));
        }

        if self.lending.max_active_loans == 0 {
            return Err(ConfigError::Invalid(
                "lending.max_active_loans must be at least 1".to_string(),
            ));
        }

        for account in &self.staff {
            if blake3::Hash::from_hex(&account.password_blake3).is_err() {
                return Err(ConfigError::Invalid(format!(
                    "staff account '{}' has a malformed password_blake3 digest",
                    account.username
                )));
            }
        }

        Ok(())
    }

    /// Create a default configuration for testing
    pub fn default_test_config() -> Self {
        ServerConfig {
            bind_address: "127.0.0.1".to_string(),
            bind_port: 8080,
            database_path: ":memory:".to_string(),
            jwt_secret: "test-secret-key-do-not-use-in-production".to_string(),
            token_expiry_secs: 3600,
            busy_timeout_ms: default_busy_timeout_ms(),
            log_filter: default_log_filter(),
            lending: LendingConfig::default(),
            validation: ValidationConfig::default(),
            staff: vec![StaffAccount::with_password("librarian", "librarian")],
        }
    }

    /// Get the full bind address (address:port)
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.bind_address, self.bind_port)
    }

    /// Busy timeout as a Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.busy_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_address, "127.0.0.1");
        assert_eq!(config.bind_port, 8080);
        assert_eq!(config.database_path, ":memory:");
        assert_eq!(config.lending.max_active_loans, 3);
        assert_eq!(config.staff.len(), 1);
    }

    #[test]
    fn test_bind_addr() {
        let config = ServerConfig::default_test_config();
        assert_eq!(config.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_parse_toml() {
        let digest = blake3::hash(b"s3cret").to_hex().to_string();
        let toml = format!(
            r#"
            bind_address = "0.0.0.0"
            bind_port = 9000
            database_path = "/var/lib/libris/libris.db"
            jwt_secret = "my-secret"
            token_expiry_secs = 7200

            [lending]
            max_active_loans = 5

            [validation]
            max_title_len = 200

            [[staff]]
            username = "desk"
            password_blake3 = "{}"
            "#,
            digest
        );

        let config = ServerConfig::from_toml(&toml).unwrap();
        assert_eq!(config.bind_port, 9000);
        assert_eq!(config.database_path, "/var/lib/libris/libris.db");
        assert_eq!(config.token_expiry_secs, 7200);
        assert_eq!(config.busy_timeout_ms, 5000);
        assert_eq!(config.log_filter, "info");
        assert_eq!(config.lending.policy(), LendingPolicy::new(5));
        assert_eq!(config.validation.max_title_len, 200);
        assert_eq!(config.validation.max_author_len, 100);
        assert!(config.staff[0].verify("s3cret"));
        assert!(!config.staff[0].verify("wrong"));
    }

    #[test]
    fn test_missing_secret_rejected() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = ""
        "#;

        let err = ServerConfig::from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField(field) if field == "jwt_secret"));
    }

    #[test]
    fn test_zero_loan_cap_rejected() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = "s"

            [lending]
            max_active_loans = 0
        "#;

        assert!(matches!(
            ServerConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_bad_digest_rejected() {
        let toml = r#"
            bind_address = "127.0.0.1"
            bind_port = 8080
            jwt_secret = "s"

            [[staff]]
            username = "desk"
            password_blake3 = "not-hex"
        "#;

        assert!(matches!(
            ServerConfig::from_toml(toml),
            Err(ConfigError::Invalid(_))
        ));
    }
}
