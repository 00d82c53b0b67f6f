//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// One accepted username/password pair for the documentation gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminCredential {
    pub username: String,
    pub password: String,
}

/// Number of admin credentials the docs gate expects.
pub const DOCS_CREDENTIAL_COUNT: usize = 2;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Redis connection URL; cache is disabled when unset
    pub redis_url: Option<String>,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Default log filter when RUST_LOG is unset
    pub log_filter: String,

    /// Accepted credentials for the /docs subtree
    pub docs_credentials: Vec<AdminCredential>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let redis_url = env::var("REDIS_URL").ok();

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let log_filter = env::var("LOG_FILTER")
            .unwrap_or_else(|_| "magazin_pos=debug,tower_http=debug".to_string());

        let raw_credentials = env::var("DOCS_CREDENTIALS")
            .map_err(|_| ConfigError::MissingEnv("DOCS_CREDENTIALS"))?;
        let docs_credentials = parse_docs_credentials(&raw_credentials)?;

        Ok(Self {
            database_url,
            database_max_connections,
            redis_url,
            host,
            port,
            log_filter,
            docs_credentials,
        })
    }
}

/// Parse the `user:pass,user:pass` credential list for the docs gate.
///
/// The gate accepts exactly [`DOCS_CREDENTIAL_COUNT`] pairs; any other count
/// is a configuration error, caught here rather than at router construction.
pub fn parse_docs_credentials(raw: &str) -> Result<Vec<AdminCredential>, ConfigError> {
    let mut credentials = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let (username, password) = entry
            .split_once(':')
            .ok_or_else(|| ConfigError::DocsCredentialFormat(entry.to_string()))?;

        if username.is_empty() || password.is_empty() {
            return Err(ConfigError::DocsCredentialFormat(entry.to_string()));
        }

        credentials.push(AdminCredential {
            username: username.to_string(),
            password: password.to_string(),
        });
    }

    if credentials.len() != DOCS_CREDENTIAL_COUNT {
        return Err(ConfigError::DocsCredentialCount(credentials.len()));
    }

    Ok(credentials)
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Malformed docs credential entry: {0:?} (expected user:pass)")]
    DocsCredentialFormat(String),

    #[error("Expected exactly {DOCS_CREDENTIAL_COUNT} docs credentials, found {0}")]
    DocsCredentialCount(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_two_credentials() {
        let creds = parse_docs_credentials("alice:s3cret,bob:hunter2").unwrap();
        assert_eq!(creds.len(), 2);
        assert_eq!(creds[0].username, "alice");
        assert_eq!(creds[0].password, "s3cret");
        assert_eq!(creds[1].username, "bob");
        assert_eq!(creds[1].password, "hunter2");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let creds = parse_docs_credentials(" alice:s3cret , bob:hunter2 ").unwrap();
        assert_eq!(creds[1].username, "bob");
    }

    #[test]
    fn test_one_credential_is_rejected() {
        let err = parse_docs_credentials("alice:s3cret").unwrap_err();
        assert!(matches!(err, ConfigError::DocsCredentialCount(1)));
    }

    #[test]
    fn test_three_credentials_are_rejected() {
        let err = parse_docs_credentials("a:1,b:2,c:3").unwrap_err();
        assert!(matches!(err, ConfigError::DocsCredentialCount(3)));
    }

    #[test]
    fn test_entry_without_separator_is_rejected() {
        let err = parse_docs_credentials("alice,bob:hunter2").unwrap_err();
        assert!(matches!(err, ConfigError::DocsCredentialFormat(_)));
    }

    #[test]
    fn test_empty_password_is_rejected() {
        let err = parse_docs_credentials("alice:,bob:hunter2").unwrap_err();
        assert!(matches!(err, ConfigError::DocsCredentialFormat(_)));
    }
}
