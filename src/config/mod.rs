//! Typed configuration from environment variables.
//!
//! Loads once at startup, fails fast if required vars are missing or
//! malformed. The database URL is wrapped in `secrecy::SecretString` so it
//! never lands in logs.

use crate::error::{Error, Result};
use secrecy::SecretString;
use std::path::PathBuf;

/// Default number of items prefetched per refill.
pub const DEFAULT_PREFETCH: usize = 10;

#[derive(Debug)]
pub struct Config {
    pub database_url: SecretString,
    pub otel_endpoint: Option<String>,
    pub log_level: String,
    /// Capacity of the local prefetch queue.
    pub prefetch_capacity: usize,
    /// Where the auto-advance preference is persisted.
    pub preferences_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// In local dev, call `dotenvy::dotenv().ok()` before this.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: SecretString::from(required_var("DATABASE_URL")?),
            otel_endpoint: std::env::var("OTEL_ENDPOINT").ok(),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            prefetch_capacity: prefetch_capacity()?,
            preferences_path: std::env::var("WORKLIST_PREFERENCES")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("worklist-prefs.toml")),
        })
    }
}

fn required_var(name: &str) -> Result<String> {
    std::env::var(name)
        .map_err(|_| Error::Config(format!("required environment variable {name} is not set")))
}

fn prefetch_capacity() -> Result<usize> {
    let Ok(raw) = std::env::var("WORKLIST_PREFETCH") else {
        return Ok(DEFAULT_PREFETCH);
    };
    parse_capacity(&raw)
}

/// Parse a prefetch capacity. Zero is rejected: the queue must hold at
/// least the next item.
pub fn parse_capacity(raw: &str) -> Result<usize> {
    match raw.trim().parse::<usize>() {
        Ok(0) => Err(Error::Config("WORKLIST_PREFETCH must be at least 1".to_string())),
        Ok(n) => Ok(n),
        Err(e) => Err(Error::Config(format!("bad WORKLIST_PREFETCH {raw:?}: {e}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_parses_positive_integers() {
        assert_eq!(parse_capacity("3").unwrap(), 3);
        assert_eq!(parse_capacity(" 25 ").unwrap(), 25);
    }

    #[test]
    fn capacity_rejects_zero_and_garbage() {
        assert!(matches!(parse_capacity("0"), Err(Error::Config(_))));
        assert!(matches!(parse_capacity("-1"), Err(Error::Config(_))));
        assert!(matches!(parse_capacity("ten"), Err(Error::Config(_))));
    }
}
