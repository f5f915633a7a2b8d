//! Configuration management for ProvChain

use crate::error::{ChainError, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Hex length of a SHA-256 digest; no hash can have more leading zeros.
pub const MAX_DIFFICULTY: usize = 64;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Per-ledger parameters, fixed for the lifetime of a [`crate::blockchain::Ledger`].
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LedgerConfig {
    /// Required number of leading `'0'` hex digits in a block hash.
    #[serde(default = "default_difficulty")]
    pub difficulty: usize,
    /// Maximum number of pending transactions packed into one block.
    #[serde(default = "default_max_transactions")]
    pub max_transactions: usize,
    /// Optional cap on nonce attempts per block; `None` searches until found.
    #[serde(default)]
    pub max_attempts: Option<u64>,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            difficulty: default_difficulty(),
            max_transactions: default_max_transactions(),
            max_attempts: None,
        }
    }
}

impl LedgerConfig {
    pub fn new(difficulty: usize, max_transactions: usize) -> Self {
        Self {
            difficulty,
            max_transactions,
            max_attempts: None,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_transactions == 0 {
            return Err(ChainError::ConfigError(
                "ledger.max_transactions must be at least 1".to_string(),
            ));
        }
        if self.difficulty > MAX_DIFFICULTY {
            return Err(ChainError::ConfigError(format!(
                "ledger.difficulty must be at most {}, got {}",
                MAX_DIFFICULTY, self.difficulty
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Filter directive passed to the tracing subscriber, e.g. `info` or `provchain=debug`.
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

impl Config {
    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        config.ledger.validate()?;
        Ok(config)
    }
}

/// Load configuration from a TOML file, falling back to defaults when the
/// file does not exist.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(Config::default());
    }
    let config_str = fs::read_to_string(path)?;
    Config::from_toml_str(&config_str)
}

fn default_difficulty() -> usize {
    4
}

fn default_max_transactions() -> usize {
    3
}

fn default_level() -> String {
    "info".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_when_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let config = load_config(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.ledger.difficulty, 4);
        assert_eq!(config.ledger.max_transactions, 3);
        assert_eq!(config.ledger.max_attempts, None);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let config = Config::from_toml_str("[ledger]\ndifficulty = 2\n").unwrap();
        assert_eq!(config.ledger.difficulty, 2);
        assert_eq!(config.ledger.max_transactions, 3);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[ledger]\ndifficulty = 1\nmax_transactions = 2\nmax_attempts = 500\n\n[logging]\nlevel = \"debug\""
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.ledger, LedgerConfig { difficulty: 1, max_transactions: 2, max_attempts: Some(500) });
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = Config::from_toml_str("[ledger]\nmax_transactions = 0\n");
        assert!(matches!(result, Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_rejects_unreachable_difficulty() {
        let result = Config::from_toml_str("[ledger]\ndifficulty = 65\n");
        assert!(matches!(result, Err(ChainError::ConfigError(_))));
    }

    #[test]
    fn test_malformed_toml() {
        let result = Config::from_toml_str("[ledger\ndifficulty = ");
        assert!(matches!(result, Err(ChainError::ConfigError(_))));
    }
}
