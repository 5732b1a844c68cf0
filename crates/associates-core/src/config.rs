//! Onboarding configuration
//!
//! Loaded from TOML; every field has a default so an empty file is valid.
//!
//! ```toml
//! token_ttl_hours = 72
//! store_retries = 1
//! strict_cpf_checksum = false
//! ```

use chrono::Duration;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::ConfigError;

/// Upper bound on automatic retries of a single store call
pub const MAX_STORE_RETRIES: u32 = 3;

/// Longest accepted token lifetime, ten years
pub const MAX_TOKEN_TTL_HOURS: u64 = 10 * 366 * 24;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Lifetime of an access token in hours; 0 disables expiry
    pub token_ttl_hours: u64,
    /// Immediate retries of a store call that failed as unavailable
    pub store_retries: u32,
    /// Also verify CPF check digits, not just the length
    pub strict_cpf_checksum: bool,
    /// Fresh tokens generated when a value is already taken
    pub token_collision_retries: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            token_ttl_hours: 72,
            store_retries: 1,
            strict_cpf_checksum: false,
            token_collision_retries: 3,
        }
    }
}

impl CoreConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: CoreConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store_retries > MAX_STORE_RETRIES {
            return Err(ConfigError::Invalid(format!(
                "store_retries must be at most {MAX_STORE_RETRIES}, got {}",
                self.store_retries
            )));
        }
        if self.token_ttl_hours > MAX_TOKEN_TTL_HOURS {
            return Err(ConfigError::Invalid(format!(
                "token_ttl_hours must be at most {MAX_TOKEN_TTL_HOURS}, got {}",
                self.token_ttl_hours
            )));
        }
        Ok(())
    }

    /// Token lifetime, `None` when tokens never expire
    pub fn token_ttl(&self) -> Option<Duration> {
        if self.token_ttl_hours == 0 {
            return None;
        }
        i64::try_from(self.token_ttl_hours)
            .ok()
            .and_then(Duration::try_hours)
    }

    pub fn with_token_ttl_hours(mut self, hours: u64) -> Self {
        self.token_ttl_hours = hours;
        self
    }

    pub fn with_store_retries(mut self, retries: u32) -> Self {
        self.store_retries = retries;
        self
    }

    pub fn with_strict_cpf_checksum(mut self, strict: bool) -> Self {
        self.strict_cpf_checksum = strict;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = CoreConfig::default();
        assert_eq!(config.token_ttl(), Some(Duration::hours(72)));
        assert_eq!(config.store_retries, 1);
        assert!(!config.strict_cpf_checksum);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        assert_eq!(CoreConfig::from_toml_str("").unwrap(), CoreConfig::default());
    }

    #[test]
    fn test_zero_ttl_disables_expiry() {
        let config = CoreConfig::from_toml_str("token_ttl_hours = 0").unwrap();
        assert_eq!(config.token_ttl(), None);
    }

    #[test]
    fn test_rejects_excessive_retries() {
        let err = CoreConfig::from_toml_str("store_retries = 10").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_rejects_unbounded_ttl() {
        let err = CoreConfig::from_toml_str("token_ttl_hours = 10000000000").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));

        let config =
            CoreConfig::from_toml_str(&format!("token_ttl_hours = {MAX_TOKEN_TTL_HOURS}")).unwrap();
        assert!(config.token_ttl().is_some());
    }

    #[test]
    fn test_rejects_unparseable_toml() {
        let err = CoreConfig::from_toml_str("store_retries = \"many\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "strict_cpf_checksum = true\ntoken_ttl_hours = 24").unwrap();

        let config = CoreConfig::from_file(file.path()).unwrap();
        assert!(config.strict_cpf_checksum);
        assert_eq!(config.token_ttl(), Some(Duration::hours(24)));
    }
}
