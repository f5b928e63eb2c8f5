//! Configuration types

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::{ConfigError, MongochromeError, MongochromeResult};

/// When a write is mirrored into the collection cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WritePolicy {
    /// Mutate the cache before the store confirms; keep the mutation if the
    /// store fails. Reads stay available but may show unpersisted values.
    #[default]
    Optimistic,
    /// Mutate the cache only after the store confirms.
    Pessimistic,
}

impl WritePolicy {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "optimistic" => Some(WritePolicy::Optimistic),
            "pessimistic" => Some(WritePolicy::Pessimistic),
            _ => None,
        }
    }
}

/// Master configuration struct.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MongochromeConfig {
    pub write_policy: WritePolicy,
    /// Hold a per-(collection, root key) lock across each read-modify-write.
    pub serialize_key_writes: bool,
    /// Buffer size of the connection event channel.
    pub event_capacity: usize,
    /// Run a full sync when the connection opens.
    pub sync_on_open: bool,
}

impl Default for MongochromeConfig {
    fn default() -> Self {
        Self {
            write_policy: WritePolicy::Optimistic,
            serialize_key_writes: false,
            event_capacity: 256,
            sync_on_open: true,
        }
    }
}

impl MongochromeConfig {
    /// Parse a TOML document. Missing fields take their defaults.
    pub fn from_toml_str(contents: &str) -> MongochromeResult<Self> {
        let config: MongochromeConfig = toml::from_str(contents).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML config file.
    pub fn from_path(path: &Path) -> MongochromeResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(ConfigError::from)?;
        Self::from_toml_str(&contents)
    }

    /// Create from environment variables with fallback to defaults.
    ///
    /// Environment variables:
    /// - `MONGOCHROME_WRITE_POLICY`: `optimistic` or `pessimistic` (default: optimistic)
    /// - `MONGOCHROME_SERIALIZE_KEY_WRITES`: `true`/`false` (default: false)
    /// - `MONGOCHROME_EVENT_CAPACITY`: event channel capacity (default: 256)
    /// - `MONGOCHROME_SYNC_ON_OPEN`: `true`/`false` (default: true)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            write_policy: std::env::var("MONGOCHROME_WRITE_POLICY")
                .ok()
                .and_then(|s| WritePolicy::parse(&s))
                .unwrap_or(defaults.write_policy),
            serialize_key_writes: std::env::var("MONGOCHROME_SERIALIZE_KEY_WRITES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.serialize_key_writes),
            event_capacity: std::env::var("MONGOCHROME_EVENT_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.event_capacity),
            sync_on_open: std::env::var("MONGOCHROME_SYNC_ON_OPEN")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.sync_on_open),
        }
    }

    pub fn with_write_policy(mut self, policy: WritePolicy) -> Self {
        self.write_policy = policy;
        self
    }

    pub fn with_serialized_key_writes(mut self, enabled: bool) -> Self {
        self.serialize_key_writes = enabled;
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    pub fn with_sync_on_open(mut self, enabled: bool) -> Self {
        self.sync_on_open = enabled;
        self
    }

    /// Validate the configuration.
    pub fn validate(&self) -> MongochromeResult<()> {
        if self.event_capacity == 0 {
            return Err(MongochromeError::Config(ConfigError::InvalidValue {
                field: "event_capacity".to_string(),
                value: self.event_capacity.to_string(),
                reason: "event_capacity must be greater than 0".to_string(),
            }));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_is_valid_and_optimistic() {
        let config = MongochromeConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.write_policy, WritePolicy::Optimistic);
        assert!(config.sync_on_open);
        assert!(!config.serialize_key_writes);
    }

    #[test]
    fn test_builder() {
        let config = MongochromeConfig::default()
            .with_write_policy(WritePolicy::Pessimistic)
            .with_serialized_key_writes(true)
            .with_event_capacity(8)
            .with_sync_on_open(false);

        assert_eq!(config.write_policy, WritePolicy::Pessimistic);
        assert!(config.serialize_key_writes);
        assert_eq!(config.event_capacity, 8);
        assert!(!config.sync_on_open);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let config = MongochromeConfig::default().with_event_capacity(0);
        assert!(matches!(
            config.validate(),
            Err(MongochromeError::Config(ConfigError::InvalidValue { .. }))
        ));
    }

    #[test]
    fn test_from_toml_str_partial() {
        let config = MongochromeConfig::from_toml_str("write_policy = \"pessimistic\"\n").unwrap();
        assert_eq!(config.write_policy, WritePolicy::Pessimistic);
        assert_eq!(config.event_capacity, 256);
    }

    #[test]
    fn test_from_toml_str_rejects_unknown_field() {
        let err = MongochromeConfig::from_toml_str("cache_size = 10\n").unwrap_err();
        assert!(matches!(err, MongochromeError::Config(ConfigError::Parse(_))));
    }

    #[test]
    fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "serialize_key_writes = true").unwrap();
        writeln!(file, "event_capacity = 16").unwrap();

        let config = MongochromeConfig::from_path(file.path()).unwrap();
        assert!(config.serialize_key_writes);
        assert_eq!(config.event_capacity, 16);
    }

    #[test]
    fn test_from_path_missing_file() {
        let err = MongochromeConfig::from_path(Path::new("/nonexistent/mongochrome.toml")).unwrap_err();
        assert!(matches!(err, MongochromeError::Config(ConfigError::Io(_))));
    }

    #[test]
    fn test_write_policy_parse() {
        assert_eq!(WritePolicy::parse(" Pessimistic "), Some(WritePolicy::Pessimistic));
        assert_eq!(WritePolicy::parse("optimistic"), Some(WritePolicy::Optimistic));
        assert_eq!(WritePolicy::parse("eager"), None);
    }
}
