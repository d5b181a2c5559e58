//! Configuration for the classifier adapter

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::dispatch::DEFAULT_MAX_CONCURRENCY;
use crate::gemini::{
    DEFAULT_ENDPOINT, DEFAULT_MAX_RETRIES, DEFAULT_MODEL, DEFAULT_RETRY_BASE_DELAY_SECS,
    DEFAULT_TIMEOUT_SECS,
};

/// Tunable knobs for the classifier adapter
///
/// Covers both the per-request behavior (endpoint, model, timeout, retry)
/// and the batch behavior (concurrency cap, stagger). Loadable from the
/// `[agent]` table of the CLI configuration file; missing fields fall back
/// to the defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Base URL of the classification API
    pub endpoint: String,

    /// Model to classify with
    pub model: String,

    /// Maximum time for a single classification request (seconds)
    pub timeout_secs: u64,

    /// Attempts per source before it is given up on
    pub max_retries: u32,

    /// First backoff delay (seconds); doubles on every further attempt
    pub retry_base_delay_secs: u64,

    /// Cap on concurrently in-flight classification calls
    pub max_concurrency: usize,

    /// Pause between task launches (milliseconds); 0 disables staggering
    pub stagger_ms: u64,
}

impl AgentConfig {
    /// Get the stagger delay, `None` when staggering is disabled
    pub fn stagger(&self) -> Option<Duration> {
        if self.stagger_ms == 0 {
            None
        } else {
            Some(Duration::from_millis(self.stagger_ms))
        }
    }

    /// Get the request timeout as a Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.endpoint.is_empty() {
            return Err("endpoint must not be empty".to_string());
        }
        if self.model.is_empty() {
            return Err("model must not be empty".to_string());
        }
        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }
        if self.max_retries == 0 {
            return Err("max_retries must be greater than 0".to_string());
        }
        if self.max_concurrency == 0 {
            return Err("max_concurrency must be greater than 0".to_string());
        }
        Ok(())
    }
}

impl Default for AgentConfig {
    /// Default configuration with balanced settings
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
            retry_base_delay_secs: DEFAULT_RETRY_BASE_DELAY_SECS,
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            stagger_ms: 0,
        }
    }
}

impl AgentConfig {
    /// Free-tier preset: one request at a time, spaced against low
    /// per-minute quotas, with patient backoff
    pub fn free_tier() -> Self {
        Self {
            max_retries: 6,
            retry_base_delay_secs: 15,
            max_concurrency: 1,
            stagger_ms: 4_000,
            ..Default::default()
        }
    }

    /// High-throughput preset: wide fan-out and short backoff for paid
    /// quotas or a local proxy
    pub fn high_throughput() -> Self {
        Self {
            max_retries: 3,
            retry_base_delay_secs: 2,
            max_concurrency: 16,
            stagger_ms: 0,
            ..Default::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.stagger(), None);
    }

    #[test]
    fn test_free_tier_config_is_valid() {
        let config = AgentConfig::free_tier();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_concurrency, 1);
        assert_eq!(config.stagger(), Some(Duration::from_millis(4_000)));
    }

    #[test]
    fn test_high_throughput_config_is_valid() {
        let config = AgentConfig::high_throughput();
        assert!(config.validate().is_ok());
        assert!(config.max_concurrency > AgentConfig::default().max_concurrency);
    }

    #[test]
    fn test_invalid_max_concurrency() {
        let config = AgentConfig {
            max_concurrency: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_empty_model() {
        let config = AgentConfig {
            model: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_round_trip() {
        let config = AgentConfig::free_tier();
        let toml_str = config.to_toml().unwrap();
        let parsed = AgentConfig::from_toml(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let parsed = AgentConfig::from_toml("max_concurrency = 2\n").unwrap();

        assert_eq!(parsed.max_concurrency, 2);
        assert_eq!(parsed.model, DEFAULT_MODEL);
        assert_eq!(parsed.max_retries, DEFAULT_MAX_RETRIES);
    }
}
