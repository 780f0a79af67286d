//! Application configuration.

use std::{fs, path::Path, path::PathBuf, time::Duration};

use eyre::{Result, WrapErr};
use pericope_delivery::DeliveryConfig;
use serde::{Deserialize, Serialize};

use crate::cli::LinkArgs;

/// Configuration for the pericope binary.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct AppConfig {
    /// Client delivery settings
    pub(crate) delivery: DeliveryConfig,

    /// Simulated link settings
    pub(crate) link: LinkConfig,

    /// Companion settings
    pub(crate) companion: CompanionConfig,
}

/// Simulated link between client and companion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct LinkConfig {
    /// Probability that an outbound transmission fails, 0.0 to 1.0
    pub(crate) failure_rate: f64,

    /// Probability that one attempt at sending a response fails, 0.0 to 1.0
    pub(crate) inbound_failure_rate: f64,

    /// One-way latency in milliseconds
    pub(crate) latency_ms: u64,

    /// Pause before the companion resends a failed response, in milliseconds
    pub(crate) retry_delay_ms: u64,

    /// Seed for failure simulation. Random when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) seed: Option<u64>,
}

impl LinkConfig {
    pub(crate) fn latency(&self) -> Duration {
        Duration::from_millis(self.latency_ms)
    }

    pub(crate) fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    /// How long the link must stay quiet before a session is considered done.
    pub(crate) fn idle_timeout(&self) -> Duration {
        self.latency() * 4 + self.retry_delay() + Duration::from_millis(250)
    }

    pub(crate) fn clamped_failure_rate(&self) -> f64 {
        clamp_rate(self.failure_rate)
    }

    pub(crate) fn clamped_inbound_failure_rate(&self) -> f64 {
        clamp_rate(self.inbound_failure_rate)
    }
}

fn clamp_rate(rate: f64) -> f64 {
    if rate.is_nan() {
        return 0.0;
    }
    rate.clamp(0.0, 1.0)
}

impl Default for LinkConfig {
    fn default() -> Self {
        Self {
            failure_rate: 0.2,
            inbound_failure_rate: 0.1,
            latency_ms: 10,
            retry_delay_ms: 30,
            seed: None,
        }
    }
}

/// Companion settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub(crate) struct CompanionConfig {
    /// Where favorites are stored
    pub(crate) favorites_path: PathBuf,

    /// JSON verse file. The built-in sample is used when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) verses_path: Option<PathBuf>,
}

impl Default for CompanionConfig {
    fn default() -> Self {
        Self {
            favorites_path: PathBuf::from("favorites.json"),
            verses_path: None,
        }
    }
}

impl AppConfig {
    /// Load the configuration from `path`, writing the defaults there first
    /// if it does not exist.
    pub(crate) fn load_or_create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        if path.exists() {
            let content = fs::read_to_string(path)
                .wrap_err_with(|| format!("failed to read config: {}", path.display()))?;
            let config: Self = toml::from_str(&content)
                .wrap_err_with(|| format!("failed to parse config: {}", path.display()))?;
            Ok(config)
        } else {
            let config = Self::default();
            config.save(path)?;
            Ok(config)
        }
    }

    /// Save the configuration to the given path
    pub(crate) fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;

        Ok(())
    }

    /// Apply command line overrides.
    pub(crate) fn apply_args(&mut self, args: &LinkArgs) {
        if let Some(rate) = args.failure_rate {
            self.link.failure_rate = rate;
        }
        if let Some(rate) = args.inbound_failure_rate {
            self.link.inbound_failure_rate = rate;
        }
        if let Some(latency) = args.latency_ms {
            self.link.latency_ms = latency;
        }
        if args.seed.is_some() {
            self.link.seed = args.seed;
        }
        if let Some(path) = &args.verses {
            self.companion.verses_path = Some(path.clone());
        }
        if let Some(path) = &args.favorites {
            self.companion.favorites_path = path.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use pericope_delivery::TokenStrategy;

    use super::*;

    #[test]
    fn test_load_or_create_writes_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("conf").join("pericope.toml");

        let created = AppConfig::load_or_create(&path).unwrap();
        assert!(path.exists());
        assert_eq!(created, AppConfig::default());

        let loaded = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(loaded, created);
    }

    #[test]
    fn test_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pericope.toml");
        fs::write(&path, "[delivery]\ntoken_strategy = \"clock\"\n\n[link]\nfailure_rate = 0.5\n")
            .unwrap();

        let config = AppConfig::load_or_create(&path).unwrap();
        assert_eq!(config.delivery.token_strategy, TokenStrategy::Clock);
        assert_eq!(config.delivery.max_attempts, 3);
        assert_eq!(config.link.failure_rate, 0.5);
        assert_eq!(config.link.latency_ms, 10);
    }

    #[test]
    fn test_cli_overrides() {
        let mut config = AppConfig::default();
        config.apply_args(&LinkArgs {
            failure_rate: Some(0.0),
            inbound_failure_rate: Some(0.5),
            seed: Some(7),
            ..Default::default()
        });
        assert_eq!(config.link.failure_rate, 0.0);
        assert_eq!(config.link.inbound_failure_rate, 0.5);
        assert_eq!(config.link.seed, Some(7));
        assert_eq!(config.link.latency_ms, 10);
    }

    #[test]
    fn test_failure_rate_clamped() {
        let link = LinkConfig {
            failure_rate: 4.0,
            inbound_failure_rate: f64::NAN,
            ..Default::default()
        };
        assert_eq!(link.clamped_failure_rate(), 1.0);
        assert_eq!(link.clamped_inbound_failure_rate(), 0.0);
    }
}
