use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{FitError, Result};
use crate::units::Unit;

/// Global fitcheck configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Unit used when displaying measurements back to the user
    #[serde(default)]
    pub display_unit: Unit,

    /// DOM readiness timings
    #[serde(default)]
    pub timing: Timing,
}

/// How long to wait for asynchronously rendered size UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timing {
    /// Delay before the first size-UI check on ordinary sites
    #[serde(default = "default_initial_delay")]
    pub initial_delay_ms: u64,
    /// Delay before the first check on client-rendered storefronts
    #[serde(default = "default_client_rendered_delay")]
    pub client_rendered_delay_ms: u64,
    /// Size-UI checks after the first one on ordinary sites
    #[serde(default = "default_retries")]
    pub retries: u32,
    /// Size-UI checks after the first one on client-rendered storefronts
    #[serde(default = "default_client_rendered_retries")]
    pub client_rendered_retries: u32,
    /// Pause between size-UI checks
    #[serde(default = "default_retry_interval")]
    pub retry_interval_ms: u64,
    /// Upper bound on waiting for a site's size guide element
    #[serde(default = "default_element_timeout")]
    pub element_timeout_ms: u64,
}

fn default_initial_delay() -> u64 {
    1000
}

fn default_client_rendered_delay() -> u64 {
    2500
}

fn default_retries() -> u32 {
    3
}

fn default_client_rendered_retries() -> u32 {
    6
}

fn default_retry_interval() -> u64 {
    1000
}

fn default_element_timeout() -> u64 {
    10_000
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay(),
            client_rendered_delay_ms: default_client_rendered_delay(),
            retries: default_retries(),
            client_rendered_retries: default_client_rendered_retries(),
            retry_interval_ms: default_retry_interval(),
            element_timeout_ms: default_element_timeout(),
        }
    }
}

impl Timing {
    /// No waiting at all, for static snapshots that will never change
    pub fn immediate() -> Self {
        Self {
            initial_delay_ms: 0,
            client_rendered_delay_ms: 0,
            retries: 0,
            client_rendered_retries: 0,
            retry_interval_ms: 0,
            element_timeout_ms: 0,
        }
    }

    pub fn element_timeout(&self) -> Duration {
        Duration::from_millis(self.element_timeout_ms)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_unit: Unit::Cm,
            timing: Timing::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Ok(toml::from_str(&content)?)
        } else {
            Ok(Self::default())
        }
    }

    /// Get the config file path
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Get the config directory path
    pub fn config_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "fitcheck")
            .ok_or_else(|| FitError::ConfigError("Could not determine config directory".into()))?;
        Ok(dirs.config_dir().to_path_buf())
    }

    /// Get the data directory path
    pub fn data_dir() -> Result<PathBuf> {
        let dirs = ProjectDirs::from("", "", "fitcheck")
            .ok_or_else(|| FitError::ConfigError("Could not determine data directory".into()))?;
        Ok(dirs.data_dir().to_path_buf())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.timing.initial_delay_ms, 1000);
        assert_eq!(config.timing.client_rendered_retries, 6);
        assert_eq!(config.display_unit, Unit::Cm);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let config: Config = toml::from_str(
            r#"
display_unit = "inches"

[timing]
retries = 5
"#,
        )
        .unwrap();

        assert_eq!(config.display_unit, Unit::Inches);
        assert_eq!(config.timing.retries, 5);
        assert_eq!(config.timing.element_timeout_ms, 10_000);
    }
}
