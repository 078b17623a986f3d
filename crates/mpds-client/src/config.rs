use anyhow::{Context, Result};
use confyg::{env, Confygery};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::{Duration, TryFromFloatSecsError};

use mpds_core::ProjectMetadata;

use crate::datatype::DataType;

/// Environment variable holding the API key, as understood by the
/// official MPDS clients.
pub const API_KEY_VAR: &str = "MPDS_KEY";

pub(crate) const DEFAULT_CHILLOUT: Duration = Duration::from_secs(2);

/// Configuration for the MPDS toolkit.
///
/// Configuration is loaded from multiple sources with the following priority:
/// 1. CLI arguments (highest priority)
/// 2. Environment variables (MPDS_* prefix)
/// 3. Config file (~/.config/mpds/config.toml)
/// 4. Built-in defaults (lowest priority)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// MPDS API key, sent in the `Key` header.
    ///
    /// Can be set via:
    /// - ENV: MPDS_KEY or MPDS_API_KEY
    /// - Config: api_key = "..."
    pub api_key: Option<String>,

    /// Faceted-search endpoint.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,

    /// Default data type of requests.
    #[serde(default)]
    pub dtype: DataType,

    /// Entries per page.
    #[serde(default = "default_pagesize")]
    pub pagesize: u32,

    /// Queries spanning more pages than this are refused.
    #[serde(default = "default_max_npages")]
    pub max_npages: u64,

    /// Largest number of phase ids sent in one request.
    #[serde(default = "default_max_nphases")]
    pub max_nphases: usize,

    /// Pause between consecutive page requests, seconds.
    #[serde(default = "default_chillout_secs")]
    pub chillout_secs: f64,

    /// Directory receiving CSV and JSON plot exports.
    ///
    /// Default: <system temp dir>/_MPDS
    #[serde(default = "default_export_dir")]
    pub export_dir: PathBuf,

    /// SQLite cache of harvested comparisons.
    ///
    /// Default: ~/.local/share/mpds/harvest.db
    #[serde(default = "default_cache_path")]
    pub cache_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_endpoint(),
            dtype: DataType::default(),
            pagesize: default_pagesize(),
            max_npages: default_max_npages(),
            max_nphases: default_max_nphases(),
            chillout_secs: default_chillout_secs(),
            export_dir: default_export_dir(),
            cache_path: default_cache_path(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables.
    ///
    /// Searches for config file at: ~/.config/mpds/config.toml
    /// Reads environment variables with MPDS_ prefix. When no key is
    /// configured, `MPDS_KEY` is consulted.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed.
    pub fn load() -> Result<Self> {
        let config_path = config_file_path();

        let mut builder = Confygery::new().context("Failed to create config builder")?;

        if config_path.exists() {
            let path_str = config_path
                .to_str()
                .ok_or_else(|| anyhow::anyhow!("Config path contains invalid UTF-8"))?;
            builder
                .add_file(path_str)
                .context("Failed to load config file")?;
        }

        let env_opts = env::Options::with_top_level("mpds");
        builder
            .add_env(env_opts)
            .context("Failed to load environment variables")?;

        let mut config: Self = builder.build().context("Failed to build configuration")?;
        if config.api_key.is_none() {
            config.api_key = std::env::var(API_KEY_VAR).ok().filter(|k| !k.is_empty());
        }
        config.validate()?;

        Ok(config)
    }

    /// Reject settings no request could be made with.
    pub fn validate(&self) -> Result<()> {
        if self.pagesize == 0 {
            anyhow::bail!("pagesize must be positive");
        }
        if self.max_nphases == 0 {
            anyhow::bail!("max_nphases must be positive");
        }
        self.chillout()
            .context("chillout_secs must be a non-negative number of seconds")?;
        Ok(())
    }

    /// Pause between pages; fails on negative, non-finite or out of range
    /// values.
    pub fn chillout(&self) -> Result<Duration, TryFromFloatSecsError> {
        Duration::try_from_secs_f64(self.chillout_secs)
    }
}

fn default_endpoint() -> String {
    ProjectMetadata::mpds().facet_endpoint()
}

const fn default_pagesize() -> u32 {
    1000
}

const fn default_max_npages() -> u64 {
    120
}

const fn default_max_nphases() -> usize {
    1500
}

fn default_chillout_secs() -> f64 {
    DEFAULT_CHILLOUT.as_secs_f64()
}

fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mpds")
}

fn default_export_dir() -> PathBuf {
    std::env::temp_dir().join("_MPDS")
}

fn default_cache_path() -> PathBuf {
    data_dir().join("harvest.db")
}

/// Get the config file path.
///
/// Returns:
/// - Linux: ~/.config/mpds/config.toml
/// - macOS: ~/Library/Application Support/mpds/config.toml
/// - Windows: %APPDATA%\mpds\config.toml
pub fn config_file_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("mpds")
        .join("config.toml")
}

/// Get the example config file content.
pub fn example_config() -> &'static str {
    r#"# MPDS Toolkit Configuration File
#
# Configuration is loaded from multiple sources with the following priority:
# 1. CLI arguments (highest priority)
# 2. Environment variables (MPDS_* prefix)
# 3. This config file
# 4. Built-in defaults (lowest priority)

# MPDS API key
#
# Obtain one at: https://mpds.io/developer
#
# Can also be set via:
# - Environment: MPDS_KEY=your-key-here
api_key = "your-mpds-api-key-here"

# Faceted-search endpoint
#endpoint = "https://api.mpds.io/v0/download/facet"

# Data type: peer_reviewed, machine_learning, ab_initio or all
#dtype = "peer_reviewed"

# Paging
#pagesize = 1000
#max_npages = 120
#max_nphases = 1500

# Pause between page requests, seconds
#chillout_secs = 2.0

# Where plot exports and the harvest cache are written
#
# Default: Platform-specific data directory
#export_dir = "/path/to/export"
#cache_path = "/path/to/harvest.db"
"#
}

/// Create default config file if it doesn't exist.
///
/// Returns true if a new file was created, false if it already existed.
pub fn ensure_config_file() -> Result<bool> {
    let config_path = config_file_path();

    if config_path.exists() {
        return Ok(false);
    }

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create config directory")?;
    }

    std::fs::write(&config_path, example_config()).context("Failed to write config file")?;

    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.api_key.is_none());
        assert_eq!(config.endpoint, "https://api.mpds.io/v0/download/facet");
        assert_eq!(config.dtype, DataType::PeerReviewed);
        assert_eq!(config.pagesize, 1000);
        assert_eq!(config.max_npages, 120);
        assert_eq!(config.max_nphases, 1500);
        assert_eq!(config.chillout().unwrap(), Duration::from_secs(2));
        assert!(config.cache_path.ends_with("harvest.db"));
        assert!(config.export_dir.ends_with("_MPDS"));
    }

    #[test]
    fn test_config_load() {
        // Should not fail even if config file doesn't exist
        let result = Config::load();
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_pagesize() {
        let config = Config {
            pagesize: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_negative_chillout() {
        let config = Config {
            chillout_secs: -1.0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_huge_chillout() {
        let config = Config {
            chillout_secs: 1e30,
            ..Config::default()
        };
        assert!(config.chillout().is_err());
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chillout_secs"));
    }

    #[test]
    fn test_validate_rejects_nan_chillout() {
        let config = Config {
            chillout_secs: f64::NAN,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_example_config_sets_only_the_key() {
        let assignments: Vec<&str> = example_config()
            .lines()
            .filter(|l| !l.trim().is_empty() && !l.starts_with('#'))
            .collect();
        assert_eq!(assignments, vec![r#"api_key = "your-mpds-api-key-here""#]);
    }

    #[test]
    fn test_config_file_path() {
        let path = config_file_path();
        assert!(path.ends_with("mpds/config.toml"));
    }
}
