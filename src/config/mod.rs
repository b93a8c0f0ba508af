//! Configuration for adlist-sync.
//!
//! Settings are read from `~/.config/adlist-sync/config.toml`. If the file
//! doesn't exist, a commented default is written. A `secrets.env` file with
//! `PIHOLE_HOST` / `WEBPASSWORD` lines, when present, overrides the TOML
//! values.

pub mod env_file;

use serde::Deserialize;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::reconcile::DEFAULT_MAX_REDIRECT_HOPS;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pihole: PiHoleConfig,
    pub probe: ProbeConfig,
    /// Seed list of candidate subscription URLs
    pub seed_file: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pihole: PiHoleConfig::default(),
            probe: ProbeConfig::default(),
            seed_file: PathBuf::from("pihole.list"),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PiHoleConfig {
    /// Base URL of the admin interface host, without `/admin`
    pub host: String,
    pub password: Option<String>,
    /// Timeout for admin interface requests in seconds
    pub timeout_secs: u64,
}

impl Default for PiHoleConfig {
    fn default() -> Self {
        Self {
            host: "http://127.0.0.1".to_string(),
            password: None,
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Per-request timeout in seconds (default: 10)
    pub timeout_secs: u64,

    /// Longest redirect chain followed from one address (default: 10)
    pub max_redirect_hops: usize,

    pub user_agent: String,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            max_redirect_hops: DEFAULT_MAX_REDIRECT_HOPS,
            user_agent: concat!("adlist-sync/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default path when `None`.
    ///
    /// A missing default config is created with comments. A missing explicit
    /// path is an error. Missing fields use default values.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config_path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let p = Self::default_config_path()?;
                if !p.exists() {
                    Self::create_default_config(&p)?;
                    return Ok(Self::default());
                }
                p
            }
        };

        let content = fs::read_to_string(&config_path).map_err(|e| ConfigError::Io {
            path: config_path.clone(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: config_path,
            source: e,
        })
    }

    /// Apply `PIHOLE_HOST` / `WEBPASSWORD` from a `secrets.env` file. A missing
    /// file leaves the config untouched.
    pub fn apply_env_file(&mut self, path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Ok(());
        }

        let content = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        let mut env = env_file::parse_env(&content);
        if let Some(host) = env.remove(env_file::HOST_KEY) {
            self.pihole.host = host;
        }
        if let Some(password) = env.remove(env_file::PASSWORD_KEY) {
            self.pihole.password = Some(password);
        }

        tracing::debug!("Applied overrides from {}", path.display());
        Ok(())
    }

    /// Get the default config file path: `~/.config/adlist-sync/config.toml`
    pub fn default_config_path() -> Result<PathBuf, ConfigError> {
        let config_dir = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        Ok(config_dir.join("adlist-sync").join("config.toml"))
    }

    fn create_default_config(path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }

        let mut file = fs::File::create(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;

        file.write_all(Self::default_config_content().as_bytes())
            .map_err(|e| ConfigError::Io {
                path: path.to_path_buf(),
                source: e,
            })?;

        tracing::info!("Wrote default config to {}", path.display());
        Ok(())
    }

    fn default_config_content() -> String {
        r##"# adlist-sync configuration
#
# Values from a secrets.env file (PIHOLE_HOST, WEBPASSWORD) override the
# [pihole] section when that file is present.

# Candidate subscription URLs, one per line. Lines containing '#' are ignored.
seed_file = "pihole.list"

[pihole]
host = "http://127.0.0.1"
# password = "admin password"
timeout_secs = 30

[probe]
# Timeout for each HEAD request in seconds
timeout_secs = 10

# Longest redirect chain followed from a single address
max_redirect_hops = 10
"##
        .to_string()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Could not determine config directory")]
    NoConfigDir,

    #[error("Failed to read/write config file at {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("No admin password configured (set WEBPASSWORD or [pihole].password)")]
    MissingPassword,
}
