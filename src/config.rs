//! Configuration management for urlfeatures
//!
//! Configuration is loaded from `./config/urlfeatures.toml`. The template in
//! `config/urlfeatures.toml` is compiled into the binary and is the only place
//! defaults live; it is used as-is when no file exists on disk.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::fs;
use std::io::{self, Write};
use std::time::Duration;
use thiserror::Error;

/// Configuration file path relative to working directory
pub const CONFIG_PATH: &str = "./config/urlfeatures.toml";

/// Default configuration file content
pub const DEFAULT_CONFIG: &str = include_str!("../config/urlfeatures.toml");

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found at {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] io::Error),

    #[error("Failed to parse configuration file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid URL in '{field}': {url}")]
    InvalidUrl { field: String, url: String },

    #[error("Configuration field '{field}' cannot be empty")]
    EmptyRequired { field: String },

    #[error("Configuration field '{field}' must be greater than 0")]
    MustBePositive { field: String },
}

/// Root configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub http: HttpConfig,
    pub batch: BatchConfig,
    pub data: DataConfig,
    pub probes: ProbeConfig,
}

/// HTTP client configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HttpConfig {
    pub user_agent: String,
    /// Deadline for the page fetch (each attempt)
    pub request_timeout_secs: u64,
    /// Deadline for probe requests and external link checks
    pub probe_timeout_secs: u64,
    #[serde(default = "default_max_redirects")]
    pub max_redirects: usize,
}

impl HttpConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }
}

fn default_max_redirects() -> usize {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct BatchConfig {
    pub workers: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    pub brands_path: String,
}

/// Endpoints and limits for the reputation probes
#[derive(Debug, Clone, Deserialize)]
pub struct ProbeConfig {
    pub domain_age_url: String,
    pub page_rank_url: String,
    pub traffic_rank_url: String,
    pub search_url: String,
    pub fallback_search_url: String,
    #[serde(default = "default_whois_timeout_secs")]
    pub whois_timeout_secs: u64,
    /// Requests per second per probe service (0 = unlimited)
    #[serde(default)]
    pub requests_per_second: u32,
    #[serde(default = "default_check_external_links")]
    pub check_external_links: bool,
    #[serde(default = "default_external_link_concurrency")]
    pub external_link_concurrency: usize,
}

fn default_whois_timeout_secs() -> u64 {
    10
}

fn default_check_external_links() -> bool {
    true
}

fn default_external_link_concurrency() -> usize {
    8
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from_path(Path::new(CONFIG_PATH))
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    /// Load from `path` if given, else the default path, falling back to the
    /// built-in template when the default file does not exist.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(p) => Self::load_from_path(p),
            None => match Self::load() {
                Err(ConfigError::FileNotFound(_)) => Self::from_toml(DEFAULT_CONFIG),
                other => other,
            },
        }
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.http.user_agent.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "http.user_agent".to_string(),
            });
        }
        if self.http.request_timeout_secs == 0 {
            return Err(ConfigError::MustBePositive {
                field: "http.request_timeout_secs".to_string(),
            });
        }
        if self.http.probe_timeout_secs == 0 {
            return Err(ConfigError::MustBePositive {
                field: "http.probe_timeout_secs".to_string(),
            });
        }
        if self.batch.workers == 0 {
            return Err(ConfigError::MustBePositive {
                field: "batch.workers".to_string(),
            });
        }
        if self.data.brands_path.is_empty() {
            return Err(ConfigError::EmptyRequired {
                field: "data.brands_path".to_string(),
            });
        }
        if self.probes.external_link_concurrency == 0 {
            return Err(ConfigError::MustBePositive {
                field: "probes.external_link_concurrency".to_string(),
            });
        }

        let endpoints = [
            ("probes.domain_age_url", &self.probes.domain_age_url),
            ("probes.page_rank_url", &self.probes.page_rank_url),
            ("probes.traffic_rank_url", &self.probes.traffic_rank_url),
            ("probes.search_url", &self.probes.search_url),
            ("probes.fallback_search_url", &self.probes.fallback_search_url),
        ];
        for (field, url) in endpoints {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(ConfigError::InvalidUrl {
                    field: field.to_string(),
                    url: url.to_string(),
                });
            }
        }

        Ok(())
    }

    /// Create default configuration file at the standard location
    pub fn create_default_config() -> Result<PathBuf, ConfigError> {
        let path = Path::new(CONFIG_PATH);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::File::create(path)?;
        file.write_all(DEFAULT_CONFIG.as_bytes())?;

        Ok(path.to_path_buf())
    }
}
