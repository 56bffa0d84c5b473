use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_DESKTOP_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";
pub const DEFAULT_MOBILE_USER_AGENT: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
pub const DEFAULT_URL_PATTERN: &str = r"^https?://(?:www\.|vm\.)?tiktok\.com/.*$";
pub const DEFAULT_FALLBACK_API_BASE: &str = "http://localhost:3000/api/tiktok";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_logging_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            format: default_logging_format(),
        }
    }
}

fn default_logging_format() -> String {
    "json".to_string()
}

/// One entry of the `urls` list. Anything other than a string is kept so the
/// validator can reject it on its own instead of failing the whole file.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum UrlEntry {
    Url(String),
    Other(toml::Value),
}

impl UrlEntry {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            UrlEntry::Url(url) => Some(url),
            UrlEntry::Other(_) => None,
        }
    }
}

impl std::fmt::Display for UrlEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlEntry::Url(url) => f.write_str(url),
            UrlEntry::Other(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for UrlEntry {
    fn from(url: &str) -> Self {
        UrlEntry::Url(url.to_string())
    }
}

impl From<String> for UrlEntry {
    fn from(url: String) -> Self {
        UrlEntry::Url(url)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
#[serde(default)]
pub struct Config {
    pub desktop_user_agent: String,
    pub mobile_user_agent: String,
    pub url_pattern: String,
    pub fallback_api_base: String,
    /// Extra query parameters sent with every fallback API request
    pub default_query: BTreeMap<String, String>,
    pub video_dir: PathBuf,
    pub image_dir: PathBuf,
    /// Pause before every URL except the first one in a batch
    pub request_delay_ms: u64,
    pub request_timeout_secs: u64,
    pub urls: Vec<UrlEntry>,
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            desktop_user_agent: DEFAULT_DESKTOP_USER_AGENT.to_string(),
            mobile_user_agent: DEFAULT_MOBILE_USER_AGENT.to_string(),
            url_pattern: DEFAULT_URL_PATTERN.to_string(),
            fallback_api_base: DEFAULT_FALLBACK_API_BASE.to_string(),
            default_query: BTreeMap::new(),
            video_dir: PathBuf::from("videos"),
            image_dir: PathBuf::from("images"),
            request_delay_ms: 2000,
            request_timeout_secs: 60,
            urls: Vec::new(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path))?;
        Self::from_toml(&contents).with_context(|| format!("Failed to parse config file {}", path))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn get_logging_format(&self) -> &str {
        &self.logging.format
    }

    pub fn request_delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.request_delay_ms)
    }

    pub fn request_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.request_timeout_secs)
    }
}
