use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_SHARE_BASE_URL: &str = "https://shoplist.app/";

/// Source of a configuration value
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfigSource {
    Default,
    File,
    Environment,
}

impl std::fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigSource::Default => write!(f, "default"),
            ConfigSource::File => write!(f, "file"),
            ConfigSource::Environment => write!(f, "environment"),
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }
}

/// Remote sync configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct RemoteConfig {
    /// Server URL (e.g., "https://sync.example.com")
    pub server_url: Option<String>,
    /// Bearer token, obtained outside this tool
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl RemoteConfig {
    /// Returns true if both a server and a token are available
    pub fn is_configured(&self) -> bool {
        self.server_url.is_some() && self.token.is_some()
    }
}

/// Application configuration with source tracking
#[derive(Debug, Clone, Serialize)]
pub struct Config {
    /// Directory holding the local store
    pub data_dir: ConfigValue<PathBuf>,
    /// Base URL of generated share links
    pub share_base_url: ConfigValue<String>,
    /// Config file path used (if any)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_file: Option<PathBuf>,
    pub remote: RemoteConfig,
}

/// Internal struct for deserializing config file
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct ConfigFile {
    data_dir: Option<PathBuf>,
    share_base_url: Option<String>,
    remote: Option<RemoteConfig>,
}

impl Config {
    /// Load configuration with priority: env vars > config file > defaults
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        Self::load_with_env(config_path, |key| std::env::var(key).ok())
    }

    fn load_with_env<F>(config_path: Option<PathBuf>, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut data_dir = ConfigValue::new(Self::default_data_dir(), ConfigSource::Default);
        let mut share_base_url =
            ConfigValue::new(DEFAULT_SHARE_BASE_URL.to_string(), ConfigSource::Default);
        let mut config_file = None;
        let mut remote = RemoteConfig::default();

        let path = config_path.unwrap_or_else(Self::default_config_path);
        if path.exists() {
            let contents = std::fs::read_to_string(&path)
                .map_err(|e| ConfigError::ReadError(path.clone(), e))?;
            let file_config: ConfigFile = serde_yaml::from_str(&contents)
                .map_err(|e| ConfigError::ParseError(path.clone(), e))?;

            config_file = Some(path.clone());

            if let Some(dir) = file_config.data_dir {
                // Relative paths are relative to the config file
                let resolved = if dir.is_relative() {
                    path.parent().map(|p| p.join(&dir)).unwrap_or(dir)
                } else {
                    dir
                };
                data_dir = ConfigValue::new(resolved, ConfigSource::File);
            }
            if let Some(url) = file_config.share_base_url {
                share_base_url = ConfigValue::new(url, ConfigSource::File);
            }
            if let Some(remote_config) = file_config.remote {
                remote = remote_config;
            }
        }

        if let Some(dir) = env("SHOPLIST_DATA_DIR") {
            data_dir = ConfigValue::new(PathBuf::from(dir), ConfigSource::Environment);
        }
        if let Some(url) = env("SHOPLIST_SHARE_URL") {
            share_base_url = ConfigValue::new(url, ConfigSource::Environment);
        }
        if let Some(url) = env("SHOPLIST_SERVER_URL") {
            remote.server_url = Some(url);
        }
        if let Some(token) = env("SHOPLIST_TOKEN") {
            remote.token = Some(token);
        }

        Ok(Self {
            data_dir,
            share_base_url,
            config_file,
            remote,
        })
    }

    /// Settings that would keep sharing or sync from working.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let share = self.share_base_url.value.as_str();
        if !(share.starts_with("http://") || share.starts_with("https://")) {
            problems.push(format!("share_base_url must be an http(s) URL, got '{}'", share));
        }
        if self.data_dir.value.exists() && !self.data_dir.value.is_dir() {
            problems.push(format!(
                "data_dir {} is not a directory",
                self.data_dir.value.display()
            ));
        }

        match (&self.remote.server_url, &self.remote.token) {
            (Some(url), _) if url.trim().is_empty() => {
                problems.push("remote.server_url is empty".to_string())
            }
            (Some(_), None) => problems
                .push("remote.server_url is set but there is no token (SHOPLIST_TOKEN)".to_string()),
            (None, Some(_)) => problems
                .push("a token is set but remote.server_url is missing".to_string()),
            _ => {}
        }
        problems
    }

    /// Default config directory (platform-specific):
    /// - Linux: ~/.config/shoplist/
    /// - macOS: ~/Library/Application Support/shoplist/
    /// - Windows: %APPDATA%/shoplist/
    pub fn default_config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoplist")
    }

    /// Default data directory (platform data dir + shoplist)
    pub fn default_data_dir() -> PathBuf {
        dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shoplist")
    }

    /// Default config file path (platform-specific config dir + config.yaml)
    pub fn default_config_path() -> PathBuf {
        Self::default_config_dir().join("config.yaml")
    }
}

#[derive(Debug)]
pub enum ConfigError {
    ReadError(PathBuf, std::io::Error),
    ParseError(PathBuf, serde_yaml::Error),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::ReadError(path, e) => {
                write!(f, "Failed to read config file '{}': {}", path.display(), e)
            }
            ConfigError::ParseError(path, e) => {
                write!(f, "Failed to parse config file '{}': {}", path.display(), e)
            }
        }
    }
}

impl std::error::Error for ConfigError {}
