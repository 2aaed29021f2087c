//! Configuration file support

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// Default backend URL when neither config nor flag provides one
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Configuration for lobby
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend base URL
    pub api_url: Option<String>,
    /// Lookback window for dashboard series, in days
    pub days: Option<u32>,
    /// Default page size for the logs page
    pub page_size: Option<u32>,
    /// Color theme ("dark" or "light")
    pub theme: Option<String>,
}

impl Config {
    /// Get the config directory
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("lobby")
    }

    /// Get the config file path
    pub fn config_path() -> PathBuf {
        // Check for LOBBY_CONFIG_PATH env var first
        if let Ok(path) = std::env::var("LOBBY_CONFIG_PATH") {
            return PathBuf::from(path);
        }
        Self::config_dir().join("config.toml")
    }

    /// Load config from file
    pub fn load() -> Self {
        let path = Self::config_path();
        if !path.exists() {
            return Self::default();
        }

        match fs::read_to_string(&path) {
            Ok(content) => match toml::from_str(&content) {
                Ok(config) => config,
                Err(e) => {
                    eprintln!("Warning: Failed to parse config file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                eprintln!("Warning: Failed to read config file: {}", e);
                Self::default()
            }
        }
    }

    /// Save config to file
    pub fn save(&self) -> std::io::Result<()> {
        let path = Self::config_path();
        let dir = path.parent().unwrap();
        fs::create_dir_all(dir)?;

        let content = toml::to_string_pretty(self).map_err(std::io::Error::other)?;
        fs::write(path, content)
    }

    /// Create a default config file if it doesn't exist
    pub fn init() -> std::io::Result<PathBuf> {
        let path = Self::config_path();
        if path.exists() {
            return Ok(path);
        }

        let default_config = Config {
            api_url: Some(DEFAULT_API_URL.to_string()),
            days: Some(30),
            page_size: Some(25),
            theme: Some("dark".to_string()),
        };

        default_config.save()?;
        Ok(path)
    }

    /// Effective backend URL: flag beats config beats default
    pub fn api_url(&self, flag: Option<&str>) -> String {
        flag.map(str::to_string)
            .or_else(|| self.api_url.clone())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string())
    }
}

/// Generate example config content
pub fn example_config() -> &'static str {
    r#"# lobby configuration file
# Place at ~/.config/lobby/config.toml (Linux/Mac) or %APPDATA%\lobby\config.toml (Windows)

# Backend base URL
api_url = "http://localhost:8000"

# Lookback window for the dashboard series, in days
days = 30

# Page size for the logs page
page_size = 25

# Color theme (dark, light)
theme = "dark"
"#
}
