use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub perplexity: PerplexityConfig,

    pub gemini: GeminiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/aisov.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,

    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 6780,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerplexityConfig {
    pub base_url: String,

    /// Overridden by AISOV_PERPLEXITY_API_KEY when set.
    pub api_key: String,

    pub model: String,

    /// Request timeout in seconds (default: 60)
    pub request_timeout_seconds: u64,
}

impl Default for PerplexityConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.perplexity.ai".to_string(),
            api_key: String::new(),
            model: "sonar-pro".to_string(),
            request_timeout_seconds: 60,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub base_url: String,

    /// Overridden by AISOV_GEMINI_API_KEY when set.
    pub api_key: String,

    pub model: String,

    /// Request timeout in seconds (default: 60)
    pub request_timeout_seconds: u64,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            base_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key: String::new(),
            model: "gemini-2.5-flash".to_string(),
            request_timeout_seconds: 60,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            perplexity: PerplexityConfig::default(),
            gemini: GeminiConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                return Self::load_from_path(path);
            }
        }

        info!("No config file found, using defaults");
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        config.apply_env_overrides();
        Ok(config)
    }

    /// Environment wins over the config file so keys can stay out of it.
    fn apply_env_overrides(&mut self) {
        if let Ok(key) = std::env::var("AISOV_PERPLEXITY_API_KEY") {
            self.perplexity.api_key = key;
        }
        if let Ok(key) = std::env::var("AISOV_GEMINI_API_KEY") {
            self.gemini.api_key = key;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("aisov").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".aisov").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    pub fn create_default_if_missing() -> Result<bool> {
        let path = Self::default_config_path();
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.perplexity.base_url.is_empty() {
            anyhow::bail!("Perplexity base URL cannot be empty");
        }

        if self.gemini.base_url.is_empty() {
            anyhow::bail!("Gemini base URL cannot be empty");
        }

        if self.perplexity.api_key.is_empty() {
            anyhow::bail!(
                "Perplexity API key is not set (config [perplexity].api_key or AISOV_PERPLEXITY_API_KEY)"
            );
        }

        if self.gemini.api_key.is_empty() {
            anyhow::bail!(
                "Gemini API key is not set (config [gemini].api_key or AISOV_GEMINI_API_KEY)"
            );
        }

        Ok(())
    }
}
