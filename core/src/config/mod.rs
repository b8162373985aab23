use crate::models::ModelTier;
use crate::providers::gemini::DEFAULT_REQUEST_TIMEOUT_SECS;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const GEMINAL_DIR: &str = ".geminal";
pub const DEFAULT_MAX_TURNS: usize = 20;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub api_key: String,
    pub base_url: Option<String>,
    pub model: ModelTier,
    pub system_instruction: Option<String>,
    pub tools_enabled: bool,
    /// Transport turns allowed per submission; 0 disables the cap.
    pub max_turns: usize,
    pub request_timeout_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            base_url: None,
            model: ModelTier::default(),
            system_instruction: None,
            tools_enabled: true,
            max_turns: DEFAULT_MAX_TURNS,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
        }
    }
}

pub fn get_geminal_dir() -> PathBuf {
    let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
    PathBuf::from(home).join(GEMINAL_DIR)
}

pub fn get_config_path() -> PathBuf {
    get_geminal_dir().join("config.toml")
}

pub fn get_history_path() -> PathBuf {
    get_geminal_dir().join("history.txt")
}

pub fn ensure_geminal_dir() -> Result<PathBuf> {
    let dir = get_geminal_dir();

    if !dir.exists() {
        std::fs::create_dir_all(&dir).with_context(|| {
            format!("Failed to create geminal directory at {}", dir.display())
        })?;
    }

    Ok(dir)
}

impl Config {
    pub fn load_or_init() -> Result<Self> {
        if config_exists() {
            load_config()
        } else {
            Ok(Config::default())
        }
    }
}

pub fn load_config() -> Result<Config> {
    load_config_from(&get_config_path())
}

pub fn load_config_from(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            anyhow::anyhow!(
                "Config file not found. Run 'geminal onboard' to set up your configuration."
            )
        } else {
            anyhow::anyhow!("Failed to read config from {}: {}", path.display(), e)
        }
    })?;

    toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))
}

pub fn save_config(config: &Config) -> Result<()> {
    ensure_geminal_dir()?;
    save_config_to(config, &get_config_path())
}

pub fn save_config_to(config: &Config, path: &Path) -> Result<()> {
    let content =
        toml::to_string_pretty(config).with_context(|| "Failed to serialize config to TOML")?;

    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    Ok(())
}

pub fn config_exists() -> bool {
    get_config_path().exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn save_then_load() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        let config = Config {
            api_key: "secret".into(),
            model: ModelTier::ProThinking,
            system_instruction: Some("Answer like a pirate.".into()),
            tools_enabled: false,
            ..Default::default()
        };

        save_config_to(&config, &path).unwrap();
        assert_eq!(load_config_from(&path).unwrap(), config);
    }

    #[test]
    fn partial_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "model = \"pro\"\n").unwrap();

        let config = load_config_from(&path).unwrap();
        assert_eq!(config.model, ModelTier::Pro);
        assert!(config.tools_enabled);
        assert_eq!(config.max_turns, DEFAULT_MAX_TURNS);
        assert!(config.api_key.is_empty());
    }

    #[test]
    fn missing_file_points_to_onboarding() {
        let tmp = TempDir::new().unwrap();
        let err = load_config_from(&tmp.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("geminal onboard"));
    }

    #[test]
    fn unknown_model_is_rejected() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(&path, "model = \"ultra\"\n").unwrap();
        assert!(load_config_from(&path).is_err());
    }
}
