use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for the whole client.
///
/// Every section is optional in the YAML file and falls back to its defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub rag: RagConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub speech: SpeechConfig,
}

/// Where the chat backend lives.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub base_url: String,
}

/// Chat request composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Model used when no preference is stored or the model list is unreachable
    pub default_model: String,
    /// Fixed system instruction sent ahead of every user message
    pub system_prompt: String,
    pub temperature: f64,
}

/// Knowledge base settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagConfig {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    /// Character ceiling the server applies to imported documents
    #[serde(default = "default_max_imported_chars")]
    pub max_imported_chars: usize,
}

fn default_top_k() -> usize {
    3
}

fn default_max_imported_chars() -> usize {
    40_000
}

/// Client-side persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub preferences_path: String,
}

/// Spoken replies through the backend's text-to-speech endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeechConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_rate")]
    pub rate: u32,
    #[serde(default)]
    pub voice: Option<String>,
    pub output_path: String,
}

fn default_rate() -> u32 {
    180
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
        }
    }
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            default_model: "llama3.2:1b".to_string(),
            system_prompt: "Du är en hjälpsam assistent. Svara alltid på svenska.".to_string(),
            temperature: 0.7,
        }
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            default_top_k: default_top_k(),
            max_imported_chars: default_max_imported_chars(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            preferences_path: "./data/preferences.json".to_string(),
        }
    }
}

impl Default for SpeechConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            rate: default_rate(),
            voice: Some("sv".to_string()),
            output_path: "./data/reply.wav".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `ragdesk.yaml` if it exists, otherwise use defaults.
    pub fn load_or_default() -> Self {
        Self::load("ragdesk.yaml").unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chat_config_defaults() {
        let config = ChatConfig::default();
        assert_eq!(config.default_model, "llama3.2:1b");
        assert_eq!(config.temperature, 0.7);
        assert!(!config.system_prompt.is_empty());
    }

    #[test]
    fn test_rag_config_defaults() {
        let config = RagConfig::default();
        assert_eq!(config.default_top_k, 3);
        assert_eq!(config.max_imported_chars, 40_000);
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let yaml = "server:\n  base_url: http://pi.local:8000\nrag:\n  default_top_k: 5\n";
        let config: Config = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.base_url, "http://pi.local:8000");
        assert_eq!(config.rag.default_top_k, 5);
        assert_eq!(config.rag.max_imported_chars, 40_000);
        assert_eq!(config.chat.default_model, "llama3.2:1b");
        assert_eq!(config.storage.preferences_path, "./data/preferences.json");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ragdesk.yaml");
        fs::write(&path, "speech:\n  enabled: true\n  output_path: /tmp/out.wav\n").unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.speech.enabled);
        assert_eq!(config.speech.rate, 180);
        assert_eq!(config.speech.output_path, "/tmp/out.wav");
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = Config::load("/nonexistent/ragdesk.yaml");
        assert!(matches!(result, Err(ConfigError::FileRead(_))));
    }
}
