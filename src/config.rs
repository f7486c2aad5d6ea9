//! Client configuration
//!
//! Loaded from a TOML file when one exists, then overridden from the
//! environment. Every field has a default so an empty or missing file works.

use crate::messages::RetrievalSettings;
use crate::{RagChatError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "RAGCHAT_CONFIG";
/// Environment variable overriding the backend URL
pub const BASE_URL_ENV: &str = "RAGCHAT_BASE_URL";

/// Configuration for the chat client
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Base URL of the retrieval backend
    pub base_url: String,

    /// Retrieval options selected at startup
    pub retrieval: RetrievalSettings,

    /// Whether voice input is offered
    pub enable_audio_input: bool,

    /// Start with the dark theme
    pub dark_mode: bool,

    /// Questions offered before the first message
    pub suggested_questions: Vec<String>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            retrieval: RetrievalSettings::default(),
            enable_audio_input: true,
            dark_mode: false,
            suggested_questions: vec![
                "Quale legge ha istituito il Ministero del Turismo?".to_string(),
                "Cosa prevede il comma 3 dell’articolo 6 del Decreto-Legge 1° marzo 2021, n. 22?"
                    .to_string(),
                "Cosa stabilisce il DPCM del 20 maggio 2021, n. 102?".to_string(),
                "Cos’è il Regolamento (UE) n. 2021/241 del 12 febbraio 2021?".to_string(),
                "Quando è stato approvato il PNRR italiano dal Consiglio ECOFIN?".to_string(),
            ],
        }
    }
}

impl ChatConfig {
    /// Default config file location: `<config_dir>/ragchat/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ragchat").join("config.toml"))
    }

    /// Load from `$RAGCHAT_CONFIG` or the default path, then apply env overrides.
    ///
    /// A missing file is not an error; a malformed one is.
    pub fn load() -> Result<Self> {
        let path = std::env::var_os(CONFIG_ENV)
            .map(PathBuf::from)
            .or_else(Self::default_path);

        let mut config = match path {
            Some(path) if path.exists() => Self::from_file(&path)?,
            Some(path) => {
                debug!("No config file at {:?}, using defaults", path);
                Self::default()
            }
            None => Self::default(),
        };

        if let Ok(url) = std::env::var(BASE_URL_ENV) {
            config.base_url = url;
        }

        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| RagChatError::Config(format!("Invalid config file: {}", e)))
    }

    /// Set the backend URL
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set the startup retrieval options
    pub fn with_retrieval(mut self, retrieval: RetrievalSettings) -> Self {
        self.retrieval = retrieval;
        self
    }

    /// Apply choices saved from the window
    pub fn with_preferences(mut self, prefs: &Preferences) -> Self {
        if let Some(dark) = prefs.dark_mode {
            self.dark_mode = dark;
        }
        self
    }

    /// Disable audio input (text-only mode)
    pub fn without_audio_input(mut self) -> Self {
        self.enable_audio_input = false;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let url = self.base_url.trim();
        if url.is_empty() {
            return Err(RagChatError::Config("Backend base URL is empty".to_string()));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(RagChatError::Config(format!(
                "Backend base URL must start with http:// or https://: {}",
                url
            )));
        }
        Ok(())
    }
}

/// Choices made in the window that outlive a restart
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    /// Last theme picked with the header toggle
    pub dark_mode: Option<bool>,
}

impl Preferences {
    /// `<config_dir>/ragchat/prefs.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ragchat").join("prefs.toml"))
    }

    /// Read saved preferences; a missing file gives the defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content)
            .map_err(|e| RagChatError::Config(format!("Invalid preferences file: {}", e)))
    }

    /// Like `load_from`, but a broken file is logged and ignored
    pub fn load_or_default(path: &Path) -> Self {
        Self::load_from(path).unwrap_or_else(|e| {
            warn!("Ignoring preferences at {:?}: {}", path, e);
            Self::default()
        })
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        let content = toml::to_string(self)
            .map_err(|e| RagChatError::Config(format!("Cannot write preferences: {}", e)))?;
        std::fs::write(path, content)?;
        debug!("Saved preferences to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ChatConfig::default();
        assert_eq!(config.base_url, "http://127.0.0.1:8000");
        assert!(config.enable_audio_input);
        assert_eq!(config.suggested_questions.len(), 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = ChatConfig::default()
            .with_base_url("https://rag.example.org")
            .with_retrieval(RetrievalSettings::new("Late-chunking", "250", "Parent-document"))
            .without_audio_input();

        assert_eq!(config.base_url, "https://rag.example.org");
        assert_eq!(config.retrieval.chunk_size, "250");
        assert!(!config.enable_audio_input);
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ChatConfig::from_toml(
            r#"
            base_url = "http://10.0.0.5:8000"

            [retrieval]
            approach = "Late-chunking"
            chunk_size = "250"
            retriever = "Hybrid-fusion"
            "#,
        )
        .unwrap();

        assert_eq!(config.base_url, "http://10.0.0.5:8000");
        assert_eq!(config.retrieval.retriever, "Hybrid-fusion");
        assert!(config.enable_audio_input);
        assert_eq!(config.suggested_questions.len(), 5);
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let result = ChatConfig::from_toml("base_url = [");
        assert!(matches!(result, Err(RagChatError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_bad_url() {
        assert!(ChatConfig::default().with_base_url("").validate().is_err());
        assert!(ChatConfig::default()
            .with_base_url("ftp://host")
            .validate()
            .is_err());
    }

    fn scratch_path() -> PathBuf {
        std::env::temp_dir()
            .join(format!("ragchat-test-{}", uuid::Uuid::new_v4()))
            .join("prefs.toml")
    }

    #[test]
    fn test_preferences_survive_save_and_load() {
        let path = scratch_path();
        assert_eq!(Preferences::load_from(&path).unwrap(), Preferences::default());

        let prefs = Preferences { dark_mode: Some(true) };
        prefs.save_to(&path).unwrap();

        let loaded = Preferences::load_from(&path).unwrap();
        assert_eq!(loaded, prefs);
        assert!(ChatConfig::default().with_preferences(&loaded).dark_mode);

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }

    #[test]
    fn test_unset_preference_keeps_config_value() {
        let config = ChatConfig {
            dark_mode: true,
            ..ChatConfig::default()
        };
        assert!(config.with_preferences(&Preferences::default()).dark_mode);
    }

    #[test]
    fn test_broken_preferences_fall_back_to_defaults() {
        let path = scratch_path();
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, "dark_mode = [").unwrap();

        assert!(Preferences::load_from(&path).is_err());
        assert_eq!(Preferences::load_or_default(&path), Preferences::default());

        let _ = std::fs::remove_dir_all(path.parent().unwrap());
    }
}
