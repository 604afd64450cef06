use crate::error::{LearnError, Result};
use crate::profile::Profile;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Credentials and tuning for the completion endpoint.
///
/// Owned by the caller and handed to the tutor at construction, so no
/// credentials live in process-wide state.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionConfig {
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub chat_temperature: f32,
    pub chat_max_tokens: u32,
    pub question_temperature: f32,
    pub check_temperature: f32,
}

impl Default for CompletionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            chat_temperature: 0.7,
            chat_max_tokens: 500,
            question_temperature: 0.7,
            check_temperature: 0.3,
        }
    }
}

impl CompletionConfig {
    pub fn new(api_key: Option<String>, base_url: Option<String>) -> Self {
        Self::default().with_credentials(api_key, base_url)
    }

    /// Credentials taken from the learner's profile.
    pub fn from_profile(profile: &Profile) -> Self {
        Self::new(profile.api_key.clone(), profile.api_base_url.clone())
    }

    pub fn with_credentials(mut self, api_key: Option<String>, base_url: Option<String>) -> Self {
        self.api_key = api_key.filter(|k| !k.trim().is_empty());
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// The API key, if one is set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }

    pub fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

/// Application settings persisted as JSON.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Config {
    pub model: Option<String>,
    pub default_preset: Option<String>,
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Self {
        Self {
            model: None,
            default_preset: Some("practice".to_string()),
            data_dir: None,
        }
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::get_config_path()?)
    }

    pub fn load_from(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Self::new());
        }

        let config_content = fs::read_to_string(config_path)?;
        let config: Config = serde_json::from_str(&config_content)
            .map_err(|e| LearnError::config(format!("{}: {}", config_path.display(), e)))?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::get_config_path()?)
    }

    pub fn save_to(&self, config_path: &Path) -> Result<()> {
        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let config_content = serde_json::to_string_pretty(self)?;
        fs::write(config_path, config_content)?;
        Ok(())
    }

    pub fn model(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn get_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| LearnError::config("Could not determine config directory"))?;

        Ok(config_dir.join("kidscholar").join("config.json"))
    }
}
