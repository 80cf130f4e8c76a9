use std::{
    path::{
        Path,
        PathBuf,
    },
    time::Duration,
};

use serde::{
    Deserialize,
    Serialize,
};
use tracing::debug;

use super::{
    models::{
        MediaPosition,
        Speaker,
    },
    GermankiError,
};
use crate::persistence;

pub const SETTINGS_FILE: &str = "settings.json";
pub const PEXELS_API_KEY_ENV: &str = "PEXELS_API_KEY";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnkiSettings {
    pub host: String,
    pub port: u16,
    pub version: u32,
    pub timeout_secs: u64,
    pub model_name: String,
    pub tags: Vec<String>,
    pub allow_duplicate: bool,
    pub create_deck_if_missing: bool,
}

impl Default for AnkiSettings {
    fn default() -> Self {
        Self {
            host: "http://localhost".to_string(),
            port: 8765,
            version: 6,
            timeout_secs: 5,
            model_name: "Basic".to_string(),
            tags: Vec::new(),
            allow_duplicate: false,
            create_deck_if_missing: true,
        }
    }
}

impl AnkiSettings {
    pub fn base_url(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Where preview pages expect the media cache to be served from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreviewSettings {
    pub host: String,
    pub port: u16,
}

impl Default for PreviewSettings {
    fn default() -> Self {
        Self { host: "localhost".to_string(), port: 8501 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub pexels_api_key: String,
    pub openai_api_key: String,
    pub openai_model: String,
    pub openai_base_url: String,
    pub pexels_base_url: String,
    pub tts_base_url: String,
    pub media_root: PathBuf,
    pub audio_dir: PathBuf,
    pub image_dir: PathBuf,
    pub enable_extra: bool,
    pub image_position: MediaPosition,
    pub audio_position: MediaPosition,
    pub speakers: Vec<Speaker>,
    pub default_speaker: Speaker,
    pub max_image_pages: u32,
    pub http_timeout_secs: u64,
    pub anki: AnkiSettings,
    pub preview: PreviewSettings,
}

impl Default for Config {
    fn default() -> Self {
        let media_root = persistence::app_data_dir().join("media");
        Self {
            pexels_api_key: String::new(),
            openai_api_key: String::new(),
            openai_model: crate::input::openai::DEFAULT_MODEL.to_string(),
            openai_base_url: crate::input::openai::DEFAULT_BASE_URL.to_string(),
            pexels_base_url: crate::media::pexels::DEFAULT_BASE_URL.to_string(),
            tts_base_url: crate::media::tts::DEFAULT_BASE_URL.to_string(),
            audio_dir: media_root.join("audio"),
            image_dir: media_root.join("image"),
            media_root,
            enable_extra: true,
            image_position: MediaPosition::Back,
            audio_position: MediaPosition::Front,
            speakers: Speaker::ALL.to_vec(),
            default_speaker: Speaker::Vicki,
            max_image_pages: 100,
            http_timeout_secs: 30,
            anki: AnkiSettings::default(),
            preview: PreviewSettings::default(),
        }
    }
}

impl Config {
    /// Settings file (or defaults) with API keys from the environment on top.
    pub fn load() -> Result<Self, GermankiError> {
        let mut config: Config = persistence::load_json(SETTINGS_FILE)?;
        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    pub fn save(&self) -> Result<PathBuf, GermankiError> {
        persistence::save_json(self, SETTINGS_FILE)
    }

    pub fn apply_env_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = lookup(PEXELS_API_KEY_ENV).filter(|k| !k.is_empty()) {
            debug!("Using Pexels API key from {PEXELS_API_KEY_ENV}");
            self.pexels_api_key = key;
        }
        if let Some(key) = lookup(OPENAI_API_KEY_ENV).filter(|k| !k.is_empty()) {
            debug!("Using OpenAI API key from {OPENAI_API_KEY_ENV}");
            self.openai_api_key = key;
        }
    }

    pub fn audio_filepath(&self, filename: &str) -> PathBuf {
        self.audio_dir.join(filename)
    }

    pub fn image_filepath(&self, filename: &str) -> PathBuf {
        self.image_dir.join(filename)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Points every media directory below `root`.
    pub fn with_media_root(mut self, root: &Path) -> Self {
        self.media_root = root.to_path_buf();
        self.audio_dir = root.join("audio");
        self.image_dir = root.join("image");
        self
    }
}
