use std::path::PathBuf;

use thiserror::Error;

use super::models::MediaKind;
use crate::{
    anki::AnkiConnectError,
    input::InputError,
    media::PexelsError,
};

#[derive(Error, Debug)]
pub enum MediaError {
    #[error("Image search failed: {0}")]
    ImageSearch(#[from] PexelsError),

    #[error("Speech synthesis failed: {0}")]
    Speech(String),

    #[error("No image source configured")]
    ImageSourceUnavailable,

    #[error("Download from {url} failed: {message}")]
    Download { url: String, message: String },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One media slot that could not be filled while enriching a card.
#[derive(Debug)]
pub struct MediaFailure {
    pub index: usize,
    pub word: String,
    pub kind: MediaKind,
    pub error: MediaError,
}

impl std::fmt::Display for MediaFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "card {} ({}) {}: {}", self.index + 1, self.word, self.kind, self.error)
    }
}

fn list_failures(failures: &[MediaFailure]) -> String {
    failures.iter().map(|failure| format!("  - {failure}")).collect::<Vec<_>>().join("\n")
}

#[derive(Error, Debug)]
pub enum GermankiError {
    #[error("I/O error: {0}")]
    Io(Box<std::io::Error>),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Reqwest error: {0}")]
    Reqwest(Box<reqwest::Error>),

    #[error(transparent)]
    Pexels(#[from] PexelsError),

    #[error(transparent)]
    AnkiConnect(#[from] AnkiConnectError),

    #[error(transparent)]
    Media(#[from] MediaError),

    #[error(transparent)]
    InvalidInput(#[from] InputError),

    #[error("Invalid speaker '{0}'")]
    InvalidSpeaker(String),

    #[error("Failed to update media for {} slot(s):\n{}", .0.len(), list_failures(.0))]
    MediaUpdate(Vec<MediaFailure>),

    #[error("Card index {index} out of range ({len} cards)")]
    CardIndexOutOfRange { index: usize, len: usize },

    #[error("GermankiError: {0}")]
    Custom(String),
}

impl From<std::io::Error> for GermankiError {
    fn from(error: std::io::Error) -> Self {
        GermankiError::Io(Box::new(error))
    }
}

impl From<reqwest::Error> for GermankiError {
    fn from(error: reqwest::Error) -> Self {
        GermankiError::Reqwest(Box::new(error))
    }
}
