use std::{
    fmt,
    path::PathBuf,
    str::FromStr,
};

use serde::{
    Deserialize,
    Deserializer,
    Serialize,
};

/// Voices offered by the text-to-speech service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Speaker {
    #[default]
    Vicki,
    Marlene,
    Hans,
}

impl Speaker {
    pub const ALL: [Speaker; 3] = [Speaker::Vicki, Speaker::Marlene, Speaker::Hans];

    pub fn as_str(&self) -> &'static str {
        match self {
            Speaker::Vicki => "Vicki",
            Speaker::Marlene => "Marlene",
            Speaker::Hans => "Hans",
        }
    }
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Speaker {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Speaker::ALL
            .into_iter()
            .find(|speaker| speaker.as_str() == s)
            .ok_or_else(|| format!("unknown speaker '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Audio,
}

impl MediaKind {
    pub fn extension(&self) -> &'static str {
        match self {
            MediaKind::Image => "jpg",
            MediaKind::Audio => "mp3",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Image => f.write_str("image"),
            MediaKind::Audio => f.write_str("audio"),
        }
    }
}

/// Which card face(s) a media slot is rendered on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaPosition {
    Front,
    Back,
    Both,
    None,
}

impl MediaPosition {
    pub fn on_front(&self) -> bool {
        matches!(self, MediaPosition::Front | MediaPosition::Both)
    }

    pub fn on_back(&self) -> bool {
        matches!(self, MediaPosition::Back | MediaPosition::Both)
    }

    pub fn is_enabled(&self) -> bool {
        *self != MediaPosition::None
    }
}

/// A media file sitting in the local cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedMedia {
    pub kind: MediaKind,
    pub path: PathBuf,
    pub filename: String,
}

impl ResolvedMedia {
    pub fn new(kind: MediaKind, path: PathBuf) -> Self {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { kind, path, filename }
    }
}

/// User-authored card source, plus whatever media has been resolved for it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardContent {
    #[serde(alias = "front")]
    pub word: String,
    #[serde(alias = "back", deserialize_with = "one_or_many")]
    pub translations: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub definition: String,
    #[serde(default, deserialize_with = "null_as_empty_list")]
    pub examples: Vec<String>,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub extra: String,
    #[serde(default)]
    pub one_word_summary: Option<String>,
    #[serde(default)]
    pub speaker: Speaker,
    #[serde(skip)]
    pub word_audio: Option<ResolvedMedia>,
    #[serde(skip)]
    pub translation_image: Option<ResolvedMedia>,
}

impl CardContent {
    pub fn new(word: impl Into<String>, translations: Vec<String>) -> Self {
        Self {
            word: word.into(),
            translations,
            definition: String::new(),
            examples: Vec::new(),
            extra: String::new(),
            one_word_summary: None,
            speaker: Speaker::default(),
            word_audio: None,
            translation_image: None,
        }
    }

    /// Label used when listing cards.
    pub fn query_word(&self) -> &str {
        &self.word
    }

    /// Search query for the card image: the one-word summary when given,
    /// else the first translation.
    pub fn image_query(&self) -> &str {
        self.one_word_summary
            .as_deref()
            .map(str::trim)
            .filter(|summary| !summary.is_empty())
            .or_else(|| self.translations.first().map(String::as_str))
            .unwrap_or(&self.word)
    }

    pub fn validate(&self) -> Result<(), String> {
        if self.word.trim().is_empty() {
            return Err("word must not be empty".to_string());
        }
        if self.translations.iter().all(|t| t.trim().is_empty()) {
            return Err(format!("'{}' needs at least one translation", self.word));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

fn one_or_many<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => vec![value],
        OneOrMany::Many(values) => values,
    })
}

fn null_as_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn null_as_empty_list<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<String>, D::Error> {
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speaker_round_trip_names() {
        assert_eq!("Marlene".parse::<Speaker>(), Ok(Speaker::Marlene));
        assert!("marlene".parse::<Speaker>().is_err());
        assert_eq!(Speaker::Hans.to_string(), "Hans");
    }

    #[test]
    fn test_image_query_prefers_summary() {
        let mut card = CardContent::new("Hund", vec!["dog".to_string(), "hound".to_string()]);
        assert_eq!(card.image_query(), "dog");

        card.one_word_summary = Some("puppy".to_string());
        assert_eq!(card.image_query(), "puppy");

        card.one_word_summary = Some("  ".to_string());
        assert_eq!(card.image_query(), "dog");
    }

    #[test]
    fn test_positions() {
        assert!(MediaPosition::Both.on_front() && MediaPosition::Both.on_back());
        assert!(!MediaPosition::Front.on_back());
        assert!(!MediaPosition::None.is_enabled());
    }

    #[test]
    fn test_resolved_media_filename() {
        let media = ResolvedMedia::new(MediaKind::Audio, PathBuf::from("/tmp/audio/Hund_Vicki.mp3"));
        assert_eq!(media.filename, "Hund_Vicki.mp3");
    }
}
