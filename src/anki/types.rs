use std::path::PathBuf;

use serde::{
    Deserialize,
    Serialize,
};

use crate::core::{
    MediaKind,
    ResolvedMedia,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnkiMedia {
    pub path: PathBuf,
    pub kind: MediaKind,
}

impl AnkiMedia {
    pub fn new(path: impl Into<PathBuf>, kind: MediaKind) -> Self {
        Self { path: path.into(), kind }
    }

    /// Name the file is stored under in Anki's media folder.
    pub fn filename(&self) -> String {
        self.path.file_name().map(|name| name.to_string_lossy().into_owned()).unwrap_or_default()
    }
}

impl From<&ResolvedMedia> for AnkiMedia {
    fn from(media: &ResolvedMedia) -> Self {
        Self { path: media.path.clone(), kind: media.kind }
    }
}

/// A fully rendered note, ready for upload.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnkiCard {
    pub front: String,
    pub back: String,
    pub extra: String,
    pub media: Vec<AnkiMedia>,
}

impl AnkiCard {
    pub fn new(front: impl Into<String>, back: impl Into<String>) -> Self {
        Self { front: front.into(), back: back.into(), ..Default::default() }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub result: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteOptions {
    pub allow_duplicate: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotePayload {
    pub deck_name: String,
    pub model_name: String,
    pub fields: NoteFields,
    pub tags: Vec<String>,
    pub options: NoteOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct NoteFields {
    pub front: String,
    pub back: String,
    pub extra: String,
}

impl NoteFields {
    pub fn from_card(card: &AnkiCard) -> Self {
        Self {
            front: normalize_newlines(&card.front),
            back: normalize_newlines(&card.back),
            extra: normalize_newlines(&card.extra),
        }
    }
}

fn normalize_newlines(text: &str) -> String {
    text.replace("\r\n", "\n").replace('\n', "<br>")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fields_normalize_newlines() {
        let card = AnkiCard { extra: "one\ntwo\r\nthree".to_string(), ..AnkiCard::new("Hallo", "Hello") };
        let fields = NoteFields::from_card(&card);
        assert_eq!(fields.extra, "one<br>two<br>three");

        let json = serde_json::to_value(&fields).unwrap();
        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);
        assert!(keys.iter().all(|k| ["Front", "Back", "Extra"].contains(&k.as_str())));
    }

    #[test]
    fn test_media_filename() {
        let media = AnkiMedia::new("/cache/image/dog_12.jpg", MediaKind::Image);
        assert_eq!(media.filename(), "dog_12.jpg");
    }
}
