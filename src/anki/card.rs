//! HTML rendering of card faces.
//!
//! Uploaded notes reference media by bare filename, since Anki resolves
//! `src` against its own media folder. Previews point at the media cache
//! served over HTTP instead.

use std::path::Path;

use super::types::{
    AnkiCard,
    AnkiMedia,
};
use crate::core::{
    config::{
        Config,
        PreviewSettings,
    },
    CardContent,
    MediaPosition,
    ResolvedMedia,
};

pub const PREVIEW_AUDIO_STYLE: &str = "width: 100%;";

/// The three rendered faces of a card.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CardFaces {
    pub front: String,
    pub back: String,
    pub extra: String,
}

/// Media sources to embed on one face.
#[derive(Debug, Clone, Copy, Default)]
pub struct FaceMedia<'a> {
    pub audio: Option<&'a str>,
    pub image: Option<&'a str>,
}

#[derive(Debug, Clone, Copy)]
pub struct TagStyle<'a> {
    pub autoplay: bool,
    pub audio_style: &'a str,
    pub image_style: &'a str,
}

impl TagStyle<'static> {
    pub const UPLOAD: TagStyle<'static> = TagStyle { autoplay: true, audio_style: "", image_style: "" };
    pub const PREVIEW: TagStyle<'static> =
        TagStyle { autoplay: false, audio_style: PREVIEW_AUDIO_STYLE, image_style: "" };
}

pub fn audio_tag(src: &str, autoplay: bool, style: &str) -> String {
    let autoplay = if autoplay { " autoplay" } else { "" };
    format!(r#"<audio controls{autoplay} src="{src}" style="{style}"></audio>"#)
}

pub fn image_tag(src: &str, style: &str) -> String {
    format!(r#"<img src="{src}" style="{style}">"#)
}

fn with_media(text: String, media: FaceMedia<'_>, style: TagStyle<'_>) -> String {
    let mut face = text;
    if let Some(src) = media.audio {
        face.push_str("<br>");
        face.push_str(&audio_tag(src, style.autoplay, style.audio_style));
    }
    if let Some(src) = media.image {
        face.push_str("<br>");
        face.push_str(&image_tag(src, style.image_style));
    }
    face
}

pub fn front(content: &CardContent, media: FaceMedia<'_>, style: TagStyle<'_>) -> String {
    with_media(content.word.clone(), media, style)
}

pub fn back(content: &CardContent, media: FaceMedia<'_>, style: TagStyle<'_>) -> String {
    with_media(content.translations.join(", "), media, style)
}

pub fn extra(content: &CardContent) -> String {
    let examples = content
        .examples
        .iter()
        .enumerate()
        .map(|(i, example)| format!("{}. {}", i + 1, example))
        .collect::<Vec<_>>()
        .join("<br>");

    format!(
        "{}<br><br>Explanation: {}<br><br>Examples:<br>{}",
        content.extra, content.definition, examples
    )
}

/// Renders cards according to the configured media placement.
#[derive(Debug, Clone)]
pub struct CardAssembler {
    pub image_position: MediaPosition,
    pub audio_position: MediaPosition,
    pub enable_extra: bool,
}

impl Default for CardAssembler {
    fn default() -> Self {
        Self { image_position: MediaPosition::Back, audio_position: MediaPosition::Front, enable_extra: true }
    }
}

impl CardAssembler {
    pub fn from_config(config: &Config) -> Self {
        Self {
            image_position: config.image_position,
            audio_position: config.audio_position,
            enable_extra: config.enable_extra,
        }
    }

    /// Faces with media referenced by filename, plus the files to upload.
    pub fn assemble(&self, content: &CardContent) -> AnkiCard {
        let audio = content.word_audio.as_ref().filter(|_| self.audio_position.is_enabled());
        let image = content.translation_image.as_ref().filter(|_| self.image_position.is_enabled());

        let faces = self.render(
            content,
            audio.map(|m| m.filename.clone()),
            image.map(|m| m.filename.clone()),
            TagStyle::UPLOAD,
        );

        let mut media: Vec<AnkiMedia> = Vec::new();
        for resolved in audio.into_iter().chain(image) {
            let item = AnkiMedia::from(resolved);
            if !media.contains(&item) {
                media.push(item);
            }
        }

        AnkiCard { front: faces.front, back: faces.back, extra: faces.extra, media }
    }

    /// Faces with media pointing at the preview server.
    pub fn preview(&self, content: &CardContent, preview: &PreviewSettings, media_root: &Path) -> CardFaces {
        let url = |media: &ResolvedMedia| preview_url(preview, media_root, &media.path);
        let audio = content.word_audio.as_ref().filter(|_| self.audio_position.is_enabled());
        let image = content.translation_image.as_ref().filter(|_| self.image_position.is_enabled());

        self.render(content, audio.map(url), image.map(url), TagStyle::PREVIEW)
    }

    fn render(
        &self,
        content: &CardContent,
        audio: Option<String>,
        image: Option<String>,
        style: TagStyle<'_>,
    ) -> CardFaces {
        let front_media = FaceMedia {
            audio: audio.as_deref().filter(|_| self.audio_position.on_front()),
            image: image.as_deref().filter(|_| self.image_position.on_front()),
        };
        let back_media = FaceMedia {
            audio: audio.as_deref().filter(|_| self.audio_position.on_back()),
            image: image.as_deref().filter(|_| self.image_position.on_back()),
        };

        CardFaces {
            front: front(content, front_media, style),
            back: back(content, back_media, style),
            extra: if self.enable_extra { extra(content) } else { String::new() },
        }
    }
}

/// `http://{host}:{port}/app/{path relative to the media root}`.
pub fn preview_url(preview: &PreviewSettings, media_root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(media_root).unwrap_or(path);
    let relative = relative
        .components()
        .map(|part| part.as_os_str().to_string_lossy())
        .filter(|part| part != "/")
        .collect::<Vec<_>>()
        .join("/");
    format!("http://{}:{}/app/{}", preview.host, preview.port, relative)
}
