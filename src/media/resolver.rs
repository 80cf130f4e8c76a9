use std::path::PathBuf;

use rand::Rng;
use reqwest::Client;
use tracing::{
    debug,
    info,
};

use super::{
    ImageSource,
    SpeechSource,
};
use crate::core::{
    http::download_to_file,
    utils::derive_filename,
    MediaError,
    MediaKind,
    ResolvedMedia,
    Speaker,
};

pub const DEFAULT_MAX_PAGES: u32 = 100;

/// What to fetch, and the value that keeps otherwise equal queries apart in
/// the cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaRequest<'a> {
    Image { query: &'a str, page: u32 },
    Audio { text: &'a str, speaker: Speaker },
}

impl MediaRequest<'_> {
    pub fn kind(&self) -> MediaKind {
        match self {
            MediaRequest::Image { .. } => MediaKind::Image,
            MediaRequest::Audio { .. } => MediaKind::Audio,
        }
    }

    pub fn cache_filename(&self) -> String {
        let tagged = match self {
            MediaRequest::Image { query, page } => format!("{query}_{page}"),
            MediaRequest::Audio { text, speaker } => format!("{text}_{speaker}"),
        };
        derive_filename(&tagged, self.kind().extension())
    }
}

/// Maps queries to files in the local cache, downloading on a miss.
pub struct MediaResolver {
    http: Client,
    images: Option<Box<dyn ImageSource>>,
    speech: Box<dyn SpeechSource>,
    image_dir: PathBuf,
    audio_dir: PathBuf,
    max_pages: u32,
}

impl MediaResolver {
    pub fn new(
        http: Client,
        images: Option<Box<dyn ImageSource>>,
        speech: Box<dyn SpeechSource>,
        image_dir: PathBuf,
        audio_dir: PathBuf,
    ) -> Self {
        Self { http, images, speech, image_dir, audio_dir, max_pages: DEFAULT_MAX_PAGES }
    }

    pub fn with_max_pages(mut self, max_pages: u32) -> Self {
        self.max_pages = max_pages.max(1);
        self
    }

    pub fn cache_path(&self, request: &MediaRequest<'_>) -> PathBuf {
        let dir = match request.kind() {
            MediaKind::Image => &self.image_dir,
            MediaKind::Audio => &self.audio_dir,
        };
        dir.join(request.cache_filename())
    }

    pub async fn resolve(&self, request: &MediaRequest<'_>) -> Result<ResolvedMedia, MediaError> {
        let path = self.cache_path(request);
        let kind = request.kind();

        if path.exists() {
            debug!(path = %path.display(), "Media cache hit");
            return Ok(ResolvedMedia::new(kind, path));
        }

        let url = match *request {
            MediaRequest::Image { query, page } => {
                let images = self.images.as_ref().ok_or(MediaError::ImageSourceUnavailable)?;
                images.find_image(query, page).await?
            }
            MediaRequest::Audio { text, speaker } => self.speech.synthesize(text, speaker).await?,
        };

        download_to_file(&self.http, &url, &path).await?;
        info!(%kind, path = %path.display(), "Fetched media");
        Ok(ResolvedMedia::new(kind, path))
    }

    /// Same word and speaker always map to the same file.
    pub async fn resolve_audio(&self, text: &str, speaker: Speaker) -> Result<ResolvedMedia, MediaError> {
        self.resolve(&MediaRequest::Audio { text, speaker }).await
    }

    /// Picks a fresh random result page on every call, so repeated calls
    /// usually land on a different file.
    pub async fn resolve_image(&self, query: &str) -> Result<ResolvedMedia, MediaError> {
        let page = rand::rng().random_range(1..=self.max_pages);
        self.resolve(&MediaRequest::Image { query, page }).await
    }
}
