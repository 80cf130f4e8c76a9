use async_trait::async_trait;

use crate::core::{
    MediaError,
    Speaker,
};

pub mod pexels;
pub mod resolver;
pub mod tts;

pub use pexels::{
    PexelsClient,
    PexelsError,
};
pub use resolver::{
    MediaRequest,
    MediaResolver,
};
pub use tts::{
    TtsClient,
    TtsResponse,
};

/// Finds a downloadable picture for a search query.
#[async_trait]
pub trait ImageSource: Send + Sync {
    async fn find_image(&self, query: &str, page: u32) -> Result<String, MediaError>;
}

/// Produces a downloadable pronunciation clip.
#[async_trait]
pub trait SpeechSource: Send + Sync {
    async fn synthesize(&self, text: &str, speaker: Speaker) -> Result<String, MediaError>;
}
