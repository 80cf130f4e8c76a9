use std::path::Path;

use async_trait::async_trait;
use reqwest::{
    Client,
    StatusCode,
};
use tracing::{
    debug,
    warn,
};

use super::SpeechSource;
use crate::core::{
    http::download_to_file,
    MediaError,
    Speaker,
};

pub const DEFAULT_BASE_URL: &str = "https://ttsmp3.com";

/// Outcome of a synthesis request. Failures are reported here, never raised.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtsResponse {
    pub success: bool,
    pub mp3_url: Option<String>,
    pub error_message: Option<String>,
}

impl TtsResponse {
    fn ok(mp3_url: String) -> Self {
        Self { success: true, mp3_url: Some(mp3_url), error_message: None }
    }

    fn failed(message: impl Into<String>) -> Self {
        Self { success: false, mp3_url: None, error_message: Some(message.into()) }
    }
}

pub struct TtsClient {
    http: Client,
    base_url: String,
}

impl TtsClient {
    pub fn new(http: Client) -> Self {
        Self { http, base_url: DEFAULT_BASE_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    pub async fn request_synthesis(&self, message: &str, language: &str) -> TtsResponse {
        let url = format!("{}/makemp3_new.php", self.base_url);
        let form = [("msg", message), ("lang", language), ("source", "ttsmp3")];

        let resp = match self.http.post(&url).form(&form).send().await {
            Ok(resp) => resp,
            Err(e) => return TtsResponse::failed(format!("Request failed: {e}")),
        };

        let status = resp.status();
        if status != StatusCode::OK {
            return TtsResponse::failed(format!("Failed with status code {}", status.as_u16()));
        }

        let body = match resp.bytes().await {
            Ok(body) => body,
            Err(e) => return TtsResponse::failed(format!("Request failed: {e}")),
        };

        let json: serde_json::Value = match serde_json::from_slice(&body) {
            Ok(json) => json,
            Err(_) => return TtsResponse::failed("Error decoding JSON response."),
        };

        match ["URL", "MP3"].iter().find_map(|field| json.get(*field).and_then(|v| v.as_str())) {
            Some(mp3_url) if !mp3_url.is_empty() => TtsResponse::ok(mp3_url.to_string()),
            _ => TtsResponse::failed("MP3 URL not found."),
        }
    }

    pub async fn download_audio(&self, url: &str, destination: &Path) -> bool {
        match download_to_file(&self.http, url, destination).await {
            Ok(()) => true,
            Err(e) => {
                warn!(url, error = %e, "Audio download failed");
                false
            }
        }
    }
}

#[async_trait]
impl SpeechSource for TtsClient {
    async fn synthesize(&self, text: &str, speaker: Speaker) -> Result<String, MediaError> {
        let response = self.request_synthesis(text, speaker.as_str()).await;
        debug!(text, %speaker, success = response.success, "TTS request finished");
        match response.mp3_url {
            Some(url) if response.success => Ok(url),
            _ => Err(MediaError::Speech(
                response.error_message.unwrap_or_else(|| "unknown error".to_string()),
            )),
        }
    }
}
