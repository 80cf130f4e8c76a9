//! Card generation through an OpenAI-compatible chat completions endpoint.

use reqwest::Client;
use serde::{
    Deserialize,
    Serialize,
};
use thiserror::Error;
use tracing::{
    debug,
    info,
};

use crate::core::CardContent;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

const SYSTEM_PROMPT: &str = "You are a German teacher writing Anki flashcards. \
For every German word or expression in the user's message, one per line, produce one card. \
Reply with a JSON object of the form {\"card_contents\": [card, ...]} where each card has: \
\"word\" (the German word, with its article if it is a noun), \
\"translations\" (a list of English translations), \
\"definition\" (a short explanation in German), \
\"examples\" (a list of two or three German example sentences), \
\"extra\" (grammar notes such as plural or conjugation, may be empty), \
\"one_word_summary\" (a single English word that could be used to search for a picture).";

#[derive(Debug, Error)]
pub enum LanguageModelError {
    #[error("OpenAI API key not provided")]
    MissingApiKey,

    #[error("Language model request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Language model returned {status}: {body}")]
    Api { status: u16, body: String },

    #[error("Could not parse language model reply: {0}")]
    Parse(String),
}

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    response_format: ResponseFormat,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

impl ChatMessage {
    fn new(role: &str, content: &str) -> Self {
        Self { role: role.to_string(), content: Some(content.to_string()) }
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

/// Shape the model is asked to reply with.
#[derive(Debug, Deserialize)]
pub struct CardContentCollection {
    pub card_contents: Vec<CardContent>,
}

pub struct OpenAiClient {
    http: Client,
    api_key: String,
    base_url: String,
    model: String,
}

impl OpenAiClient {
    pub fn new(
        http: Client,
        api_key: impl Into<String>,
        base_url: &str,
        model: &str,
    ) -> Result<Self, LanguageModelError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(LanguageModelError::MissingApiKey);
        }

        Ok(Self {
            http,
            api_key,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Asks the model for one card per line of `words`.
    pub async fn query(&self, words: &str) -> Result<Vec<CardContent>, LanguageModelError> {
        let request = ChatCompletionRequest {
            model: &self.model,
            messages: vec![ChatMessage::new("system", SYSTEM_PROMPT), ChatMessage::new("user", words)],
            response_format: ResponseFormat { kind: "json_object" },
        };

        let url = format!("{}/chat/completions", self.base_url);
        debug!(model = %self.model, "Requesting cards from language model");
        let resp = self.http.post(&url).bearer_auth(&self.api_key).json(&request).send().await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(LanguageModelError::Api {
                status: status.as_u16(),
                body: resp.text().await.unwrap_or_default(),
            });
        }

        let completion: ChatCompletionResponse =
            resp.json().await.map_err(|e| LanguageModelError::Parse(e.to_string()))?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| LanguageModelError::Parse("reply has no content".to_string()))?;

        let collection: CardContentCollection =
            serde_json::from_str(&content).map_err(|e| LanguageModelError::Parse(e.to_string()))?;

        info!(cards = collection.card_contents.len(), "Language model returned cards");
        Ok(collection.card_contents)
    }
}
