use std::{
    path::PathBuf,
    time::Duration,
};

use base64::{
    engine::general_purpose::STANDARD,
    Engine,
};
use reqwest::{
    Client,
    StatusCode,
};
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{
    debug,
    info,
};

use super::types::{
    AnkiCard,
    AnkiMedia,
    ApiResponse,
    NoteFields,
    NoteOptions,
    NotePayload,
};
use crate::core::config::AnkiSettings;

pub const DEFAULT_MODEL: &str = "Basic";
pub const DEFAULT_TAGS: [&str; 1] = ["automated"];

#[derive(Debug, Error)]
pub enum AnkiConnectError {
    #[error("AnkiConnect request failed: {0}")]
    Request(String),

    #[error("AnkiConnect response error: {0}")]
    Response(String),

    #[error("Deck '{0}' does not exist")]
    DeckNotExists(String),

    #[error("Media file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    #[error("Failed to read media file {}: {source}", .path.display())]
    ReadMedia {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Client for the AnkiConnect add-on. Every call is one POST to the same
/// endpoint.
pub struct AnkiConnectClient {
    http: Client,
    base_url: String,
    version: u32,
    timeout: Duration,
    default_tags: Vec<String>,
}

impl AnkiConnectClient {
    pub fn new(settings: &AnkiSettings) -> Result<Self, AnkiConnectError> {
        let timeout = settings.timeout();
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AnkiConnectError::Request(format!("HTTP client build failed: {e}")))?;

        Ok(Self {
            http,
            base_url: settings.base_url(),
            version: settings.version,
            timeout,
            default_tags: DEFAULT_TAGS.iter().map(|t| t.to_string()).collect(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn version(&self) -> u32 {
        self.version
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn default_tags(&self) -> &[String] {
        &self.default_tags
    }

    async fn request<T: DeserializeOwned>(
        &self,
        action: &str,
        params: Option<serde_json::Value>,
    ) -> Result<Option<T>, AnkiConnectError> {
        let mut body = serde_json::Map::new();
        body.insert("action".to_string(), serde_json::Value::String(action.to_string()));
        body.insert("version".to_string(), serde_json::Value::Number(self.version.into()));

        if let Some(params) = params {
            body.insert("params".to_string(), params);
        }

        let resp = self
            .http
            .post(&self.base_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AnkiConnectError::Request(e.to_string()))?;

        let status = resp.status();
        if status != StatusCode::OK {
            let text = resp.text().await.unwrap_or_default();
            return Err(AnkiConnectError::Response(format!(
                "{action} failed with status code {}: {text}",
                status.as_u16()
            )));
        }

        let response: ApiResponse<T> = resp
            .json()
            .await
            .map_err(|e| AnkiConnectError::Response(format!("{action} returned invalid JSON: {e}")))?;

        if let Some(error) = response.error {
            return Err(AnkiConnectError::Response(format!("{action}: {error}")));
        }

        debug!(action, "AnkiConnect request succeeded");
        Ok(response.result)
    }

    pub async fn deck_names(&self) -> Result<Vec<String>, AnkiConnectError> {
        Ok(self.request::<Vec<String>>("deckNames", None).await?.unwrap_or_default())
    }

    pub async fn deck_exists(&self, deck_name: &str) -> Result<bool, AnkiConnectError> {
        Ok(self.deck_names().await?.iter().any(|name| name == deck_name))
    }

    /// The returned deck id is ignored; an `error` in the reply is not.
    pub async fn create_deck(&self, deck_name: &str) -> Result<(), AnkiConnectError> {
        let params = serde_json::json!({ "deck": deck_name });
        self.request::<serde_json::Value>("createDeck", Some(params)).await?;
        info!(deck_name, "Created deck");
        Ok(())
    }

    /// Stores the file in Anki's media folder under its own file name.
    pub async fn upload_media(&self, media: &AnkiMedia) -> Result<String, AnkiConnectError> {
        if !media.path.exists() {
            return Err(AnkiConnectError::FileNotFound(media.path.clone()));
        }
        let bytes = tokio::fs::read(&media.path)
            .await
            .map_err(|source| AnkiConnectError::ReadMedia { path: media.path.clone(), source })?;

        let filename = media.filename();
        let params = serde_json::json!({
            "filename": filename,
            "data": STANDARD.encode(bytes),
        });
        let stored = self.request::<String>("storeMediaFile", Some(params)).await?;

        debug!(filename, "Uploaded media");
        Ok(stored.unwrap_or(filename))
    }

    /// Default tags first, then any caller tags not already present.
    pub fn merge_tags(&self, tags: &[String]) -> Vec<String> {
        let mut merged = self.default_tags.clone();
        for tag in tags {
            if !merged.contains(tag) {
                merged.push(tag.clone());
            }
        }
        merged
    }

    pub fn note_payload(
        &self,
        deck_name: &str,
        card: &AnkiCard,
        tags: &[String],
        model_name: Option<&str>,
        allow_duplicate: bool,
    ) -> NotePayload {
        NotePayload {
            deck_name: deck_name.to_string(),
            model_name: model_name.unwrap_or(DEFAULT_MODEL).to_string(),
            fields: NoteFields::from_card(card),
            tags: self.merge_tags(tags),
            options: NoteOptions { allow_duplicate },
        }
    }

    pub async fn add_note(
        &self,
        deck_name: &str,
        card: &AnkiCard,
        tags: &[String],
        model_name: Option<&str>,
        allow_duplicate: bool,
    ) -> Result<Option<u64>, AnkiConnectError> {
        let note = self.note_payload(deck_name, card, tags, model_name, allow_duplicate);
        let params = serde_json::json!({ "note": note });
        self.request::<u64>("addNote", Some(params)).await
    }

    /// Makes sure the deck exists, uploads the card's media, then adds the
    /// note. Stops at the first failure; nothing already sent is undone.
    pub async fn add_card(
        &self,
        deck_name: &str,
        card: &AnkiCard,
        create_deck_if_missing: bool,
        tags: &[String],
        model_name: Option<&str>,
        allow_duplicate: bool,
    ) -> Result<Option<u64>, AnkiConnectError> {
        if !self.deck_exists(deck_name).await? {
            if !create_deck_if_missing {
                return Err(AnkiConnectError::DeckNotExists(deck_name.to_string()));
            }
            self.create_deck(deck_name).await?;
        }

        for media in &card.media {
            self.upload_media(media).await?;
        }

        let note_id = self.add_note(deck_name, card, tags, model_name, allow_duplicate).await?;
        info!(deck_name, ?note_id, media = card.media.len(), "Added note");
        Ok(note_id)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::TempDir;
    use wiremock::{
        matchers::{
            body_partial_json,
            method,
        },
        Mock,
        MockServer,
        ResponseTemplate,
    };

    use super::*;
    use crate::core::MediaKind;

    fn settings_for(server: &MockServer) -> AnkiSettings {
        AnkiSettings {
            host: "http://127.0.0.1".to_string(),
            port: server.address().port(),
            ..AnkiSettings::default()
        }
    }

    fn ok(result: serde_json::Value) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(json!({ "result": result, "error": null }))
    }

    async fn mount_action(server: &MockServer, action: &str, template: ResponseTemplate) {
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "action": action })))
            .respond_with(template)
            .mount(server)
            .await;
    }

    async fn actions_sent(server: &MockServer) -> Vec<String> {
        server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .map(|req| {
                let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
                body["action"].as_str().unwrap_or_default().to_string()
            })
            .collect()
    }

    #[test]
    fn test_client_init() {
        let client = AnkiConnectClient::new(&AnkiSettings::default()).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8765");
        assert_eq!(client.timeout(), Duration::from_secs(5));
        assert_eq!(client.version(), 6);
        assert_eq!(client.default_tags(), ["automated".to_string()]);

        let custom = AnkiSettings {
            host: "http://custom_host".to_string(),
            port: 1234,
            version: 7,
            ..AnkiSettings::default()
        };
        let client = AnkiConnectClient::new(&custom).unwrap();
        assert_eq!(client.base_url(), "http://custom_host:1234");
        assert_eq!(client.version(), 7);
    }

    #[test]
    fn test_note_payload_with_tags_and_model() {
        let client = AnkiConnectClient::new(&AnkiSettings::default()).unwrap();
        let card = AnkiCard::new("Front\nContent", "Back Content");
        let tags = vec!["custom_tag".to_string(), "automated".to_string()];

        let payload = client.note_payload("Test Deck", &card, &tags, Some("Basic (and reversed card)"), true);
        let json = serde_json::to_value(&payload).unwrap();

        assert_eq!(json["tags"], json!(["automated", "custom_tag"]));
        assert_eq!(json["modelName"], "Basic (and reversed card)");
        assert_eq!(json["deckName"], "Test Deck");
        assert_eq!(json["options"]["allowDuplicate"], true);
        assert_eq!(json["fields"]["Front"], "Front<br>Content");

        let default_model = client.note_payload("Test Deck", &card, &[], None, false);
        assert_eq!(default_model.model_name, "Basic");
    }

    #[tokio::test]
    async fn test_request_sends_action_and_version() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "action": "deckNames", "version": 6 })))
            .respond_with(ok(json!(["Default", "Test Deck"])))
            .expect(1)
            .mount(&server)
            .await;

        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();

        assert_eq!(client.deck_names().await.unwrap(), vec!["Default", "Test Deck"]);
    }

    #[tokio::test]
    async fn test_error_status_and_error_field() {
        let server = MockServer::start().await;
        mount_action(
            &server,
            "deckNames",
            ResponseTemplate::new(500).set_body_json(json!({ "error": "Internal Server Error" })),
        )
        .await;
        mount_action(
            &server,
            "createDeck",
            ResponseTemplate::new(200).set_body_json(json!({ "result": null, "error": "collection is not available" })),
        )
        .await;

        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();

        assert!(matches!(client.deck_exists("Test Deck").await, Err(AnkiConnectError::Response(_))));
        let err = client.create_deck("Test Deck").await.unwrap_err();
        assert!(err.to_string().contains("collection is not available"));
    }

    #[tokio::test]
    async fn test_connection_refused_is_request_error() {
        let settings = AnkiSettings { host: "http://127.0.0.1".to_string(), port: 1, ..AnkiSettings::default() };
        let client = AnkiConnectClient::new(&settings).unwrap();

        assert!(matches!(client.deck_names().await, Err(AnkiConnectError::Request(_))));
    }

    #[tokio::test]
    async fn test_add_card_deck_not_exists() {
        let server = MockServer::start().await;
        mount_action(&server, "deckNames", ok(json!(null))).await;

        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();
        let card = AnkiCard::new("Front Content", "Back Content");

        let err = client.add_card("Test Deck", &card, false, &[], None, false).await.unwrap_err();

        assert!(matches!(err, AnkiConnectError::DeckNotExists(name) if name == "Test Deck"));
        assert_eq!(actions_sent(&server).await, vec!["deckNames"]);
    }

    #[tokio::test]
    async fn test_add_card_creates_missing_deck() {
        let server = MockServer::start().await;
        mount_action(&server, "deckNames", ok(json!(["Default"]))).await;
        mount_action(&server, "createDeck", ok(json!(1234))).await;
        mount_action(&server, "addNote", ok(json!(99))).await;

        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();
        let card = AnkiCard::new("Front Content", "Back Content");
        let tags = vec!["tag1".to_string(), "tag2".to_string()];

        let note_id = client.add_card("Test Deck", &card, true, &tags, None, false).await.unwrap();

        assert_eq!(note_id, Some(99));
        assert_eq!(actions_sent(&server).await, vec!["deckNames", "createDeck", "addNote"]);

        let requests = server.received_requests().await.unwrap();
        let note: serde_json::Value = serde_json::from_slice(&requests[2].body).unwrap();
        let sent_tags = note["params"]["note"]["tags"].as_array().unwrap();
        assert!(sent_tags.contains(&json!("tag1")));
        assert!(sent_tags.contains(&json!("tag2")));
    }

    #[tokio::test]
    async fn test_add_card_stops_when_deck_creation_fails() {
        let server = MockServer::start().await;
        mount_action(&server, "deckNames", ok(json!(["Default"]))).await;
        mount_action(
            &server,
            "createDeck",
            ResponseTemplate::new(200).set_body_json(json!({ "result": null, "error": "collection is not available" })),
        )
        .await;
        mount_action(&server, "addNote", ok(json!(1))).await;

        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();
        let card = AnkiCard::new("Front Content", "Back Content");

        let err = client.add_card("Test Deck", &card, true, &[], None, false).await.unwrap_err();

        assert!(matches!(err, AnkiConnectError::Response(ref message) if message.contains("createDeck")));
        assert_eq!(actions_sent(&server).await, vec!["deckNames", "createDeck"]);
    }

    #[tokio::test]
    async fn test_media_uploaded_before_note() {
        let server = MockServer::start().await;
        mount_action(&server, "deckNames", ok(json!(["Test Deck"]))).await;
        mount_action(&server, "storeMediaFile", ok(json!("stored"))).await;
        mount_action(&server, "addNote", ok(json!(7))).await;

        let dir = TempDir::new().unwrap();
        let image = dir.path().join("test.jpg");
        let audio = dir.path().join("test.mp3");
        std::fs::write(&image, b"image_data").unwrap();
        std::fs::write(&audio, b"audio_data").unwrap();

        let card = AnkiCard {
            media: vec![AnkiMedia::new(&image, MediaKind::Image), AnkiMedia::new(&audio, MediaKind::Audio)],
            ..AnkiCard::new("Front Content", "Back Content")
        };
        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();

        client.add_card("Test Deck", &card, true, &[], None, false).await.unwrap();

        assert_eq!(actions_sent(&server).await, vec!["deckNames", "storeMediaFile", "storeMediaFile", "addNote"]);

        let requests = server.received_requests().await.unwrap();
        let upload: serde_json::Value = serde_json::from_slice(&requests[1].body).unwrap();
        assert_eq!(upload["params"]["filename"], "test.jpg");
        assert_eq!(upload["params"]["data"], STANDARD.encode(b"image_data"));
    }

    #[tokio::test]
    async fn test_upload_media_file_not_found() {
        let server = MockServer::start().await;
        mount_action(&server, "storeMediaFile", ok(json!("x"))).await;

        let client = AnkiConnectClient::new(&settings_for(&server)).unwrap();
        let err = client
            .upload_media(&AnkiMedia::new("non_existent_file.jpg", MediaKind::Image))
            .await
            .unwrap_err();

        assert!(matches!(err, AnkiConnectError::FileNotFound(_)));
        assert!(actions_sent(&server).await.is_empty());
    }
}
