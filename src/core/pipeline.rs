use std::time::Instant;

use tracing::{
    info,
    warn,
};

use super::{
    config::Config,
    http::http_client,
    CardContent,
    GermankiError,
    MediaFailure,
    MediaKind,
    Speaker,
};
use crate::{
    anki::{
        AnkiCard,
        AnkiConnectClient,
        CardAssembler,
        CardFaces,
    },
    input::RefreshOption,
    media::{
        ImageSource,
        MediaResolver,
        PexelsClient,
        TtsClient,
    },
};

/// Checks `name` against the speakers on offer.
pub fn validate_speaker(name: &str, speakers: &[Speaker]) -> Result<Speaker, GermankiError> {
    name.parse::<Speaker>()
        .ok()
        .filter(|speaker| speakers.contains(speaker))
        .ok_or_else(|| GermankiError::InvalidSpeaker(name.to_string()))
}

/// Holds the working set of cards and drives enrichment and upload.
pub struct Germanki {
    config: Config,
    resolver: MediaResolver,
    anki: AnkiConnectClient,
    assembler: CardAssembler,
    selected_speaker: Speaker,
    cards: Vec<CardContent>,
}

impl Germanki {
    /// Wires the real services from `config`. The image client is only
    /// required when images are placed on some face.
    pub fn new(config: Config) -> Result<Self, GermankiError> {
        let http = http_client(config.http_timeout())?;

        let images: Option<Box<dyn ImageSource>> = if config.image_position.is_enabled() {
            let client = PexelsClient::new(http.clone(), config.pexels_api_key.clone())?
                .with_base_url(&config.pexels_base_url);
            Some(Box::new(client))
        } else {
            None
        };
        let speech = TtsClient::new(http.clone()).with_base_url(&config.tts_base_url);

        let resolver =
            MediaResolver::new(http, images, Box::new(speech), config.image_dir.clone(), config.audio_dir.clone())
                .with_max_pages(config.max_image_pages);
        let anki = AnkiConnectClient::new(&config.anki)?;

        Ok(Self::with_parts(config, resolver, anki))
    }

    pub fn with_parts(config: Config, resolver: MediaResolver, anki: AnkiConnectClient) -> Self {
        let selected_speaker = if config.speakers.contains(&config.default_speaker) {
            config.default_speaker
        } else {
            config.speakers.first().copied().unwrap_or_default()
        };

        Self {
            assembler: CardAssembler::from_config(&config),
            config,
            resolver,
            anki,
            selected_speaker,
            cards: Vec::new(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.config.speakers
    }

    pub fn selected_speaker(&self) -> Speaker {
        self.selected_speaker
    }

    pub fn cards(&self) -> &[CardContent] {
        &self.cards
    }

    pub fn validate_speaker(&self, name: &str) -> Result<Speaker, GermankiError> {
        validate_speaker(name, &self.config.speakers)
    }

    pub fn set_speaker(&mut self, name: &str) -> Result<(), GermankiError> {
        self.selected_speaker = self.validate_speaker(name)?;
        info!(speaker = %self.selected_speaker, "Speaker selected");
        Ok(())
    }

    /// Replaces the working set and fetches media for every card. Cards keep
    /// whatever media resolved even when the call reports failures.
    pub async fn set_card_contents(&mut self, cards: Vec<CardContent>) -> Result<(), GermankiError> {
        let start = Instant::now();
        self.cards = cards;

        let mut failures = Vec::new();
        for index in 0..self.cards.len() {
            failures.extend(self.enrich(index).await);
        }

        info!(cards = self.cards.len(), failed = failures.len(), elapsed = ?start.elapsed(), "Cards enriched");
        if failures.is_empty() {
            Ok(())
        } else {
            Err(GermankiError::MediaUpdate(failures))
        }
    }

    /// Fetches media again for one card. Images usually come back different.
    pub async fn refresh_one(&mut self, index: usize) -> Result<(), GermankiError> {
        if index >= self.cards.len() {
            return Err(GermankiError::CardIndexOutOfRange { index, len: self.cards.len() });
        }

        let failures = self.enrich(index).await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(GermankiError::MediaUpdate(failures))
        }
    }

    pub async fn refresh(&mut self, option: RefreshOption) -> Result<(), GermankiError> {
        match option {
            RefreshOption::All => {
                let cards = std::mem::take(&mut self.cards);
                self.set_card_contents(cards).await
            }
            RefreshOption::Selected(index) => self.refresh_one(index).await,
            RefreshOption::NoRefresh => Ok(()),
        }
    }

    async fn enrich(&mut self, index: usize) -> Vec<MediaFailure> {
        let speaker = self.selected_speaker;
        let mut failures = Vec::new();

        let Some(card) = self.cards.get_mut(index) else {
            return failures;
        };
        card.speaker = speaker;

        card.word_audio = None;
        if self.config.audio_position.is_enabled() {
            match self.resolver.resolve_audio(&card.word, speaker).await {
                Ok(media) => card.word_audio = Some(media),
                Err(error) => {
                    warn!(word = %card.word, %error, "Audio unavailable");
                    failures.push(MediaFailure { index, word: card.word.clone(), kind: MediaKind::Audio, error });
                }
            }
        }

        card.translation_image = None;
        if self.config.image_position.is_enabled() {
            let query = card.image_query().to_string();
            match self.resolver.resolve_image(&query).await {
                Ok(media) => card.translation_image = Some(media),
                Err(error) => {
                    warn!(word = %card.word, query, %error, "Image unavailable");
                    failures.push(MediaFailure { index, word: card.word.clone(), kind: MediaKind::Image, error });
                }
            }
        }

        failures
    }

    pub fn assembled_cards(&self) -> Vec<AnkiCard> {
        self.cards.iter().map(|card| self.assembler.assemble(card)).collect()
    }

    pub fn previews(&self) -> Vec<CardFaces> {
        self.cards
            .iter()
            .map(|card| self.assembler.preview(card, &self.config.preview, &self.config.media_root))
            .collect()
    }

    /// Uploads every card in order. The first failure stops the run; cards
    /// already added stay in the deck.
    pub async fn create_cards(&self, deck_name: &str) -> Result<Vec<Option<u64>>, GermankiError> {
        let settings = &self.config.anki;
        let mut note_ids = Vec::with_capacity(self.cards.len());

        for card in self.assembled_cards() {
            let note_id = self
                .anki
                .add_card(
                    deck_name,
                    &card,
                    settings.create_deck_if_missing,
                    &settings.tags,
                    Some(&settings.model_name),
                    settings.allow_duplicate,
                )
                .await?;
            note_ids.push(note_id);
        }

        info!(deck_name, cards = note_ids.len(), "Cards created");
        Ok(note_ids)
    }
}
