//! Turning raw user input into card contents.

use thiserror::Error;
use tracing::debug;

use crate::core::CardContent;

pub mod openai;

pub use openai::{
    LanguageModelError,
    OpenAiClient,
};

/// Example cards shown when no manual input is given.
pub const DEFAULT_MANUAL_INPUT: &str = include_str!("../../assets/default.yaml");

#[derive(Debug, Error)]
pub enum InputError {
    #[error("No input provided.")]
    Empty,

    #[error("Invalid YAML input.")]
    InvalidYaml(#[source] serde_yaml::Error),

    #[error("Invalid card {}: {reason}", .index + 1)]
    InvalidCard { index: usize, reason: String },

    #[error(transparent)]
    LanguageModel(#[from] LanguageModelError),
}

/// Where card contents come from. Chosen once, at the edge.
pub enum InputSource {
    Manual,
    LanguageModel(OpenAiClient),
}

impl InputSource {
    pub fn name(&self) -> &'static str {
        match self {
            InputSource::Manual => "manual",
            InputSource::LanguageModel(_) => "llm",
        }
    }

    /// Manual input is a YAML list of cards; language-model input is a list
    /// of words, one per line.
    pub async fn parse(&self, raw: &str) -> Result<Vec<CardContent>, InputError> {
        match self {
            InputSource::Manual => parse_manual(raw),
            InputSource::LanguageModel(client) => {
                if raw.trim().is_empty() {
                    return Err(InputError::Empty);
                }
                let cards = client.query(raw).await?;
                validate_cards(&cards)?;
                Ok(cards)
            }
        }
    }
}

pub fn parse_manual(raw: &str) -> Result<Vec<CardContent>, InputError> {
    if raw.is_empty() {
        return Err(InputError::Empty);
    }

    let cards: Vec<CardContent> = serde_yaml::from_str(raw).map_err(InputError::InvalidYaml)?;
    validate_cards(&cards)?;
    debug!(cards = cards.len(), "Parsed manual input");
    Ok(cards)
}

pub fn validate_cards(cards: &[CardContent]) -> Result<(), InputError> {
    for (index, card) in cards.iter().enumerate() {
        card.validate().map_err(|reason| InputError::InvalidCard { index, reason })?;
    }
    Ok(())
}

/// Which cards to re-resolve media for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RefreshOption {
    All,
    Selected(usize),
    #[default]
    NoRefresh,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Speaker;

    #[test]
    fn test_default_input_parses() {
        let cards = parse_manual(DEFAULT_MANUAL_INPUT).unwrap();
        assert!(!cards.is_empty());
        assert_eq!(cards[0].word, "der Hund");
        assert_eq!(cards[0].image_query(), "dog");
    }

    #[test]
    fn test_full_record() {
        let raw = r#"
- word: Hund
  translations: [dog]
  definition: Ein Tier
  examples:
    - Der Hund bellt.
  extra: null
"#;
        let cards = parse_manual(raw).unwrap();

        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].translations, vec!["dog"]);
        assert_eq!(cards[0].extra, "");
        assert_eq!(cards[0].speaker, Speaker::Vicki);
        assert!(cards[0].word_audio.is_none());
    }

    #[test]
    fn test_front_back_aliases() {
        let cards = parse_manual("- front: Katze\n  back: cat\n").unwrap();
        assert_eq!(cards[0].word, "Katze");
        assert_eq!(cards[0].translations, vec!["cat"]);
        assert!(cards[0].examples.is_empty());
    }

    #[test]
    fn test_invalid_input() {
        assert!(matches!(parse_manual(""), Err(InputError::Empty)));
        assert!(matches!(parse_manual("- word: [unclosed"), Err(InputError::InvalidYaml(_))));
        assert!(matches!(parse_manual("word: Hund"), Err(InputError::InvalidYaml(_))));
        assert!(matches!(parse_manual("- translations: [dog]"), Err(InputError::InvalidYaml(_))));

        let err = parse_manual("- word: Hund\n  translations: [dog]\n- word: ''\n  translations: [x]\n")
            .unwrap_err();
        assert!(matches!(err, InputError::InvalidCard { index: 1, .. }));
        assert_eq!(InputError::Empty.to_string(), "No input provided.");
    }

    #[tokio::test]
    async fn test_manual_source_dispatch() {
        let cards = InputSource::Manual.parse("- word: Haus\n  translations: house\n").await.unwrap();
        assert_eq!(cards[0].translations, vec!["house"]);
        assert_eq!(InputSource::Manual.name(), "manual");
    }
}
