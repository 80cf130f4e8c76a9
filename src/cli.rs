use std::{
    io::Read,
    path::PathBuf,
};

use anyhow::{
    bail,
    Context,
    Result,
};
use clap::{
    Args,
    Parser,
    Subcommand,
    ValueEnum,
};
use germanki::{
    core::{
        config::SETTINGS_FILE,
        http::http_client,
        Config,
        Germanki,
        GermankiError,
    },
    input::{
        InputSource,
        OpenAiClient,
        DEFAULT_MANUAL_INPUT,
    },
    persistence,
    preview,
};
use tracing::{
    info,
    warn,
};

const DEFAULT_WORD_LIST: &str = "Hund\nMann\nFrau";

#[derive(Parser, Debug)]
#[command(name = "germanki", version, about = "Create illustrated German vocabulary cards in Anki")]
pub struct Cli {
    /// Log level (trace, debug, info, warn, error) or a full filter directive
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available speakers
    Speakers,

    /// Enrich cards and write an HTML preview page
    Preview {
        #[command(flatten)]
        input: InputArgs,

        #[arg(short, long, default_value = "germanki-preview.html")]
        output: PathBuf,
    },

    /// Enrich cards and add them to an Anki deck
    Create {
        #[arg(short, long)]
        deck: String,

        #[command(flatten)]
        input: InputArgs,

        /// Fail instead of creating the deck when it does not exist
        #[arg(long)]
        no_create_deck: bool,

        /// Extra tag to put on every note (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
    },

    /// Show the effective configuration
    Config {
        /// Write a settings file with default values
        #[arg(long)]
        init: bool,
    },
}

#[derive(Args, Debug)]
pub struct InputArgs {
    /// Input file, or `-` for stdin. Defaults to a bundled example.
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    #[arg(long, value_enum, default_value_t = SourceKind::Manual)]
    pub source: SourceKind,

    #[arg(long)]
    pub speaker: Option<String>,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum SourceKind {
    /// YAML list of cards
    Manual,
    /// Word list expanded by a language model
    Llm,
}

impl InputArgs {
    fn read_raw(&self) -> Result<String> {
        match &self.input {
            Some(path) if path.as_os_str() == "-" => {
                let mut raw = String::new();
                std::io::stdin().read_to_string(&mut raw).context("Failed to read stdin")?;
                Ok(raw)
            }
            Some(path) => {
                std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
            }
            None => Ok(match self.source {
                SourceKind::Manual => DEFAULT_MANUAL_INPUT.to_string(),
                SourceKind::Llm => DEFAULT_WORD_LIST.to_string(),
            }),
        }
    }

    fn input_source(&self, config: &Config) -> Result<InputSource> {
        Ok(match self.source {
            SourceKind::Manual => InputSource::Manual,
            SourceKind::Llm => InputSource::LanguageModel(
                OpenAiClient::new(
                    http_client(config.http_timeout())?,
                    config.openai_api_key.clone(),
                    &config.openai_base_url,
                    &config.openai_model,
                )
                .context("Can't use the language-model input source")?,
            ),
        })
    }
}

pub async fn run(cli: Cli) -> Result<()> {
    let mut config = Config::load()?;

    match cli.command {
        Command::Speakers => {
            for speaker in &config.speakers {
                let marker = if *speaker == config.default_speaker { " (default)" } else { "" };
                println!("{speaker}{marker}");
            }
        }
        Command::Preview { input, output } => {
            let germanki = enrich(Germanki::new(config)?, &input).await?;
            preview::write_page(&output, germanki.cards(), &germanki.previews())?;
            println!("Preview written to {}", output.display());
        }
        Command::Create { deck, input, no_create_deck, tags } => {
            if no_create_deck {
                config.anki.create_deck_if_missing = false;
            }
            config.anki.tags.extend(tags);

            let germanki = enrich(Germanki::new(config)?, &input).await?;
            let note_ids = germanki.create_cards(&deck).await?;
            println!("Added {} card(s) to '{deck}'", note_ids.len());
        }
        Command::Config { init } => {
            if init {
                let path = persistence::get_data_file_path(SETTINGS_FILE);
                if path.exists() {
                    bail!("{} already exists", path.display());
                }
                let path = Config::default().save()?;
                println!("Wrote {}", path.display());
            } else {
                println!("{}", serde_json::to_string_pretty(&redacted(config))?);
            }
        }
    }

    Ok(())
}

async fn enrich(mut germanki: Germanki, args: &InputArgs) -> Result<Germanki> {
    if let Some(speaker) = &args.speaker {
        germanki.set_speaker(speaker)?;
    }

    let source = args.input_source(germanki.config())?;
    let cards = source.parse(&args.read_raw()?).await?;
    info!(source = source.name(), cards = cards.len(), "Input parsed");

    match germanki.set_card_contents(cards).await {
        Ok(()) => {}
        Err(GermankiError::MediaUpdate(failures)) => {
            warn!(failed = failures.len(), "Some media could not be fetched; cards will go without it");
            for failure in &failures {
                warn!("{failure}");
            }
        }
        Err(e) => return Err(e.into()),
    }

    Ok(germanki)
}

fn redacted(mut config: Config) -> Config {
    for key in [&mut config.pexels_api_key, &mut config.openai_api_key] {
        if !key.is_empty() {
            *key = "***".to_string();
        }
    }
    config
}
