//! Emoji Art CLI: inspect and edit documents and palette stores on disk.
//!
//! Documents are the JSON files produced by `EmojiArt::to_json`; palette
//! stores live in a JSON settings file (`--settings`, the config's
//! `settings_path`, or `emoji-art-settings.json` in the working directory).

use clap::{Args, Parser, Subcommand};
use ea_core::config::{ConfigError, EditorConfig};
use ea_core::model::{DecodeError, EmojiId, EncodeError};
use ea_core::palette::Palette;
use ea_core::position::Position;
use ea_core::settings::{FileSettings, SettingsError, SettingsStore};
use ea_core::store::PaletteStore;
use ea_editor::document::EmojiArtDocument;
use ea_editor::drop::DropPayload;
use std::io;
use std::path::{Path, PathBuf};
use std::rc::Rc;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cannot read {path}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write {path}: {source}")]
    Write { path: PathBuf, source: io::Error },
    #[error("{path}: {source}")]
    Decode { path: PathBuf, source: DecodeError },
    #[error(transparent)]
    Encode(#[from] EncodeError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error("no emoji with id {0}")]
    NoSuchEmoji(EmojiId),
    #[error("document has no emoji ids left")]
    IdsExhausted,
    #[error("palette store must keep at least one palette")]
    LastPalette,
    #[error("invalid JSON output: {0}")]
    Json(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "emoji-art", about = "Emoji Art document and palette editor")]
struct Cli {
    /// Editor config (JSON). Missing file means defaults.
    #[arg(long, env = "EMOJI_ART_CONFIG", default_value = "emoji-art.json")]
    config: PathBuf,

    /// Settings file holding palette stores. Overrides the config.
    #[arg(long, env = "EMOJI_ART_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a document as JSON.
    Show { doc: PathBuf },
    /// Add an emoji, or set the background when given a URL, as a drop would.
    Add {
        doc: PathBuf,
        content: String,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        x: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        y: i32,
        /// Point size; defaults to the configured palette emoji size.
        #[arg(long)]
        size: Option<u32>,
    },
    /// Delete an emoji by id.
    Remove { doc: PathBuf, id: EmojiId },
    /// Offset an emoji.
    Move {
        doc: PathBuf,
        id: EmojiId,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        dx: i32,
        #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
        dy: i32,
    },
    /// Scale an emoji.
    Resize { doc: PathBuf, id: EmojiId, factor: f64 },
    /// Set the background URL, or clear it when omitted.
    Background { doc: PathBuf, url: Option<String> },
    /// Manage a palette store.
    Palettes(PalettesCommand),
}

#[derive(Args, Debug)]
struct PalettesCommand {
    /// Store name; defaults to the configured store.
    #[arg(long)]
    store: Option<String>,

    #[command(subcommand)]
    command: PalettesSubcommand,
}

#[derive(Subcommand, Debug)]
enum PalettesSubcommand {
    /// List palettes, marking the cursor.
    List,
    /// Append a palette (moving any palette with the same name to the end).
    Append { name: String, emojis: String },
    /// Insert a palette at an index (default: the cursor).
    Insert {
        name: String,
        emojis: String,
        #[arg(long, allow_hyphen_values = true)]
        at: Option<isize>,
    },
    /// Remove the palette at an index.
    Remove {
        #[arg(allow_hyphen_values = true)]
        index: isize,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();
    if let Err(err) = run(cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = EditorConfig::load(&cli.config)?;
    log::debug!("config: {config:?}");

    match cli.command {
        Command::Show { doc } => {
            let document = open_document(&doc)?;
            let json: serde_json::Value = serde_json::from_slice(&document.to_json()?)?;
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Command::Add {
            doc,
            content,
            x,
            y,
            size,
        } => {
            let mut document = open_document(&doc)?;
            match DropPayload::from_text(&content) {
                Some(DropPayload::Url(url)) => document.set_background(Some(url)),
                Some(DropPayload::Emoji(emoji)) => {
                    let size = size.unwrap_or(config.palette_emoji_size);
                    let id = document
                        .add_emoji(&emoji, Position::new(x, y), size)
                        .ok_or(CliError::IdsExhausted)?;
                    println!("{id}");
                }
                None => log::warn!("nothing to add"),
            }
            save_document(&doc, &document)?;
        }
        Command::Remove { doc, id } => {
            let mut document = open_document(&doc)?;
            if !document.remove_emoji(id) {
                return Err(CliError::NoSuchEmoji(id));
            }
            save_document(&doc, &document)?;
        }
        Command::Move { doc, id, dx, dy } => {
            let mut document = open_document(&doc)?;
            if !document.move_emoji(id, Position::new(dx, dy)) {
                return Err(CliError::NoSuchEmoji(id));
            }
            save_document(&doc, &document)?;
        }
        Command::Resize { doc, id, factor } => {
            let mut document = open_document(&doc)?;
            if !document.resize_emoji(id, factor) {
                return Err(CliError::NoSuchEmoji(id));
            }
            save_document(&doc, &document)?;
        }
        Command::Background { doc, url } => {
            let mut document = open_document(&doc)?;
            document.set_background(url);
            save_document(&doc, &document)?;
        }
        Command::Palettes(cmd) => {
            let settings_path = cli
                .settings
                .or_else(|| config.settings_path.clone())
                .unwrap_or_else(|| PathBuf::from("emoji-art-settings.json"));
            let settings: Rc<dyn SettingsStore> = Rc::new(FileSettings::open(&settings_path)?);
            let name = cmd.store.unwrap_or_else(|| config.palette_store.clone());
            let mut store = PaletteStore::named(name, settings);
            run_palettes(&mut store, cmd.command)?;
        }
    }
    Ok(())
}

fn run_palettes(store: &mut PaletteStore, command: PalettesSubcommand) -> Result<(), CliError> {
    match command {
        PalettesSubcommand::List => {
            let cursor = store.cursor_index();
            for (index, palette) in store.palettes().iter().enumerate() {
                let marker = if index == cursor { '>' } else { ' ' };
                println!("{marker} {index:>2} {:<14} {}", palette.name, palette.emojis());
            }
        }
        PalettesSubcommand::Append { name, emojis } => store.append(Palette::new(name, &emojis)),
        PalettesSubcommand::Insert { name, emojis, at } => {
            store.insert(Palette::new(name, &emojis), at);
        }
        PalettesSubcommand::Remove { index } => {
            let removed = store.remove(index).ok_or(CliError::LastPalette)?;
            println!("removed {}", removed.name);
        }
    }
    Ok(())
}

/// Open a document, starting a new one if the file does not exist.
fn open_document(path: &Path) -> Result<EmojiArtDocument, CliError> {
    match std::fs::read(path) {
        Ok(bytes) => EmojiArtDocument::from_json(&bytes, None).map_err(|source| CliError::Decode {
            path: path.to_path_buf(),
            source,
        }),
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            log::info!("{} does not exist, starting a new document", path.display());
            Ok(EmojiArtDocument::new())
        }
        Err(source) => Err(CliError::Read {
            path: path.to_path_buf(),
            source,
        }),
    }
}

fn save_document(path: &Path, document: &EmojiArtDocument) -> Result<(), CliError> {
    std::fs::write(path, document.to_json()?).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })
}
