pub mod config;
pub mod database;
pub mod diagnostics;
pub mod error;
pub mod library;
pub mod player;

use std::sync::Arc;

use tokio::sync::mpsc;

use config::Config;
use database::{ContentStore, PodcastMetadata, ProgressStore};
use diagnostics::{DiagnosticsReport, ErrorEntry, ErrorLog};
use error::AppError;
use library::{LibraryEntry, LibraryIndex};
use player::engine::{EngineEvent, MediaEngine};
use player::{PlayerHandle, PlayerWorker};

/// Install the logging backend. Honors `RUST_LOG`-style filtering and
/// captures `log` records.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();
}

/// Channel the host wires between its engine implementation and the player
/// worker: the engine keeps the sender, `App::new` takes the receiver.
pub fn engine_channel() -> (
    mpsc::UnboundedSender<EngineEvent>,
    mpsc::UnboundedReceiver<EngineEvent>,
) {
    mpsc::unbounded_channel()
}

/// Application controller. Owns both stores, the library index, the error
/// log, and the player worker; the presentation layer talks to nothing
/// else. Must be created inside a tokio runtime (the player worker is
/// spawned onto it).
pub struct App {
    config: Config,
    content: Arc<ContentStore>,
    progress: Arc<ProgressStore>,
    library: Arc<LibraryIndex>,
    errors: Arc<ErrorLog>,
    player: PlayerHandle,
}

impl App {
    pub fn new(
        config: Config,
        engine: Box<dyn MediaEngine>,
        engine_events: mpsc::UnboundedReceiver<EngineEvent>,
    ) -> Result<Self, AppError> {
        std::fs::create_dir_all(&config.data_dir)?;

        let content = Arc::new(ContentStore::open(&config.content_db_path())?);
        let progress = Arc::new(ProgressStore::open(&config.progress_db_path())?);
        let errors = Arc::new(ErrorLog::new(100));

        // A failed startup scan is reported, not fatal: the user keeps an
        // empty library rather than no application
        let library = match LibraryIndex::from_store(&content) {
            Ok(index) => index,
            Err(e) => {
                log::error!("Failed to load library index: {}", e);
                errors.record("startup", &e.to_string(), None);
                LibraryIndex::empty()
            }
        };
        let library = Arc::new(library);

        let player = PlayerWorker::start(
            content.clone(),
            progress.clone(),
            errors.clone(),
            engine,
            engine_events,
        );

        log::info!("Podcast library initialized ({} items)", library.len());

        Ok(Self {
            config,
            content,
            progress,
            library,
            errors,
            player,
        })
    }

    /// Import a media payload into the library. Only audio types and mp4
    /// video containers pass the gate; everything else is rejected before
    /// the content store sees it.
    pub fn import(
        &self,
        name: &str,
        media_type: &str,
        content: &[u8],
    ) -> Result<PodcastMetadata, AppError> {
        if !library::is_supported_media_type(media_type) {
            return Err(AppError::InvalidInput(format!(
                "unsupported media type: {}",
                media_type
            )));
        }

        let metadata = self.content.add(name, content)?;
        self.library.push(metadata.clone());
        log::info!("Imported \"{}\" as podcast {}", metadata.name, metadata.id);

        Ok(metadata)
    }

    /// Library rows in import order, each with its saved progress.
    pub fn library(&self) -> Vec<LibraryEntry> {
        self.library.list_with_progress(&self.progress)
    }

    pub fn player(&self) -> &PlayerHandle {
        &self.player
    }

    pub fn recent_errors(&self) -> Vec<ErrorEntry> {
        self.errors.recent()
    }

    pub fn clear_errors(&self) {
        self.errors.clear();
    }

    pub fn diagnostics(&self) -> DiagnosticsReport {
        let (database_status, podcast_count) = match self.content.count() {
            Ok(count) => ("ok".to_string(), count),
            Err(e) => (format!("error: {}", e), 0),
        };

        DiagnosticsReport {
            database_status,
            data_dir: self.config.data_dir.display().to_string(),
            podcast_count,
            recent_errors: self.errors.recent(),
        }
    }
}
