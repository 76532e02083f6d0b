pub mod engine;
pub(crate) mod state;


use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{mpsc, RwLock};

use crate::database::{ContentStore, ProgressStore};
use crate::diagnostics::ErrorLog;
use crate::error::AppError;
use engine::{EngineEvent, MediaEngine};
use state::{Effect, Input, SessionMachine};

pub use state::SessionState;

/// User-facing playback commands. Fire-and-forget: none of them waits on a
/// store round-trip.
#[derive(Debug, Clone)]
pub enum PlayerCommand {
    Select { podcast_id: i64 },
    TogglePlayPause,
    Seek { position: f64 },
}

/// Snapshot of the session for the presentation layer.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStatus {
    pub state: SessionState,
    pub active_podcast_id: Option<i64>,
    pub position: f64,
    pub duration: f64,
}

impl Default for PlayerStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Idle,
            active_podcast_id: None,
            position: 0.0,
            duration: 0.0,
        }
    }
}

/// Handle for sending commands to the player worker and reading its state.
#[derive(Clone)]
pub struct PlayerHandle {
    command_tx: mpsc::UnboundedSender<PlayerCommand>,
    status: Arc<RwLock<PlayerStatus>>,
}

impl PlayerHandle {
    pub fn select(&self, podcast_id: i64) {
        let _ = self.command_tx.send(PlayerCommand::Select { podcast_id });
    }

    pub fn toggle_play_pause(&self) {
        let _ = self.command_tx.send(PlayerCommand::TogglePlayPause);
    }

    pub fn seek(&self, position: f64) {
        let _ = self.command_tx.send(PlayerCommand::Seek { position });
    }

    pub async fn status(&self) -> PlayerStatus {
        self.status.read().await.clone()
    }
}

/// Outcome of a background payload + progress fetch, tagged with the
/// generation of the select that requested it.
struct FetchOutcome {
    generation: u64,
    podcast_id: i64,
    payload: Option<Vec<u8>>,
    resume_at: f64,
}

/// The playback-session worker: owns the media engine and the session
/// machine, and turns the machine's effects into engine calls and store
/// I/O. Exactly one exists per application.
pub struct PlayerWorker {
    content: Arc<ContentStore>,
    progress: Arc<ProgressStore>,
    errors: Arc<ErrorLog>,
    engine: Box<dyn MediaEngine>,
    machine: SessionMachine,
    command_rx: mpsc::UnboundedReceiver<PlayerCommand>,
    engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    fetch_tx: mpsc::UnboundedSender<FetchOutcome>,
    fetch_rx: mpsc::UnboundedReceiver<FetchOutcome>,
    status: Arc<RwLock<PlayerStatus>>,
}

impl PlayerWorker {
    /// Spawn the worker onto the current runtime and hand back its handle.
    pub fn start(
        content: Arc<ContentStore>,
        progress: Arc<ProgressStore>,
        errors: Arc<ErrorLog>,
        engine: Box<dyn MediaEngine>,
        engine_rx: mpsc::UnboundedReceiver<EngineEvent>,
    ) -> PlayerHandle {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (fetch_tx, fetch_rx) = mpsc::unbounded_channel();
        let status = Arc::new(RwLock::new(PlayerStatus::default()));

        let handle = PlayerHandle {
            command_tx,
            status: status.clone(),
        };

        let worker = PlayerWorker {
            content,
            progress,
            errors,
            engine,
            machine: SessionMachine::new(),
            command_rx,
            engine_rx,
            fetch_tx,
            fetch_rx,
            status,
        };
        tokio::spawn(worker.run());

        handle
    }

    async fn run(mut self) {
        log::info!("Player worker started");

        loop {
            let input = tokio::select! {
                command = self.command_rx.recv() => match command {
                    Some(PlayerCommand::Select { podcast_id }) => Input::Select { podcast_id },
                    Some(PlayerCommand::TogglePlayPause) => Input::TogglePlayPause,
                    Some(PlayerCommand::Seek { position }) => Input::Seek { position },
                    None => break,
                },
                event = self.engine_rx.recv() => match event {
                    Some(event) => Input::Engine(event),
                    None => break,
                },
                outcome = self.fetch_rx.recv() => match outcome {
                    Some(o) => Input::Fetched {
                        generation: o.generation,
                        podcast_id: o.podcast_id,
                        payload: o.payload,
                        resume_at: o.resume_at,
                    },
                    // Unreachable while the worker holds its own fetch_tx
                    None => break,
                },
            };

            let effects = self.machine.handle(input);
            self.execute(effects);
            self.sync_status().await;
        }

        log::info!("Player worker stopped");
    }

    fn execute(&mut self, effects: Vec<Effect>) {
        let mut queue: VecDeque<Effect> = effects.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                Effect::ReleaseEngine => self.engine.release(),
                Effect::Play => self.engine.play(),
                Effect::Pause => self.engine.pause(),
                Effect::SeekTo { position } => self.engine.seek(position),
                Effect::FetchMedia {
                    podcast_id,
                    generation,
                } => self.spawn_fetch(podcast_id, generation),
                Effect::PrimeEngine { payload, resume_at } => {
                    queue.extend(self.prime(payload, resume_at));
                }
                Effect::PersistProgress {
                    podcast_id,
                    position,
                    duration,
                } => self.spawn_persist(podcast_id, position, duration),
                Effect::ReportLoadFailure { podcast_id } => {
                    let error =
                        AppError::MediaLoad(format!("no stored content for podcast {}", podcast_id));
                    self.errors.record("select", &error.to_string(), None);
                }
            }
        }
    }

    /// Hand the payload to the engine, resume at the saved position, start
    /// playback. The engine resource is released on the failure path so a
    /// later select never double-acquires.
    fn prime(&mut self, payload: Vec<u8>, resume_at: f64) -> Vec<Effect> {
        match self.engine.load(payload) {
            Ok(duration) => {
                let resume = resume_at.min(duration.max(0.0));
                if resume > 0.0 {
                    self.engine.seek(resume);
                }
                self.engine.play();
                self.machine.handle(Input::Primed {
                    duration,
                    resume_at: resume,
                })
            }
            Err(e) => {
                self.engine.release();
                log::error!("Failed to prime media engine: {}", e);
                self.errors.record("select", &e.to_string(), None);
                self.machine.handle(Input::PrimeFailed)
            }
        }
    }

    fn spawn_fetch(&self, podcast_id: i64, generation: u64) {
        let content = self.content.clone();
        let progress = self.progress.clone();
        let errors = self.errors.clone();
        let fetch_tx = self.fetch_tx.clone();

        tokio::task::spawn_blocking(move || {
            let payload = match content.get_content(podcast_id) {
                Ok(payload) => payload,
                Err(e) => {
                    log::error!("Failed to read podcast {}: {}", podcast_id, e);
                    errors.record("select", &e.to_string(), None);
                    None
                }
            };
            // A progress read failure downgrades to start-of-track
            let resume_at = match progress.get(podcast_id) {
                Ok(saved) => saved.current_position,
                Err(e) => {
                    log::warn!("Failed to read progress for podcast {}: {}", podcast_id, e);
                    errors.record("select", &e.to_string(), None);
                    0.0
                }
            };
            let _ = fetch_tx.send(FetchOutcome {
                generation,
                podcast_id,
                payload,
                resume_at,
            });
        });
    }

    fn spawn_persist(&self, podcast_id: i64, position: f64, duration: f64) {
        let progress = self.progress.clone();
        let errors = self.errors.clone();

        // Fire-and-forget: playback never waits on this write, and a
        // failure must not interrupt it
        tokio::task::spawn_blocking(move || {
            if let Err(e) = progress.set(podcast_id, position, duration) {
                log::warn!(
                    "Failed to persist progress for podcast {}: {}",
                    podcast_id,
                    e
                );
                errors.record("persist_progress", &e.to_string(), None);
            }
        });
    }

    async fn sync_status(&self) {
        let mut status = self.status.write().await;
        if status.state != self.machine.state {
            log::debug!("Session state: {}", self.machine.state);
        }
        status.state = self.machine.state;
        status.active_podcast_id = self.machine.active_podcast_id;
        status.position = self.machine.position;
        status.duration = self.machine.duration;
    }
}
