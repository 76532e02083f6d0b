use serde::Serialize;

use super::engine::EngineEvent;

/// Position drift (seconds) a tick must accumulate before the progress
/// store is written. Bounds write frequency to roughly one write per five
/// seconds of playback regardless of tick granularity.
pub(crate) const PERSIST_DRIFT_SECS: f64 = 5.0;

/// Where the session currently is. `Ended` is not terminal; the next
/// selection leaves it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Loading => write!(f, "loading"),
            Self::Playing => write!(f, "playing"),
            Self::Paused => write!(f, "paused"),
            Self::Ended => write!(f, "ended"),
        }
    }
}

/// Everything the session machine reacts to: user commands, store fetch
/// completions, engine prime results, and engine events.
#[derive(Debug)]
pub(crate) enum Input {
    Select {
        podcast_id: i64,
    },
    TogglePlayPause,
    Seek {
        position: f64,
    },
    /// Payload and saved position came back from the stores.
    Fetched {
        generation: u64,
        podcast_id: i64,
        payload: Option<Vec<u8>>,
        resume_at: f64,
    },
    /// The engine accepted the payload and reported its duration.
    Primed {
        duration: f64,
        resume_at: f64,
    },
    /// The engine rejected the payload.
    PrimeFailed,
    Engine(EngineEvent),
}

/// Side effects a transition asks the worker to perform. The machine
/// itself never touches the engine or the stores.
#[derive(Debug, PartialEq)]
pub(crate) enum Effect {
    ReleaseEngine,
    FetchMedia {
        podcast_id: i64,
        generation: u64,
    },
    PrimeEngine {
        payload: Vec<u8>,
        resume_at: f64,
    },
    Play,
    Pause,
    SeekTo {
        position: f64,
    },
    PersistProgress {
        podcast_id: i64,
        position: f64,
        duration: f64,
    },
    ReportLoadFailure {
        podcast_id: i64,
    },
}

/// The playback-session state machine. Pure: `handle` mutates in-memory
/// fields and returns the effects to run, nothing else.
#[derive(Debug)]
pub(crate) struct SessionMachine {
    pub(crate) active_podcast_id: Option<i64>,
    pub(crate) state: SessionState,
    pub(crate) position: f64,
    pub(crate) duration: f64,
    last_persisted: f64,
    generation: u64,
}

impl SessionMachine {
    pub(crate) fn new() -> Self {
        Self {
            active_podcast_id: None,
            state: SessionState::Idle,
            position: 0.0,
            duration: 0.0,
            last_persisted: 0.0,
            generation: 0,
        }
    }

    pub(crate) fn handle(&mut self, input: Input) -> Vec<Effect> {
        match input {
            Input::Select { podcast_id } => self.select(podcast_id),
            Input::TogglePlayPause => self.toggle(),
            Input::Seek { position } => self.seek(position),
            Input::Fetched {
                generation,
                podcast_id,
                payload,
                resume_at,
            } => self.fetched(generation, podcast_id, payload, resume_at),
            Input::Primed {
                duration,
                resume_at,
            } => self.primed(duration, resume_at),
            Input::PrimeFailed => {
                self.reset_to_idle();
                Vec::new()
            }
            Input::Engine(event) => self.engine_event(event),
        }
    }

    fn select(&mut self, podcast_id: i64) -> Vec<Effect> {
        if self.active_podcast_id == Some(podcast_id) {
            return match self.state {
                SessionState::Playing => vec![Effect::Pause],
                SessionState::Paused | SessionState::Ended => vec![Effect::Play],
                // Nothing is primed yet; the pending load keeps going
                SessionState::Loading | SessionState::Idle => Vec::new(),
            };
        }

        self.generation += 1;
        self.active_podcast_id = Some(podcast_id);
        self.state = SessionState::Loading;
        self.position = 0.0;
        self.duration = 0.0;
        self.last_persisted = 0.0;

        // Release before acquire: the old engine resource must be gone
        // before the new payload is fetched
        vec![
            Effect::ReleaseEngine,
            Effect::FetchMedia {
                podcast_id,
                generation: self.generation,
            },
        ]
    }

    fn toggle(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Playing => vec![Effect::Pause],
            SessionState::Paused => vec![Effect::Play],
            _ => Vec::new(),
        }
    }

    fn seek(&mut self, position: f64) -> Vec<Effect> {
        if self.active_podcast_id.is_none() || !position.is_finite() {
            return Vec::new();
        }

        let clamped = position.clamp(0.0, self.duration);
        self.position = clamped;
        vec![Effect::SeekTo { position: clamped }]
    }

    fn fetched(
        &mut self,
        generation: u64,
        podcast_id: i64,
        payload: Option<Vec<u8>>,
        resume_at: f64,
    ) -> Vec<Effect> {
        // Stale-completion guard: a load superseded by a newer select must
        // not touch the session
        if generation != self.generation || self.state != SessionState::Loading {
            return Vec::new();
        }

        match payload {
            Some(payload) => vec![Effect::PrimeEngine { payload, resume_at }],
            None => {
                self.reset_to_idle();
                vec![Effect::ReportLoadFailure { podcast_id }]
            }
        }
    }

    fn primed(&mut self, duration: f64, resume_at: f64) -> Vec<Effect> {
        if self.state != SessionState::Loading {
            return Vec::new();
        }

        self.duration = duration.max(0.0);
        self.position = resume_at.min(self.duration);
        self.state = SessionState::Playing;
        Vec::new()
    }

    fn engine_event(&mut self, event: EngineEvent) -> Vec<Effect> {
        let Some(podcast_id) = self.active_podcast_id else {
            return Vec::new();
        };

        match event {
            EngineEvent::Playing => {
                if matches!(
                    self.state,
                    SessionState::Paused | SessionState::Ended | SessionState::Loading
                ) {
                    self.state = SessionState::Playing;
                }
                Vec::new()
            }
            EngineEvent::Paused => {
                // An engine pause emitted at end-of-media must not clobber
                // the Ended state
                if self.state == SessionState::Playing {
                    self.state = SessionState::Paused;
                }
                Vec::new()
            }
            EngineEvent::Tick { position } => {
                if !matches!(self.state, SessionState::Playing | SessionState::Paused) {
                    return Vec::new();
                }
                self.position = position;

                if (self.position - self.last_persisted).abs() > PERSIST_DRIFT_SECS {
                    self.last_persisted = self.position;
                    vec![Effect::PersistProgress {
                        podcast_id,
                        position: self.position,
                        duration: self.duration,
                    }]
                } else {
                    Vec::new()
                }
            }
            EngineEvent::Ended => {
                self.state = SessionState::Ended;
                self.position = 0.0;
                self.last_persisted = 0.0;
                // Reset-to-start for the next resume, bypassing the drift
                // threshold
                vec![Effect::PersistProgress {
                    podcast_id,
                    position: 0.0,
                    duration: self.duration,
                }]
            }
        }
    }

    fn reset_to_idle(&mut self) {
        self.active_podcast_id = None;
        self.state = SessionState::Idle;
        self.position = 0.0;
        self.duration = 0.0;
        self.last_persisted = 0.0;
    }
}
