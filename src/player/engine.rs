use crate::error::AppError;

/// Events the engine reports back to the session over its event channel.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// Playback actually started (or resumed).
    Playing,
    /// Playback actually paused.
    Paused,
    /// The playhead advanced to `position` seconds.
    Tick { position: f64 },
    /// The media ran to its end.
    Ended,
}

/// The opaque media-decoding engine. It holds at most one loaded resource;
/// the session releases the old one before acquiring the next.
pub trait MediaEngine: Send + Sync {
    /// Take ownership of a payload and prepare it for playback. Returns the
    /// media duration in seconds.
    fn load(&mut self, content: Vec<u8>) -> Result<f64, AppError>;

    /// Drop whatever resource is currently bound. Idempotent.
    fn release(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Move the playhead to `position` seconds.
    fn seek(&mut self, position: f64);
}
