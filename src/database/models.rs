use serde::{Deserialize, Serialize};

/// Read-only projection of a stored podcast: what the library listing shows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastMetadata {
    pub id: i64,
    pub name: String,
}

/// Resumable playback position for one podcast, stored as camelCase JSON
/// under `progress:<id>`. `{0, 0}` means never played.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaybackProgress {
    pub current_position: f64,
    pub total_duration: f64,
}

impl PlaybackProgress {
    /// A stored record is trusted only if it satisfies the position
    /// invariant; anything else reads back as the default.
    pub fn is_valid(&self) -> bool {
        self.current_position.is_finite()
            && self.total_duration.is_finite()
            && self.current_position >= 0.0
            && self.total_duration >= 0.0
            && (self.total_duration == 0.0 || self.current_position <= self.total_duration)
    }
}
