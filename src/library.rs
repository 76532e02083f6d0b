use std::sync::RwLock;

use serde::Serialize;

use crate::database::{ContentStore, PlaybackProgress, PodcastMetadata, ProgressStore};
use crate::error::AppError;

/// One library row as the presentation layer wants it: metadata plus the
/// saved position read on demand from the progress store.
#[derive(Debug, Clone, Serialize)]
pub struct LibraryEntry {
    pub id: i64,
    pub name: String,
    pub progress: PlaybackProgress,
}

/// In-memory projection of the content store, kept in ascending-id order.
/// Built once at startup and appended to on import; a failed import never
/// touches it.
pub struct LibraryIndex {
    entries: RwLock<Vec<PodcastMetadata>>,
}

impl LibraryIndex {
    pub fn from_store(content: &ContentStore) -> Result<Self, AppError> {
        let entries = content.list()?;
        Ok(Self {
            entries: RwLock::new(entries),
        })
    }

    pub fn empty() -> Self {
        Self {
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Append a freshly imported podcast. Ids are store-assigned and
    /// monotonic, so pushing keeps the index sorted.
    pub fn push(&self, metadata: PodcastMetadata) {
        self.entries.write().unwrap().push(metadata);
    }

    pub fn list(&self) -> Vec<PodcastMetadata> {
        self.entries.read().unwrap().clone()
    }

    /// Library rows with per-item progress. A progress read failure degrades
    /// to the never-played default rather than failing the whole listing.
    pub fn list_with_progress(&self, progress: &ProgressStore) -> Vec<LibraryEntry> {
        self.list()
            .into_iter()
            .map(|meta| LibraryEntry {
                progress: progress.get(meta.id).unwrap_or_default(),
                id: meta.id,
                name: meta.name,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The import gate: any audio container, or an mp4 video wrapper.
pub fn is_supported_media_type(media_type: &str) -> bool {
    media_type.starts_with("audio/") || media_type == "video/mp4"
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::ContentStore;
    use tempfile::TempDir;

    #[test]
    fn test_media_type_gate() {
        assert!(is_supported_media_type("audio/mpeg"));
        assert!(is_supported_media_type("audio/ogg"));
        assert!(is_supported_media_type("video/mp4"));

        assert!(!is_supported_media_type("video/webm"));
        assert!(!is_supported_media_type("image/png"));
        assert!(!is_supported_media_type("application/octet-stream"));
        assert!(!is_supported_media_type(""));
    }

    #[test]
    fn test_index_builds_from_store_and_appends() {
        let temp = TempDir::new().unwrap();
        let content = ContentStore::open(&temp.path().join("podcasts.db")).unwrap();
        content.add("first.mp3", b"a").unwrap();
        content.add("second.mp3", b"b").unwrap();

        let index = LibraryIndex::from_store(&content).unwrap();
        assert_eq!(index.len(), 2);

        let third = content.add("third.mp3", b"c").unwrap();
        index.push(third);

        let names: Vec<String> = index.list().into_iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["first.mp3", "second.mp3", "third.mp3"]);
    }

    #[test]
    fn test_listing_pairs_entries_with_progress() {
        let temp = TempDir::new().unwrap();
        let content = ContentStore::open(&temp.path().join("podcasts.db")).unwrap();
        let progress = ProgressStore::open(&temp.path().join("progress.db")).unwrap();

        let a = content.add("a.mp3", b"a").unwrap();
        let b = content.add("b.mp3", b"b").unwrap();
        progress.set(a.id, 42.0, 120.0).unwrap();

        let index = LibraryIndex::from_store(&content).unwrap();
        let entries = index.list_with_progress(&progress);

        assert_eq!(entries[0].progress.current_position, 42.0);
        assert_eq!(entries[1].id, b.id);
        assert_eq!(entries[1].progress, PlaybackProgress::default());
    }
}
