// Edge-case tests for the content and progress stores
// Run with: cargo test --lib database::tests

#[cfg(test)]
mod content_store_tests {
    use crate::database::ContentStore;
    use tempfile::TempDir;

    fn setup_test_store() -> (ContentStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("podcasts.db");
        let store = ContentStore::open(&db_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_add_then_get_content_roundtrip() {
        let (store, _temp) = setup_test_store();

        let payload = b"ID3\x04\x00fake mp3 frames".to_vec();
        let meta = store.add("ep1.mp3", &payload).unwrap();
        assert!(meta.id > 0);
        assert_eq!(meta.name, "ep1.mp3");

        let stored = store.get_content(meta.id).unwrap().unwrap();
        assert_eq!(stored, payload);
    }

    #[test]
    fn test_get_content_unknown_id_is_none() {
        let (store, _temp) = setup_test_store();
        assert_eq!(store.get_content(99999).unwrap(), None);
    }

    #[test]
    fn test_list_orders_by_ascending_id() {
        let (store, _temp) = setup_test_store();

        store.add("x.mp3", b"x").unwrap();
        store.add("y.mp3", b"y").unwrap();
        store.add("z.mp3", b"z").unwrap();

        let names: Vec<String> = store
            .list()
            .unwrap()
            .into_iter()
            .map(|m| m.name)
            .collect();
        assert_eq!(names, vec!["x.mp3", "y.mp3", "z.mp3"]);

        let ids: Vec<i64> = store.list().unwrap().into_iter().map(|m| m.id).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_ids_are_monotonic() {
        let (store, _temp) = setup_test_store();

        let a = store.add("a.mp3", b"a").unwrap();
        let b = store.add("b.mp3", b"b").unwrap();
        assert!(b.id > a.id);
    }

    #[test]
    fn test_open_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("podcasts.db");

        let first = ContentStore::open(&db_path).unwrap();
        let meta = first.add("kept.mp3", b"payload").unwrap();

        // Re-opening the same file must not recreate the schema or lose rows
        let second = ContentStore::open(&db_path).unwrap();
        assert_eq!(second.list().unwrap().len(), 1);
        assert_eq!(
            second.get_content(meta.id).unwrap().unwrap(),
            b"payload".to_vec()
        );
    }

    #[test]
    fn test_large_binary_payload() {
        let (store, _temp) = setup_test_store();

        let payload: Vec<u8> = (0..1_000_000u32).map(|i| (i % 251) as u8).collect();
        let meta = store.add("big.mp3", &payload).unwrap();
        assert_eq!(store.get_content(meta.id).unwrap().unwrap(), payload);
    }

    #[test]
    fn test_unicode_and_special_names() {
        let (store, _temp) = setup_test_store();

        let names = vec![
            "Señor 日本語 🎙️.mp3",
            "O'Brien's show.mp3",
            "quote\"here\".mp3",
            "Drop; DROP TABLE podcasts;--.mp3",
        ];
        for name in &names {
            store.add(name, b"audio").unwrap();
        }

        let listed: Vec<String> = store.list().unwrap().into_iter().map(|m| m.name).collect();
        assert_eq!(listed, names);
    }

    #[test]
    fn test_count() {
        let (store, _temp) = setup_test_store();
        assert_eq!(store.count().unwrap(), 0);

        store.add("a.mp3", b"a").unwrap();
        store.add("b.mp3", b"b").unwrap();
        assert_eq!(store.count().unwrap(), 2);
    }
}

#[cfg(test)]
mod progress_store_tests {
    use crate::database::{PlaybackProgress, ProgressStore};
    use tempfile::TempDir;

    fn setup_test_store() -> (ProgressStore, TempDir) {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("progress.db");
        let store = ProgressStore::open(&db_path).unwrap();
        (store, temp_dir)
    }

    #[test]
    fn test_get_absent_returns_default() {
        let (store, _temp) = setup_test_store();
        assert_eq!(store.get(7).unwrap(), PlaybackProgress::default());
    }

    #[test]
    fn test_set_then_get() {
        let (store, _temp) = setup_test_store();

        store.set(3, 42.5, 120.0).unwrap();
        let progress = store.get(3).unwrap();
        assert_eq!(progress.current_position, 42.5);
        assert_eq!(progress.total_duration, 120.0);
    }

    #[test]
    fn test_set_overwrites_in_place() {
        let (store, _temp) = setup_test_store();

        store.set(3, 10.0, 120.0).unwrap();
        store.set(3, 55.0, 120.0).unwrap();
        assert_eq!(store.get(3).unwrap().current_position, 55.0);
    }

    #[test]
    fn test_records_are_keyed_per_podcast() {
        let (store, _temp) = setup_test_store();

        store.set(1, 10.0, 100.0).unwrap();
        store.set(2, 20.0, 200.0).unwrap();

        assert_eq!(store.get(1).unwrap().current_position, 10.0);
        assert_eq!(store.get(2).unwrap().current_position, 20.0);
    }

    #[test]
    fn test_end_of_media_reset_roundtrip() {
        let (store, _temp) = setup_test_store();

        store.set(5, 118.0, 120.0).unwrap();
        store.set(5, 0.0, 120.0).unwrap();

        let progress = store.get(5).unwrap();
        assert_eq!(progress.current_position, 0.0);
        assert_eq!(progress.total_duration, 120.0);
    }

    #[test]
    fn test_malformed_json_reads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("progress.db");
        let store = ProgressStore::open(&db_path).unwrap();

        // Sneak garbage into the row the way a corrupted write would
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO playback_progress (key, value) VALUES ('progress:9', 'not json')",
            [],
        )
        .unwrap();

        assert_eq!(store.get(9).unwrap(), PlaybackProgress::default());
    }

    #[test]
    fn test_invariant_violating_record_reads_as_default() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("progress.db");
        let store = ProgressStore::open(&db_path).unwrap();

        // Position beyond duration violates the record invariant
        let conn = rusqlite::Connection::open(&db_path).unwrap();
        conn.execute(
            "INSERT OR REPLACE INTO playback_progress (key, value)
             VALUES ('progress:4', '{\"currentPosition\":500.0,\"totalDuration\":120.0}')",
            [],
        )
        .unwrap();

        assert_eq!(store.get(4).unwrap(), PlaybackProgress::default());
    }

    #[test]
    fn test_value_is_camel_case_json() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("progress.db");
        let store = ProgressStore::open(&db_path).unwrap();

        store.set(2, 30.0, 90.0).unwrap();

        let conn = rusqlite::Connection::open(&db_path).unwrap();
        let raw: String = conn
            .query_row(
                "SELECT value FROM playback_progress WHERE key = 'progress:2'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert!(raw.contains("\"currentPosition\""));
        assert!(raw.contains("\"totalDuration\""));
    }
}
