use std::collections::VecDeque;
use std::sync::Mutex;

use serde::Serialize;

/// Recent component-boundary failures, kept so the presentation layer can
/// surface them as notifications without tailing a log file.
pub struct ErrorLog {
    errors: Mutex<VecDeque<ErrorEntry>>,
    max_entries: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct ErrorEntry {
    pub timestamp: String,
    pub operation: String,
    pub error: String,
    pub context: Option<String>,
}

impl ErrorLog {
    pub fn new(max_entries: usize) -> Self {
        Self {
            errors: Mutex::new(VecDeque::new()),
            max_entries,
        }
    }

    pub fn record(&self, operation: &str, error: &str, context: Option<&str>) {
        let entry = ErrorEntry {
            timestamp: chrono::Utc::now().to_rfc3339(),
            operation: operation.to_string(),
            error: error.to_string(),
            context: context.map(|s| s.to_string()),
        };

        log::error!("[{}] {}: {}", entry.timestamp, operation, error);

        let mut errors = self.errors.lock().unwrap();
        if errors.len() >= self.max_entries {
            errors.pop_front();
        }
        errors.push_back(entry);
    }

    pub fn recent(&self) -> Vec<ErrorEntry> {
        self.errors.lock().unwrap().iter().cloned().collect()
    }

    pub fn clear(&self) {
        self.errors.lock().unwrap().clear();
    }
}

#[derive(Debug, Serialize)]
pub struct DiagnosticsReport {
    pub database_status: String,
    pub data_dir: String,
    pub podcast_count: i64,
    pub recent_errors: Vec<ErrorEntry>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_buffer_drops_oldest() {
        let log = ErrorLog::new(2);
        log.record("op", "first", None);
        log.record("op", "second", None);
        log.record("op", "third", Some("ctx"));

        let errors = log.recent();
        assert_eq!(errors.len(), 2);
        assert_eq!(errors[0].error, "second");
        assert_eq!(errors[1].error, "third");
        assert_eq!(errors[1].context.as_deref(), Some("ctx"));
    }

    #[test]
    fn test_clear() {
        let log = ErrorLog::new(10);
        log.record("op", "boom", None);
        log.clear();
        assert!(log.recent().is_empty());
    }
}
