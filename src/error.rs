use thiserror::Error;

/// Typed application error hierarchy for all component boundaries.
///
/// Serializes as a plain string (the `error.message` convention a
/// presentation layer expects) while giving Rust code typed variants
/// that can be matched or propagated with `?`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("failed to open storage: {0}")]
    StorageOpen(String),

    #[error("storage write failed: {0}")]
    StorageWrite(String),

    #[error("storage read failed: {0}")]
    StorageRead(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("failed to load media: {0}")]
    MediaLoad(String),

    #[error("{0}")]
    Io(String),
}

/// Serialize as a plain string so the presentation layer receives the same
/// `"error message"` string a toast or dialog expects.
impl serde::Serialize for AppError {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&self.to_string())
    }
}

// ── From impls ─────────────────────────────────────────────────────────────

impl From<std::io::Error> for AppError {
    fn from(e: std::io::Error) -> Self {
        AppError::Io(e.to_string())
    }
}
