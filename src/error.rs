use std::path::PathBuf;

use thiserror::Error;

/// Failure classes of the tutor pipeline.
///
/// Only [`TutorError::TransientService`] is ever retried, and only at the
/// language-model call site.
#[derive(Debug, Error)]
pub enum TutorError {
    /// Missing or invalid vocabulary, lesson table or settings.
    #[error("configuration error: {0}")]
    Config(String),

    /// The source document could not be read.
    #[error("cannot extract {}: {message}", path.display())]
    Extraction { path: PathBuf, message: String },

    /// Rate limiting or a network blip on a language-model request.
    #[error("transient service error: {0}")]
    TransientService(String),

    /// The language model rejected the request or replied with garbage.
    #[error("completion error: {0}")]
    Completion(String),

    #[error("embedding error: {0}")]
    Embedding(String),

    #[error("vector store error: {0}")]
    Store(String),
}

impl TutorError {
    pub fn is_transient(&self) -> bool {
        matches!(self, TutorError::TransientService(_))
    }
}

pub type Result<T> = std::result::Result<T, TutorError>;
