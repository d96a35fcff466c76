use thiserror::Error;

/// Errors raised by the translation store, registry and manager.
///
/// Lookup misses are never errors; they surface as `None` or an empty string.
#[derive(Debug, Error)]
pub enum TranslationError {
    /// Storage failure, propagated unmodified from the driver.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Unknown content type: '{0}'")]
    UnknownContentType(String),

    #[error("Unknown option '{option}' for content type '{content_type}'")]
    UnknownOption {
        content_type: String,
        option: String,
    },

    /// No binding exists for the handler or any of its ancestors.
    #[error("Handler '{0}' is not bound to a content type")]
    UnboundHandler(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, TranslationError>;
