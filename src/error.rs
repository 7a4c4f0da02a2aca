use thiserror::Error;

/// Broad classification of everything that can go wrong between a view and the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Superseded by a newer request with the same key. Never user-visible.
    Cancellation,
    /// The server could not be reached.
    Transport,
    /// Non-200 status or an unusable body.
    Server,
    /// The configuration endpoint reported maintenance mode.
    Maintenance,
    /// Stored or received data did not parse.
    Decode,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request canceled")]
    Canceled,
    #[error("transport error: {0}")]
    Transport(String),
    #[error("server error: {status} {text}")]
    Server { status: u16, text: String },
    #[error("website is in maintenance mode")]
    Maintenance,
    #[error("could not decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl ApiError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ApiError::Canceled => ErrorKind::Cancellation,
            ApiError::Transport(_) => ErrorKind::Transport,
            ApiError::Server { .. } => ErrorKind::Server,
            ApiError::Maintenance => ErrorKind::Maintenance,
            ApiError::Decode { .. } => ErrorKind::Decode,
        }
    }
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage io error at {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid session name '{0}'")]
    InvalidSession(String),
}
