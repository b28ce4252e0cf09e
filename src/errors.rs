use thiserror::Error;

/// Errors that can occur while cataloging or serving catalog requests.
#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Target directory not found: {path}")]
    NotFound { path: String },

    #[error("Output file already exists: {path}")]
    AlreadyExists { path: String },

    #[error("Invalid request format. {message}")]
    InvalidRequestFormat { message: String },

    #[error("{message}")]
    InvalidParams { message: String },

    #[error("{message}")]
    Unexpected { message: String },

    #[error("could not start server on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {message}")]
    Config { message: String },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl CatalogError {
    /// Returns `true` for failures caused by the paths a caller supplied:
    /// the two cataloger preconditions, and an output location that cannot
    /// be created because a parent directory is missing.
    pub fn is_precondition(&self) -> bool {
        match self {
            Self::NotFound { .. } | Self::AlreadyExists { .. } => true,
            Self::Io(e) => e.kind() == std::io::ErrorKind::NotFound,
            _ => false,
        }
    }
}

/// Convenience alias for results using `CatalogError`.
pub type Result<T> = std::result::Result<T, CatalogError>;
