use thiserror::Error;

/// Unified error type for track-repo operations
#[derive(Error, Debug)]
pub enum TrackRepoError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Publish error: {0}")]
    Publish(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in track-repo
pub type Result<T> = std::result::Result<T, TrackRepoError>;

impl TrackRepoError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        TrackRepoError::Config(msg.into())
    }

    /// Create a fetch error with context
    pub fn fetch(msg: impl Into<String>) -> Self {
        TrackRepoError::Fetch(msg.into())
    }

    /// Create a publish error with context
    pub fn publish(msg: impl Into<String>) -> Self {
        TrackRepoError::Publish(msg.into())
    }

    /// Create a pipeline error with context
    pub fn pipeline(msg: impl Into<String>) -> Self {
        TrackRepoError::Pipeline(msg.into())
    }

    /// Process exit code for this error.
    ///
    /// Missing required configuration exits with 127 before the pipeline
    /// runs; every other failure exits with 1.
    pub fn exit_code(&self) -> i32 {
        match self {
            TrackRepoError::Config(_) => 127,
            _ => 1,
        }
    }
}
