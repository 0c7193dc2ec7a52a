use thiserror::Error;

/// Errors produced while building or loading artifacts.
#[derive(Error, Debug)]
pub enum Error {
    /// Histogram access or arithmetic failed.
    #[error(transparent)]
    Root(#[from] ov_root::RootError),

    /// Artifact (de)serialization failed.
    #[error("artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Inputs or a loaded artifact are inconsistent.
    #[error("validation error: {0}")]
    Validation(String),

    /// Environment failure while computing metadata.
    #[error("computation error: {0}")]
    Computation(String),
}

/// Result alias for artifact operations.
pub type Result<T> = std::result::Result<T, Error>;
