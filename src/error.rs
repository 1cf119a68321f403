use thiserror::Error;

/// Result type for word-frequency operations
pub type Result<T> = std::result::Result<T, WordFreqError>;

/// Errors that can occur while building or running the word-frequency pipeline
///
/// Per-file read failures are not represented here: a Line Source logs them and
/// skips the file.
#[derive(Error, Debug)]
pub enum WordFreqError {
    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pipeline thread could not be spawned or panicked
    #[error("Thread error: {0}")]
    Thread(String),

    /// The chart could not be rasterized or encoded
    #[error("Chart render error: {0}")]
    Render(String),

    /// The chart could not be written
    #[error("Chart output error: {0}")]
    Chart(#[source] std::io::Error),

    /// The diagnostic server failed to bind or serve
    #[error("Diagnostic server error: {0}")]
    Diagnostics(#[source] std::io::Error),
}
