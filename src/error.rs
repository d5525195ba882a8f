use thiserror::Error;

/// Everything that can go wrong between recording an event and the
/// metrics backend acknowledging a batch.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("config error: {0}")]
    Config(String),
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("metrics backend returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("sampler error: {0}")]
    Sampler(String),
}

pub type Result<T> = std::result::Result<T, TelemetryError>;
