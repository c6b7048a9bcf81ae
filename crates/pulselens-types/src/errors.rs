use thiserror::Error;

pub type Result<T, E = PulseError> = std::result::Result<T, E>;

/// Unified error type covering common failure scenarios across subsystems.
#[derive(Debug, Error)]
pub enum PulseError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("invalid input: {0}")]
    Input(String),
    #[error("vision error: {0}")]
    Vision(String),
    #[error("spectral error: {0}")]
    Spectral(String),
    #[error("engine error: {0}")]
    Engine(String),
    #[error("operational error: {0}")]
    Ops(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
