use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown variant: {0} (expected 'light' or 'dark')")]
    UnknownVariant(String),

    #[error("Unknown platform: {0} (expected 'instagram' or 'facebook')")]
    UnknownPlatform(String),
}

pub type Result<T> = std::result::Result<T, CoreError>;
