use thiserror::Error;

#[derive(Debug, Error)]
pub enum KyberError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl KyberError {
    /// Short error code string, stable across releases.
    pub fn code(&self) -> &'static str {
        match self {
            KyberError::Config(_) => "CONFIG_ERROR",
        }
    }
}

pub type Result<T> = std::result::Result<T, KyberError>;
