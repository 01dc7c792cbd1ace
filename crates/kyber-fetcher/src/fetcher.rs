use async_trait::async_trait;
use kyber_core::types::{EventLog, GasPrice, MaxGasPrice, Rate, RateUsd};

/// One operation per polled data kind.
///
/// Each call either succeeds once or fails once. Implementations must be
/// `Send + Sync` so a single instance can be shared by every job task.
#[async_trait]
pub trait Fetcher: Send + Sync {
    async fn gas_price(&self) -> Result<GasPrice, FetchError>;

    async fn max_gas_price(&self) -> Result<MaxGasPrice, FetchError>;

    async fn kyber_enabled(&self) -> Result<bool, FetchError>;

    async fn rate_usd(&self) -> Result<RateUsd, FetchError>;

    async fn latest_block(&self) -> Result<u64, FetchError>;

    async fn rates(&self) -> Result<Vec<Rate>, FetchError>;

    /// Events emitted up to and including `block`.
    async fn events(&self, block: u64) -> Result<Vec<EventLog>, FetchError>;
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("upstream unavailable: {0}")]
    Unavailable(String),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

impl FetchError {
    /// Classify a transport error: connect/timeout failures are `Unavailable`.
    pub fn from_transport(e: reqwest::Error) -> Self {
        if e.is_connect() || e.is_timeout() {
            FetchError::Unavailable(e.to_string())
        } else {
            FetchError::Http(e)
        }
    }
}
