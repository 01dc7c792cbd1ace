use std::time::Duration;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::types::DataKind;

pub const DEFAULT_CONFIG_PATH: &str = "kyber.toml";
pub const DEFAULT_RPC_URL: &str = "http://localhost:8545";
pub const DEFAULT_ERROR_LOG: &str = "error.log";
pub const DEFAULT_EVENT_LOOKBACK_BLOCKS: u64 = 10;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 5_000;
pub const DEFAULT_STOP_GRACE_SECS: u64 = 10;

/// Top-level config (kyber.toml + KYBER_* env overrides).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KyberConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub endpoints: EndpointsConfig,
    #[serde(default)]
    pub persister: PersisterConfig,
    #[serde(default)]
    pub scheduler: SchedulerConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub log: LogConfig,
}

/// Ethereum node the chain data is read from.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// Address of the network contract queried for max gas price, the
    /// enabled flag and events.
    #[serde(default)]
    pub network_contract: String,
    /// How many blocks before the latest block the event query covers.
    #[serde(default = "default_event_lookback")]
    pub event_lookback_blocks: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            network_contract: String::new(),
            event_lookback_blocks: DEFAULT_EVENT_LOOKBACK_BLOCKS,
            request_timeout_ms: DEFAULT_REQUEST_TIMEOUT_MS,
        }
    }
}

/// Off-chain HTTP endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndpointsConfig {
    #[serde(default = "default_rate_usd_url")]
    pub rate_usd_url: String,
    #[serde(default = "default_rates_url")]
    pub rates_url: String,
}

impl Default for EndpointsConfig {
    fn default() -> Self {
        Self {
            rate_usd_url: default_rate_usd_url(),
            rates_url: default_rates_url(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersisterConfig {
    /// Storage backend name. Only `"ram"` is built in.
    #[serde(default = "default_backend")]
    pub backend: String,
}

impl Default for PersisterConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// When set, every job ticks at this period and per-job cadences are
    /// ignored.
    #[serde(default)]
    pub fixed_tick_secs: Option<u64>,
    /// How long `stop` waits for in-flight runs before giving up on them.
    #[serde(default = "default_stop_grace_secs")]
    pub stop_grace_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            fixed_tick_secs: None,
            stop_grace_secs: DEFAULT_STOP_GRACE_SECS,
        }
    }
}

impl SchedulerConfig {
    pub fn fixed_tick(&self) -> Option<Duration> {
        self.fixed_tick_secs.map(Duration::from_secs)
    }

    pub fn stop_grace(&self) -> Duration {
        Duration::from_secs(self.stop_grace_secs)
    }
}

/// Per-job cadence overrides in seconds. Unset fields fall back to
/// [`DataKind::default_cadence`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobsConfig {
    pub gas_price_secs: Option<u64>,
    pub max_gas_price_secs: Option<u64>,
    pub kyber_enabled_secs: Option<u64>,
    pub rate_usd_secs: Option<u64>,
    pub latest_block_secs: Option<u64>,
    pub rates_secs: Option<u64>,
    pub events_secs: Option<u64>,
}

impl JobsConfig {
    pub fn cadence(&self, kind: DataKind) -> Duration {
        let secs = match kind {
            DataKind::GasPrice => self.gas_price_secs,
            DataKind::MaxGasPrice => self.max_gas_price_secs,
            DataKind::KyberEnabled => self.kyber_enabled_secs,
            DataKind::RateUsd => self.rate_usd_secs,
            DataKind::LatestBlock => self.latest_block_secs,
            DataKind::Rates => self.rates_secs,
            DataKind::Events => self.events_secs,
        };
        secs.map(Duration::from_secs)
            .unwrap_or_else(|| kind.default_cadence())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Append-only log receiving every warning and error.
    #[serde(default = "default_error_log")]
    pub error_log_path: String,
    /// Clear the error log when the process starts.
    #[serde(default = "bool_true")]
    pub truncate_on_start: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            error_log_path: default_error_log(),
            truncate_on_start: true,
        }
    }
}

fn bool_true() -> bool {
    true
}
fn default_rpc_url() -> String {
    DEFAULT_RPC_URL.to_string()
}
fn default_event_lookback() -> u64 {
    DEFAULT_EVENT_LOOKBACK_BLOCKS
}
fn default_request_timeout_ms() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_MS
}
fn default_rate_usd_url() -> String {
    "https://api.coinmarketcap.com/v1/ticker/ethereum/?convert=USD".to_string()
}
fn default_rates_url() -> String {
    "http://localhost:3000/rates".to_string()
}
fn default_backend() -> String {
    "ram".to_string()
}
fn default_stop_grace_secs() -> u64 {
    DEFAULT_STOP_GRACE_SECS
}
fn default_error_log() -> String {
    DEFAULT_ERROR_LOG.to_string()
}

impl KyberConfig {
    /// Load config from a TOML file with KYBER_* env var overrides.
    ///
    /// Nested keys use a double underscore, e.g. `KYBER_NODE__RPC_URL`.
    /// A missing file is not an error; every field has a default.
    pub fn load(config_path: Option<&str>) -> crate::error::Result<Self> {
        let path = config_path.unwrap_or(DEFAULT_CONFIG_PATH);

        let config: KyberConfig = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("KYBER_").split("__"))
            .extract()
            .map_err(|e| crate::error::KyberError::Config(e.to_string()))?;

        Ok(config)
    }
}
