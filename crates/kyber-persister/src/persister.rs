use std::sync::Arc;

use kyber_core::types::{EventLog, GasPrice, MaxGasPrice, Rate, RateUsd};
use kyber_core::DataKind;

use crate::error::{PersistError, Result};
use crate::ram::RamPersister;

/// Storage collaborator shared by every job and by readers.
///
/// Implementations are internally synchronized; callers never lock.
pub trait Persister: Send + Sync {
    fn save_gas_price(&self, price: GasPrice);

    fn save_max_gas_price(&self, price: MaxGasPrice);

    fn save_kyber_enabled(&self, enabled: bool);

    fn save_rate_usd(&self, body: RateUsd) -> Result<()>;

    /// Store the latest block number. The implementation decides whether the
    /// block is new and records that in the latest-block freshness flag.
    fn save_latest_block(&self, block: u64) -> Result<()>;

    fn save_rates(&self, rates: Vec<Rate>);

    /// Replace the stored event list.
    fn save_events(&self, events: Vec<EventLog>);

    /// Last stored block number, `0` before the first save.
    fn latest_block(&self) -> u64;

    fn set_fresh(&self, kind: DataKind, fresh: bool);

    fn is_fresh(&self, kind: DataKind) -> bool;

    /// Freshness flags for every kind, in [`DataKind::ALL`] order.
    fn freshness_snapshot(&self) -> Vec<(DataKind, bool)>;

    // --- read side ---------------------------------------------------------

    fn gas_price(&self) -> Option<GasPrice>;

    fn max_gas_price(&self) -> Option<MaxGasPrice>;

    fn kyber_enabled(&self) -> Option<bool>;

    fn rate_usd(&self) -> Option<RateUsd>;

    fn rates(&self) -> Vec<Rate>;

    fn events(&self) -> Vec<EventLog>;
}

/// Build a persister by backend name (`persister.backend` in config).
pub fn new_persister(backend: &str) -> Result<Arc<dyn Persister>> {
    match backend {
        "ram" => Ok(Arc::new(RamPersister::new())),
        other => Err(PersistError::UnknownBackend(other.to_string())),
    }
}
