use std::sync::{PoisonError, RwLock};

use kyber_core::types::{EventLog, GasPrice, MaxGasPrice, Rate, RateUsd};
use kyber_core::{DataKind, FreshnessStore};
use tracing::debug;

use crate::error::{PersistError, Result};
use crate::persister::Persister;

#[derive(Debug, Default)]
struct Snapshot {
    gas_price: Option<GasPrice>,
    max_gas_price: Option<MaxGasPrice>,
    kyber_enabled: Option<bool>,
    rate_usd: Option<RateUsd>,
    latest_block: u64,
    rates: Vec<Rate>,
    events: Vec<EventLog>,
}

/// In-process store. Values are lost on restart and refilled by the first
/// scheduler run.
#[derive(Debug, Default)]
pub struct RamPersister {
    values: RwLock<Snapshot>,
    freshness: FreshnessStore,
}

impl RamPersister {
    pub fn new() -> Self {
        Self::default()
    }

    fn write(&self, f: impl FnOnce(&mut Snapshot)) {
        let mut guard = self.values.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard);
    }

    fn read<T>(&self, f: impl FnOnce(&Snapshot) -> T) -> T {
        let guard = self.values.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }
}

impl Persister for RamPersister {
    fn save_gas_price(&self, price: GasPrice) {
        self.write(|s| s.gas_price = Some(price));
    }

    fn save_max_gas_price(&self, price: MaxGasPrice) {
        self.write(|s| s.max_gas_price = Some(price));
    }

    fn save_kyber_enabled(&self, enabled: bool) {
        self.write(|s| s.kyber_enabled = Some(enabled));
    }

    fn save_rate_usd(&self, body: RateUsd) -> Result<()> {
        if body.0.is_null() {
            return Err(PersistError::Rejected {
                kind: DataKind::RateUsd,
                reason: "empty body".to_string(),
            });
        }
        self.write(|s| s.rate_usd = Some(body));
        Ok(())
    }

    fn save_latest_block(&self, block: u64) -> Result<()> {
        let mut guard = self.values.write().unwrap_or_else(PoisonError::into_inner);
        let stored = guard.latest_block;
        if block < stored {
            return Err(PersistError::Stale {
                kind: DataKind::LatestBlock,
                stored,
                got: block,
            });
        }
        let is_new = block > stored;
        guard.latest_block = block;
        // flag is set under the write lock so readers never see a new block
        // paired with the previous block's flag
        self.freshness.set_fresh(DataKind::LatestBlock, is_new);
        debug!(block, is_new, "latest block saved");
        Ok(())
    }

    fn save_rates(&self, rates: Vec<Rate>) {
        self.write(|s| s.rates = rates);
    }

    fn save_events(&self, events: Vec<EventLog>) {
        self.write(|s| s.events = events);
    }

    fn latest_block(&self) -> u64 {
        self.read(|s| s.latest_block)
    }

    fn set_fresh(&self, kind: DataKind, fresh: bool) {
        self.freshness.set_fresh(kind, fresh);
    }

    fn is_fresh(&self, kind: DataKind) -> bool {
        self.freshness.is_fresh(kind)
    }

    fn freshness_snapshot(&self) -> Vec<(DataKind, bool)> {
        self.freshness.snapshot()
    }

    fn gas_price(&self) -> Option<GasPrice> {
        self.read(|s| s.gas_price)
    }

    fn max_gas_price(&self) -> Option<MaxGasPrice> {
        self.read(|s| s.max_gas_price)
    }

    fn kyber_enabled(&self) -> Option<bool> {
        self.read(|s| s.kyber_enabled)
    }

    fn rate_usd(&self) -> Option<RateUsd> {
        self.read(|s| s.rate_usd.clone())
    }

    fn rates(&self) -> Vec<Rate> {
        self.read(|s| s.rates.clone())
    }

    fn events(&self) -> Vec<EventLog> {
        self.read(|s| s.events.clone())
    }
}
