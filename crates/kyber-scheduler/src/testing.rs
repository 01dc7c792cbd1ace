//! Hand-written fetcher fake shared by the action and gate tests.

use std::sync::Mutex;

use async_trait::async_trait;
use kyber_core::types::{EventLog, GasPrice, MaxGasPrice, Rate, RateUsd};
use kyber_fetcher::{FetchError, Fetcher};

/// Canned answers; `None` makes the call fail.
#[derive(Default)]
pub struct Script {
    pub gas_price: Option<u128>,
    pub max_gas_price: Option<u128>,
    pub kyber_enabled: Option<bool>,
    pub rate_usd: Option<serde_json::Value>,
    pub latest_block: Option<u64>,
    pub rates: Option<Vec<Rate>>,
    pub events: Option<Vec<EventLog>>,
}

#[derive(Default)]
pub struct ScriptedFetcher {
    pub script: Mutex<Script>,
    /// Block argument of every `events` call, in order.
    pub event_calls: Mutex<Vec<u64>>,
}

impl ScriptedFetcher {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            event_calls: Mutex::new(Vec::new()),
        }
    }

    pub fn edit(&self, f: impl FnOnce(&mut Script)) {
        f(&mut self.script.lock().unwrap());
    }

    pub fn event_calls(&self) -> Vec<u64> {
        self.event_calls.lock().unwrap().clone()
    }
}

fn answer<T>(v: Option<T>) -> Result<T, FetchError> {
    v.ok_or_else(|| FetchError::Unavailable("scripted failure".into()))
}

pub fn event(block: u64, n: u64) -> EventLog {
    EventLog {
        block_number: block,
        tx_hash: format!("0x{block:x}{n:02x}"),
        topics: Vec::new(),
        data: "0x".to_string(),
    }
}

#[async_trait]
impl Fetcher for ScriptedFetcher {
    async fn gas_price(&self) -> Result<GasPrice, FetchError> {
        answer(self.script.lock().unwrap().gas_price).map(|wei| GasPrice { wei })
    }

    async fn max_gas_price(&self) -> Result<MaxGasPrice, FetchError> {
        answer(self.script.lock().unwrap().max_gas_price).map(|wei| MaxGasPrice { wei })
    }

    async fn kyber_enabled(&self) -> Result<bool, FetchError> {
        answer(self.script.lock().unwrap().kyber_enabled)
    }

    async fn rate_usd(&self) -> Result<RateUsd, FetchError> {
        answer(self.script.lock().unwrap().rate_usd.clone()).map(RateUsd)
    }

    async fn latest_block(&self) -> Result<u64, FetchError> {
        answer(self.script.lock().unwrap().latest_block)
    }

    async fn rates(&self) -> Result<Vec<Rate>, FetchError> {
        answer(self.script.lock().unwrap().rates.clone())
    }

    async fn events(&self, block: u64) -> Result<Vec<EventLog>, FetchError> {
        self.event_calls.lock().unwrap().push(block);
        answer(self.script.lock().unwrap().events.clone())
    }
}
