use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use kyber_core::config::{EndpointsConfig, NodeConfig};
use kyber_core::types::{EventLog, GasPrice, MaxGasPrice, Rate, RateUsd};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::fetcher::{FetchError, Fetcher};
use crate::rpc::{self, RpcRequest, RpcResponse};

/// [`Fetcher`] backed by an Ethereum JSON-RPC node and two HTTP endpoints.
pub struct HttpFetcher {
    client: reqwest::Client,
    rpc_url: String,
    network_contract: String,
    rate_usd_url: String,
    rates_url: String,
    event_lookback_blocks: u64,
    next_id: AtomicU64,
}

impl HttpFetcher {
    pub fn new(node: &NodeConfig, endpoints: &EndpointsConfig) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(node.request_timeout_ms))
            .build()?;
        if node.network_contract.is_empty() {
            warn!("node.network_contract is not set; contract calls and event queries will fail");
        }
        Ok(Self {
            client,
            rpc_url: node.rpc_url.clone(),
            network_contract: node.network_contract.clone(),
            rate_usd_url: endpoints.rate_usd_url.clone(),
            rates_url: endpoints.rates_url.clone(),
            event_lookback_blocks: node.event_lookback_blocks,
            next_id: AtomicU64::new(1),
        })
    }

    async fn rpc_call(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value, FetchError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        debug!(%method, id, "sending JSON-RPC request");

        let resp = self
            .client
            .post(&self.rpc_url)
            .json(&RpcRequest::new(id, method, params))
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        let resp = check_status(resp).await?;
        let body: RpcResponse = resp
            .json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))?;
        body.into_result()
    }

    async fn rpc_string(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<String, FetchError> {
        match self.rpc_call(method, params).await? {
            serde_json::Value::String(s) => Ok(s),
            other => Err(FetchError::Parse(format!(
                "{method}: expected a hex string, got {other}"
            ))),
        }
    }

    /// `eth_call` against the network contract at the latest block.
    async fn contract_call(&self, selector: &str) -> Result<String, FetchError> {
        let params = serde_json::json!([
            { "to": self.network_contract, "data": selector },
            "latest",
        ]);
        self.rpc_string("eth_call", params).await
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, FetchError> {
        debug!(%url, "GET");
        let resp = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_transport)?;
        let resp = check_status(resp).await?;
        resp.json()
            .await
            .map_err(|e| FetchError::Parse(e.to_string()))
    }
}

async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, FetchError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let message = resp.text().await.unwrap_or_default();
    Err(FetchError::Api {
        status: status.as_u16(),
        message,
    })
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn gas_price(&self) -> Result<GasPrice, FetchError> {
        let hex = self.rpc_string("eth_gasPrice", serde_json::json!([])).await?;
        Ok(GasPrice {
            wei: rpc::parse_quantity(&hex)?,
        })
    }

    async fn max_gas_price(&self) -> Result<MaxGasPrice, FetchError> {
        let word = self.contract_call(rpc::MAX_GAS_PRICE_SELECTOR).await?;
        Ok(MaxGasPrice {
            wei: rpc::parse_word_u128(&word)?,
        })
    }

    async fn kyber_enabled(&self) -> Result<bool, FetchError> {
        let word = self.contract_call(rpc::ENABLED_SELECTOR).await?;
        rpc::parse_word_bool(&word)
    }

    async fn rate_usd(&self) -> Result<RateUsd, FetchError> {
        self.get_json(&self.rate_usd_url).await.map(RateUsd)
    }

    async fn latest_block(&self) -> Result<u64, FetchError> {
        let hex = self
            .rpc_string("eth_blockNumber", serde_json::json!([]))
            .await?;
        rpc::parse_quantity_u64(&hex)
    }

    async fn rates(&self) -> Result<Vec<Rate>, FetchError> {
        self.get_json(&self.rates_url).await
    }

    async fn events(&self, block: u64) -> Result<Vec<EventLog>, FetchError> {
        let from = block.saturating_sub(self.event_lookback_blocks);
        let params = serde_json::json!([{
            "address": self.network_contract,
            "fromBlock": rpc::encode_quantity(from),
            "toBlock": rpc::encode_quantity(block),
        }]);
        let result = self.rpc_call("eth_getLogs", params).await?;
        rpc::decode_logs(result)
    }
}
