//! Ethereum JSON-RPC envelope and hex decoding helpers.

use kyber_core::types::EventLog;
use serde::{Deserialize, Serialize};

use crate::fetcher::FetchError;

/// `maxGasPrice()` selector on the network contract.
pub const MAX_GAS_PRICE_SELECTOR: &str = "0x3de39c11";
/// `enabled()` selector on the network contract.
pub const ENABLED_SELECTOR: &str = "0x238dafe0";

#[derive(Debug, Serialize)]
pub struct RpcRequest<'a> {
    pub jsonrpc: &'static str,
    pub id: u64,
    pub method: &'a str,
    pub params: serde_json::Value,
}

impl<'a> RpcRequest<'a> {
    pub fn new(id: u64, method: &'a str, params: serde_json::Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            method,
            params,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RpcResponse {
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
pub struct RpcErrorObject {
    pub code: i64,
    pub message: String,
}

impl RpcResponse {
    /// Unwrap the `result` member, turning an `error` member (or a missing
    /// result) into a [`FetchError`].
    pub fn into_result(self) -> Result<serde_json::Value, FetchError> {
        if let Some(err) = self.error {
            return Err(FetchError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        match self.result {
            Some(serde_json::Value::Null) | None => {
                Err(FetchError::Parse("JSON-RPC response has no result".into()))
            }
            Some(v) => Ok(v),
        }
    }
}

fn strip_hex(s: &str) -> Result<&str, FetchError> {
    s.strip_prefix("0x")
        .ok_or_else(|| FetchError::Parse(format!("missing 0x prefix: {s}")))
}

/// Parse a JSON-RPC quantity (`"0x1b4"`).
pub fn parse_quantity(s: &str) -> Result<u128, FetchError> {
    let digits = strip_hex(s)?;
    if digits.is_empty() {
        return Err(FetchError::Parse("empty hex quantity".into()));
    }
    u128::from_str_radix(digits, 16).map_err(|e| FetchError::Parse(format!("{s}: {e}")))
}

pub fn parse_quantity_u64(s: &str) -> Result<u64, FetchError> {
    let v = parse_quantity(s)?;
    u64::try_from(v).map_err(|_| FetchError::Parse(format!("{s} does not fit in u64")))
}

/// Decode a single ABI-encoded 32-byte word as `u128`.
pub fn parse_word_u128(s: &str) -> Result<u128, FetchError> {
    let bytes = hex::decode(strip_hex(s)?).map_err(|e| FetchError::Parse(format!("{s}: {e}")))?;
    let word: [u8; 32] = bytes.try_into().map_err(|b: Vec<u8>| {
        FetchError::Parse(format!("expected a 32-byte word, got {} bytes", b.len()))
    })?;
    let (high, low) = word.split_at(16);
    if high.iter().any(|b| *b != 0) {
        return Err(FetchError::Parse(format!("{s} overflows u128")));
    }
    let mut low_bytes = [0u8; 16];
    low_bytes.copy_from_slice(low);
    Ok(u128::from_be_bytes(low_bytes))
}

/// Decode a single ABI-encoded 32-byte word as `bool`.
pub fn parse_word_bool(s: &str) -> Result<bool, FetchError> {
    match parse_word_u128(s)? {
        0 => Ok(false),
        1 => Ok(true),
        other => Err(FetchError::Parse(format!("{other} is not a bool word"))),
    }
}

pub fn encode_quantity(v: u64) -> String {
    format!("{v:#x}")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLog {
    block_number: String,
    transaction_hash: String,
    #[serde(default)]
    topics: Vec<String>,
    #[serde(default)]
    data: String,
}

/// Decode the `result` of `eth_getLogs`.
pub fn decode_logs(result: serde_json::Value) -> Result<Vec<EventLog>, FetchError> {
    let raw: Vec<RawLog> =
        serde_json::from_value(result).map_err(|e| FetchError::Parse(e.to_string()))?;
    raw.into_iter()
        .map(|log| {
            Ok(EventLog {
                block_number: parse_quantity_u64(&log.block_number)?,
                tx_hash: log.transaction_hash,
                topics: log.topics,
                data: log.data,
            })
        })
        .collect()
}
