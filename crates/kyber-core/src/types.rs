use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Every independently polled piece of market / chain data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DataKind {
    GasPrice,
    MaxGasPrice,
    KyberEnabled,
    RateUsd,
    LatestBlock,
    Rates,
    Events,
}

impl DataKind {
    /// All kinds, in the order their jobs are registered at startup.
    pub const ALL: [DataKind; 7] = [
        DataKind::KyberEnabled,
        DataKind::MaxGasPrice,
        DataKind::GasPrice,
        DataKind::RateUsd,
        DataKind::LatestBlock,
        DataKind::Rates,
        DataKind::Events,
    ];

    /// Stable identifier, also used as the job name.
    pub fn as_str(&self) -> &'static str {
        match self {
            DataKind::GasPrice => "gas-price",
            DataKind::MaxGasPrice => "max-gas-price",
            DataKind::KyberEnabled => "kyber-enabled",
            DataKind::RateUsd => "rate-usd",
            DataKind::LatestBlock => "latest-block",
            DataKind::Rates => "rates",
            DataKind::Events => "events",
        }
    }

    /// Polling cadence used when the config does not override it.
    pub fn default_cadence(&self) -> Duration {
        let secs = match self {
            DataKind::KyberEnabled => 10,
            DataKind::MaxGasPrice => 60,
            DataKind::GasPrice => 30,
            DataKind::RateUsd => 60,
            DataKind::LatestBlock => 10,
            DataKind::Rates => 10,
            DataKind::Events => 30,
        };
        Duration::from_secs(secs)
    }
}

impl fmt::Display for DataKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DataKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        DataKind::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| format!("unknown data kind: {s}"))
    }
}

/// Current network gas price.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GasPrice {
    pub wei: u128,
}

/// Upper bound on gas price enforced by the network contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaxGasPrice {
    pub wei: u128,
}

/// Raw body of the USD exchange-rate endpoint, stored as received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RateUsd(pub serde_json::Value);

/// One row of the token rate table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rate {
    pub source: String,
    pub dest: String,
    /// Expected rate, as a decimal wei string.
    pub rate: String,
    /// Slippage-adjusted minimum rate, as a decimal wei string.
    pub minimum: String,
}

/// A single log emitted by the network contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventLog {
    pub block_number: u64,
    pub tx_hash: String,
    pub topics: Vec<String>,
    /// Hex-encoded, `0x` prefixed.
    pub data: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_and_from_str_agree() {
        for kind in DataKind::ALL {
            let parsed: DataKind = kind.to_string().parse().unwrap();
            assert_eq!(parsed, kind);
        }
    }

    #[test]
    fn unknown_kind_is_rejected() {
        let err = "block".parse::<DataKind>().unwrap_err();
        assert!(err.contains("block"));
    }

    #[test]
    fn serde_uses_job_names() {
        let json = serde_json::to_string(&DataKind::MaxGasPrice).unwrap();
        assert_eq!(json, "\"max-gas-price\"");
    }

    #[test]
    fn default_cadences_match_registration_table() {
        assert_eq!(DataKind::LatestBlock.default_cadence(), Duration::from_secs(10));
        assert_eq!(DataKind::Events.default_cadence(), Duration::from_secs(30));
        assert_eq!(DataKind::RateUsd.default_cadence(), Duration::from_secs(60));
    }
}
