use std::sync::Arc;

use async_trait::async_trait;
use kyber_core::config::JobsConfig;
use kyber_core::DataKind;
use kyber_fetcher::Fetcher;
use kyber_persister::Persister;
use tracing::{debug, error};

use crate::error::RunError;
use crate::gate::EventGateAction;
use crate::types::{Action, Job};
use crate::FETCH_LOG_TARGET;

/// A data kind fetched with a single call and no gate: every kind except
/// [`DataKind::Events`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PlainKind {
    GasPrice,
    MaxGasPrice,
    KyberEnabled,
    RateUsd,
    LatestBlock,
    Rates,
}

impl PlainKind {
    pub const ALL: [PlainKind; 6] = [
        PlainKind::GasPrice,
        PlainKind::MaxGasPrice,
        PlainKind::KyberEnabled,
        PlainKind::RateUsd,
        PlainKind::LatestBlock,
        PlainKind::Rates,
    ];
}

impl From<PlainKind> for DataKind {
    fn from(kind: PlainKind) -> Self {
        match kind {
            PlainKind::GasPrice => DataKind::GasPrice,
            PlainKind::MaxGasPrice => DataKind::MaxGasPrice,
            PlainKind::KyberEnabled => DataKind::KyberEnabled,
            PlainKind::RateUsd => DataKind::RateUsd,
            PlainKind::LatestBlock => DataKind::LatestBlock,
            PlainKind::Rates => DataKind::Rates,
        }
    }
}

/// Fails with the kind itself for [`DataKind::Events`].
impl TryFrom<DataKind> for PlainKind {
    type Error = DataKind;

    fn try_from(kind: DataKind) -> std::result::Result<Self, DataKind> {
        match kind {
            DataKind::GasPrice => Ok(PlainKind::GasPrice),
            DataKind::MaxGasPrice => Ok(PlainKind::MaxGasPrice),
            DataKind::KyberEnabled => Ok(PlainKind::KyberEnabled),
            DataKind::RateUsd => Ok(PlainKind::RateUsd),
            DataKind::LatestBlock => Ok(PlainKind::LatestBlock),
            DataKind::Rates => Ok(PlainKind::Rates),
            DataKind::Events => Err(kind),
        }
    }
}

/// Fetch one data kind and hand it to the persister.
///
/// On any failure the kind's freshness flag is cleared and the stored value
/// is left as it was. Only the rate table asserts freshness on success; the
/// latest-block flag is decided by the persister when it judges the block.
pub struct FetchAction {
    kind: PlainKind,
    fetcher: Arc<dyn Fetcher>,
    persister: Arc<dyn Persister>,
}

impl FetchAction {
    /// Events go through [`EventGateAction`] instead.
    pub fn new(kind: PlainKind, fetcher: Arc<dyn Fetcher>, persister: Arc<dyn Persister>) -> Self {
        Self {
            kind,
            fetcher,
            persister,
        }
    }

    fn data_kind(&self) -> DataKind {
        self.kind.into()
    }

    fn fail(&self, e: RunError) {
        let kind = self.data_kind();
        error!(target: FETCH_LOG_TARGET, job = %kind, error = %e, "fetch failed");
        self.persister.set_fresh(kind, false);
    }

    async fn fetch_and_store(&self) -> std::result::Result<(), RunError> {
        let (f, p) = (&self.fetcher, &self.persister);
        match self.kind {
            PlainKind::GasPrice => p.save_gas_price(f.gas_price().await?),
            PlainKind::MaxGasPrice => p.save_max_gas_price(f.max_gas_price().await?),
            PlainKind::KyberEnabled => p.save_kyber_enabled(f.kyber_enabled().await?),
            PlainKind::RateUsd => p.save_rate_usd(f.rate_usd().await?)?,
            PlainKind::LatestBlock => p.save_latest_block(f.latest_block().await?)?,
            PlainKind::Rates => {
                p.save_rates(f.rates().await?);
                p.set_fresh(DataKind::Rates, true);
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Action for FetchAction {
    async fn run(&self) {
        match self.fetch_and_store().await {
            Ok(()) => debug!(job = %self.data_kind(), "fetch stored"),
            Err(e) => self.fail(e),
        }
    }
}

/// The seven polling jobs, in startup registration order.
///
/// The event job's first run waits for the latest-block job's first run, so
/// events are already filled in when the scheduler reports ready.
pub fn standard_jobs(
    fetcher: Arc<dyn Fetcher>,
    persister: Arc<dyn Persister>,
    config: &JobsConfig,
) -> Vec<Job> {
    DataKind::ALL
        .into_iter()
        .map(|kind| match PlainKind::try_from(kind) {
            Ok(plain) => Job::new(
                kind.as_str(),
                config.cadence(kind),
                Arc::new(FetchAction::new(
                    plain,
                    Arc::clone(&fetcher),
                    Arc::clone(&persister),
                )),
            ),
            Err(_) => Job::new(
                kind.as_str(),
                config.cadence(kind),
                Arc::new(EventGateAction::new(
                    Arc::clone(&fetcher),
                    Arc::clone(&persister),
                )),
            )
            .after(DataKind::LatestBlock.as_str()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use kyber_core::types::{GasPrice, Rate, RateUsd};
    use kyber_persister::RamPersister;

    use super::*;
    use crate::testing::{Script, ScriptedFetcher};

    fn setup(script: Script) -> (Arc<ScriptedFetcher>, Arc<RamPersister>) {
        (
            Arc::new(ScriptedFetcher::new(script)),
            Arc::new(RamPersister::new()),
        )
    }

    fn action(kind: PlainKind, f: &Arc<ScriptedFetcher>, p: &Arc<RamPersister>) -> FetchAction {
        FetchAction::new(kind, f.clone(), p.clone())
    }

    #[tokio::test]
    async fn gas_price_is_persisted_without_asserting_fresh() {
        let (f, p) = setup(Script {
            gas_price: Some(42),
            ..Script::default()
        });
        action(PlainKind::GasPrice, &f, &p).run().await;
        assert_eq!(p.gas_price(), Some(GasPrice { wei: 42 }));
        assert!(!p.is_fresh(DataKind::GasPrice));
    }

    #[tokio::test]
    async fn failure_clears_flag_and_keeps_previous_value() {
        let (f, p) = setup(Script {
            gas_price: Some(42),
            ..Script::default()
        });
        let gas = action(PlainKind::GasPrice, &f, &p);
        gas.run().await;
        p.set_fresh(DataKind::GasPrice, true);

        f.edit(|s| s.gas_price = None);
        gas.run().await;
        assert!(!p.is_fresh(DataKind::GasPrice));
        assert_eq!(p.gas_price(), Some(GasPrice { wei: 42 }));
    }

    #[tokio::test]
    async fn every_plain_kind_clears_flag_on_failure() {
        let (f, p) = setup(Script::default());
        for plain in PlainKind::ALL {
            let kind = DataKind::from(plain);
            p.set_fresh(kind, true);
            action(plain, &f, &p).run().await;
            assert!(!p.is_fresh(kind), "{kind} still fresh after failure");
        }
    }

    #[tokio::test]
    async fn rates_success_asserts_fresh() {
        let rate = Rate {
            source: "ETH".into(),
            dest: "KNC".into(),
            rate: "100".into(),
            minimum: "97".into(),
        };
        let (f, p) = setup(Script {
            rates: Some(vec![rate.clone()]),
            ..Script::default()
        });
        action(PlainKind::Rates, &f, &p).run().await;
        assert_eq!(p.rates(), vec![rate]);
        assert!(p.is_fresh(DataKind::Rates));
    }

    #[tokio::test]
    async fn rejected_usd_body_clears_flag() {
        let (f, p) = setup(Script {
            rate_usd: Some(serde_json::json!([{"price_usd": "300"}])),
            ..Script::default()
        });
        let usd = action(PlainKind::RateUsd, &f, &p);
        usd.run().await;
        p.set_fresh(DataKind::RateUsd, true);

        f.edit(|s| s.rate_usd = Some(serde_json::Value::Null));
        usd.run().await;
        assert!(!p.is_fresh(DataKind::RateUsd));
        assert_eq!(
            p.rate_usd(),
            Some(RateUsd(serde_json::json!([{"price_usd": "300"}])))
        );
    }

    #[tokio::test]
    async fn latest_block_freshness_follows_the_persister() {
        let (f, p) = setup(Script {
            latest_block: Some(1000),
            ..Script::default()
        });
        let block = action(PlainKind::LatestBlock, &f, &p);
        block.run().await;
        assert!(p.is_fresh(DataKind::LatestBlock));

        // same block again: accepted, but nothing new
        block.run().await;
        assert!(!p.is_fresh(DataKind::LatestBlock));

        // node lagging behind: rejected as stale
        f.edit(|s| s.latest_block = Some(990));
        p.set_fresh(DataKind::LatestBlock, true);
        block.run().await;
        assert!(!p.is_fresh(DataKind::LatestBlock));
        assert_eq!(p.latest_block(), 1000);
    }

    #[test]
    fn plain_kinds_are_every_kind_but_events() {
        for kind in DataKind::ALL {
            match PlainKind::try_from(kind) {
                Ok(plain) => assert_eq!(DataKind::from(plain), kind),
                Err(rejected) => assert_eq!(rejected, DataKind::Events),
            }
        }
        assert_eq!(PlainKind::ALL.len(), DataKind::ALL.len() - 1);
    }

    #[test]
    fn standard_table_covers_every_kind() {
        let (f, p) = setup(Script::default());
        let config = JobsConfig {
            events_secs: Some(45),
            ..JobsConfig::default()
        };
        let jobs = standard_jobs(f, p, &config);
        let names: Vec<_> = jobs.iter().map(|j| j.name.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "kyber-enabled",
                "max-gas-price",
                "gas-price",
                "rate-usd",
                "latest-block",
                "rates",
                "events"
            ]
        );
        let events = jobs.iter().find(|j| j.name == "events").unwrap();
        assert_eq!(events.cadence, std::time::Duration::from_secs(45));
        assert_eq!(events.after.as_deref(), Some("latest-block"));
        assert!(jobs.iter().filter(|j| j.name != "events").all(|j| j.after.is_none()));
    }
}
