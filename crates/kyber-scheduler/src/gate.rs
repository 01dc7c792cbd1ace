//! Event fetching, gated on a fresh latest block.
//!
//! The event job and the latest-block job tick independently. Instead of the
//! block job calling into the event job, the event job reads what the block
//! job last committed to the persister: the block number and its freshness
//! flag. Any number of block-job runs (including zero) may happen between two
//! event-job runs; only the state at the moment the event job runs matters.

use std::sync::Arc;

use async_trait::async_trait;
use kyber_core::DataKind;
use kyber_fetcher::Fetcher;
use kyber_persister::Persister;
use tracing::{debug, error};

use crate::types::Action;
use crate::FETCH_LOG_TARGET;

/// What one run of the event job did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateOutcome {
    /// The latest block was not fresh; nothing was fetched.
    Gated,
    /// Events for `block` were fetched and stored.
    Fetched { block: u64, count: usize },
    /// The event fetch for `block` failed.
    Failed { block: u64 },
}

pub struct EventGateAction {
    fetcher: Arc<dyn Fetcher>,
    persister: Arc<dyn Persister>,
}

impl EventGateAction {
    pub fn new(fetcher: Arc<dyn Fetcher>, persister: Arc<dyn Persister>) -> Self {
        Self { fetcher, persister }
    }

    /// Run the gate once and report which branch was taken.
    pub async fn evaluate(&self) -> GateOutcome {
        if !self.persister.is_fresh(DataKind::LatestBlock) {
            self.persister.set_fresh(DataKind::Events, false);
            return GateOutcome::Gated;
        }

        let block = self.persister.latest_block();
        match self.fetcher.events(block).await {
            Ok(events) => {
                let count = events.len();
                self.persister.save_events(events);
                self.persister.set_fresh(DataKind::Events, true);
                GateOutcome::Fetched { block, count }
            }
            Err(e) => {
                error!(target: FETCH_LOG_TARGET, job = %DataKind::Events, block, error = %e,
                    "fetch failed");
                self.persister.set_fresh(DataKind::Events, false);
                GateOutcome::Failed { block }
            }
        }
    }
}

#[async_trait]
impl Action for EventGateAction {
    async fn run(&self) {
        let outcome = self.evaluate().await;
        debug!(job = %DataKind::Events, ?outcome, "event gate evaluated");
    }
}

#[cfg(test)]
mod tests {
    use kyber_persister::RamPersister;

    use super::*;
    use crate::actions::{FetchAction, PlainKind};
    use crate::testing::{event, Script, ScriptedFetcher};

    fn setup(script: Script) -> (Arc<ScriptedFetcher>, Arc<RamPersister>, EventGateAction) {
        let f = Arc::new(ScriptedFetcher::new(script));
        let p = Arc::new(RamPersister::new());
        let gate = EventGateAction::new(f.clone(), p.clone());
        (f, p, gate)
    }

    #[tokio::test]
    async fn never_fetched_block_gates() {
        let (f, p, gate) = setup(Script {
            events: Some(vec![event(1, 0)]),
            ..Script::default()
        });
        p.set_fresh(DataKind::Events, true);

        assert_eq!(gate.evaluate().await, GateOutcome::Gated);
        assert!(f.event_calls().is_empty());
        assert!(!p.is_fresh(DataKind::Events));
    }

    #[tokio::test]
    async fn fresh_block_fetches_exactly_that_block() {
        let events = vec![event(1000, 0), event(1000, 1), event(1000, 2)];
        let (f, p, gate) = setup(Script {
            latest_block: Some(1000),
            events: Some(events.clone()),
            ..Script::default()
        });
        FetchAction::new(PlainKind::LatestBlock, f.clone(), p.clone())
            .run()
            .await;

        assert_eq!(
            gate.evaluate().await,
            GateOutcome::Fetched {
                block: 1000,
                count: 3
            }
        );
        assert_eq!(f.event_calls(), vec![1000]);
        assert_eq!(p.events(), events);
        assert!(p.is_fresh(DataKind::Events));
    }

    #[tokio::test]
    async fn failed_block_fetch_gates_next_event_run() {
        let (f, p, gate) = setup(Script {
            latest_block: Some(1000),
            events: Some(vec![event(1000, 0)]),
            ..Script::default()
        });
        let block_job = FetchAction::new(PlainKind::LatestBlock, f.clone(), p.clone());
        block_job.run().await;
        gate.run().await;
        assert!(p.is_fresh(DataKind::Events));

        f.edit(|s| s.latest_block = None);
        block_job.run().await;
        assert!(!p.is_fresh(DataKind::LatestBlock));

        assert_eq!(gate.evaluate().await, GateOutcome::Gated);
        assert_eq!(f.event_calls(), vec![1000]);
        assert!(!p.is_fresh(DataKind::Events));
        // previously stored events stay readable
        assert_eq!(p.events(), vec![event(1000, 0)]);
    }

    #[tokio::test]
    async fn event_fetch_failure_clears_flag_and_keeps_events() {
        let (f, p, gate) = setup(Script {
            latest_block: Some(1000),
            events: Some(vec![event(1000, 0)]),
            ..Script::default()
        });
        let block_job = FetchAction::new(PlainKind::LatestBlock, f.clone(), p.clone());
        block_job.run().await;
        gate.run().await;

        f.edit(|s| {
            s.latest_block = Some(1001);
            s.events = None;
        });
        block_job.run().await;
        assert_eq!(gate.evaluate().await, GateOutcome::Failed { block: 1001 });
        assert!(!p.is_fresh(DataKind::Events));
        assert_eq!(p.events(), vec![event(1000, 0)]);
    }

    #[tokio::test]
    async fn many_block_runs_between_event_runs_use_the_last_block() {
        let (f, p, gate) = setup(Script {
            events: Some(Vec::new()),
            ..Script::default()
        });
        let block_job = FetchAction::new(PlainKind::LatestBlock, f.clone(), p.clone());
        for b in [1000, 1001, 1002] {
            f.edit(|s| s.latest_block = Some(b));
            block_job.run().await;
        }

        assert_eq!(
            gate.evaluate().await,
            GateOutcome::Fetched {
                block: 1002,
                count: 0
            }
        );
        assert_eq!(f.event_calls(), vec![1002]);
    }

    #[tokio::test]
    async fn unchanged_block_gates() {
        let (f, p, gate) = setup(Script {
            latest_block: Some(1000),
            events: Some(vec![event(1000, 0)]),
            ..Script::default()
        });
        let block_job = FetchAction::new(PlainKind::LatestBlock, f.clone(), p.clone());
        block_job.run().await;
        gate.run().await;

        // node still reports 1000: nothing new, so no second event fetch
        block_job.run().await;
        assert_eq!(gate.evaluate().await, GateOutcome::Gated);
        assert_eq!(f.event_calls(), vec![1000]);
        assert!(!p.is_fresh(DataKind::Events));
    }
}
