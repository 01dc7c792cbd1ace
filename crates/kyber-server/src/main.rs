use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use kyber_core::config::KyberConfig;
use kyber_fetcher::HttpFetcher;
use kyber_persister::Persister;
use kyber_scheduler::{standard_jobs, Scheduler, SchedulerOptions};
use tracing::info;

mod logging;

/// Polls gas price, rates, blocks and events and keeps the freshest values.
#[derive(Debug, Parser)]
#[command(name = "kyber-server", version)]
struct Args {
    /// Config file. Falls back to $KYBER_CONFIG, then ./kyber.toml.
    #[arg(long, short)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // load config: --config > KYBER_CONFIG env > ./kyber.toml
    let config_path = args.config.or_else(|| std::env::var("KYBER_CONFIG").ok());
    let config = KyberConfig::load(config_path.as_deref())
        .map_err(|e| anyhow::anyhow!("loading config [{}]: {e}", e.code()))?;

    logging::init(&config.log)?;
    info!(error_log = %config.log.error_log_path, "logging initialised");

    // collaborators: failure here is fatal, nothing has been scheduled yet
    let persister = kyber_persister::new_persister(&config.persister.backend)
        .context("building persister")?;
    let fetcher = Arc::new(
        HttpFetcher::new(&config.node, &config.endpoints).context("building fetcher")?,
    );
    info!(backend = %config.persister.backend, rpc = %config.node.rpc_url, "collaborators ready");

    let mut scheduler = Scheduler::new(SchedulerOptions {
        fixed_tick: config.scheduler.fixed_tick(),
        stop_grace: config.scheduler.stop_grace(),
    });
    scheduler.register_all(standard_jobs(fetcher, persister.clone(), &config.jobs))?;

    // returns once every job has completed its first run
    let handle = scheduler.start().await;
    for status in handle.statuses() {
        info!(job = %status.name, cadence = ?status.cadence, "job scheduled");
    }
    info!(
        latest_block = persister.latest_block(),
        fresh = %freshness_line(persister.as_ref()),
        "kyber-server ready, press Ctrl-C to stop"
    );

    tokio::signal::ctrl_c()
        .await
        .context("waiting for shutdown signal")?;
    info!("shutdown signal received");

    handle.stop().await;
    info!(fresh = %freshness_line(persister.as_ref()), "kyber-server stopped");
    Ok(())
}

/// `kind=flag` pairs for every data kind, space separated.
fn freshness_line(persister: &dyn Persister) -> String {
    persister
        .freshness_snapshot()
        .into_iter()
        .map(|(kind, fresh)| format!("{kind}={fresh}"))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use kyber_core::DataKind;
    use kyber_persister::RamPersister;

    use super::*;

    #[test]
    fn freshness_line_lists_every_kind() {
        let p = RamPersister::new();
        p.set_fresh(DataKind::Rates, true);
        assert_eq!(
            freshness_line(&p),
            "kyber-enabled=false max-gas-price=false gas-price=false rate-usd=false \
             latest-block=false rates=true events=false"
        );
    }
}
