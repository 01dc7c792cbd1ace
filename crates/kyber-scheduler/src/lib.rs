//! `kyber-scheduler`: runs the polling jobs that keep the persister fresh.
//!
//! # Overview
//!
//! Each [`Job`] pairs a name and a cadence with an [`Action`]. The
//! [`engine::Scheduler`] runs every action once before reporting ready, then
//! gives each job its own Tokio task and timer. Jobs never share a task, so a
//! slow fetch in one job cannot hold back another job's tick.
//!
//! # Jobs
//!
//! | Job             | Action                      | Sets fresh `true`     |
//! |-----------------|-----------------------------|-----------------------|
//! | `kyber-enabled` | [`actions::FetchAction`]    | never                 |
//! | `max-gas-price` | [`actions::FetchAction`]    | never                 |
//! | `gas-price`     | [`actions::FetchAction`]    | never                 |
//! | `rate-usd`      | [`actions::FetchAction`]    | never                 |
//! | `latest-block`  | [`actions::FetchAction`]    | via the persister     |
//! | `rates`         | [`actions::FetchAction`]    | on every success      |
//! | `events`        | [`gate::EventGateAction`]   | when a new block was fetched |
//!
//! Every failure sets the job's flag `false`. The `events` job's first run
//! waits for the `latest-block` job's first run (see [`Job::after`]), so the
//! gate sees the startup block.

pub mod actions;
pub mod engine;
pub mod error;
pub mod gate;
pub mod schedule;
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use actions::{standard_jobs, FetchAction, PlainKind};
pub use engine::{Scheduler, SchedulerHandle, SchedulerOptions};
pub use error::{Result, SchedulerError};
pub use gate::{EventGateAction, GateOutcome};
pub use types::{Action, Job, JobStatus};

/// Log target every fetch and persist failure is recorded under.
pub const FETCH_LOG_TARGET: &str = "kyber::fetch";
