use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// The unit of recurring work: takes nothing, returns nothing.
///
/// Actions handle and log their own failures. The scheduler only decides
/// *when* an action runs, never what happens when it goes wrong.
#[async_trait]
pub trait Action: Send + Sync {
    async fn run(&self);
}

/// A named action and the period it repeats at.
#[derive(Clone)]
pub struct Job {
    /// Stable identifier, e.g. `"gas-price"`.
    pub name: String,
    pub cadence: Duration,
    pub action: Arc<dyn Action>,
    /// Job whose first run must complete before this job's first run starts.
    pub after: Option<String>,
}

impl Job {
    pub fn new(name: impl Into<String>, cadence: Duration, action: Arc<dyn Action>) -> Self {
        Self {
            name: name.into(),
            cadence,
            action,
            after: None,
        }
    }

    /// Hold this job's first run until `prerequisite` finished its own.
    /// Later runs are not ordered.
    pub fn after(mut self, prerequisite: impl Into<String>) -> Self {
        self.after = Some(prerequisite.into());
        self
    }
}

impl std::fmt::Debug for Job {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Job")
            .field("name", &self.name)
            .field("cadence", &self.cadence)
            .field("after", &self.after)
            .finish_non_exhaustive()
    }
}

/// Point-in-time view of a running job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobStatus {
    pub name: String,
    /// Period the job's timer actually ticks at.
    pub cadence: Duration,
    /// Completed runs, including the initial one.
    pub run_count: u64,
    /// Start time of the most recent run.
    pub last_run_at: Option<DateTime<Utc>>,
}
