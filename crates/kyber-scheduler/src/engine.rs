use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use futures_util::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::{
    error::{Result, SchedulerError},
    schedule::{effective_cadence, job_timer},
    types::{Job, JobStatus},
};

/// Default time `stop` waits for in-flight runs.
pub const DEFAULT_STOP_GRACE: Duration = Duration::from_secs(10);

#[derive(Debug, Clone)]
pub struct SchedulerOptions {
    /// Tick every job at this period instead of its own cadence.
    pub fixed_tick: Option<Duration>,
    /// Upper bound on how long [`SchedulerHandle::stop`] waits.
    pub stop_grace: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        Self {
            fixed_tick: None,
            stop_grace: DEFAULT_STOP_GRACE,
        }
    }
}

/// Job table under construction. Consumed by [`Scheduler::start`], so no job
/// can be registered once the timers are running.
pub struct Scheduler {
    jobs: Vec<Job>,
    options: SchedulerOptions,
}

impl Scheduler {
    pub fn new(options: SchedulerOptions) -> Self {
        Self {
            jobs: Vec::new(),
            options,
        }
    }

    /// Add a job. Names must be unique and cadences non-zero. A job's
    /// prerequisite must already be registered.
    pub fn register(&mut self, job: Job) -> Result<()> {
        if self.jobs.iter().any(|j| j.name == job.name) {
            return Err(SchedulerError::DuplicateJob { name: job.name });
        }
        if let Some(prerequisite) = &job.after {
            if !self.jobs.iter().any(|j| &j.name == prerequisite) {
                return Err(SchedulerError::UnknownPrerequisite {
                    prerequisite: prerequisite.clone(),
                    name: job.name,
                });
            }
        }
        if effective_cadence(job.cadence, self.options.fixed_tick).is_zero() {
            return Err(SchedulerError::InvalidCadence {
                name: job.name,
                reason: "cadence must be greater than zero".to_string(),
            });
        }
        debug!(job = %job.name, cadence = ?job.cadence, "job registered");
        self.jobs.push(job);
        Ok(())
    }

    pub fn register_all(&mut self, jobs: impl IntoIterator<Item = Job>) -> Result<()> {
        jobs.into_iter().try_for_each(|job| self.register(job))
    }

    /// Spawn one task per job and wait until every job finished its first run.
    ///
    /// The first runs proceed in parallel, except that a job registered with
    /// [`Job::after`] starts its first run only once its prerequisite's first
    /// run is done. A job enters its timer loop as soon as its own first run
    /// is done, without waiting for the others. When this returns the
    /// scheduler is ready.
    pub async fn start(self) -> SchedulerHandle {
        let cancel = CancellationToken::new();
        let mut entries = Vec::with_capacity(self.jobs.len());
        let mut tasks = Vec::with_capacity(self.jobs.len());
        let mut ready: Vec<(String, watch::Receiver<bool>)> = Vec::with_capacity(self.jobs.len());

        for job in self.jobs {
            let period = effective_cadence(job.cadence, self.options.fixed_tick);
            if period != job.cadence {
                warn!(job = %job.name, configured = ?job.cadence, actual = ?period,
                    "fixed tick overrides configured cadence");
            }
            // registration order guarantees the prerequisite is already spawned
            let prerequisite = job.after.as_ref().and_then(|after| {
                ready
                    .iter()
                    .find(|(name, _)| name == after)
                    .map(|(_, rx)| rx.clone())
            });
            let entry = Arc::new(JobEntry::new(job, period));
            let (ready_tx, ready_rx) = watch::channel(false);
            let handle = tokio::spawn(job_loop(
                Arc::clone(&entry),
                cancel.child_token(),
                prerequisite,
                ready_tx,
            ));
            tasks.push((entry.job.name.clone(), handle));
            ready.push((entry.job.name.clone(), ready_rx));
            entries.push(entry);
        }

        for (name, result) in join_all(
            ready
                .into_iter()
                .map(|(name, mut rx)| async move {
                    let first_run = rx.wait_for(|done| *done).await.map(|_| ());
                    (name, first_run)
                }),
        )
        .await
        {
            if result.is_err() {
                error!(job = %name, "job task exited before its first run completed");
            }
        }
        info!(jobs = entries.len(), "scheduler ready");

        SchedulerHandle {
            entries,
            cancel,
            tasks: tokio::sync::Mutex::new(tasks),
            stop_grace: self.options.stop_grace,
        }
    }
}

/// Running scheduler. Dropping it cancels every job timer.
pub struct SchedulerHandle {
    entries: Vec<Arc<JobEntry>>,
    cancel: CancellationToken,
    tasks: tokio::sync::Mutex<Vec<(String, JoinHandle<()>)>>,
    stop_grace: Duration,
}

impl SchedulerHandle {
    /// Stop every job and wait for their tasks to exit.
    ///
    /// An action already in progress is left to finish; only later runs are
    /// prevented. Waits at most the configured grace period, after which any
    /// task still inside its action is detached rather than aborted.
    /// Safe to call more than once, concurrently or not.
    pub async fn stop(&self) {
        self.cancel.cancel();
        let mut tasks = self.tasks.lock().await;
        if tasks.is_empty() {
            return;
        }
        info!(jobs = tasks.len(), "stopping scheduler");

        let deadline = tokio::time::Instant::now() + self.stop_grace;
        for (name, handle) in tasks.drain(..) {
            match tokio::time::timeout_at(deadline, handle).await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => error!(job = %name, error = %e, "job task ended abnormally"),
                Err(_) => warn!(job = %name, "job still running after grace period"),
            }
        }
        info!("scheduler stopped");
    }

    pub fn is_stopped(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Run bookkeeping for every job, in registration order.
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.entries.iter().map(|e| e.status()).collect()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

// --- private helpers -------------------------------------------------------

struct JobEntry {
    job: Job,
    period: Duration,
    run_count: AtomicU64,
    last_run_at: Mutex<Option<DateTime<Utc>>>,
}

impl JobEntry {
    fn new(job: Job, period: Duration) -> Self {
        Self {
            job,
            period,
            run_count: AtomicU64::new(0),
            last_run_at: Mutex::new(None),
        }
    }

    /// Run the action once. A panic is contained to this run.
    async fn run_once(&self) {
        *self
            .last_run_at
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Utc::now());

        if AssertUnwindSafe(self.job.action.run())
            .catch_unwind()
            .await
            .is_err()
        {
            error!(job = %self.job.name, "job action panicked");
        }
        self.run_count.fetch_add(1, Ordering::Relaxed);
    }

    fn status(&self) -> JobStatus {
        JobStatus {
            name: self.job.name.clone(),
            cadence: self.period,
            run_count: self.run_count.load(Ordering::Relaxed),
            last_run_at: *self
                .last_run_at
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        }
    }
}

/// Wait for the prerequisite, first run, readiness signal, then one run per
/// tick until cancelled.
///
/// The next tick is only awaited after the previous run returned, so runs of
/// the same job never overlap.
async fn job_loop(
    entry: Arc<JobEntry>,
    cancel: CancellationToken,
    prerequisite: Option<watch::Receiver<bool>>,
    ready: watch::Sender<bool>,
) {
    if let Some(mut first_run) = prerequisite {
        if first_run.wait_for(|done| *done).await.is_err() {
            warn!(job = %entry.job.name, "prerequisite exited before its first run");
        }
    }
    entry.run_once().await;
    ready.send_replace(true);

    let mut timer = job_timer(entry.period);
    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = timer.tick() => {}
        }
        entry.run_once().await;
    }
    debug!(job = %entry.job.name, "job loop exited");
}
