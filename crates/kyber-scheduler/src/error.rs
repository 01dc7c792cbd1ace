use thiserror::Error;

/// Errors that can occur while building the job table.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// A job with this name is already registered.
    #[error("Duplicate job: {name}")]
    DuplicateJob { name: String },

    /// The job's cadence cannot drive a timer.
    #[error("Invalid cadence for job {name}: {reason}")]
    InvalidCadence { name: String, reason: String },

    /// The job waits on a job that has not been registered before it.
    #[error("Job {name} runs after unknown job {prerequisite}")]
    UnknownPrerequisite { name: String, prerequisite: String },
}

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Why a single job run produced nothing. Absorbed by the job, never returned
/// to the scheduler.
#[derive(Debug, Error)]
pub enum RunError {
    #[error(transparent)]
    Fetch(#[from] kyber_fetcher::FetchError),

    #[error(transparent)]
    Persist(#[from] kyber_persister::PersistError),
}
