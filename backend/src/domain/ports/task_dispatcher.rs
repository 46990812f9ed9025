//! Ports for background work: dispatching jobs and executing them.
use std::time::Duration;

use async_trait::async_trait;

use crate::domain::{Error, Job};

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the job spool.
    pub enum JobDispatchError {
        /// Spool infrastructure is unavailable.
        Unavailable { message: String } => "job spool is unavailable: {message}",
        /// The job could not be serialised or persisted.
        Rejected { message: String } => "job was rejected: {message}",
    }
}

/// Executes jobs. Implementations report their own failures.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait JobHandler: Send + Sync {
    /// Run a job to completion.
    async fn handle(&self, job: &Job) -> Result<(), Error>;
}

/// Fire-and-forget "run later" facade.
///
/// Callers get no result channel and must not rely on ordering or
/// completion. The strategy behind it is chosen once at startup.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskDispatcher: Send + Sync {
    /// Run `job` according to the configured strategy.
    async fn dispatch(&self, job: Job);

    /// Run `job` every `interval` until the process exits.
    async fn every(&self, interval: Duration, job: Job);
}

/// Durable queue drained by the spool worker.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TaskSpool: Send + Sync {
    /// Persist a job for later execution.
    async fn enqueue(&self, job: &Job) -> Result<(), JobDispatchError>;

    /// Remove and return up to `limit` of the oldest jobs. A claimed job is
    /// never handed out twice.
    async fn claim(&self, limit: usize) -> Result<Vec<Job>, JobDispatchError>;
}
