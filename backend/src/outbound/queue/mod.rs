//! Task dispatch strategies behind the `TaskDispatcher` port.
//!
//! The strategy is picked once at startup from [`TaskMode`]:
//!
//! - [`InlineDispatcher`] awaits the handler before returning.
//! - [`SpawningDispatcher`] runs each job on its own tokio task, carrying the
//!   caller's trace id.
//! - [`SpoolDispatcher`] serialises jobs into a [`TaskSpool`]; a
//!   [`SpoolWorker`] claims them back and runs them.
//!
//! Failures are logged here; callers never observe them.

use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tracing::{debug, error, warn};

use crate::domain::ports::{JobHandler, TaskDispatcher, TaskSpool};
use crate::domain::{Job, TraceId};

/// How background jobs are executed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TaskMode {
    /// Run jobs before the request completes.
    Inline,
    /// Run jobs concurrently on the runtime.
    #[default]
    Spawn,
    /// Persist jobs to the spool for the spool worker.
    Spool,
}

/// Error returned for an unknown task mode keyword.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown task mode `{0}`; expected inline, spawn or spool")]
pub struct UnknownTaskMode(pub String);

impl FromStr for TaskMode {
    type Err = UnknownTaskMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "inline" => Ok(Self::Inline),
            "spawn" => Ok(Self::Spawn),
            "spool" => Ok(Self::Spool),
            _ => Err(UnknownTaskMode(s.to_owned())),
        }
    }
}

/// Build the dispatcher for `mode`.
pub fn build_dispatcher(
    mode: TaskMode,
    handler: Arc<dyn JobHandler>,
    spool: Arc<dyn TaskSpool>,
) -> Arc<dyn TaskDispatcher> {
    match mode {
        TaskMode::Inline => Arc::new(InlineDispatcher::new(handler)),
        TaskMode::Spawn => Arc::new(SpawningDispatcher::new(handler)),
        TaskMode::Spool => Arc::new(SpoolDispatcher::new(spool)),
    }
}

async fn run_job(handler: &dyn JobHandler, job: &Job) {
    if let Err(err) = handler.handle(job).await {
        error!(job = job.name(), error = %err, "background job failed");
    }
}

/// Ticker whose first tick fires one `period` from now.
fn ticker(period: Duration) -> tokio::time::Interval {
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker
}

fn usable_interval(interval: Duration, job: &Job) -> Option<Duration> {
    if interval.is_zero() {
        warn!(job = job.name(), "refusing to schedule a job with a zero interval");
        return None;
    }
    Some(interval)
}

/// Runs jobs synchronously within the caller's request.
#[derive(Clone)]
pub struct InlineDispatcher {
    handler: Arc<dyn JobHandler>,
}

impl InlineDispatcher {
    /// Create a dispatcher running jobs through `handler`.
    pub fn new(handler: Arc<dyn JobHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl TaskDispatcher for InlineDispatcher {
    async fn dispatch(&self, job: Job) {
        run_job(self.handler.as_ref(), &job).await;
    }

    /// Inline mode has no background runner, so the job runs once.
    async fn every(&self, _interval: Duration, job: Job) {
        run_job(self.handler.as_ref(), &job).await;
    }
}

/// Runs each job on a fresh tokio task.
#[derive(Clone)]
pub struct SpawningDispatcher {
    handler: Arc<dyn JobHandler>,
}

impl SpawningDispatcher {
    /// Create a dispatcher running jobs through `handler`.
    pub fn new(handler: Arc<dyn JobHandler>) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl TaskDispatcher for SpawningDispatcher {
    async fn dispatch(&self, job: Job) {
        let handler = Arc::clone(&self.handler);
        let trace_id = TraceId::current();
        tokio::spawn(async move {
            let work = async { run_job(handler.as_ref(), &job).await };
            match trace_id {
                Some(trace_id) => TraceId::scope(trace_id, work).await,
                None => work.await,
            }
        });
    }

    async fn every(&self, interval: Duration, job: Job) {
        let Some(interval) = usable_interval(interval, &job) else {
            return;
        };
        let handler = Arc::clone(&self.handler);
        tokio::spawn(async move {
            let mut ticker = ticker(interval);
            loop {
                ticker.tick().await;
                run_job(handler.as_ref(), &job).await;
            }
        });
    }
}

/// Persists jobs to the spool.
#[derive(Clone)]
pub struct SpoolDispatcher {
    spool: Arc<dyn TaskSpool>,
}

impl SpoolDispatcher {
    /// Create a dispatcher writing to `spool`.
    pub fn new(spool: Arc<dyn TaskSpool>) -> Self {
        Self { spool }
    }
}

async fn spool_job(spool: &dyn TaskSpool, job: &Job) {
    if let Err(err) = spool.enqueue(job).await {
        error!(job = job.name(), error = %err, "failed to spool background job");
    }
}

#[async_trait]
impl TaskDispatcher for SpoolDispatcher {
    async fn dispatch(&self, job: Job) {
        spool_job(self.spool.as_ref(), &job).await;
    }

    async fn every(&self, interval: Duration, job: Job) {
        let Some(interval) = usable_interval(interval, &job) else {
            return;
        };
        let spool = Arc::clone(&self.spool);
        tokio::spawn(async move {
            let mut ticker = ticker(interval);
            loop {
                ticker.tick().await;
                spool_job(spool.as_ref(), &job).await;
            }
        });
    }
}

/// Jobs claimed from the spool per round trip.
pub const SPOOL_BATCH: usize = 32;

/// Claims spooled jobs and runs them through a handler.
#[derive(Clone)]
pub struct SpoolWorker {
    spool: Arc<dyn TaskSpool>,
    handler: Arc<dyn JobHandler>,
    batch: usize,
}

impl SpoolWorker {
    /// Create a worker draining `spool` into `handler`.
    pub fn new(spool: Arc<dyn TaskSpool>, handler: Arc<dyn JobHandler>) -> Self {
        Self {
            spool,
            handler,
            batch: SPOOL_BATCH,
        }
    }

    /// Claim at most `batch` jobs per round trip.
    #[must_use]
    pub fn with_batch(mut self, batch: usize) -> Self {
        self.batch = batch.max(1);
        self
    }

    /// Run spooled jobs until the spool is empty, returning how many ran.
    ///
    /// A failed claim ends the pass; the jobs stay spooled for the next one.
    pub async fn drain(&self) -> usize {
        let mut ran = 0;
        loop {
            let jobs = match self.spool.claim(self.batch).await {
                Ok(jobs) => jobs,
                Err(err) => {
                    warn!(error = %err, "claiming spooled jobs failed");
                    return ran;
                }
            };
            if jobs.is_empty() {
                return ran;
            }
            for job in &jobs {
                run_job(self.handler.as_ref(), job).await;
            }
            ran += jobs.len();
        }
    }

    /// Drain the spool every `poll` on a background task.
    pub fn start(self, poll: Duration) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = ticker(poll.max(Duration::from_millis(1)));
            loop {
                ticker.tick().await;
                let ran = self.drain().await;
                if ran > 0 {
                    debug!(ran, "spooled jobs processed");
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Error;
    use crate::domain::PostId;
    use crate::domain::ports::{JobDispatchError, MockJobHandler, MockTaskSpool};
    use crate::outbound::memory::MemoryForum;
    use rstest::rstest;
    use tokio::sync::mpsc;

    struct ChannelHandler(mpsc::UnboundedSender<(Job, Option<TraceId>)>);

    #[async_trait]
    impl JobHandler for ChannelHandler {
        async fn handle(&self, job: &Job) -> Result<(), Error> {
            let _ = self.0.send((job.clone(), TraceId::current()));
            Ok(())
        }
    }

    #[rstest]
    #[case("inline", TaskMode::Inline)]
    #[case(" Spawn ", TaskMode::Spawn)]
    #[case("SPOOL", TaskMode::Spool)]
    fn parses_modes(#[case] raw: &str, #[case] expected: TaskMode) {
        assert_eq!(raw.parse::<TaskMode>(), Ok(expected));
    }

    #[rstest]
    fn rejects_unknown_modes() {
        assert!("celery".parse::<TaskMode>().is_err());
    }

    #[rstest]
    #[tokio::test]
    async fn inline_runs_before_returning() {
        let mut handler = MockJobHandler::new();
        handler.expect_handle().times(1).returning(|_| Ok(()));

        InlineDispatcher::new(Arc::new(handler))
            .dispatch(Job::ReportStatistics)
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn job_failures_are_swallowed() {
        let mut handler = MockJobHandler::new();
        handler
            .expect_handle()
            .times(1)
            .returning(|_| Err(Error::internal("boom")));

        InlineDispatcher::new(Arc::new(handler))
            .dispatch(Job::ReportStatistics)
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn spawned_jobs_inherit_the_trace_id() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = SpawningDispatcher::new(Arc::new(ChannelHandler(tx)));
        let trace_id = TraceId::generate();

        TraceId::scope(trace_id, dispatcher.dispatch(Job::ReportStatistics)).await;

        let (job, observed) = rx.recv().await.expect("job ran");
        assert_eq!(job, Job::ReportStatistics);
        assert_eq!(observed, Some(trace_id));
    }

    #[rstest]
    #[tokio::test]
    async fn scheduled_jobs_repeat() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let dispatcher = SpawningDispatcher::new(Arc::new(ChannelHandler(tx)));

        dispatcher
            .every(Duration::from_millis(5), Job::ReportStatistics)
            .await;

        for _ in 0..2 {
            let (job, _) = rx.recv().await.expect("tick ran");
            assert_eq!(job, Job::ReportStatistics);
        }
    }

    #[rstest]
    #[tokio::test]
    async fn spool_mode_enqueues_and_tolerates_failures() {
        let mut spool = MockTaskSpool::new();
        spool
            .expect_enqueue()
            .times(1)
            .returning(|_| Err(JobDispatchError::unavailable("down")));

        SpoolDispatcher::new(Arc::new(spool))
            .dispatch(Job::ReportStatistics)
            .await;
    }

    #[rstest]
    #[tokio::test]
    async fn the_worker_runs_what_the_dispatcher_spooled() {
        let forum = Arc::new(MemoryForum::new());
        let dispatcher = SpoolDispatcher::new(forum.clone());
        let post_id = PostId::random();
        dispatcher.dispatch(Job::AnswerCreated { post_id }).await;
        dispatcher.dispatch(Job::ReportStatistics).await;

        let (tx, mut rx) = mpsc::unbounded_channel();
        let worker = SpoolWorker::new(forum.clone(), Arc::new(ChannelHandler(tx))).with_batch(1);
        assert_eq!(worker.drain().await, 2);
        assert_eq!(worker.drain().await, 0);

        let (first, _) = rx.recv().await.expect("first job");
        let (second, _) = rx.recv().await.expect("second job");
        assert_eq!(first, Job::AnswerCreated { post_id });
        assert_eq!(second, Job::ReportStatistics);
        assert!(forum.spooled_jobs().is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn a_failed_claim_ends_the_pass() {
        let mut spool = MockTaskSpool::new();
        spool
            .expect_claim()
            .times(1)
            .returning(|_| Err(JobDispatchError::unavailable("down")));
        let mut handler = MockJobHandler::new();
        handler.expect_handle().never();

        let worker = SpoolWorker::new(Arc::new(spool), Arc::new(handler));
        assert_eq!(worker.drain().await, 0);
    }

    #[rstest]
    #[tokio::test]
    async fn the_started_worker_polls_the_spool() {
        let forum = Arc::new(MemoryForum::new());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let handle = SpoolWorker::new(forum.clone(), Arc::new(ChannelHandler(tx)))
            .start(Duration::from_millis(5));

        SpoolDispatcher::new(forum.clone())
            .dispatch(Job::ReportStatistics)
            .await;
        let (job, _) = rx.recv().await.expect("worker ran the job");
        assert_eq!(job, Job::ReportStatistics);
        handle.abort();
    }
}
