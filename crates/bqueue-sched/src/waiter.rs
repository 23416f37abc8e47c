//! Waiting on jobs that are already running.

use std::sync::Arc;

use crate::clock::{Clock, Deadline, TokioClock};
use crate::config::WaitConfig;
use crate::error::SchedResult;
use crate::job::{JobId, JobStatus};
use crate::lsf::LsfAdapter;
use crate::poller::refresh_statuses;
use crate::progress::Progress;
use crate::scheduler::BatchScheduler;

/// Polls a fixed set of job ids until none of them is in progress.
///
/// No admission, no submission: an id that was never submitted stays
/// [`JobStatus::Unsubmitted`] and does not keep the waiter alive.
pub struct Waiter {
    config: WaitConfig,
    scheduler: Arc<dyn BatchScheduler>,
    clock: Arc<dyn Clock>,
}

impl Waiter {
    /// Create a waiter that queries LSF through real processes.
    pub fn new(config: WaitConfig) -> SchedResult<Self> {
        let scheduler = Arc::new(LsfAdapter::new(config.lsf.clone())?);
        Ok(Self::with_parts(config, scheduler, Arc::new(TokioClock)))
    }

    pub fn with_parts(
        config: WaitConfig,
        scheduler: Arc<dyn BatchScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            scheduler,
            clock,
        }
    }

    /// Poll until every id has settled or the deadline passes.
    ///
    /// Returns the last known status of each id, in input order.
    pub async fn wait(
        &self,
        ids: &[JobId],
        progress: &mut dyn Progress,
    ) -> SchedResult<Vec<JobStatus>> {
        let deadline = Deadline::start(self.clock.as_ref(), self.config.max_wait());
        let mut statuses: Vec<JobStatus> = ids.iter().map(JobId::initial_status).collect();
        tracing::info!("Waiting on {} job(s)", ids.len());

        let result = self.poll(ids, &mut statuses, &deadline, progress).await;
        progress.finish();
        result?;

        Ok(statuses)
    }

    async fn poll(
        &self,
        ids: &[JobId],
        statuses: &mut Vec<JobStatus>,
        deadline: &Deadline,
        progress: &mut dyn Progress,
    ) -> SchedResult<()> {
        // sentinel ids are settled before the first query
        progress.update(statuses.iter().filter(|s| s.is_terminal()).count());

        loop {
            let pending = statuses.iter().filter(|s| s.is_in_progress()).count();
            if pending == 0 {
                return Ok(());
            }

            let refreshed = refresh_statuses(self.scheduler.as_ref(), statuses, ids).await?;
            let still_pending = refreshed.iter().filter(|s| s.is_in_progress()).count();
            *statuses = refreshed;
            progress.update(pending - still_pending);
            if still_pending == 0 {
                return Ok(());
            }

            tracing::debug!("{} job(s) still running", still_pending);
            self.clock.sleep(self.config.poll_interval()).await;
            if deadline.is_expired(self.clock.as_ref()) {
                tracing::warn!(
                    "Stopped waiting after {:.0}s with {} job(s) still running",
                    deadline.elapsed(self.clock.as_ref()).as_secs_f64(),
                    still_pending
                );
                return Ok(());
            }
        }
    }
}

/// Wait on `ids` using LSF with the given configuration.
pub async fn wait_for_jobs(
    ids: &[JobId],
    config: WaitConfig,
    progress: &mut dyn Progress,
) -> SchedResult<Vec<JobStatus>> {
    Waiter::new(config)?.wait(ids, progress).await
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;

    use super::*;
    use crate::clock::ManualClock;
    use crate::error::SchedError;
    use crate::job::JobSpec;
    use crate::progress::ProgressLog;

    /// Each id answers InProgress until its poll budget runs out.
    struct ScriptedScheduler {
        remaining: Mutex<HashMap<u64, (u32, JobStatus)>>,
        queries: Mutex<Vec<Vec<u64>>>,
    }

    impl ScriptedScheduler {
        fn new(script: &[(u64, u32, JobStatus)]) -> Self {
            Self {
                remaining: Mutex::new(
                    script
                        .iter()
                        .map(|&(id, polls, outcome)| (id, (polls, outcome)))
                        .collect(),
                ),
                queries: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl BatchScheduler for ScriptedScheduler {
        async fn submit(&self, _spec: &JobSpec) -> SchedResult<u64> {
            unreachable!("the waiter never submits")
        }

        async fn query(&self, ids: &[u64]) -> SchedResult<Vec<JobStatus>> {
            self.queries.lock().unwrap().push(ids.to_vec());
            let mut remaining = self.remaining.lock().unwrap();
            ids.iter()
                .map(|id| {
                    let (polls, outcome) = remaining
                        .get_mut(id)
                        .ok_or_else(|| SchedError::UnknownStatus(id.to_string()))?;
                    *polls = polls.saturating_sub(1);
                    Ok(if *polls == 0 {
                        *outcome
                    } else {
                        JobStatus::InProgress
                    })
                })
                .collect()
        }
    }

    fn waiter(
        scheduler: Arc<ScriptedScheduler>,
        clock: Arc<ManualClock>,
        max_wait: Option<u64>,
    ) -> Waiter {
        let config = WaitConfig {
            max_wait_secs: max_wait,
            ..Default::default()
        };
        Waiter::with_parts(config, scheduler, clock)
    }

    #[tokio::test]
    async fn test_waits_until_all_settled() {
        let scheduler = Arc::new(ScriptedScheduler::new(&[
            (1, 1, JobStatus::Succeeded),
            (2, 3, JobStatus::Failed),
        ]));
        let clock = Arc::new(ManualClock::new());
        let ids = [JobId::Remote(1), JobId::Remote(2)];

        let mut progress = ProgressLog::default();
        let statuses = waiter(scheduler.clone(), clock.clone(), None)
            .wait(&ids, &mut progress)
            .await
            .unwrap();

        assert_eq!(statuses, vec![JobStatus::Succeeded, JobStatus::Failed]);
        assert_eq!(progress.total(), 2);
        assert!(progress.finished);
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(10); 2]);
        // finished jobs drop out of later queries
        assert_eq!(
            *scheduler.queries.lock().unwrap(),
            vec![vec![1, 2], vec![2], vec![2]]
        );
    }

    #[tokio::test]
    async fn test_sentinels_resolve_without_queries() {
        let scheduler = Arc::new(ScriptedScheduler::new(&[]));
        let ids = [JobId::LocalSuccess, JobId::Unsubmitted, JobId::LocalFailure];

        let mut progress = ProgressLog::default();
        let statuses = waiter(scheduler.clone(), Arc::new(ManualClock::new()), None)
            .wait(&ids, &mut progress)
            .await
            .unwrap();

        assert_eq!(
            statuses,
            vec![JobStatus::Succeeded, JobStatus::Unsubmitted, JobStatus::Failed]
        );
        assert_eq!(progress.total(), 2);
        assert!(scheduler.queries.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_deadline_returns_in_progress() {
        let scheduler = Arc::new(ScriptedScheduler::new(&[(7, 100, JobStatus::Succeeded)]));
        let clock = Arc::new(ManualClock::new());

        let mut progress = ProgressLog::default();
        let statuses = waiter(scheduler, clock.clone(), Some(25))
            .wait(&[JobId::Remote(7)], &mut progress)
            .await
            .unwrap();

        assert_eq!(statuses, vec![JobStatus::InProgress]);
        assert_eq!(clock.sleeps().len(), 3);
        assert!(progress.finished);
    }

    #[tokio::test]
    async fn test_query_error_propagates() {
        let scheduler = Arc::new(ScriptedScheduler::new(&[]));
        let mut progress = ProgressLog::default();
        let result = waiter(scheduler, Arc::new(ManualClock::new()), None)
            .wait(&[JobId::Remote(404)], &mut progress)
            .await;

        assert!(matches!(result, Err(SchedError::UnknownStatus(_))));
        assert!(progress.finished);
    }
}
