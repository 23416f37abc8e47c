//! Slot-budgeted job queue.
//!
//! A [`JobQueue`] is filled once, then [`run`](JobQueue::run) drives it until
//! every job has finished or the deadline passes. Each tick:
//!
//! 1. refreshes the status of in-progress jobs,
//! 2. works out how many slots are still free,
//! 3. admits waiting jobs greedily, in enqueue order, and submits them,
//! 4. reports how many jobs finished,
//! 5. sleeps (cluster mode only) and checks the deadline.

use std::sync::Arc;

use crate::admission::select_admissible;
use crate::clock::{Clock, Deadline, TokioClock};
use crate::config::QueueConfig;
use crate::error::{SchedError, SchedResult};
use crate::exec::{CommandRunner, SystemRunner};
use crate::job::{ExecutionMode, JobId, JobRecord, JobSpec, JobStatus};
use crate::lsf::LsfAdapter;
use crate::poller::refresh_statuses;
use crate::progress::Progress;
use crate::scheduler::BatchScheduler;
use crate::submit::Submitter;

/// Outcome of a single tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Jobs submitted or run during the tick.
    pub submitted: usize,
    /// Jobs that became terminal during the tick.
    pub newly_finished: usize,
}

/// A batch of jobs sharing one slot budget.
pub struct JobQueue {
    config: QueueConfig,
    jobs: Vec<JobRecord>,
    scheduler: Arc<dyn BatchScheduler>,
    submitter: Submitter,
    clock: Arc<dyn Clock>,
}

impl JobQueue {
    /// Create a queue that talks to LSF through real processes.
    pub fn new(config: QueueConfig) -> SchedResult<Self> {
        let runner: Arc<dyn CommandRunner> = Arc::new(SystemRunner);
        let scheduler = Arc::new(LsfAdapter::with_runner(config.lsf.clone(), runner.clone())?);
        Ok(Self::with_parts(
            config,
            scheduler,
            runner,
            Arc::new(TokioClock),
        ))
    }

    /// Create a queue from its collaborators.
    pub fn with_parts(
        config: QueueConfig,
        scheduler: Arc<dyn BatchScheduler>,
        runner: Arc<dyn CommandRunner>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let submitter = Submitter::new(scheduler.clone(), runner, config.mode);
        Self {
            config,
            jobs: Vec::new(),
            scheduler,
            submitter,
            clock,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Add a job and return its index.
    pub fn enqueue(&mut self, spec: JobSpec) -> SchedResult<usize> {
        if spec.command.is_empty() {
            return Err(SchedError::InvalidJob("command line is empty".to_string()));
        }
        if spec.slots == 0 {
            return Err(SchedError::InvalidJob(
                "slot count must be positive".to_string(),
            ));
        }
        if let Some(max_slots) = self.config.max_slots {
            if u64::from(spec.slots) > max_slots {
                tracing::warn!(
                    "Job {} needs {} slots but at most {} may run at once; it will never be submitted",
                    self.jobs.len(),
                    spec.slots,
                    max_slots
                );
            }
        }

        let index = self.jobs.len();
        self.jobs.push(JobRecord::new(index, spec));
        Ok(index)
    }

    /// Number of jobs in the queue.
    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    /// Check if the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }

    /// All jobs, in enqueue order.
    pub fn jobs(&self) -> &[JobRecord] {
        &self.jobs
    }

    /// Current status of every job, in enqueue order.
    pub fn statuses(&self) -> Vec<JobStatus> {
        self.jobs.iter().map(|job| job.status).collect()
    }

    /// Slots held by in-progress jobs.
    pub fn slots_in_use(&self) -> u64 {
        self.jobs
            .iter()
            .filter(|job| job.status.is_in_progress())
            .map(|job| u64::from(job.spec.slots))
            .sum()
    }

    /// Check if every job has finished.
    pub fn all_finished(&self) -> bool {
        self.jobs.iter().all(|job| job.status.is_terminal())
    }

    fn finished_count(&self) -> usize {
        self.jobs
            .iter()
            .filter(|job| job.status.is_terminal())
            .count()
    }

    /// Slots that may still be handed out.
    fn free_slots(&self) -> u64 {
        match self.config.max_slots {
            Some(max_slots) => max_slots.saturating_sub(self.slots_in_use()),
            None => u64::MAX,
        }
    }

    /// Refresh the status of in-progress jobs.
    ///
    /// Statuses are only written back once the whole query succeeded.
    async fn refresh(&mut self) -> SchedResult<()> {
        let previous = self.statuses();
        let ids: Vec<JobId> = self.jobs.iter().map(|job| job.id).collect();
        let refreshed = refresh_statuses(self.scheduler.as_ref(), &previous, &ids).await?;

        for (job, status) in self.jobs.iter_mut().zip(refreshed) {
            if job.status != status {
                tracing::debug!("Job {} ({}) is now {}", job.index, job.id, status.name());
                job.status = status;
            }
        }
        Ok(())
    }

    /// Admit and submit as many waiting jobs as the free slots allow.
    async fn admit(&mut self) -> SchedResult<usize> {
        let free = self.free_slots();
        if free == 0 {
            return Ok(0);
        }

        let waiting: Vec<usize> = self
            .jobs
            .iter()
            .filter(|job| job.status == JobStatus::Unsubmitted)
            .map(|job| job.index)
            .collect();
        if waiting.is_empty() {
            return Ok(0);
        }

        let costs: Vec<u64> = waiting
            .iter()
            .map(|&index| u64::from(self.jobs[index].spec.slots))
            .collect();
        let admitted = select_admissible(&costs, free);

        let mut submitted = 0;
        for (&index, _) in waiting.iter().zip(&admitted).filter(|(_, admit)| **admit) {
            let id = self.submitter.submit(&self.jobs[index].spec).await?;
            let job = &mut self.jobs[index];
            job.mark_submitted(id);
            tracing::info!("Job {} submitted as {} ({})", index, id, job.status.name());
            submitted += 1;
        }
        Ok(submitted)
    }

    /// Run one polling tick: refresh, then admit.
    pub async fn tick(&mut self) -> SchedResult<TickSummary> {
        let finished_before = self.finished_count();
        self.refresh().await?;
        let submitted = self.admit().await?;

        Ok(TickSummary {
            submitted,
            newly_finished: self.finished_count() - finished_before,
        })
    }

    /// Drive the queue until every job has finished or the deadline passes.
    ///
    /// The returned statuses may still contain unsubmitted or in-progress
    /// entries if the loop gave up early. A loop also ends early when
    /// nothing is running and no waiting job fits even an empty budget.
    pub async fn run(&mut self, progress: &mut dyn Progress) -> SchedResult<Vec<JobStatus>> {
        let deadline = Deadline::start(self.clock.as_ref(), self.config.max_wait());
        tracing::info!(
            "Running {} job(s) in {:?} mode with {} slot(s)",
            self.jobs.len(),
            self.config.mode,
            self.config
                .max_slots
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        );

        let result = self.run_loop(&deadline, progress).await;
        progress.finish();
        result?;

        tracing::info!(
            "Queue stopped after {:.1}s: {}/{} job(s) finished",
            deadline.elapsed(self.clock.as_ref()).as_secs_f64(),
            self.finished_count(),
            self.jobs.len()
        );
        Ok(self.statuses())
    }

    async fn run_loop(
        &mut self,
        deadline: &Deadline,
        progress: &mut dyn Progress,
    ) -> SchedResult<()> {
        loop {
            let summary = self.tick().await?;
            progress.update(summary.newly_finished);

            if self.all_finished() {
                return Ok(());
            }
            if self.is_stalled() {
                tracing::warn!(
                    "No waiting job fits within {:?} slots; giving up on the remaining jobs",
                    self.config.max_slots
                );
                return Ok(());
            }

            if self.config.mode == ExecutionMode::Cluster {
                self.clock.sleep(self.config.poll_interval()).await;
            }
            if deadline.is_expired(self.clock.as_ref()) {
                tracing::warn!(
                    "Deadline passed with {} job(s) unfinished",
                    self.jobs.len() - self.finished_count()
                );
                return Ok(());
            }
        }
    }

    /// Nothing is running and nothing more can be admitted.
    fn is_stalled(&self) -> bool {
        !self.jobs.iter().any(|job| job.status.is_in_progress())
            && self
                .jobs
                .iter()
                .filter(|job| job.status == JobStatus::Unsubmitted)
                .all(|job| u64::from(job.spec.slots) > self.free_slots())
    }
}
