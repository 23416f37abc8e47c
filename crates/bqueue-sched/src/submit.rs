//! Job submission, on the cluster or on this machine.

use std::sync::Arc;

use crate::error::SchedResult;
use crate::exec::{CommandLine, CommandRunner};
use crate::job::{ExecutionMode, JobId, JobSpec};
use crate::scheduler::BatchScheduler;

/// Hands admitted jobs to the scheduler, or runs them in place.
pub struct Submitter {
    scheduler: Arc<dyn BatchScheduler>,
    runner: Arc<dyn CommandRunner>,
    mode: ExecutionMode,
}

impl Submitter {
    pub fn new(
        scheduler: Arc<dyn BatchScheduler>,
        runner: Arc<dyn CommandRunner>,
        mode: ExecutionMode,
    ) -> Self {
        Self {
            scheduler,
            runner,
            mode,
        }
    }

    pub fn mode(&self) -> ExecutionMode {
        self.mode
    }

    /// Submit one job.
    ///
    /// On the cluster this returns the scheduler's id and any failure is
    /// propagated. Locally the job runs to completion before this returns;
    /// its outcome is folded into [`JobId::LocalSuccess`] or
    /// [`JobId::LocalFailure`] and never surfaces as an error.
    pub async fn submit(&self, spec: &JobSpec) -> SchedResult<JobId> {
        match self.mode {
            ExecutionMode::Cluster => self.scheduler.submit(spec).await.map(JobId::Remote),
            ExecutionMode::Local => Ok(self.run_locally(spec).await),
        }
    }

    async fn run_locally(&self, spec: &JobSpec) -> JobId {
        let result = async {
            let command = CommandLine::from_tokens(&spec.command)?;
            self.runner.run_live(&command).await?.check(&command)
        }
        .await;

        match result {
            Ok(_) => JobId::LocalSuccess,
            Err(e) => {
                tracing::warn!("Encountered an error while running a local job: {}", e);
                JobId::LocalFailure
            }
        }
    }
}
