//! LSF adapter for job submission and tracking.

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::LsfConfig;
use crate::error::{SchedError, SchedResult};
use crate::exec::{CommandLine, CommandRunner, SystemRunner};
use crate::job::{JobSpec, JobStatus};
use crate::lsf::parser::{self, LsfState};
use crate::scheduler::BatchScheduler;

/// Adapter for the LSF batch scheduler.
pub struct LsfAdapter {
    config: LsfConfig,
    runner: Arc<dyn CommandRunner>,
}

impl LsfAdapter {
    /// Create an adapter that runs the real bsub/bjobs commands.
    pub fn new(config: LsfConfig) -> SchedResult<Self> {
        Self::with_runner(config, Arc::new(SystemRunner))
    }

    /// Create an adapter on top of a custom command runner.
    pub fn with_runner(config: LsfConfig, runner: Arc<dyn CommandRunner>) -> SchedResult<Self> {
        config.validate()?;
        Ok(Self { config, runner })
    }

    /// Get the configuration.
    pub fn config(&self) -> &LsfConfig {
        &self.config
    }

    /// Build the bsub command line for a job.
    ///
    /// Slot count and output redirection come first, then the job's own
    /// options, then the payload.
    pub fn bsub_command(&self, spec: &JobSpec) -> CommandLine {
        let output = spec.output_or(&self.config.default_output);
        CommandLine::new(&self.config.bsub_program)
            .arg("-n")
            .arg(spec.slots.to_string())
            .args(["-oo", output, "-eo", output])
            .args(spec.options.iter().cloned())
            .args(spec.command.iter().cloned())
    }

    /// Build the bjobs command line for a list of ids.
    pub fn bjobs_command(&self, ids: &[u64]) -> CommandLine {
        CommandLine::new(&self.config.bjobs_program).args(ids.iter().map(u64::to_string))
    }

    /// Submit a job through bsub and return the id LSF assigned.
    pub async fn bsub(&self, spec: &JobSpec) -> SchedResult<u64> {
        if spec.command.is_empty() {
            return Err(SchedError::InvalidJob("command line is empty".to_string()));
        }

        let command = self.bsub_command(spec);
        let output = self
            .runner
            .output(&command, self.config.command_timeout())
            .await?
            .check(&command)?;

        let job_id = parser::parse_bsub_output(&command.to_string(), &output.stdout)?;
        tracing::info!("Submitted LSF job {} ({} slots)", job_id, spec.slots);
        Ok(job_id)
    }

    /// Query the state of many jobs.
    ///
    /// Ids are sent in chunks of at most `query_chunk_size`, one bjobs call
    /// per chunk; the result keeps the input order.
    pub async fn bjobs(&self, ids: &[u64]) -> SchedResult<Vec<LsfState>> {
        let mut states = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(self.config.query_chunk_size) {
            states.extend(self.bjobs_chunk(chunk).await?);
        }
        Ok(states)
    }

    /// Run bjobs once.
    async fn bjobs_chunk(&self, ids: &[u64]) -> SchedResult<Vec<LsfState>> {
        let command = self.bjobs_command(ids);
        let output = self
            .runner
            .output(&command, self.config.command_timeout())
            .await?
            .check(&command)?;

        parser::parse_bjobs_output(&command.to_string(), &output.stdout, ids)
    }
}

#[async_trait]
impl BatchScheduler for LsfAdapter {
    async fn submit(&self, spec: &JobSpec) -> SchedResult<u64> {
        self.bsub(spec).await
    }

    async fn query(&self, ids: &[u64]) -> SchedResult<Vec<JobStatus>> {
        let states = self.bjobs(ids).await?;
        Ok(states.iter().map(LsfState::status).collect())
    }
}
