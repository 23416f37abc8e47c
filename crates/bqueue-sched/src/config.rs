//! Configuration for the LSF adapter, the job queue and the waiter.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{SchedError, SchedResult};
use crate::job::ExecutionMode;

/// Upper bound on ids passed to a single bjobs call.
pub const DEFAULT_QUERY_CHUNK_SIZE: usize = 10_000;

/// Configuration for the LSF adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LsfConfig {
    /// Submission command.
    pub bsub_program: String,

    /// Status command.
    pub bjobs_program: String,

    /// Output target for jobs that do not name one.
    pub default_output: String,

    /// Maximum number of ids per bjobs invocation.
    pub query_chunk_size: usize,

    /// Timeout for a single bsub/bjobs call, in seconds.
    pub command_timeout_secs: Option<u64>,
}

impl Default for LsfConfig {
    fn default() -> Self {
        Self {
            bsub_program: "bsub".to_string(),
            bjobs_program: "bjobs".to_string(),
            default_output: "/dev/null".to_string(),
            query_chunk_size: DEFAULT_QUERY_CHUNK_SIZE,
            command_timeout_secs: Some(60),
        }
    }
}

impl LsfConfig {
    /// Timeout applied to scheduler commands.
    pub fn command_timeout(&self) -> Option<Duration> {
        self.command_timeout_secs.map(Duration::from_secs)
    }

    /// Check the configuration for values the adapter cannot work with.
    pub fn validate(&self) -> SchedResult<()> {
        if self.query_chunk_size == 0 {
            return Err(SchedError::ConfigError(
                "query_chunk_size must be at least 1".to_string(),
            ));
        }
        if self.bsub_program.is_empty() || self.bjobs_program.is_empty() {
            return Err(SchedError::ConfigError(
                "bsub_program and bjobs_program must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration for a [`JobQueue`](crate::queue::JobQueue).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueueConfig {
    /// Where admitted jobs run.
    pub mode: ExecutionMode,

    /// Ceiling on slots held by in-progress jobs. `None` means unlimited.
    pub max_slots: Option<u64>,

    /// Pause between polling ticks in cluster mode, in seconds.
    pub poll_interval_secs: u64,

    /// Give up after this many seconds. `None` waits forever.
    pub max_wait_secs: Option<u64>,

    /// LSF adapter settings.
    pub lsf: LsfConfig,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            mode: ExecutionMode::Cluster,
            max_slots: None,
            poll_interval_secs: 1,
            max_wait_secs: None,
            lsf: LsfConfig::default(),
        }
    }
}

impl QueueConfig {
    /// Create a configuration for local execution.
    pub fn local() -> Self {
        Self {
            mode: ExecutionMode::Local,
            ..Default::default()
        }
    }

    /// Set the slot ceiling.
    pub fn with_max_slots(mut self, max_slots: u64) -> Self {
        self.max_slots = Some(max_slots);
        self
    }

    /// Set the deadline.
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait_secs = Some(max_wait.as_secs());
        self
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

/// Configuration for [`wait_for_jobs`](crate::waiter::wait_for_jobs).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaitConfig {
    /// Pause between bjobs polls, in seconds.
    pub poll_interval_secs: u64,

    /// Give up after this many seconds. `None` waits forever.
    pub max_wait_secs: Option<u64>,

    /// LSF adapter settings.
    pub lsf: LsfConfig,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            max_wait_secs: None,
            lsf: LsfConfig::default(),
        }
    }
}

impl WaitConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}
