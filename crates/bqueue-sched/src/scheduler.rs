//! The batch scheduler seen by the queue.

use async_trait::async_trait;

use crate::error::SchedResult;
use crate::job::{JobSpec, JobStatus};

/// Trait for batch scheduler implementations.
///
/// The queue only ever needs these two operations, so anything that can
/// submit a job and report on submitted ones can stand in for LSF.
#[async_trait]
pub trait BatchScheduler: Send + Sync {
    /// Submit a job and return the id the scheduler assigned to it.
    async fn submit(&self, spec: &JobSpec) -> SchedResult<u64>;

    /// Get the status of each job, in the order given.
    ///
    /// Implementations must return exactly one status per id.
    async fn query(&self, ids: &[u64]) -> SchedResult<Vec<JobStatus>>;
}
