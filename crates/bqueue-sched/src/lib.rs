//! Slot-Budgeted Job Queue for LSF Clusters
//!
//! This crate keeps a batch of jobs flowing through an LSF cluster without
//! ever holding more than a fixed number of slots at once. The same queue can
//! run every job on the local machine instead, which is handy for testing a
//! workflow before it goes to the cluster.
//!
//! # Overview
//!
//! A [`JobQueue`] is filled with [`JobSpec`]s and then driven to completion:
//! 1. **Polling**: Refresh the status of in-progress jobs with one batched `bjobs` call
//! 2. **Admission**: Work out the free slots and admit waiting jobs in order
//! 3. **Submission**: Hand admitted jobs to `bsub`, or run them in place
//! 4. **Deadline**: Stop after a wall-clock limit, leaving unfinished jobs visible
//!
//! A [`Waiter`] polls jobs that were submitted elsewhere until they settle.
//!
//! # LSF Commands
//!
//! | Command | Used for | Parsed output |
//! |---------|----------|---------------|
//! | `bsub -n N -oo OUT -eo OUT [options] cmd...` | submission | `Job <id> is submitted ...` |
//! | `bjobs id...` | status | one row per id, state in the third column |
//!
//! # Example: Bounded Batch
//!
//! ```ignore
//! use bqueue_sched::{JobQueue, JobSpec, NoProgress, QueueConfig};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = QueueConfig::default().with_max_slots(5);
//!     let mut queue = JobQueue::new(config)?;
//!
//!     for _ in 0..10 {
//!         queue.enqueue(JobSpec::new(["/usr/bin/sleep", "20"]).with_options(["-W", "59"]))?;
//!     }
//!
//!     let statuses = queue.run(&mut NoProgress).await?;
//!     println!("{:?}", statuses);
//!     Ok(())
//! }
//! ```
//!
//! # Example: Waiting on Existing Jobs
//!
//! ```ignore
//! use bqueue_sched::{wait_for_jobs, JobId, NoProgress, WaitConfig};
//!
//! let ids = [JobId::Remote(4711), JobId::Remote(4712)];
//! let statuses = wait_for_jobs(&ids, WaitConfig::default(), &mut NoProgress).await?;
//! ```

pub mod admission;
pub mod clock;
pub mod config;
pub mod error;
pub mod exec;
pub mod job;
pub mod lsf;
pub mod poller;
pub mod progress;
pub mod queue;
pub mod scheduler;
pub mod submit;
pub mod waiter;

pub use admission::select_admissible;
pub use clock::{Clock, ManualClock, TokioClock};
pub use config::{LsfConfig, QueueConfig, WaitConfig};
pub use error::{SchedError, SchedResult};
pub use exec::{CommandLine, CommandOutput, CommandRunner, SystemRunner};
pub use job::{ExecutionMode, JobId, JobRecord, JobSpec, JobStatus};
pub use lsf::{LsfAdapter, LsfState};
pub use poller::{query_status, query_statuses, refresh_statuses};
pub use progress::{NoProgress, Progress, ProgressLog};
pub use queue::{JobQueue, TickSummary};
pub use scheduler::BatchScheduler;
pub use submit::Submitter;
pub use waiter::{Waiter, wait_for_jobs};
