//! Job types for the queue.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a job, as far as the queue knows it.
///
/// Local runs never reach the scheduler, so their outcome is carried in the
/// identifier itself instead of a scheduler-assigned number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobId {
    /// Not yet handed to the scheduler or run locally.
    #[default]
    Unsubmitted,
    /// Ran locally and exited cleanly.
    LocalSuccess,
    /// Ran locally and errored.
    LocalFailure,
    /// Assigned by the scheduler on submission.
    Remote(u64),
}

impl JobId {
    /// Get the scheduler-assigned id, if any.
    pub fn remote(&self) -> Option<u64> {
        match self {
            JobId::Remote(id) => Some(*id),
            _ => None,
        }
    }

    /// Whether the job has been submitted or run.
    pub fn is_submitted(&self) -> bool {
        !matches!(self, JobId::Unsubmitted)
    }

    /// Status implied by the identifier alone, before any scheduler query.
    pub fn initial_status(&self) -> JobStatus {
        match self {
            JobId::Unsubmitted => JobStatus::Unsubmitted,
            JobId::LocalSuccess => JobStatus::Succeeded,
            JobId::LocalFailure => JobStatus::Failed,
            JobId::Remote(_) => JobStatus::InProgress,
        }
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobId::Unsubmitted => f.pad("-"),
            JobId::LocalSuccess => f.pad("local:ok"),
            JobId::LocalFailure => f.pad("local:failed"),
            JobId::Remote(id) => f.pad(&id.to_string()),
        }
    }
}

/// Status of a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting for admission.
    #[default]
    Unsubmitted,
    /// Pending or running on the cluster.
    InProgress,
    /// Finished with a zero exit code.
    Succeeded,
    /// Finished with an error.
    Failed,
}

impl JobStatus {
    /// Check if the job is in a terminal state.
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Succeeded | JobStatus::Failed)
    }

    /// Check if the job completed successfully.
    pub fn is_success(&self) -> bool {
        matches!(self, JobStatus::Succeeded)
    }

    /// Check if the job currently holds slots.
    pub fn is_in_progress(&self) -> bool {
        matches!(self, JobStatus::InProgress)
    }

    /// Get a human-readable status name.
    pub fn name(&self) -> &'static str {
        match self {
            JobStatus::Unsubmitted => "Unsubmitted",
            JobStatus::InProgress => "InProgress",
            JobStatus::Succeeded => "Succeeded",
            JobStatus::Failed => "Failed",
        }
    }
}

/// Where admitted jobs are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Submit through bsub and track through bjobs.
    #[default]
    Cluster,
    /// Run synchronously on this machine.
    Local,
}

/// What to run, and what it costs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct JobSpec {
    /// Command line of the payload.
    pub command: Vec<String>,

    /// Slots the job occupies while running.
    #[serde(default = "default_slots")]
    pub slots: u32,

    /// File receiving combined stdout/stderr. `None` or empty means discard.
    #[serde(default)]
    pub output: Option<String>,

    /// Extra bsub flags, placed before the payload command.
    #[serde(default)]
    pub options: Vec<String>,
}

fn default_slots() -> u32 {
    1
}

impl JobSpec {
    /// Create a single-slot job with discarded output.
    pub fn new<I, S>(command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            command: command.into_iter().map(Into::into).collect(),
            slots: 1,
            output: None,
            options: Vec::new(),
        }
    }

    /// Set the slot count.
    pub fn with_slots(mut self, slots: u32) -> Self {
        self.slots = slots;
        self
    }

    /// Set the output file.
    pub fn with_output(mut self, output: impl Into<String>) -> Self {
        self.output = Some(output.into());
        self
    }

    /// Append scheduler options.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.extend(options.into_iter().map(Into::into));
        self
    }

    /// Output target, falling back to `default` when unset or empty.
    pub fn output_or<'a>(&'a self, default: &'a str) -> &'a str {
        match self.output.as_deref() {
            Some(path) if !path.is_empty() => path,
            _ => default,
        }
    }
}

/// A job owned by the queue. Its index in the queue never changes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobRecord {
    /// Position in the queue, assigned at enqueue time.
    pub index: usize,

    /// The job definition.
    pub spec: JobSpec,

    /// Identifier, set once on submission.
    pub id: JobId,

    /// Current status.
    pub status: JobStatus,

    /// When the job was submitted or run.
    pub submitted_at: Option<DateTime<Utc>>,
}

impl JobRecord {
    pub(crate) fn new(index: usize, spec: JobSpec) -> Self {
        Self {
            index,
            spec,
            id: JobId::Unsubmitted,
            status: JobStatus::Unsubmitted,
            submitted_at: None,
        }
    }

    /// Record the identifier returned by the submitter.
    ///
    /// Cluster jobs become in progress; local jobs go straight to the
    /// outcome carried by their sentinel id.
    pub(crate) fn mark_submitted(&mut self, id: JobId) {
        debug_assert!(!self.id.is_submitted(), "job {} submitted twice", self.index);
        self.id = id;
        self.status = id.initial_status();
        self.submitted_at = Some(Utc::now());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_status() {
        assert!(JobStatus::Succeeded.is_terminal());
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::InProgress.is_terminal());
        assert!(!JobStatus::Unsubmitted.is_terminal());

        assert!(JobStatus::Succeeded.is_success());
        assert!(!JobStatus::Failed.is_success());
        assert!(JobStatus::InProgress.is_in_progress());
    }

    #[test]
    fn test_initial_status_from_id() {
        assert_eq!(JobId::Unsubmitted.initial_status(), JobStatus::Unsubmitted);
        assert_eq!(JobId::LocalSuccess.initial_status(), JobStatus::Succeeded);
        assert_eq!(JobId::LocalFailure.initial_status(), JobStatus::Failed);
        assert_eq!(JobId::Remote(42).initial_status(), JobStatus::InProgress);
        assert_eq!(JobId::Remote(42).remote(), Some(42));
        assert_eq!(JobId::LocalSuccess.remote(), None);
    }

    #[test]
    fn test_job_spec_builder() {
        let spec = JobSpec::new(["sleep", "20"])
            .with_slots(4)
            .with_output("out.txt")
            .with_options(["-W", "59"]);
        assert_eq!(spec.command, vec!["sleep", "20"]);
        assert_eq!(spec.slots, 4);
        assert_eq!(spec.output_or("/dev/null"), "out.txt");
        assert_eq!(spec.options, vec!["-W", "59"]);
    }

    #[test]
    fn test_empty_output_falls_back() {
        let spec = JobSpec::new(["true"]).with_output("");
        assert_eq!(spec.output_or("/dev/null"), "/dev/null");
        let spec = JobSpec::new(["true"]);
        assert_eq!(spec.output_or("/dev/null"), "/dev/null");
    }

    #[test]
    fn test_job_spec_deserialize_defaults() {
        let spec: JobSpec = serde_json::from_str(r#"{"command": ["hostname"]}"#).unwrap();
        assert_eq!(spec.slots, 1);
        assert!(spec.output.is_none());
        assert!(spec.options.is_empty());
    }

    #[test]
    fn test_mark_submitted() {
        let mut record = JobRecord::new(0, JobSpec::new(["true"]));
        record.mark_submitted(JobId::Remote(7));
        assert_eq!(record.status, JobStatus::InProgress);
        assert!(record.submitted_at.is_some());

        let mut record = JobRecord::new(1, JobSpec::new(["false"]));
        record.mark_submitted(JobId::LocalFailure);
        assert_eq!(record.status, JobStatus::Failed);
    }
}
