//! YAML job manifests.
//!
//! ```yaml
//! max_slots: 5
//! max_wait_secs: 200
//! options: [-P, proj]
//! jobs:
//!   - command: [/usr/bin/sleep, "20"]
//!     slots: 2
//!     output: logs/a.txt
//! ```

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use bqueue_sched::JobSpec;

/// A batch of jobs plus the queue settings it wants.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Slot ceiling.
    #[serde(default)]
    pub max_slots: Option<u64>,

    /// Deadline in seconds.
    #[serde(default)]
    pub max_wait_secs: Option<u64>,

    /// Run every job on this machine.
    #[serde(default)]
    pub local: bool,

    /// bsub options applied to every job, ahead of the job's own.
    #[serde(default)]
    pub options: Vec<String>,

    pub jobs: Vec<JobSpec>,
}

impl Manifest {
    /// Load a manifest from a YAML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            anyhow::bail!("File not found: {}", path.display());
        }

        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("Invalid manifest: {}", path.display()))
    }

    pub fn parse(source: &str) -> Result<Self> {
        let manifest: Manifest = serde_yaml_ng::from_str(source)?;
        if manifest.jobs.is_empty() {
            anyhow::bail!("manifest contains no jobs");
        }
        Ok(manifest)
    }

    /// The jobs with the manifest-wide options applied.
    pub fn job_specs(&self) -> Vec<JobSpec> {
        self.jobs
            .iter()
            .map(|job| {
                let mut spec = job.clone();
                spec.options = self.options.iter().chain(&job.options).cloned().collect();
                spec
            })
            .collect()
    }
}
