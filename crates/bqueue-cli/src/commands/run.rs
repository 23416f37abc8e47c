//! Run command implementation.
//!
//! Load a manifest, drive it through a [`JobQueue`] and report the outcome.

use std::time::Instant;

use anyhow::Result;
use console::style;

use bqueue_sched::{ExecutionMode, JobQueue, LsfConfig, QueueConfig};

use super::common::{BarProgress, OutputFormat, Tally, print_records};
use super::manifest::Manifest;

/// Command-line values that take precedence over the manifest.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub max_slots: Option<u64>,
    pub timeout: Option<u64>,
    pub local: bool,
    pub poll_interval: u64,
}

/// Merge manifest settings and overrides into a queue configuration.
pub fn queue_config(manifest: &Manifest, overrides: &Overrides, lsf: LsfConfig) -> QueueConfig {
    let mode = if overrides.local || manifest.local {
        ExecutionMode::Local
    } else {
        ExecutionMode::Cluster
    };

    QueueConfig {
        mode,
        max_slots: overrides.max_slots.or(manifest.max_slots),
        poll_interval_secs: overrides.poll_interval,
        max_wait_secs: overrides.timeout.or(manifest.max_wait_secs),
        lsf,
    }
}

/// Execute the run command.
pub async fn execute(
    manifest_path: &str,
    overrides: Overrides,
    lsf: LsfConfig,
    format: OutputFormat,
) -> Result<()> {
    let manifest = Manifest::load(manifest_path)?;
    let config = queue_config(&manifest, &overrides, lsf);
    tracing::debug!("Queue configuration: {:?}", config);

    println!(
        "{} Running {} job(s) from {} ({}, {} slot(s))",
        style("→").cyan().bold(),
        manifest.jobs.len(),
        style(manifest_path).green(),
        match config.mode {
            ExecutionMode::Cluster => "cluster",
            ExecutionMode::Local => "local",
        },
        style(
            config
                .max_slots
                .map_or_else(|| "unlimited".to_string(), |n| n.to_string())
        )
        .yellow()
    );

    let mut queue = JobQueue::new(config)?;
    for spec in manifest.job_specs() {
        queue.enqueue(spec)?;
    }

    let start = Instant::now();
    let mut progress = BarProgress::new(queue.len(), "jobs finished")?;
    let statuses = queue.run(&mut progress).await?;

    println!(
        "{} Queue stopped after {:.1}s\n",
        style("✓").green().bold(),
        start.elapsed().as_secs_f64()
    );
    print_records(queue.jobs(), format)?;

    let tally = Tally::of(statuses);
    if format == OutputFormat::Table {
        tally.print();
    }
    if !tally.all_succeeded() {
        anyhow::bail!(
            "{} of {} job(s) did not succeed",
            tally.failed + tally.unfinished,
            queue.len()
        );
    }
    Ok(())
}
