//! Shared helpers for CLI commands.

use std::time::Duration;

use anyhow::Result;
use clap::{Args, ValueEnum};
use console::{StyledObject, style};
use indicatif::{ProgressBar, ProgressStyle};

use bqueue_sched::{JobRecord, JobStatus, LsfConfig, Progress};

/// LSF program overrides shared by every command.
#[derive(Args, Debug, Default)]
pub struct LsfArgs {
    /// bsub executable
    #[arg(long, env = "BQUEUE_BSUB", global = true)]
    pub bsub: Option<String>,

    /// bjobs executable
    #[arg(long, env = "BQUEUE_BJOBS", global = true)]
    pub bjobs: Option<String>,
}

impl LsfArgs {
    pub fn into_config(self) -> LsfConfig {
        let mut config = LsfConfig::default();
        if let Some(bsub) = self.bsub {
            config.bsub_program = bsub;
        }
        if let Some(bjobs) = self.bjobs {
            config.bjobs_program = bjobs;
        }
        config
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
}

/// Progress bar fed by the queue and the waiter.
pub struct BarProgress {
    bar: ProgressBar,
}

impl BarProgress {
    pub fn new(total: usize, message: &str) -> Result<Self> {
        let bar = ProgressBar::new(total as u64);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("=> "),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Ok(Self { bar })
    }
}

impl Progress for BarProgress {
    fn update(&mut self, newly_finished: usize) {
        self.bar.inc(newly_finished as u64);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}

/// Colour a status the same way everywhere.
pub fn styled_status(status: JobStatus) -> StyledObject<&'static str> {
    let name = status.name();
    match status {
        JobStatus::Succeeded => style(name).green(),
        JobStatus::Failed => style(name).red(),
        JobStatus::InProgress => style(name).cyan(),
        JobStatus::Unsubmitted => style(name).yellow(),
    }
}

/// Count of jobs per final status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub succeeded: usize,
    pub failed: usize,
    pub unfinished: usize,
}

impl Tally {
    pub fn of(statuses: impl IntoIterator<Item = JobStatus>) -> Self {
        let mut tally = Self::default();
        for status in statuses {
            match status {
                JobStatus::Succeeded => tally.succeeded += 1,
                JobStatus::Failed => tally.failed += 1,
                JobStatus::InProgress | JobStatus::Unsubmitted => tally.unfinished += 1,
            }
        }
        tally
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0 && self.unfinished == 0
    }

    pub fn print(&self) {
        println!(
            "\n  {} succeeded, {} failed, {} unfinished",
            style(self.succeeded).green().bold(),
            style(self.failed).red().bold(),
            style(self.unfinished).yellow().bold()
        );
    }
}

/// Print queue records as a table or as JSON.
pub fn print_records(records: &[JobRecord], format: OutputFormat) -> Result<()> {
    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(records)?);
        return Ok(());
    }

    println!(
        "  {:<6}  {:<14}  {:<6}  {:<12}  {:<20}  {}",
        style("INDEX").bold(),
        style("JOB ID").bold(),
        style("SLOTS").bold(),
        style("STATUS").bold(),
        style("SUBMITTED").bold(),
        style("COMMAND").bold()
    );
    println!("  {}", "-".repeat(90));

    for record in records {
        let submitted = record
            .submitted_at
            .map(|at| at.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  {:<6}  {:<14}  {:<6}  {:<12}  {:<20}  {}",
            record.index,
            style(record.id).dim(),
            record.spec.slots,
            styled_status(record.status),
            submitted,
            record.spec.command.join(" ")
        );
    }
    Ok(())
}
