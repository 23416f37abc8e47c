//! Selftest command implementation.
//!
//! Ten 20 second sleeps under a five-slot ceiling should finish in two waves,
//! well within the 200 second deadline.

use std::time::{Duration, Instant};

use anyhow::Result;
use console::style;

use bqueue_sched::{JobQueue, JobSpec, LsfConfig, QueueConfig};

use super::common::{BarProgress, OutputFormat, Tally, print_records};

const JOBS: usize = 10;
const MAX_SLOTS: u64 = 5;
const MAX_WAIT: Duration = Duration::from_secs(200);

/// The job every selftest run submits.
pub fn selftest_job() -> JobSpec {
    JobSpec::new(["/usr/bin/sleep", "20"]).with_options(["-W", "59", "-J", "test-bqueue"])
}

pub fn selftest_config(local: bool, lsf: LsfConfig) -> QueueConfig {
    let config = if local {
        QueueConfig::local()
    } else {
        QueueConfig::default()
    };
    QueueConfig { lsf, ..config }
        .with_max_slots(MAX_SLOTS)
        .with_max_wait(MAX_WAIT)
}

/// Execute the selftest command.
pub async fn execute(local: bool, lsf: LsfConfig) -> Result<()> {
    let mut queue = JobQueue::new(selftest_config(local, lsf))?;
    for _ in 0..JOBS {
        queue.enqueue(selftest_job())?;
    }

    println!(
        "{} Self-test: {} x `/usr/bin/sleep 20` with {} slots{}",
        style("→").cyan().bold(),
        JOBS,
        MAX_SLOTS,
        if local { " (local)" } else { "" }
    );

    let start = Instant::now();
    let mut progress = BarProgress::new(JOBS, "jobs finished")?;
    let statuses = queue.run(&mut progress).await?;
    println!("  Elapsed: {:.1}s\n", start.elapsed().as_secs_f64());

    print_records(queue.jobs(), OutputFormat::Table)?;
    if !Tally::of(statuses).all_succeeded() {
        anyhow::bail!("Test failed.");
    }
    println!("\n{} Test passed.", style("✓").green().bold());
    Ok(())
}

#[cfg(test)]
mod tests {
    use bqueue_sched::ExecutionMode;

    use super::*;

    #[test]
    fn test_selftest_config() {
        let config = selftest_config(false, LsfConfig::default());
        assert_eq!(config.mode, ExecutionMode::Cluster);
        assert_eq!(config.max_slots, Some(5));
        assert_eq!(config.max_wait_secs, Some(200));

        assert_eq!(
            selftest_config(true, LsfConfig::default()).mode,
            ExecutionMode::Local
        );
    }

    #[test]
    fn test_selftest_job() {
        let job = selftest_job();
        assert_eq!(job.slots, 1);
        assert_eq!(job.output, None);
        assert_eq!(job.options, vec!["-W", "59", "-J", "test-bqueue"]);
    }
}
