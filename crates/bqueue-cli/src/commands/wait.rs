//! Wait command implementation.
//!
//! Poll jobs until none of them is pending or running.

use anyhow::Result;
use console::style;

use bqueue_sched::{JobId, JobStatus, LsfConfig, WaitConfig, Waiter};

use super::common::{BarProgress, Tally, styled_status};

/// Execute the wait command.
pub async fn execute(
    ids: &[u64],
    timeout: Option<u64>,
    poll_interval: u64,
    lsf: LsfConfig,
) -> Result<()> {
    let config = WaitConfig {
        poll_interval_secs: poll_interval,
        max_wait_secs: timeout,
        lsf,
    };
    let waiter = Waiter::new(config)?;
    let job_ids: Vec<JobId> = ids.iter().copied().map(JobId::Remote).collect();

    println!(
        "{} Waiting for {} job(s) (timeout: {})",
        style("→").cyan().bold(),
        ids.len(),
        timeout.map_or_else(|| "none".to_string(), |t| format!("{t}s"))
    );

    let mut progress = BarProgress::new(ids.len(), "jobs finished")?;
    let statuses = waiter.wait(&job_ids, &mut progress).await?;

    for (id, status) in ids.iter().zip(&statuses) {
        println!("  {:<14}  {}", style(id).dim(), styled_status(*status));
    }

    let tally = Tally::of(statuses.iter().copied());
    tally.print();
    if tally.unfinished > 0 {
        let still_running: Vec<String> = ids
            .iter()
            .zip(&statuses)
            .filter(|(_, status)| **status == JobStatus::InProgress)
            .map(|(id, _)| id.to_string())
            .collect();
        anyhow::bail!(
            "Timeout. Still running: {}. Use 'bqueue status {}' to check later.",
            still_running.join(", "),
            still_running.join(" ")
        );
    }
    if tally.failed > 0 {
        anyhow::bail!("{} job(s) failed", tally.failed);
    }
    Ok(())
}
