//! Submit command implementation.

use std::sync::Arc;

use anyhow::Result;
use console::style;

use bqueue_sched::{ExecutionMode, JobId, JobSpec, LsfAdapter, LsfConfig, Submitter, SystemRunner};

/// Execute the submit command.
pub async fn execute(
    command: Vec<String>,
    slots: u32,
    output: Option<String>,
    options: Vec<String>,
    local: bool,
    lsf: LsfConfig,
) -> Result<()> {
    if slots == 0 {
        anyhow::bail!("--slots must be at least 1");
    }

    let mut spec = JobSpec::new(command).with_slots(slots).with_options(options);
    if let Some(output) = output {
        spec = spec.with_output(output);
    }

    let mode = if local {
        ExecutionMode::Local
    } else {
        ExecutionMode::Cluster
    };
    let submitter = Submitter::new(
        Arc::new(LsfAdapter::new(lsf)?),
        Arc::new(SystemRunner),
        mode,
    );

    println!(
        "{} Submitting `{}` ({} slot(s))",
        style("→").cyan().bold(),
        style(spec.command.join(" ")).green(),
        slots
    );

    match submitter.submit(&spec).await? {
        JobId::Remote(id) => {
            println!("{} Submitted as job {}", style("✓").green().bold(), style(id).yellow());
        }
        JobId::LocalSuccess => println!("{} Job succeeded", style("✓").green().bold()),
        JobId::LocalFailure => anyhow::bail!("job failed"),
        JobId::Unsubmitted => anyhow::bail!("job was not submitted"),
    }
    Ok(())
}
