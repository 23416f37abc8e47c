//! Status command implementation.
//!
//! Query LSF once for a list of job ids.

use anyhow::Result;
use console::style;
use serde::Serialize;

use bqueue_sched::{JobStatus, LsfAdapter, LsfConfig};

use super::common::{OutputFormat, styled_status};

#[derive(Debug, Serialize)]
struct StatusRow {
    id: u64,
    state: &'static str,
    status: JobStatus,
}

/// Execute the status command.
pub async fn execute(ids: &[u64], format: OutputFormat, lsf: LsfConfig) -> Result<()> {
    let adapter = LsfAdapter::new(lsf)?;
    let states = adapter.bjobs(ids).await?;

    let rows: Vec<StatusRow> = ids
        .iter()
        .zip(&states)
        .map(|(id, state)| StatusRow {
            id: *id,
            state: state.to_code(),
            status: state.status(),
        })
        .collect();

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} {} job(s):\n", style("→").cyan().bold(), rows.len());
    println!(
        "  {:<14}  {:<8}  {}",
        style("JOB ID").bold(),
        style("LSF").bold(),
        style("STATUS").bold()
    );
    println!("  {}", "-".repeat(40));

    for row in &rows {
        println!(
            "  {:<14}  {:<8}  {}",
            style(row.id).dim(),
            row.state,
            styled_status(row.status)
        );
    }

    Ok(())
}
