//! Version command implementation.

use console::style;

/// Execute the version command.
pub fn execute() {
    let version = env!("CARGO_PKG_VERSION");

    println!(
        "{} {} - slot-budgeted job queue for LSF clusters",
        style("bqueue").cyan().bold(),
        style(format!("v{version}")).yellow()
    );
    println!();
    println!("Components:");
    println!("  bqueue-sched  Job queue, admission control and LSF adapter");
    println!("  bqueue-cli    Command-line interface");
    println!();
    println!("License:    {}", style("Apache-2.0").dim());
}
