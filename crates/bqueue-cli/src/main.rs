//! bqueue Command-Line Interface
//!
//! Runs batches of jobs on an LSF cluster under a slot ceiling, or on this
//! machine, and inspects jobs that are already queued.
//!
//! ```text
//! bqueue run jobs.yaml --max-slots 5
//! bqueue submit -n 4 -O -W -O 30 -- ./simulate --seed 7
//! bqueue status 4711 4712
//! bqueue wait 4711 4712 --timeout 3600
//! bqueue selftest --local
//! ```

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

use clap::{Args, Parser, Subcommand};
use console::style;
use tracing_subscriber::EnvFilter;

mod commands;

use commands::common::{LsfArgs, OutputFormat};
use commands::{run, selftest, status, submit, version, wait};

/// bqueue - slot-budgeted job queue for LSF clusters
#[derive(Parser, Debug)]
#[command(name = "bqueue")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(flatten)]
    lsf: LsfArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run every job of a manifest under a slot ceiling
    Run(RunArgs),

    /// Submit a single job through bsub
    Submit {
        /// Slots the job occupies
        #[arg(short = 'n', long, default_value = "1")]
        slots: u32,

        /// File receiving the job's output (discarded if omitted)
        #[arg(short, long)]
        output: Option<String>,

        /// Extra bsub option, may be repeated (e.g. -O -W -O 59)
        #[arg(short = 'O', long = "option", allow_hyphen_values = true)]
        options: Vec<String>,

        /// Run the job here instead of submitting it
        #[arg(long)]
        local: bool,

        /// Command line of the job
        #[arg(last = true, required = true)]
        command: Vec<String>,
    },

    /// Show the LSF state of jobs
    Status {
        /// LSF job ids
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "table")]
        format: OutputFormat,
    },

    /// Wait for jobs to leave the running states
    Wait {
        /// LSF job ids
        #[arg(required = true)]
        ids: Vec<u64>,

        /// Give up after this many seconds
        #[arg(short, long)]
        timeout: Option<u64>,

        /// Seconds between bjobs polls
        #[arg(long, default_value = "10")]
        poll_interval: u64,
    },

    /// Run ten short sleep jobs under a five-slot ceiling
    Selftest {
        /// Run the jobs on this machine
        #[arg(long)]
        local: bool,
    },

    /// Show version information
    Version,
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Job manifest (YAML)
    manifest: String,

    /// Slot ceiling, overrides the manifest
    #[arg(short = 'n', long, env = "BQUEUE_MAX_SLOTS")]
    max_slots: Option<u64>,

    /// Give up after this many seconds, overrides the manifest
    #[arg(short, long)]
    timeout: Option<u64>,

    /// Run every job on this machine
    #[arg(long)]
    local: bool,

    /// Seconds between polling ticks
    #[arg(long, default_value = "1")]
    poll_interval: u64,

    /// Report format
    #[arg(short, long, value_enum, default_value = "table")]
    format: OutputFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();

    let lsf = cli.lsf.into_config();

    // Execute command
    let result = match cli.command {
        Commands::Run(args) => {
            let overrides = run::Overrides {
                max_slots: args.max_slots,
                timeout: args.timeout,
                local: args.local,
                poll_interval: args.poll_interval,
            };
            run::execute(&args.manifest, overrides, lsf, args.format).await
        }

        Commands::Submit {
            slots,
            output,
            options,
            local,
            command,
        } => submit::execute(command, slots, output, options, local, lsf).await,

        Commands::Status { ids, format } => status::execute(&ids, format, lsf).await,

        Commands::Wait {
            ids,
            timeout,
            poll_interval,
        } => wait::execute(&ids, timeout, poll_interval, lsf).await,

        Commands::Selftest { local } => selftest::execute(local, lsf).await,

        Commands::Version => {
            version::execute();
            Ok(())
        }
    };

    // Handle errors
    if let Err(e) = result {
        eprintln!("{} {}", style("Error:").red().bold(), e);
        if e
            .downcast_ref::<bqueue_sched::SchedError>()
            .is_some_and(bqueue_sched::SchedError::is_protocol_error)
        {
            eprintln!(
                "  {}",
                style("The scheduler's reply was not understood; check that bsub/bjobs are LSF.")
                    .dim()
            );
        }
        std::process::exit(1);
    }

    Ok(())
}
