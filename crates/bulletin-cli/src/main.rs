//! bulletin CLI — the user-facing command-line interface.

use std::path::PathBuf;
use std::process;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bulletin", version, about = "School grade indicator engine")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyse a roster and write reports
    Analyze {
        /// Path to a .csv/.toml roster or a directory of rosters
        #[arg(long)]
        roster: PathBuf,

        /// Semester label (e.g. "S1")
        #[arg(long)]
        semester: String,

        /// Level label (e.g. "4AM")
        #[arg(long)]
        level: String,

        /// Config file path
        #[arg(long)]
        config: Option<PathBuf>,

        /// Output directory (default: from config)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Output format: json, html, csv, all (comma-separated)
        #[arg(long)]
        format: Option<String>,
    },

    /// Compare two analysis reports
    Compare {
        /// Baseline report JSON
        #[arg(long)]
        baseline: PathBuf,

        /// Current report JSON
        #[arg(long)]
        current: PathBuf,

        /// Change in a subject mean (points) below which it counts as unchanged
        #[arg(long, default_value = "0.5")]
        threshold: f64,

        /// Exit code 1 if regressions found
        #[arg(long)]
        fail_on_regression: bool,

        /// Output format: text, json, markdown
        #[arg(long, default_value = "text")]
        format: String,
    },

    /// Validate roster files
    Validate {
        /// Path to roster file or directory
        #[arg(long)]
        roster: PathBuf,
    },

    /// Create starter config and example roster
    Init,
}

fn main() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("bulletin=info".parse().unwrap()),
        )
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Analyze {
            roster,
            semester,
            level,
            config,
            output,
            format,
        } => commands::analyze::execute(roster, semester, level, config, output, format),
        Commands::Compare {
            baseline,
            current,
            threshold,
            fail_on_regression,
            format,
        } => commands::compare::execute(baseline, current, threshold, fail_on_regression, format),
        Commands::Validate { roster } => commands::validate::execute(roster),
        Commands::Init => commands::init::execute(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        process::exit(1);
    }
}
