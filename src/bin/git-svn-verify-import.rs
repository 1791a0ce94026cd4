//! # git-svn-verify-import
//!
//! Verifies a Git repository after a Subversion import by comparing every
//! imported revision with the commits it produced.
//!
//! ## Usage
//! ```bash
//! # Compare tree listings (fast, needs svn-ls-tree on PATH)
//! git-svn-verify-import --svn-path /srv/svn/project --git-path project.git \
//!     --marks git-marks --rev-marks svn-rev-marks
//!
//! # Check out both sides and compare files on disk
//! git-svn-verify-import --svn-path /srv/svn/project --git-path project.git \
//!     --marks git-marks --rev-marks svn-rev-marks --mode checkout --ignore-path vendor
//! ```

use clap::{Parser, ValueEnum};
use colored::*;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use verify_import::{
    ComparisonMode, JsonReporter, ReportSink, RunSummary, TapReporter, VerifyConfig, VerifyError,
};

/// Verifies Git repository after import
#[derive(Parser)]
#[command(name = "git-svn-verify-import")]
#[command(version)]
#[command(about = "Verifies Git repository after import")]
#[command(long_about = None)]
struct Cli {
    /// Subversion repository path
    #[arg(long)]
    svn_path: PathBuf,

    /// Git repository path
    #[arg(long)]
    git_path: PathBuf,

    /// Git marks file exported by fast-import
    #[arg(long)]
    marks: PathBuf,

    /// Subversion revision marks file
    #[arg(long)]
    rev_marks: PathBuf,

    /// Path to ignore, relative to each branch root (repeatable)
    #[arg(long = "ignore-path")]
    ignored: Vec<String>,

    /// How trees are compared
    #[arg(long, value_enum, default_value = "listing")]
    mode: Mode,

    /// Subversion checkout directory for --mode checkout
    #[arg(long)]
    svn_workdir: Option<PathBuf>,

    /// Git checkout directory for --mode checkout
    #[arg(long)]
    git_workdir: Option<PathBuf>,

    /// Tree listing program for the Subversion side
    #[arg(long, default_value = "svn-ls-tree")]
    svn_ls_tree: String,

    /// External checksum program (e.g. sha1sum); SHA-256 in-process by default
    #[arg(long)]
    checksum_command: Option<String>,

    /// Report format
    #[arg(long, value_enum, default_value = "tap")]
    format: Format,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Exit with status 1 if any pair differs
    #[arg(long)]
    strict: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Mode {
    Listing,
    Checkout,
}

#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
enum Format {
    Tap,
    Json,
}

fn main() {
    let cli = Cli::parse();

    // Set up logging; stdout is reserved for the report
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    // Disable colors if needed
    if cli.no_color || std::env::var("NO_COLOR").is_ok() {
        colored::control::set_override(false);
    }

    match run(&cli) {
        Ok(summary) => {
            if cli.strict && !summary.all_ok() {
                std::process::exit(1);
            }
        }
        Err(e) => {
            let message = match e.downcast_ref::<VerifyError>() {
                Some(err) => err.user_message(),
                None => format!("{:#}", e),
            };
            eprintln!("{}: {}", "Error".red().bold(), message);
            std::process::exit(1);
        }
    }
}

/// Build the configuration and run it against the chosen report format
fn run(cli: &Cli) -> anyhow::Result<RunSummary> {
    let mut config = VerifyConfig::new(&cli.svn_path, &cli.git_path, &cli.marks, &cli.rev_marks)
        .ignore_paths(&cli.ignored)
        .svn_ls_tree(&cli.svn_ls_tree)
        .mode(match cli.mode {
            Mode::Listing => ComparisonMode::Listing,
            Mode::Checkout => ComparisonMode::Checkout,
        });

    if let Some(dir) = &cli.svn_workdir {
        config = config.svn_workdir(dir);
    }
    if let Some(dir) = &cli.git_workdir {
        config = config.git_workdir(dir);
    }
    if let Some(program) = &cli.checksum_command {
        config = config.checksum_command(program);
    }

    let stdout = io::stdout();
    let color = !cli.no_color && stdout.is_terminal();
    let mut sink: Box<dyn ReportSink> = match cli.format {
        Format::Tap => Box::new(TapReporter::new(stdout.lock(), color)),
        Format::Json => Box::new(JsonReporter::new(stdout.lock())),
    };

    Ok(config.run(&mut sink)?)
}
