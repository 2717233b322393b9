mod commands;
mod config;
mod diagnostics;
mod error;
mod external;
mod line_identifier;
mod parameters;
mod reference;
mod types;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "coderef", about = "Resolve code reference directives into excerpts and remote metadata")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
    /// Log debug detail to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Look up metadata for a remote file URL
    Info {
        /// URL of the remote file
        url: String,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Parse a directive and print its normalized parameters
    Parse {
        /// Directive file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Parse a directive and resolve it into an excerpt or remote reference
    Resolve {
        /// Directive file; reads stdin when omitted or `-`
        file: Option<PathBuf>,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match &cli.command {
        Commands::Info { url, json } => commands::cmd_info(url, *json),
        Commands::Parse { file, json } => commands::cmd_parse(file.as_deref(), *json),
        Commands::Resolve { file, json } => commands::cmd_resolve(file.as_deref(), *json),
    };

    return match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}

/// Send `tracing` output to stderr. `RUST_LOG` wins unless `--verbose` is set.
fn init_logging(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("coderef=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| return EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
