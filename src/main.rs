use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use roster_diff::cli;

fn main() -> ExitCode {
    let cli = cli::Cli::parse();

    // Initialize logging based on verbosity flag
    let filter = if cli.verbose {
        EnvFilter::new("roster_diff=debug,info")
    } else {
        EnvFilter::new("roster_diff=warn")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .init();

    let outcome = match cli.command {
        cli::Commands::Diff(args) => cli::diff::run(args, cli.format, cli.verbose),
        cli::Commands::Track(args) => cli::track::run(args, cli.format, cli.verbose),
    };

    match outcome {
        Ok(false) => ExitCode::SUCCESS,
        Ok(true) => ExitCode::from(1),
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(2)
        }
    }
}
