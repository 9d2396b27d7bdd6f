//! `configmgr` - layered configuration manager

use clap::Parser;

use configmgr::cli::args::Cli;
use configmgr::cli::commands;
use configmgr::error::ExitCode;
use configmgr::observability::{init_logging, init_metrics};

fn main() {
    let cli = Cli::parse();

    if !cli.quiet {
        init_logging(cli.log_format.into(), cli.verbose, cli.color);
    }

    let metrics = if cli.metrics {
        init_metrics()
            .inspect_err(|e| tracing::warn!(error = %e, "metrics recorder not installed"))
            .ok()
    } else {
        None
    };

    let result = commands::dispatch(cli);

    if let Some(handle) = metrics {
        eprint!("{}", handle.render());
    }

    match result {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            if e.is_usage() {
                eprintln!("hint: run 'configmgr help' for the expected arguments");
            }
            std::process::exit(e.exit_code());
        }
    }
}
