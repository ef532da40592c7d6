use clap::Parser;
use colored::*;
use insighthub::cli::Cli;
use insighthub::{load_config, run_with_config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let args = Cli::parse();

    // Config is merged first so a `verbose` key in the file sets the log level
    let result = match load_config(&args) {
        Ok((config, args)) => {
            init_tracing(args.verbose);
            run_with_config(config, args).await
        }
        Err(e) => Err(e),
    };

    if let Err(e) = result {
        eprintln!("{} {}", "Error:".bright_red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "insighthub=info"
    } else {
        "insighthub=warn"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
