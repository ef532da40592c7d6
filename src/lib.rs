pub mod analyzer;
pub mod cli;
pub mod comparator;
pub mod config;
pub mod crawl_client;
pub mod dashboard;
pub mod error;
pub mod http_client;
pub mod keyword_client;
pub mod llm_client;
pub mod models;
pub mod pdf;
pub mod recommendations;
pub mod reporter;
pub mod scoring;

use analyzer::Analyzer;
use anyhow::Result;
use cli::Cli;
use colored::*;
use config::{ApiSettings, Config};
use models::{AnalysisRequest, MAX_COMPETITORS};
use reporter::Reporter;
use std::io::IsTerminal;
use std::path::Path;

/// Loads the config file (`--config`, else the default paths) and merges it
/// with the command line. The returned `Cli` holds the effective options.
pub fn load_config(args: &Cli) -> Result<(Config, Cli)> {
    let config = match &args.config {
        Some(path) => Config::from_file(Path::new(path))?,
        None => Config::from_default_paths()?.unwrap_or_default(),
    };
    let merged = config.merge_with_cli(args);
    Ok((config, merged))
}

pub async fn run(args: Cli) -> Result<()> {
    let (config, args) = load_config(&args)?;
    run_with_config(config, args).await
}

/// Runs one analysis with an already merged config and command line
pub async fn run_with_config(config: Config, args: Cli) -> Result<()> {

    let json_output = args.output == "json";
    if !json_output {
        println!("{}", "InsightHub - SEO Analysis".bright_cyan().bold());
        println!("{}", "=".repeat(50).bright_blue());
        println!();
    }

    // Rejected before any network call
    let request = AnalysisRequest::new(
        &args.url,
        &args.competitors,
        args.keywords.as_deref().unwrap_or(""),
    )?;

    if !json_output {
        println!(
            "{} {}",
            "Analyzing:".bright_white().bold(),
            request.primary_url()
        );
        if !request.competitor_urls().is_empty() {
            println!(
                "{} {} (max {})",
                "Competitors:".bright_white().bold(),
                request.competitor_urls().join(", "),
                MAX_COMPETITORS
            );
        }
        if !request.keywords().is_empty() {
            println!(
                "{} {}",
                "Keywords:".bright_white().bold(),
                request.keywords().join(", ")
            );
        }
        println!();
    }

    let settings = ApiSettings::resolve(&config, args.timeout);
    let mut analyzer = Analyzer::new(&settings, !args.no_ai)?;
    if !json_output && std::io::stderr().is_terminal() {
        analyzer.enable_progress_bar();
    }

    let report = analyzer.analyze(&request).await;

    match args.output.as_str() {
        "json" => println!("{}", Reporter::to_json(&report)?),
        _ => Reporter::print_text_report(&report),
    }

    if let Some(filename) = &args.save {
        Reporter::save_json_report(&report, filename)?;
        if !json_output {
            println!("Report saved to: {}", filename.bright_green());
        }
    }

    if let Some(filename) = &args.html {
        dashboard::save(&report, filename)?;
        if !json_output {
            println!("Dashboard saved to: {}", filename.bright_green());
        }
    }

    if let Some(filename) = &args.pdf {
        pdf::save(&report, filename)?;
        if !json_output {
            println!("PDF saved to: {}", filename.bright_green());
        }
    }

    Ok(())
}
