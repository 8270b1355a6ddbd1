//! Sumi-Harvest main entry point
//!
//! This is the command-line interface for the Sumi-Harvest structured-data scraper.

use anyhow::Context;
use clap::Parser;
use std::path::{Path, PathBuf};
use sumi_harvest::config::{load_config_with_hash, Config, JobConfig};
use sumi_harvest::crawler::run_job;
use sumi_harvest::output::{print_statistics, write_csv, write_json};
use sumi_harvest::Record;
use tracing_subscriber::EnvFilter;

/// Sumi-Harvest: A polite structured-data scraper
///
/// Sumi-Harvest fetches pages described by a TOML job file, extracts records
/// with CSS selectors, and exports them as JSON or CSV while respecting
/// robots.txt, rate limits and retry budgets.
#[derive(Parser, Debug)]
#[command(name = "sumi-harvest")]
#[command(version)]
#[command(about = "A polite structured-data scraper", long_about = None)]
struct Cli {
    /// Path to TOML job file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate the job and show what would be scraped without fetching anything
    #[arg(long)]
    dry_run: bool,

    /// Write records as JSON to this path (overrides `output.json-path`)
    #[arg(long, value_name = "PATH")]
    json: Option<PathBuf>,

    /// Write records as CSV to this path (overrides `output.csv-path`)
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading job from: {}", cli.config.display());
    let (config, hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load job file {}", cli.config.display()))?;
    tracing::info!("Job loaded successfully (hash: {})", hash);

    if cli.dry_run {
        handle_dry_run(&config);
        return Ok(());
    }

    let json_path = cli
        .json
        .or_else(|| config.output.json_path.as_ref().map(PathBuf::from));
    let csv_path = cli
        .csv
        .or_else(|| config.output.csv_path.as_ref().map(PathBuf::from));

    handle_scrape(&config, json_path.as_deref(), csv_path.as_deref()).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("sumi_harvest=info,warn"),
            1 => EnvFilter::new("sumi_harvest=debug,info"),
            2 => EnvFilter::new("sumi_harvest=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Handles the --dry-run mode: shows the validated job
fn handle_dry_run(config: &Config) {
    println!("=== Sumi-Harvest Dry Run ===\n");

    println!("Fetcher:");
    println!("  User agent: {}", config.fetcher.user_agent);
    println!("  Timeout: {}s", config.fetcher.timeout_secs);
    for (name, value) in &config.fetcher.headers {
        println!("  Header: {}: {}", name, value);
    }

    println!("\nPoliteness:");
    println!("  Page delay: {}ms", config.politeness.page_delay_ms);
    match config.politeness.calls_per_second {
        Some(rate) => println!("  Rate limit: {} calls/sec", rate),
        None => println!("  Rate limit: off"),
    }
    if config.politeness.respect_robots {
        println!(
            "  robots.txt: respected as '{}' ({:?})",
            config.robots_agent(),
            config.politeness.robots_precedence
        );
    } else {
        println!("  robots.txt: ignored");
    }
    match &config.retry {
        Some(retry) => println!(
            "  Retry: {} attempts, {}ms initial delay, x{} backoff",
            retry.max_attempts, retry.initial_delay_ms, retry.backoff
        ),
        None => println!("  Retry: off"),
    }
    match &config.cache {
        Some(cache) => println!(
            "  Cache: {} entries, {}s max age",
            cache.capacity, cache.max_age_secs
        ),
        None => println!("  Cache: off"),
    }

    println!("\nJob ({}):", config.job.mode_name());
    match &config.job {
        JobConfig::Pages { urls } => {
            for url in urls {
                println!("  * {}", url);
            }
        }
        JobConfig::Paginate {
            start_url,
            next_selector,
            max_pages,
        } => {
            println!("  Start: {}", start_url);
            println!("  Next link: {}", next_selector);
            println!("  Max pages: {}", max_pages);
        }
        JobConfig::ListDetail {
            list_url,
            item_selector,
            link_selector,
            max_items,
        } => {
            println!("  Listing: {}", list_url);
            println!("  Items: {} -> {}", item_selector, link_selector);
            println!("  Max items: {}", max_items);
        }
    }

    println!("\nFields ({}):", config.fields.len());
    for field in &config.fields {
        println!("  - {} ({})", field.name, field.spec.mode_name());
    }

    println!("\n✓ Job is valid");
}

/// Handles the main scrape operation
async fn handle_scrape(
    config: &Config,
    json_path: Option<&Path>,
    csv_path: Option<&Path>,
) -> anyhow::Result<()> {
    let (pages, mut stats) = run_job(config).await.context("Scrape failed")?;

    let records: Vec<Record> = pages.iter().map(|page| page.to_record()).collect();
    stats.records_written = records.len() as u64;

    if let Some(path) = json_path {
        write_json(&records, path)
            .with_context(|| format!("Failed to write JSON to {}", path.display()))?;
    }
    if let Some(path) = csv_path {
        write_csv(&records, path)
            .with_context(|| format!("Failed to write CSV to {}", path.display()))?;
    }
    if json_path.is_none() && csv_path.is_none() {
        tracing::warn!("No output path configured; records were not saved");
    }

    print_statistics(&stats);
    Ok(())
}
