//! Trawl main entry point
//!
//! This is the command-line interface for the Trawl crawler.

use anyhow::{bail, Context};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;
use trawl::config::{load_config_with_hash, Config};
use trawl::crawler::{CrawlEngine, EngineConfig, HttpFetcher};
use trawl::normalize_url;
use trawl::output::{load_statistics, print_search_results, print_statistics, print_summary};
use trawl::storage::SqliteStorage;

/// Trawl: a concurrent web crawler feeding a search index
///
/// Trawl fetches pages with a bounded pool of workers under one global
/// request rate, follows the links it finds and stores every page's title
/// and text in a SQLite database that can be searched afterwards.
#[derive(Parser, Debug)]
#[command(name = "trawl")]
#[command(version)]
#[command(about = "A concurrent web crawler feeding a search index", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Additional seed URL (repeatable)
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Stop the crawl after this many seconds
    #[arg(long, value_name = "SECS")]
    duration: Option<u64>,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["stats", "search"])]
    dry_run: bool,

    /// Show statistics from the database and exit
    #[arg(long, conflicts_with_all = ["dry_run", "search"])]
    stats: bool,

    /// Search stored pages and exit
    #[arg(long, value_name = "QUERY", conflicts_with_all = ["dry_run", "stats"])]
    search: Option<String>,

    /// Maximum number of search results
    #[arg(long, default_value_t = 10, requires = "search")]
    limit: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    // Handle different modes
    if cli.dry_run {
        handle_dry_run(&config, &cli.seeds);
    } else if cli.stats {
        handle_stats(&config)?;
    } else if let Some(query) = &cli.search {
        handle_search(&config, query, cli.limit)?;
    } else {
        handle_crawl(&config, &cli.seeds, cli.duration).await?;
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("trawl=info,warn"),
            1 => EnvFilter::new("trawl=debug,info"),
            2 => EnvFilter::new("trawl=trace,debug"),
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

/// Seeds from the config file followed by those given on the command line
fn collect_seeds(config: &Config, extra: &[String]) -> Vec<String> {
    config
        .seeds
        .urls
        .iter()
        .chain(extra)
        .cloned()
        .collect()
}

/// Handles the --dry-run mode: validates config and shows what would be crawled
fn handle_dry_run(config: &Config, extra_seeds: &[String]) {
    println!("=== Trawl Dry Run ===\n");

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.workers);
    println!("  Requests per second: {}", config.crawler.requests_per_second);
    println!("  Queue capacity: {}", config.crawler.queue_capacity);
    println!("  Fetch timeout: {}s", config.crawler.fetch_timeout_secs);
    println!("  Max body size: {} bytes", config.crawler.max_body_bytes);

    println!("\nUser Agent:");
    println!("  {}", config.user_agent.header_value());

    println!("\nOutput:");
    println!("  Database: {}", config.output.database_path);

    let seeds = collect_seeds(config, extra_seeds);
    let mut valid = 0;
    println!("\nSeed URLs ({}):", seeds.len());
    for seed in &seeds {
        match normalize_url(seed) {
            Ok(url) => {
                valid += 1;
                println!("  - {}", url);
            }
            Err(e) => println!("  - {} (invalid: {})", seed, e),
        }
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would start crawling with {} seed URLs", valid);
}

/// Handles the --stats mode: shows statistics from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);

    let storage = open_database(config)?;
    let stats = load_statistics(&storage)?;
    print_statistics(&stats);

    Ok(())
}

/// Handles the --search mode: prints the best matching stored pages
fn handle_search(config: &Config, query: &str, limit: usize) -> anyhow::Result<()> {
    let storage = open_database(config)?;
    let results = storage.search_pages(query, limit)?;
    print_search_results(query, &results);

    Ok(())
}

/// Handles the main crawl operation
///
/// Runs until Ctrl-C or until `duration` elapses, then cancels in-flight
/// work, drains the pipeline and prints the run summary.
async fn handle_crawl(
    config: &Config,
    extra_seeds: &[String],
    duration: Option<u64>,
) -> anyhow::Result<()> {
    let seeds = collect_seeds(config, extra_seeds);
    if seeds.is_empty() {
        bail!("No seed URLs: add [seeds] urls to the config or pass --seed");
    }
    tracing::info!("Total seed URLs: {}", seeds.len());

    let storage = Arc::new(open_database(config)?);
    let fetcher = Arc::new(
        HttpFetcher::new(&config.crawler, &config.user_agent)
            .context("Failed to build HTTP client")?,
    );

    let mut engine = CrawlEngine::new(EngineConfig::from(&config.crawler), fetcher, storage);
    let cancel = CancellationToken::new();
    engine.start(cancel.clone(), &seeds).await;

    let deadline = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!("Failed to listen for Ctrl-C: {}", e);
            }
            tracing::info!("Interrupted, shutting down");
        }
        _ = deadline => tracing::info!("Crawl duration elapsed, shutting down"),
    }

    cancel.cancel();
    let summary = engine.stop().await;
    print_summary(&summary);

    Ok(())
}

fn open_database(config: &Config) -> anyhow::Result<SqliteStorage> {
    let path = Path::new(&config.output.database_path);
    SqliteStorage::new(path).with_context(|| format!("Failed to open database {}", path.display()))
}
