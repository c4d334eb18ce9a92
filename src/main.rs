//! Leadscout main entry point
//!
//! This is the command-line interface for the Leadscout lead crawler.

use anyhow::{bail, Context};
use clap::{Parser, ValueEnum};
use leadscout::config::{load_config_with_hash, Config};
use leadscout::crawler::{CancellationFlag, CrawlReport, CrawlTask, Crawler};
use leadscout::pipeline::{LeadPipeline, ScoredLead};
use leadscout::storage::{open_store, LeadSink};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

/// Leadscout: a polite lead crawler and scorer
///
/// Leadscout crawls company websites while respecting robots.txt and
/// per-host rate limits, extracts lead attributes, enriches them and scores
/// them against your ideal customer profile.
#[derive(Parser, Debug)]
#[command(name = "leadscout")]
#[command(version = "1.0.0")]
#[command(about = "A polite lead crawler and scorer", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(value_name = "CONFIG")]
    config: PathBuf,

    /// How the crawl is seeded and what it collects
    #[arg(short, long, value_enum, default_value_t = Mode::Crawl)]
    mode: Mode,

    /// Seed URL (single, crawl and map modes)
    #[arg(long)]
    url: Option<String>,

    /// Search query (search mode)
    #[arg(long)]
    query: Option<String>,

    /// Target industry (discover mode)
    #[arg(long)]
    industry: Option<String>,

    /// Target location (discover mode)
    #[arg(long)]
    location: Option<String>,

    /// Maximum number of pages to fetch
    #[arg(long)]
    max_pages: Option<usize>,

    /// Maximum link depth from the seeds
    #[arg(long)]
    max_depth: Option<u32>,

    /// Follow links to other hosts too
    #[arg(long)]
    any_domain: bool,

    /// Only follow links matching one of these regexes
    #[arg(long = "include", value_name = "REGEX")]
    include: Vec<String>,

    /// Never follow links matching these regexes
    #[arg(long = "exclude", value_name = "REGEX")]
    exclude: Vec<String>,

    /// Search results to crawl (search mode)
    #[arg(long, default_value_t = 10)]
    num_results: usize,

    /// Leads to collect (discover mode)
    #[arg(long, default_value_t = 10)]
    num_leads: usize,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and task and show what would be crawled
    #[arg(long, conflicts_with = "stats")]
    dry_run: bool,

    /// Show the latest run and its leads from the database and exit
    #[arg(long, conflicts_with = "dry_run")]
    stats: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Mode {
    Single,
    Crawl,
    Map,
    Search,
    Discover,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    if cli.stats {
        return handle_stats(&config);
    }

    let task = build_task(&cli, &config)?;
    task.validate().context("invalid crawl task")?;

    if cli.dry_run {
        handle_dry_run(&config, &task);
        return Ok(());
    }

    handle_crawl(&config, &config_hash, &task).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("leadscout=info,warn"),
            1 => EnvFilter::new("leadscout=debug,info"),
            2 => EnvFilter::new("leadscout=trace,debug"),
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

/// Builds the crawl task from the command line
///
/// Without an explicit page or depth bound the configured defaults apply.
fn build_task(cli: &Cli, config: &Config) -> anyhow::Result<CrawlTask> {
    let required = |value: &Option<String>, flag: &str| -> anyhow::Result<String> {
        match value {
            Some(v) if !v.trim().is_empty() => Ok(v.clone()),
            _ => bail!("--{} is required in {:?} mode", flag, cli.mode),
        }
    };

    let mut task = match cli.mode {
        Mode::Single => CrawlTask::single(required(&cli.url, "url")?),
        Mode::Crawl => CrawlTask::crawl(required(&cli.url, "url")?),
        Mode::Map => CrawlTask::map(required(&cli.url, "url")?),
        Mode::Search => CrawlTask::search(required(&cli.query, "query")?, cli.num_results),
        Mode::Discover => CrawlTask::discover(
            required(&cli.industry, "industry")?,
            required(&cli.location, "location")?,
            cli.num_leads,
        ),
    };

    let (max_pages, max_depth) = match (cli.max_pages, cli.max_depth) {
        (None, None) => (
            Some(config.crawler.default_max_pages),
            Some(config.crawler.default_max_depth),
        ),
        bounds => bounds,
    };
    if let Some(max_pages) = max_pages {
        task = task.with_max_pages(max_pages);
    }
    if let Some(max_depth) = max_depth {
        task = task.with_max_depth(max_depth);
    }

    Ok(task
        .with_same_domain_only(!cli.any_domain)
        .with_schema(config.extraction_schema())
        .with_include_patterns(cli.include.clone())
        .with_exclude_patterns(cli.exclude.clone()))
}

/// Handles the --dry-run mode: shows what would be crawled
fn handle_dry_run(config: &Config, task: &CrawlTask) {
    println!("=== Leadscout Dry Run ===\n");

    println!("Task:");
    println!("  Mode: {}", task.mode);
    if let Some(url) = &task.url {
        println!("  Seed: {}", url);
    }
    println!("  Max pages: {:?}", task.max_pages);
    println!("  Max depth: {:?}", task.effective_max_depth());
    println!("  Same domain only: {}", task.same_domain_only);
    println!("  Schema fields: {}", task.extraction_schema.len());

    println!("\nCrawler Configuration:");
    println!("  Workers: {}", config.crawler.max_concurrent_workers);
    println!("  Min host interval: {}ms", config.crawler.min_host_interval_ms);
    println!("  Request timeout: {}s", config.crawler.request_timeout_secs);
    println!(
        "  Retries: {} (base {}ms)",
        config.crawler.max_retries, config.crawler.retry_base_ms
    );

    println!("\nUser Agent: {}", config.user_agent_string());
    println!("Database: {}", config.output.database_path);
    match &config.extractor {
        Some(extractor) => println!("Extractor: {} at {}", extractor.model, extractor.api_base),
        None => println!("Extractor: none (pages are crawled for links only)"),
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the --stats mode: shows the latest run from the database
fn handle_stats(config: &Config) -> anyhow::Result<()> {
    println!("Database: {}\n", config.output.database_path);
    let store = open_store(Path::new(&config.output.database_path))?;

    let Some(run) = store.get_latest_run()? else {
        println!("No runs recorded yet");
        return Ok(());
    };

    println!(
        "Run #{} ({}, {}) started {}",
        run.id, run.mode, run.status, run.started_at
    );
    println!(
        "  Pages: {} fetched, {} failed; leads: {}",
        run.pages_fetched, run.pages_failed, run.leads_found
    );
    for lead in store.leads_for_run(run.id)? {
        println!(
            "  [{:>3} {:<2}] {} <{}> {}",
            lead.composite,
            lead.grade,
            lead.company_name.as_deref().unwrap_or("(unnamed)"),
            lead.contact_email.as_deref().unwrap_or("-"),
            lead.recommended_action
        );
    }
    println!("\nTotal stored leads: {}", store.count_leads()?);
    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: &Config, config_hash: &str, task: &CrawlTask) -> anyhow::Result<()> {
    let pipeline = LeadPipeline::new(config.icp.clone()).context("invalid scoring weights")?;
    let crawler = Crawler::from_config(config)?;

    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing in-flight pages");
            on_interrupt.cancel();
        }
    });

    let report = crawler.run_with_cancellation(task, &cancel).await?;
    let mut store = open_store(Path::new(&config.output.database_path))?;
    let (run_id, scored) = pipeline.deliver(&report, &mut store, config_hash)?;

    print_report(run_id, &report, &scored);
    Ok(())
}

fn print_report(run_id: i64, report: &CrawlReport, scored: &[ScoredLead]) {
    println!("\n=== Run #{} ({}) ===", run_id, report.status);
    println!(
        "Pages: {} fetched, {} failed, {} disallowed by robots.txt",
        report.fetched_count(),
        report.failed_count(),
        report.disallowed.len()
    );

    if let Some(site_map) = &report.site_map {
        println!("\nSite map ({} pages):", site_map.len());
        for node in &site_map.nodes {
            println!(
                "  {}{} [{}]",
                "  ".repeat(node.depth as usize),
                node.url,
                node.page_type
            );
        }
    }

    println!("\nLeads: {}", scored.len());
    for entry in scored {
        let lead = &entry.lead;
        println!(
            "  [{:>3} {:<2} {:<4}] {} ({})",
            entry.score.composite,
            entry.score.grade,
            entry.priority,
            lead.company_name.as_deref().unwrap_or("(unnamed)"),
            lead.website.as_deref().unwrap_or(&lead.source_url)
        );
        println!("        -> {}", entry.recommended_action);
    }
}
