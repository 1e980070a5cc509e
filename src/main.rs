//! Contact-Miner main entry point
//!
//! This is the command-line interface for the Contact-Miner lead enrichment
//! scraper.

use anyhow::Context;
use clap::Parser;
use contact_miner::config::{
    load_config, validate, Config, EmailCardinality, RunnerKind, ScrapeMode,
};
use contact_miner::input::{load_targets, LoadedInput};
use contact_miner::runner::{run_batch, ShutdownSignal};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Contact-Miner: discovers contact emails, phones and text on business websites
///
/// Reads a CSV of targets, visits each homepage (and, in deep-search mode, a
/// bounded set of likely contact pages) and writes success/failed/all_combined
/// partitions, a checkpoint and a run summary to the output directory.
#[derive(Parser, Debug)]
#[command(name = "contact-miner")]
#[command(version = "1.0.0")]
#[command(about = "Lead enrichment scraper for business contact data", long_about = None)]
struct Cli {
    /// Path to TOML configuration file (every key optional)
    #[arg(short, long, env = "MINER_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Input CSV file
    #[arg(short, long, env = "MINER_INPUT", value_name = "CSV")]
    input: Option<String>,

    /// Output directory for partitions, checkpoint and reports
    #[arg(short, long, env = "MINER_OUTPUT_DIR", value_name = "DIR")]
    output_dir: Option<String>,

    /// Input column holding the website
    #[arg(long, env = "MINER_URL_COLUMN")]
    url_column: Option<String>,

    /// Input column holding the display name
    #[arg(long, env = "MINER_NAME_COLUMN")]
    name_column: Option<String>,

    /// Worker count (pool) or in-flight targets (concurrent)
    #[arg(short, long, env = "MINER_WORKERS")]
    workers: Option<usize>,

    /// Maximum candidate pages per target in deep search
    #[arg(long, env = "MINER_MAX_PAGES")]
    max_pages: Option<usize>,

    /// Scraping mode
    #[arg(long, value_enum, env = "MINER_MODE")]
    mode: Option<ScrapeMode>,

    /// Row layout for targets with several emails
    #[arg(long, value_enum, env = "MINER_EMAIL_OUTPUT")]
    email_output: Option<EmailCardinality>,

    /// Scheduling model
    #[arg(long, value_enum, env = "MINER_RUNNER")]
    runner: Option<RunnerKind>,

    /// Per-request timeout in seconds
    #[arg(long, env = "MINER_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Flush results and checkpoint every N emails found
    #[arg(long, env = "MINER_CHECKPOINT_INTERVAL")]
    checkpoint_interval: Option<usize>,

    /// Resume from the checkpoint, skipping completed targets
    #[arg(long, env = "MINER_RESUME")]
    resume: bool,

    /// Checkpoint file (default: <output-dir>/checkpoint.json)
    #[arg(long, env = "MINER_CHECKPOINT", value_name = "FILE")]
    checkpoint: Option<String>,

    /// Only process the first N valid input rows
    #[arg(long, env = "MINER_LIMIT")]
    limit: Option<usize>,

    /// Content-only mode: do not extract emails
    #[arg(long)]
    no_emails: bool,

    /// Keep cleaned page text in the outputs
    #[arg(long)]
    include_text: bool,

    /// Validate configuration and input, show what would run, and exit
    #[arg(long)]
    dry_run: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

impl Cli {
    /// Layers command-line flags over the file configuration
    fn apply(&self, config: &mut Config) {
        if let Some(input) = &self.input {
            config.input.path = input.clone();
        }
        if let Some(dir) = &self.output_dir {
            config.output.directory = dir.clone();
        }
        if let Some(column) = &self.url_column {
            config.input.url_column = column.clone();
        }
        if let Some(column) = &self.name_column {
            config.input.name_column = Some(column.clone());
        }
        if let Some(workers) = self.workers {
            config.runner.workers = workers;
        }
        if let Some(max_pages) = self.max_pages {
            config.discovery.max_pages = max_pages;
        }
        if let Some(mode) = self.mode {
            config.scrape.mode = mode;
        }
        if let Some(cardinality) = self.email_output {
            config.output.email_output = cardinality;
        }
        if let Some(kind) = self.runner {
            config.runner.kind = kind;
        }
        if let Some(timeout) = self.timeout_secs {
            config.fetch.timeout_secs = timeout;
        }
        if let Some(interval) = self.checkpoint_interval {
            config.checkpoint.interval = interval;
        }
        if self.resume {
            config.checkpoint.resume = true;
        }
        if let Some(path) = &self.checkpoint {
            config.checkpoint.path = Some(path.clone());
        }
        if let Some(limit) = self.limit {
            config.input.limit = Some(limit);
        }
        if self.no_emails {
            config.scrape.extract_emails = false;
        }
        if self.include_text {
            config.scrape.include_text = true;
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load configuration, then layer flags on top
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            load_config(path)
                .with_context(|| format!("failed to load configuration {}", path.display()))?
        }
        None => Config::default(),
    };
    cli.apply(&mut config);
    validate(&config).context("invalid configuration")?;

    if config.input.path.is_empty() {
        anyhow::bail!("no input file given (use --input or [input] path)");
    }

    let input = load_targets(&config.input)
        .with_context(|| format!("failed to read input {}", config.input.path))?;
    tracing::info!(
        "Loaded {} targets ({} rows, {} invalid, {} duplicates)",
        input.targets.len(),
        input.stats.rows,
        input.stats.invalid,
        input.stats.duplicates
    );

    if cli.dry_run {
        handle_dry_run(&config, &input);
        return Ok(());
    }

    let shutdown = ShutdownSignal::new();
    shutdown.listen_for_ctrl_c();

    let report = run_batch(&config, input, shutdown).await?;

    println!(
        "{} of {} targets succeeded ({:.1}%), {} emails found. Results in {}",
        report.analytics.totals.succeeded,
        report.analytics.totals.attempted,
        report.analytics.success_rate,
        report.analytics.totals.emails_found,
        report.output_dir.display()
    );
    if report.interrupted() {
        println!("Run was interrupted; rerun with --resume to finish.");
    }

    Ok(())
}

/// Sets up the logging/tracing subscriber based on verbosity level
///
/// `RUST_LOG`, when set, overrides the verbosity flags.
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if let Ok(filter) = EnvFilter::try_from_default_env() {
        filter
    } else if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("contact_miner=info,warn"),
            1 => EnvFilter::new("contact_miner=debug,info"),
            2 => EnvFilter::new("contact_miner=trace,debug"),
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

/// Handles the --dry-run mode: shows what would be processed
fn handle_dry_run(config: &Config, input: &LoadedInput) {
    println!("=== Contact-Miner Dry Run ===\n");

    println!("Input:");
    println!("  File: {}", config.input.path);
    println!("  URL column: {}", config.input.url_column);
    println!(
        "  Name column: {}",
        config.input.name_column.as_deref().unwrap_or("(none)")
    );
    println!(
        "  Rows: {} ({} invalid, {} duplicates)",
        input.stats.rows, input.stats.invalid, input.stats.duplicates
    );

    println!("\nScraping:");
    println!("  Mode: {:?}", config.scrape.mode);
    println!("  Emails: {}", config.scrape.extract_emails);
    println!("  Max pages per target: {}", config.discovery.max_pages);
    println!("  Email output: {:?}", config.output.email_output);

    println!("\nRunner:");
    println!("  Kind: {:?}", config.runner.kind);
    println!("  Workers: {}", config.runner.workers);
    println!("  Timeout: {}s", config.fetch.timeout_secs);
    println!("  Checkpoint: {}", config.checkpoint_path().display());
    println!("  Checkpoint interval: {} emails", config.checkpoint.interval);
    println!("  Resume: {}", config.checkpoint.resume);

    println!("\nOutput:");
    println!("  Directory: {}", config.output.directory);
    println!("  Formats: {:?}", config.output.formats);

    println!("\nFirst targets:");
    for target in input.targets.iter().take(10) {
        println!("  - {} ({})", target.label(), target.url);
    }

    println!("\n✓ Configuration is valid");
    println!("✓ Would process {} targets", input.targets.len());
}
