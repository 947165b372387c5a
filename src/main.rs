//! docharvest main entry point
//!
//! This is the command-line interface for the docharvest documentation harvester.

use anyhow::{bail, Context};
use clap::Parser;
use docharvest::config::{load_config_with_hash, validate, Config, CrawlMode};
use docharvest::crawler::{check_auth, run_crawl};
use docharvest::processors::{ingest_folder, IngestOptions, LocalFolderStorage, PlainTextProcessor};
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing_subscriber::EnvFilter;

/// docharvest: a polite, auth-safe documentation harvester
///
/// docharvest crawls a documentation site without tripping its login
/// protection, saves every content page as markdown with frontmatter and
/// cross-references linked documents against a local corpus.
#[derive(Parser, Debug)]
#[command(name = "docharvest")]
#[command(version = "1.0.0")]
#[command(about = "A polite, auth-safe documentation harvester", long_about = None)]
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

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long, conflicts_with_all = ["check_auth", "ingest_folder"])]
    dry_run: bool,

    /// Fetch the base URL once to verify authentication, then exit
    #[arg(long, conflicts_with_all = ["dry_run", "ingest_folder"])]
    check_auth: bool,

    /// Process every supported file in a local (synced) folder, then exit
    #[arg(long, value_name = "DIR", conflicts_with_all = ["dry_run", "check_auth"])]
    ingest_folder: Option<PathBuf>,

    /// Override crawl.output-dir
    #[arg(long, value_name = "DIR")]
    output_dir: Option<String>,

    /// Override crawl.max-pages
    #[arg(long)]
    max_pages: Option<usize>,

    /// Override crawl.max-depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Override crawl.crawl-delay (seconds)
    #[arg(long, value_name = "SECONDS")]
    delay: Option<f64>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    tracing::info!("Loading configuration from: {}", cli.config.display());
    let (mut config, config_hash) = load_config_with_hash(&cli.config)
        .with_context(|| format!("Failed to load configuration {}", cli.config.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", config_hash);

    apply_overrides(&mut config, &cli);
    validate(&config).context("Invalid command-line override")?;

    if cli.dry_run {
        handle_dry_run(&config);
    } else if cli.check_auth {
        handle_check_auth(&config).await?;
    } else if let Some(folder) = &cli.ingest_folder {
        handle_ingest_folder(&config, folder).await?;
    } else {
        handle_crawl(config, config_hash).await?;
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
            0 => EnvFilter::new("docharvest=info,warn"),
            1 => EnvFilter::new("docharvest=debug,info"),
            2 => EnvFilter::new("docharvest=trace,debug"),
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

fn apply_overrides(config: &mut Config, cli: &Cli) {
    if let Some(dir) = &cli.output_dir {
        config.crawl.output_dir = dir.clone();
    }
    if let Some(max_pages) = cli.max_pages {
        config.crawl.max_pages = max_pages;
    }
    if let Some(max_depth) = cli.max_depth {
        config.crawl.max_depth = max_depth;
    }
    if let Some(delay) = cli.delay {
        config.crawl.crawl_delay = delay;
    }
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config) {
    println!("=== docharvest Dry Run ===\n");

    println!("Crawl:");
    println!("  Base URL: {}", config.crawl.base_url);
    match config.crawl.mode {
        CrawlMode::Sitemap => {
            println!("  Mode: sitemap ({})", config.effective_sitemap_url())
        }
        CrawlMode::StartUrl => println!("  Mode: start-url"),
    }
    println!("  Max pages: {}", config.crawl.max_pages);
    println!("  Max depth: {}", config.crawl.max_depth);
    println!("  Crawl delay: {}s", config.crawl.crawl_delay);
    println!("  Output: {}", config.crawl.output_dir);

    println!("\nAllowed Domains:");
    for domain in config.effective_allowed_domains() {
        println!("  - {}", domain);
    }

    println!("\nAuthentication:");
    println!("  Header: {}", config.auth.header);
    println!("  Tokens configured for {} domain(s)", config.auth.tokens.len());
    for domain in config.auth.tokens.keys() {
        println!("    * {}", domain);
    }
    println!("  Max auth failures: {}", config.auth.max_auth_failures);
    println!("  Max redirects: {}", config.auth.max_redirects);

    println!(
        "\nPriority Patterns ({}):",
        config.filter.priority_patterns.len()
    );
    for pattern in &config.filter.priority_patterns {
        println!("  - {}", pattern);
    }

    println!("\nDocuments:");
    if config.documents.corpus_dirs.is_empty() {
        println!("  Corpus: none (document links are listed, not matched)");
    } else {
        for dir in &config.documents.corpus_dirs {
            println!("  Corpus: {}", dir);
        }
    }
    println!("  Download unmatched: {}", config.documents.download);

    println!("\n✓ Configuration is valid");
}

/// Handles the --check-auth mode: one guarded fetch of the base URL
async fn handle_check_auth(config: &Config) -> anyhow::Result<()> {
    let check = check_auth(config).await?;

    println!("=== Authentication Check ===\n");
    println!("URL: {}", check.url);
    println!("Domain: {}", check.domain.as_deref().unwrap_or("(unknown)"));
    println!(
        "Token configured: {}",
        if check.token_configured { "yes" } else { "no" }
    );

    match check.outcome {
        Ok(bytes) => {
            println!("\n✓ Authentication OK ({} bytes received)", bytes);
            Ok(())
        }
        Err(e) => bail!("Authentication check failed: {}", e),
    }
}

/// Handles the --ingest-folder mode: processes a local folder of documents
async fn handle_ingest_folder(config: &Config, folder: &Path) -> anyhow::Result<()> {
    let output_dir = PathBuf::from(&config.crawl.output_dir);
    let storage = LocalFolderStorage::new(folder);
    let processor = PlainTextProcessor::new(output_dir.join("documents"));

    let report = ingest_folder(
        &storage,
        &processor,
        "",
        &output_dir.join("downloads"),
        &IngestOptions::default(),
    )
    .await
    .with_context(|| format!("Failed to ingest {}", folder.display()))?;

    tracing::info!(
        "Ingested {}: {} processed, {} skipped, {} failed",
        folder.display(),
        report.files_processed,
        report.files_skipped,
        report.files_failed
    );

    let report_path = output_dir.join("ingest_report.json");
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    std::fs::write(&report_path, serde_json::to_string_pretty(&report)?)
        .with_context(|| format!("Failed to write {}", report_path.display()))?;
    println!("✓ Ingest report written to: {}", report_path.display());

    Ok(())
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, config_hash: String) -> anyhow::Result<()> {
    tracing::info!(
        "Crawling {} (max {} pages, depth {})",
        config.crawl.base_url,
        config.crawl.max_pages,
        config.crawl.max_depth
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, finishing current page");
            let _ = shutdown_tx.send(true);
        }
    });

    let outcome = run_crawl(config, Some(config_hash), shutdown_rx)
        .await
        .context("Crawl failed")?;

    let summary = &outcome.summary;
    println!("\n=== Crawl {:?} ===", summary.status);
    println!("Pages crawled: {}", summary.pages_crawled);
    println!("Files saved: {}", summary.files_saved);
    println!("Document links: {}", summary.document_links_found);
    println!("Errors: {}", summary.errors.len());
    if !summary.blocked_domains.is_empty() {
        println!("Blocked domains: {}", summary.blocked_domains.join(", "));
    }
    println!("Output: {}", outcome.output_dir.display());

    Ok(())
}
