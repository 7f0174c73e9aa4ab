//! Pagechain main entry point
//!
//! This is the command-line interface for the Pagechain downloader.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use pagechain::config::{load_config_with_hash, Config};
use pagechain::crawler::{parser_for, ParserKind};
use pagechain::output::{
    collect_page_images, print_report, print_retry_report, read_failed_urls, write_failed_urls,
    ManifestLogger, TracingObserver,
};
use pagechain::{ChainWalker, WalkOptions};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Pagechain: a resumable downloader for link-chained image pages
///
/// Pagechain follows a chain of pages where each page carries the token for
/// the next one, saving every page image as `<page>.jpg` in a folder named
/// after the work. Pages already on disk are skipped, so an interrupted
/// download can simply be run again.
#[derive(Parser, Debug)]
#[command(name = "pagechain")]
#[command(version = "1.0.0")]
#[command(about = "A resumable downloader for link-chained image pages", long_about = None)]
struct Cli {
    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose", global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Walk a chain from its first page and download every image
    Download(DownloadArgs),

    /// Re-attempt pages that failed in an earlier run
    Retry(RetryArgs),

    /// Estimate how many pages a chain has
    Count {
        /// Starting page URL
        url: String,
    },

    /// List the page images in a folder in page order
    Manifest {
        /// Folder holding the numbered images
        dir: PathBuf,
    },
}

#[derive(Args, Debug)]
struct DownloadArgs {
    /// Starting page URL, e.g. https://example.org/s/<token>/<book>-1
    url: String,

    /// Folder name to use instead of the page title
    #[arg(long)]
    folder: Option<String>,

    /// Directory under which the work folder is created
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Forward proxy as host:port
    #[arg(long, value_name = "HOST:PORT")]
    proxy: Option<String>,

    /// Skip the page count pass
    #[arg(long)]
    no_probe: bool,

    /// Write the failed page URLs to this file
    #[arg(long, value_name = "FILE")]
    failed_out: Option<PathBuf>,

    /// Markup parsing strategy (regex or dom)
    #[arg(long, default_value = "regex")]
    parser: ParserKind,
}

#[derive(Args, Debug)]
struct RetryArgs {
    /// Page URLs to re-attempt
    #[arg(value_name = "URL", required_unless_present = "from")]
    urls: Vec<String>,

    /// Read page URLs from a file written by `download --failed-out`
    #[arg(long, value_name = "FILE")]
    from: Option<PathBuf>,

    /// Folder name to use instead of the page title
    #[arg(long)]
    folder: Option<String>,

    /// Directory under which the work folder is created
    #[arg(short, long, value_name = "DIR")]
    output: Option<PathBuf>,

    /// Forward proxy as host:port
    #[arg(long, value_name = "HOST:PORT")]
    proxy: Option<String>,

    /// Pages retried at the same time
    #[arg(long, default_value_t = 1)]
    concurrency: usize,

    /// Write the URLs that still fail to this file
    #[arg(long, value_name = "FILE")]
    failed_out: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    // Load and validate configuration
    let config = load_or_default(cli.config.as_deref())?;

    // Ctrl-C stops the traversal after the current request
    let cancel = CancellationToken::new();
    let signal_token = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received, stopping");
            signal_token.cancel();
        }
    });

    match cli.command {
        Command::Download(args) => handle_download(config, args, cancel).await,
        Command::Retry(args) => handle_retry(config, args, cancel).await,
        Command::Count { url } => handle_count(config, &url, cancel).await,
        Command::Manifest { dir } => handle_manifest(&config, &dir),
    }
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("pagechain=info,warn"),
            1 => EnvFilter::new("pagechain=debug,info"),
            2 => EnvFilter::new("pagechain=trace,debug"),
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

/// Loads the configuration file, or the defaults when none is given
fn load_or_default(path: Option<&Path>) -> anyhow::Result<Config> {
    let Some(path) = path else {
        tracing::debug!("No configuration file given, using defaults");
        return Ok(Config::default());
    };

    tracing::info!("Loading configuration from: {}", path.display());
    let (config, hash) = load_config_with_hash(path)
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
    tracing::info!("Configuration loaded successfully (hash: {})", hash);
    Ok(config)
}

/// Applies command-line overrides on top of the configuration
fn apply_overrides(mut config: Config, output: Option<PathBuf>, proxy: Option<String>) -> Config {
    if let Some(output) = output {
        config.output.root_dir = output.display().to_string();
    }
    if let Some(proxy) = proxy {
        config.network.proxy = Some(proxy);
    }
    config
}

/// Builds a walker wired to the terminal
fn build_walker(config: &Config, cancel: CancellationToken) -> anyhow::Result<ChainWalker> {
    let walker = ChainWalker::new(config)
        .context("Failed to set up the walker")?
        .with_cancellation(cancel)
        .with_observer(TracingObserver)
        .with_completion_sink(ManifestLogger::new(config.output.image_extensions.clone()));
    Ok(walker)
}

/// Handles the download command: walks the whole chain
async fn handle_download(
    config: Config,
    args: DownloadArgs,
    cancel: CancellationToken,
) -> anyhow::Result<ExitCode> {
    let config = apply_overrides(config, args.output, args.proxy);
    let walker = build_walker(&config, cancel)?.with_parser(parser_for(args.parser));

    let options = WalkOptions {
        folder_name: args.folder,
        probe_total: !args.no_probe,
        single_page_only: false,
    };

    let report = walker.walk(&args.url, &options).await?;
    print_report(&report);

    if let Some(path) = &args.failed_out {
        write_failed_urls(path, &report.failed_page_urls)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if report.is_clean() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Handles the retry command: re-attempts individual pages
async fn handle_retry(
    config: Config,
    args: RetryArgs,
    cancel: CancellationToken,
) -> anyhow::Result<ExitCode> {
    let config = apply_overrides(config, args.output, args.proxy);

    let mut urls = args.urls;
    if let Some(path) = &args.from {
        let from_file = read_failed_urls(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        urls.extend(from_file);
    }

    if urls.is_empty() {
        println!("Nothing to retry");
        return Ok(ExitCode::SUCCESS);
    }

    let walker = build_walker(&config, cancel)?;
    let report = walker
        .retry_failed(&urls, args.folder.as_deref(), args.concurrency)
        .await;
    print_retry_report(&report);

    if let Some(path) = &args.failed_out {
        write_failed_urls(path, &report.still_failed)
            .with_context(|| format!("Failed to write {}", path.display()))?;
    }

    if report.still_failed.is_empty() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}

/// Handles the count command: prints the estimated page count
async fn handle_count(
    config: Config,
    url: &str,
    cancel: CancellationToken,
) -> anyhow::Result<ExitCode> {
    let walker = ChainWalker::new(&config)?.with_cancellation(cancel);
    let total = walker.count_pages(url).await?;

    if total == 0 {
        println!("Page count unknown");
        return Ok(ExitCode::FAILURE);
    }
    println!("{}", total);
    Ok(ExitCode::SUCCESS)
}

/// Handles the manifest command: lists images in page order
fn handle_manifest(config: &Config, dir: &Path) -> anyhow::Result<ExitCode> {
    let manifest = collect_page_images(dir, &config.output.image_extensions)
        .with_context(|| format!("Failed to list {}", dir.display()))?;

    for image in &manifest.images {
        println!("{}", image.display());
    }
    println!(
        "\n{} images, {} MiB",
        manifest.len(),
        manifest.total_mib()
    );

    Ok(ExitCode::SUCCESS)
}
