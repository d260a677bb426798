//! posterwall binary: load config, wire the clients and the scraper into
//! the core pipeline, run it over a page or a batch file, print the tally.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use url::Url;

use posterwall_api::plex::PlexClient;
use posterwall_api::tmdb::TmdbClient;
use posterwall_core::config::AppConfig;
use posterwall_core::error::ConfigError;
use posterwall_core::feed::read_import_file;
use posterwall_core::fetch::HttpImageSource;
use posterwall_core::models::PosterDescriptor;
use posterwall_core::pipeline::Pipeline;
use posterwall_core::sync::SyncExecutor;
use posterwall_core::transform::JpegTransform;
use posterwall_scrape::{is_posterdb_url, PosterDbScraper, ScrapeError};

#[derive(Parser)]
#[command(
    name = "posterwall",
    version,
    about = "Match scraped posters to a media server library and upload them"
)]
struct Cli {
    /// Path to the config file (defaults to the platform config dir).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Process a single poster set or single-poster page.
    Url { page: String },
    /// Process a batch file of page URLs, one per line.
    Import { file: PathBuf },
}

#[derive(Debug, thiserror::Error)]
enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Scrape(#[from] ScrapeError),

    #[error("invalid server URL: {0}")]
    ServerUrl(String),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("import file error: {0}")]
    Import(#[from] std::io::Error),
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("posterwall=info")),
        )
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config = AppConfig::load(cli.config.as_deref())?;
    config.validate()?;

    let http = reqwest::Client::builder()
        .timeout(config.network.timeout())
        .build()?;

    let base_url =
        Url::parse(&config.server.base_url).map_err(|e| AppError::ServerUrl(e.to_string()))?;
    let plex = PlexClient::new(base_url, config.server.token.clone(), http.clone());
    let assist = config
        .assist
        .enabled
        .then(|| TmdbClient::new(config.assist.api_key.clone(), http.clone()));
    let scraper = PosterDbScraper::new(http.clone())?;

    let cancel = Arc::new(AtomicBool::new(false));
    spawn_cancel_handler(cancel.clone());

    let pages = match cli.command {
        Command::Url { page } => vec![page],
        Command::Import { file } => read_import_file(&file)?,
    };

    let descriptors = collect_descriptors(&scraper, &pages).await;
    if descriptors.is_empty() {
        tracing::warn!("Nothing to process");
        return Ok(());
    }
    tracing::info!(posters = descriptors.len(), pages = pages.len(), "Scraping done");

    let source = HttpImageSource::new(http);
    let transform = JpegTransform;
    let executor = SyncExecutor::new(&source, &transform, &config);
    let pipeline = Pipeline::new(&plex, assist.as_ref(), executor, &config, cancel);

    let report = pipeline.run(descriptors.into_iter()).await;

    for outcome in report.outcomes() {
        println!("{:>18}  {}", outcome.status.to_string(), outcome.detail);
    }
    println!("{}", report.summary());
    Ok(())
}

/// Scrape every page reference, skipping pages that fail so one bad URL
/// never sinks the batch.
async fn collect_descriptors(
    scraper: &PosterDbScraper,
    pages: &[String],
) -> Vec<PosterDescriptor> {
    let mut descriptors = Vec::new();
    for page in pages {
        if !is_posterdb_url(page) {
            tracing::warn!(page, "Not a ThePosterDB reference, skipping");
            continue;
        }
        match scraper.scrape(page).await {
            Ok(found) => {
                tracing::info!(page, posters = found.len(), "Page scraped");
                descriptors.extend(found);
            }
            Err(e) => {
                tracing::warn!(page, error = %e, "Scrape failed, skipping page");
            }
        }
    }
    descriptors
}

/// Ctrl-C requests a cooperative stop: the current poster finishes (or is
/// marked cancelled before its writes start) and the run ends cleanly.
fn spawn_cancel_handler(cancel: Arc<AtomicBool>) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Interrupt received, finishing the current poster");
            cancel.store(true, Ordering::Relaxed);
        }
    });
}
