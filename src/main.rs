use anyhow::{Context, Result};
use std::process::ExitCode;
use tracing::{error, info};

use listing_harvest::config::{Config, RendererKind};
use listing_harvest::render::{ChromeRenderer, HttpRenderer, PageRenderer};
use listing_harvest::storage::{save_all, CsvSink, JsonSink, OutputSink};
use listing_harvest::{Crawler, Termination};

const HTTP_RETRIES: u32 = 3;

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("listing_harvest=info".parse()?),
        )
        .init();

    info!("Starting Listing Harvest");

    // Load configuration
    let config = Config::load().context("Failed to load configuration")?;
    let csv_path = config.csv_path();
    let json_path = config.json_path();

    let sinks = || -> Vec<Box<dyn OutputSink>> {
        vec![
            Box::new(JsonSink::new(json_path.clone())),
            Box::new(CsvSink::new(csv_path.clone())),
        ]
    };

    let mut crawler = Crawler::from_config(&config)?;
    if config.checkpoint_each_page {
        crawler = crawler.with_checkpoints(sinks());
    }

    // Renderer lives for exactly one crawl
    info!("Setting up {:?} renderer...", config.renderer);
    let renderer: Box<dyn PageRenderer> = match config.renderer {
        RendererKind::Chrome => {
            let poll_interval = config.readiness.poll_interval();
            Box::new(
                ChromeRenderer::launch(&config.user_agent, config.headless, poll_interval)
                    .await
                    .context("Failed to start headless browser")?,
            )
        }
        RendererKind::Http => Box::new(HttpRenderer::new(&config.user_agent, HTTP_RETRIES)?),
    };

    let report = crawler
        .run_and_close(renderer.as_ref())
        .await
        .context("Crawl aborted")?;

    info!(
        "Crawl finished: {} ({} pages, {} records, {} duplicates dropped)",
        report.termination,
        report.pages_crawled,
        report.records.len(),
        report.duplicates_dropped
    );

    if save_all(&sinks(), &report.records)? {
        info!("Saved {} records", report.records.len());
        info!("  JSON -> {}", json_path.display());
        info!("  CSV  -> {}", csv_path.display());
    } else {
        info!("No products parsed, nothing to save.");
    }

    if report.termination == Termination::NothingOnFirstPage {
        error!("First page yielded no products; check the tile selector and container markers");
        return Ok(ExitCode::from(2));
    }

    Ok(ExitCode::SUCCESS)
}
