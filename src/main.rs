use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

use urlfeatures::batch;
use urlfeatures::brands::{self, BrandList};
use urlfeatures::cli::Cli;
use urlfeatures::config::{self, AppConfig};
use urlfeatures::export::{self, OutputFormat};
use urlfeatures::logger::{RunLogger, VerbosityLevel};
use urlfeatures::pipeline::FeatureExtractor;

#[tokio::main]
async fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    if cli.init {
        match AppConfig::create_default_config() {
            Ok(path) => {
                println!("Created default configuration file at: {}", path.display());
                std::process::exit(0);
            }
            Err(e) => {
                eprintln!("Failed to create configuration file: {}", e);
                std::process::exit(1);
            }
        }
    }

    let verbosity = VerbosityLevel::from_verbose_count(cli.verbose);
    init_tracing(verbosity);
    let logger = match &cli.log_file {
        Some(path) => RunLogger::with_log_file(verbosity, path.clone()),
        None => RunLogger::new(verbosity),
    };

    if let Err(e) = cli.validate() {
        logger.error(&format!("Invalid arguments: {}", e));
        eprintln!("Run 'urlfeatures --help' for usage.");
        std::process::exit(1);
    }

    let mut app_config = match AppConfig::load_or_default(cli.config.as_deref().map(Path::new)) {
        Ok(cfg) => cfg,
        Err(e @ config::ConfigError::FileNotFound(_)) => {
            logger.error(&e.to_string());
            eprintln!("Run with --init to create a default configuration file.");
            std::process::exit(1);
        }
        Err(e) => {
            logger.error(&format!("Configuration error: {}", e));
            std::process::exit(1);
        }
    };
    if cli.no_external_links {
        app_config.probes.check_external_links = false;
    }

    let urls = match collect_urls(&cli) {
        Ok(urls) => urls,
        Err(e) => {
            logger.error(&format!("{:#}", e));
            std::process::exit(1);
        }
    };

    let brands_path = cli.brands.as_deref().unwrap_or(&app_config.data.brands_path);
    brands::init(Path::new(brands_path))?;
    let brand_list = brands::get().unwrap_or_else(|| std::sync::Arc::new(BrandList::default()));

    let workers = cli.threads.unwrap_or(app_config.batch.workers);
    let format = cli.output_format().unwrap_or(OutputFormat::Csv);
    let extractor = FeatureExtractor::from_config(&app_config, brand_list)
        .context("Failed to set up feature extraction")?;

    logger.info(&format!("Extracting features for {} URLs ({} at a time)", urls.len(), workers));
    logger.start_progress(urls.len() as u64);

    let progress = logger.clone();
    let (records, summary) = batch::run_batch(
        &urls,
        workers,
        &extractor,
        Some(move |url: &str, accessible: bool| progress.url_finished(url, accessible)),
    )
    .await;

    logger.finish_progress(&format!(
        "Extracted features for {} of {} URLs",
        summary.successful, summary.total_urls
    ));

    export::export(&records, format, cli.output.as_deref())?;
    if let Some(path) = &cli.output {
        println!("Results written in {}", path);
    }

    if verbosity >= VerbosityLevel::Detailed {
        export::print_run_summary(&summary);
    }

    if logger.is_log_export_enabled() {
        if let Err(e) = logger.export_logs() {
            eprintln!("Failed to write log file: {:#}", e);
        }
    }

    eprintln!("Time: {} seconds", start.elapsed().as_secs_f64());
    Ok(())
}

fn init_tracing(verbosity: VerbosityLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.tracing_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// URLs from `--file` take precedence over `--url`
fn collect_urls(cli: &Cli) -> Result<Vec<String>> {
    match &cli.file {
        Some(path) => batch::read_url_file(Path::new(path))
            .with_context(|| format!("File {} not found or unreadable", path)),
        None => Ok(cli.url.clone()),
    }
}
