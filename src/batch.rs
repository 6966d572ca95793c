//! Batch driver for URL lists
//!
//! URLs are processed in consecutive batches of `workers`. Every URL of a
//! batch runs concurrently and the next batch starts only once the whole
//! batch has finished. Records come back in completion order.

use anyhow::{Context, Result};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::fs;
use std::path::Path;
use std::time::Instant;
use tracing::debug;

use crate::features::FeatureRecord;
use crate::pipeline::FeatureExtractor;

/// Outcome for a single URL of the batch
#[derive(Debug, Clone, Serialize)]
pub struct UrlResult {
    pub url: String,
    pub accessible: bool,
    pub duration_secs: f64,
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total_urls: usize,
    pub successful: usize,
    pub failed: usize,
    pub url_results: Vec<UrlResult>,
    pub total_duration_secs: f64,
    pub started_at: String,
    pub completed_at: String,
}

impl BatchSummary {
    pub fn new() -> Self {
        Self {
            total_urls: 0,
            successful: 0,
            failed: 0,
            url_results: Vec::new(),
            total_duration_secs: 0.0,
            started_at: Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string(),
            completed_at: String::new(),
        }
    }

    pub fn finalize(&mut self, elapsed_secs: f64) {
        self.completed_at = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        self.total_duration_secs = elapsed_secs;
        self.total_urls = self.url_results.len();
        self.successful = self.url_results.iter().filter(|r| r.accessible).count();
        self.failed = self.total_urls - self.successful;
    }

    /// URLs that could not be reached
    pub fn inaccessible(&self) -> impl Iterator<Item = &str> {
        self.url_results
            .iter()
            .filter(|r| !r.accessible)
            .map(|r| r.url.as_str())
    }
}

impl Default for BatchSummary {
    fn default() -> Self {
        Self::new()
    }
}

/// One URL per line; lines are trimmed, blanks and `#` comments skipped
pub fn parse_url_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

pub fn read_url_file(path: &Path) -> Result<Vec<String>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read URL file: {}", path.display()))?;
    Ok(parse_url_list(&content))
}

/// Extract features for every URL, `workers` at a time.
///
/// `on_complete` is called once per URL with the URL and whether a record
/// was produced.
pub async fn run_batch<F>(
    urls: &[String],
    workers: usize,
    extractor: &FeatureExtractor,
    on_complete: Option<F>,
) -> (Vec<FeatureRecord>, BatchSummary)
where
    F: Fn(&str, bool) + Send + Sync,
{
    let started = Instant::now();
    let workers = workers.max(1);
    let mut summary = BatchSummary::new();
    let mut records = Vec::with_capacity(urls.len());

    for (index, batch) in urls.chunks(workers).enumerate() {
        debug!("Starting batch {} ({} URLs)", index + 1, batch.len());

        let outcomes: Vec<(UrlResult, Option<FeatureRecord>)> = stream::iter(batch.iter())
            .map(|url| {
                let callback = &on_complete;
                async move {
                    let url_started = Instant::now();
                    let record = extractor.extract(url).await;
                    if let Some(cb) = callback {
                        cb(url, record.is_some());
                    }
                    let result = UrlResult {
                        url: url.clone(),
                        accessible: record.is_some(),
                        duration_secs: url_started.elapsed().as_secs_f64(),
                    };
                    (result, record)
                }
            })
            .buffer_unordered(workers)
            .collect()
            .await;

        for (result, record) in outcomes {
            summary.url_results.push(result);
            records.extend(record);
        }
    }

    summary.finalize(started.elapsed().as_secs_f64());
    debug!(
        "Batch complete: {} URLs, {} extracted, {} inaccessible",
        summary.total_urls, summary.successful, summary.failed
    );
    (records, summary)
}
