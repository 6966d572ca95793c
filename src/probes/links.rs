//! External reference checks for the redirection and error ratios

use futures::stream::{self, StreamExt};
use std::collections::HashMap;
use tracing::debug;

use crate::fetch::PageFetcher;
use crate::resources::PageResources;

/// Outcome of probing one external reference
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkOutcome {
    Redirected { status: u16 },
    Direct { status: u16 },
    Unreachable,
}

impl LinkOutcome {
    fn redirected(&self) -> bool {
        matches!(self, LinkOutcome::Redirected { .. })
    }

    fn errored(&self) -> bool {
        match self {
            LinkOutcome::Redirected { status } | LinkOutcome::Direct { status } => *status >= 400,
            LinkOutcome::Unreachable => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExternalLinkReport {
    /// Every external reference, duplicates included
    pub total: usize,
    pub redirected: usize,
    pub errored: usize,
}

impl ExternalLinkReport {
    pub fn ratio_redirection(&self) -> f64 {
        ratio(self.redirected, self.total)
    }

    pub fn ratio_errors(&self) -> f64 {
        ratio(self.errored, self.total)
    }
}

fn ratio(count: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

/// External references of the six hyperlink buckets, in bucket order
pub fn external_references(page: &PageResources) -> Vec<&str> {
    page.hyperlink_buckets()
        .iter()
        .flat_map(|b| b.externals.iter().map(String::as_str))
        .collect()
}

/// GET every distinct external reference with at most `concurrency` in flight.
/// Repeated references count once per occurrence.
pub async fn check_external_links(
    fetcher: &dyn PageFetcher,
    references: &[&str],
    concurrency: usize,
) -> ExternalLinkReport {
    let mut occurrences: HashMap<&str, usize> = HashMap::new();
    for reference in references {
        *occurrences.entry(*reference).or_default() += 1;
    }

    let outcomes: Vec<(&str, LinkOutcome)> = stream::iter(occurrences.keys().copied())
        .map(|link| async move { (link, probe(fetcher, link).await) })
        .buffer_unordered(concurrency.max(1))
        .collect()
        .await;

    let mut report = ExternalLinkReport {
        total: references.len(),
        ..Default::default()
    };
    for (link, outcome) in outcomes {
        let count = occurrences.get(link).copied().unwrap_or(0);
        if outcome.redirected() {
            report.redirected += count;
        }
        if outcome.errored() {
            report.errored += count;
        }
    }

    debug!(
        "External links: {} checked, {} redirected, {} errored",
        report.total, report.redirected, report.errored
    );
    report
}

async fn probe(fetcher: &dyn PageFetcher, link: &str) -> LinkOutcome {
    match fetcher.fetch(link).await {
        Ok(page) if !page.history.is_empty() => LinkOutcome::Redirected { status: page.status },
        Ok(page) => LinkOutcome::Direct { status: page.status },
        Err(e) => {
            debug!("External link {} unreachable: {}", link, e);
            LinkOutcome::Unreachable
        }
    }
}
