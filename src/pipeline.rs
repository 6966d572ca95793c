//! Per-URL feature extraction
//!
//! Fetch the page (with a single `www.` retry), classify its resources,
//! then run the reputation probes and external link checks concurrently.

use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::aggregate;
use crate::brands::BrandList;
use crate::config::AppConfig;
use crate::domain_utils::UrlParts;
use crate::features::FeatureRecord;
use crate::fetch::{FetchedPage, HttpFetcher, PageFetcher};
use crate::lexical;
use crate::probes::links::{self, ExternalLinkReport};
use crate::probes::{LiveProbes, ReputationProbes};
use crate::rate_limit::ProbeRateLimiter;
use crate::resources::ResourceClassifier;

/// Which request produced the page
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReachedVia {
    Primary,
    WwwRetry,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Accessibility {
    Reached { via: ReachedVia, page: FetchedPage },
    Failed,
}

/// Fetch `url`; only a transport-level failure triggers the `www.` retry
pub async fn check_accessibility(fetcher: &dyn PageFetcher, url: &str) -> Accessibility {
    match fetcher.fetch(url).await {
        Ok(page) => accept(page, ReachedVia::Primary),
        Err(e) => {
            debug!("Fetch of {} failed: {}", url, e);
            let Some(retry_url) = www_retry_url(url) else {
                return Accessibility::Failed;
            };
            match fetcher.fetch(&retry_url).await {
                Ok(page) => accept(page, ReachedVia::WwwRetry),
                Err(e) => {
                    debug!("Retry {} failed: {}", retry_url, e);
                    Accessibility::Failed
                }
            }
        }
    }
}

fn accept(page: FetchedPage, via: ReachedVia) -> Accessibility {
    if page.status == 200 && !page.is_placeholder() {
        Accessibility::Reached { via, page }
    } else {
        Accessibility::Failed
    }
}

/// `scheme://www.netloc`, or `None` when the netloc already starts with `www`
pub fn www_retry_url(url: &str) -> Option<String> {
    let parts = UrlParts::parse(url).ok()?;
    if parts.netloc.starts_with("www") {
        None
    } else {
        Some(format!("{}://www.{}", parts.scheme, parts.netloc))
    }
}

#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    pub check_external_links: bool,
    pub external_link_concurrency: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            check_external_links: true,
            external_link_concurrency: 8,
        }
    }
}

pub struct FeatureExtractor {
    fetcher: Arc<dyn PageFetcher>,
    link_fetcher: Arc<dyn PageFetcher>,
    probes: Arc<dyn ReputationProbes>,
    brands: Arc<BrandList>,
    options: ExtractorOptions,
}

impl FeatureExtractor {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        link_fetcher: Arc<dyn PageFetcher>,
        probes: Arc<dyn ReputationProbes>,
        brands: Arc<BrandList>,
        options: ExtractorOptions,
    ) -> Self {
        Self {
            fetcher,
            link_fetcher,
            probes,
            brands,
            options,
        }
    }

    /// Wire up the live HTTP fetchers and probes
    pub fn from_config(config: &AppConfig, brands: Arc<BrandList>) -> Result<Self> {
        let fetcher = HttpFetcher::from_config(&config.http)?;
        let link_fetcher = HttpFetcher::new(
            config.http.probe_timeout(),
            &config.http.user_agent,
            config.http.max_redirects,
        )?;
        let limiter = ProbeRateLimiter::new(config.probes.requests_per_second);
        let probes = LiveProbes::new(&config.http, &config.probes, limiter)?;

        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(link_fetcher),
            Arc::new(probes),
            brands,
            ExtractorOptions {
                check_external_links: config.probes.check_external_links,
                external_link_concurrency: config.probes.external_link_concurrency,
            },
        ))
    }

    /// Features for `url`, or `None` when it cannot be reached
    pub async fn extract(&self, url: &str) -> Option<FeatureRecord> {
        let page = match check_accessibility(self.fetcher.as_ref(), url).await {
            Accessibility::Reached { via, page } => {
                debug!("{} reached via {:?} ({} redirects)", url, via, page.history.len());
                page
            }
            Accessibility::Failed => {
                warn!("URL {} not accessible", url);
                return None;
            }
        };

        // Features describe the URL as given, never the retry URL
        let parts = match UrlParts::parse(url) {
            Ok(parts) => parts,
            Err(e) => {
                warn!("URL {} not accessible: {:#}", url, e);
                return None;
            }
        };

        let resources = ResourceClassifier::new(&parts.hostname, &parts.registrable_domain)
            .extract(&page.text());
        let lexical = lexical::analyze(url, &parts, &self.brands);
        let content = aggregate::aggregate(&resources, &parts.domain_label);
        let references = links::external_references(&resources);

        let (link_report, reputation) = tokio::join!(
            self.check_links(&references),
            self.probes.report(url, &parts.registrable_domain),
        );

        Some(FeatureRecord::assemble(
            url,
            &lexical,
            &content,
            page.history.len(),
            &link_report,
            &reputation,
        ))
    }

    async fn check_links(&self, references: &[&str]) -> ExternalLinkReport {
        if !self.options.check_external_links {
            return ExternalLinkReport::default();
        }
        links::check_external_links(
            self.link_fetcher.as_ref(),
            references,
            self.options.external_link_concurrency,
        )
        .await
    }
}
