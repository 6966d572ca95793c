//! Reputation probes
//!
//! Each probe talks to one third-party service and never fails: errors
//! degrade to the probe's sentinel value.
//!
//! | probe                      | success              | failure           |
//! |----------------------------|----------------------|-------------------|
//! | domain_registration_length | days to expiration   | -1 (0 if no date) |
//! | domain_age                 | service `result`     | -1 (-2 if null)   |
//! | web_traffic                | REACH rank           | 0                 |
//! | google_index               | 0 indexed, 1 not     | 1                 |
//! | page_rank                  | page_rank_integer    | -1                |

pub mod domain_age;
pub mod links;
pub mod page_rank;
pub mod search_index;
pub mod traffic;
pub mod whois;

use anyhow::{Context, Result};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

use crate::config::{HttpConfig, ProbeConfig};
use crate::rate_limit::{ProbeRateLimiter, Service};

/// Probe outputs for one URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReputationReport {
    pub domain_registration_length: i64,
    pub domain_age: i64,
    pub web_traffic: i64,
    pub google_index: i64,
    pub page_rank: i64,
}

#[async_trait]
pub trait ReputationProbes: Send + Sync {
    /// `domain` is the registrable domain
    async fn registration_length(&self, domain: &str) -> i64;

    async fn domain_age(&self, domain: &str) -> i64;

    /// `url` is the full URL as given
    async fn web_traffic(&self, url: &str) -> i64;

    async fn search_index(&self, url: &str) -> i64;

    async fn page_rank(&self, domain: &str) -> i64;

    /// Run every probe concurrently
    async fn report(&self, url: &str, domain: &str) -> ReputationReport {
        let (domain_registration_length, domain_age, web_traffic, google_index, page_rank) = tokio::join!(
            self.registration_length(domain),
            self.domain_age(domain),
            self.web_traffic(url),
            self.search_index(url),
            self.page_rank(domain),
        );

        ReputationReport {
            domain_registration_length,
            domain_age,
            web_traffic,
            google_index,
            page_rank,
        }
    }
}

/// Probes backed by the real services
pub struct LiveProbes {
    client: reqwest::Client,
    config: ProbeConfig,
    whois_timeout: Duration,
    limiter: ProbeRateLimiter,
}

impl LiveProbes {
    pub fn new(http: &HttpConfig, config: &ProbeConfig, limiter: ProbeRateLimiter) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(http.probe_timeout())
            .user_agent(&http.user_agent)
            .build()
            .context("Failed to create probe HTTP client")?;

        debug!(
            "Reputation probes: {} req/s per service, whois timeout {}s",
            limiter.requests_per_second(),
            config.whois_timeout_secs
        );

        Ok(Self {
            client,
            config: config.clone(),
            whois_timeout: Duration::from_secs(config.whois_timeout_secs),
            limiter,
        })
    }
}

#[async_trait]
impl ReputationProbes for LiveProbes {
    async fn registration_length(&self, domain: &str) -> i64 {
        self.limiter.acquire(Service::Whois).await;
        whois::registration_length(domain, self.whois_timeout).await
    }

    async fn domain_age(&self, domain: &str) -> i64 {
        self.limiter.acquire(Service::DomainAge).await;
        domain_age::domain_age(&self.client, &self.config.domain_age_url, domain).await
    }

    async fn web_traffic(&self, url: &str) -> i64 {
        self.limiter.acquire(Service::Traffic).await;
        traffic::web_traffic(&self.client, &self.config.traffic_rank_url, url).await
    }

    async fn search_index(&self, url: &str) -> i64 {
        self.limiter.acquire(Service::SearchIndex).await;
        let engines = search_index::SearchEngines {
            primary: &self.config.search_url,
            fallback: &self.config.fallback_search_url,
        };
        search_index::google_index(&self.client, &engines, url).await
    }

    async fn page_rank(&self, domain: &str) -> i64 {
        self.limiter.acquire(Service::PageRank).await;
        page_rank::page_rank(&self.client, &self.config.page_rank_url, domain).await
    }
}
