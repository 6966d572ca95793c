use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use urlfeatures::brands::BrandList;
use urlfeatures::fetch::{FetchError, FetchedPage, PageFetcher};
use urlfeatures::pipeline::{ExtractorOptions, FeatureExtractor};
use urlfeatures::probes::{ReputationProbes, ReputationReport};

#[derive(Debug, Clone)]
pub enum Scripted {
    Page { status: u16, body: String, history: Vec<String> },
    /// Raw body bytes with the charset the server declared
    Encoded { body: Vec<u8>, charset: Option<String> },
    Unreachable,
}

impl Scripted {
    pub fn ok(body: &str) -> Self {
        Scripted::Page {
            status: 200,
            body: body.to_string(),
            history: Vec::new(),
        }
    }

    pub fn status(status: u16, body: &str) -> Self {
        Scripted::Page {
            status,
            body: body.to_string(),
            history: Vec::new(),
        }
    }

    pub fn encoded(body: &[u8], charset: Option<&str>) -> Self {
        Scripted::Encoded {
            body: body.to_vec(),
            charset: charset.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Start(String),
    End(String),
}

/// Fetcher answering from a fixed table; unknown URLs are unreachable
pub struct ScriptedFetcher {
    responses: HashMap<String, Scripted>,
    delay: Duration,
    calls: Mutex<Vec<String>>,
    events: Mutex<Vec<Event>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl ScriptedFetcher {
    pub fn new(responses: impl IntoIterator<Item = (&'static str, Scripted)>) -> Self {
        Self {
            responses: responses.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
            delay: Duration::ZERO,
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Every fetch fails
    pub fn unreachable() -> Self {
        Self::with_owned(HashMap::new(), Duration::ZERO)
    }

    pub fn with_owned(responses: HashMap<String, Scripted>, delay: Duration) -> Self {
        Self {
            responses,
            delay,
            calls: Mutex::new(Vec::new()),
            events: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn events(&self) -> Vec<Event> {
        self.events.lock().unwrap().clone()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        self.events.lock().unwrap().push(Event::Start(url.to_string()));
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.events.lock().unwrap().push(Event::End(url.to_string()));

        match self.responses.get(url) {
            Some(Scripted::Page { status, body, history }) => Ok(FetchedPage {
                status: *status,
                content: body.as_bytes().to_vec(),
                history: history.clone(),
                final_url: url.to_string(),
                charset: None,
            }),
            Some(Scripted::Encoded { body, charset }) => Ok(FetchedPage {
                status: 200,
                content: body.clone(),
                history: Vec::new(),
                final_url: url.to_string(),
                charset: charset.clone(),
            }),
            Some(Scripted::Unreachable) | None => Err(FetchError::InvalidUrl {
                url: url.to_string(),
                reason: "connection refused".to_string(),
            }),
        }
    }
}

/// Probes returning fixed values, counting how often they ran
pub struct FixedProbes {
    pub report: ReputationReport,
    pub domains_seen: Mutex<Vec<String>>,
}

impl FixedProbes {
    pub fn new() -> Self {
        Self {
            report: ReputationReport {
                domain_registration_length: 365,
                domain_age: 4000,
                web_traffic: 1500,
                google_index: 0,
                page_rank: 5,
            },
            domains_seen: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ReputationProbes for FixedProbes {
    async fn registration_length(&self, domain: &str) -> i64 {
        self.domains_seen.lock().unwrap().push(domain.to_string());
        self.report.domain_registration_length
    }

    async fn domain_age(&self, _domain: &str) -> i64 {
        self.report.domain_age
    }

    async fn web_traffic(&self, _url: &str) -> i64 {
        self.report.web_traffic
    }

    async fn search_index(&self, _url: &str) -> i64 {
        self.report.google_index
    }

    async fn page_rank(&self, _domain: &str) -> i64 {
        self.report.page_rank
    }
}

pub fn extractor(
    fetcher: Arc<ScriptedFetcher>,
    link_fetcher: Arc<ScriptedFetcher>,
    check_external_links: bool,
) -> FeatureExtractor {
    FeatureExtractor::new(
        fetcher,
        link_fetcher,
        Arc::new(FixedProbes::new()),
        Arc::new(BrandList::from_lines(["example.com", "paypal.com"])),
        ExtractorOptions {
            check_external_links,
            external_link_concurrency: 4,
        },
    )
}
