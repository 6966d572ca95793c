//! Search-engine index check for `site:<url>`
//!
//! The primary engine is scraped for its first result link. When it answers
//! with an error or flags the request as automated traffic, the fallback
//! engine's HTML endpoint is asked instead.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

pub const INDEXED: i64 = 0;
pub const NOT_INDEXED: i64 = 1;

const UNUSUAL_TRAFFIC_NOTICE: &str =
    "Our systems have detected unusual traffic from your computer network.";

static RSO_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("#rso").unwrap());
static DIV_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("div").unwrap());
static A_SELECTOR: Lazy<Selector> = Lazy::new(|| Selector::parse("a").unwrap());
static NO_RESULTS_SELECTOR: Lazy<Selector> =
    Lazy::new(|| Selector::parse("div.no-results").unwrap());

#[derive(Debug, Clone, Copy)]
pub struct SearchEngines<'a> {
    pub primary: &'a str,
    pub fallback: &'a str,
}

/// Outcome of reading the primary engine's result page
#[derive(Debug, Clone, Copy, PartialEq)]
enum PrimaryVerdict {
    Indexed(bool),
    Blocked,
    Unparseable,
}

pub async fn google_index(client: &reqwest::Client, engines: &SearchEngines<'_>, url: &str) -> i64 {
    let query = format!("site:{}", url);

    let body = match fetch_results(client, engines.primary, &query).await {
        Ok(body) => body,
        Err(e) => {
            info!("Primary search engine failed for {} ({}), using fallback", url, e);
            return fallback_index(client, engines.fallback, &query).await;
        }
    };

    match read_primary(&body) {
        PrimaryVerdict::Indexed(true) => INDEXED,
        PrimaryVerdict::Indexed(false) => NOT_INDEXED,
        PrimaryVerdict::Blocked => {
            info!("Primary search engine flagged automated traffic, using fallback for {}", url);
            fallback_index(client, engines.fallback, &query).await
        }
        PrimaryVerdict::Unparseable => {
            warn!("Unexpected search result layout for {}", url);
            NOT_INDEXED
        }
    }
}

async fn fetch_results(client: &reqwest::Client, endpoint: &str, query: &str) -> reqwest::Result<String> {
    client
        .get(endpoint)
        .query(&[("q", query)])
        .send()
        .await?
        .error_for_status()?
        .text()
        .await
}

async fn fallback_index(client: &reqwest::Client, endpoint: &str, query: &str) -> i64 {
    match fetch_results(client, endpoint, query).await {
        Ok(body) => read_fallback(&body),
        Err(e) => {
            warn!("Fallback search engine failed for '{}': {}", query, e);
            NOT_INDEXED
        }
    }
}

fn read_primary(body: &str) -> PrimaryVerdict {
    if body.contains(UNUSUAL_TRAFFIC_NOTICE) {
        return PrimaryVerdict::Blocked;
    }

    let document = Html::parse_document(body);
    let Some(link) = first_result_link(&document) else {
        return PrimaryVerdict::Unparseable;
    };

    match link {
        Some(a) => PrimaryVerdict::Indexed(a.value().attr("href").is_some_and(|h| !h.is_empty())),
        None => PrimaryVerdict::Indexed(false),
    }
}

/// `#rso` → first `div` → first `div` → first `a`. The outer `None` means the
/// container chain is broken; the inner one means there is no anchor.
fn first_result_link(document: &Html) -> Option<Option<ElementRef<'_>>> {
    let rso = document.select(&RSO_SELECTOR).next()?;
    let outer = rso.select(&DIV_SELECTOR).next()?;
    let inner = outer.select(&DIV_SELECTOR).next()?;
    Some(inner.select(&A_SELECTOR).next())
}

fn read_fallback(body: &str) -> i64 {
    let document = Html::parse_document(body);
    if document.select(&NO_RESULTS_SELECTOR).next().is_some() {
        NOT_INDEXED
    } else {
        INDEXED
    }
}
