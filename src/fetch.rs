//! Page fetching with recorded redirect history

use async_trait::async_trait;
use encoding_rs::{Encoding, UTF_8, WINDOWS_1252};
use once_cell::sync::Lazy;
use regex::bytes::Regex;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::config::HttpConfig;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("Too many redirects from {url} (limit {limit})")]
    TooManyRedirects { url: String, limit: usize },
}

/// How far into the body a `<meta>` charset declaration is looked for
const META_SNIFF_LEN: usize = 1024;

static META_CHARSET_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?i-u)<meta[^>]*?charset\s*=\s*["']?\s*([a-z0-9_.:\-]+)"#).unwrap()
});

/// Final response of a fetch
#[derive(Debug, Clone, PartialEq)]
pub struct FetchedPage {
    pub status: u16,
    pub content: Vec<u8>,
    /// URLs that answered with a redirect, in order
    pub history: Vec<String>,
    pub final_url: String,
    /// `charset` parameter of the Content-Type header, if any
    pub charset: Option<String>,
}

impl FetchedPage {
    /// Body decoded with the header charset, else a `<meta>` declaration,
    /// else UTF-8 when valid, else windows-1252
    pub fn text(&self) -> String {
        let (text, _, _) = self.encoding().decode(&self.content);
        text.into_owned()
    }

    fn encoding(&self) -> &'static Encoding {
        self.charset
            .as_deref()
            .and_then(|label| Encoding::for_label(label.as_bytes()))
            .or_else(|| meta_charset(&self.content))
            .unwrap_or_else(|| match std::str::from_utf8(&self.content) {
                Ok(_) => UTF_8,
                Err(_) => WINDOWS_1252,
            })
    }

    /// Empty body or a single space
    pub fn is_placeholder(&self) -> bool {
        self.content.is_empty() || self.content == b" "
    }
}

#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;
}

/// `reqwest` fetcher that follows redirects itself to keep the history
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
    max_redirects: usize,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str, max_redirects: usize) -> anyhow::Result<Self> {
        use anyhow::Context;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(user_agent)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self { client, max_redirects })
    }

    pub fn from_config(config: &HttpConfig) -> anyhow::Result<Self> {
        Self::new(config.request_timeout(), &config.user_agent, config.max_redirects)
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        let mut current = Url::parse(url).map_err(|e| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        let mut history = Vec::new();

        loop {
            let response = self
                .client
                .get(current.clone())
                .send()
                .await
                .map_err(|source| FetchError::Transport {
                    url: current.to_string(),
                    source,
                })?;
            let status = response.status();

            if status.is_redirection() {
                if let Some(next) = redirect_target(&response, &current) {
                    if history.len() >= self.max_redirects {
                        return Err(FetchError::TooManyRedirects {
                            url: url.to_string(),
                            limit: self.max_redirects,
                        });
                    }
                    debug!("{} redirected ({}) to {}", current, status, next);
                    history.push(current.to_string());
                    current = next;
                    continue;
                }
            }

            let charset = header_charset(&response);
            let content = response
                .bytes()
                .await
                .map_err(|source| FetchError::Transport {
                    url: current.to_string(),
                    source,
                })?
                .to_vec();

            return Ok(FetchedPage {
                status: status.as_u16(),
                content,
                history,
                final_url: current.to_string(),
                charset,
            });
        }
    }
}

/// `charset` parameter of a Content-Type value
fn header_charset(response: &reqwest::Response) -> Option<String> {
    let content_type = response.headers().get(CONTENT_TYPE)?.to_str().ok()?;
    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        name.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches('"').to_string())
            .filter(|v| !v.is_empty())
    })
}

fn meta_charset(content: &[u8]) -> Option<&'static Encoding> {
    let head = &content[..content.len().min(META_SNIFF_LEN)];
    let label = META_CHARSET_RE.captures(head)?.get(1)?;
    Encoding::for_label(label.as_bytes())
}

/// Resolve the Location header against the current URL
fn redirect_target(response: &reqwest::Response, current: &Url) -> Option<Url> {
    let location = response.headers().get(LOCATION)?.to_str().ok()?;
    current.join(location).ok()
}
