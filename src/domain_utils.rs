//! URL decomposition with Public Suffix List support.
//!
//! Splits a URL into the pieces the feature extractors work on:
//! - hostname: `login.secure.example.co.uk`
//! - domain label: `example`
//! - suffix: `co.uk`
//! - subdomain: `login.secure`
//! - registrable domain: `example.co.uk`

use anyhow::{Result, anyhow};
use std::net::IpAddr;
use url::Url;

/// The parts of a URL used by the lexical and content features
#[derive(Debug, Clone, PartialEq)]
pub struct UrlParts {
    /// Lowercase scheme (`http`, `https`, ...)
    pub scheme: String,
    /// Lowercase hostname without port
    pub hostname: String,
    /// Host and port as written in the URL authority
    pub netloc: String,
    /// Registrable label, e.g. `example` for `www.example.com`
    pub domain_label: String,
    /// Public suffix, empty for IP hosts
    pub suffix: String,
    /// Labels left of the registrable domain, empty if none
    pub subdomain: String,
    /// `label.suffix`, or the bare host for IP addresses
    pub registrable_domain: String,
    /// Everything after the first `/` that follows the suffix in the URL
    pub word_path: String,
}

impl UrlParts {
    /// Parse a URL string into its parts
    pub fn parse(raw: &str) -> Result<Self> {
        let parsed = Url::parse(raw).map_err(|e| anyhow!("Invalid URL '{}': {}", raw, e))?;
        let hostname = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| anyhow!("URL has no host: {}", raw))?
            .trim_start_matches('[')
            .trim_end_matches(']')
            .to_lowercase();

        let netloc = match parsed.port() {
            Some(port) => format!("{}:{}", parsed.host_str().unwrap_or_default(), port),
            None => parsed.host_str().unwrap_or_default().to_string(),
        };

        let (domain_label, suffix, subdomain) = split_host(&hostname);
        let registrable_domain = if suffix.is_empty() {
            domain_label.clone()
        } else {
            format!("{}.{}", domain_label, suffix)
        };
        let word_path = word_path(raw, &suffix);

        Ok(Self {
            scheme: parsed.scheme().to_lowercase(),
            hostname,
            netloc,
            domain_label,
            suffix,
            subdomain,
            registrable_domain,
            word_path,
        })
    }
}

/// Split a hostname into (label, suffix, subdomain)
fn split_host(hostname: &str) -> (String, String, String) {
    if hostname.parse::<IpAddr>().is_ok() {
        return (hostname.to_string(), String::new(), String::new());
    }

    let host = hostname.trim_end_matches('.');
    let suffix = match icann_suffix(host) {
        Some(suffix) if suffix != host => suffix,
        // The host is itself a public suffix (e.g. `co.uk`) or unparseable
        other => return fallback_split(host, other.unwrap_or_default()),
    };

    let rest = host[..host.len() - suffix.len()].trim_end_matches('.');
    let (subdomain, label) = rest.rsplit_once('.').unwrap_or(("", rest));
    (label.to_string(), suffix.to_string(), subdomain.to_string())
}

/// Public suffix of `host` from the ICANN section of the list. Private
/// entries such as `github.io` are hosts, not suffixes.
fn icann_suffix(host: &str) -> Option<&str> {
    let mut name = host;
    loop {
        let suffix = psl::suffix(name.as_bytes())?;
        let len = suffix.as_bytes().len();
        if suffix.typ() != Some(psl::Type::Private) {
            return host.get(host.len().checked_sub(len)?..);
        }
        // Retry with the private rule's leftmost label dropped
        let private = std::str::from_utf8(suffix.as_bytes()).ok()?;
        name = private.split_once('.')?.1;
    }
}

fn fallback_split(host: &str, suffix: &str) -> (String, String, String) {
    if !suffix.is_empty() && host == suffix && host.contains('.') {
        return (String::new(), suffix.to_string(), String::new());
    }
    let parts: Vec<&str> = host.split('.').collect();
    match parts.len() {
        0 => (String::new(), String::new(), String::new()),
        1 => (parts[0].to_string(), String::new(), String::new()),
        n => (
            parts[n - 2].to_string(),
            parts[n - 1].to_string(),
            parts[..n - 2].join("."),
        ),
    }
}

/// Path used for word tokenization. Starts searching at the first occurrence
/// of the suffix anywhere in the URL string (position 0 for an empty suffix).
fn word_path(url: &str, suffix: &str) -> String {
    let start = url.find(suffix).unwrap_or(url.len());
    url[start..]
        .split_once('/')
        .map(|(_, rest)| rest.to_string())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_url() {
        let parts = UrlParts::parse("http://www.example.com/wp-login.php").unwrap();
        assert_eq!(parts.scheme, "http");
        assert_eq!(parts.hostname, "www.example.com");
        assert_eq!(parts.domain_label, "example");
        assert_eq!(parts.suffix, "com");
        assert_eq!(parts.subdomain, "www");
        assert_eq!(parts.registrable_domain, "example.com");
        assert_eq!(parts.word_path, "wp-login.php");
    }

    #[test]
    fn test_compound_suffix() {
        let parts = UrlParts::parse("https://login.secure.example.co.uk/account?id=1").unwrap();
        assert_eq!(parts.domain_label, "example");
        assert_eq!(parts.suffix, "co.uk");
        assert_eq!(parts.subdomain, "login.secure");
        assert_eq!(parts.registrable_domain, "example.co.uk");
        assert_eq!(parts.word_path, "account?id=1");
    }

    #[test]
    fn test_private_suffix_is_part_of_the_domain() {
        let parts = UrlParts::parse("http://secure-apple.github.io/x").unwrap();
        assert_eq!(parts.domain_label, "github");
        assert_eq!(parts.suffix, "io");
        assert_eq!(parts.subdomain, "secure-apple");
        assert_eq!(parts.registrable_domain, "github.io");
        assert_eq!(parts.word_path, "x");
    }

    #[test]
    fn test_bare_public_suffix_host() {
        let parts = UrlParts::parse("http://co.uk/").unwrap();
        assert_eq!(parts.domain_label, "");
        assert_eq!(parts.suffix, "co.uk");
        assert_eq!(parts.subdomain, "");
    }

    #[test]
    fn test_hostname_lowercased_and_port_kept_in_netloc() {
        let parts = UrlParts::parse("http://WWW.Example.COM:8080/").unwrap();
        assert_eq!(parts.hostname, "www.example.com");
        assert_eq!(parts.netloc, "www.example.com:8080");
    }

    #[test]
    fn test_ip_host() {
        let parts = UrlParts::parse("http://192.168.0.1/admin/login").unwrap();
        assert_eq!(parts.domain_label, "192.168.0.1");
        assert_eq!(parts.suffix, "");
        assert_eq!(parts.subdomain, "");
        assert_eq!(parts.registrable_domain, "192.168.0.1");
        // An empty suffix is found at index 0, so the scheme's slash splits first
        assert_eq!(parts.word_path, "/192.168.0.1/admin/login");
    }

    #[test]
    fn test_no_path() {
        let parts = UrlParts::parse("https://example.org").unwrap();
        assert_eq!(parts.word_path, "");
    }

    #[test]
    fn test_invalid_url_rejected() {
        assert!(UrlParts::parse("not a url").is_err());
        assert!(UrlParts::parse("mailto:someone@example.com").is_err());
    }
}
