//! Domain registration length from WHOIS
//!
//! Lookups use the native `whois-rust` client first and fall back to the
//! system `whois` command. Both are blocking and run on the blocking pool
//! under a deadline.

use anyhow::{Result, anyhow};
use chrono::{DateTime, Local, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::process::Command;
use std::time::Duration;
use tracing::debug;
use whois_rust::{WhoIs, WhoIsLookupOptions};

pub const LOOKUP_FAILED: i64 = -1;
pub const NO_EXPIRATION: i64 = 0;

const WHOIS_SERVERS: &str = r#"{
    "com": "whois.verisign-grs.com",
    "net": "whois.verisign-grs.com",
    "org": "whois.pir.org",
    "info": "whois.afilias.net",
    "io": "whois.nic.io",
    "co": "whois.nic.co",
    "uk": "whois.nic.uk",
    "de": "whois.denic.de",
    "fr": "whois.nic.fr",
    "ru": "whois.tcinet.ru",
    "br": "whois.registro.br",
    "": "whois.iana.org"
}"#;

static EXPIRATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?im)^\s*(?:registry expiry date|registrar registration expiration date|expiration date|expiry date|expiration time|expires on|expires|expire|paid-till|renewal date)\s*:\s*(\S.*?)\s*$",
    )
    .unwrap()
});

static NOT_REGISTERED_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:no match for|not found|no data found|no entries found|domain not found)").unwrap()
});

const DATETIME_FORMATS: [&str; 4] = [
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%d-%b-%Y %H:%M:%S",
    "%Y.%m.%d %H:%M:%S",
];

const DATE_FORMATS: [&str; 6] = ["%Y-%m-%d", "%d-%b-%Y", "%Y.%m.%d", "%d.%m.%Y", "%Y/%m/%d", "%d/%m/%Y"];

/// Absolute days between today and the earliest expiration date
pub async fn registration_length(domain: &str, timeout: Duration) -> i64 {
    match lookup(domain, timeout).await {
        Ok(text) => {
            let today = Local::now().date_naive();
            registration_days(&text, today)
        }
        Err(e) => {
            debug!("WHOIS lookup for {} failed: {:#}", domain, e);
            LOOKUP_FAILED
        }
    }
}

/// Compute the feature from raw WHOIS text
pub fn registration_days(text: &str, today: NaiveDate) -> i64 {
    if NOT_REGISTERED_RE.is_match(text) {
        return LOOKUP_FAILED;
    }

    match expiration_dates(text).into_iter().min() {
        Some(expires) => (expires - today).num_days().abs(),
        None => NO_EXPIRATION,
    }
}

/// Every parseable expiration date in the WHOIS text
pub fn expiration_dates(text: &str) -> Vec<NaiveDate> {
    EXPIRATION_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1))
        .filter_map(|m| parse_date(m.as_str()))
        .collect()
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt.date());
        }
    }

    // Date followed by a time or zone we do not model
    let first = value.split_whitespace().next()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(first) {
        return Some(dt.date_naive());
    }
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(first, format).ok())
}

async fn lookup(domain: &str, timeout: Duration) -> Result<String> {
    match native_whois(domain, timeout).await {
        Ok(text) => Ok(text),
        Err(e) => {
            debug!("whois-rust failed for {} ({:#}), trying system whois", domain, e);
            system_whois(domain, timeout).await
        }
    }
}

async fn native_whois(domain: &str, timeout: Duration) -> Result<String> {
    let whois = WhoIs::from_string(WHOIS_SERVERS)
        .map_err(|e| anyhow!("Failed to create WHOIS client: {}", e))?;
    let options = WhoIsLookupOptions::from_string(domain)
        .map_err(|e| anyhow!("Invalid domain for WHOIS lookup: {}", e))?;

    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || whois.lookup(options))).await {
        Ok(Ok(Ok(text))) => Ok(text),
        Ok(Ok(Err(e))) => Err(anyhow!("whois-rust lookup failed: {}", e)),
        Ok(Err(_)) => Err(anyhow!("whois-rust lookup task panicked")),
        Err(_) => Err(anyhow!("whois-rust lookup timed out")),
    }
}

async fn system_whois(domain: &str, timeout: Duration) -> Result<String> {
    let domain = domain.to_string();

    match tokio::time::timeout(timeout, tokio::task::spawn_blocking(move || run_whois_command(&domain))).await {
        Ok(Ok(result)) => result,
        Ok(Err(_)) => Err(anyhow!("System whois task panicked")),
        Err(_) => Err(anyhow!("System whois timed out")),
    }
}

fn run_whois_command(domain: &str) -> Result<String> {
    let commands: &[&str] = if cfg!(windows) {
        &["whois.exe", "whois"]
    } else {
        &["whois", "/usr/bin/whois", "/usr/local/bin/whois"]
    };

    for cmd in commands {
        if let Ok(output) = Command::new(cmd).arg(domain).output() {
            if output.status.success() {
                return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
            }
        }
    }

    Err(anyhow!("No working whois command found"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_verisign_style_record() {
        let text = "   Domain Name: EXAMPLE.COM\r\n   Registry Expiry Date: 2027-08-13T04:00:00Z\r\n   Registrar: RESERVED-IANA\r\n";
        assert_eq!(expiration_dates(text), vec![date(2027, 8, 13)]);
        assert_eq!(registration_days(text, date(2026, 8, 13)), 365);
    }

    #[test]
    fn test_earliest_date_wins() {
        let text = "Registry Expiry Date: 2030-01-01T00:00:00Z\nRegistrar Registration Expiration Date: 2029-01-01 00:00:00\n";
        assert_eq!(registration_days(text, date(2028, 12, 31)), 1);
    }

    #[test]
    fn test_past_expiration_is_absolute() {
        let text = "Expiry Date: 10-Jan-2020\n";
        assert_eq!(registration_days(text, date(2020, 1, 20)), 10);
    }

    #[test]
    fn test_other_registry_formats() {
        assert_eq!(expiration_dates("paid-till: 2027-03-01T21:00:00Z"), vec![date(2027, 3, 1)]);
        assert_eq!(expiration_dates("Expiration Date: 2026.11.05 12:00:00"), vec![date(2026, 11, 5)]);
        assert_eq!(expiration_dates("expires: 2025-06-30 UTC"), vec![date(2025, 6, 30)]);
    }

    #[test]
    fn test_no_expiration_is_zero() {
        let text = "Domain Name: example.de\nStatus: connect\n";
        assert_eq!(registration_days(text, date(2026, 1, 1)), NO_EXPIRATION);
    }

    #[test]
    fn test_unregistered_domain_is_failure() {
        let text = "No match for \"NOSUCHDOMAIN-XYZ.COM\".\r\n>>> Last update of whois database";
        assert_eq!(registration_days(text, date(2026, 1, 1)), LOOKUP_FAILED);
    }

    #[tokio::test]
    #[ignore = "requires network access to WHOIS servers"]
    async fn test_live_lookup() {
        let days = registration_length("example.com", Duration::from_secs(15)).await;
        assert!(days >= 0);
    }
}
