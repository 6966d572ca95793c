//! Domain age from the fraud-check API

use serde_json::Value;
use tracing::debug;

pub const NOT_FOUND: i64 = -1;
pub const NO_RESULT: i64 = -2;

/// GET `{endpoint}/{host}` and return the JSON `result`
pub async fn domain_age(client: &reqwest::Client, endpoint: &str, domain: &str) -> i64 {
    let url = format!("{}/{}", endpoint.trim_end_matches('/'), bare_host(domain));

    let response = match client.get(&url).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!("Domain age request for {} failed: {}", domain, e);
            return NOT_FOUND;
        }
    };

    if response.status() != reqwest::StatusCode::OK {
        debug!("Domain age service answered {} for {}", response.status(), domain);
        return NOT_FOUND;
    }

    match response.json::<Value>().await {
        Ok(body) => parse_result(&body),
        Err(e) => {
            debug!("Domain age response for {} is not JSON: {}", domain, e);
            NOT_FOUND
        }
    }
}

fn parse_result(body: &Value) -> i64 {
    match body.get("result") {
        Some(Value::Null) => NO_RESULT,
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or(NOT_FOUND),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(NOT_FOUND),
        _ => NOT_FOUND,
    }
}

/// Strip any scheme, path and query
fn bare_host(domain: &str) -> &str {
    let after_scheme = domain.rsplit("//").next().unwrap_or(domain);
    let host = after_scheme.split('/').next().unwrap_or(after_scheme);
    host.split('?').next().unwrap_or(host)
}
