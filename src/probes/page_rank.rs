//! Open PageRank lookup

use serde_json::Value;
use tracing::debug;

pub const UNKNOWN: i64 = -1;

/// POST `domains=<domain>` and read `data.response[0].page_rank_integer`
pub async fn page_rank(client: &reqwest::Client, endpoint: &str, domain: &str) -> i64 {
    let response = client
        .post(endpoint)
        .header("X-Requested-With", "XMLHttpRequest")
        .form(&[("domains", domain)])
        .send()
        .await;

    let body = match response {
        Ok(r) => r.json::<Value>().await,
        Err(e) => {
            debug!("Page rank request for {} failed: {}", domain, e);
            return UNKNOWN;
        }
    };

    match body {
        Ok(body) => parse_rank(&body).unwrap_or(UNKNOWN),
        Err(e) => {
            debug!("Page rank response for {} is not JSON: {}", domain, e);
            UNKNOWN
        }
    }
}

fn parse_rank(body: &Value) -> Option<i64> {
    let rank = body.pointer("/data/response/0/page_rank_integer")?;
    match rank {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
