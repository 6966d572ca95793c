//! Traffic rank from the Alexa-style XML endpoint

use quick_xml::events::Event;
use tracing::debug;

pub const UNRANKED: i64 = 0;

/// GET `{endpoint}?cli=10&dat=s&url=<url>` and read the REACH rank
pub async fn web_traffic(client: &reqwest::Client, endpoint: &str, url: &str) -> i64 {
    let response = client
        .get(endpoint)
        .query(&[("cli", "10"), ("dat", "s"), ("url", url)])
        .send()
        .await;

    match response {
        Ok(r) => match r.text().await {
            Ok(body) => parse_reach_rank(&body).unwrap_or(UNRANKED),
            Err(e) => {
                debug!("Traffic rank body for {} unreadable: {}", url, e);
                UNRANKED
            }
        },
        Err(e) => {
            debug!("Traffic rank request for {} failed: {}", url, e);
            UNRANKED
        }
    }
}

/// `RANK` of the first `REACH` element
fn parse_reach_rank(xml: &str) -> Option<i64> {
    let mut reader = quick_xml::Reader::from_str(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) if e.name().as_ref() == b"REACH" => {
                return e
                    .attributes()
                    .flatten()
                    .find(|attr| attr.key.as_ref() == b"RANK")
                    .and_then(|attr| attr.unescape_value().ok())
                    .and_then(|rank| rank.trim().parse().ok());
            }
            Ok(Event::Eof) => return None,
            Err(e) => {
                debug!("Traffic rank XML unreadable: {}", e);
                return None;
            }
            _ => {}
        }
        buf.clear();
    }
}
