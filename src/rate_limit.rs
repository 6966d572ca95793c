//! Rate limiting for the reputation services
//!
//! Each third-party service gets its own request schedule so a slow WHOIS
//! server never starves the search or page-rank probes.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::{Instant, sleep};
use tracing::debug;

/// Outbound services queried per URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Service {
    Whois,
    DomainAge,
    SearchIndex,
    PageRank,
    Traffic,
}

impl Service {
    pub const ALL: [Service; 5] = [
        Service::Whois,
        Service::DomainAge,
        Service::SearchIndex,
        Service::PageRank,
        Service::Traffic,
    ];
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Service::Whois => "whois",
            Service::DomainAge => "domain_age",
            Service::SearchIndex => "search_index",
            Service::PageRank => "page_rank",
            Service::Traffic => "traffic",
        };
        f.write_str(name)
    }
}

/// Request schedule for one service. Every request moves the theoretical
/// arrival time forward by one interval; up to `requests_per_second`
/// requests may run ahead of it.
#[derive(Debug)]
pub struct SlotSchedule {
    interval: Duration,
    burst_allowance: Duration,
    next_arrival: Instant,
}

impl SlotSchedule {
    /// `None` for a rate of 0, which disables limiting
    pub fn new(requests_per_second: u32, now: Instant) -> Option<Self> {
        if requests_per_second == 0 {
            return None;
        }
        let interval = Duration::from_secs(1) / requests_per_second;
        Some(Self {
            interval,
            burst_allowance: interval * (requests_per_second - 1),
            next_arrival: now,
        })
    }

    /// Book the next slot and return how long to wait before using it
    pub fn reserve(&mut self, now: Instant) -> Duration {
        let arrival = self.next_arrival.max(now);
        self.next_arrival = arrival + self.interval;
        arrival
            .saturating_duration_since(now)
            .saturating_sub(self.burst_allowance)
    }
}

/// Per-service limiter shared by every probe of a run
#[derive(Debug, Clone)]
pub struct ProbeRateLimiter {
    /// Empty when limiting is disabled
    schedules: Arc<HashMap<Service, Mutex<SlotSchedule>>>,
    requests_per_second: u32,
}

impl ProbeRateLimiter {
    pub fn new(requests_per_second: u32) -> Self {
        let now = Instant::now();
        let schedules = Service::ALL
            .iter()
            .filter_map(|s| Some((*s, Mutex::new(SlotSchedule::new(requests_per_second, now)?))))
            .collect();

        Self {
            schedules: Arc::new(schedules),
            requests_per_second,
        }
    }

    /// No limiting at all
    pub fn unlimited() -> Self {
        Self::new(0)
    }

    /// Wait for the next free slot of `service`
    pub async fn acquire(&self, service: Service) {
        let Some(schedule) = self.schedules.get(&service) else {
            return;
        };

        let wait = schedule.lock().await.reserve(Instant::now());
        if !wait.is_zero() {
            debug!("Rate limiter: {} waiting {:?}", service, wait);
            sleep(wait).await;
        }
    }

    pub fn requests_per_second(&self) -> u32 {
        self.requests_per_second
    }
}

impl Default for ProbeRateLimiter {
    fn default() -> Self {
        Self::unlimited()
    }
}
