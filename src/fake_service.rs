use std::thread;
use std::time::Duration;

use anyhow::Result;
use rand::Rng;

use crate::ratings_api::{PlayerResult, RatingsReply, RatingsService};

const MIN_RATING: u32 = 1000;
const RATING_SPAN: u32 = 1600;

/// Offline stand-in for the ratings service, used when `RATINGS_SOURCE=demo`.
pub struct DemoRatingsService {
    latency: Duration,
}

impl DemoRatingsService {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

impl RatingsService for DemoRatingsService {
    fn fetch_ratings(&self, names: &[String]) -> Result<RatingsReply> {
        simulate_latency(self.latency);

        let names = names
            .iter()
            .map(|n| n.trim())
            .filter(|n| !n.is_empty())
            .collect::<Vec<_>>();
        if names.is_empty() {
            return Ok(RatingsReply::Error("No names provided".to_string()));
        }

        let results = names
            .into_iter()
            .map(|name| PlayerResult {
                name: name.to_string(),
                rating: Some(demo_rating(name) as f64),
            })
            .collect();
        Ok(RatingsReply::Results(results))
    }
}

/// Stable per name, case-insensitive.
pub fn demo_rating(name: &str) -> u32 {
    // FNV-1a
    let mut hash: u32 = 0x811c_9dc5;
    for byte in name.trim().to_lowercase().bytes() {
        hash ^= byte as u32;
        hash = hash.wrapping_mul(0x0100_0193);
    }
    MIN_RATING + hash % RATING_SPAN
}

fn simulate_latency(base: Duration) {
    if base.is_zero() {
        return;
    }
    let base_ms = base.as_millis() as u64;
    let jitter = rand::thread_rng().gen_range(0..=base_ms / 2);
    thread::sleep(Duration::from_millis(base_ms + jitter));
}
