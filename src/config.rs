use std::env;
use std::time::Duration;

use anyhow::Result;

use crate::fake_service::DemoRatingsService;
use crate::ratings_api::{HttpRatingsService, RatingsService};

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:5000";
const DEFAULT_DEMO_LATENCY_MS: u64 = 400;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingsSource {
    Http,
    Demo,
}

#[derive(Debug, Clone)]
pub struct RatingsConfig {
    pub source: RatingsSource,
    pub base_url: String,
    pub timeout: Option<Duration>,
    pub demo_latency: Duration,
    /// Problems found while reading settings; surfaced in the console at startup.
    pub warnings: Vec<String>,
}

impl Default for RatingsConfig {
    fn default() -> Self {
        Self {
            source: RatingsSource::Http,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: None,
            demo_latency: Duration::from_millis(DEFAULT_DEMO_LATENCY_MS),
            warnings: Vec::new(),
        }
    }
}

impl RatingsConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(raw) = lookup("RATINGS_SOURCE").and_then(non_empty) {
            match raw.to_lowercase().as_str() {
                "http" => cfg.source = RatingsSource::Http,
                "demo" => cfg.source = RatingsSource::Demo,
                other => cfg
                    .warnings
                    .push(format!("Unknown RATINGS_SOURCE '{other}', using http")),
            }
        }

        if let Some(url) = lookup("RATINGS_BASE_URL").and_then(non_empty) {
            cfg.base_url = url.trim_end_matches('/').to_string();
        }

        if let Some(raw) = lookup("RATINGS_TIMEOUT_SECS").and_then(non_empty) {
            match raw.parse::<u64>() {
                Ok(0) => {}
                Ok(secs) => cfg.timeout = Some(Duration::from_secs(secs)),
                Err(_) => cfg
                    .warnings
                    .push(format!("Ignoring invalid RATINGS_TIMEOUT_SECS '{raw}'")),
            }
        }

        cfg.demo_latency = Duration::from_millis(
            lookup("RATINGS_DEMO_LATENCY_MS")
                .and_then(|val| val.trim().parse::<u64>().ok())
                .unwrap_or(DEFAULT_DEMO_LATENCY_MS)
                .min(10_000),
        );

        cfg
    }

    pub fn ratings_url(&self) -> String {
        format!("{}/api/ratings", self.base_url.trim_end_matches('/'))
    }
}

/// Reads `.env.local` then `.env`; variables already set win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

pub fn build_service(cfg: &RatingsConfig) -> Result<Box<dyn RatingsService + Send>> {
    match cfg.source {
        RatingsSource::Http => Ok(Box::new(HttpRatingsService::from_config(cfg)?)),
        RatingsSource::Demo => Ok(Box::new(DemoRatingsService::new(cfg.demo_latency))),
    }
}

fn non_empty(val: String) -> Option<String> {
    let trimmed = val.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use super::{DEFAULT_BASE_URL, RatingsConfig, RatingsSource};

    fn config_from(pairs: &[(&str, &str)]) -> RatingsConfig {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        RatingsConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let cfg = config_from(&[]);
        assert_eq!(cfg.source, RatingsSource::Http);
        assert_eq!(cfg.base_url, DEFAULT_BASE_URL);
        assert!(cfg.timeout.is_none());
        assert!(cfg.warnings.is_empty());
        assert_eq!(cfg.ratings_url(), "http://127.0.0.1:5000/api/ratings");
    }

    #[test]
    fn reads_source_url_and_timeout() {
        let cfg = config_from(&[
            ("RATINGS_SOURCE", "Demo"),
            ("RATINGS_BASE_URL", "https://ratings.example.org/"),
            ("RATINGS_TIMEOUT_SECS", "15"),
            ("RATINGS_DEMO_LATENCY_MS", "0"),
        ]);
        assert_eq!(cfg.source, RatingsSource::Demo);
        assert_eq!(cfg.ratings_url(), "https://ratings.example.org/api/ratings");
        assert_eq!(cfg.timeout, Some(Duration::from_secs(15)));
        assert_eq!(cfg.demo_latency, Duration::ZERO);
    }

    #[test]
    fn bad_values_fall_back_with_warnings() {
        let cfg = config_from(&[
            ("RATINGS_SOURCE", "carrier-pigeon"),
            ("RATINGS_TIMEOUT_SECS", "soon"),
        ]);
        assert_eq!(cfg.source, RatingsSource::Http);
        assert!(cfg.timeout.is_none());
        assert_eq!(cfg.warnings.len(), 2);
    }
}
