//! Station price feed client.
//!
//! Queries the Tankerkönig price endpoint for a fixed set of station
//! identifiers. Every failure mode (transport, timeout, authorization,
//! malformed body, `ok: false`) collapses to an empty reading map so
//! the caller degrades to the fallback price table; the feed never
//! raises. Results are cached for a bounded window to keep the load on
//! the external API and the rate-limit exposure down.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use super::{StationReading, StationStatus};

/// Public creativecommons endpoint of the price aggregation API.
pub const DEFAULT_API_BASE: &str = "https://creativecommons.tankerkoenig.de/json";

const DEFAULT_TIMEOUT_SECS: u64 = 10;
const DEFAULT_CACHE_TTL_SECS: u64 = 300;

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_cache_ttl_secs() -> u64 {
    DEFAULT_CACHE_TTL_SECS
}

/// Feed configuration, typically loaded from a YAML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedConfig {
    /// API base URL
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// API key for the price service
    #[serde(default)]
    pub api_key: String,
    /// Station identifiers to query
    #[serde(default)]
    pub station_ids: Vec<String>,
    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Cache validity window in seconds
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
}

#[derive(Debug, Deserialize)]
struct PricesResponse {
    ok: bool,
    #[serde(default)]
    prices: BTreeMap<String, StationReading>,
}

/// Price feed with a time-boxed cache. Single-threaded host: fetches
/// are never issued concurrently, so no locking is involved.
pub struct PriceFeed {
    config: FeedConfig,
    client: reqwest::blocking::Client,
    cache: Option<(Instant, BTreeMap<String, StationReading>)>,
}

impl PriceFeed {
    pub fn new(config: FeedConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_default();
        PriceFeed {
            config,
            client,
            cache: None,
        }
    }

    /// Current readings for all configured stations, filtered to open
    /// stations. Within the TTL window repeated calls return the cached
    /// map without touching the network; an empty result is cached like
    /// any other, so a failed fetch is not retried before the window
    /// expires.
    pub fn fetch_station_prices(&mut self) -> BTreeMap<String, StationReading> {
        let ttl = Duration::from_secs(self.config.cache_ttl_secs);
        if let Some((fetched_at, cached)) = &self.cache {
            if fetched_at.elapsed() < ttl {
                return cached.clone();
            }
        }

        let readings = self.query().unwrap_or_default();
        self.cache = Some((Instant::now(), readings.clone()));
        readings
    }

    fn query(&self) -> Option<BTreeMap<String, StationReading>> {
        if self.config.api_key.is_empty() || self.config.station_ids.is_empty() {
            return None;
        }

        let url = format!("{}/prices.php", self.config.api_base);
        let response = self
            .client
            .get(&url)
            .query(&[
                ("ids", self.config.station_ids.join(",")),
                ("apikey", self.config.api_key.clone()),
            ])
            .send()
            .ok()?;

        if !response.status().is_success() {
            return None;
        }

        let body: PricesResponse = response.json().ok()?;
        if !body.ok {
            return None;
        }

        Some(
            body.prices
                .into_iter()
                .filter(|(_, r)| r.status == StationStatus::Open)
                .collect(),
        )
    }
}
