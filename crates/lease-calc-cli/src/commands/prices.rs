use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{json, Value};

use lease_calc_core::pricing::feed::{FeedConfig, PriceFeed};
use lease_calc_core::pricing::{
    aggregate, build_price_table, FallbackPrices, FuelStats, PriceTable,
};
use lease_calc_core::types::PriceTier;

use crate::input;

/// Environment fallback for the feed API key so the key never has to
/// live in the configuration file.
const API_KEY_ENV: &str = "TANKERKOENIG_API_KEY";

/// Arguments for price table construction
#[derive(Args)]
pub struct PricesArgs {
    /// Price tier (min, avg, max)
    #[arg(long, default_value = "avg")]
    pub tier: PriceTier,

    /// Electricity price in euros per kWh
    #[arg(long, default_value = "0.35")]
    pub electricity: Decimal,

    /// Path to a YAML pricing configuration (feed + fallback table)
    #[arg(long)]
    pub config: Option<String>,

    /// Skip the live feed and use the fallback table only
    #[arg(long)]
    pub offline: bool,
}

/// YAML pricing configuration. Both sections are optional; a missing
/// feed section means offline operation, a missing fallback section
/// means the built-in constants.
#[derive(Debug, Default, Deserialize)]
pub struct PricingConfig {
    #[serde(default)]
    pub feed: Option<FeedConfig>,
    #[serde(default)]
    pub fallback: Option<FallbackPrices>,
}

/// Assemble the effective price table for a tier: live statistics when
/// a feed is configured and reachable, fallback constants otherwise.
/// Degradation is reported through `warnings`, never as an error.
pub fn effective_price_table(
    tier: PriceTier,
    electricity: Decimal,
    config_path: Option<&str>,
    offline: bool,
    warnings: &mut Vec<String>,
) -> Result<(PriceTable, Option<FuelStats>), Box<dyn std::error::Error>> {
    let config: PricingConfig = match config_path {
        Some(path) => input::file::read_yaml(path)?,
        None => PricingConfig::default(),
    };

    let fallback = config.fallback.unwrap_or_default();

    let stats: Option<FuelStats> = if offline {
        None
    } else {
        match config.feed {
            Some(mut feed_config) => {
                if feed_config.api_key.is_empty() {
                    if let Ok(key) = std::env::var(API_KEY_ENV) {
                        feed_config.api_key = key;
                    }
                }
                let mut feed = PriceFeed::new(feed_config);
                let readings = feed.fetch_station_prices();
                if readings.is_empty() {
                    warnings.push("Price feed unavailable; using fallback prices".to_string());
                    None
                } else {
                    Some(aggregate(&readings))
                }
            }
            None => {
                warnings.push("No feed configured; using fallback prices".to_string());
                None
            }
        }
    };

    let table = build_price_table(tier, stats.as_ref(), &fallback, electricity);
    Ok((table, stats))
}

pub fn run_prices(args: PricesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut warnings: Vec<String> = Vec::new();

    let (table, stats) = effective_price_table(
        args.tier,
        args.electricity,
        args.config.as_deref(),
        args.offline,
        &mut warnings,
    )?;

    Ok(json!({
        "tier": args.tier,
        "result": table,
        "stats": stats,
        "warnings": warnings,
    }))
}
