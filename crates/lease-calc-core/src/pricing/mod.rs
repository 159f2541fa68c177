//! Fuel price aggregation and price table construction.
//!
//! Station readings come from the external price feed (see [`feed`]),
//! get filtered to open stations and aggregated into per-fuel
//! min/avg/max statistics. The effective [`PriceTable`] for a selected
//! tier is assembled from those statistics with per-fuel fallback to a
//! configurable static table; Super+ is derived from Super E5 and the
//! electricity price is always user-supplied, never fetched.

#[cfg(feature = "feed")]
pub mod feed;

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::LeasingError;
use crate::types::{FuelGrade, Money, PriceTier};
use crate::LeasingResult;

/// Retail spread of Super+ over Super E5, in euros per liter.
pub const SUPER_PLUS_SPREAD: Decimal = dec!(0.10);

const STAT_PRECISION: u32 = 3;

// ---------------------------------------------------------------------------
// Station readings
// ---------------------------------------------------------------------------

/// Open/closed state reported by the feed per station.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StationStatus {
    Open,
    Closed,
    #[serde(other)]
    Other,
}

/// One station's price snapshot. Ephemeral; only open stations enter
/// the aggregation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationReading {
    pub status: StationStatus,
    #[serde(default, deserialize_with = "lenient_price")]
    pub e5: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub e10: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_price")]
    pub diesel: Option<Decimal>,
}

/// The feed encodes "price unavailable" variously as `null`, `false`
/// or a missing key. Anything non-numeric maps to `None` instead of
/// failing the whole snapshot.
fn lenient_price<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.and_then(|v| v.as_f64()).and_then(Decimal::from_f64))
}

// ---------------------------------------------------------------------------
// Aggregation
// ---------------------------------------------------------------------------

/// Per-fuel price statistics for one tier. `None` means no open
/// station reported this fuel — callers must substitute the fallback
/// price, never zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelPriceStats {
    pub e5: Option<Decimal>,
    pub e10: Option<Decimal>,
    pub diesel: Option<Decimal>,
}

/// Min/avg/max statistics across all open stations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FuelStats {
    pub min: FuelPriceStats,
    pub avg: FuelPriceStats,
    pub max: FuelPriceStats,
}

impl FuelStats {
    pub fn tier(&self, tier: PriceTier) -> &FuelPriceStats {
        match tier {
            PriceTier::Min => &self.min,
            PriceTier::Avg => &self.avg,
            PriceTier::Max => &self.max,
        }
    }
}

/// Aggregate open-station readings into per-fuel min/avg/max.
///
/// Each present value is rounded to 3 decimal places before entering
/// the statistics; the mean is rounded to 3 decimal places as well.
/// Idempotent: the same reading set always yields the same stats.
pub fn aggregate(readings: &BTreeMap<String, StationReading>) -> FuelStats {
    let open: Vec<&StationReading> = readings
        .values()
        .filter(|r| r.status == StationStatus::Open)
        .collect();

    let (e5_min, e5_avg, e5_max) = fuel_stats(&open, |r| r.e5);
    let (e10_min, e10_avg, e10_max) = fuel_stats(&open, |r| r.e10);
    let (diesel_min, diesel_avg, diesel_max) = fuel_stats(&open, |r| r.diesel);

    FuelStats {
        min: FuelPriceStats {
            e5: e5_min,
            e10: e10_min,
            diesel: diesel_min,
        },
        avg: FuelPriceStats {
            e5: e5_avg,
            e10: e10_avg,
            diesel: diesel_avg,
        },
        max: FuelPriceStats {
            e5: e5_max,
            e10: e10_max,
            diesel: diesel_max,
        },
    }
}

fn fuel_stats(
    open: &[&StationReading],
    pick: fn(&StationReading) -> Option<Decimal>,
) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
    let values: Vec<Decimal> = open
        .iter()
        .filter_map(|r| pick(r))
        .map(|v| v.round_dp(STAT_PRECISION))
        .collect();

    if values.is_empty() {
        return (None, None, None);
    }

    let min = values.iter().copied().min();
    let max = values.iter().copied().max();
    let sum: Decimal = values.iter().copied().sum();
    let avg = (sum / Decimal::from(values.len() as u64)).round_dp(STAT_PRECISION);

    (min, Some(avg), max)
}

/// Aggregate with the "no data" condition made explicit: an empty
/// reading map (feed down, all failures collapse to empty) is distinct
/// from zero prices and tells the caller to use the fallback table.
pub fn get_fuel_stats(readings: &BTreeMap<String, StationReading>) -> LeasingResult<FuelStats> {
    if readings.is_empty() {
        return Err(LeasingError::InsufficientData(
            "No station prices received from the feed".into(),
        ));
    }
    Ok(aggregate(readings))
}

// ---------------------------------------------------------------------------
// Fallback prices
// ---------------------------------------------------------------------------

/// Static prices for one tier, in euros per liter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GradePrices {
    pub super_e10: Money,
    pub super_e5: Money,
    pub super_plus: Money,
    pub diesel: Money,
}

/// Fallback price table keyed by tier, used whenever the live feed has
/// no value for a fuel. One table for all three tiers so the constants
/// cannot drift apart; loadable from configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackPrices {
    pub min: GradePrices,
    pub avg: GradePrices,
    pub max: GradePrices,
}

impl FallbackPrices {
    pub fn tier(&self, tier: PriceTier) -> &GradePrices {
        match tier {
            PriceTier::Min => &self.min,
            PriceTier::Avg => &self.avg,
            PriceTier::Max => &self.max,
        }
    }
}

impl Default for FallbackPrices {
    fn default() -> Self {
        FallbackPrices {
            min: GradePrices {
                super_e10: dec!(1.68),
                super_e5: dec!(1.75),
                super_plus: dec!(1.95),
                diesel: dec!(1.55),
            },
            avg: GradePrices {
                super_e10: dec!(1.78),
                super_e5: dec!(1.85),
                super_plus: dec!(2.05),
                diesel: dec!(1.65),
            },
            max: GradePrices {
                super_e10: dec!(1.88),
                super_e5: dec!(1.95),
                super_plus: dec!(2.15),
                diesel: dec!(1.75),
            },
        }
    }
}

// ---------------------------------------------------------------------------
// Price table
// ---------------------------------------------------------------------------

/// The effective unit prices handed to the cost calculator. Rebuilt
/// wholesale on every refresh; an explicit value, never ambient state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceTable {
    #[serde(rename = "Super E10")]
    pub super_e10: Money,
    #[serde(rename = "Super E5")]
    pub super_e5: Money,
    #[serde(rename = "Super+")]
    pub super_plus: Money,
    #[serde(rename = "Diesel")]
    pub diesel: Money,
    #[serde(rename = "Strom")]
    pub strom: Money,
}

impl PriceTable {
    /// Unit price for a grade: euros per liter, or per kWh for Strom.
    pub fn get(&self, grade: FuelGrade) -> Money {
        match grade {
            FuelGrade::SuperE10 => self.super_e10,
            FuelGrade::SuperE5 => self.super_e5,
            FuelGrade::SuperPlus => self.super_plus,
            FuelGrade::Diesel => self.diesel,
            FuelGrade::Strom => self.strom,
        }
    }
}

/// Build the effective price table for a tier.
///
/// With live statistics, each fuel uses its live value if present and
/// the fallback otherwise, and Super+ is derived as Super E5 plus the
/// retail spread. Without statistics (feed down) the tier's static
/// table is used as-is, including its own Super+ constant.
pub fn build_price_table(
    tier: PriceTier,
    stats: Option<&FuelStats>,
    fallback: &FallbackPrices,
    electricity: Money,
) -> PriceTable {
    let fb = fallback.tier(tier);

    match stats {
        Some(stats) => {
            let live = stats.tier(tier);
            let e10 = live.e10.unwrap_or(fb.super_e10);
            let e5 = live.e5.unwrap_or(fb.super_e5);
            let diesel = live.diesel.unwrap_or(fb.diesel);
            PriceTable {
                super_e10: e10,
                super_e5: e5,
                super_plus: e5 + SUPER_PLUS_SPREAD,
                diesel,
                strom: electricity,
            }
        }
        None => PriceTable {
            super_e10: fb.super_e10,
            super_e5: fb.super_e5,
            super_plus: fb.super_plus,
            diesel: fb.diesel,
            strom: electricity,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn reading(status: StationStatus, e5: &str, e10: &str, diesel: &str) -> StationReading {
        let parse = |s: &str| {
            if s.is_empty() {
                None
            } else {
                Some(s.parse::<Decimal>().unwrap())
            }
        };
        StationReading {
            status,
            e5: parse(e5),
            e10: parse(e10),
            diesel: parse(diesel),
        }
    }

    fn sample_readings() -> BTreeMap<String, StationReading> {
        let mut readings = BTreeMap::new();
        readings.insert(
            "a".to_string(),
            reading(StationStatus::Open, "1.799", "1.739", "1.659"),
        );
        readings.insert(
            "b".to_string(),
            reading(StationStatus::Open, "1.859", "1.789", "1.699"),
        );
        readings.insert(
            "c".to_string(),
            reading(StationStatus::Closed, "1.399", "1.399", "1.399"),
        );
        readings
    }

    // -----------------------------------------------------------------------
    // 1. Closed stations are excluded from the statistics
    // -----------------------------------------------------------------------
    #[test]
    fn test_closed_stations_excluded() {
        let stats = aggregate(&sample_readings());
        assert_eq!(stats.min.e5, Some(dec!(1.799)));
        assert_eq!(stats.max.e5, Some(dec!(1.859)));
        assert_eq!(stats.avg.e5, Some(dec!(1.829)));
    }

    // -----------------------------------------------------------------------
    // 2. Missing fuel across all open stations yields None, not zero
    // -----------------------------------------------------------------------
    #[test]
    fn test_missing_fuel_is_none() {
        let mut readings = BTreeMap::new();
        readings.insert(
            "a".to_string(),
            reading(StationStatus::Open, "1.799", "", ""),
        );
        let stats = aggregate(&readings);
        assert_eq!(stats.min.e10, None);
        assert_eq!(stats.avg.e10, None);
        assert_eq!(stats.max.e10, None);
        assert_eq!(stats.min.e5, Some(dec!(1.799)));
    }

    // -----------------------------------------------------------------------
    // 3. Zero open stations: all statistics None for every fuel
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_open_stations() {
        let mut readings = BTreeMap::new();
        readings.insert(
            "c".to_string(),
            reading(StationStatus::Closed, "1.399", "1.399", "1.399"),
        );
        let stats = aggregate(&readings);
        for tier in [&stats.min, &stats.avg, &stats.max] {
            assert_eq!(tier.e5, None);
            assert_eq!(tier.e10, None);
            assert_eq!(tier.diesel, None);
        }
    }

    // -----------------------------------------------------------------------
    // 4. Idempotence: aggregating twice gives identical results
    // -----------------------------------------------------------------------
    #[test]
    fn test_aggregate_idempotent() {
        let readings = sample_readings();
        assert_eq!(aggregate(&readings), aggregate(&readings));
    }

    // -----------------------------------------------------------------------
    // 5. Empty reading map is the explicit "no data" condition
    // -----------------------------------------------------------------------
    #[test]
    fn test_empty_readings_signal_no_data() {
        let readings = BTreeMap::new();
        let err = get_fuel_stats(&readings).unwrap_err();
        match err {
            LeasingError::InsufficientData(_) => {}
            other => panic!("Expected InsufficientData, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // 6. Values are rounded to 3 decimal places before aggregation
    // -----------------------------------------------------------------------
    #[test]
    fn test_stat_rounding() {
        let mut readings = BTreeMap::new();
        readings.insert(
            "a".to_string(),
            reading(StationStatus::Open, "1.7994", "", ""),
        );
        readings.insert(
            "b".to_string(),
            reading(StationStatus::Open, "1.7996", "", ""),
        );
        let stats = aggregate(&readings);
        assert_eq!(stats.min.e5, Some(dec!(1.799)));
        assert_eq!(stats.max.e5, Some(dec!(1.800)));
        // mean of the rounded values, itself rounded
        assert_eq!(stats.avg.e5, Some(dec!(1.800)));
    }

    // -----------------------------------------------------------------------
    // 7. Live table: Super+ derived from E5, Strom user-supplied
    // -----------------------------------------------------------------------
    #[test]
    fn test_live_table_derives_super_plus() {
        let stats = aggregate(&sample_readings());
        let table = build_price_table(
            PriceTier::Avg,
            Some(&stats),
            &FallbackPrices::default(),
            dec!(0.30),
        );
        assert_eq!(table.super_e5, dec!(1.829));
        assert_eq!(table.super_plus, dec!(1.929));
        assert_eq!(table.strom, dec!(0.30));
    }

    // -----------------------------------------------------------------------
    // 8. Per-fuel fallback substitution when a live value is missing
    // -----------------------------------------------------------------------
    #[test]
    fn test_partial_fallback_substitution() {
        let mut readings = BTreeMap::new();
        readings.insert(
            "a".to_string(),
            reading(StationStatus::Open, "", "1.739", "1.659"),
        );
        let stats = aggregate(&readings);
        let table = build_price_table(
            PriceTier::Min,
            Some(&stats),
            &FallbackPrices::default(),
            dec!(0.25),
        );
        assert_eq!(table.super_e10, dec!(1.739));
        assert_eq!(table.super_e5, dec!(1.75)); // fallback min
        assert_eq!(table.super_plus, dec!(1.85)); // derived from fallback E5
        assert_eq!(table.diesel, dec!(1.659));
    }

    // -----------------------------------------------------------------------
    // 9. Full fallback table when the feed produced no statistics
    // -----------------------------------------------------------------------
    #[test]
    fn test_full_fallback_table() {
        let table =
            build_price_table(PriceTier::Max, None, &FallbackPrices::default(), dec!(0.40));
        assert_eq!(table.super_e10, dec!(1.88));
        assert_eq!(table.super_e5, dec!(1.95));
        assert_eq!(table.super_plus, dec!(2.15)); // static constant, not derived
        assert_eq!(table.diesel, dec!(1.75));
        assert_eq!(table.strom, dec!(0.40));
    }

    // -----------------------------------------------------------------------
    // 10. Lenient price parsing: false and null become None
    // -----------------------------------------------------------------------
    #[test]
    fn test_lenient_price_parsing() {
        let json = r#"{"status": "open", "e5": 1.799, "e10": false, "diesel": null}"#;
        let parsed: StationReading = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, StationStatus::Open);
        assert_eq!(parsed.e5, Some(dec!(1.799)));
        assert_eq!(parsed.e10, None);
        assert_eq!(parsed.diesel, None);
    }

    // -----------------------------------------------------------------------
    // 11. Unknown station status maps to Other and is excluded
    // -----------------------------------------------------------------------
    #[test]
    fn test_unknown_status_excluded() {
        let json = r#"{"status": "no prices", "e5": 1.799}"#;
        let parsed: StationReading = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.status, StationStatus::Other);

        let mut readings = BTreeMap::new();
        readings.insert("a".to_string(), parsed);
        let stats = aggregate(&readings);
        assert_eq!(stats.min.e5, None);
    }
}
