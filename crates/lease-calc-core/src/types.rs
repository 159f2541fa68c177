use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::LeasingError;

/// All monetary values. Wraps Decimal to prevent accidental f64 usage.
pub type Money = Decimal;

/// Rates expressed as decimals (0.009 = 0.9% per month). Never as percentages.
pub type Rate = Decimal;

/// Top-level powertrain grouping used by the leasing rule partitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum VehicleCategory {
    Verbrenner,
    #[serde(rename = "Elektro/Hybrid")]
    ElektroHybrid,
}

impl fmt::Display for VehicleCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VehicleCategory::Verbrenner => write!(f, "Verbrenner"),
            VehicleCategory::ElektroHybrid => write!(f, "Elektro/Hybrid"),
        }
    }
}

impl FromStr for VehicleCategory {
    type Err = LeasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "verbrenner" => Ok(VehicleCategory::Verbrenner),
            "elektro/hybrid" | "elektro-hybrid" => Ok(VehicleCategory::ElektroHybrid),
            other => Err(LeasingError::InvalidInput {
                field: "category".into(),
                reason: format!("Unknown vehicle category '{other}'"),
            }),
        }
    }
}

/// Powertrain of a single engine variant. Closed set: anything the
/// catalog carries outside these spellings is rejected at the parse
/// boundary rather than silently treated as zero-cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelKind {
    Benzin,
    Diesel,
    Elektro,
    Hybrid,
}

impl FuelKind {
    /// Category the leasing rules partition this powertrain under.
    pub fn category(&self) -> VehicleCategory {
        match self {
            FuelKind::Benzin | FuelKind::Diesel => VehicleCategory::Verbrenner,
            FuelKind::Elektro | FuelKind::Hybrid => VehicleCategory::ElektroHybrid,
        }
    }
}

impl fmt::Display for FuelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelKind::Benzin => write!(f, "Benzin"),
            FuelKind::Diesel => write!(f, "Diesel"),
            FuelKind::Elektro => write!(f, "Elektro"),
            FuelKind::Hybrid => write!(f, "Hybrid"),
        }
    }
}

impl FromStr for FuelKind {
    type Err = LeasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "benzin" => Ok(FuelKind::Benzin),
            "diesel" => Ok(FuelKind::Diesel),
            "elektro" => Ok(FuelKind::Elektro),
            "hybrid" | "elektro/hybrid" => Ok(FuelKind::Hybrid),
            other => Err(LeasingError::InvalidInput {
                field: "fuel_kind".into(),
                reason: format!("Unsupported fuel kind '{other}'"),
            }),
        }
    }
}

/// Price-table key: the retail fuel grades plus household electricity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FuelGrade {
    #[serde(rename = "Super E10")]
    SuperE10,
    #[serde(rename = "Super E5")]
    SuperE5,
    #[serde(rename = "Super+")]
    SuperPlus,
    Diesel,
    Strom,
}

impl fmt::Display for FuelGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FuelGrade::SuperE10 => write!(f, "Super E10"),
            FuelGrade::SuperE5 => write!(f, "Super E5"),
            FuelGrade::SuperPlus => write!(f, "Super+"),
            FuelGrade::Diesel => write!(f, "Diesel"),
            FuelGrade::Strom => write!(f, "Strom"),
        }
    }
}

impl FromStr for FuelGrade {
    type Err = LeasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "super e10" | "e10" => Ok(FuelGrade::SuperE10),
            "super e5" | "e5" => Ok(FuelGrade::SuperE5),
            "super+" | "super plus" | "superplus" => Ok(FuelGrade::SuperPlus),
            "diesel" => Ok(FuelGrade::Diesel),
            "strom" => Ok(FuelGrade::Strom),
            other => Err(LeasingError::InvalidInput {
                field: "fuel_grade".into(),
                reason: format!("Unknown fuel grade '{other}'"),
            }),
        }
    }
}

/// Aggregation mode for station prices: cheapest, average or most
/// expensive reading across open stations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceTier {
    Min,
    Avg,
    Max,
}

impl fmt::Display for PriceTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PriceTier::Min => write!(f, "min"),
            PriceTier::Avg => write!(f, "avg"),
            PriceTier::Max => write!(f, "max"),
        }
    }
}

impl FromStr for PriceTier {
    type Err = LeasingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "min" | "cheapest" => Ok(PriceTier::Min),
            "avg" | "average" => Ok(PriceTier::Avg),
            "max" | "most-expensive" => Ok(PriceTier::Max),
            other => Err(LeasingError::InvalidInput {
                field: "tier".into(),
                reason: format!("Unknown price tier '{other}' (expected min, avg or max)"),
            }),
        }
    }
}

/// One purchasable configuration from the vehicle catalog.
/// Immutable reference data, loaded once per session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VehicleVariant {
    /// Model name (e.g. "Golf")
    pub model: String,
    /// Trim line (Ausstattungslinie)
    pub trim: String,
    /// Engine label (Motor)
    pub engine: String,
    /// Powertrain category for leasing rule resolution
    pub category: VehicleCategory,
    /// Fuel kind of this engine
    pub fuel_kind: FuelKind,
    /// Combustion consumption in liters per 100 km
    pub combustion_l_per_100km: Decimal,
    /// Electric consumption in kWh per 100 km
    pub electric_kwh_per_100km: Decimal,
    /// Manufacturer list price (UVP)
    pub list_price: Money,
    /// Optional image reference
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// One leasing product. Matched to vehicles via the rule resolver,
/// never by direct foreign key: the same offer serves every variant
/// that falls into its (category, model-or-"Rest") partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeasingOffer {
    /// Applicability: powertrain category
    pub category: VehicleCategory,
    /// Applicability: model name, or "Rest" as the per-category catch-all
    pub model_rule: String,
    /// Offer name (Leasingoption)
    pub name: String,
    /// Monthly rate in percent of list price (e.g. 0.9)
    pub rate_percent: Decimal,
    /// Contract term in months; may be zero for rate-only offers
    pub term_months: i32,
    /// Total mileage allowance over the full term in km (not per year)
    pub mileage_allowance_km: Decimal,
    /// Monthly fuel credit deducted from the fuel cost
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_credit_per_month: Option<Money>,
}

impl LeasingOffer {
    /// Rate as a fraction of list price per month (0.9% -> 0.009).
    pub fn rate_fraction(&self) -> Rate {
        self.rate_percent / dec!(100)
    }
}

/// Standard computation output envelope
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationOutput<T: Serialize> {
    pub result: T,
    pub methodology: String,
    pub assumptions: serde_json::Value,
    pub warnings: Vec<String>,
    pub metadata: ComputationMetadata,
}

/// Metadata for every computation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComputationMetadata {
    pub version: String,
    pub computation_time_us: u64,
    pub precision: String,
}

/// Helper to wrap computation results with metadata
pub fn with_metadata<T: Serialize>(
    methodology: &str,
    assumptions: &impl Serialize,
    warnings: Vec<String>,
    elapsed_us: u64,
    result: T,
) -> ComputationOutput<T> {
    ComputationOutput {
        result,
        methodology: methodology.to_string(),
        assumptions: serde_json::to_value(assumptions).unwrap_or_default(),
        warnings,
        metadata: ComputationMetadata {
            version: env!("CARGO_PKG_VERSION").to_string(),
            computation_time_us: elapsed_us,
            precision: "rust_decimal_128bit".to_string(),
        },
    }
}
