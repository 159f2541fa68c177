use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::Value;

use lease_calc_core::costing::{self, CostInput};
use lease_calc_core::pricing::{build_price_table, FallbackPrices, PriceTable};
use lease_calc_core::types::{FuelGrade, FuelKind, PriceTier};

use crate::input;

/// Arguments for the cost calculation
#[derive(Args)]
pub struct CostArgs {
    /// Manufacturer list price in euros
    #[arg(long)]
    pub list_price: Option<Decimal>,

    /// Monthly leasing rate in percent of list price (e.g. 0.9)
    #[arg(long)]
    pub rate: Option<Decimal>,

    /// Contract term in months
    #[arg(long)]
    pub term: Option<i32>,

    /// Total mileage allowance over the full term in km
    #[arg(long)]
    pub mileage: Option<Decimal>,

    /// Powertrain (benzin, diesel, elektro, hybrid)
    #[arg(long)]
    pub fuel_kind: Option<FuelKind>,

    /// Fuel grade to price the combustion portion with
    #[arg(long)]
    pub fuel_grade: Option<FuelGrade>,

    /// Combustion consumption in liters per 100 km
    #[arg(long, default_value = "0")]
    pub consumption: Decimal,

    /// Electric consumption in kWh per 100 km
    #[arg(long, default_value = "0")]
    pub electric_consumption: Decimal,

    /// Monthly fuel credit granted by the offer
    #[arg(long)]
    pub fuel_credit: Option<Decimal>,

    /// Price tier of the fallback table (min, avg, max)
    #[arg(long, default_value = "avg")]
    pub tier: PriceTier,

    /// Electricity price in euros per kWh
    #[arg(long, default_value = "0.35")]
    pub electricity: Decimal,

    /// Path to JSON input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,
}

/// File/stdin form of a cost request. Prices may be given explicitly;
/// otherwise the static fallback table at the selected tier applies.
#[derive(Debug, Deserialize)]
struct CostRequest {
    list_price: Decimal,
    rate_percent: Decimal,
    term_months: i32,
    mileage_allowance_km: Decimal,
    #[serde(default)]
    combustion_l_per_100km: Decimal,
    #[serde(default)]
    electric_kwh_per_100km: Decimal,
    fuel_kind: FuelKind,
    fuel_grade: FuelGrade,
    #[serde(default)]
    fuel_credit_per_month: Option<Decimal>,
    #[serde(default)]
    tier: Option<PriceTier>,
    #[serde(default)]
    electricity_price: Option<Decimal>,
    #[serde(default)]
    prices: Option<PriceTable>,
}

pub fn run_cost(args: CostArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let request: CostRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        CostRequest {
            list_price: args
                .list_price
                .ok_or("--list-price is required (or provide --input)")?,
            rate_percent: args.rate.ok_or("--rate is required (or provide --input)")?,
            term_months: args.term.ok_or("--term is required (or provide --input)")?,
            mileage_allowance_km: args
                .mileage
                .ok_or("--mileage is required (or provide --input)")?,
            combustion_l_per_100km: args.consumption,
            electric_kwh_per_100km: args.electric_consumption,
            fuel_kind: args
                .fuel_kind
                .ok_or("--fuel-kind is required (or provide --input)")?,
            fuel_grade: args
                .fuel_grade
                .ok_or("--fuel-grade is required (or provide --input)")?,
            fuel_credit_per_month: args.fuel_credit,
            tier: Some(args.tier),
            electricity_price: Some(args.electricity),
            prices: None,
        }
    };

    let prices = match request.prices {
        Some(table) => table,
        None => build_price_table(
            request.tier.unwrap_or(PriceTier::Avg),
            None,
            &FallbackPrices::default(),
            request.electricity_price.unwrap_or(dec!(0.35)),
        ),
    };

    let cost_input = CostInput {
        list_price: request.list_price,
        rate_fraction: request.rate_percent / dec!(100),
        term_months: request.term_months,
        mileage_allowance_km: request.mileage_allowance_km,
        combustion_l_per_100km: request.combustion_l_per_100km,
        electric_kwh_per_100km: request.electric_kwh_per_100km,
        fuel_kind: request.fuel_kind,
        fuel_grade: request.fuel_grade,
        fuel_credit_per_month: request.fuel_credit_per_month,
    };

    let result = costing::compute_cost(&cost_input, &prices)?;
    Ok(serde_json::to_value(result)?)
}
