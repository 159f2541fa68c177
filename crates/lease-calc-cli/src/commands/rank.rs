use clap::Args;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Deserialize;
use serde_json::{json, Value};

use lease_calc_core::catalog::Catalog;
use lease_calc_core::costing::{self, CostInput};
use lease_calc_core::ranking::{RankedVehicle, RankingBoard};
use lease_calc_core::rules;
use lease_calc_core::types::{FuelGrade, FuelKind, PriceTier};

use crate::commands::prices;
use crate::input;

/// Arguments for ranking vehicle selections
#[derive(Args)]
pub struct RankArgs {
    /// Path to the vehicle catalog (semicolon CSV)
    #[arg(long)]
    pub autos: String,

    /// Path to the leasing offer table (semicolon CSV)
    #[arg(long)]
    pub leasing: String,

    /// Path to a JSON array of slot selections
    #[arg(long)]
    pub input: Option<String>,

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

/// One slot of the comparison: a fully-identified vehicle variant and
/// the offer chosen for it. Later entries for the same slot replace
/// earlier ones.
#[derive(Debug, Deserialize)]
struct SlotSelection {
    slot: u32,
    model: String,
    trim: String,
    engine: String,
    /// Name of the leasing offer to apply
    offer: String,
    /// Fuel grade override; defaults per powertrain
    #[serde(default)]
    fuel_grade: Option<FuelGrade>,
    #[serde(default)]
    description: Option<String>,
}

/// Default grade when the selection does not name one: diesel vehicles
/// fill diesel, electric vehicles charge, everything else takes E5.
fn default_grade(kind: FuelKind) -> FuelGrade {
    match kind {
        FuelKind::Diesel => FuelGrade::Diesel,
        FuelKind::Elektro => FuelGrade::Strom,
        FuelKind::Benzin | FuelKind::Hybrid => FuelGrade::SuperE5,
    }
}

pub fn run_rank(args: RankArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let selections: Vec<SlotSelection> = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err("--input selections are required (or pipe them via stdin)".into());
    };

    if selections.is_empty() {
        return Err("At least one slot selection is required".into());
    }

    let catalog = Catalog::load(&args.autos, &args.leasing)?;
    let mut warnings: Vec<String> = catalog.warnings.clone();

    let (prices, _) = prices::effective_price_table(
        args.tier,
        args.electricity,
        args.config.as_deref(),
        args.offline,
        &mut warnings,
    )?;

    let mut board = RankingBoard::new();

    for selection in selections {
        let variant = catalog
            .variant(&selection.model, &selection.trim, &selection.engine)
            .ok_or_else(|| {
                format!(
                    "No catalog variant for {} / {} / {}",
                    selection.model, selection.trim, selection.engine
                )
            })?;

        let applicable = rules::offers_for(&catalog.offers, variant.category, &variant.model);
        if applicable.is_empty() {
            warnings.push(format!(
                "No offers available for {} / {}; slot {} skipped",
                variant.category, variant.model, selection.slot
            ));
            continue;
        }

        let offer = applicable
            .iter()
            .find(|o| o.name == selection.offer)
            .ok_or_else(|| {
                format!(
                    "Offer '{}' is not applicable to {} / {}",
                    selection.offer, variant.category, variant.model
                )
            })?;

        let fuel_grade = selection
            .fuel_grade
            .unwrap_or_else(|| default_grade(variant.fuel_kind));

        let cost_input = CostInput {
            list_price: variant.list_price,
            rate_fraction: offer.rate_percent / dec!(100),
            term_months: offer.term_months,
            mileage_allowance_km: offer.mileage_allowance_km,
            combustion_l_per_100km: variant.combustion_l_per_100km,
            electric_kwh_per_100km: variant.electric_kwh_per_100km,
            fuel_kind: variant.fuel_kind,
            fuel_grade,
            fuel_credit_per_month: offer.fuel_credit_per_month,
        };

        let output = costing::compute_cost(&cost_input, &prices)?;
        warnings.extend(output.warnings);

        board.upsert(RankedVehicle {
            slot: selection.slot,
            model: variant.model.clone(),
            trim: variant.trim.clone(),
            engine: variant.engine.clone(),
            offer_name: offer.name.clone(),
            fuel_grade,
            list_price: variant.list_price,
            description: selection.description,
            costs: output.result,
        });
    }

    Ok(json!({
        "standings": board.standings(),
        "tier": args.tier,
        "warnings": warnings,
    }))
}
