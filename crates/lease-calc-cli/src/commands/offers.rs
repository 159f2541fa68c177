use clap::Args;
use serde::Deserialize;
use serde_json::{json, Value};
use std::str::FromStr;

use lease_calc_core::catalog;
use lease_calc_core::rules;
use lease_calc_core::types::{LeasingOffer, VehicleCategory};

use crate::input;

/// Arguments for offer resolution
#[derive(Args)]
pub struct OffersArgs {
    /// Path to the leasing offer table (semicolon CSV)
    #[arg(long)]
    pub leasing: Option<String>,

    /// Powertrain category (verbrenner, elektro/hybrid)
    #[arg(long)]
    pub category: Option<String>,

    /// Model name to resolve offers for
    #[arg(long)]
    pub model: Option<String>,

    /// Path to JSON input file with offers, category and model
    #[arg(long)]
    pub input: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OffersRequest {
    offers: Vec<LeasingOffer>,
    category: VehicleCategory,
    model: String,
}

pub fn run_offers(args: OffersArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let mut warnings: Vec<String> = Vec::new();

    let request: OffersRequest = if let Some(ref path) = args.input {
        input::file::read_json(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        let leasing_path = args
            .leasing
            .as_deref()
            .ok_or("--leasing is required (or provide --input)")?;
        let category = VehicleCategory::from_str(
            args.category
                .as_deref()
                .ok_or("--category is required (or provide --input)")?,
        )?;
        let model = args
            .model
            .ok_or("--model is required (or provide --input)")?;

        let (offers, load_warnings) = catalog::load_offers(leasing_path)?;
        warnings.extend(load_warnings);
        OffersRequest {
            offers,
            category,
            model,
        }
    };

    let rule = rules::resolve(&request.offers, request.category, &request.model);
    let matched = rules::offers_for(&request.offers, request.category, &request.model);

    if matched.is_empty() {
        warnings.push(format!(
            "No offers available for {} / {}",
            request.category, request.model
        ));
    }

    Ok(json!({
        "rule": rule,
        "offers": matched,
        "warnings": warnings,
    }))
}
