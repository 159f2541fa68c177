//! Leasing rule resolution.
//!
//! Manufacturer leasing terms are usually uniform across a powertrain
//! category except for a handful of named models (commercial vans,
//! plug-in variants of specific models). Offers are therefore
//! partitioned by (category, model) with "Rest" as the per-category
//! catch-all, and resolution walks exact match, then "Rest", then
//! echoes the original key.

use serde::{Deserialize, Serialize};

use crate::types::{LeasingOffer, VehicleCategory};

/// The per-category catch-all model rule.
pub const CATCH_ALL_MODEL: &str = "Rest";

/// Resolved rule partition key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleKey {
    pub category: VehicleCategory,
    pub model: String,
}

/// Resolve the narrowest leasing-rule partition for a vehicle.
///
/// Ordered, first match wins:
/// 1. an exact `(category, model)` partition,
/// 2. the `(category, "Rest")` catch-all,
/// 3. the original `(category, model)` unchanged. In that last case no
///    partition matches the key and the caller must treat the offer
///    set as empty and report "no offers available".
///
/// Pure function of the inputs and the offer set; no side effects.
pub fn resolve(offers: &[LeasingOffer], category: VehicleCategory, model: &str) -> RuleKey {
    let exact = offers
        .iter()
        .any(|o| o.category == category && o.model_rule == model);
    if exact {
        return RuleKey {
            category,
            model: model.to_string(),
        };
    }

    let rest = offers
        .iter()
        .any(|o| o.category == category && o.model_rule == CATCH_ALL_MODEL);
    if rest {
        return RuleKey {
            category,
            model: CATCH_ALL_MODEL.to_string(),
        };
    }

    RuleKey {
        category,
        model: model.to_string(),
    }
}

/// All offers in the resolved partition for a vehicle. An empty result
/// is a legitimate empty state, not a fault.
pub fn offers_for<'a>(
    offers: &'a [LeasingOffer],
    category: VehicleCategory,
    model: &str,
) -> Vec<&'a LeasingOffer> {
    let key = resolve(offers, category, model);
    offers
        .iter()
        .filter(|o| o.category == key.category && o.model_rule == key.model)
        .collect()
}
