//! Leasing and operating cost calculation.
//!
//! Computes monthly and total leasing cost, fuel cost and combined
//! cost for one fully-resolved vehicle + offer combination against an
//! explicit price table. Below-market employee leases on combustion
//! vehicles additionally carry a benefit-in-kind tax surcharge: pricing
//! the lease under the statutory 1%-of-list-price private-use benchmark
//! creates a taxable perk proportional to the shortfall, of which one
//! third is applied as an approximate net tax burden.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::LeasingError;
use crate::pricing::PriceTable;
use crate::types::{with_metadata, ComputationOutput, FuelGrade, FuelKind, Money, Rate};
use crate::LeasingResult;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Statutory private-use benchmark: 1% of list price per month.
const PRIVATE_USE_BENCHMARK: Decimal = dec!(0.01);
/// One third of the benefit is applied as the net tax surcharge.
const TAX_SURCHARGE_DIVISOR: Decimal = dec!(3);

const MONEY_PRECISION: u32 = 2;

// ---------------------------------------------------------------------------
// Input / output types
// ---------------------------------------------------------------------------

/// Fully-resolved input for one cost computation. Callers sanitize the
/// raw catalog and UI values first; this struct assumes valid numerics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostInput {
    /// Manufacturer list price (UVP)
    pub list_price: Money,
    /// Monthly leasing rate as a fraction of list price (0.9% -> 0.009)
    pub rate_fraction: Rate,
    /// Contract term in months; zero or negative is the degenerate
    /// rate-only case, not an error
    pub term_months: i32,
    /// Total mileage allowance over the full term in km
    pub mileage_allowance_km: Decimal,
    /// Combustion consumption in liters per 100 km
    pub combustion_l_per_100km: Decimal,
    /// Electric consumption in kWh per 100 km
    pub electric_kwh_per_100km: Decimal,
    /// Powertrain of the vehicle
    pub fuel_kind: FuelKind,
    /// Fuel grade the combustion portion is priced with
    pub fuel_grade: FuelGrade,
    /// Monthly fuel credit granted by the offer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fuel_credit_per_month: Option<Money>,
}

/// Computed cost breakdown for one vehicle + offer + price table.
/// Derived data, recomputed whenever an input changes. For term > 0
/// every total equals the monthly figure times the term.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    /// Monthly leasing cost, including any benefit-in-kind surcharge
    pub leasing_cost_per_month: Money,
    /// Leasing cost over the full term
    pub leasing_cost_total: Money,
    /// Monthly fuel cost after the fuel credit
    pub fuel_cost_per_month: Money,
    /// Fuel cost over the full term
    pub fuel_cost_total: Money,
    /// Monthly combined cost
    pub combined_cost_per_month: Money,
    /// Combined cost over the full term
    pub combined_cost_total: Money,
    /// Monthly benefit-in-kind surcharge, present only for underpriced
    /// combustion leases
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit_in_kind_per_month: Option<Money>,
    /// Benefit-in-kind surcharge over the full term
    #[serde(skip_serializing_if = "Option::is_none")]
    pub benefit_in_kind_total: Option<Money>,
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Compute the cost record for one vehicle + offer against a price
/// table. Monetary outputs are rounded to 2 decimal places at the
/// reporting boundary only, never during accumulation.
pub fn compute_cost(
    input: &CostInput,
    prices: &PriceTable,
) -> LeasingResult<ComputationOutput<CostRecord>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_input(input)?;

    if input.fuel_kind == FuelKind::Diesel && input.fuel_grade != FuelGrade::Diesel {
        warnings.push(format!(
            "Diesel vehicle priced with grade '{}'",
            input.fuel_grade
        ));
    }

    let leasing_base = input.list_price * input.rate_fraction;
    let surcharge = benefit_in_kind_surcharge(input);
    let leasing_per_month = leasing_base + surcharge.unwrap_or(Decimal::ZERO);

    // Degenerate offer: only the monthly leasing figure is meaningful.
    if input.term_months <= 0 {
        warnings.push(format!(
            "Contract term is {} months; totals and fuel costs are not defined",
            input.term_months
        ));
        let record = CostRecord {
            leasing_cost_per_month: leasing_per_month.round_dp(MONEY_PRECISION),
            leasing_cost_total: Decimal::ZERO,
            fuel_cost_per_month: Decimal::ZERO,
            fuel_cost_total: Decimal::ZERO,
            combined_cost_per_month: leasing_per_month.round_dp(MONEY_PRECISION),
            combined_cost_total: Decimal::ZERO,
            benefit_in_kind_per_month: surcharge.map(|s| s.round_dp(MONEY_PRECISION)),
            benefit_in_kind_total: surcharge.map(|_| Decimal::ZERO),
        };
        let elapsed = start.elapsed().as_micros() as u64;
        return Ok(with_metadata(
            "Employee leasing cost, rate-only (degenerate term)",
            input,
            warnings,
            elapsed,
            record,
        ));
    }

    let term = Decimal::from(input.term_months);
    let fuel_gross = fuel_cost_per_month(input, prices, term);
    let credit = input.fuel_credit_per_month.unwrap_or(Decimal::ZERO);
    // The credit nets only the fuel component, floored at zero.
    let fuel_per_month = (fuel_gross - credit).max(Decimal::ZERO);

    let combined_per_month = leasing_per_month + fuel_per_month;

    let record = CostRecord {
        leasing_cost_per_month: leasing_per_month.round_dp(MONEY_PRECISION),
        leasing_cost_total: (leasing_per_month * term).round_dp(MONEY_PRECISION),
        fuel_cost_per_month: fuel_per_month.round_dp(MONEY_PRECISION),
        fuel_cost_total: (fuel_per_month * term).round_dp(MONEY_PRECISION),
        combined_cost_per_month: combined_per_month.round_dp(MONEY_PRECISION),
        combined_cost_total: (combined_per_month * term).round_dp(MONEY_PRECISION),
        benefit_in_kind_per_month: surcharge.map(|s| s.round_dp(MONEY_PRECISION)),
        benefit_in_kind_total: surcharge.map(|s| (s * term).round_dp(MONEY_PRECISION)),
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Employee leasing cost with benefit-in-kind surcharge",
        input,
        warnings,
        elapsed,
        record,
    ))
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

fn validate_input(input: &CostInput) -> LeasingResult<()> {
    if input.list_price < Decimal::ZERO {
        return Err(LeasingError::InvalidInput {
            field: "list_price".into(),
            reason: "List price must not be negative".into(),
        });
    }
    if input.rate_fraction < Decimal::ZERO {
        return Err(LeasingError::InvalidInput {
            field: "rate_fraction".into(),
            reason: "Leasing rate must not be negative".into(),
        });
    }
    if input.mileage_allowance_km < Decimal::ZERO {
        return Err(LeasingError::InvalidInput {
            field: "mileage_allowance_km".into(),
            reason: "Mileage allowance must not be negative".into(),
        });
    }
    if input.combustion_l_per_100km < Decimal::ZERO {
        return Err(LeasingError::InvalidInput {
            field: "combustion_l_per_100km".into(),
            reason: "Consumption must not be negative".into(),
        });
    }
    if input.electric_kwh_per_100km < Decimal::ZERO {
        return Err(LeasingError::InvalidInput {
            field: "electric_kwh_per_100km".into(),
            reason: "Consumption must not be negative".into(),
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Benefit-in-kind surcharge for underpriced combustion leases.
///
/// Applies only to Benzin/Diesel vehicles with a monthly rate below the
/// statutory 1% private-use benchmark. The benchmark value is floored,
/// not rounded, per the statutory convention it encodes.
fn benefit_in_kind_surcharge(input: &CostInput) -> Option<Money> {
    if !matches!(input.fuel_kind, FuelKind::Benzin | FuelKind::Diesel) {
        return None;
    }
    if input.rate_fraction >= PRIVATE_USE_BENCHMARK {
        return None;
    }

    let private_use_value = (input.list_price * PRIVATE_USE_BENCHMARK).floor();
    let shortfall = private_use_value - input.list_price * input.rate_fraction;
    let benefit = shortfall.max(Decimal::ZERO);
    Some(benefit / TAX_SURCHARGE_DIVISOR)
}

/// Monthly fuel cost before the credit, by fuel kind. The hybrid case
/// sums the combustion and electric portions, each priced with its own
/// consumption figure.
fn fuel_cost_per_month(input: &CostInput, prices: &PriceTable, term: Decimal) -> Money {
    let distance_per_100 = input.mileage_allowance_km / dec!(100);
    let combustion =
        distance_per_100 * input.combustion_l_per_100km * prices.get(input.fuel_grade) / term;
    let electric =
        distance_per_100 * input.electric_kwh_per_100km * prices.get(FuelGrade::Strom) / term;

    match input.fuel_kind {
        FuelKind::Benzin | FuelKind::Diesel => combustion,
        FuelKind::Elektro => electric,
        FuelKind::Hybrid => combustion + electric,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn test_prices() -> PriceTable {
        PriceTable {
            super_e10: dec!(1.70),
            super_e5: dec!(1.80),
            super_plus: dec!(1.90),
            diesel: dec!(1.60),
            strom: dec!(0.30),
        }
    }

    fn benzin_input() -> CostInput {
        CostInput {
            list_price: dec!(30000),
            rate_fraction: dec!(0.009),
            term_months: 12,
            mileage_allowance_km: dec!(15000),
            combustion_l_per_100km: dec!(6.0),
            electric_kwh_per_100km: dec!(0),
            fuel_kind: FuelKind::Benzin,
            fuel_grade: FuelGrade::SuperE5,
            fuel_credit_per_month: None,
        }
    }

    // -----------------------------------------------------------------------
    // 1. Underpriced Benzin lease: full breakdown including surcharge
    // -----------------------------------------------------------------------
    #[test]
    fn test_underpriced_benzin_lease() {
        let output = compute_cost(&benzin_input(), &test_prices()).unwrap();
        let r = output.result;

        // base 270.00, private use floor(300) = 300, benefit 30, surcharge 10
        assert_eq!(r.benefit_in_kind_per_month, Some(dec!(10.00)));
        assert_eq!(r.leasing_cost_per_month, dec!(280.00));
        // (15000/100) * 6.0 * 1.80 / 12
        assert_eq!(r.fuel_cost_per_month, dec!(135.00));
        assert_eq!(r.combined_cost_per_month, dec!(415.00));
        assert_eq!(r.combined_cost_total, dec!(4980.00));
        assert_eq!(r.leasing_cost_total, dec!(3360.00));
        assert_eq!(r.fuel_cost_total, dec!(1620.00));
        assert_eq!(r.benefit_in_kind_total, Some(dec!(120.00)));
    }

    // -----------------------------------------------------------------------
    // 2. Degenerate term: only the monthly leasing figure is reported
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_term_rate_only() {
        let mut input = benzin_input();
        input.term_months = 0;
        let output = compute_cost(&input, &test_prices()).unwrap();
        let r = output.result;

        assert_eq!(r.leasing_cost_per_month, dec!(280.00));
        assert_eq!(r.combined_cost_per_month, dec!(280.00));
        assert_eq!(r.leasing_cost_total, Decimal::ZERO);
        assert_eq!(r.fuel_cost_per_month, Decimal::ZERO);
        assert_eq!(r.fuel_cost_total, Decimal::ZERO);
        assert_eq!(r.combined_cost_total, Decimal::ZERO);
        assert!(!output.warnings.is_empty());
    }

    #[test]
    fn test_negative_term_rate_only() {
        let mut input = benzin_input();
        input.term_months = -6;
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        assert_eq!(r.leasing_cost_per_month, dec!(280.00));
        assert_eq!(r.combined_cost_total, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 3. Hybrid: combustion and electric portions both contribute
    // -----------------------------------------------------------------------
    #[test]
    fn test_hybrid_fuel_cost() {
        let prices = PriceTable {
            super_e10: dec!(1.75),
            super_e5: dec!(1.85),
            super_plus: dec!(1.95),
            diesel: dec!(1.65),
            strom: dec!(0.30),
        };
        let input = CostInput {
            list_price: dec!(40000),
            rate_fraction: dec!(0.01),
            term_months: 6,
            mileage_allowance_km: dec!(10000),
            combustion_l_per_100km: dec!(1.5),
            electric_kwh_per_100km: dec!(14),
            fuel_kind: FuelKind::Hybrid,
            fuel_grade: FuelGrade::SuperE5,
            fuel_credit_per_month: None,
        };
        let r = compute_cost(&input, &prices).unwrap().result;

        // (10000/100 * 1.5 * 1.85)/6 + (10000/100 * 14 * 0.30)/6 = 46.25 + 70.00
        assert_eq!(r.fuel_cost_per_month, dec!(116.25));
        assert_eq!(r.fuel_cost_total, dec!(697.50));
        // Hybrid never carries the surcharge
        assert_eq!(r.benefit_in_kind_per_month, None);
    }

    // -----------------------------------------------------------------------
    // 4. Elektro: priced with Strom only
    // -----------------------------------------------------------------------
    #[test]
    fn test_elektro_uses_strom_price() {
        let input = CostInput {
            list_price: dec!(45000),
            rate_fraction: dec!(0.009),
            term_months: 12,
            mileage_allowance_km: dec!(12000),
            combustion_l_per_100km: dec!(0),
            electric_kwh_per_100km: dec!(16),
            fuel_kind: FuelKind::Elektro,
            fuel_grade: FuelGrade::Strom,
            fuel_credit_per_month: None,
        };
        let r = compute_cost(&input, &test_prices()).unwrap().result;

        // 12000/100 * 16 * 0.30 / 12 = 48.00
        assert_eq!(r.fuel_cost_per_month, dec!(48.00));
        // Elektro never carries the surcharge, even below the benchmark
        assert_eq!(r.benefit_in_kind_per_month, None);
    }

    // -----------------------------------------------------------------------
    // 5. Surcharge boundary: exactly 1% carries no surcharge
    // -----------------------------------------------------------------------
    #[test]
    fn test_no_surcharge_at_benchmark_rate() {
        let mut input = benzin_input();
        input.rate_fraction = dec!(0.01);
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        assert_eq!(r.benefit_in_kind_per_month, None);
        assert_eq!(r.leasing_cost_per_month, dec!(300.00));
    }

    #[test]
    fn test_surcharge_above_benchmark_rate() {
        let mut input = benzin_input();
        input.rate_fraction = dec!(0.012);
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        assert_eq!(r.benefit_in_kind_per_month, None);
    }

    // -----------------------------------------------------------------------
    // 6. Surcharge floors the benchmark, not rounds it
    // -----------------------------------------------------------------------
    #[test]
    fn test_private_use_value_is_floored() {
        let mut input = benzin_input();
        // 1% of 30099 = 300.99, floored to 300; base = 270.891
        input.list_price = dec!(30099);
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        // surcharge = (300 - 270.891) / 3 = 9.703
        assert_eq!(r.benefit_in_kind_per_month, Some(dec!(9.70)));
        assert_eq!(r.leasing_cost_per_month, dec!(280.59));
    }

    // -----------------------------------------------------------------------
    // 7. Surcharge never negative: floor can undercut the base rate
    // -----------------------------------------------------------------------
    #[test]
    fn test_surcharge_floored_at_zero() {
        let input = CostInput {
            list_price: dec!(50),
            rate_fraction: dec!(0.009),
            term_months: 12,
            mileage_allowance_km: dec!(0),
            combustion_l_per_100km: dec!(0),
            electric_kwh_per_100km: dec!(0),
            fuel_kind: FuelKind::Benzin,
            fuel_grade: FuelGrade::SuperE5,
            fuel_credit_per_month: None,
        };
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        // floor(0.50) = 0, shortfall 0 - 0.45 clamps to 0
        assert_eq!(r.benefit_in_kind_per_month, Some(dec!(0.00)));
    }

    // -----------------------------------------------------------------------
    // 8. Totals equal monthly times term within rounding tolerance
    // -----------------------------------------------------------------------
    #[test]
    fn test_total_is_monthly_times_term() {
        let mut input = benzin_input();
        input.combustion_l_per_100km = dec!(5.7);
        input.term_months = 7;
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        let term = dec!(7);

        let tolerance = dec!(0.01);
        for (total, monthly) in [
            (r.leasing_cost_total, r.leasing_cost_per_month),
            (r.fuel_cost_total, r.fuel_cost_per_month),
            (r.combined_cost_total, r.combined_cost_per_month),
        ] {
            let diff = (total - monthly * term).abs();
            assert!(
                diff <= tolerance,
                "total {} deviates from monthly {} x {}",
                total,
                monthly,
                term
            );
        }
    }

    // -----------------------------------------------------------------------
    // 9. Fuel credit nets the fuel cost, floored at zero
    // -----------------------------------------------------------------------
    #[test]
    fn test_fuel_credit_netting() {
        let mut input = benzin_input();
        input.fuel_credit_per_month = Some(dec!(35));
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        assert_eq!(r.fuel_cost_per_month, dec!(100.00));

        input.fuel_credit_per_month = Some(dec!(500));
        let r = compute_cost(&input, &test_prices()).unwrap().result;
        assert_eq!(r.fuel_cost_per_month, dec!(0.00));
        // The credit never offsets the leasing component
        assert_eq!(r.combined_cost_per_month, r.leasing_cost_per_month);
    }

    // -----------------------------------------------------------------------
    // 10. Validation: negative inputs are rejected
    // -----------------------------------------------------------------------
    #[test]
    fn test_negative_list_price_rejected() {
        let mut input = benzin_input();
        input.list_price = dec!(-1);
        match compute_cost(&input, &test_prices()).unwrap_err() {
            LeasingError::InvalidInput { field, .. } => assert_eq!(field, "list_price"),
            other => panic!("Expected InvalidInput, got {:?}", other),
        }
    }

    #[test]
    fn test_negative_consumption_rejected() {
        let mut input = benzin_input();
        input.combustion_l_per_100km = dec!(-0.1);
        assert!(compute_cost(&input, &test_prices()).is_err());
    }

    // -----------------------------------------------------------------------
    // 11. Diesel priced with a petrol grade produces a warning
    // -----------------------------------------------------------------------
    #[test]
    fn test_diesel_grade_mismatch_warns() {
        let mut input = benzin_input();
        input.fuel_kind = FuelKind::Diesel;
        input.fuel_grade = FuelGrade::SuperE10;
        let output = compute_cost(&input, &test_prices()).unwrap();
        assert!(output
            .warnings
            .iter()
            .any(|w| w.contains("Diesel vehicle priced with grade")));
    }
}
