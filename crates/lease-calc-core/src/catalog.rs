//! Catalog loading for vehicles and leasing offers.
//!
//! Both tables are semicolon-separated CSV exports of the ETL step.
//! Numeric fields follow a coerce-to-default policy: an unparseable
//! consumption, price or term becomes the documented default instead of
//! failing the load. Rows whose category or fuel kind cannot be mapped
//! onto the closed enums are skipped and reported as warnings. The only
//! fatal condition is a completely empty table.

use rust_decimal::Decimal;
use serde::Deserialize;
use std::fs::File;
use std::io::Read;
use std::path::Path;

use crate::error::LeasingError;
use crate::types::{FuelKind, LeasingOffer, VehicleCategory, VehicleVariant};
use crate::LeasingResult;

const CSV_DELIMITER: u8 = b';';

// ---------------------------------------------------------------------------
// Raw rows
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct VehicleRow {
    #[serde(rename = "Modell")]
    model: String,
    #[serde(rename = "Ausstattungslinie")]
    trim: String,
    #[serde(rename = "Motor")]
    engine: String,
    #[serde(rename = "Kategorie")]
    category: String,
    #[serde(rename = "Kraftstoff")]
    fuel_kind: String,
    #[serde(rename = "l/100km", default)]
    combustion: String,
    #[serde(rename = "kWh/100km", default)]
    electric: String,
    #[serde(rename = "Preis", default)]
    price: String,
    #[serde(rename = "Bild", default)]
    image: String,
}

#[derive(Debug, Deserialize)]
struct OfferRow {
    #[serde(rename = "Bedingung Kraftstoff")]
    category: String,
    #[serde(rename = "Bedingung Modell")]
    model_rule: String,
    #[serde(rename = "Leasingoption")]
    name: String,
    #[serde(rename = "Leasingrate", default)]
    rate_percent: String,
    #[serde(rename = "Laufzeit", default)]
    term_months: String,
    #[serde(rename = "Freikilometer", default)]
    mileage: String,
    #[serde(rename = "Tankguthaben", default)]
    fuel_credit: String,
}

// ---------------------------------------------------------------------------
// Coercion
// ---------------------------------------------------------------------------

/// Vendor exports write decimals with a comma; normalize before parsing.
fn coerce_decimal(raw: &str, default: Decimal) -> Decimal {
    raw.trim()
        .replace(',', ".")
        .parse::<Decimal>()
        .unwrap_or(default)
}

fn coerce_i32(raw: &str, default: i32) -> i32 {
    match raw.trim().parse::<i32>() {
        Ok(v) => v,
        // "6.0" style integers still coerce
        Err(_) => coerce_decimal(raw, Decimal::from(default))
            .trunc()
            .try_into()
            .unwrap_or(default),
    }
}

fn optional_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.replace(',', ".").parse::<Decimal>().ok()
}

// ---------------------------------------------------------------------------
// Loaders
// ---------------------------------------------------------------------------

/// Read the vehicle table from any reader. Returns the variants plus
/// warnings for skipped rows.
pub fn read_vehicles<R: Read>(reader: R) -> LeasingResult<(Vec<VehicleVariant>, Vec<String>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .flexible(true)
        .from_reader(reader);

    let mut vehicles = Vec::new();
    let mut warnings = Vec::new();

    for (index, record) in csv_reader.deserialize::<VehicleRow>().enumerate() {
        let line = index + 2; // header is line 1
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                warnings.push(format!("vehicle row {line} skipped: {e}"));
                continue;
            }
        };

        let category: VehicleCategory = match row.category.parse() {
            Ok(c) => c,
            Err(e) => {
                warnings.push(format!("vehicle row {line} skipped: {e}"));
                continue;
            }
        };
        let fuel_kind: FuelKind = match row.fuel_kind.parse() {
            Ok(k) => k,
            Err(e) => {
                warnings.push(format!("vehicle row {line} skipped: {e}"));
                continue;
            }
        };

        let image = row.image.trim();
        vehicles.push(VehicleVariant {
            model: row.model.trim().to_string(),
            trim: row.trim.trim().to_string(),
            engine: row.engine.trim().to_string(),
            category,
            fuel_kind,
            combustion_l_per_100km: coerce_decimal(&row.combustion, Decimal::ZERO),
            electric_kwh_per_100km: coerce_decimal(&row.electric, Decimal::ZERO),
            list_price: coerce_decimal(&row.price, Decimal::ZERO),
            image: if image.is_empty() {
                None
            } else {
                Some(image.to_string())
            },
        });
    }

    Ok((vehicles, warnings))
}

/// Read the leasing offer table from any reader.
pub fn read_offers<R: Read>(reader: R) -> LeasingResult<(Vec<LeasingOffer>, Vec<String>)> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .delimiter(CSV_DELIMITER)
        .flexible(true)
        .from_reader(reader);

    let mut offers = Vec::new();
    let mut warnings = Vec::new();

    for (index, record) in csv_reader.deserialize::<OfferRow>().enumerate() {
        let line = index + 2;
        let row = match record {
            Ok(row) => row,
            Err(e) => {
                warnings.push(format!("offer row {line} skipped: {e}"));
                continue;
            }
        };

        let category: VehicleCategory = match row.category.parse() {
            Ok(c) => c,
            Err(e) => {
                warnings.push(format!("offer row {line} skipped: {e}"));
                continue;
            }
        };

        offers.push(LeasingOffer {
            category,
            model_rule: row.model_rule.trim().to_string(),
            name: row.name.trim().to_string(),
            rate_percent: coerce_decimal(&row.rate_percent, Decimal::ZERO),
            term_months: coerce_i32(&row.term_months, 0),
            mileage_allowance_km: coerce_decimal(&row.mileage, Decimal::ZERO),
            fuel_credit_per_month: optional_decimal(&row.fuel_credit),
        });
    }

    Ok((offers, warnings))
}

pub fn load_vehicles(path: impl AsRef<Path>) -> LeasingResult<(Vec<VehicleVariant>, Vec<String>)> {
    let file = File::open(path.as_ref())
        .map_err(|e| LeasingError::Io(format!("{}: {e}", path.as_ref().display())))?;
    read_vehicles(file)
}

pub fn load_offers(path: impl AsRef<Path>) -> LeasingResult<(Vec<LeasingOffer>, Vec<String>)> {
    let file = File::open(path.as_ref())
        .map_err(|e| LeasingError::Io(format!("{}: {e}", path.as_ref().display())))?;
    read_offers(file)
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

/// The session's immutable reference data: vehicle variants and leasing
/// offers, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    pub vehicles: Vec<VehicleVariant>,
    pub offers: Vec<LeasingOffer>,
    /// Rows skipped during loading
    pub warnings: Vec<String>,
}

impl Catalog {
    /// Load both tables. Total absence of vehicles or offers is the one
    /// startup-fatal condition; individual bad rows only warn.
    pub fn load(
        vehicles_path: impl AsRef<Path>,
        offers_path: impl AsRef<Path>,
    ) -> LeasingResult<Self> {
        let (vehicles, mut warnings) = load_vehicles(vehicles_path)?;
        let (offers, offer_warnings) = load_offers(offers_path)?;
        warnings.extend(offer_warnings);
        Self::from_parts(vehicles, offers, warnings)
    }

    pub fn from_parts(
        vehicles: Vec<VehicleVariant>,
        offers: Vec<LeasingOffer>,
        warnings: Vec<String>,
    ) -> LeasingResult<Self> {
        if vehicles.is_empty() {
            return Err(LeasingError::EmptyCatalog(
                "no vehicle variants loaded".into(),
            ));
        }
        if offers.is_empty() {
            return Err(LeasingError::EmptyCatalog("no leasing offers loaded".into()));
        }
        Ok(Catalog {
            vehicles,
            offers,
            warnings,
        })
    }

    /// Distinct model names, sorted.
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.vehicles.iter().map(|v| v.model.as_str()).collect();
        models.sort_unstable();
        models.dedup();
        models
    }

    /// Distinct trim lines for a model, sorted.
    pub fn trims_for(&self, model: &str) -> Vec<&str> {
        let mut trims: Vec<&str> = self
            .vehicles
            .iter()
            .filter(|v| v.model == model)
            .map(|v| v.trim.as_str())
            .collect();
        trims.sort_unstable();
        trims.dedup();
        trims
    }

    /// Distinct engine labels for a model + trim, sorted.
    pub fn engines_for(&self, model: &str, trim: &str) -> Vec<&str> {
        let mut engines: Vec<&str> = self
            .vehicles
            .iter()
            .filter(|v| v.model == model && v.trim == trim)
            .map(|v| v.engine.as_str())
            .collect();
        engines.sort_unstable();
        engines.dedup();
        engines
    }

    /// The fully-identified variant, if present.
    pub fn variant(&self, model: &str, trim: &str, engine: &str) -> Option<&VehicleVariant> {
        self.vehicles
            .iter()
            .find(|v| v.model == model && v.trim == trim && v.engine == engine)
    }
}
