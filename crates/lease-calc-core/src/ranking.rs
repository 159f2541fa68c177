//! Ranking of computed vehicle selections.
//!
//! The board keeps one entry per selection slot; adding a selection for
//! an occupied slot replaces the prior entry. Standings are a fresh
//! ordered view over the current entries, sorted by combined monthly
//! cost ascending with list price as the tie-break.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::costing::CostRecord;
use crate::types::{FuelGrade, Money};

/// One ranked selection: the vehicle identity, the chosen offer and the
/// computed cost record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedVehicle {
    /// Selection slot this entry occupies
    pub slot: u32,
    pub model: String,
    pub trim: String,
    pub engine: String,
    /// Name of the chosen leasing offer
    pub offer_name: String,
    /// Fuel grade the costs were priced with
    pub fuel_grade: FuelGrade,
    pub list_price: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub costs: CostRecord,
}

/// Order records by combined monthly cost ascending, ties broken by
/// list price ascending. Stable and deterministic; the input is not
/// mutated.
pub fn rank(records: &[RankedVehicle]) -> Vec<RankedVehicle> {
    let mut ordered = records.to_vec();
    ordered.sort_by_key(|r| (r.costs.combined_cost_per_month, r.list_price));
    ordered
}

/// Slot-keyed collection of ranked selections.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RankingBoard {
    entries: BTreeMap<u32, RankedVehicle>,
}

impl RankingBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace the entry for the slot. Last writer wins.
    pub fn upsert(&mut self, entry: RankedVehicle) {
        self.entries.insert(entry.slot, entry);
    }

    pub fn remove(&mut self, slot: u32) -> Option<RankedVehicle> {
        self.entries.remove(&slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Current standings, cheapest combined monthly cost first.
    pub fn standings(&self) -> Vec<RankedVehicle> {
        let entries: Vec<RankedVehicle> = self.entries.values().cloned().collect();
        rank(&entries)
    }
}
