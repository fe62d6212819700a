//! Aggregated production plan, keyed by building and recipe

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;

use crate::models::MaterialAmount;

/// Accumulated totals for one recipe inside one building
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecipeTotals {
    pub inputs: BTreeMap<String, u64>,
    pub outputs: BTreeMap<String, u64>,
    pub runs: u64,
    pub time: Duration,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BuildingPlan {
    pub total_time: Duration,
    pub recipes: BTreeMap<String, RecipeTotals>,
}

/// One change to a recipe's totals
#[derive(Debug, Clone, Copy)]
pub struct RunRecord<'a> {
    pub building: &'a str,
    pub recipe: &'a str,
    pub runs: u64,
    pub inputs: &'a [MaterialAmount],
    pub outputs: &'a [MaterialAmount],
    pub time: Duration,
}

/// Every recipe run of a planning run, one entry per (building, recipe name)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ProductionPlan {
    buildings: BTreeMap<String, BuildingPlan>,
}

impl ProductionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a run into the existing entry, creating it if needed
    pub fn record(&mut self, run: RunRecord<'_>) {
        let building = self.buildings.entry(run.building.to_string()).or_default();
        building.total_time = building.total_time.saturating_add(run.time);

        let totals = building.recipes.entry(run.recipe.to_string()).or_default();
        totals.runs = totals.runs.saturating_add(run.runs);
        totals.time = totals.time.saturating_add(run.time);
        merge(&mut totals.inputs, run.inputs);
        merge(&mut totals.outputs, run.outputs);
    }

    pub fn total_time(&self, building: &str) -> Duration {
        self.buildings
            .get(building)
            .map(|b| b.total_time)
            .unwrap_or(Duration::ZERO)
    }

    pub fn building(&self, building: &str) -> Option<&BuildingPlan> {
        self.buildings.get(building)
    }

    pub fn recipe(&self, building: &str, recipe: &str) -> Option<&RecipeTotals> {
        self.buildings.get(building)?.recipes.get(recipe)
    }

    pub fn buildings(&self) -> impl Iterator<Item = (&str, &BuildingPlan)> {
        self.buildings.iter().map(|(name, plan)| (name.as_str(), plan))
    }

    /// Runs across every building and recipe
    pub fn total_runs(&self) -> u64 {
        self.buildings
            .values()
            .flat_map(|b| b.recipes.values())
            .map(|r| r.runs)
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

fn merge(totals: &mut BTreeMap<String, u64>, delta: &[MaterialAmount]) {
    for (ticker, amount) in delta {
        let total = totals.entry(ticker.clone()).or_insert(0);
        *total = total.saturating_add(*amount);
    }
}
