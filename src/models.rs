//! Data models for recipes and materials

use std::collections::HashSet;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{PlanError, Result};

/// A ticker paired with a quantity, in source order
pub type MaterialAmount = (String, u64);

/// A normalized recipe: one run consumes `inputs` and produces `outputs`
/// in `duration` inside a `building`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipe {
    pub name: String,
    pub building: String,
    pub inputs: Vec<MaterialAmount>,
    pub outputs: Vec<MaterialAmount>,
    pub duration: Duration,
}

impl Recipe {
    pub fn new(name: impl Into<String>, building: impl Into<String>, duration: Duration) -> Self {
        Self {
            name: name.into(),
            building: building.into(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            duration,
        }
    }

    pub fn with_input(mut self, ticker: impl Into<String>, amount: u64) -> Self {
        self.inputs.push((ticker.into(), amount));
        self
    }

    pub fn with_output(mut self, ticker: impl Into<String>, amount: u64) -> Self {
        self.outputs.push((ticker.into(), amount));
        self
    }

    /// Amount of `ticker` produced by a single run
    pub fn output_of(&self, ticker: &str) -> Option<u64> {
        self.outputs
            .iter()
            .find(|(t, _)| t == ticker)
            .map(|(_, amount)| *amount)
    }

    pub fn scaled_inputs(&self, runs: u64) -> Option<Vec<MaterialAmount>> {
        scale(&self.inputs, runs)
    }

    pub fn scaled_outputs(&self, runs: u64) -> Option<Vec<MaterialAmount>> {
        scale(&self.outputs, runs)
    }

    /// Active time for `runs` consecutive runs
    pub fn time_for(&self, runs: u64) -> Option<Duration> {
        const NANOS_PER_SEC: u128 = 1_000_000_000;
        let nanos = self.duration.as_nanos().checked_mul(u128::from(runs))?;
        let secs = u64::try_from(nanos / NANOS_PER_SEC).ok()?;
        let subsec = u32::try_from(nanos % NANOS_PER_SEC).ok()?;
        Some(Duration::new(secs, subsec))
    }

    /// Check the structural invariants every catalog recipe must hold
    pub fn validate(&self) -> Result<()> {
        if self.outputs.is_empty() {
            return Err(self.invalid("recipe has no outputs"));
        }

        for (side, materials) in [("input", &self.inputs), ("output", &self.outputs)] {
            let mut seen = HashSet::new();
            for (ticker, amount) in materials {
                if *amount == 0 {
                    return Err(self.invalid(format!("{} '{}' has zero amount", side, ticker)));
                }
                if !seen.insert(ticker.as_str()) {
                    return Err(self.invalid(format!("{} '{}' listed twice", side, ticker)));
                }
            }
        }

        Ok(())
    }

    fn invalid(&self, reason: impl Into<String>) -> PlanError {
        PlanError::InvalidRecipe {
            name: self.name.clone(),
            reason: reason.into(),
        }
    }
}

fn scale(materials: &[MaterialAmount], runs: u64) -> Option<Vec<MaterialAmount>> {
    materials
        .iter()
        .map(|(ticker, amount)| Some((ticker.clone(), amount.checked_mul(runs)?)))
        .collect()
}

/// A recipe record as it appears in the exported recipe database
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawRecipe {
    pub recipe_name: String,
    pub building_ticker: String,
    #[serde(default)]
    pub inputs: Vec<RawMaterial>,
    #[serde(default)]
    pub outputs: Vec<RawMaterial>,
    pub time_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RawMaterial {
    pub ticker: String,
    pub amount: u64,
}

impl TryFrom<RawRecipe> for Recipe {
    type Error = PlanError;

    fn try_from(raw: RawRecipe) -> Result<Self> {
        let recipe = Recipe {
            name: raw.recipe_name,
            building: raw.building_ticker,
            inputs: raw.inputs.into_iter().map(|m| (m.ticker, m.amount)).collect(),
            outputs: raw.outputs.into_iter().map(|m| (m.ticker, m.amount)).collect(),
            duration: Duration::from_millis(raw.time_ms),
        };
        recipe.validate()?;
        Ok(recipe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rat_recipe() -> Recipe {
        Recipe::new("4xGRN 4xBEA 4xNUT=>10xRAT", "FP", Duration::from_secs(6 * 3600))
            .with_input("GRN", 4)
            .with_input("BEA", 4)
            .with_input("NUT", 4)
            .with_output("RAT", 10)
    }

    #[test]
    fn test_scaling_keeps_order() {
        let recipe = rat_recipe();
        let inputs = recipe.scaled_inputs(3).unwrap();
        assert_eq!(
            inputs,
            vec![
                ("GRN".to_string(), 12),
                ("BEA".to_string(), 12),
                ("NUT".to_string(), 12)
            ]
        );
        assert_eq!(recipe.scaled_outputs(3).unwrap(), vec![("RAT".to_string(), 30)]);
        assert_eq!(recipe.time_for(3), Some(Duration::from_secs(18 * 3600)));
    }

    #[test]
    fn test_scaling_overflow() {
        let recipe = rat_recipe();
        assert!(recipe.scaled_inputs(u64::MAX).is_none());
        assert!(recipe.time_for(u64::MAX).is_none());
    }

    #[test]
    fn test_time_for_large_run_counts() {
        let instant = Recipe::new("instant", "FP", Duration::ZERO).with_output("RAT", 1);
        assert_eq!(instant.time_for(5_000_000_000), Some(Duration::ZERO));

        let quick = Recipe::new("quick", "FP", Duration::from_millis(1500)).with_output("RAT", 1);
        assert_eq!(quick.time_for(5_000_000_000), Some(Duration::from_secs(7_500_000_000)));
        assert_eq!(quick.time_for(3), Some(Duration::from_millis(4500)));
    }

    #[test]
    fn test_output_of() {
        let recipe = rat_recipe();
        assert_eq!(recipe.output_of("RAT"), Some(10));
        assert_eq!(recipe.output_of("GRN"), None);
    }

    #[test]
    fn test_validate_rejects_bad_recipes() {
        let no_outputs = Recipe::new("empty", "FP", Duration::ZERO).with_input("GRN", 1);
        assert!(matches!(no_outputs.validate(), Err(PlanError::InvalidRecipe { .. })));

        let zero = rat_recipe().with_input("H2O", 0);
        assert!(zero.validate().is_err());

        let twice = rat_recipe().with_output("RAT", 1);
        assert!(twice.validate().is_err());

        assert!(rat_recipe().validate().is_ok());
    }

    #[test]
    fn test_raw_recipe_conversion() {
        let json = r#"{
            "RecipeName": "1xH2O=>1xICE",
            "BuildingTicker": "B1",
            "Inputs": [{ "Ticker": "H2O", "Amount": 2 }],
            "Outputs": [{ "Ticker": "ICE", "Amount": 1 }],
            "TimeMs": 1000
        }"#;
        let raw: RawRecipe = serde_json::from_str(json).unwrap();
        let recipe = Recipe::try_from(raw).unwrap();

        assert_eq!(recipe.name, "1xH2O=>1xICE");
        assert_eq!(recipe.building, "B1");
        assert_eq!(recipe.inputs, vec![("H2O".to_string(), 2)]);
        assert_eq!(recipe.outputs, vec![("ICE".to_string(), 1)]);
        assert_eq!(recipe.duration, Duration::from_millis(1000));
    }
}
