//! Recursive production expansion

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::catalog::RecipeCatalog;
use crate::error::{PlanError, Result};
use crate::ledger::{InventoryLedger, MaterialTally};
use crate::models::MaterialAmount;
use crate::plan::{ProductionPlan, RunRecord};
use crate::selector::{RecipeChooser, RecipeSelector};

pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Everything a planning run produced
#[derive(Debug, Clone, Default, Serialize)]
pub struct PlanOutcome {
    pub plan: ProductionPlan,
    pub materials_needed: MaterialTally,
    pub inventory: InventoryLedger,
    pub choices: BTreeMap<String, usize>,
}

/// Expands material requests into recipe runs.
///
/// One planner is one run: the inventory ledger, recipe-choice memo and
/// plan are shared by every `expand` call until `finish`. Surplus left by
/// an earlier expansion is consumed by later ones, so results depend on the
/// order requests are made in.
pub struct Planner<'a, C> {
    catalog: &'a RecipeCatalog,
    selector: RecipeSelector<C>,
    inventory: InventoryLedger,
    materials_needed: MaterialTally,
    plan: ProductionPlan,
    path: Vec<String>,
    max_depth: usize,
}

impl<'a, C: RecipeChooser> Planner<'a, C> {
    pub fn new(catalog: &'a RecipeCatalog, chooser: C) -> Self {
        Self {
            catalog,
            selector: RecipeSelector::new(chooser),
            inventory: InventoryLedger::new(),
            materials_needed: MaterialTally::new(),
            plan: ProductionPlan::new(),
            path: Vec::new(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Schedule enough runs to make `quantity` of `ticker` available,
    /// recursing into every input of the chosen recipe.
    pub fn expand(&mut self, ticker: &str, quantity: u64) -> Result<()> {
        if self.catalog.is_raw(ticker) {
            return Ok(());
        }

        let candidates = self.catalog.lookup(ticker)?;
        if quantity == 0 {
            return Ok(());
        }

        if let Some(start) = self.path.iter().position(|t| t == ticker) {
            let mut path = self.path[start..].to_vec();
            path.push(ticker.to_string());
            return Err(PlanError::Cycle { path });
        }
        if self.path.len() >= self.max_depth {
            return Err(PlanError::DepthExceeded {
                ticker: ticker.to_string(),
                limit: self.max_depth,
            });
        }

        let recipe = self.selector.select(ticker, candidates)?;
        let per_run = recipe
            .output_of(ticker)
            .filter(|amount| *amount > 0)
            .ok_or_else(|| PlanError::InvalidRecipe {
                name: recipe.name.clone(),
                reason: format!("indexed under '{}' but does not produce it", ticker),
            })?;

        let available = self.inventory.available(ticker);
        let overflow = || PlanError::QuantityOverflow {
            ticker: ticker.to_string(),
        };
        let runs = runs_needed(quantity, available, per_run).ok_or_else(overflow)?;

        debug!(
            %ticker,
            quantity,
            available,
            runs,
            recipe = %recipe.name,
            building = %recipe.building,
            depth = self.path.len(),
            "expanding"
        );

        if runs == 0 {
            return Ok(());
        }

        let total_inputs = recipe.scaled_inputs(runs).ok_or_else(overflow)?;
        let total_outputs = recipe.scaled_outputs(runs).ok_or_else(overflow)?;
        let time = recipe.time_for(runs).ok_or_else(overflow)?;
        ensure_signed(&total_inputs)?;
        ensure_signed(&total_outputs)?;

        self.plan.record(RunRecord {
            building: &recipe.building,
            recipe: &recipe.name,
            runs,
            inputs: &total_inputs,
            outputs: &total_outputs,
            time,
        });
        self.materials_needed.add(&total_inputs);
        self.inventory.add(&total_outputs);

        self.path.push(ticker.to_string());
        let result = self.expand_inputs(&total_inputs);
        self.path.pop();
        result
    }

    /// Expand a top-level request and release its claim on the ledger, as
    /// is done for every recipe input. Sequential requests then behave like
    /// one combined request.
    pub fn request(&mut self, ticker: &str, quantity: u64) -> Result<()> {
        if i64::try_from(quantity).is_err() {
            return Err(PlanError::QuantityOverflow {
                ticker: ticker.to_string(),
            });
        }
        self.expand(ticker, quantity)?;
        self.inventory.subtract_one(ticker, quantity);
        Ok(())
    }

    /// Inputs are expanded in recipe order; each input's claim on the
    /// ledger is released only after its own subtree has been expanded.
    fn expand_inputs(&mut self, inputs: &[MaterialAmount]) -> Result<()> {
        for (input, amount) in inputs {
            self.expand(input, *amount)?;
            self.inventory.subtract_one(input, *amount);
        }
        Ok(())
    }

    pub fn plan(&self) -> &ProductionPlan {
        &self.plan
    }

    pub fn inventory(&self) -> &InventoryLedger {
        &self.inventory
    }

    pub fn materials_needed(&self) -> &MaterialTally {
        &self.materials_needed
    }

    pub fn finish(self) -> PlanOutcome {
        PlanOutcome {
            plan: self.plan,
            materials_needed: self.materials_needed,
            inventory: self.inventory,
            choices: self.selector.into_memo().into_iter().collect(),
        }
    }
}

/// Scaled amounts must fit a signed ledger balance
fn ensure_signed(materials: &[MaterialAmount]) -> Result<()> {
    match materials.iter().find(|(_, amount)| i64::try_from(*amount).is_err()) {
        Some((ticker, _)) => Err(PlanError::QuantityOverflow {
            ticker: ticker.clone(),
        }),
        None => Ok(()),
    }
}

/// Runs of a recipe yielding `per_run` needed to cover `required` given
/// `available` surplus. Never negative; `None` on overflow or a zero yield.
pub fn runs_needed(required: u64, available: i64, per_run: u64) -> Option<u64> {
    if per_run == 0 {
        return None;
    }
    let net = i128::from(required) - i128::from(available);
    if net <= 0 {
        return Some(0);
    }
    let runs = u128::try_from(net).ok()?.div_ceil(u128::from(per_run));
    u64::try_from(runs).ok()
}

/// Plan several targets in order within a single run
pub fn plan_targets<C, I, S>(
    catalog: &RecipeCatalog,
    chooser: C,
    targets: I,
    max_depth: usize,
) -> Result<PlanOutcome>
where
    C: RecipeChooser,
    I: IntoIterator<Item = (S, u64)>,
    S: AsRef<str>,
{
    let mut planner = Planner::new(catalog, chooser).with_max_depth(max_depth);
    for (ticker, quantity) in targets {
        let ticker = ticker.as_ref();
        info!(%ticker, quantity, "planning production");
        planner.request(ticker, quantity)?;
    }

    let outcome = planner.finish();
    info!(
        buildings = outcome.plan.buildings().count(),
        runs = outcome.plan.total_runs(),
        "planning complete"
    );
    Ok(outcome)
}
