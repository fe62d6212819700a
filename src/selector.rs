//! Recipe selection for materials with more than one producer

use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::error::{PlanError, Result};
use crate::models::Recipe;

/// Decision source consulted when a ticker has several candidate recipes.
///
/// Returns a zero-based index into `candidates`. The selector validates the
/// index, so implementations may pass user input through unchecked.
pub trait RecipeChooser {
    fn choose(&mut self, ticker: &str, candidates: &[Arc<Recipe>]) -> Result<usize>;
}

impl<F> RecipeChooser for F
where
    F: FnMut(&str, &[Arc<Recipe>]) -> Result<usize>,
{
    fn choose(&mut self, ticker: &str, candidates: &[Arc<Recipe>]) -> Result<usize> {
        self(ticker, candidates)
    }
}

/// Always picks the first recipe in load order
#[derive(Debug, Clone, Copy, Default)]
pub struct FirstRecipe;

impl RecipeChooser for FirstRecipe {
    fn choose(&mut self, _ticker: &str, _candidates: &[Arc<Recipe>]) -> Result<usize> {
        Ok(0)
    }
}

/// Fails on any ambiguity; for runs where every choice must be preset
#[derive(Debug, Clone, Copy, Default)]
pub struct NoChoice;

impl RecipeChooser for NoChoice {
    fn choose(&mut self, ticker: &str, candidates: &[Arc<Recipe>]) -> Result<usize> {
        Err(PlanError::Chooser(format!(
            "no recipe choice configured for '{}' ({} candidates)",
            ticker,
            candidates.len()
        )))
    }
}

/// Answers from a fixed ticker -> index table, deferring to `fallback`
/// for tickers not in the table.
#[derive(Debug, Clone)]
pub struct PresetChoices<F> {
    choices: HashMap<String, usize>,
    fallback: F,
}

impl<F: RecipeChooser> PresetChoices<F> {
    pub fn new(choices: HashMap<String, usize>, fallback: F) -> Self {
        Self { choices, fallback }
    }
}

impl<F: RecipeChooser> RecipeChooser for PresetChoices<F> {
    fn choose(&mut self, ticker: &str, candidates: &[Arc<Recipe>]) -> Result<usize> {
        match self.choices.get(ticker) {
            Some(&index) => Ok(index),
            None => self.fallback.choose(ticker, candidates),
        }
    }
}

/// Resolves ambiguous tickers and remembers each choice for the rest of
/// the run.
#[derive(Debug)]
pub struct RecipeSelector<C> {
    chooser: C,
    memo: HashMap<String, usize>,
}

impl<C: RecipeChooser> RecipeSelector<C> {
    pub fn new(chooser: C) -> Self {
        Self {
            chooser,
            memo: HashMap::new(),
        }
    }

    pub fn select(&mut self, ticker: &str, candidates: &[Arc<Recipe>]) -> Result<Arc<Recipe>> {
        match candidates {
            [] => return Err(PlanError::UnknownMaterial(ticker.to_string())),
            [only] => return Ok(Arc::clone(only)),
            _ => {}
        }

        if let Some(&index) = self.memo.get(ticker) {
            return pick(ticker, candidates, index);
        }

        let index = self.chooser.choose(ticker, candidates)?;
        let recipe = pick(ticker, candidates, index)?;
        debug!(%ticker, index, recipe = %recipe.name, "recipe chosen");
        self.memo.insert(ticker.to_string(), index);
        Ok(recipe)
    }

    /// Choices made so far in this run
    pub fn memo(&self) -> &HashMap<String, usize> {
        &self.memo
    }

    pub fn into_memo(self) -> HashMap<String, usize> {
        self.memo
    }
}

fn pick(ticker: &str, candidates: &[Arc<Recipe>], index: usize) -> Result<Arc<Recipe>> {
    candidates
        .get(index)
        .cloned()
        .ok_or_else(|| PlanError::InvalidSelection {
            ticker: ticker.to_string(),
            index,
            candidates: candidates.len(),
        })
}
