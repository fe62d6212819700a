//! Recipe catalog indexed by produced material

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tracing::debug;

use crate::error::{PlanError, Result};
use crate::models::Recipe;

/// Read-only recipe database for a planning run.
///
/// Every recipe is shared by reference under each ticker it outputs, so a
/// recipe with N outputs is stored once and indexed N times. Raw resources
/// are never indexed.
#[derive(Debug, Clone, Default)]
pub struct RecipeCatalog {
    producers: HashMap<String, Vec<Arc<Recipe>>>,
    raw_resources: HashSet<String>,
}

impl RecipeCatalog {
    pub fn new<I, S>(raw_resources: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            producers: HashMap::new(),
            raw_resources: raw_resources.into_iter().map(Into::into).collect(),
        }
    }

    /// Build a catalog from recipes in load order
    pub fn from_recipes<R, I, S>(recipes: R, raw_resources: I) -> Result<Self>
    where
        R: IntoIterator<Item = Recipe>,
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut catalog = Self::new(raw_resources);
        for recipe in recipes {
            catalog.insert(recipe)?;
        }
        Ok(catalog)
    }

    pub fn insert(&mut self, recipe: Recipe) -> Result<()> {
        recipe.validate()?;
        let recipe = Arc::new(recipe);

        for (ticker, _) in &recipe.outputs {
            if self.raw_resources.contains(ticker) {
                debug!(recipe = %recipe.name, %ticker, "not indexing raw resource output");
                continue;
            }
            self.producers
                .entry(ticker.clone())
                .or_default()
                .push(Arc::clone(&recipe));
        }

        Ok(())
    }

    /// All recipes producing `ticker`, in load order
    pub fn lookup(&self, ticker: &str) -> Result<&[Arc<Recipe>]> {
        self.producers
            .get(ticker)
            .map(Vec::as_slice)
            .ok_or_else(|| PlanError::UnknownMaterial(ticker.to_string()))
    }

    pub fn is_raw(&self, ticker: &str) -> bool {
        self.raw_resources.contains(ticker)
    }

    pub fn raw_resources(&self) -> &HashSet<String> {
        &self.raw_resources
    }

    /// Tickers with at least one recipe, sorted
    pub fn producible_tickers(&self) -> Vec<&str> {
        let mut tickers: Vec<&str> = self.producers.keys().map(String::as_str).collect();
        tickers.sort_unstable();
        tickers
    }

    pub fn len(&self) -> usize {
        self.producers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.producers.is_empty()
    }
}
