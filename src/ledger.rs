//! Running material balances for a planning run

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::trace;

use crate::models::MaterialAmount;

/// Produced-minus-consumed balance per ticker.
///
/// Balances are plain signed counters; a ticker never touched reads as zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct InventoryLedger {
    balances: BTreeMap<String, i64>,
}

impl InventoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn available(&self, ticker: &str) -> i64 {
        self.balances.get(ticker).copied().unwrap_or(0)
    }

    pub fn add(&mut self, materials: &[MaterialAmount]) {
        for (ticker, amount) in materials {
            self.adjust(ticker, to_signed(*amount));
        }
    }

    pub fn subtract(&mut self, materials: &[MaterialAmount]) {
        for (ticker, amount) in materials {
            self.adjust(ticker, -to_signed(*amount));
        }
    }

    pub fn subtract_one(&mut self, ticker: &str, amount: u64) {
        self.adjust(ticker, -to_signed(amount));
    }

    fn adjust(&mut self, ticker: &str, delta: i64) {
        if delta == 0 {
            return;
        }
        let balance = self.balances.entry(ticker.to_string()).or_insert(0);
        *balance = balance.saturating_add(delta);
        trace!(%ticker, delta, balance = *balance, "inventory adjusted");
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.balances.iter().map(|(t, b)| (t.as_str(), *b))
    }

    /// Tickers with a positive balance left over
    pub fn surplus(&self) -> impl Iterator<Item = (&str, i64)> {
        self.iter().filter(|(_, balance)| *balance > 0)
    }
}

fn to_signed(amount: u64) -> i64 {
    i64::try_from(amount).unwrap_or(i64::MAX)
}

/// Gross demand: every quantity ever requested as a recipe input.
/// Never decremented.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MaterialTally {
    totals: BTreeMap<String, u64>,
}

impl MaterialTally {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, materials: &[MaterialAmount]) {
        for (ticker, amount) in materials {
            let total = self.totals.entry(ticker.clone()).or_insert(0);
            *total = total.saturating_add(*amount);
        }
    }

    pub fn get(&self, ticker: &str) -> u64 {
        self.totals.get(ticker).copied().unwrap_or(0)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.totals.iter().map(|(t, a)| (t.as_str(), *a))
    }

    pub fn is_empty(&self) -> bool {
        self.totals.is_empty()
    }
}
