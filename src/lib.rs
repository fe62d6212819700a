//! Production plan calculator for Prosperous Universe recipe chains.
//!
//! Given a recipe database and a requested material, expands every recipe
//! run needed down to raw resources and aggregates the runs per building.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod import;
pub mod ledger;
pub mod models;
pub mod plan;
pub mod planner;
pub mod report;
pub mod selector;

pub use catalog::RecipeCatalog;
pub use config::PlannerConfig;
pub use error::{PlanError, Result};
pub use ledger::{InventoryLedger, MaterialTally};
pub use models::{MaterialAmount, Recipe};
pub use plan::{BuildingPlan, ProductionPlan, RecipeTotals};
pub use planner::{PlanOutcome, Planner, plan_targets};
pub use selector::{FirstRecipe, NoChoice, PresetChoices, RecipeChooser, RecipeSelector};
