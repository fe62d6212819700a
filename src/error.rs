//! Error types for production planning

use thiserror::Error;

/// Errors that abort a planning run
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("no recipe produces '{0}' and it is not a raw resource")]
    UnknownMaterial(String),

    #[error("material cycle detected: {}", .path.join(" -> "))]
    Cycle { path: Vec<String> },

    #[error("expansion of '{ticker}' exceeded the maximum depth of {limit}")]
    DepthExceeded { ticker: String, limit: usize },

    #[error("invalid recipe selection {index} for '{ticker}' ({candidates} candidates)")]
    InvalidSelection {
        ticker: String,
        index: usize,
        candidates: usize,
    },

    #[error("recipe choice failed: {0}")]
    Chooser(String),

    #[error("invalid recipe '{name}': {reason}")]
    InvalidRecipe { name: String, reason: String },

    #[error("quantity overflow while planning '{ticker}'")]
    QuantityOverflow { ticker: String },
}

pub type Result<T> = std::result::Result<T, PlanError>;
