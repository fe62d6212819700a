//! Recipe database import
//!
//! Reads exported recipe records (JSON arrays of `RecipeName`,
//! `BuildingTicker`, `Inputs`, `Outputs`, `TimeMs`) from a single file or a
//! directory tree and normalizes them into [`Recipe`]s.

use std::collections::BTreeSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use regex::Regex;
use rusqlite::Connection;
use tracing::{info, warn};
use walkdir::WalkDir;

use crate::db;
use crate::models::{RawRecipe, Recipe};

/// Summary of an import
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ImportStats {
    pub files: usize,
    pub recipes: usize,
    pub skipped: usize,
    pub outputs: usize,
    pub buildings: usize,
}

impl fmt::Display for ImportStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Import Summary ===")?;
        writeln!(f, "Files read:        {}", self.files)?;
        writeln!(f, "Recipes imported:  {}", self.recipes)?;
        writeln!(f, "Records skipped:   {}", self.skipped)?;
        writeln!(f, "Buildings:         {}", self.buildings)?;
        write!(f, "Producible items:  {}", self.outputs)
    }
}

/// Recipes parsed from one file, plus how many records were rejected
#[derive(Debug, Default)]
pub struct ParsedFile {
    pub recipes: Vec<Recipe>,
    pub skipped: usize,
}

/// Find every `*.json` file under `path`, or `path` itself if it is a file
pub fn find_recipe_files(path: &Path) -> Result<Vec<PathBuf>> {
    if path.is_file() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).follow_links(true) {
        let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
        let file = entry.path();
        if entry.file_type().is_file() && file.extension().is_some_and(|ext| ext == "json") {
            files.push(file.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}

/// Parse a JSON recipe export, skipping records that fail validation
pub fn parse_recipes(content: &str) -> Result<ParsedFile> {
    let records: Vec<serde_json::Value> =
        serde_json::from_str(content).context("Recipe file is not a JSON array")?;
    let ticker_re = Regex::new(r"^[A-Za-z0-9]+$")?;

    let mut parsed = ParsedFile::default();
    for (position, record) in records.into_iter().enumerate() {
        let raw: RawRecipe = match serde_json::from_value(record) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(position, error = %e, "skipping malformed recipe record");
                parsed.skipped += 1;
                continue;
            }
        };

        if let Err(reason) = check_identifiers(&raw, &ticker_re) {
            warn!(recipe = %raw.recipe_name, %reason, "skipping recipe");
            parsed.skipped += 1;
            continue;
        }

        match Recipe::try_from(raw) {
            Ok(recipe) => parsed.recipes.push(recipe),
            Err(e) => {
                warn!(error = %e, "skipping recipe");
                parsed.skipped += 1;
            }
        }
    }

    Ok(parsed)
}

pub fn parse_recipe_file(path: &Path) -> Result<ParsedFile> {
    let content =
        fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))?;
    parse_recipes(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

fn check_identifiers(raw: &RawRecipe, ticker_re: &Regex) -> std::result::Result<(), String> {
    if !ticker_re.is_match(&raw.building_ticker) {
        return Err(format!("invalid building ticker '{}'", raw.building_ticker));
    }
    for material in raw.inputs.iter().chain(&raw.outputs) {
        if !ticker_re.is_match(&material.ticker) {
            return Err(format!("invalid material ticker '{}'", material.ticker));
        }
    }
    Ok(())
}

/// Import every recipe under `path` into the database, in file order
pub fn import_to_database(conn: &Connection, path: &Path) -> Result<ImportStats> {
    let files = find_recipe_files(path)?;
    let mut stats = ImportStats::default();
    let mut outputs = BTreeSet::new();
    let mut buildings = BTreeSet::new();

    let tx = conn.unchecked_transaction()?;
    for file in &files {
        let parsed = parse_recipe_file(file)?;
        info!(
            file = %file.display(),
            recipes = parsed.recipes.len(),
            skipped = parsed.skipped,
            "parsed recipe file"
        );

        for recipe in &parsed.recipes {
            db::insert_recipe(&tx, recipe)?;
            outputs.extend(recipe.outputs.iter().map(|(t, _)| t.clone()));
            buildings.insert(recipe.building.clone());
        }

        stats.files += 1;
        stats.recipes += parsed.recipes.len();
        stats.skipped += parsed.skipped;
    }
    tx.commit()?;

    stats.outputs = outputs.len();
    stats.buildings = buildings.len();
    info!(recipes = stats.recipes, files = stats.files, "import complete");
    Ok(stats)
}
