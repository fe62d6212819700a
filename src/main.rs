//! Prosperous Universe production planner
//!
//! Imports a recipe database and computes the full production plan for a
//! requested material.

use std::collections::HashMap;
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow};
use clap::{Parser, Subcommand};
use regex::Regex;
use rusqlite::Connection;
use tracing::info;
use tracing_subscriber::EnvFilter;

use prun_planner::report::{PlanSummary, format_duration};
use prun_planner::{
    FirstRecipe, PlanError, PlannerConfig, PresetChoices, Recipe, RecipeCatalog, RecipeChooser,
    db, import, plan_targets,
};

#[derive(Parser)]
#[command(name = "prun-planner")]
#[command(about = "Production plan calculator for Prosperous Universe recipe chains")]
struct Cli {
    /// Path to the SQLite recipe database
    #[arg(short, long, default_value = "recipes.db")]
    database: PathBuf,

    /// Path to a TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize empty database with schema
    Init,

    /// Import recipes from a JSON export file or a directory of them
    Import {
        /// File or directory to import
        path: PathBuf,

        /// Clear existing recipes before importing
        #[arg(long)]
        clear: bool,
    },

    /// Compute the production plan for one or more materials
    Plan {
        /// Targets as TICKER or TICKER:QUANTITY, expanded in order
        #[arg(required = true)]
        targets: Vec<String>,

        /// Preset recipe choice as TICKER=INDEX (repeatable)
        #[arg(long = "choose")]
        choices: Vec<String>,

        /// Use the first recipe for any unresolved ambiguity instead of prompting
        #[arg(long)]
        first: bool,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// List the candidate recipes for a material
    Recipes {
        /// Material ticker
        ticker: String,
    },

    /// List all buildings in the database
    ListBuildings,

    /// List all producible materials
    ListMaterials,
}

/// Asks on the terminal which recipe to use
struct StdinPrompt;

impl RecipeChooser for StdinPrompt {
    fn choose(&mut self, ticker: &str, candidates: &[Arc<Recipe>]) -> prun_planner::Result<usize> {
        eprintln!("Select what recipe to use for {}:", ticker);
        for (num, recipe) in candidates.iter().enumerate() {
            eprintln!(
                "{}: {}, Recipe Time: {}",
                num,
                recipe.name,
                format_duration(recipe.duration)
            );
        }

        read_choice(io::stdin().lock(), ticker)
    }
}

/// Read one recipe index from `reader`; anything but a number is fatal
fn read_choice(mut reader: impl BufRead, ticker: &str) -> prun_planner::Result<usize> {
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .map_err(|e| PlanError::Chooser(e.to_string()))?;
    if read == 0 {
        return Err(PlanError::Chooser(format!(
            "input closed while choosing a recipe for '{}'",
            ticker
        )));
    }

    let answer = line.trim();
    answer.parse::<usize>().map_err(|_| {
        PlanError::Chooser(format!("invalid recipe selection '{}' for '{}'", answer, ticker))
    })
}

fn parse_target(target: &str, re: &Regex) -> Result<(String, u64)> {
    let caps = re
        .captures(target)
        .ok_or_else(|| anyhow!("Invalid target '{}', expected TICKER or TICKER:QUANTITY", target))?;
    let quantity = match caps.get(2) {
        Some(q) => q
            .as_str()
            .parse()
            .with_context(|| format!("Invalid quantity in '{}'", target))?,
        None => 1,
    };
    Ok((caps[1].to_string(), quantity))
}

fn parse_choice(choice: &str, re: &Regex) -> Result<(String, usize)> {
    let caps = re
        .captures(choice)
        .ok_or_else(|| anyhow!("Invalid choice '{}', expected TICKER=INDEX", choice))?;
    let index = caps[2]
        .parse()
        .with_context(|| format!("Invalid index in '{}'", choice))?;
    Ok((caps[1].to_string(), index))
}

fn run_plan<C: RecipeChooser>(
    catalog: &RecipeCatalog,
    chooser: C,
    targets: &[(String, u64)],
    max_depth: usize,
    json: bool,
) -> Result<()> {
    let outcome = plan_targets(
        catalog,
        chooser,
        targets.iter().map(|(t, q)| (t, *q)),
        max_depth,
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        let summary = PlanSummary {
            targets,
            outcome: &outcome,
            raw_resources: catalog.raw_resources(),
        };
        println!("{}", summary);
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => "prun_planner=info",
        1 => "prun_planner=debug",
        _ => "prun_planner=trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => PlannerConfig::from_file(path)?,
        None => PlannerConfig::default(),
    };

    let conn = Connection::open(&cli.database)
        .with_context(|| format!("Failed to open {}", cli.database.display()))?;
    db::init_schema(&conn)?;

    match cli.command {
        Commands::Init => {
            println!("Database initialized at: {}", cli.database.display());
        }

        Commands::Import { path, clear } => {
            if clear {
                println!("Clearing existing recipes...");
                db::clear_recipes(&conn)?;
            }

            let stats = import::import_to_database(&conn, &path)?;
            println!("\n{}", stats);
        }

        Commands::Plan {
            targets,
            choices,
            first,
            json,
        } => {
            let target_re = Regex::new(r"^([A-Za-z0-9]+)(?::(\d+))?$")?;
            let choice_re = Regex::new(r"^([A-Za-z0-9]+)=(\d+)$")?;

            let targets = targets
                .iter()
                .map(|t| parse_target(t, &target_re))
                .collect::<Result<Vec<_>>>()?;
            let overrides = choices
                .iter()
                .map(|c| parse_choice(c, &choice_re))
                .collect::<Result<Vec<_>>>()?;
            config.merge_choices(overrides);

            let recipes = db::load_recipes(&conn)?;
            if recipes.is_empty() {
                println!("No recipes in database. Run 'import' first.");
                return Ok(());
            }
            let catalog =
                RecipeCatalog::from_recipes(recipes, config.raw_resources.iter().cloned())?;
            info!(materials = catalog.len(), "catalog loaded");

            let presets: HashMap<String, usize> = config.choices.clone();
            let max_depth = config.max_depth;
            if first {
                let chooser = PresetChoices::new(presets, FirstRecipe);
                run_plan(&catalog, chooser, &targets, max_depth, json)?;
            } else {
                let chooser = PresetChoices::new(presets, StdinPrompt);
                run_plan(&catalog, chooser, &targets, max_depth, json)?;
            }
        }

        Commands::Recipes { ticker } => {
            let producers = db::get_producers(&conn, &ticker)?;
            if producers.is_empty() {
                println!("No recipe produces '{}'", ticker);
            } else {
                for (num, recipe) in producers.iter().enumerate() {
                    println!(
                        "{}: {} [{}] {}",
                        num,
                        recipe.name,
                        recipe.building,
                        format_duration(recipe.duration)
                    );
                }
            }
        }

        Commands::ListBuildings => {
            let buildings = db::list_buildings(&conn)?;
            if buildings.is_empty() {
                println!("No buildings in database. Run 'import' first.");
            } else {
                println!("{:<12} {:>8}", "Building", "Recipes");
                println!("{}", "-".repeat(21));
                for (building, count) in buildings {
                    println!("{:<12} {:>8}", building, count);
                }
            }
        }

        Commands::ListMaterials => {
            let tickers = db::list_producible_tickers(&conn)?;
            if tickers.is_empty() {
                println!("No materials in database. Run 'import' first.");
            } else {
                println!("Producible materials:");
                for ticker in tickers {
                    println!("  {}", ticker);
                }
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_target() {
        let re = Regex::new(r"^([A-Za-z0-9]+)(?::(\d+))?$").unwrap();
        assert_eq!(parse_target("RAT:20", &re).unwrap(), ("RAT".to_string(), 20));
        assert_eq!(parse_target("GLASSSHIP", &re).unwrap(), ("GLASSSHIP".to_string(), 1));
        assert!(parse_target("RAT:", &re).is_err());
        assert!(parse_target("RAT:-1", &re).is_err());
    }

    #[test]
    fn test_read_choice() {
        assert_eq!(read_choice(" 1 \n".as_bytes(), "RAT").unwrap(), 1);
        assert!(matches!(
            read_choice("abc\n".as_bytes(), "RAT"),
            Err(PlanError::Chooser(msg)) if msg.contains("'abc'")
        ));
        assert!(matches!(read_choice("".as_bytes(), "RAT"), Err(PlanError::Chooser(_))));
        assert!(read_choice("-1\n".as_bytes(), "RAT").is_err());
    }

    #[test]
    fn test_parse_choice() {
        let re = Regex::new(r"^([A-Za-z0-9]+)=(\d+)$").unwrap();
        assert_eq!(parse_choice("DW=1", &re).unwrap(), ("DW".to_string(), 1));
        assert!(parse_choice("DW", &re).is_err());
    }
}
