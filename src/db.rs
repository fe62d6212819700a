//! Database schema and operations

use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use rusqlite::{Connection, params};

use crate::models::{MaterialAmount, Recipe};

/// Initialize the database schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        -- One row per recipe, in import order
        CREATE TABLE IF NOT EXISTS recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            building TEXT NOT NULL,
            duration_ms INTEGER NOT NULL
        );

        -- Materials consumed by one run
        CREATE TABLE IF NOT EXISTS recipe_inputs (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id),
            position INTEGER NOT NULL,
            ticker TEXT NOT NULL,
            amount INTEGER NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        -- Materials produced by one run
        CREATE TABLE IF NOT EXISTS recipe_outputs (
            recipe_id INTEGER NOT NULL REFERENCES recipes(id),
            position INTEGER NOT NULL,
            ticker TEXT NOT NULL,
            amount INTEGER NOT NULL,
            PRIMARY KEY (recipe_id, position)
        );

        CREATE INDEX IF NOT EXISTS idx_recipe_outputs_ticker ON recipe_outputs(ticker);
        CREATE INDEX IF NOT EXISTS idx_recipes_building ON recipes(building);
        "#,
    )?;
    Ok(())
}

/// Insert a recipe with its inputs and outputs, returning its row id
pub fn insert_recipe(conn: &Connection, recipe: &Recipe) -> Result<i64> {
    let duration_ms = i64::try_from(recipe.duration.as_millis())
        .with_context(|| format!("Duration of '{}' out of range", recipe.name))?;
    conn.execute(
        "INSERT INTO recipes (name, building, duration_ms) VALUES (?1, ?2, ?3)",
        params![recipe.name, recipe.building, duration_ms],
    )?;
    let recipe_id = conn.last_insert_rowid();

    insert_materials(conn, "recipe_inputs", recipe_id, &recipe.inputs)?;
    insert_materials(conn, "recipe_outputs", recipe_id, &recipe.outputs)?;
    Ok(recipe_id)
}

fn insert_materials(
    conn: &Connection,
    table: &str,
    recipe_id: i64,
    materials: &[MaterialAmount],
) -> Result<()> {
    let mut stmt = conn.prepare(&format!(
        "INSERT INTO {} (recipe_id, position, ticker, amount) VALUES (?1, ?2, ?3, ?4)",
        table
    ))?;
    for (position, (ticker, amount)) in materials.iter().enumerate() {
        let amount = i64::try_from(*amount)
            .with_context(|| format!("Amount of '{}' out of range", ticker))?;
        stmt.execute(params![recipe_id, position as i64, ticker, amount])?;
    }
    Ok(())
}

/// Clear all imported recipes (for re-import)
pub fn clear_recipes(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        DELETE FROM recipe_outputs;
        DELETE FROM recipe_inputs;
        DELETE FROM recipes;
        "#,
    )?;
    Ok(())
}

/// Load every recipe in import order
pub fn load_recipes(conn: &Connection) -> Result<Vec<Recipe>> {
    let mut inputs = load_materials(conn, "recipe_inputs")?;
    let mut outputs = load_materials(conn, "recipe_outputs")?;

    let mut stmt = conn.prepare("SELECT id, name, building, duration_ms FROM recipes ORDER BY id")?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, String>(2)?,
            row.get::<_, i64>(3)?,
        ))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (id, name, building, duration_ms) = row?;
        let duration_ms = u64::try_from(duration_ms)
            .with_context(|| format!("Negative duration stored for '{}'", name))?;
        results.push(Recipe {
            name,
            building,
            inputs: inputs.remove(&id).unwrap_or_default(),
            outputs: outputs.remove(&id).unwrap_or_default(),
            duration: Duration::from_millis(duration_ms),
        });
    }
    Ok(results)
}

fn load_materials(conn: &Connection, table: &str) -> Result<HashMap<i64, Vec<MaterialAmount>>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT recipe_id, ticker, amount FROM {} ORDER BY recipe_id, position",
        table
    ))?;
    let rows = stmt.query_map([], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, i64>(2)?,
        ))
    })?;

    let mut materials: HashMap<i64, Vec<MaterialAmount>> = HashMap::new();
    for row in rows {
        let (recipe_id, ticker, amount) = row?;
        let amount = u64::try_from(amount)
            .with_context(|| format!("Negative amount stored for '{}'", ticker))?;
        materials.entry(recipe_id).or_default().push((ticker, amount));
    }
    Ok(materials)
}

/// Get every recipe that outputs `ticker`, in import order
pub fn get_producers(conn: &Connection, ticker: &str) -> Result<Vec<Recipe>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT r.id
         FROM recipes r
         JOIN recipe_outputs ro ON r.id = ro.recipe_id
         WHERE ro.ticker = ?1
         ORDER BY r.id",
    )?;
    let ids = stmt
        .query_map([ticker], |row| row.get::<_, i64>(0))?
        .collect::<rusqlite::Result<Vec<i64>>>()?;

    ids.into_iter().map(|id| load_recipe(conn, id)).collect()
}

/// Load a single recipe by row id
pub fn load_recipe(conn: &Connection, id: i64) -> Result<Recipe> {
    let (name, building, duration_ms) = conn
        .query_row(
            "SELECT name, building, duration_ms FROM recipes WHERE id = ?1",
            [id],
            |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i64>(2)?,
                ))
            },
        )
        .with_context(|| format!("Recipe {} not found", id))?;
    let duration_ms = u64::try_from(duration_ms)
        .with_context(|| format!("Negative duration stored for '{}'", name))?;

    Ok(Recipe {
        inputs: load_recipe_materials(conn, "recipe_inputs", id)?,
        outputs: load_recipe_materials(conn, "recipe_outputs", id)?,
        name,
        building,
        duration: Duration::from_millis(duration_ms),
    })
}

fn load_recipe_materials(conn: &Connection, table: &str, id: i64) -> Result<Vec<MaterialAmount>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT ticker, amount FROM {} WHERE recipe_id = ?1 ORDER BY position",
        table
    ))?;
    let rows = stmt.query_map([id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (ticker, amount) = row?;
        let amount = u64::try_from(amount)
            .with_context(|| format!("Negative amount stored for '{}'", ticker))?;
        results.push((ticker, amount));
    }
    Ok(results)
}

/// Buildings with how many recipes each can run
pub fn list_buildings(conn: &Connection) -> Result<Vec<(String, usize)>> {
    let mut stmt = conn.prepare(
        "SELECT building, COUNT(*) FROM recipes GROUP BY building ORDER BY building",
    )?;

    let rows = stmt.query_map([], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut results = Vec::new();
    for row in rows {
        let (building, count) = row?;
        results.push((building, usize::try_from(count).unwrap_or(0)));
    }
    Ok(results)
}

/// List all unique tickers that some recipe outputs
pub fn list_producible_tickers(conn: &Connection) -> Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT DISTINCT ticker FROM recipe_outputs ORDER BY ticker")?;

    let rows = stmt.query_map([], |row| row.get(0))?;

    let mut results = Vec::new();
    for row in rows {
        results.push(row?);
    }
    Ok(results)
}
