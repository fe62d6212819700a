//! End-to-end planning scenarios

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::time::Duration;

use prun_planner::{
    FirstRecipe, NoChoice, PlanError, Planner, PresetChoices, Recipe, RecipeCatalog, Result,
    db, plan_targets,
};
use rusqlite::Connection;

fn catalog(recipes: Vec<Recipe>) -> RecipeCatalog {
    RecipeCatalog::from_recipes(recipes, ["H2O", "FEO", "O"]).unwrap()
}

#[test]
fn test_single_recipe_chain() {
    let catalog = catalog(vec![
        Recipe::new("R1", "B1", Duration::from_millis(1000))
            .with_input("H2O", 2)
            .with_output("ICE", 1),
    ]);

    let mut planner = Planner::new(&catalog, NoChoice);
    planner.expand("ICE", 3).unwrap();
    let outcome = planner.finish();

    let totals = outcome.plan.recipe("B1", "R1").unwrap();
    assert_eq!(totals.runs, 3);
    assert_eq!(totals.inputs, BTreeMap::from([("H2O".to_string(), 6)]));
    assert_eq!(totals.outputs, BTreeMap::from([("ICE".to_string(), 3)]));
    assert_eq!(totals.time, Duration::from_millis(3000));
    assert_eq!(outcome.plan.total_time("B1"), Duration::from_millis(3000));

    assert_eq!(outcome.materials_needed.iter().collect::<Vec<_>>(), vec![("H2O", 6)]);
    assert!(outcome.plan.buildings().all(|(_, b)| {
        b.recipes.values().all(|r| !r.outputs.contains_key("H2O"))
    }));
    assert!(outcome.plan.building("H2O").is_none());
}

#[test]
fn test_co_product_surplus_is_reused() {
    // T needs A and B; R2 makes A with B as a co-product
    let recipes = vec![
        Recipe::new("RT", "ASM", Duration::from_secs(10))
            .with_input("A", 1)
            .with_input("B", 3)
            .with_output("T", 1),
        Recipe::new("R2", "CHP", Duration::from_secs(5))
            .with_input("H2O", 1)
            .with_output("A", 1)
            .with_output("B", 2),
        Recipe::new("RB", "CHP", Duration::from_secs(4))
            .with_input("H2O", 3)
            .with_output("B", 1),
    ];
    let catalog = catalog(recipes);
    let chooser = PresetChoices::new(HashMap::from([("B".to_string(), 1)]), NoChoice);

    let outcome = plan_targets(&catalog, chooser, [("T", 1)], 16).unwrap();

    assert_eq!(outcome.plan.recipe("CHP", "R2").unwrap().runs, 1);
    // only the one B not covered by R2's co-product is made
    assert_eq!(outcome.plan.recipe("CHP", "RB").unwrap().runs, 1);
    assert_eq!(outcome.plan.total_time("CHP"), Duration::from_secs(9));
    assert_eq!(outcome.materials_needed.get("H2O"), 4);
    assert_eq!(outcome.choices.get("B"), Some(&1));
}

#[test]
fn test_co_product_covers_demand_entirely() {
    let recipes = vec![
        Recipe::new("RT", "ASM", Duration::from_secs(10))
            .with_input("A", 1)
            .with_input("B", 2)
            .with_output("T", 1),
        Recipe::new("R2", "CHP", Duration::from_secs(5))
            .with_input("H2O", 1)
            .with_output("A", 1)
            .with_output("B", 2),
    ];
    let catalog = catalog(recipes);

    let outcome = plan_targets(&catalog, NoChoice, [("T", 1)], 16).unwrap();

    assert_eq!(outcome.plan.total_runs(), 2);
    assert_eq!(outcome.inventory.available("B"), 0);
}

#[test]
fn test_claim_released_after_subtree() {
    // T needs 2 M then 1 N; N needs 1 M; M is made 3 at a time
    let recipes = vec![
        Recipe::new("make-t", "ASM", Duration::from_secs(1))
            .with_input("M", 2)
            .with_input("N", 1)
            .with_output("T", 1),
        Recipe::new("make-n", "ASM", Duration::from_secs(1))
            .with_input("M", 1)
            .with_output("N", 1),
        Recipe::new("make-m", "SME", Duration::from_secs(1))
            .with_input("FEO", 1)
            .with_output("M", 3),
    ];
    let catalog = catalog(recipes);

    let mut planner = Planner::new(&catalog, NoChoice);
    planner.expand("T", 1).unwrap();

    assert_eq!(planner.plan().recipe("SME", "make-m").unwrap().runs, 1);
    assert_eq!(planner.inventory().available("M"), 0);
    assert_eq!(planner.inventory().available("T"), 1);
    assert_eq!(planner.materials_needed().get("M"), 3);
}

#[test]
fn test_cycle_fails_fast() {
    let catalog = catalog(vec![
        Recipe::new("x", "B", Duration::ZERO).with_input("Y", 1).with_output("X", 1),
        Recipe::new("y", "B", Duration::ZERO).with_input("X", 1).with_output("Y", 1),
    ]);

    let mut planner = Planner::new(&catalog, NoChoice);
    match planner.expand("X", 1) {
        Err(PlanError::Cycle { path }) => assert_eq!(path, vec!["X", "Y", "X"]),
        other => panic!("expected cycle error, got {:?}", other),
    }
}

#[test]
fn test_memoized_choice_across_branches() {
    // P and Q both need the ambiguous M
    let recipes = vec![
        Recipe::new("t", "ASM", Duration::ZERO)
            .with_input("P", 1)
            .with_input("Q", 1)
            .with_output("T", 1),
        Recipe::new("p", "ASM", Duration::ZERO).with_input("M", 5).with_output("P", 1),
        Recipe::new("q", "ASM", Duration::ZERO).with_input("M", 5).with_output("Q", 1),
        Recipe::new("m-cheap", "SME", Duration::from_secs(1))
            .with_input("FEO", 1)
            .with_output("M", 1),
        Recipe::new("m-bulk", "SME", Duration::from_secs(3))
            .with_input("FEO", 2)
            .with_output("M", 4),
    ];
    let catalog = catalog(recipes);

    let mut asked = Vec::new();
    let chooser = |ticker: &str, candidates: &[Arc<Recipe>]| -> Result<usize> {
        asked.push(ticker.to_string());
        Ok(candidates.len() - 1)
    };
    let outcome = plan_targets(&catalog, chooser, [("T", 1)], 16).unwrap();

    assert_eq!(asked, vec!["M"]);
    let bulk = outcome.plan.recipe("SME", "m-bulk").unwrap();
    // 5 -> 2 runs (3 spare), then 5 - 3 -> 1 run
    assert_eq!(bulk.runs, 3);
    assert!(outcome.plan.recipe("SME", "m-cheap").is_none());
}

#[test]
fn test_invalid_selection_aborts_run() {
    let catalog = catalog(vec![
        Recipe::new("a", "B", Duration::ZERO).with_input("H2O", 1).with_output("M", 1),
        Recipe::new("b", "B", Duration::ZERO).with_input("O", 1).with_output("M", 1),
    ]);

    let chooser = PresetChoices::new(HashMap::from([("M".to_string(), 2)]), FirstRecipe);
    let err = plan_targets(&catalog, chooser, [("M", 1)], 16).unwrap_err();
    assert!(matches!(
        err,
        PlanError::InvalidSelection { index: 2, candidates: 2, .. }
    ));
}

#[test]
fn test_unknown_input_is_configuration_error() {
    let catalog = catalog(vec![
        Recipe::new("a", "B", Duration::ZERO).with_input("MYSTERY", 1).with_output("M", 1),
    ]);

    let err = plan_targets(&catalog, NoChoice, [("M", 1)], 16).unwrap_err();
    assert!(matches!(err, PlanError::UnknownMaterial(t) if t == "MYSTERY"));
}

#[test]
fn test_plan_from_database() {
    let conn = Connection::open_in_memory().unwrap();
    db::init_schema(&conn).unwrap();
    for recipe in [
        Recipe::new("R1", "B1", Duration::from_millis(1000))
            .with_input("H2O", 2)
            .with_output("ICE", 1),
        Recipe::new("R2", "B2", Duration::from_millis(2000))
            .with_input("ICE", 2)
            .with_input("O", 1)
            .with_output("SNW", 1),
    ] {
        db::insert_recipe(&conn, &recipe).unwrap();
    }

    let catalog = RecipeCatalog::from_recipes(db::load_recipes(&conn).unwrap(), ["H2O", "O"]).unwrap();
    let outcome = plan_targets(&catalog, NoChoice, [("SNW", 2)], 16).unwrap();

    assert_eq!(outcome.plan.recipe("B2", "R2").unwrap().runs, 2);
    assert_eq!(outcome.plan.recipe("B1", "R1").unwrap().runs, 4);
    assert_eq!(outcome.materials_needed.get("H2O"), 8);
    assert_eq!(outcome.materials_needed.get("O"), 2);
}
