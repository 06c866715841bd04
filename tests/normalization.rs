use boq_estimator::error::EvaluateError;
use boq_estimator::estimate::evaluate;
use boq_estimator::model::{KeyNormalization, PriceColumn, Tier};
use boq_estimator::parser::{load_price_table, load_recipes};
use pretty_assertions::assert_eq;
use std::fs;
use std::path::{Path, PathBuf};

const PRICES: &str = "\
Item,UoM,Central_Avg_UnitCost
River Sand,m3,40
Cement,bag,10
";

const RECIPES: &str = "\
Type,Component,Quantity
Block_Wall 200,River-Sand,0.5
Block_Wall 200,CEMENT,2
";

fn inputs(dir: &Path) -> (PathBuf, PathBuf) {
    let prices = dir.join("prices.csv");
    let recipes = dir.join("recipes.csv");
    fs::write(&prices, PRICES).unwrap();
    fs::write(&recipes, RECIPES).unwrap();
    (prices, recipes)
}

#[test]
fn strict_matching_ignores_separators() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, recipes) = inputs(dir.path());
    let column = PriceColumn::new("Central", Tier::Avg);

    let table = load_price_table(&[prices], &column, KeyNormalization::Strict).unwrap();
    let book = load_recipes(&recipes, KeyNormalization::Strict).unwrap();

    let recipe = book.get("Block Wall-200").unwrap();
    let cost = evaluate(recipe, &table).unwrap();
    assert!((cost.total - 40.0).abs() < 1e-9);
}

#[test]
fn loose_matching_only_folds_case() {
    let dir = tempfile::tempdir().unwrap();
    let (prices, recipes) = inputs(dir.path());
    let column = PriceColumn::new("Central", Tier::Avg);

    let table = load_price_table(&[prices], &column, KeyNormalization::Loose).unwrap();
    let book = load_recipes(&recipes, KeyNormalization::Loose).unwrap();

    assert!(book.get("Block Wall-200").is_none());
    let recipe = book.get(" block_wall 200 ").unwrap();
    assert_eq!(
        evaluate(recipe, &table).unwrap_err(),
        EvaluateError::MissingMaterialPrice {
            missing: vec!["River-Sand".to_string()]
        }
    );
}
