//! # BOQ Estimator
//!
//! Prices the elements of a building model from unit-cost and recipe CSVs
//! and turns the result into a Bill of Quantities.
//!
//! ## Features
//!
//! - Regional unit-cost tables with a national fallback column
//! - Composite recipes with wastage, labour, transport, plant and overhead
//! - Quantity × Rate amounts per element, measured in metric units
//! - Grand totals, material lists and type description round trips
//! - A three-bill tender workbook with live formulas
//!
//! ## Example
//!
//! ```no_run
//! use boq_estimator::estimate::{apply_rates, grand_total};
//! use boq_estimator::model::{KeyNormalization, PriceColumn, Tier};
//! use boq_estimator::parser::{load_price_table, load_project, load_recipes};
//!
//! let column = PriceColumn::new("Lusaka", Tier::Avg);
//! let prices = load_price_table(&["prices.csv"], &column, KeyNormalization::Loose).unwrap();
//! let recipes = load_recipes("recipes.csv", KeyNormalization::Loose).unwrap();
//! let mut project = load_project("model.json").unwrap();
//!
//! apply_rates(&mut project, &recipes, &prices, "Cost", &column.to_string()).unwrap();
//! println!("Total: {:.2}", grand_total(&project, "Cost").total);
//! ```

pub mod config;
pub mod error;
pub mod estimate;
pub mod export;
pub mod host;
pub mod model;
pub mod parser;
pub mod ui;

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Installs the global subscriber. Logs go to stderr so reports on stdout
/// stay clean; `RUST_LOG` overrides the `info` default.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
        .init();
}
