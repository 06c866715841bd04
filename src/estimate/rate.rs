//! Writing recipe unit costs onto types, and unit prices onto finish
//! materials.

use super::evaluator::{evaluate, CostBreakdown};
use crate::error::{EvaluateError, HostError};
use crate::host::{ChangeSet, FieldAccess, HostModel};
use crate::model::{Category, ElementId, ElementKind, PriceLookup, RecipeBook};
use serde::Serialize;
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RatedType {
    pub id: ElementId,
    pub name: String,
    pub category: Category,
    pub breakdown: CostBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedType {
    pub id: ElementId,
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialRate {
    pub id: ElementId,
    pub name: String,
    pub price: f64,
}

/// Outcome of one rate run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RateReport {
    /// Price column the run used, e.g. `Lusaka_Avg`.
    pub column: String,
    /// Price files behind the run, in load order.
    pub sources: Vec<PathBuf>,
    pub updated: Vec<RatedType>,
    pub skipped: Vec<SkippedType>,
    pub missing_materials: BTreeSet<String>,
    pub materials_updated: Vec<MaterialRate>,
    /// Priced materials with no writable cost field.
    pub materials_skipped: Vec<String>,
    /// Writes the host accepted.
    pub committed: usize,
}

impl RateReport {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty()
            && self.skipped.is_empty()
            && self.materials_updated.is_empty()
            && self.materials_skipped.is_empty()
    }
}

/// Evaluates every rate-able type and stages its new cost. Nothing is
/// written to the host.
pub fn plan_rates<H, L>(
    host: &H,
    recipes: &RecipeBook,
    prices: &L,
    cost_field: &str,
) -> (ChangeSet, RateReport)
where
    H: HostModel + ?Sized,
    L: PriceLookup + ?Sized,
{
    let mut changes = ChangeSet::new("Set composite & paint costs");
    let mut report = RateReport {
        sources: prices.sources().to_vec(),
        ..RateReport::default()
    };

    for id in host.element_ids(ElementKind::Type) {
        let Some(category) = host
            .category(id)
            .and_then(|c| Category::from_name(&c))
            .filter(|c| c.is_rated())
        else {
            continue;
        };
        if host.field_access(id, cost_field) != FieldAccess::Writable {
            continue;
        }
        let name = host.name(id).unwrap_or_default();
        let Some(recipe) = recipes.get(&name) else {
            continue;
        };

        match evaluate(recipe, prices) {
            Ok(breakdown) => {
                changes.set_number(id, cost_field, breakdown.total);
                report.updated.push(RatedType {
                    id,
                    name,
                    category,
                    breakdown,
                });
            }
            Err(err) => {
                let EvaluateError::MissingMaterialPrice { missing } = &err;
                report.missing_materials.extend(missing.iter().cloned());
                tracing::warn!(type_name = %name, reason = %err, "skipped type");
                report.skipped.push(SkippedType {
                    id,
                    name,
                    reason: err.to_string(),
                });
            }
        }
    }

    for id in host.element_ids(ElementKind::Material) {
        let name = host.name(id).unwrap_or_default();
        let Some(entry) = prices.lookup(&name) else {
            continue;
        };
        if host.field_access(id, cost_field) == FieldAccess::Writable {
            changes.set_number(id, cost_field, entry.price);
            report.materials_updated.push(MaterialRate {
                id,
                name,
                price: entry.price,
            });
        } else {
            report.materials_skipped.push(name);
        }
    }

    report.updated.sort_by(|a, b| a.name.cmp(&b.name));
    report.skipped.sort_by(|a, b| a.name.cmp(&b.name));
    report.materials_updated.sort_by(|a, b| a.name.cmp(&b.name));
    report.materials_skipped.sort();

    (changes, report)
}

/// Plans the rate run and commits it in one batch.
///
/// # Errors
///
/// Returns the host's [`HostError`] if it refuses the batch; the model is
/// then unchanged.
pub fn apply_rates<H, L>(
    host: &mut H,
    recipes: &RecipeBook,
    prices: &L,
    cost_field: &str,
    column: &str,
) -> Result<RateReport, HostError>
where
    H: HostModel + ?Sized,
    L: PriceLookup + ?Sized,
{
    let (changes, mut report) = plan_rates(&*host, recipes, prices, cost_field);
    report.column = column.to_string();

    if !changes.is_empty() {
        report.committed = host.commit(changes)?;
    }

    tracing::info!(
        column,
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        materials = report.materials_updated.len(),
        "applied rates"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Element, Field, KeyNormalization, PriceColumn, Project, RecipeSchema, Tier, UnitPriceTable,
    };
    use pretty_assertions::assert_eq;

    fn prices() -> UnitPriceTable {
        let mut table =
            UnitPriceTable::new(PriceColumn::new("Central", Tier::Avg), KeyNormalization::Loose);
        table.set_price("Cement", 10.0);
        table.set_price("Sand", 4.0);
        table.set_price("Emulsion Paint", 55.0);
        table
    }

    fn recipes() -> RecipeBook {
        let mut book = RecipeBook::new(RecipeSchema::V2, KeyNormalization::Loose);
        let wall = book.entry("Block Wall 200");
        wall.set_material("Cement", 2.0);
        wall.set_material("Sand", 3.0);
        wall.labour_percent = 0.15;
        wall.overhead_percent = 0.10;

        let slab = book.entry("Slab 150");
        slab.set_material("Cement", 4.0);
        slab.set_material("Aggregate", 2.0);

        book.entry("Door D1").set_material("Sand", 1.0);
        book
    }

    fn project() -> Project {
        Project::new("Rates")
            .with(
                Element::new(1, ElementKind::Type, "Block Wall 200")
                    .in_category("Walls")
                    .with_field("Cost", Field::number(0.0)),
            )
            .with(
                Element::new(2, ElementKind::Type, "Slab 150")
                    .in_category("Floors")
                    .with_field("Cost", Field::number(99.0)),
            )
            .with(
                Element::new(3, ElementKind::Type, "Door D1")
                    .in_category("Doors")
                    .with_field("Cost", Field::number(0.0).read_only()),
            )
            .with(
                Element::new(4, ElementKind::Type, "Unpriced Wall")
                    .in_category("Walls")
                    .with_field("Cost", Field::empty()),
            )
            .with(
                Element::new(5, ElementKind::Material, "Emulsion Paint")
                    .with_field("Cost", Field::number(0.0)),
            )
            .with(Element::new(6, ElementKind::Material, "emulsion paint"))
    }

    #[test]
    fn updates_types_and_paints_in_one_commit() {
        let mut project = project();

        let report =
            apply_rates(&mut project, &recipes(), &prices(), "Cost", "Central_Avg").unwrap();

        assert_eq!(report.column, "Central_Avg");
        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].name, "Block Wall 200");
        assert!((project.element(ElementId(1)).unwrap().number("Cost").unwrap() - 40.48).abs() < 1e-9);

        assert_eq!(report.materials_updated.len(), 1);
        assert_eq!(project.element(ElementId(5)).unwrap().number("Cost"), Some(55.0));
        assert_eq!(report.materials_skipped, vec!["emulsion paint".to_string()]);
        assert_eq!(report.committed, 2);
    }

    #[test]
    fn missing_price_skips_the_type_and_leaves_its_cost() {
        let mut project = project();

        let report = apply_rates(&mut project, &recipes(), &prices(), "Cost", "Central_Avg").unwrap();

        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].name, "Slab 150");
        assert_eq!(report.skipped[0].reason, "missing material: Aggregate");
        assert_eq!(
            report.missing_materials.iter().collect::<Vec<_>>(),
            vec!["Aggregate"]
        );
        assert_eq!(project.element(ElementId(2)).unwrap().number("Cost"), Some(99.0));
    }

    #[test]
    fn read_only_cost_and_unknown_recipe_are_ignored() {
        let (_, report) = plan_rates(&project(), &recipes(), &prices(), "Cost");

        assert!(report.updated.iter().all(|t| t.name != "Door D1"));
        assert!(report.skipped.iter().all(|t| t.name != "Door D1"));
        assert!(report.skipped.iter().all(|t| t.name != "Unpriced Wall"));
    }

    #[test]
    fn planning_does_not_touch_the_host() {
        let project = project();
        let (changes, _) = plan_rates(&project, &recipes(), &prices(), "Cost");

        assert_eq!(changes.len(), 2);
        assert_eq!(project.element(ElementId(1)).unwrap().number("Cost"), Some(0.0));
    }

    #[test]
    fn report_carries_the_price_files() {
        let mut prices = prices();
        prices.sources.push(PathBuf::from("costs/2024.csv"));

        let (_, report) = plan_rates(&project(), &recipes(), &prices, "Cost");

        assert_eq!(report.sources, vec![PathBuf::from("costs/2024.csv")]);
    }
}
