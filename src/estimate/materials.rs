//! Material take-off: model quantities grouped by type, multiplied out
//! through each type's recipe.

use super::quantity::{element_category, measure, MeasureMethod, MeasurePolicy};
use crate::host::HostModel;
use crate::model::{ElementKind, PriceLookup, RecipeBook};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialUsage {
    pub component: String,
    pub uom: String,
    pub total_quantity: f64,
    /// `None` when the material has no price.
    pub unit_cost: Option<f64>,
    pub total_cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeMaterials {
    pub type_name: String,
    pub method: MeasureMethod,
    /// Summed model quantity of every instance of the type.
    pub quantity: f64,
    /// Sorted by component name.
    pub materials: Vec<MaterialUsage>,
}

impl TypeMaterials {
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.materials.iter().map(|m| m.total_cost).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MaterialList {
    /// Sorted by type name.
    pub types: Vec<TypeMaterials>,
    pub missing_prices: BTreeSet<String>,
    /// Measured types with no recipe.
    pub unmatched_types: Vec<String>,
    pub skipped_elements: usize,
}

impl MaterialList {
    #[must_use]
    pub fn total_cost(&self) -> f64 {
        self.types.iter().map(TypeMaterials::total_cost).sum()
    }
}

/// Builds the material list for every rate-able instance in the model.
pub fn material_list<H, L>(host: &H, recipes: &RecipeBook, prices: &L) -> MaterialList
where
    H: HostModel + ?Sized,
    L: PriceLookup + ?Sized,
{
    let mut measured: BTreeMap<String, (MeasureMethod, f64)> = BTreeMap::new();
    let mut list = MaterialList::default();

    for id in host.element_ids(ElementKind::Instance) {
        let rated = element_category(host, id).is_ok_and(|c| c.is_rated());
        if !rated {
            continue;
        }
        let Some(type_name) = host.type_of(id).and_then(|t| host.name(t)) else {
            list.skipped_elements += 1;
            continue;
        };
        match measure(host, id, MeasurePolicy::MaterialKeyword) {
            Ok(quantity) => {
                let slot = measured
                    .entry(type_name)
                    .or_insert((quantity.method, 0.0));
                slot.1 += quantity.value;
            }
            Err(err) => {
                tracing::debug!(element = %id, reason = %err, "not measured");
                list.skipped_elements += 1;
            }
        }
    }

    for (type_name, (method, quantity)) in measured {
        if quantity <= 0.0 {
            continue;
        }
        let Some(recipe) = recipes.get(&type_name) else {
            list.unmatched_types.push(type_name);
            continue;
        };

        let mut materials: Vec<MaterialUsage> = recipe
            .materials
            .iter()
            .map(|line| {
                let total_quantity = quantity * line.quantity;
                let entry = prices.lookup(&line.component);
                if entry.is_none() {
                    list.missing_prices.insert(line.component.clone());
                }
                MaterialUsage {
                    component: line.component.clone(),
                    uom: entry.and_then(|e| e.uom.clone()).unwrap_or_default(),
                    total_quantity,
                    unit_cost: entry.map(|e| e.price),
                    total_cost: entry.map_or(0.0, |e| total_quantity * e.price),
                }
            })
            .collect();
        if materials.is_empty() {
            continue;
        }
        materials.sort_by(|a, b| a.component.cmp(&b.component));

        list.types.push(TypeMaterials {
            type_name,
            method,
            quantity,
            materials,
        });
    }

    tracing::info!(
        types = list.types.len(),
        unmatched = list.unmatched_types.len(),
        missing_prices = list.missing_prices.len(),
        "built material list"
    );
    list
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::quantity::{AREA_FIELD, FT2_TO_M2};
    use crate::model::{
        Element, Field, KeyNormalization, PriceColumn, PriceEntry, PriceSource, Project,
        RecipeSchema, Tier, UnitPriceTable,
    };
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        Project::new("M")
            .with(Element::new(10, ElementKind::Type, "Block Wall 200").in_category("Walls"))
            .with(Element::new(11, ElementKind::Type, "Curtain").in_category("Walls"))
            .with(
                Element::new(1, ElementKind::Instance, "w")
                    .in_category("Walls")
                    .of_type(10)
                    .with_field(AREA_FIELD, Field::number(100.0)),
            )
            .with(
                Element::new(2, ElementKind::Instance, "w")
                    .in_category("Walls")
                    .of_type(10)
                    .with_field(AREA_FIELD, Field::number(50.0)),
            )
            .with(
                Element::new(3, ElementKind::Instance, "c")
                    .in_category("Walls")
                    .of_type(11)
                    .with_field(AREA_FIELD, Field::number(20.0)),
            )
            .with(Element::new(4, ElementKind::Instance, "w").in_category("Walls").of_type(10))
            .with(Element::new(5, ElementKind::Instance, "chair").in_category("Furniture"))
    }

    #[test]
    fn groups_by_type_and_multiplies_through_recipe() {
        let mut book = RecipeBook::new(RecipeSchema::V1, KeyNormalization::Loose);
        let wall = book.entry("Block Wall 200");
        wall.set_material("Cement", 0.5);
        wall.set_material("Blocks", 12.5);

        let mut prices =
            UnitPriceTable::new(PriceColumn::new("Central", Tier::Avg), KeyNormalization::Loose);
        prices.insert(PriceEntry {
            item: "Cement".into(),
            price: 200.0,
            source: PriceSource::Regional,
            uom: Some("bag".into()),
        });

        let list = material_list(&project(), &book, &prices);

        assert_eq!(list.types.len(), 1);
        let wall = &list.types[0];
        let area = 150.0 * FT2_TO_M2;
        assert!((wall.quantity - area).abs() < 1e-9);
        assert_eq!(wall.materials[0].component, "Blocks");
        assert_eq!(wall.materials[0].unit_cost, None);
        assert!((wall.materials[0].total_quantity - area * 12.5).abs() < 1e-9);
        assert_eq!(wall.materials[1].uom, "bag");
        assert!((wall.materials[1].total_cost - area * 0.5 * 200.0).abs() < 1e-9);

        assert_eq!(list.unmatched_types, vec!["Curtain".to_string()]);
        assert_eq!(list.missing_prices.iter().collect::<Vec<_>>(), vec!["Blocks"]);
        assert_eq!(list.skipped_elements, 1);
    }

    fn doors() -> Project {
        Project::new("Doors")
            .with(Element::new(20, ElementKind::Type, "Door D1").in_category("Doors"))
            .with(Element::new(21, ElementKind::Type, "Door D1").in_category("Doors"))
            .with(Element::new(1, ElementKind::Instance, "d").in_category("Doors").of_type(20))
            .with(Element::new(2, ElementKind::Instance, "d").in_category("Doors").of_type(20))
            .with(Element::new(3, ElementKind::Instance, "d").in_category("Doors").of_type(21))
    }

    fn door_recipe() -> RecipeBook {
        let mut book = RecipeBook::new(RecipeSchema::V1, KeyNormalization::Loose);
        let door = book.entry("Door D1");
        door.set_material("Timber", 1.0);
        door.set_material("Hinges", 3.0);
        book
    }

    #[test]
    fn instances_group_by_type_name() {
        let prices =
            UnitPriceTable::new(PriceColumn::new("Central", Tier::Avg), KeyNormalization::Loose);

        let list = material_list(&doors(), &door_recipe(), &prices);

        assert_eq!(list.types.len(), 1);
        assert_eq!(list.types[0].type_name, "Door D1");
        assert_eq!(list.types[0].method, MeasureMethod::Count);
        assert!((list.types[0].quantity - 3.0).abs() < 1e-9);
    }

    #[test]
    fn missing_price_is_costed_zero_and_listed() {
        let mut prices =
            UnitPriceTable::new(PriceColumn::new("Central", Tier::Avg), KeyNormalization::Loose);
        prices.set_price("Timber", 900.0);

        let list = material_list(&doors(), &door_recipe(), &prices);

        let door = &list.types[0];
        let hinges = &door.materials[0];
        assert_eq!(hinges.component, "Hinges");
        assert!((hinges.total_quantity - 9.0).abs() < 1e-9);
        assert_eq!(hinges.unit_cost, None);
        assert_eq!(hinges.total_cost, 0.0);
        assert!((door.total_cost() - 2700.0).abs() < 1e-9);
        assert_eq!(list.missing_prices.iter().collect::<Vec<_>>(), vec!["Hinges"]);
    }
}
