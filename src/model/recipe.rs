use serde::Serialize;
use std::collections::HashMap;

use super::price::KeyNormalization;

/// Which cost line a markup row feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MarkupBucket {
    Labour,
    Transport,
    Plant,
    Wastage,
    Overhead,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MaterialLine {
    pub component: String,
    pub quantity: f64,
}

/// What a single recipe row contributes. A row contributes exactly one.
#[derive(Debug, Clone, PartialEq)]
pub enum RowEffect {
    Material { component: String, quantity: f64 },
    Percent { bucket: MarkupBucket, fraction: f64 },
    Fixed { bucket: MarkupBucket, amount: f64 },
    TimeRate { bucket: MarkupBucket, amount: f64 },
}

/// Composition of one build-up type: the materials it consumes per unit of
/// output and its labour/transport/plant/wastage/overhead markups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Recipe {
    pub name: String,
    pub materials: Vec<MaterialLine>,
    pub labour_percent: f64,
    pub transport_percent: f64,
    pub plant_percent: f64,
    pub wastage_percent: f64,
    pub overhead_percent: f64,
    pub labour_fixed: Vec<f64>,
    pub transport_fixed: Vec<f64>,
    pub plant_fixed: Vec<f64>,
    pub labour_time: Vec<f64>,
    pub transport_distance: Vec<f64>,
    pub plant_time: Vec<f64>,
}

impl Recipe {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Sets a material quantity. A repeated component keeps its position and
    /// takes the new quantity.
    pub fn set_material(&mut self, component: impl Into<String>, quantity: f64) {
        let component = component.into();
        if let Some(line) = self
            .materials
            .iter_mut()
            .find(|line| line.component == component)
        {
            line.quantity = quantity;
        } else {
            self.materials.push(MaterialLine {
                component,
                quantity,
            });
        }
    }

    pub fn apply(&mut self, effect: RowEffect) {
        match effect {
            RowEffect::Material {
                component,
                quantity,
            } => self.set_material(component, quantity),
            RowEffect::Percent { bucket, fraction } => {
                let slot = match bucket {
                    MarkupBucket::Labour => &mut self.labour_percent,
                    MarkupBucket::Transport => &mut self.transport_percent,
                    MarkupBucket::Plant => &mut self.plant_percent,
                    MarkupBucket::Wastage => &mut self.wastage_percent,
                    MarkupBucket::Overhead => &mut self.overhead_percent,
                };
                *slot = fraction;
            }
            RowEffect::Fixed { bucket, amount } => match bucket {
                MarkupBucket::Transport => self.transport_fixed.push(amount),
                MarkupBucket::Plant => self.plant_fixed.push(amount),
                _ => self.labour_fixed.push(amount),
            },
            RowEffect::TimeRate { bucket, amount } => match bucket {
                MarkupBucket::Transport => self.transport_distance.push(amount),
                MarkupBucket::Plant => self.plant_time.push(amount),
                _ => self.labour_time.push(amount),
            },
        }
    }

    #[must_use]
    pub fn has_markups(&self) -> bool {
        self.labour_percent != 0.0
            || self.transport_percent != 0.0
            || self.plant_percent != 0.0
            || self.wastage_percent != 0.0
            || self.overhead_percent != 0.0
            || !self.labour_fixed.is_empty()
            || !self.transport_fixed.is_empty()
            || !self.plant_fixed.is_empty()
            || !self.labour_time.is_empty()
            || !self.transport_distance.is_empty()
            || !self.plant_time.is_empty()
    }
}

/// Recipe CSV layout. The header decides which one a file uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RecipeSchema {
    /// `Type, Component, Quantity` only.
    V1,
    /// Adds `Labour`, `Labour_Fixed`, `Time/Distance`, `Rate`.
    V2,
    /// Adds `Labour/Transport`, `Labour/Transport_Fixed`, `Time/Distance`, `Rate`.
    V3,
    /// Adds `Labour/Transport/Wastage/Profit`, `Labour/Transport/Plant_Fixed`,
    /// `Time/Distance`, `Rate`.
    V4,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RejectedRow {
    /// 1-based data row number (the header is row 0).
    pub row: usize,
    pub reason: String,
}

/// Every recipe from one CSV, keyed by normalized type name.
#[derive(Debug, Clone)]
pub struct RecipeBook {
    pub schema: RecipeSchema,
    pub normalization: KeyNormalization,
    pub rejected: Vec<RejectedRow>,
    recipes: HashMap<String, Recipe>,
}

impl RecipeBook {
    #[must_use]
    pub fn new(schema: RecipeSchema, normalization: KeyNormalization) -> Self {
        Self {
            schema,
            normalization,
            rejected: Vec::new(),
            recipes: HashMap::new(),
        }
    }

    /// Returns the recipe for `type_name`, creating an empty one on first use.
    pub fn entry(&mut self, type_name: &str) -> &mut Recipe {
        let key = self.normalization.normalize(type_name);
        self.recipes
            .entry(key)
            .or_insert_with(|| Recipe::new(type_name.trim()))
    }

    pub fn insert(&mut self, recipe: Recipe) {
        let key = self.normalization.normalize(&recipe.name);
        self.recipes.insert(key, recipe);
    }

    #[must_use]
    pub fn get(&self, type_name: &str) -> Option<&Recipe> {
        self.recipes.get(&self.normalization.normalize(type_name))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.recipes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.recipes.is_empty()
    }

    pub fn recipes(&self) -> impl Iterator<Item = &Recipe> {
        self.recipes.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn repeated_material_overwrites_in_place() {
        let mut recipe = Recipe::new("Block Wall 200");
        recipe.set_material("Cement", 2.0);
        recipe.set_material("Sand", 3.0);
        recipe.set_material("Cement", 2.5);

        assert_eq!(
            recipe.materials,
            vec![
                MaterialLine {
                    component: "Cement".into(),
                    quantity: 2.5
                },
                MaterialLine {
                    component: "Sand".into(),
                    quantity: 3.0
                },
            ]
        );
    }

    #[test]
    fn effects_land_in_their_bucket() {
        let mut recipe = Recipe::new("Slab");
        recipe.apply(RowEffect::Percent {
            bucket: MarkupBucket::Wastage,
            fraction: 0.05,
        });
        recipe.apply(RowEffect::Fixed {
            bucket: MarkupBucket::Plant,
            amount: 120.0,
        });
        recipe.apply(RowEffect::TimeRate {
            bucket: MarkupBucket::Transport,
            amount: 40.0,
        });
        recipe.apply(RowEffect::TimeRate {
            bucket: MarkupBucket::Labour,
            amount: 16.0,
        });

        assert_eq!(recipe.wastage_percent, 0.05);
        assert_eq!(recipe.plant_fixed, vec![120.0]);
        assert_eq!(recipe.transport_distance, vec![40.0]);
        assert_eq!(recipe.labour_time, vec![16.0]);
        assert!(recipe.materials.is_empty());
        assert!(recipe.has_markups());
    }

    #[test]
    fn book_lookup_is_normalized() {
        let mut book = RecipeBook::new(RecipeSchema::V1, KeyNormalization::Loose);
        book.entry(" Block Wall 200 ").set_material("Cement", 1.0);

        assert!(book.get("block wall 200").is_some());
        assert_eq!(book.get("BLOCK WALL 200").map(|r| r.name.as_str()), Some("Block Wall 200"));
        assert_eq!(book.len(), 1);
    }
}
