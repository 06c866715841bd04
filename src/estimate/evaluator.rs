use crate::error::EvaluateError;
use crate::model::{PriceLookup, PriceSource, Recipe};
use serde::Serialize;

/// Which markup lines came out above zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AppliedMarkups {
    pub labour: bool,
    pub transport: bool,
    pub plant: bool,
    pub wastage: bool,
    pub overhead: bool,
}

impl AppliedMarkups {
    #[must_use]
    pub fn labels(&self) -> Vec<&'static str> {
        [
            (self.labour, "Labour"),
            (self.transport, "Transport"),
            (self.plant, "Plant"),
            (self.wastage, "Wastage"),
            (self.overhead, "Profit"),
        ]
        .into_iter()
        .filter_map(|(on, label)| on.then_some(label))
        .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PricedMaterial {
    pub component: String,
    pub quantity: f64,
    pub unit_price: f64,
    pub cost: f64,
    pub source: PriceSource,
}

/// Unit cost of one recipe, line by line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostBreakdown {
    pub recipe: String,
    pub materials: Vec<PricedMaterial>,
    pub material_total: f64,
    pub wastage: f64,
    pub labour: f64,
    pub transport: f64,
    pub plant: f64,
    pub subtotal: f64,
    pub overhead: f64,
    pub total: f64,
    pub applied: AppliedMarkups,
}

impl CostBreakdown {
    /// Materials priced from the national column instead of the selected
    /// region.
    pub fn national_fallbacks(&self) -> impl Iterator<Item = &str> {
        self.materials
            .iter()
            .filter(|m| m.source == PriceSource::NationalFallback)
            .map(|m| m.component.as_str())
    }

    #[must_use]
    pub fn used_national_fallback(&self) -> bool {
        self.national_fallbacks().next().is_some()
    }
}

/// Prices `recipe` against `prices`.
///
/// Percent markups apply to the material total. Overhead applies to the
/// subtotal after every other markup.
///
/// # Errors
///
/// Returns [`EvaluateError::MissingMaterialPrice`] naming every material
/// without a price. A partially priced recipe never yields a cost.
///
/// # Example
///
/// ```
/// use boq_estimator::estimate::evaluate;
/// use boq_estimator::model::{KeyNormalization, PriceColumn, Recipe, Tier, UnitPriceTable};
///
/// let mut prices = UnitPriceTable::new(PriceColumn::new("Central", Tier::Avg), KeyNormalization::Loose);
/// prices.set_price("Cement", 10.0);
/// prices.set_price("Sand", 4.0);
///
/// let mut recipe = Recipe::new("Block Wall");
/// recipe.set_material("Cement", 2.0);
/// recipe.set_material("Sand", 3.0);
/// recipe.labour_percent = 0.15;
/// recipe.overhead_percent = 0.10;
///
/// let cost = evaluate(&recipe, &prices).unwrap();
/// assert!((cost.total - 40.48).abs() < 1e-9);
/// ```
pub fn evaluate<L: PriceLookup + ?Sized>(
    recipe: &Recipe,
    prices: &L,
) -> Result<CostBreakdown, EvaluateError> {
    let mut materials = Vec::with_capacity(recipe.materials.len());
    let mut missing = Vec::new();

    for line in &recipe.materials {
        match prices.lookup(&line.component) {
            Some(entry) => materials.push(PricedMaterial {
                component: line.component.clone(),
                quantity: line.quantity,
                unit_price: entry.price,
                cost: line.quantity * entry.price,
                source: entry.source,
            }),
            None => missing.push(line.component.clone()),
        }
    }

    if !missing.is_empty() {
        return Err(EvaluateError::MissingMaterialPrice { missing });
    }

    let material_total: f64 = materials.iter().map(|m| m.cost).sum();

    let wastage = material_total * recipe.wastage_percent;
    let labour = material_total * recipe.labour_percent
        + recipe.labour_fixed.iter().sum::<f64>()
        + recipe.labour_time.iter().sum::<f64>();
    let transport = material_total * recipe.transport_percent
        + recipe.transport_fixed.iter().sum::<f64>()
        + recipe.transport_distance.iter().sum::<f64>();
    let plant = material_total * recipe.plant_percent
        + recipe.plant_fixed.iter().sum::<f64>()
        + recipe.plant_time.iter().sum::<f64>();

    let subtotal = material_total + wastage + labour + transport + plant;
    let overhead = subtotal * recipe.overhead_percent;
    let total = subtotal + overhead;

    Ok(CostBreakdown {
        recipe: recipe.name.clone(),
        materials,
        material_total,
        wastage,
        labour,
        transport,
        plant,
        subtotal,
        overhead,
        total,
        applied: AppliedMarkups {
            labour: labour > 0.0,
            transport: transport > 0.0,
            plant: plant > 0.0,
            wastage: wastage > 0.0,
            overhead: overhead > 0.0,
        },
    })
}
