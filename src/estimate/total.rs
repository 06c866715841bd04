//! Grand totals: type costs by category, or the amounts written onto
//! instances.

use crate::host::{FieldAccess, HostModel};
use crate::model::{ElementId, ElementKind};
use serde::Serialize;
use std::collections::BTreeMap;

/// Label used for types whose category is empty or unknown to the host.
pub const UNCATEGORIZED: &str = "Uncategorized";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TypeCost {
    pub id: ElementId,
    pub name: String,
    pub cost: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: f64,
    pub types: Vec<TypeCost>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GrandTotal {
    pub total: f64,
    /// Sorted by category name.
    pub categories: Vec<CategoryTotal>,
}

impl GrandTotal {
    #[must_use]
    pub fn type_count(&self) -> usize {
        self.categories.iter().map(|c| c.types.len()).sum()
    }
}

/// Sums the cost field of every type where it is writable. Read-only costs
/// are host-computed and not part of the estimate; an empty cost counts as
/// zero.
pub fn grand_total<H: HostModel + ?Sized>(host: &H, cost_field: &str) -> GrandTotal {
    let mut by_category: BTreeMap<String, CategoryTotal> = BTreeMap::new();

    for id in host.element_ids(ElementKind::Type) {
        if host.field_access(id, cost_field) != FieldAccess::Writable {
            continue;
        }
        let cost = host.read_number(id, cost_field).unwrap_or(0.0);
        let category = host
            .category(id)
            .unwrap_or_else(|| UNCATEGORIZED.to_string());

        let entry = by_category
            .entry(category.clone())
            .or_insert_with(|| CategoryTotal {
                category,
                ..CategoryTotal::default()
            });
        entry.total += cost;
        entry.types.push(TypeCost {
            id,
            name: host.name(id).unwrap_or_default(),
            cost,
        });
    }

    let categories: Vec<CategoryTotal> = by_category
        .into_values()
        .map(|mut c| {
            c.types.sort_by(|a, b| b.cost.total_cmp(&a.cost).then_with(|| a.name.cmp(&b.name)));
            c
        })
        .collect();

    GrandTotal {
        total: categories.iter().map(|c| c.total).sum(),
        categories,
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CategoryAmount {
    pub category: String,
    /// Instances that contributed.
    pub count: usize,
    pub total: f64,
}

/// Sum of an instance amount field.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AmountTotal {
    pub field: String,
    pub total: f64,
    pub count: usize,
    /// Sorted by category name.
    pub categories: Vec<CategoryAmount>,
}

/// Sums `amount_field` over every instance where it holds a positive number.
/// Zero, empty and missing amounts are left out of both the total and the
/// counts.
pub fn instance_total<H: HostModel + ?Sized>(host: &H, amount_field: &str) -> AmountTotal {
    let mut by_category: BTreeMap<String, CategoryAmount> = BTreeMap::new();

    for id in host.element_ids(ElementKind::Instance) {
        let Some(amount) = host.read_number(id, amount_field).filter(|a| *a > 0.0) else {
            continue;
        };
        let category = host
            .category(id)
            .unwrap_or_else(|| UNCATEGORIZED.to_string());
        let entry = by_category
            .entry(category.clone())
            .or_insert_with(|| CategoryAmount {
                category,
                ..CategoryAmount::default()
            });
        entry.count += 1;
        entry.total += amount;
    }

    let categories: Vec<CategoryAmount> = by_category.into_values().collect();
    AmountTotal {
        field: amount_field.to_string(),
        total: categories.iter().map(|c| c.total).sum(),
        count: categories.iter().map(|c| c.count).sum(),
        categories,
    }
}
