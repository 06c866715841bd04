//! Per-element `quantity × rate` amounts.

use super::quantity::{is_priced_category, measure, resolve_method, MeasurePolicy, Quantity};
use crate::error::{ApplyError, HostError};
use crate::host::{ChangeSet, FieldAccess, HostModel};
use crate::model::{Category, ElementId, ElementKind};
use serde::Serialize;

/// Field names an amount run reads and writes.
#[derive(Debug, Clone, Copy)]
pub struct AmountFields<'a> {
    /// Type field holding the unit rate.
    pub cost: &'a str,
    /// Instance field receiving the amount.
    pub amount: &'a str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AmountLine {
    pub id: ElementId,
    pub quantity: Quantity,
    pub rate: f64,
    pub amount: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SkippedElement {
    pub id: ElementId,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AmountReport {
    pub field: String,
    pub updated: Vec<AmountLine>,
    pub skipped: Vec<SkippedElement>,
    pub committed: usize,
}

impl AmountReport {
    #[must_use]
    pub fn total(&self) -> f64 {
        self.updated.iter().map(|l| l.amount).sum()
    }
}

/// Works out one element's amount without writing it.
pub fn element_amount<H: HostModel + ?Sized>(
    host: &H,
    id: ElementId,
    fields: AmountFields<'_>,
) -> Result<AmountLine, ApplyError> {
    resolve_method(host, id, MeasurePolicy::ExactMaterial)?;

    let type_id = host.type_of(id).ok_or(ApplyError::MissingType)?;
    let rate = host
        .read_number(type_id, fields.cost)
        .ok_or_else(|| ApplyError::MissingTypeCost {
            field: fields.cost.to_string(),
        })?;

    match host.field_access(id, fields.amount) {
        FieldAccess::Missing => {
            return Err(ApplyError::MissingDestination {
                field: fields.amount.to_string(),
            })
        }
        FieldAccess::ReadOnly => {
            return Err(ApplyError::ReadOnlyDestination {
                field: fields.amount.to_string(),
            })
        }
        FieldAccess::Writable => {}
    }

    let quantity = measure(host, id, MeasurePolicy::ExactMaterial)?;

    Ok(AmountLine {
        id,
        quantity,
        rate,
        amount: rate * quantity.value,
    })
}

/// Instances in a category the amount run does not price are left out
/// entirely. An instance with no category at all is still reported.
fn in_scope<H: HostModel + ?Sized>(host: &H, id: ElementId) -> bool {
    match host.category(id) {
        Some(name) => Category::from_name(&name).is_some_and(is_priced_category),
        None => true,
    }
}

/// Computes every instance's amount. Failures are collected, never fatal.
pub fn plan_amounts<H: HostModel + ?Sized>(
    host: &H,
    fields: AmountFields<'_>,
) -> (ChangeSet, AmountReport) {
    let mut changes = ChangeSet::new("Compute Amount (Qty × Rate)");
    let mut report = AmountReport {
        field: fields.amount.to_string(),
        ..AmountReport::default()
    };

    for id in host
        .element_ids(ElementKind::Instance)
        .into_iter()
        .filter(|id| in_scope(host, *id))
    {
        match element_amount(host, id, fields) {
            Ok(line) => {
                changes.set_number(id, fields.amount, line.amount);
                report.updated.push(line);
            }
            Err(err) => {
                tracing::debug!(element = %id, reason = %err, "skipped element");
                report.skipped.push(SkippedElement {
                    id,
                    reason: err.to_string(),
                });
            }
        }
    }

    (changes, report)
}

/// Computes and commits every instance's amount in one batch.
///
/// # Errors
///
/// Returns [`HostError`] if the host rejects the batch. Per-element
/// failures are in [`AmountReport::skipped`] instead.
pub fn apply_amounts<H: HostModel + ?Sized>(
    host: &mut H,
    fields: AmountFields<'_>,
) -> Result<AmountReport, HostError> {
    let (changes, mut report) = plan_amounts(&*host, fields);

    if !changes.is_empty() {
        report.committed = host.commit(changes)?;
    }

    tracing::info!(
        field = fields.amount,
        updated = report.updated.len(),
        skipped = report.skipped.len(),
        "applied amounts"
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::quantity::{AREA_FIELD, STRUCTURAL_MATERIAL_FIELD, VOLUME_FIELD};
    use crate::model::{Element, Field, Project};
    use pretty_assertions::assert_eq;

    const FIELDS: AmountFields<'static> = AmountFields {
        cost: "Cost",
        amount: "Amount (Qty*Rate)",
    };

    fn wall_type() -> Element {
        Element::new(100, ElementKind::Type, "Block Wall 200")
            .in_category("Walls")
            .with_field("Cost", Field::number(50.0))
    }

    fn wall(id: u64) -> Element {
        Element::new(id, ElementKind::Instance, "Wall")
            .in_category("Walls")
            .of_type(100)
            .with_field(AREA_FIELD, Field::number(100.0))
            .with_field("Amount (Qty*Rate)", Field::empty())
    }

    #[test]
    fn wall_amount_example() {
        let mut project = Project::new("A").with(wall_type()).with(wall(1));

        let report = apply_amounts(&mut project, FIELDS).unwrap();

        assert_eq!(report.updated.len(), 1);
        let written = project
            .element(ElementId(1))
            .unwrap()
            .number("Amount (Qty*Rate)")
            .unwrap();
        assert!((written - 464.515).abs() < 1e-9);
        assert_eq!(report.committed, 1);
    }

    #[test]
    fn failures_are_collected_per_element() {
        let mut project = Project::new("A")
            .with(wall_type())
            .with(wall(1))
            .with(Element::new(2, ElementKind::Instance, "loose"))
            .with(
                Element::new(3, ElementKind::Instance, "Orphan wall")
                    .in_category("Walls")
                    .with_field(AREA_FIELD, Field::number(10.0)),
            )
            .with(
                wall(4).with_field("Amount (Qty*Rate)", Field::number(0.0).read_only()),
            )
            .with(
                Element::new(5, ElementKind::Instance, "No destination")
                    .in_category("Walls")
                    .of_type(100)
                    .with_field(AREA_FIELD, Field::number(10.0)),
            )
            .with(
                Element::new(6, ElementKind::Instance, "Timber column")
                    .in_category("Structural Columns")
                    .of_type(100)
                    .with_field(STRUCTURAL_MATERIAL_FIELD, Field::text("Wood"))
                    .with_field(VOLUME_FIELD, Field::number(3.0))
                    .with_field("Amount (Qty*Rate)", Field::empty()),
            )
            .with(
                Element::new(7, ElementKind::Instance, "Unmeasured wall")
                    .in_category("Walls")
                    .of_type(100)
                    .with_field("Amount (Qty*Rate)", Field::empty()),
            );

        let report = apply_amounts(&mut project, FIELDS).unwrap();

        let reasons: Vec<(u64, &str)> = report
            .skipped
            .iter()
            .map(|s| (s.id.0, s.reason.as_str()))
            .collect();
        assert_eq!(
            reasons,
            vec![
                (2, "missing category"),
                (3, "element has no type"),
                (4, "'Amount (Qty*Rate)' is read-only"),
                (5, "missing instance parameter 'Amount (Qty*Rate)'"),
                (6, "unsupported material: Wood"),
                (7, "no 'Area' data"),
            ]
        );
        assert_eq!(report.updated.len(), 1);
        assert_eq!(report.updated[0].id, ElementId(1));
    }

    #[test]
    fn missing_type_cost_is_reported() {
        let project = Project::new("A")
            .with(Element::new(100, ElementKind::Type, "Bare").in_category("Walls"))
            .with(wall(1));

        let err = element_amount(&project, ElementId(1), FIELDS).unwrap_err();
        assert_eq!(
            err,
            ApplyError::MissingTypeCost {
                field: "Cost".into()
            }
        );
    }

    #[test]
    fn missing_value_is_never_zero_filled() {
        let project = Project::new("A").with(wall_type()).with(
            wall(1).with_field(AREA_FIELD, Field::empty()),
        );

        let (changes, report) = plan_amounts(&project, FIELDS);

        assert!(changes.is_empty());
        assert_eq!(report.skipped[0].reason, "no 'Area' data");
    }

    #[test]
    fn unpriced_categories_are_not_reported() {
        let project = Project::new("A")
            .with(wall_type())
            .with(wall(1))
            .with(
                Element::new(2, ElementKind::Instance, "Chair")
                    .in_category("Furniture")
                    .of_type(100)
                    .with_field("Amount (Qty*Rate)", Field::empty()),
            )
            .with(
                Element::new(3, ElementKind::Instance, "Surface")
                    .in_category("Topography")
                    .with_field("Amount (Qty*Rate)", Field::empty()),
            )
            .with(Element::new(4, ElementKind::Instance, "loose"));

        let (_, report) = plan_amounts(&project, FIELDS);

        assert_eq!(report.updated.len(), 1);
        assert_eq!(
            report.skipped,
            vec![SkippedElement {
                id: ElementId(4),
                reason: "missing category".into(),
            }]
        );
    }
}
