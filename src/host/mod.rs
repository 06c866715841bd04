//! The narrow port between the estimator and whatever owns the building
//! model.
//!
//! Reads are free-standing. Writes are staged in a [`ChangeSet`] and handed
//! to [`HostModel::commit`] once per batch: either every write lands or none
//! does. Per-element problems are found before staging and reported as
//! skips, so a rejected commit means the host itself refused.

mod project;

use crate::error::HostError;
use crate::model::{ElementId, ElementKind, FieldValue, PaintedFace};

/// Whether a named field can take a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldAccess {
    Missing,
    ReadOnly,
    Writable,
}

pub trait HostModel {
    /// Ids of every element of `kind`, in a stable order.
    fn element_ids(&self, kind: ElementKind) -> Vec<ElementId>;

    fn name(&self, id: ElementId) -> Option<String>;

    /// The host's category name, if the element has one.
    fn category(&self, id: ElementId) -> Option<String>;

    fn type_of(&self, id: ElementId) -> Option<ElementId>;

    /// A numeric field's value. `None` when the field is missing or empty.
    fn read_number(&self, id: ElementId, field: &str) -> Option<f64>;

    /// A text field's value. `None` when the field is missing or empty.
    fn read_text(&self, id: ElementId, field: &str) -> Option<String>;

    fn field_access(&self, id: ElementId, field: &str) -> FieldAccess;

    /// Painted faces on an element. Hosts without a paint tool have none.
    fn painted_faces(&self, _id: ElementId) -> Vec<PaintedFace> {
        Vec::new()
    }

    /// Applies every write in `changes`, or none of them.
    fn commit(&mut self, changes: ChangeSet) -> Result<usize, HostError>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingWrite {
    pub id: ElementId,
    pub field: String,
    pub value: FieldValue,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingRename {
    pub id: ElementId,
    pub name: String,
}

/// Writes gathered during one batch, applied by a single commit.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangeSet {
    pub label: String,
    pub writes: Vec<PendingWrite>,
    pub renames: Vec<PendingRename>,
}

impl ChangeSet {
    #[must_use]
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            writes: Vec::new(),
            renames: Vec::new(),
        }
    }

    pub fn set_number(&mut self, id: ElementId, field: &str, value: f64) {
        self.writes.push(PendingWrite {
            id,
            field: field.to_string(),
            value: FieldValue::Number(value),
        });
    }

    pub fn set_text(&mut self, id: ElementId, field: &str, value: impl Into<String>) {
        self.writes.push(PendingWrite {
            id,
            field: field.to_string(),
            value: FieldValue::Text(value.into()),
        });
    }

    pub fn rename(&mut self, id: ElementId, name: impl Into<String>) {
        self.renames.push(PendingRename {
            id,
            name: name.into(),
        });
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.writes.len() + self.renames.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.writes.is_empty() && self.renames.is_empty()
    }
}
