use super::{ChangeSet, FieldAccess, HostModel};
use crate::error::HostError;
use crate::model::{ElementId, ElementKind, FieldValue, PaintedFace, Project};
use std::collections::HashMap;
use std::mem::discriminant;

impl HostModel for Project {
    fn element_ids(&self, kind: ElementKind) -> Vec<ElementId> {
        self.of_kind(kind).map(|e| e.id).collect()
    }

    fn name(&self, id: ElementId) -> Option<String> {
        self.element(id).map(|e| e.name.clone())
    }

    fn category(&self, id: ElementId) -> Option<String> {
        self.element(id)
            .and_then(|e| e.category.clone())
            .filter(|c| !c.trim().is_empty())
    }

    fn type_of(&self, id: ElementId) -> Option<ElementId> {
        self.element(id).and_then(|e| e.type_id)
    }

    fn read_number(&self, id: ElementId, field: &str) -> Option<f64> {
        self.element(id).and_then(|e| e.number(field))
    }

    fn read_text(&self, id: ElementId, field: &str) -> Option<String> {
        self.element(id)
            .and_then(|e| e.text(field))
            .map(str::to_string)
    }

    fn field_access(&self, id: ElementId, field: &str) -> FieldAccess {
        match self.element(id).and_then(|e| e.fields.get(field)) {
            None => FieldAccess::Missing,
            Some(f) if f.read_only => FieldAccess::ReadOnly,
            Some(_) => FieldAccess::Writable,
        }
    }

    fn painted_faces(&self, id: ElementId) -> Vec<PaintedFace> {
        self.element(id).map(|e| e.paint.clone()).unwrap_or_default()
    }

    fn commit(&mut self, changes: ChangeSet) -> Result<usize, HostError> {
        // Validate everything first so a bad write leaves the model untouched.
        // An empty field takes the kind of its first write in the batch.
        let mut staged: HashMap<(ElementId, &str), &FieldValue> = HashMap::new();
        for write in &changes.writes {
            let element = self
                .element(write.id)
                .ok_or(HostError::UnknownElement(write.id))?;
            let field = element
                .fields
                .get(&write.field)
                .ok_or_else(|| HostError::MissingField {
                    id: write.id,
                    field: write.field.clone(),
                })?;
            if field.read_only {
                return Err(HostError::ReadOnlyField {
                    id: write.id,
                    field: write.field.clone(),
                });
            }
            let current = field
                .value
                .as_ref()
                .or_else(|| staged.get(&(write.id, write.field.as_str())).copied());
            if let Some(current) = current {
                if discriminant(current) != discriminant(&write.value) {
                    return Err(HostError::KindMismatch {
                        id: write.id,
                        field: write.field.clone(),
                        expected: match current {
                            FieldValue::Number(_) => "numeric",
                            FieldValue::Text(_) => "text",
                        },
                    });
                }
            }
            staged
                .entry((write.id, write.field.as_str()))
                .or_insert(&write.value);
        }

        for rename in &changes.renames {
            if self.element(rename.id).is_none() {
                return Err(HostError::UnknownElement(rename.id));
            }
        }

        let count = changes.len();
        for rename in changes.renames {
            if let Some(element) = self.element_mut(rename.id) {
                element.name = rename.name;
            }
        }
        for write in changes.writes {
            if let Some(field) = self
                .element_mut(write.id)
                .and_then(|e| e.fields.get_mut(&write.field))
            {
                field.value = Some(write.value);
            }
        }

        tracing::debug!(label = %changes.label, writes = count, "committed change set");
        Ok(count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Field};
    use pretty_assertions::assert_eq;

    fn project() -> Project {
        Project::new("Test")
            .with(
                Element::new(1, ElementKind::Type, "Wall A")
                    .in_category("Walls")
                    .with_field("Cost", Field::number(0.0))
                    .with_field("Type Comments", Field::empty()),
            )
            .with(
                Element::new(2, ElementKind::Type, "Wall B")
                    .in_category("Walls")
                    .with_field("Cost", Field::number(5.0).read_only()),
            )
    }

    #[test]
    fn reports_field_access() {
        let project = project();
        assert_eq!(project.field_access(ElementId(1), "Cost"), FieldAccess::Writable);
        assert_eq!(project.field_access(ElementId(2), "Cost"), FieldAccess::ReadOnly);
        assert_eq!(project.field_access(ElementId(1), "Area"), FieldAccess::Missing);
        assert_eq!(project.field_access(ElementId(9), "Cost"), FieldAccess::Missing);
    }

    #[test]
    fn commit_applies_all_writes() {
        let mut project = project();
        let mut changes = ChangeSet::new("costs");
        changes.set_number(ElementId(1), "Cost", 42.0);
        changes.set_text(ElementId(1), "Type Comments", "Blockwork");

        assert_eq!(project.commit(changes), Ok(2));
        assert_eq!(project.read_number(ElementId(1), "Cost"), Some(42.0));
        assert_eq!(
            project.read_text(ElementId(1), "Type Comments").as_deref(),
            Some("Blockwork")
        );
    }

    #[test]
    fn rejected_commit_changes_nothing() {
        let mut project = project();
        let before = project.clone();
        let mut changes = ChangeSet::new("costs");
        changes.set_number(ElementId(1), "Cost", 42.0);
        changes.set_number(ElementId(2), "Cost", 7.0);

        let result = project.commit(changes);

        assert_eq!(
            result,
            Err(HostError::ReadOnlyField {
                id: ElementId(2),
                field: "Cost".into()
            })
        );
        assert_eq!(project, before);
    }

    #[test]
    fn commit_rejects_kind_mismatch() {
        let mut project = project();
        let mut changes = ChangeSet::new("bad");
        changes.set_text(ElementId(1), "Cost", "cheap");

        assert!(matches!(
            project.commit(changes),
            Err(HostError::KindMismatch { .. })
        ));
    }

    #[test]
    fn empty_field_takes_one_kind_per_batch() {
        let mut project = project();
        let before = project.clone();
        let mut changes = ChangeSet::new("mixed");
        changes.set_text(ElementId(1), "Type Comments", "Blockwork");
        changes.set_number(ElementId(1), "Type Comments", 3.0);

        assert_eq!(
            project.commit(changes),
            Err(HostError::KindMismatch {
                id: ElementId(1),
                field: "Type Comments".into(),
                expected: "text",
            })
        );
        assert_eq!(project, before);
    }

    #[test]
    fn repeated_writes_of_one_kind_are_fine() {
        let mut project = project();
        let mut changes = ChangeSet::new("twice");
        changes.set_text(ElementId(1), "Type Comments", "first");
        changes.set_text(ElementId(1), "Type Comments", "second");

        assert_eq!(project.commit(changes), Ok(2));
        assert_eq!(
            project.read_text(ElementId(1), "Type Comments").as_deref(),
            Some("second")
        );
    }

    #[test]
    fn renames_commit_with_the_batch() {
        let mut project = project();
        let mut changes = ChangeSet::new("rename");
        changes.rename(ElementId(1), "Block Wall 200");
        changes.set_number(ElementId(1), "Cost", 12.0);

        assert_eq!(project.commit(changes), Ok(2));
        assert_eq!(project.name(ElementId(1)).as_deref(), Some("Block Wall 200"));
    }

    #[test]
    fn rename_of_unknown_element_changes_nothing() {
        let mut project = project();
        let before = project.clone();
        let mut changes = ChangeSet::new("rename");
        changes.rename(ElementId(1), "Block Wall 200");
        changes.rename(ElementId(42), "Ghost");

        assert_eq!(project.commit(changes), Err(HostError::UnknownElement(ElementId(42))));
        assert_eq!(project, before);
    }
}
