use super::{Element, ElementId, ElementKind};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A snapshot of a building model: every instance, type and material with
/// its parameters. Serves as the host model outside of a CAD session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "ProjectFile", into = "ProjectFile")]
pub struct Project {
    pub name: String,
    pub address: Option<String>,
    pub elements: BTreeMap<ElementId, Element>,
}

#[derive(Serialize, Deserialize)]
struct ProjectFile {
    #[serde(default)]
    name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    address: Option<String>,
    #[serde(default)]
    elements: Vec<Element>,
}

impl From<ProjectFile> for Project {
    fn from(file: ProjectFile) -> Self {
        let mut project = Project::new(file.name);
        project.address = file.address;
        for element in file.elements {
            project.add(element);
        }
        project
    }
}

impl From<Project> for ProjectFile {
    fn from(project: Project) -> Self {
        Self {
            name: project.name,
            address: project.address,
            elements: project.elements.into_values().collect(),
        }
    }
}

impl Project {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            elements: BTreeMap::new(),
        }
    }

    /// Adds an element, replacing any earlier one with the same id.
    pub fn add(&mut self, element: Element) {
        self.elements.insert(element.id, element);
    }

    #[must_use]
    pub fn with(mut self, element: Element) -> Self {
        self.add(element);
        self
    }

    #[must_use]
    pub fn element(&self, id: ElementId) -> Option<&Element> {
        self.elements.get(&id)
    }

    pub fn element_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.get_mut(&id)
    }

    pub fn of_kind(&self, kind: ElementKind) -> impl Iterator<Item = &Element> {
        self.elements.values().filter(move |e| e.kind == kind)
    }

    #[must_use]
    pub fn total_instances(&self) -> usize {
        self.of_kind(ElementKind::Instance).count()
    }

    #[must_use]
    pub fn total_types(&self) -> usize {
        self.of_kind(ElementKind::Type).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Field;

    #[test]
    fn snapshot_round_trips_through_json() {
        let project = Project::new("Clinic")
            .with(Element::new(1, ElementKind::Type, "Block Wall 200").in_category("Walls"))
            .with(
                Element::new(2, ElementKind::Instance, "Block Wall 200")
                    .in_category("Walls")
                    .of_type(1)
                    .with_field("Area", Field::number(100.0)),
            );

        let json = serde_json::to_string_pretty(&project).unwrap();
        let back: Project = serde_json::from_str(&json).unwrap();

        assert_eq!(back, project);
        assert_eq!(back.total_types(), 1);
        assert_eq!(back.total_instances(), 1);
    }

    #[test]
    fn duplicate_ids_keep_the_last_element() {
        let json = r#"{
            "name": "Dup",
            "elements": [
                { "id": 1, "kind": "type", "name": "First" },
                { "id": 1, "kind": "type", "name": "Second" }
            ]
        }"#;

        let project: Project = serde_json::from_str(json).unwrap();

        assert_eq!(project.elements.len(), 1);
        assert_eq!(project.element(ElementId(1)).map(|e| e.name.as_str()), Some("Second"));
    }
}
