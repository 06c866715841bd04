//! Type-name housekeeping: which model types the recipe book prices, which
//! are named slightly off, and where a type's instances are.

use crate::error::HostError;
use crate::host::{ChangeSet, HostModel};
use crate::model::{Category, ElementId, ElementKind, KeyNormalization, RecipeBook};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum NameIssue {
    /// No recipe under this name or any spelling of it.
    NoRecipe,
    /// A recipe exists, but its name is spelled differently.
    Mismatch { recipe: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeIssue {
    pub id: ElementId,
    pub name: String,
    pub category: Category,
    pub issue: NameIssue,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TypeCheck {
    /// Types in rated categories that were looked at.
    pub checked: usize,
    /// Sorted by category, then name.
    pub issues: Vec<TypeIssue>,
}

impl TypeCheck {
    pub fn without_recipe(&self) -> impl Iterator<Item = &TypeIssue> {
        self.issues.iter().filter(|i| i.issue == NameIssue::NoRecipe)
    }

    pub fn mismatched(&self) -> impl Iterator<Item = (&TypeIssue, &str)> {
        self.issues.iter().filter_map(|i| match &i.issue {
            NameIssue::Mismatch { recipe } => Some((i, recipe.as_str())),
            NameIssue::NoRecipe => None,
        })
    }
}

/// Collapses runs of whitespace, non-breaking spaces and tabs included.
#[must_use]
pub fn tidy_name(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Checks every type in a rated category against the recipe book.
///
/// A type is fine when a recipe matches it and carries exactly its name. A
/// recipe found only after tidying whitespace, or under strict matching
/// that ignores case, spaces, hyphens and underscores, is a mismatch.
pub fn check_types<H: HostModel + ?Sized>(host: &H, recipes: &RecipeBook) -> TypeCheck {
    let strict: BTreeMap<String, &str> = recipes
        .recipes()
        .map(|r| (KeyNormalization::Strict.normalize(&r.name), r.name.as_str()))
        .collect();

    let mut check = TypeCheck::default();
    for id in host.element_ids(ElementKind::Type) {
        let Some(category) = host
            .category(id)
            .and_then(|c| Category::from_name(&c))
            .filter(|c| c.is_rated())
        else {
            continue;
        };
        let Some(name) = host.name(id).filter(|n| !n.trim().is_empty()) else {
            continue;
        };
        check.checked += 1;

        let recipe = recipes
            .get(&name)
            .map(|r| r.name.as_str())
            .or_else(|| recipes.get(&tidy_name(&name)).map(|r| r.name.as_str()))
            .or_else(|| {
                strict
                    .get(&KeyNormalization::Strict.normalize(&name))
                    .copied()
            });

        let issue = match recipe {
            Some(recipe) if recipe == name => continue,
            Some(recipe) => NameIssue::Mismatch {
                recipe: recipe.to_string(),
            },
            None => NameIssue::NoRecipe,
        };
        check.issues.push(TypeIssue {
            id,
            name,
            category,
            issue,
        });
    }

    check
        .issues
        .sort_by(|a, b| a.category.cmp(&b.category).then_with(|| a.name.cmp(&b.name)));
    check
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Rename {
    pub id: ElementId,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RenameReport {
    pub renamed: Vec<Rename>,
    /// Renames left out because the target name is already taken in the
    /// category.
    pub conflicts: Vec<Rename>,
    pub committed: usize,
}

/// Stages a rename to the recipe's spelling for every mismatched type.
/// Two types in one category never end up with the same name: the first
/// rename to a free name wins and the rest are reported as conflicts.
pub fn plan_renames<H: HostModel + ?Sized>(
    host: &H,
    check: &TypeCheck,
) -> (ChangeSet, RenameReport) {
    let mut taken: BTreeSet<(Category, String)> = host
        .element_ids(ElementKind::Type)
        .into_iter()
        .filter_map(|id| {
            let category = host.category(id).and_then(|c| Category::from_name(&c))?;
            Some((category, host.name(id)?))
        })
        .collect();

    let mut changes = ChangeSet::new("Rename model types to recipe names");
    let mut report = RenameReport::default();
    for (issue, recipe) in check.mismatched() {
        let rename = Rename {
            id: issue.id,
            from: issue.name.clone(),
            to: recipe.to_string(),
        };
        if taken.insert((issue.category, rename.to.clone())) {
            changes.rename(rename.id, rename.to.as_str());
            report.renamed.push(rename);
        } else {
            report.conflicts.push(rename);
        }
    }

    (changes, report)
}

/// Renames mismatched types to their recipe names in one batch.
///
/// # Errors
///
/// Returns the host's [`HostError`] if it refuses the batch.
pub fn apply_renames<H: HostModel + ?Sized>(
    host: &mut H,
    recipes: &RecipeBook,
) -> Result<RenameReport, HostError> {
    let check = check_types(&*host, recipes);
    let (changes, mut report) = plan_renames(&*host, &check);

    if !changes.is_empty() {
        report.committed = host.commit(changes)?;
    }

    tracing::info!(
        renamed = report.renamed.len(),
        conflicts = report.conflicts.len(),
        "applied type renames"
    );
    Ok(report)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeMatch {
    pub id: ElementId,
    pub name: String,
    pub category: Option<String>,
    pub instances: Vec<ElementId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchResult {
    pub query: String,
    /// Sorted by type name.
    pub types: Vec<TypeMatch>,
}

impl SearchResult {
    #[must_use]
    pub fn instance_count(&self) -> usize {
        self.types.iter().map(|t| t.instances.len()).sum()
    }
}

/// Types whose name contains `query`, ignoring case, with the instances
/// placed from each.
pub fn search_types<H: HostModel + ?Sized>(host: &H, query: &str) -> SearchResult {
    let needle = query.trim().to_lowercase();
    let mut result = SearchResult {
        query: query.trim().to_string(),
        types: Vec::new(),
    };
    if needle.is_empty() {
        return result;
    }

    let mut instances: BTreeMap<ElementId, Vec<ElementId>> = BTreeMap::new();
    for id in host.element_ids(ElementKind::Instance) {
        if let Some(type_id) = host.type_of(id) {
            instances.entry(type_id).or_default().push(id);
        }
    }

    result.types = host
        .element_ids(ElementKind::Type)
        .into_iter()
        .filter_map(|id| {
            let name = host.name(id)?;
            name.to_lowercase().contains(&needle).then(|| TypeMatch {
                id,
                category: host.category(id),
                instances: instances.remove(&id).unwrap_or_default(),
                name,
            })
        })
        .collect();
    result.types.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Element, Field, Project, RecipeSchema};
    use pretty_assertions::assert_eq;

    fn recipes() -> RecipeBook {
        let mut book = RecipeBook::new(RecipeSchema::V2, KeyNormalization::Loose);
        book.entry("Block Wall 200").set_material("Cement", 2.0);
        book.entry("Door D1").set_material("Timber", 1.0);
        book.entry("Slab 150").set_material("Cement", 4.0);
        book
    }

    fn project() -> Project {
        let wall = |id, name: &str| {
            Element::new(id, ElementKind::Type, name)
                .in_category("Walls")
                .with_field("Cost", Field::number(0.0))
        };
        Project::new("Check")
            .with(wall(1, "Block Wall 200"))
            .with(wall(2, "block  wall\u{a0}200"))
            .with(wall(3, "Block-Wall_200"))
            .with(wall(4, "Curtain Wall"))
            .with(Element::new(5, ElementKind::Type, "door d1").in_category("Doors"))
            .with(Element::new(6, ElementKind::Type, "Sofa").in_category("Furniture"))
            .with(Element::new(7, ElementKind::Type, "Slab-150").in_category("Floors"))
            .with(Element::new(10, ElementKind::Instance, "w").in_category("Walls").of_type(1))
            .with(Element::new(11, ElementKind::Instance, "w").in_category("Walls").of_type(1))
            .with(Element::new(12, ElementKind::Instance, "d").in_category("Doors").of_type(5))
    }

    #[test]
    fn flags_missing_recipes_and_misspelt_names() {
        let check = check_types(&project(), &recipes());

        assert_eq!(check.checked, 6);
        assert_eq!(
            check.without_recipe().map(|i| i.name.as_str()).collect::<Vec<_>>(),
            vec!["Curtain Wall"]
        );
        assert_eq!(
            check
                .mismatched()
                .map(|(i, r)| (i.name.as_str(), r))
                .collect::<Vec<_>>(),
            vec![
                ("Block-Wall_200", "Block Wall 200"),
                ("block  wall\u{a0}200", "Block Wall 200"),
                ("Slab-150", "Slab 150"),
                ("door d1", "Door D1"),
            ]
        );
    }

    #[test]
    fn renames_skip_names_already_taken() {
        let mut project = project().with(
            Element::new(8, ElementKind::Type, "Slab 150").in_category("Walls"),
        );

        let report = apply_renames(&mut project, &recipes()).unwrap();

        let renamed: Vec<(u64, &str)> = report
            .renamed
            .iter()
            .map(|r| (r.id.0, r.to.as_str()))
            .collect();
        assert_eq!(renamed, vec![(7, "Slab 150"), (5, "Door D1")]);
        assert_eq!(
            report.conflicts.iter().map(|r| r.id.0).collect::<Vec<_>>(),
            vec![3, 2]
        );
        assert_eq!(report.committed, 2);
        assert_eq!(project.name(ElementId(5)).as_deref(), Some("Door D1"));
        assert_eq!(project.name(ElementId(3)).as_deref(), Some("Block-Wall_200"));
    }

    #[test]
    fn search_finds_types_by_substring() {
        let result = search_types(&project(), " WALL ");

        assert_eq!(result.query, "WALL");
        let names: Vec<&str> = result.types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["Block Wall 200", "Block-Wall_200", "Curtain Wall", "block  wall\u{a0}200"]
        );
        assert_eq!(result.types[0].instances, vec![ElementId(10), ElementId(11)]);
        assert_eq!(result.instance_count(), 2);
    }

    #[test]
    fn empty_query_matches_nothing() {
        assert!(search_types(&project(), "  ").types.is_empty());
    }
}
