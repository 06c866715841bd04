//! Type comments: the free-text descriptions BOQ items are printed with.

use crate::error::HostError;
use crate::host::{ChangeSet, FieldAccess, HostModel};
use crate::model::{Category, ElementKind};
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeComment {
    pub type_name: String,
    pub comment: String,
}

/// Lists every type in a described category with its current comment.
pub fn extract_type_comments<H: HostModel + ?Sized>(
    host: &H,
    comments_field: &str,
) -> Vec<TypeComment> {
    let mut rows: Vec<TypeComment> = host
        .element_ids(ElementKind::Type)
        .into_iter()
        .filter(|id| {
            host.category(*id)
                .and_then(|c| Category::from_name(&c))
                .is_some_and(Category::is_described)
        })
        .filter_map(|id| {
            let type_name = host.name(id).filter(|n| !n.trim().is_empty())?;
            Some(TypeComment {
                type_name,
                comment: host.read_text(id, comments_field).unwrap_or_default(),
            })
        })
        .collect();

    rows.sort_by(|a, b| a.type_name.cmp(&b.type_name));
    rows
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommentReport {
    pub updated: usize,
    /// Types named in the input whose comment field is missing or read-only.
    pub skipped: Vec<String>,
}

/// Writes `comments` onto the types they name, in one batch. Types are
/// matched by exact name; types not in the map are left alone.
///
/// # Errors
///
/// Returns [`HostError`] if the host refuses the batch.
pub fn apply_type_comments<H: HostModel + ?Sized>(
    host: &mut H,
    comments: &BTreeMap<String, String>,
    comments_field: &str,
) -> Result<CommentReport, HostError> {
    let mut changes = ChangeSet::new("Update Type Comments");
    let mut report = CommentReport::default();

    for id in host.element_ids(ElementKind::Type) {
        let Some(name) = host.name(id) else { continue };
        let Some(comment) = comments.get(name.trim()) else {
            continue;
        };
        if host.field_access(id, comments_field) == FieldAccess::Writable {
            changes.set_text(id, comments_field, comment.as_str());
        } else {
            report.skipped.push(name);
        }
    }

    if !changes.is_empty() {
        report.updated = host.commit(changes)?;
    }

    tracing::info!(
        updated = report.updated,
        skipped = report.skipped.len(),
        "applied type comments"
    );
    Ok(report)
}

/// Cleans a comment for use as a BOQ description. A leading copy of the
/// type name is stripped; what remains is dropped when it has fewer than
/// three visible characters.
#[must_use]
pub fn clean_description(comment: &str, type_name: &str) -> String {
    let comment = comment.trim();
    let type_name = type_name.trim();

    let after_name = comment
        .get(..type_name.len())
        .filter(|head| !type_name.is_empty() && head.eq_ignore_ascii_case(type_name))
        .map(|_| &comment[type_name.len()..])
        .filter(|tail| !tail.starts_with(char::is_alphanumeric));
    let rest = after_name.map_or(comment, |tail| {
        tail.trim_start_matches(|c: char| c.is_whitespace() || matches!(c, ':' | '-' | ',' | '.'))
    });

    let visible = rest.chars().filter(|c| !c.is_whitespace()).count();
    if visible < 3 {
        return String::new();
    }
    rest.to_string()
}
