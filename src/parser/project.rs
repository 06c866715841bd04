use crate::error::LoadError;
use crate::model::Project;
use std::path::Path;

use super::read_clean;

/// Loads a project snapshot from JSON.
///
/// # Example
///
/// ```no_run
/// use boq_estimator::parser::load_project;
///
/// let project = load_project("model.json")?;
/// println!("{}: {} types", project.name, project.total_types());
/// # Ok::<(), boq_estimator::error::LoadError>(())
/// ```
pub fn load_project<P: AsRef<Path>>(path: P) -> Result<Project, LoadError> {
    let path = path.as_ref();
    let content = read_clean(path)?;

    let project: Project = serde_json::from_str(&content).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    tracing::info!(
        file = %path.display(),
        name = %project.name,
        elements = project.elements.len(),
        "loaded project"
    );
    Ok(project)
}
