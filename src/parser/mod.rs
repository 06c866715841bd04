pub mod comments;
pub mod prices;
pub mod project;
pub mod recipes;

pub use crate::error::LoadError;
pub use comments::load_type_comments;
pub use prices::{load_price_table, parse_prices, price_sources};
pub use project::load_project;
pub use recipes::{load_recipes, parse_recipes};

use std::path::Path;

/// Reads a text input, tolerating stray NUL bytes, a UTF-8 BOM and invalid
/// UTF-8 sequences left behind by spreadsheet exports.
pub(crate) fn read_clean(path: &Path) -> Result<String, LoadError> {
    if !path.exists() {
        return Err(LoadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let bytes = std::fs::read(path).map_err(|source| LoadError::FileRead {
        path: path.to_path_buf(),
        source,
    })?;

    let text = String::from_utf8_lossy(&bytes);
    Ok(text
        .trim_start_matches('\u{feff}')
        .chars()
        .filter(|c| *c != '\0')
        .collect())
}
