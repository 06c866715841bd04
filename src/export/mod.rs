pub mod csv;
pub mod json;
pub mod report;
pub mod workbook;

pub use crate::error::ExportError;
pub use self::csv::{export_amounts, export_material_list, export_type_comments};
pub use json::export_json;
pub use workbook::{build_workbook, write_workbook, write_xlsx, Workbook};

use std::fs::File;
use std::path::Path;

pub(crate) fn create_file(path: &Path) -> Result<File, ExportError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|source| ExportError::FileCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    File::create(path).map_err(|source| ExportError::FileCreate {
        path: path.to_path_buf(),
        source,
    })
}
