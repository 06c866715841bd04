use crate::error::ExportError;
use serde::Serialize;
use std::io::Write;
use std::path::Path;

/// Writes any report, snapshot or workbook as pretty-printed JSON.
pub fn export_json<T, P>(value: &T, path: P) -> Result<(), ExportError>
where
    T: Serialize + ?Sized,
    P: AsRef<Path>,
{
    let path_ref = path.as_ref();
    let json = serde_json::to_string_pretty(value)?;

    let mut file = super::create_file(path_ref)?;

    file.write_all(json.as_bytes())
        .map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;

    Ok(())
}
