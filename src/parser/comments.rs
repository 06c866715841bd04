use crate::error::LoadError;
use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use super::read_clean;

pub const TYPE_HEADER: &str = "Type";
pub const COMMENTS_HEADER: &str = "Type Comments";

/// Reads a `Type, Type Comments` CSV into a type name → comment map. Rows
/// without a type name are ignored; a repeated type keeps its last comment.
pub fn load_type_comments<P: AsRef<Path>>(path: P) -> Result<BTreeMap<String, String>, LoadError> {
    let path = path.as_ref();
    let content = read_clean(path)?;
    let map = parse_type_comments(content.as_bytes(), path)?;
    tracing::info!(file = %path.display(), types = map.len(), "loaded type comments");
    Ok(map)
}

pub fn parse_type_comments<R: Read>(
    reader: R,
    path: &Path,
) -> Result<BTreeMap<String, String>, LoadError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::Headers)
        .from_reader(reader);

    let headers = reader
        .headers()
        .map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?
        .clone();

    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| LoadError::MissingColumn {
                path: path.to_path_buf(),
                column: name.to_string(),
            })
    };
    let type_idx = column(TYPE_HEADER)?;
    let comment_idx = column(COMMENTS_HEADER)?;

    let mut map = BTreeMap::new();
    for record in reader.records() {
        let record = record.map_err(|source| LoadError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        let type_name = record.get(type_idx).unwrap_or_default().trim();
        if type_name.is_empty() {
            continue;
        }
        let comment = record.get(comment_idx).unwrap_or_default().trim();
        map.insert(type_name.to_string(), comment.to_string());
    }

    Ok(map)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn reads_type_comment_pairs() {
        let csv = "Type,Type Comments\nDoor 900,\"Flush door, hardwood frame\"\n,orphan\nWindow W1,\nDoor 900,Panel door\n";

        let map = parse_type_comments(csv.as_bytes(), Path::new("c.csv")).unwrap();

        assert_eq!(map.len(), 2);
        assert_eq!(map["Door 900"], "Panel door");
        assert_eq!(map["Window W1"], "");
    }

    #[test]
    fn requires_both_columns() {
        let err = parse_type_comments("Type\nA\n".as_bytes(), Path::new("c.csv")).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { .. }));
    }
}
