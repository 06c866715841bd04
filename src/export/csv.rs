use crate::error::ExportError;
use crate::estimate::{AmountReport, MaterialList, TypeComment};
use crate::parser::comments::{COMMENTS_HEADER, TYPE_HEADER};
use std::fs::File;
use std::io::Write;
use std::path::Path;

fn writer(path: &Path) -> Result<csv::Writer<File>, ExportError> {
    let file = super::create_file(path)?;
    Ok(csv::Writer::from_writer(file))
}

fn finish(mut writer: csv::Writer<File>) -> Result<(), ExportError> {
    writer.flush().map_err(|e| ExportError::WriteError {
        message: e.to_string(),
    })
}

/// `Type,Type Comments`, readable back by
/// [`load_type_comments`](crate::parser::load_type_comments).
pub fn export_type_comments<P: AsRef<Path>>(
    rows: &[TypeComment],
    path: P,
) -> Result<(), ExportError> {
    let mut writer = writer(path.as_ref())?;

    writer.write_record([TYPE_HEADER, COMMENTS_HEADER])?;
    for row in rows {
        writer.write_record([&row.type_name, &row.comment])?;
    }

    finish(writer)
}

/// Grouped material list: a type name line, then a
/// `Material,UoM,Total Quantity,Unit Cost,Total Cost` block, then a blank
/// line. Unpriced materials show `missing` as their unit cost.
pub fn export_material_list<P: AsRef<Path>>(
    list: &MaterialList,
    path: P,
) -> Result<(), ExportError> {
    let write_error = |e: std::io::Error| ExportError::WriteError {
        message: e.to_string(),
    };
    let mut file = super::create_file(path.as_ref())?;

    for group in &list.types {
        // A csv writer always quotes an empty record, so each block gets its
        // own writer and the blank line goes straight to the file.
        let mut writer = csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(&mut file);
        writer.write_record([&group.type_name])?;
        writer.write_record(["Material", "UoM", "Total Quantity", "Unit Cost", "Total Cost"])?;
        for usage in &group.materials {
            writer.write_record([
                usage.component.clone(),
                usage.uom.clone(),
                format!("{:.3}", usage.total_quantity),
                usage
                    .unit_cost
                    .map_or_else(|| "missing".to_string(), |c| format!("{c:.2}")),
                format!("{:.2}", usage.total_cost),
            ])?;
        }
        writer.flush().map_err(write_error)?;
        drop(writer);
        file.write_all(b"\n").map_err(write_error)?;
    }

    Ok(())
}

/// One row per element: updated rows with their amount, skipped rows with
/// the reason.
pub fn export_amounts<P: AsRef<Path>>(report: &AmountReport, path: P) -> Result<(), ExportError> {
    let mut writer = writer(path.as_ref())?;

    writer.write_record(["Element", "Quantity", "Unit", "Rate", "Amount", "Skipped"])?;
    for line in &report.updated {
        writer.write_record([
            line.id.to_string(),
            format!("{:.3}", line.quantity.value),
            line.quantity.unit().to_string(),
            format!("{:.2}", line.rate),
            format!("{:.2}", line.amount),
            String::new(),
        ])?;
    }
    for skip in &report.skipped {
        writer.write_record([
            skip.id.to_string(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            skip.reason.clone(),
        ])?;
    }

    finish(writer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::estimate::materials::{MaterialUsage, TypeMaterials};
    use crate::estimate::MeasureMethod;
    use pretty_assertions::assert_eq;

    #[test]
    fn type_comments_read_back() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("comments.csv");
        let rows = vec![
            TypeComment {
                type_name: "Door 900".into(),
                comment: "Flush door, hardwood frame".into(),
            },
            TypeComment {
                type_name: "Basic Wall".into(),
                comment: String::new(),
            },
        ];

        export_type_comments(&rows, &path).unwrap();
        let map = crate::parser::load_type_comments(&path).unwrap();

        assert_eq!(map["Door 900"], "Flush door, hardwood frame");
        assert_eq!(map["Basic Wall"], "");
    }

    #[test]
    fn material_list_layout() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("materials.csv");
        let list = MaterialList {
            types: vec![TypeMaterials {
                type_name: "Block Wall 200".into(),
                method: MeasureMethod::Area,
                quantity: 10.0,
                materials: vec![
                    MaterialUsage {
                        component: "Blocks".into(),
                        uom: String::new(),
                        total_quantity: 125.0,
                        unit_cost: None,
                        total_cost: 0.0,
                    },
                    MaterialUsage {
                        component: "Cement".into(),
                        uom: "bag".into(),
                        total_quantity: 5.0,
                        unit_cost: Some(200.0),
                        total_cost: 1000.0,
                    },
                ],
            }],
            ..MaterialList::default()
        };

        export_material_list(&list, &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();

        assert_eq!(
            text.lines().collect::<Vec<_>>(),
            vec![
                "Block Wall 200",
                "Material,UoM,Total Quantity,Unit Cost,Total Cost",
                "Blocks,,125.000,missing,0.00",
                "Cement,bag,5.000,200.00,1000.00",
                "",
            ]
        );
        assert!(text.ends_with("1000.00\n\n"));
    }
}
