use crate::error::LoadError;
use crate::model::{KeyNormalization, MarkupBucket, RecipeBook, RecipeSchema, RejectedRow, RowEffect};
use csv::StringRecord;
use std::io::Read;
use std::path::Path;

use super::read_clean;

const TYPE_COLUMN: &str = "Type";
const COMPONENT_COLUMN: &str = "Component";
const QUANTITY_COLUMN: &str = "Quantity";
const TIME_COLUMN: &str = "Time/Distance";
const RATE_COLUMN: &str = "Rate";

impl RecipeSchema {
    /// Newest schema whose percent column is present wins.
    #[must_use]
    pub fn detect(headers: &StringRecord) -> Self {
        let has = |name: &str| headers.iter().any(|h| h == name);
        [Self::V4, Self::V3, Self::V2]
            .into_iter()
            .find(|schema| schema.percent_column().is_some_and(has))
            .unwrap_or(Self::V1)
    }

    #[must_use]
    pub fn percent_column(self) -> Option<&'static str> {
        match self {
            Self::V1 => None,
            Self::V2 => Some("Labour"),
            Self::V3 => Some("Labour/Transport"),
            Self::V4 => Some("Labour/Transport/Wastage/Profit"),
        }
    }

    #[must_use]
    pub fn fixed_column(self) -> Option<&'static str> {
        match self {
            Self::V1 => None,
            Self::V2 => Some("Labour_Fixed"),
            Self::V3 => Some("Labour/Transport_Fixed"),
            Self::V4 => Some("Labour/Transport/Plant_Fixed"),
        }
    }

    #[must_use]
    pub fn has_time_rate(self) -> bool {
        self != Self::V1
    }

    /// Bucket for a percent row. Each schema only knows the buckets its
    /// column name promises.
    #[must_use]
    pub fn percent_bucket(self, component: &str) -> MarkupBucket {
        let name = component.to_lowercase();
        match self {
            Self::V1 | Self::V2 => MarkupBucket::Labour,
            Self::V3 => {
                if name.starts_with("transport") {
                    MarkupBucket::Transport
                } else {
                    MarkupBucket::Labour
                }
            }
            Self::V4 => {
                if name.contains("wastage") || name.contains("shrinkage") {
                    MarkupBucket::Wastage
                } else if name.contains("profit") || name.contains("overhead") {
                    MarkupBucket::Overhead
                } else if name.starts_with("transport") {
                    MarkupBucket::Transport
                } else if name.contains("plant") {
                    MarkupBucket::Plant
                } else {
                    MarkupBucket::Labour
                }
            }
        }
    }

    /// Bucket for a fixed or time/distance row.
    #[must_use]
    pub fn additive_bucket(self, component: &str) -> MarkupBucket {
        let name = component.to_lowercase();
        match self {
            Self::V1 | Self::V2 => MarkupBucket::Labour,
            Self::V3 => {
                if name.starts_with("transport") {
                    MarkupBucket::Transport
                } else {
                    MarkupBucket::Labour
                }
            }
            Self::V4 => {
                if name.starts_with("transport") {
                    MarkupBucket::Transport
                } else if name.contains("plant") {
                    MarkupBucket::Plant
                } else {
                    MarkupBucket::Labour
                }
            }
        }
    }
}

/// Loads a recipe CSV, detecting its schema from the header.
///
/// # Errors
///
/// Returns [`LoadError::FileNotFound`] if the file is missing and
/// [`LoadError::MissingColumn`] if `Type`, `Component` or `Quantity` is
/// absent. Bad rows are kept in [`RecipeBook::rejected`] instead.
pub fn load_recipes<P: AsRef<Path>>(
    path: P,
    normalization: KeyNormalization,
) -> Result<RecipeBook, LoadError> {
    let path = path.as_ref();
    let content = read_clean(path)?;
    let book = parse_recipes(content.as_bytes(), path, normalization)?;

    tracing::info!(
        file = %path.display(),
        schema = ?book.schema,
        recipes = book.len(),
        rejected = book.rejected.len(),
        "loaded recipes"
    );
    for rejected in &book.rejected {
        tracing::warn!(row = rejected.row, reason = %rejected.reason, "rejected recipe row");
    }

    Ok(book)
}

struct Columns {
    type_name: usize,
    component: usize,
    quantity: usize,
    percent: Option<usize>,
    fixed: Option<usize>,
    time: Option<usize>,
    rate: Option<usize>,
}

pub fn parse_recipes<R: Read>(
    reader: R,
    path: &Path,
    normalization: KeyNormalization,
) -> Result<RecipeBook, LoadError> {
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

    let schema = RecipeSchema::detect(&headers);
    let position = |name: &str| headers.iter().position(|h| h == name);
    let required = |name: &str| {
        position(name).ok_or_else(|| LoadError::MissingColumn {
            path: path.to_path_buf(),
            column: name.to_string(),
        })
    };

    let columns = Columns {
        type_name: required(TYPE_COLUMN)?,
        component: required(COMPONENT_COLUMN)?,
        quantity: required(QUANTITY_COLUMN)?,
        percent: schema.percent_column().and_then(position),
        fixed: schema.fixed_column().and_then(position),
        time: schema.has_time_rate().then(|| position(TIME_COLUMN)).flatten(),
        rate: schema.has_time_rate().then(|| position(RATE_COLUMN)).flatten(),
    };

    let mut book = RecipeBook::new(schema, normalization);

    for (index, record) in reader.records().enumerate() {
        let row = index + 1;
        let outcome = record
            .map_err(|e| e.to_string())
            .and_then(|record| classify_row(schema, &columns, &record));

        match outcome {
            Ok((type_name, effect)) => book.entry(&type_name).apply(effect),
            Err(reason) => book.rejected.push(RejectedRow { row, reason }),
        }
    }

    Ok(book)
}

fn classify_row(
    schema: RecipeSchema,
    columns: &Columns,
    record: &StringRecord,
) -> Result<(String, RowEffect), String> {
    let cell = |idx: Option<usize>| {
        idx.and_then(|i| record.get(i))
            .map(str::trim)
            .unwrap_or_default()
    };

    let type_name = cell(Some(columns.type_name));
    if type_name.is_empty() {
        return Err("empty Type".to_string());
    }
    let component = cell(Some(columns.component));
    if component.is_empty() {
        return Err(format!("empty Component for '{type_name}'"));
    }

    let percent = cell(columns.percent);
    let fixed = cell(columns.fixed);
    let time = cell(columns.time);

    let effect = if !percent.is_empty() {
        let fraction = parse_number(percent.trim_end_matches('%'), component)? / 100.0;
        RowEffect::Percent {
            bucket: schema.percent_bucket(component),
            fraction,
        }
    } else if !fixed.is_empty() {
        RowEffect::Fixed {
            bucket: schema.additive_bucket(component),
            amount: parse_number(fixed, component)?,
        }
    } else if !time.is_empty() {
        let rate = cell(columns.rate);
        if rate.is_empty() {
            return Err(format!("'{component}' has Time/Distance but no Rate"));
        }
        RowEffect::TimeRate {
            bucket: schema.additive_bucket(component),
            amount: parse_number(time, component)? * parse_number(rate, component)?,
        }
    } else {
        let quantity = cell(Some(columns.quantity));
        RowEffect::Material {
            component: component.to_string(),
            quantity: if quantity.is_empty() {
                0.0
            } else {
                parse_number(quantity, component)?
            },
        }
    };

    Ok((type_name.to_string(), effect))
}

fn parse_number(raw: &str, component: &str) -> Result<f64, String> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| format!("'{raw}' is not a number for '{component}'"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn parse(csv: &str) -> RecipeBook {
        parse_recipes(csv.as_bytes(), Path::new("recipes.csv"), KeyNormalization::Loose).unwrap()
    }

    fn headers(names: &[&str]) -> StringRecord {
        StringRecord::from(names.to_vec())
    }

    #[test]
    fn detects_schema_from_headers() {
        let base = ["Type", "Component", "Quantity"];
        assert_eq!(RecipeSchema::detect(&headers(&base)), RecipeSchema::V1);
        assert_eq!(
            RecipeSchema::detect(&headers(&[&base[..], &["Labour", "Labour_Fixed"][..]].concat())),
            RecipeSchema::V2
        );
        assert_eq!(
            RecipeSchema::detect(&headers(
                &[&base[..], &["Labour/Transport", "Time/Distance", "Rate"][..]].concat()
            )),
            RecipeSchema::V3
        );
        assert_eq!(
            RecipeSchema::detect(&headers(
                &[&base[..], &["Labour/Transport/Wastage/Profit", "Labour/Transport/Plant_Fixed"][..]]
                    .concat()
            )),
            RecipeSchema::V4
        );
    }

    #[test]
    fn materials_only_schema() {
        let book = parse("Type,Component,Quantity\nBlock Wall,Cement,2\nBlock Wall,Sand,3\nSlab,Concrete,\n");

        assert_eq!(book.schema, RecipeSchema::V1);
        let wall = book.get("block wall").unwrap();
        assert_eq!(wall.materials.len(), 2);
        assert_eq!(book.get("Slab").unwrap().materials[0].quantity, 0.0);
    }

    #[test]
    fn v4_rows_are_classified_once() {
        let csv = "\
Type,Component,Quantity,Labour/Transport/Wastage/Profit,Labour/Transport/Plant_Fixed,Time/Distance,Rate
Wall,Cement,2,,,,
Wall,Sand,3,,,,
Wall,Labour,,15%,,,
Wall,Transport,,5,,,
Wall,Wastage,,2.5,,,
Wall,Shrinkage allowance,,1,,,
Wall,Profit and overhead,,10,,,
Wall,Plant hire,,3,,,
Wall,Mason,,,200,,
Wall,Transport to site,,,50,,
Wall,Plant - mixer,,,75,,
Wall,Helper,,,,8,25
Wall,Transport trip,,,,12,4
Wall,Plant - vibrator,,,,2,30
Wall,Scaffold,1,,,,
";
        let book = parse(csv);
        let wall = book.get("Wall").unwrap();

        let names: Vec<&str> = wall.materials.iter().map(|m| m.component.as_str()).collect();
        assert_eq!(names, vec!["Cement", "Sand", "Scaffold"]);
        assert!((wall.labour_percent - 0.15).abs() < 1e-12);
        assert!((wall.transport_percent - 0.05).abs() < 1e-12);
        // Shrinkage row comes after wastage and replaces it.
        assert!((wall.wastage_percent - 0.01).abs() < 1e-12);
        assert!((wall.overhead_percent - 0.10).abs() < 1e-12);
        assert!((wall.plant_percent - 0.03).abs() < 1e-12);
        assert_eq!(wall.labour_fixed, vec![200.0]);
        assert_eq!(wall.transport_fixed, vec![50.0]);
        assert_eq!(wall.plant_fixed, vec![75.0]);
        assert_eq!(wall.labour_time, vec![200.0]);
        assert_eq!(wall.transport_distance, vec![48.0]);
        assert_eq!(wall.plant_time, vec![60.0]);
        assert!(book.rejected.is_empty());
    }

    #[test]
    fn v3_knows_only_labour_and_transport() {
        let csv = "\
Type,Component,Quantity,Labour/Transport,Labour/Transport_Fixed,Time/Distance,Rate
Floor,Concrete,1,,,,
Floor,Wastage,,5,,,
Floor,Transport,,,100,,
Floor,Plant hire,,,60,,
";
        let book = parse(csv);
        let floor = book.get("floor").unwrap();

        assert_eq!(book.schema, RecipeSchema::V3);
        assert!((floor.labour_percent - 0.05).abs() < 1e-12);
        assert_eq!(floor.wastage_percent, 0.0);
        assert_eq!(floor.transport_fixed, vec![100.0]);
        assert_eq!(floor.labour_fixed, vec![60.0]);
        assert!(floor.plant_fixed.is_empty());
    }

    #[test]
    fn percent_takes_precedence_over_other_columns() {
        let csv = "\
Type,Component,Quantity,Labour/Transport/Wastage/Profit,Labour/Transport/Plant_Fixed,Time/Distance,Rate
Roof,Labour,4,10,300,5,20
";
        let book = parse(csv);
        let roof = book.get("Roof").unwrap();

        assert!((roof.labour_percent - 0.10).abs() < 1e-12);
        assert!(roof.labour_fixed.is_empty());
        assert!(roof.labour_time.is_empty());
        assert!(roof.materials.is_empty());
    }

    #[test]
    fn bad_rows_are_rejected_with_a_reason() {
        let csv = "\
Type,Component,Quantity,Labour,Labour_Fixed,Time/Distance,Rate
Door,Frame,1,,,,
,Leaf,1,,,,
Door,Hinges,two,,,,
Door,Fitter,,,,3,
";
        let book = parse(csv);

        assert_eq!(book.schema, RecipeSchema::V2);
        assert_eq!(book.get("Door").unwrap().materials.len(), 1);
        let rows: Vec<usize> = book.rejected.iter().map(|r| r.row).collect();
        assert_eq!(rows, vec![2, 3, 4]);
        assert!(book.rejected[2].reason.contains("no Rate"));
    }

    #[test]
    fn missing_required_column() {
        let err = parse_recipes(
            "Type,Item,Quantity\nA,B,1\n".as_bytes(),
            Path::new("r.csv"),
            KeyNormalization::Loose,
        )
        .unwrap_err();

        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "Component"));
    }
}
