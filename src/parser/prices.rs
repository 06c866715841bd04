use crate::error::LoadError;
use crate::model::{KeyNormalization, PriceColumn, PriceEntry, PriceSource, UnitPriceTable};
use std::io::Read;
use std::path::{Path, PathBuf};

use super::read_clean;

const ITEM_COLUMN: &str = "Item";
const UOM_COLUMN: &str = "UoM";
const FLAT_COLUMN: &str = "UnitCost";

/// Expands price sources: a directory stands for every `.csv` file in it,
/// sorted by name so last-write-wins is deterministic.
pub fn price_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<PathBuf>, LoadError> {
    let mut files = Vec::new();
    for path in paths {
        let path = path.as_ref();
        if path.is_dir() {
            let entries = std::fs::read_dir(path).map_err(|source| LoadError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;
            let mut csvs: Vec<PathBuf> = entries
                .filter_map(Result::ok)
                .map(|entry| entry.path())
                .filter(|p| {
                    p.extension()
                        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
                })
                .collect();
            csvs.sort();
            files.extend(csvs);
        } else if path.exists() {
            files.push(path.to_path_buf());
        } else {
            return Err(LoadError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }
    Ok(files)
}

/// Loads unit prices for `column` from every source, in order. A later
/// source overrides an earlier one for the same item.
///
/// # Errors
///
/// Returns [`LoadError::FileNotFound`] for a missing source and
/// [`LoadError::MissingColumn`] for a file without an `Item` column.
pub fn load_price_table<P: AsRef<Path>>(
    paths: &[P],
    column: &PriceColumn,
    normalization: KeyNormalization,
) -> Result<UnitPriceTable, LoadError> {
    let mut table = UnitPriceTable::new(column.clone(), normalization);

    for path in price_sources(paths)? {
        let content = read_clean(&path)?;
        let count = parse_prices(content.as_bytes(), &path, &mut table)?;
        tracing::info!(file = %path.display(), items = count, column = %column, "loaded unit prices");
        table.sources.push(path);
    }

    Ok(table)
}

/// Reads one price CSV into `table`. Returns how many items got a price.
pub fn parse_prices<R: Read>(
    reader: R,
    path: &Path,
    table: &mut UnitPriceTable,
) -> Result<usize, LoadError> {
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

    let position = |name: &str| headers.iter().position(|h| h == name);

    let item_idx = position(ITEM_COLUMN).ok_or_else(|| LoadError::MissingColumn {
        path: path.to_path_buf(),
        column: ITEM_COLUMN.to_string(),
    })?;
    let uom_idx = position(UOM_COLUMN);

    let regional_idx = position(&table.column.regional_header());
    let national_idx = position(&table.column.national_header());
    let flat_idx = position(FLAT_COLUMN);

    if regional_idx.is_none() && national_idx.is_none() && flat_idx.is_none() {
        tracing::warn!(
            file = %path.display(),
            column = %table.column.regional_header(),
            "no usable price column"
        );
    }

    let national_source = if table.column.is_national() {
        PriceSource::Regional
    } else {
        PriceSource::NationalFallback
    };

    let mut count = 0;
    for (row_number, record) in reader.records().enumerate() {
        let record = match record {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(file = %path.display(), row = row_number + 1, error = %e, "unreadable price row");
                continue;
            }
        };

        let item = record.get(item_idx).unwrap_or_default().trim();
        if item.is_empty() {
            continue;
        }

        let cell = |idx: Option<usize>| idx.and_then(|i| record.get(i)).and_then(parse_cost);

        let resolved = cell(regional_idx)
            .map(|p| (p, PriceSource::Regional))
            .or_else(|| cell(national_idx).map(|p| (p, national_source)))
            .or_else(|| cell(flat_idx).map(|p| (p, PriceSource::Flat)));

        let Some((price, source)) = resolved else {
            tracing::debug!(item, "no valid price in selected columns");
            continue;
        };

        let uom = uom_idx
            .and_then(|i| record.get(i))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        table.insert(PriceEntry {
            item: item.to_string(),
            price,
            source,
            uom,
        });
        count += 1;
    }

    Ok(count)
}

/// A valid unit cost is a positive finite number. Thousands separators are
/// tolerated.
fn parse_cost(raw: &str) -> Option<f64> {
    let cleaned: String = raw.trim().chars().filter(|c| *c != ',').collect();
    cleaned
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite() && *v > 0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{PriceLookup, Tier};
    use pretty_assertions::assert_eq;

    const PRICES: &str = "\
Item,UoM,Central_Avg_UnitCost,National_Avg_UnitCost,Lusaka_Avg_UnitCost
Cement,bag,120,115,130
Sand,m3,,450,
Stone,m3,0,600,610
Rebar Y12,kg,\"1,250.50\",1200,
Paint,l,abc,,
,ea,5,5,5
";

    fn table(region: &str) -> UnitPriceTable {
        let mut table = UnitPriceTable::new(
            PriceColumn::new(region, Tier::Avg),
            KeyNormalization::Loose,
        );
        parse_prices(PRICES.as_bytes(), Path::new("prices.csv"), &mut table).unwrap();
        table
    }

    #[test]
    fn regional_column_wins_when_valid() {
        let table = table("Central");
        let cement = table.lookup("cement").unwrap();
        assert_eq!(cement.price, 120.0);
        assert_eq!(cement.source, PriceSource::Regional);
        assert_eq!(cement.uom.as_deref(), Some("bag"));
    }

    #[test]
    fn blank_or_non_positive_regional_falls_back_to_national() {
        let table = table("Central");
        let sand = table.lookup("Sand").unwrap();
        assert_eq!((sand.price, sand.source), (450.0, PriceSource::NationalFallback));

        let stone = table.lookup("Stone").unwrap();
        assert_eq!((stone.price, stone.source), (600.0, PriceSource::NationalFallback));
    }

    #[test]
    fn items_without_any_valid_price_are_missing() {
        let table = table("Central");
        assert!(table.lookup("Paint").is_none());
        assert_eq!(table.len(), 4);
    }

    #[test]
    fn thousands_separators_are_accepted() {
        let table = table("Central");
        assert_eq!(table.lookup("rebar y12").map(|e| e.price), Some(1250.5));
    }

    #[test]
    fn national_region_is_never_a_fallback() {
        let table = table("National");
        assert_eq!(
            table.lookup("Cement").map(|e| (e.price, e.source)),
            Some((115.0, PriceSource::Regional))
        );
    }

    #[test]
    fn region_without_column_uses_national() {
        let table = table("Western");
        assert_eq!(
            table.lookup("Cement").map(|e| e.source),
            Some(PriceSource::NationalFallback)
        );
    }

    #[test]
    fn legacy_flat_column() {
        let csv = "Item,UnitCost\nTiles,85\n";
        let mut table =
            UnitPriceTable::new(PriceColumn::new("Central", Tier::Min), KeyNormalization::Loose);
        parse_prices(csv.as_bytes(), Path::new("flat.csv"), &mut table).unwrap();

        assert_eq!(
            table.lookup("tiles").map(|e| (e.price, e.source)),
            Some((85.0, PriceSource::Flat))
        );
    }

    #[test]
    fn missing_item_column_is_an_error() {
        let csv = "Name,Central_Avg_UnitCost\nCement,1\n";
        let mut table =
            UnitPriceTable::new(PriceColumn::new("Central", Tier::Avg), KeyNormalization::Loose);

        let err = parse_prices(csv.as_bytes(), Path::new("bad.csv"), &mut table).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { ref column, .. } if column == "Item"));
    }

    #[test]
    fn missing_file_is_reported_before_reading() {
        let err = load_price_table(
            &[Path::new("/definitely/not/here.csv")],
            &PriceColumn::new("Central", Tier::Avg),
            KeyNormalization::Loose,
        )
        .unwrap_err();
        assert!(matches!(err, LoadError::FileNotFound { .. }));
    }

    #[test]
    fn directory_loads_sorted_and_later_files_win() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("b_update.csv"),
            "Item,Central_Avg_UnitCost\nCement,12\nSand,abc\nStone,0\n",
        )
        .unwrap();
        std::fs::write(
            dir.path().join("a_base.csv"),
            "Item,Central_Avg_UnitCost\nCement,10\nSand,4\nStone,6\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not prices").unwrap();

        let table = load_price_table(
            &[dir.path()],
            &PriceColumn::new("Central", Tier::Avg),
            KeyNormalization::Loose,
        )
        .unwrap();

        assert_eq!(
            table.sources,
            vec![dir.path().join("a_base.csv"), dir.path().join("b_update.csv")]
        );
        assert_eq!(table.lookup("Cement").map(|e| e.price), Some(12.0));
        // Invalid prices in the later file leave the earlier ones alone.
        assert_eq!(table.lookup("Sand").map(|e| e.price), Some(4.0));
        assert_eq!(table.lookup("Stone").map(|e| e.price), Some(6.0));
    }
}
