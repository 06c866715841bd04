//! Spreadsheet rendering of a bill of quantities.
//!
//! Every computed cell carries both the formula and the value it evaluates
//! to. The `.xlsx` file keeps the formulas live with the value cached; the
//! per-sheet CSVs carry the values only.

use crate::error::ExportError;
use crate::estimate::boq::{BillOfQuantities, BillSheet, BoqSection};
use rust_xlsxwriter::{Format, Formula};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const COVER_SHEET: &str = "Cover";
pub const SUMMARY_SHEET: &str = "Summary";
pub const XLSX_FILE: &str = "boq.xlsx";

// Item, description, unit, qty, rate, amount
const COLUMN_WIDTHS: [f64; 6] = [8.0, 60.0, 8.0, 12.0, 14.0, 16.0];

const VAT_LINE: &str = "Add VAT OR TOT, whichever is applicable";
const DISCOUNT_LINE: &str = "Discount on the above total, as a percentage. Rates throughout \
    this tender are adjusted by the same percentage.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    Text(String),
    Number(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cell {
    pub value: CellValue,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub formula: Option<String>,
}

impl Cell {
    #[must_use]
    pub fn empty() -> Self {
        Self {
            value: CellValue::Empty,
            formula: None,
        }
    }

    #[must_use]
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            value: CellValue::Text(text.into()),
            formula: None,
        }
    }

    #[must_use]
    pub fn number(value: f64) -> Self {
        Self {
            value: CellValue::Number(value),
            formula: None,
        }
    }

    #[must_use]
    pub fn formula(formula: impl Into<String>, value: f64) -> Self {
        Self {
            value: CellValue::Number(value),
            formula: Some(formula.into()),
        }
    }

    /// The evaluated value as it appears in a CSV cell.
    #[must_use]
    pub fn display(&self) -> String {
        match &self.value {
            CellValue::Empty => String::new(),
            CellValue::Text(t) => t.clone(),
            CellValue::Number(n) => format!("{n:.2}"),
        }
    }

    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self.value {
            CellValue::Number(n) => Some(n),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Sheet {
    pub name: String,
    pub rows: Vec<Vec<Cell>>,
}

impl Sheet {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            rows: Vec::new(),
        }
    }

    /// Appends a row and returns its 1-based spreadsheet row number.
    pub fn push(&mut self, cells: Vec<Cell>) -> usize {
        self.rows.push(cells);
        self.rows.len()
    }

    pub fn blank(&mut self) -> usize {
        self.push(Vec::new())
    }

    /// Cell at a 1-based row and 0-based column.
    #[must_use]
    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.rows.get(row.checked_sub(1)?)?.get(col)
    }

    /// `'Sheet name'!F12`
    #[must_use]
    pub fn reference(&self, address: &str) -> String {
        format!("'{}'!{address}", self.name.replace('\'', "''"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Workbook {
    pub sheets: Vec<Sheet>,
}

impl Workbook {
    #[must_use]
    pub fn sheet(&self, name: &str) -> Option<&Sheet> {
        self.sheets.iter().find(|s| s.name == name)
    }
}

/// Lays a bill of quantities out as Cover, Bill 1-3 and Summary sheets.
#[must_use]
pub fn build_workbook(boq: &BillOfQuantities, currency: &str) -> Workbook {
    let title = format!(
        "BILL OF QUANTITIES (BOQ) FOR THE CONSTRUCTION OF {}",
        boq.title.to_uppercase()
    );

    let mut sheets = vec![cover_sheet(boq, &title)];
    let mut bill_totals = Vec::with_capacity(boq.bills.len());
    for bill in &boq.bills {
        let (sheet, total_row) = bill_sheet(bill, &title, currency);
        bill_totals.push((sheet.reference(&format!("F{total_row}")), bill));
        sheets.push(sheet);
    }
    sheets.push(summary_sheet(boq, &bill_totals, currency));

    Workbook { sheets }
}

fn cover_sheet(boq: &BillOfQuantities, title: &str) -> Sheet {
    let mut sheet = Sheet::new(COVER_SHEET);
    let centred = |text: &str| vec![Cell::empty(), Cell::text(text)];

    sheet.push(centred("BILL OF QUANTITIES"));
    sheet.blank();
    sheet.push(centred("FOR THE"));
    sheet.blank();
    sheet.push(centred(title));
    if let Some(address) = &boq.address {
        sheet.blank();
        sheet.push(centred(&format!("AT {}", address.to_uppercase())));
    }
    sheet
}

/// Returns the sheet and the row holding its grand total.
fn bill_sheet(bill: &BillSheet, title: &str, currency: &str) -> (Sheet, usize) {
    let mut sheet = Sheet::new(bill.bill.sheet_name());
    sheet.push(vec![Cell::text(title)]);
    sheet.push(
        [
            "ITEM".to_string(),
            "DESCRIPTION".to_string(),
            "UNIT".to_string(),
            "QTY".to_string(),
            format!("RATE ({currency})"),
            format!("AMOUNT ({currency})"),
        ]
        .into_iter()
        .map(Cell::text)
        .collect(),
    );

    let mut collection = Vec::with_capacity(bill.sections.len());
    for (number, section) in bill.sections.iter().enumerate() {
        let subtotal_row = write_section(&mut sheet, number + 1, section);
        collection.push((section, subtotal_row));
    }

    sheet.push(vec![Cell::empty(), Cell::text("COLLECTION")]);
    for (number, (section, subtotal_row)) in collection.iter().enumerate() {
        sheet.push(vec![
            Cell::text((number + 1).to_string()),
            Cell::text(section.name.to_uppercase()),
            Cell::empty(),
            Cell::empty(),
            Cell::empty(),
            Cell::formula(format!("=F{subtotal_row}"), section.total()),
        ]);
    }

    let grand_total = if collection.is_empty() {
        Cell::number(0.0)
    } else {
        let cells: Vec<String> = collection.iter().map(|(_, r)| format!("F{r}")).collect();
        Cell::formula(format!("=SUM({})", cells.join(",")), bill.total())
    };
    let total_row = sheet.push(vec![
        Cell::empty(),
        Cell::text("GRAND TOTAL"),
        Cell::empty(),
        Cell::empty(),
        Cell::empty(),
        grand_total,
    ]);

    (sheet, total_row)
}

/// Writes one section block and returns its subtotal row.
fn write_section(sheet: &mut Sheet, number: usize, section: &BoqSection) -> usize {
    sheet.push(vec![
        Cell::text(number.to_string()),
        Cell::text(section.name.to_uppercase()),
    ]);
    if !section.preamble.is_empty() {
        sheet.push(vec![Cell::empty(), Cell::text(section.preamble)]);
    }

    let first = sheet.rows.len() + 1;
    for (index, item) in section.items.iter().enumerate() {
        let row = sheet.rows.len() + 1;
        sheet.push(vec![
            Cell::text(item_label(index)),
            Cell::text(item.name.clone()),
            Cell::text(item.unit),
            Cell::number(item.quantity),
            Cell::number(item.rate),
            Cell::formula(format!("=D{row}*E{row}"), item.amount),
        ]);
        if !item.description.is_empty() {
            sheet.push(vec![Cell::empty(), Cell::text(item.description.clone())]);
        }
    }
    let last = sheet.rows.len();

    let subtotal_row = sheet.push(vec![
        Cell::empty(),
        Cell::text(format!("{} TO COLLECTION", section.name.to_uppercase())),
        Cell::empty(),
        Cell::empty(),
        Cell::empty(),
        Cell::formula(format!("=SUM(F{first}:F{last})"), section.total()),
    ]);
    sheet.blank();
    subtotal_row
}

fn summary_sheet(
    boq: &BillOfQuantities,
    bill_totals: &[(String, &BillSheet)],
    currency: &str,
) -> Sheet {
    let summary = &boq.summary;
    let mut sheet = Sheet::new(SUMMARY_SHEET);
    let line = |label: &str, cell: Cell| {
        vec![Cell::empty(), Cell::text(label), Cell::text(currency), cell]
    };

    sheet.push(vec![Cell::empty(), Cell::text("GENERAL SUMMARY")]);
    sheet.push(vec![
        Cell::text("ITEM"),
        Cell::text("DESCRIPTION"),
        Cell::empty(),
        Cell::text(format!("AMOUNT ({currency})")),
    ]);
    sheet.push(vec![Cell::empty(), Cell::text(boq.title.to_uppercase())]);
    sheet.blank();

    for (reference, bill) in bill_totals {
        sheet.push(line(
            &bill.bill.to_string(),
            Cell::formula(format!("={reference}"), bill.total()),
        ));
    }

    let refs: Vec<&str> = bill_totals.iter().map(|(r, _)| r.as_str()).collect();
    let sub1_formula = if refs.is_empty() {
        "=0".to_string()
    } else {
        format!("=SUM({})", refs.join(","))
    };
    let sub1 = sheet.push(line(
        "Sub total 1",
        Cell::formula(sub1_formula, summary.sub_total_1),
    ));
    sheet.blank();

    let discount = sheet.push(vec![
        Cell::empty(),
        Cell::text(DISCOUNT_LINE),
        Cell::number(summary.discount),
    ]);
    let sub2 = sheet.push(line(
        "Sub total 2",
        Cell::formula(format!("=D{sub1}*(1-C{discount})"), summary.sub_total_2),
    ));
    let contingency = sheet.push(vec![
        Cell::empty(),
        Cell::text(format!(
            "Allow for contingencies @ {}%",
            percent(summary.contingency_rate)
        )),
        Cell::empty(),
        Cell::formula(
            format!("=D{sub2}*{}", summary.contingency_rate),
            summary.contingency,
        ),
    ]);
    let sub3 = sheet.push(line(
        "Sub total 3",
        Cell::formula(format!("=D{sub2}+D{contingency}"), summary.sub_total_3),
    ));
    sheet.push(vec![
        Cell::empty(),
        Cell::text(VAT_LINE),
        Cell::empty(),
        Cell::text("Inclusive"),
    ]);
    sheet.push(line(
        "GRAND TOTAL CARRIED TO FORM OF TENDER",
        Cell::formula(format!("=D{sub3}"), summary.grand_total),
    ));

    sheet
}

fn item_label(index: usize) -> String {
    u8::try_from(index)
        .ok()
        .filter(|i| *i < 26)
        .map_or_else(|| (index + 1).to_string(), |i| char::from(b'A' + i).to_string())
}

fn percent(rate: f64) -> String {
    let pct = rate * 100.0;
    if (pct - pct.round()).abs() < 1e-9 {
        format!("{pct:.0}")
    } else {
        format!("{pct}")
    }
}

/// Saves the workbook as a single `.xlsx` file with live formulas.
pub fn write_xlsx<P: AsRef<Path>>(workbook: &Workbook, path: P) -> Result<(), ExportError> {
    let path = path.as_ref();
    let mut book = rust_xlsxwriter::Workbook::new();
    let heading = Format::new().set_bold();
    let money = Format::new().set_num_format("#,##0.00");

    for sheet in &workbook.sheets {
        let worksheet = book.add_worksheet();
        worksheet.set_name(&sheet.name)?;
        for (col, width) in (0u16..).zip(COLUMN_WIDTHS) {
            worksheet.set_column_width(col, width)?;
        }

        for (row, cells) in (0u32..).zip(&sheet.rows) {
            let is_heading = row == 0;
            for (col, cell) in (0u16..).zip(cells) {
                match (&cell.value, &cell.formula) {
                    (CellValue::Empty, _) => {}
                    (CellValue::Number(n), Some(formula)) => {
                        let formula = Formula::new(formula).set_result(n.to_string());
                        worksheet.write_formula_with_format(row, col, formula, &money)?;
                    }
                    (CellValue::Number(n), None) => {
                        worksheet.write_number_with_format(row, col, *n, &money)?;
                    }
                    (CellValue::Text(text), _) if is_heading => {
                        worksheet.write_string_with_format(row, col, text, &heading)?;
                    }
                    (CellValue::Text(text), _) => {
                        worksheet.write_string(row, col, text)?;
                    }
                }
            }
        }
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ExportError::FileCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    book.save(path)?;
    Ok(())
}

/// Writes the `.xlsx` workbook, one CSV per sheet and `workbook.json` into
/// `dir`. Returns the files written.
pub fn write_workbook<P: AsRef<Path>>(
    workbook: &Workbook,
    dir: P,
) -> Result<Vec<PathBuf>, ExportError> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir).map_err(|source| ExportError::FileCreate {
        path: dir.to_path_buf(),
        source,
    })?;

    let xlsx_path = dir.join(XLSX_FILE);
    write_xlsx(workbook, &xlsx_path)?;
    let mut written = Vec::with_capacity(workbook.sheets.len() + 2);
    written.push(xlsx_path);

    for sheet in &workbook.sheets {
        let path = dir.join(format!("{}.csv", sheet.name.replace(' ', "_")));
        let mut writer = ::csv::WriterBuilder::new()
            .flexible(true)
            .from_writer(super::create_file(&path)?);
        for row in &sheet.rows {
            if row.is_empty() {
                writer.write_record([""])?;
            } else {
                writer.write_record(row.iter().map(Cell::display))?;
            }
        }
        writer.flush().map_err(|e| ExportError::WriteError {
            message: e.to_string(),
        })?;
        written.push(path);
    }

    let json_path = dir.join("workbook.json");
    super::json::export_json(workbook, &json_path)?;
    written.push(json_path);

    tracing::info!(dir = %dir.display(), files = written.len(), "wrote workbook");
    Ok(written)
}
