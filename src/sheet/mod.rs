//! In-memory workbook model
//!
//! Workbooks are read in full through `calamine`, edited cell by cell, and
//! written back as a whole with `rust_xlsxwriter`:
//! - Open: Excel (.xlsx) → sheets of values and formulas
//! - Save: sheets → Excel (.xlsx), with per-cell number formats; formulas
//!   keep their cached results and dates keep a date format

mod address;

pub use address::{column_index_to_letter, column_letter_to_index, CellAddress};

use crate::error::{RoadsheetError, RoadsheetResult};
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Formula};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

const DATE_FORMAT: &str = "yyyy-mm-dd";
const DATETIME_FORMAT: &str = "yyyy-mm-dd hh:mm:ss";
const DURATION_FORMAT: &str = "[h]:mm:ss";

/// Value held by a single cell; for formula cells, the cached result
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Text(String),
    Number(f64),
    Bool(bool),
    /// Excel serial date
    DateTime(f64),
    /// Elapsed time in days
    Duration(f64),
}

impl CellValue {
    fn from_data(data: &Data) -> Option<Self> {
        match data {
            Data::String(s) => Some(CellValue::Text(s.clone())),
            Data::Float(f) => Some(CellValue::Number(*f)),
            Data::Int(i) => Some(CellValue::Number(*i as f64)),
            Data::Bool(b) => Some(CellValue::Bool(*b)),
            Data::DateTime(dt) if dt.is_duration() => Some(CellValue::Duration(dt.as_f64())),
            Data::DateTime(dt) => Some(CellValue::DateTime(dt.as_f64())),
            Data::DateTimeIso(s) | Data::DurationIso(s) => Some(CellValue::Text(s.clone())),
            Data::Error(e) => Some(CellValue::Text(format!("#{:?}", e))),
            Data::Empty => None,
        }
    }

    /// Text as a reader of the sheet would see it
    pub fn as_text(&self) -> String {
        match self {
            CellValue::Text(s) => s.clone(),
            CellValue::Number(n) | CellValue::DateTime(n) | CellValue::Duration(n) => {
                n.to_string()
            }
            CellValue::Bool(b) => b.to_string().to_uppercase(),
        }
    }

    /// Number format a date or duration needs to stay one when written back
    fn default_num_format(&self) -> Option<&'static str> {
        match self {
            CellValue::DateTime(n) if n.fract() == 0.0 => Some(DATE_FORMAT),
            CellValue::DateTime(_) => Some(DATETIME_FORMAT),
            CellValue::Duration(_) => Some(DURATION_FORMAT),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub value: CellValue,
    pub formula: Option<String>,
    pub num_format: Option<String>,
}

impl Cell {
    fn format(&self) -> Option<Format> {
        self.num_format
            .as_deref()
            .or_else(|| self.value.default_num_format())
            .map(|f| Format::new().set_num_format(f))
    }
}

/// Destination for numeric results; the seam the sheet updater writes through
pub trait CellWriter {
    fn write_number(&mut self, address: &str, value: f64, num_format: &str)
        -> RoadsheetResult<()>;
}

/// One worksheet's cells, ordered row by row
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Worksheet {
    name: String,
    cells: BTreeMap<CellAddress, Cell>,
}

impl Worksheet {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            cells: BTreeMap::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get(&self, address: &CellAddress) -> Option<&Cell> {
        self.cells.get(address)
    }

    /// Cell text at an A1 address; `None` for empty or invalid addresses
    pub fn text(&self, address: &str) -> Option<String> {
        let address: CellAddress = address.parse().ok()?;
        self.cells.get(&address).map(|c| c.value.as_text())
    }

    pub fn set(&mut self, address: CellAddress, value: CellValue) {
        self.cells.insert(
            address,
            Cell {
                value,
                formula: None,
                num_format: None,
            },
        );
    }

    /// Attach a formula to a cell, keeping `cached` as its value when the
    /// cell has none yet
    pub fn set_formula(
        &mut self,
        address: CellAddress,
        formula: impl Into<String>,
        cached: CellValue,
    ) {
        let cell = self.cells.entry(address).or_insert(Cell {
            value: cached,
            formula: None,
            num_format: None,
        });
        cell.formula = Some(formula.into());
    }

    /// One-based numbers of rows holding at least one cell, in sheet order
    pub fn row_numbers(&self) -> Vec<u32> {
        let mut rows: Vec<u32> = self.cells.keys().map(|a| a.row + 1).collect();
        rows.dedup();
        rows
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

impl CellWriter for Worksheet {
    fn write_number(
        &mut self,
        address: &str,
        value: f64,
        num_format: &str,
    ) -> RoadsheetResult<()> {
        if !value.is_finite() {
            return Err(RoadsheetError::Workbook(format!(
                "cannot write non-finite value to {}",
                address
            )));
        }
        let address: CellAddress = address.parse()?;
        self.cells.insert(
            address,
            Cell {
                value: CellValue::Number(value),
                formula: None,
                num_format: Some(num_format.to_string()),
            },
        );
        Ok(())
    }
}

/// An opened workbook file
#[derive(Debug)]
pub struct SheetBook {
    path: PathBuf,
    sheets: Vec<Worksheet>,
}

impl SheetBook {
    /// Read every worksheet of an .xlsx file into memory.
    ///
    /// The underlying reader is dropped before this returns, so the file is
    /// free to be overwritten or moved afterwards.
    pub fn open<P: AsRef<Path>>(path: P) -> RoadsheetResult<Self> {
        let path = path.as_ref().to_path_buf();
        if !path.is_file() {
            return Err(RoadsheetError::Workbook(format!(
                "File '{}' not found",
                path.display()
            )));
        }

        let mut workbook: Xlsx<_> = open_workbook(&path).map_err(|e| {
            RoadsheetError::Workbook(format!("Failed to open '{}': {}", path.display(), e))
        })?;

        let sheet_names = workbook.sheet_names().to_vec();
        let mut sheets = Vec::new();
        for sheet_name in sheet_names {
            let mut sheet = Worksheet::new(sheet_name.clone());

            let range = workbook.worksheet_range(&sheet_name)?;
            if let Some((row0, col0)) = range.start() {
                for (r, c, data) in range.used_cells() {
                    if let Some(value) = CellValue::from_data(data) {
                        sheet.set(
                            CellAddress::new(row0 + r as u32, (col0 as usize + c) as u16),
                            value,
                        );
                    }
                }
            }

            // Formulas sit beside their cached values, which stay the readable text
            if let Ok(formulas) = workbook.worksheet_formula(&sheet_name) {
                if let Some((row0, col0)) = formulas.start() {
                    for (r, c, formula) in formulas.used_cells() {
                        if !formula.is_empty() {
                            sheet.set_formula(
                                CellAddress::new(row0 + r as u32, (col0 as usize + c) as u16),
                                formula.clone(),
                                CellValue::Text(String::new()),
                            );
                        }
                    }
                }
            }

            sheets.push(sheet);
        }

        debug!(path = %path.display(), sheets = sheets.len(), "workbook loaded");
        Ok(Self { path, sheets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn sheet_names(&self) -> Vec<&str> {
        self.sheets.iter().map(|s| s.name()).collect()
    }

    /// Worksheet lookup; names compare case-insensitively like Excel does
    pub fn worksheet(&self, name: &str) -> RoadsheetResult<&Worksheet> {
        self.sheets
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RoadsheetError::WorksheetNotFound(name.to_string()))
    }

    pub fn worksheet_mut(&mut self, name: &str) -> RoadsheetResult<&mut Worksheet> {
        self.sheets
            .iter_mut()
            .find(|s| s.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| RoadsheetError::WorksheetNotFound(name.to_string()))
    }

    /// Write the workbook back to the file it was opened from
    pub fn save(&self) -> RoadsheetResult<()> {
        self.save_as(&self.path)
    }

    pub fn save_as(&self, output_path: &Path) -> RoadsheetResult<()> {
        let mut workbook = rust_xlsxwriter::Workbook::new();

        for sheet in &self.sheets {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(&sheet.name)?;

            for (address, cell) in &sheet.cells {
                let (row, col) = (address.row, address.col);
                let format = cell.format();

                if let Some(formula) = &cell.formula {
                    let formula = Formula::new(formula).set_result(cell.value.as_text());
                    match &format {
                        Some(format) => {
                            worksheet.write_formula_with_format(row, col, formula, format)?;
                        }
                        None => {
                            worksheet.write_formula(row, col, formula)?;
                        }
                    }
                    continue;
                }

                match (&cell.value, &format) {
                    (CellValue::Text(s), _) => {
                        worksheet.write_string(row, col, s)?;
                    }
                    (CellValue::Bool(b), _) => {
                        worksheet.write_boolean(row, col, *b)?;
                    }
                    (
                        CellValue::Number(n) | CellValue::DateTime(n) | CellValue::Duration(n),
                        Some(format),
                    ) => {
                        worksheet.write_number_with_format(row, col, *n, format)?;
                    }
                    (
                        CellValue::Number(n) | CellValue::DateTime(n) | CellValue::Duration(n),
                        None,
                    ) => {
                        worksheet.write_number(row, col, *n)?;
                    }
                }
            }
        }

        workbook.save(output_path).map_err(|e| {
            RoadsheetError::Workbook(format!(
                "Failed to save '{}': {}",
                output_path.display(),
                e
            ))
        })?;

        Ok(())
    }
}
