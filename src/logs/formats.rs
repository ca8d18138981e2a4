//! Concrete log formats

use super::{column_names, FieldValue, LogFormat, LogRecord, TIMESTAMP_FORMAT};
use crate::error::LogExportError;
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Table, TableColumn, Workbook};
use std::fmt::Write as _;
use std::fs::{self, File, OpenOptions};
use std::io::Write as _;
use std::path::Path;

/// Semicolon-delimited text with a single header row
pub struct CsvFormat;

impl LogFormat for CsvFormat {
    fn extension(&self) -> &'static str {
        ".csv"
    }

    fn write(
        &self,
        records: &[LogRecord],
        path: &Path,
        append: bool,
    ) -> Result<(), LogExportError> {
        let columns = column_names(records);
        let has_content = path.is_file() && fs::metadata(path)?.len() > 0;

        let file = if append {
            OpenOptions::new().create(true).append(true).open(path)?
        } else {
            File::create(path)?
        };

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b';')
            .has_headers(false)
            .from_writer(file);

        if !(append && has_content) {
            writer.write_record(&columns)?;
        }
        for record in records {
            let row: Vec<String> = columns
                .iter()
                .map(|c| record.get(c).map(|v| v.to_string()).unwrap_or_default())
                .collect();
            writer.write_record(&row)?;
        }
        writer.flush()?;
        Ok(())
    }
}

/// Pretty-printed JSON array.
///
/// Appending reads the existing array back and rewrites the whole file with
/// the new records in front.
pub struct JsonFormat;

impl LogFormat for JsonFormat {
    fn extension(&self) -> &'static str {
        ".json"
    }

    fn write(
        &self,
        records: &[LogRecord],
        path: &Path,
        append: bool,
    ) -> Result<(), LogExportError> {
        let mut all: Vec<serde_json::Value> = records
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<_, _>>()?;

        if append && path.is_file() {
            let existing = fs::read_to_string(path)?;
            if !existing.trim().is_empty() {
                match serde_json::from_str::<serde_json::Value>(&existing)? {
                    serde_json::Value::Array(items) => all.extend(items),
                    other => all.push(other),
                }
            }
        }

        fs::write(path, serde_json::to_string_pretty(&all)?)?;
        Ok(())
    }
}

/// Human-readable `name : value` blocks separated by a blank line
pub struct TextFormat;

impl LogFormat for TextFormat {
    fn extension(&self) -> &'static str {
        ".txt"
    }

    fn write(
        &self,
        records: &[LogRecord],
        path: &Path,
        append: bool,
    ) -> Result<(), LogExportError> {
        let width = column_names(records)
            .iter()
            .map(|n| n.len())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for record in records {
            for (name, value) in record.fields() {
                // Writing into a String cannot fail
                let _ = writeln!(out, "{:<width$} : {}", name, value, width = width);
            }
            out.push('\n');
        }

        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .append(append)
            .truncate(!append)
            .open(path)?;
        file.write_all(out.as_bytes())?;
        Ok(())
    }
}

/// Excel worksheet holding a single table.
///
/// Without append, an existing file is deleted first; with append, its rows
/// are read back and the table is rewritten with the new rows below them.
pub struct XlsxFormat;

const LOG_SHEET_NAME: &str = "Log";

impl XlsxFormat {
    fn read_existing(path: &Path) -> Result<(Vec<String>, Vec<Vec<FieldValue>>), LogExportError> {
        let mut workbook: Xlsx<_> = open_workbook(path)?;
        let range = match workbook.worksheet_range_at(0) {
            Some(range) => range?,
            None => return Ok((Vec::new(), Vec::new())),
        };

        let mut rows = range.rows();
        let header: Vec<String> = match rows.next() {
            Some(cells) => cells.iter().map(|c| c.to_string()).collect(),
            None => return Ok((Vec::new(), Vec::new())),
        };
        let data = rows
            .map(|cells| cells.iter().map(field_from_data).collect())
            .collect();

        Ok((header, data))
    }
}

fn field_from_data(data: &Data) -> FieldValue {
    match data {
        Data::Float(f) => FieldValue::Number(*f),
        Data::Int(i) => FieldValue::Number(*i as f64),
        Data::Empty => FieldValue::Empty,
        other => FieldValue::Text(other.to_string()),
    }
}

impl LogFormat for XlsxFormat {
    fn extension(&self) -> &'static str {
        ".xlsx"
    }

    fn write(
        &self,
        records: &[LogRecord],
        path: &Path,
        append: bool,
    ) -> Result<(), LogExportError> {
        let (mut columns, mut rows) = if append && path.is_file() {
            Self::read_existing(path)?
        } else {
            if path.exists() {
                fs::remove_file(path)?;
            }
            (Vec::new(), Vec::new())
        };

        for name in column_names(records) {
            if !columns.contains(&name) {
                columns.push(name);
            }
        }
        for row in rows.iter_mut() {
            row.resize(columns.len(), FieldValue::Empty);
        }
        for record in records {
            rows.push(
                columns
                    .iter()
                    .map(|c| record.get(c).cloned().unwrap_or(FieldValue::Empty))
                    .collect(),
            );
        }

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(LOG_SHEET_NAME)?;

        for (col, name) in columns.iter().enumerate() {
            worksheet.write_string(0, col as u16, name)?;
        }
        for (idx, row) in rows.iter().enumerate() {
            let r = idx as u32 + 1;
            for (col, value) in row.iter().enumerate() {
                let c = col as u16;
                match value {
                    FieldValue::Number(n) => {
                        worksheet.write_number(r, c, *n)?;
                    }
                    FieldValue::Timestamp(t) => {
                        worksheet.write_string(r, c, t.format(TIMESTAMP_FORMAT).to_string())?;
                    }
                    FieldValue::Text(s) | FieldValue::Error(s) => {
                        worksheet.write_string(r, c, s)?;
                    }
                    FieldValue::Empty => {}
                }
            }
        }

        let table_columns: Vec<TableColumn> = columns
            .iter()
            .map(|c| TableColumn::new().set_header(c))
            .collect();
        let table = Table::new().set_columns(&table_columns);
        let last_col = columns.len().saturating_sub(1) as u16;
        worksheet.add_table(0, 0, rows.len() as u32, last_col, &table)?;

        workbook.save(path)?;
        Ok(())
    }
}
