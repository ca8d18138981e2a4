//! A1-style cell addresses

use crate::error::{RoadsheetError, RoadsheetResult};
use std::fmt;
use std::str::FromStr;

/// Last column Excel supports (XFD)
pub const MAX_COLUMNS: u16 = 16_384;
/// Last row Excel supports
pub const MAX_ROWS: u32 = 1_048_576;

/// Zero-based cell position parsed from A1 notation
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CellAddress {
    pub row: u32,
    pub col: u16,
}

impl CellAddress {
    pub fn new(row: u32, col: u16) -> Self {
        Self { row, col }
    }

    /// Address of `column` (letters) on a one-based `row_number`
    pub fn in_column(column: &str, row_number: u32) -> RoadsheetResult<Self> {
        let col = column_letter_to_index(column)?;
        if row_number == 0 || row_number > MAX_ROWS {
            return Err(RoadsheetError::Address(format!("{}{}", column, row_number)));
        }
        Ok(Self::new(row_number - 1, col))
    }
}

impl fmt::Display for CellAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{}",
            column_index_to_letter(self.col as usize),
            self.row + 1
        )
    }
}

impl FromStr for CellAddress {
    type Err = RoadsheetError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let split = s
            .find(|c: char| c.is_ascii_digit())
            .ok_or_else(|| RoadsheetError::Address(s.to_string()))?;
        let (letters, digits) = s.split_at(split);
        let row: u32 = digits
            .parse()
            .map_err(|_| RoadsheetError::Address(s.to_string()))?;
        Self::in_column(letters, row).map_err(|_| RoadsheetError::Address(s.to_string()))
    }
}

/// Convert a zero-based column index to letters
///
/// Examples:
/// - 0 → A
/// - 25 → Z
/// - 26 → AA
pub fn column_index_to_letter(index: usize) -> String {
    let mut result = String::new();
    let mut idx = index;

    loop {
        let remainder = idx % 26;
        result.insert(0, (b'A' + remainder as u8) as char);
        if idx < 26 {
            break;
        }
        idx = idx / 26 - 1;
    }

    result
}

/// Convert column letters (case-insensitive) to a zero-based index
pub fn column_letter_to_index(column: &str) -> RoadsheetResult<u16> {
    let column = column.trim();
    if column.is_empty() || !column.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(RoadsheetError::Address(column.to_string()));
    }

    let mut index: u32 = 0;
    for c in column.chars() {
        index = index * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
        if index > MAX_COLUMNS as u32 {
            return Err(RoadsheetError::Address(column.to_string()));
        }
    }

    Ok((index - 1) as u16)
}
