//! Start/destination pair extraction
//!
//! Rows are scanned top to bottom. A row whose marker cell holds `S` arms a
//! pending start; the next row marked `D` consumes it and yields a pair
//! targeting that destination row's distance/duration cells.

use crate::config::ColumnConfig;
use crate::sheet::{column_letter_to_index, Worksheet};
use crate::types::CoordinatePair;
use crate::RoadsheetResult;

const START_MARKER: &str = "S";
const DESTINATION_MARKER: &str = "D";

/// Scan state between rows
#[derive(Debug, Clone, PartialEq)]
enum ScanState {
    Idle,
    AwaitingDestination(String),
}

/// Cell addresses of one row for the four configured columns
#[derive(Debug, Clone, PartialEq)]
struct RowAddresses {
    marker: String,
    coordinate: String,
    distance: String,
    duration: String,
}

impl RowAddresses {
    fn for_row(columns: &ColumnConfig, row: u32) -> Self {
        Self {
            marker: format!("{}{}", columns.start_destination, row),
            coordinate: format!("{}{}", columns.coordinate, row),
            distance: format!("{}{}", columns.distance, row),
            duration: format!("{}{}", columns.duration, row),
        }
    }
}

/// Extract ordered coordinate pairs from a worksheet.
///
/// A second `S` before any `D` replaces the pending start; a `D` with nothing
/// pending is skipped without error.
pub fn extract_pairs(
    sheet: &Worksheet,
    columns: &ColumnConfig,
) -> RoadsheetResult<Vec<CoordinatePair>> {
    for column in columns.all() {
        column_letter_to_index(column)?;
    }

    let (_, pairs) = sheet.row_numbers().into_iter().fold(
        (ScanState::Idle, Vec::new()),
        |(state, mut pairs), row| {
            let addresses = RowAddresses::for_row(columns, row);
            let marker = sheet.text(&addresses.marker);
            let coordinate = sheet.text(&addresses.coordinate).unwrap_or_default();

            let next = match (marker.as_deref(), state) {
                (Some(START_MARKER), _) => ScanState::AwaitingDestination(coordinate),
                (Some(DESTINATION_MARKER), ScanState::AwaitingDestination(start)) => {
                    pairs.push(CoordinatePair::new(
                        start,
                        coordinate,
                        addresses.distance,
                        addresses.duration,
                    ));
                    ScanState::Idle
                }
                (_, state) => state,
            };

            (next, pairs)
        },
    );

    Ok(pairs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheet::{CellAddress, CellValue};

    fn columns() -> ColumnConfig {
        ColumnConfig {
            start_destination: "A".to_string(),
            coordinate: "B".to_string(),
            distance: "C".to_string(),
            duration: "D".to_string(),
        }
    }

    fn sheet_with(rows: &[(&str, &str)]) -> Worksheet {
        let mut sheet = Worksheet::new("Trips");
        sheet.set(
            CellAddress::new(0, 0),
            CellValue::Text("Marker".to_string()),
        );
        for (idx, (marker, coord)) in rows.iter().enumerate() {
            let row = idx as u32 + 1;
            if !marker.is_empty() {
                sheet.set(CellAddress::new(row, 0), CellValue::Text(marker.to_string()));
            }
            sheet.set(CellAddress::new(row, 1), CellValue::Text(coord.to_string()));
        }
        sheet
    }

    fn endpoints(pairs: &[CoordinatePair]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|p| (p.start.clone(), p.destination.clone()))
            .collect()
    }

    #[test]
    fn test_alternating_markers() {
        let sheet = sheet_with(&[("S", "1"), ("D", "2"), ("S", "3"), ("D", "4")]);
        let pairs = extract_pairs(&sheet, &columns()).unwrap();

        assert_eq!(
            endpoints(&pairs),
            vec![
                ("1".to_string(), "2".to_string()),
                ("3".to_string(), "4".to_string())
            ]
        );
        assert_eq!(pairs[0].distance_cell, "C3");
        assert_eq!(pairs[0].duration_cell, "D3");
        assert_eq!(pairs[1].distance_cell, "C5");
    }

    #[test]
    fn test_destination_without_start_is_ignored() {
        let sheet = sheet_with(&[("D", "0"), ("S", "1"), ("D", "2")]);
        let pairs = extract_pairs(&sheet, &columns()).unwrap();
        assert_eq!(endpoints(&pairs), vec![("1".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_consecutive_starts_keep_latest() {
        let sheet = sheet_with(&[("S", "1"), ("S", "9"), ("D", "2")]);
        let pairs = extract_pairs(&sheet, &columns()).unwrap();
        assert_eq!(endpoints(&pairs), vec![("9".to_string(), "2".to_string())]);
    }

    #[test]
    fn test_start_is_consumed_by_destination() {
        let sheet = sheet_with(&[("S", "1"), ("D", "2"), ("D", "3")]);
        let pairs = extract_pairs(&sheet, &columns()).unwrap();
        assert_eq!(pairs.len(), 1);
    }

    #[test]
    fn test_unmarked_rows_between_start_and_destination() {
        let sheet = sheet_with(&[("S", "1"), ("", "x"), ("note", "y"), ("D", "2")]);
        let pairs = extract_pairs(&sheet, &columns()).unwrap();
        assert_eq!(endpoints(&pairs), vec![("1".to_string(), "2".to_string())]);
        assert_eq!(pairs[0].distance_cell, "C5");
    }

    #[test]
    fn test_formula_coordinates_use_cached_text() {
        let mut sheet = sheet_with(&[("S", "1"), ("D", "")]);
        sheet.set_formula(
            CellAddress::new(2, 1),
            r#"CONCAT("50", ", ", "4")"#,
            CellValue::Text(String::new()),
        );
        sheet.set(CellAddress::new(3, 0), CellValue::Text("S".to_string()));
        sheet.set_formula(
            CellAddress::new(3, 1),
            "B2",
            CellValue::Text("50, 4".to_string()),
        );
        sheet.set(CellAddress::new(4, 0), CellValue::Text("D".to_string()));
        sheet.set(CellAddress::new(4, 1), CellValue::Text("51, 3".to_string()));

        let pairs = extract_pairs(&sheet, &columns()).unwrap();
        assert_eq!(
            endpoints(&pairs),
            vec![
                ("1".to_string(), "".to_string()),
                ("50, 4".to_string(), "51, 3".to_string())
            ]
        );
    }

    #[test]
    fn test_markers_are_case_sensitive() {
        let sheet = sheet_with(&[("s", "1"), ("d", "2")]);
        assert!(extract_pairs(&sheet, &columns()).unwrap().is_empty());
    }

    #[test]
    fn test_invalid_column_is_rejected() {
        let sheet = sheet_with(&[("S", "1"), ("D", "2")]);
        let mut cols = columns();
        cols.distance = "9".to_string();
        assert!(extract_pairs(&sheet, &cols).is_err());
    }
}
