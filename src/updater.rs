//! Write resolved routes back into their target cells

use crate::sheet::CellWriter;
use crate::types::CoordinatePair;
use tracing::warn;

/// Display format of the distance column (kilometers)
pub const DISTANCE_FORMAT: &str = "0.00";
/// Display format of the duration column (minutes)
pub const DURATION_FORMAT: &str = "0";

pub fn meters_to_kilometers(meters: f64) -> f64 {
    meters / 1000.0
}

pub fn seconds_to_minutes(seconds: f64) -> f64 {
    seconds / 60.0
}

/// Update the distance and duration cells of every resolved, error-free pair.
///
/// The two writes are independent: a failed distance write is recorded on the
/// pair and the duration write is still attempted. Returns how many pairs had
/// both cells written.
pub fn update_sheet(sheet: &mut dyn CellWriter, pairs: &mut [CoordinatePair]) -> usize {
    let mut updated = 0;

    for pair in pairs.iter_mut().filter(|p| p.is_updatable()) {
        let Some(route) = pair.api_result() else {
            continue;
        };

        let distance = sheet.write_number(
            &pair.distance_cell,
            meters_to_kilometers(route.distance),
            DISTANCE_FORMAT,
        );
        if let Err(e) = &distance {
            warn!(cell = %pair.distance_cell, "distance write failed: {}", e);
            pair.push_error(format!(
                "Failed to update distance cell '{}': {}",
                pair.distance_cell, e
            ));
        }

        let duration = sheet.write_number(
            &pair.duration_cell,
            seconds_to_minutes(route.duration),
            DURATION_FORMAT,
        );
        if let Err(e) = &duration {
            warn!(cell = %pair.duration_cell, "duration write failed: {}", e);
            pair.push_error(format!(
                "Failed to update duration cell '{}': {}",
                pair.duration_cell, e
            ));
        }

        if distance.is_ok() && duration.is_ok() {
            updated += 1;
        }
    }

    updated
}
