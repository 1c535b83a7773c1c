//! Cheapest-station selection

use crate::normalize::StationRecord;

/// Pick the cheapest station
///
/// Ties go to the earliest record, so a stable upstream order gives the
/// same winner on every poll.
pub fn select(records: &[StationRecord]) -> Option<&StationRecord> {
    let mut best: Option<&StationRecord> = None;
    for record in records {
        match best {
            Some(current) if record.price >= current.price => {}
            _ => best = Some(record),
        }
    }
    best
}
