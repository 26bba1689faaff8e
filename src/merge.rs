//! Collapse per-group catcher rows into one display card per plate.

use std::collections::HashMap;

use crate::store::CatcherRecord;

/// Separator between group names on a merged card.
pub const GROUP_NAME_SEPARATOR: &str = "/";

/// Merge records sharing a plate number.
///
/// The first record seen for a plate supplies every field; its `group_name`
/// becomes the `/`-joined names of all records with that plate, in input
/// order. Output follows the order in which each plate first appears.
pub fn merge_catchers(records: &[CatcherRecord]) -> Vec<CatcherRecord> {
    let mut merged: Vec<CatcherRecord> = Vec::new();
    let mut by_plate: HashMap<&str, usize> = HashMap::new();

    for record in records {
        match by_plate.get(record.plate_number.as_str()) {
            Some(&idx) => {
                let base = &mut merged[idx];
                base.group_name.push_str(GROUP_NAME_SEPARATOR);
                base.group_name.push_str(&record.group_name);
            }
            None => {
                by_plate.insert(record.plate_number.as_str(), merged.len());
                merged.push(record.clone());
            }
        }
    }

    merged
}
