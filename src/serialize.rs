//! Sheet rows to JSON records.
//!
//! Row 0 of the grid names the fields; every following row becomes one record
//! until the first row whose first cell is empty. That row ends the data
//! section: nothing after it is looked at, even if it holds values.

use indexmap::IndexMap;

use crate::sheet::Grid;

/// Field name to cell text, in header order.
pub type Record = IndexMap<String, String>;

pub type RecordSet = Vec<Record>;

pub fn serialize(grid: &Grid) -> RecordSet {
    let Some((keys, rows)) = grid.split_first() else { return Vec::new() };
    let mut out = Vec::with_capacity(rows.len());
    for row in rows {
        if row.first().map(|c| c.is_empty()).unwrap_or(true) {
            break;
        }
        let mut rec = Record::with_capacity(keys.len());
        for (i, key) in keys.iter().enumerate() {
            // duplicate header names keep their first position and take the later value
            rec.insert(key.clone(), row.get(i).cloned().unwrap_or_default());
        }
        out.push(rec);
    }
    out
}

/// Compact JSON array text of the records, fields in header order.
pub fn to_json(records: &RecordSet) -> String {
    // Serializing string maps into a String cannot fail.
    serde_json::to_string(records).unwrap_or_else(|_| "[]".to_string())
}

/// `serialize` followed by `to_json`.
pub fn serialize_to_json(grid: &Grid) -> String {
    to_json(&serialize(grid))
}

#[cfg(test)]
#[path = "serialize_tests.rs"]
mod serialize_tests;
