#![forbid(unsafe_code)]

//! Normalizes raw result rows into a flat table.

use serde_json::{Map, Value};

use crate::session::RawRecord;

/// Key that records the original column name of a flattened result.
pub const LABEL_COLUMN: &str = "Label in Cypher";

/// Flat row: string key to scalar or collection value.
pub type NormalizedRecord = Map<String, Value>;

/// Flattens single-column map results, otherwise passes rows through.
///
/// The shape is decided once for the whole result set: rows are flattened
/// only if every row has exactly one column and every such column holds a
/// map. Flattened rows start with [`LABEL_COLUMN`] followed by the inner keys;
/// an inner key of the same name is dropped so the tag always wins.
pub fn to_table(records: Vec<RawRecord>) -> Vec<NormalizedRecord> {
    if !is_single_map_column(&records) {
        return records;
    }
    records
        .into_iter()
        .map(|record| {
            let mut flat = NormalizedRecord::new();
            for (column, value) in record {
                flat.insert(LABEL_COLUMN.to_string(), Value::String(column));
                if let Value::Object(inner) = value {
                    flat.extend(inner.into_iter().filter(|(k, _)| k != LABEL_COLUMN));
                }
            }
            flat
        })
        .collect()
}

/// Returns the records unchanged, preserving nested nodes and edges.
pub fn to_records(records: Vec<RawRecord>) -> Vec<RawRecord> {
    records
}

/// Column names in first-record key order.
pub fn column_names(table: &[NormalizedRecord]) -> Vec<String> {
    table
        .first()
        .map(|row| row.keys().cloned().collect())
        .unwrap_or_default()
}

fn is_single_map_column(records: &[RawRecord]) -> bool {
    !records.is_empty()
        && records
            .iter()
            .all(|r| r.len() == 1 && r.values().all(Value::is_object))
}
