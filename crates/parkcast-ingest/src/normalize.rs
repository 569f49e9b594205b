//! Maps the upstream document into fixed-shape [`RawReading`] rows
//!
//! The endpoint has published both GeoJSON feature collections and flatter
//! lists of objects with varying field names. Normalization never fails:
//! it returns whatever rows can be extracted and logs when the shape is
//! unrecognized or nothing usable was found.

use crate::fields::{coordinate_pair, keys, FieldExtractor};
use parkcast_core::{truncate_to_second, RawReading, Timestamp};
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Keys under which a wrapping object may hold the record list
const RECORD_LIST_KEYS: &[&str] = &["features", "data", "items", "results", "records", "parkings"];

/// Normalize a document observed at `observed_at` into readings
pub fn normalize(document: &Value, observed_at: Timestamp) -> Vec<RawReading> {
    let observed_at = truncate_to_second(observed_at);

    let Some(records) = locate_records(document) else {
        warn!(root = %describe_root(document), "unrecognized document structure");
        return Vec::new();
    };

    let rows: Vec<RawReading> = records
        .iter()
        .filter_map(|record| normalize_record(record, observed_at))
        .collect();

    match rows.first() {
        Some(first) => debug!(rows = rows.len(), example = ?first, "normalized document"),
        None => warn!(
            records = records.len(),
            sample_keys = ?sample_keys(records),
            "no rows normalized"
        ),
    }

    rows
}

fn locate_records(document: &Value) -> Option<&Vec<Value>> {
    match document {
        Value::Array(items) => Some(items),
        Value::Object(root) => RECORD_LIST_KEYS
            .iter()
            .find_map(|key| root.get(*key).and_then(Value::as_array)),
        _ => None,
    }
}

/// Normalize one record, or `None` if nothing usable was extracted
fn normalize_record(record: &Value, observed_at: Timestamp) -> Option<RawReading> {
    let object = record.as_object()?;
    let properties = object.get("properties").and_then(Value::as_object);
    let fields = match properties {
        Some(props) => FieldExtractor::new(props).with_fallback(object),
        None => FieldExtractor::new(object),
    };

    let (longitude, latitude) = match geometry_coordinates(object).or_else(|| fields.coordinates()) {
        Some((x, y)) => (Some(x), Some(y)),
        None => (fields.float(keys::LONGITUDE), fields.float(keys::LATITUDE)),
    };

    let total = capacity(&fields);
    // Derived only when no free field is reported; an unparsable one stays null
    let free_spaces = if fields.has(keys::FREE) {
        fields.int(keys::FREE)
    } else {
        derive_free(total, fields.int(keys::OCCUPIED))
    };

    let mut reading = RawReading {
        observed_at,
        facility_id: fields.text(keys::FACILITY_ID),
        name: fields.text(keys::NAME),
        free_spaces,
        total_spaces: total,
        latitude,
        longitude,
    };

    if reading.is_empty() {
        return None;
    }
    // Capacity is reported as 0 rather than null once the row is kept
    reading.total_spaces.get_or_insert(0);
    Some(reading)
}

fn geometry_coordinates(feature: &Map<String, Value>) -> Option<(f64, f64)> {
    feature
        .get("geometry")
        .and_then(|g| g.get("coordinates"))
        .and_then(coordinate_pair)
}

/// Total spaces from a direct field, else rotating + resident.
///
/// `None` only when the record carries no capacity field at all.
fn capacity(fields: &FieldExtractor<'_>) -> Option<i64> {
    if fields.has(keys::TOTAL) {
        return fields.int(keys::TOTAL).filter(|t| *t >= 0);
    }
    if !fields.has(keys::ROTATING) && !fields.has(keys::RESIDENT) {
        return None;
    }
    let rotating = fields.int_or(keys::ROTATING, 0).max(0);
    let resident = fields.int_or(keys::RESIDENT, 0).max(0);
    Some(rotating.saturating_add(resident))
}

fn derive_free(total: Option<i64>, occupied: Option<i64>) -> Option<i64> {
    total?.checked_sub(occupied?).filter(|free| *free >= 0)
}

fn describe_root(document: &Value) -> String {
    match document {
        Value::Object(map) => format!("object with keys {:?}", map.keys().collect::<Vec<_>>()),
        Value::Array(_) => "array".to_string(),
        Value::String(_) => "string".to_string(),
        Value::Number(_) => "number".to_string(),
        Value::Bool(_) => "bool".to_string(),
        Value::Null => "null".to_string(),
    }
}

fn sample_keys(records: &[Value]) -> Vec<String> {
    records
        .first()
        .and_then(Value::as_object)
        .map(|record| {
            record
                .get("properties")
                .and_then(Value::as_object)
                .unwrap_or(record)
                .keys()
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}
