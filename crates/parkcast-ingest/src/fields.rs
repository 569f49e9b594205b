//! Candidate key tables and the typed lookup helper over a record's bags

use crate::numeric::{parse_flexible_float, parse_flexible_int};
use serde_json::{Map, Value};

/// Keys tried, in priority order, for each logical field
pub mod keys {
    pub const FACILITY_ID: &[&str] = &["noteId", "parking_id", "parkingId", "id", "codigo", "code"];
    pub const NAME: &[&str] = &["nombre", "name", "titulo", "title", "descripcion"];
    pub const FREE: &[&str] = &[
        "libres",
        "free",
        "libre",
        "available",
        "slotsAvailable",
        "plazasLibres",
        "Plazas libres",
    ];
    pub const OCCUPIED: &[&str] = &["ocupadas", "occupied", "slotsOccupied", "plazasOcupadas"];
    pub const TOTAL: &[&str] = &["total", "capacity", "capacidad", "plazasTotales", "totalSpaces"];
    pub const ROTATING: &[&str] = &["plazasRotatorias", "rotatorias"];
    pub const RESIDENT: &[&str] = &["plazasResidentes", "residentes"];
    pub const LATITUDE: &[&str] = &["lat", "latitude", "latitud"];
    pub const LONGITUDE: &[&str] = &["lon", "lng", "longitude", "longitud"];
    pub const COORDINATES: &[&str] = &["coordinates"];
}

/// Looks fields up across a record's key/value bags.
///
/// The primary bag (a feature's `properties`, or the record itself) is
/// consulted before the fallback (the enclosing feature object) for every
/// candidate, and candidates are tried in table order.
pub struct FieldExtractor<'a> {
    primary: &'a Map<String, Value>,
    fallback: Option<&'a Map<String, Value>>,
}

impl<'a> FieldExtractor<'a> {
    pub fn new(primary: &'a Map<String, Value>) -> Self {
        Self {
            primary,
            fallback: None,
        }
    }

    pub fn with_fallback(mut self, fallback: &'a Map<String, Value>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// First candidate present with a non-empty value
    pub fn lookup(&self, candidates: &[&str]) -> Option<&'a Value> {
        candidates.iter().find_map(|key| {
            std::iter::once(self.primary)
                .chain(self.fallback)
                .find_map(|bag| bag.get(*key).filter(|v| !is_blank(v)))
        })
    }

    pub fn text(&self, candidates: &[&str]) -> Option<String> {
        match self.lookup(candidates)? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(b) => Some(b.to_string()),
            _ => None,
        }
    }

    pub fn int(&self, candidates: &[&str]) -> Option<i64> {
        self.lookup(candidates).and_then(parse_flexible_int)
    }

    /// Integer field where a missing or unparsable value counts as `default`
    pub fn int_or(&self, candidates: &[&str], default: i64) -> i64 {
        self.int(candidates).unwrap_or(default)
    }

    pub fn float(&self, candidates: &[&str]) -> Option<f64> {
        self.lookup(candidates).and_then(parse_flexible_float)
    }

    /// True if any candidate is present with a non-empty value
    pub fn has(&self, candidates: &[&str]) -> bool {
        self.lookup(candidates).is_some()
    }

    /// `(x, y)` from a `coordinates` list in one of the bags
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lookup(keys::COORDINATES).and_then(coordinate_pair)
    }
}

/// Read a `[x, y, ...]` list positionally; both components must parse
pub fn coordinate_pair(value: &Value) -> Option<(f64, f64)> {
    match value.as_array()?.as_slice() {
        [x, y, ..] => Some((parse_flexible_float(x)?, parse_flexible_float(y)?)),
        _ => None,
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        _ => false,
    }
}
