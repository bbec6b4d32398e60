pub mod backend;
pub mod controller;
pub mod drift;
#[cfg(test)]
pub mod fake;
pub mod layers;
pub mod strategy;
pub mod style;

pub use backend::{MapBackend, MapError, MapEvent};
pub use controller::MapController;

use serde_json::{Map, Value};

/// Unwrap a `json!({...})` literal into its object map.
pub(crate) fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}
