use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Projection {
    Globe,
    Mercator,
}

impl std::fmt::Display for Projection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Projection::Globe => write!(f, "globe"),
            Projection::Mercator => write!(f, "mercator"),
        }
    }
}

/// Which data the world map visualizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapMode {
    Heat,
    Peace,
}

impl std::fmt::Display for MapMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MapMode::Heat => write!(f, "heat"),
            MapMode::Peace => write!(f, "peace"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraState {
    pub center: LngLat,
    pub zoom: f64,
    pub pitch: f64,
    pub bearing: f64,
}

// GeoJSON subset used by the map layers.

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point { coordinates: [f64; 2] },
    Polygon { coordinates: Vec<Vec<[f64; 2]>> },
    MultiPolygon { coordinates: Vec<Vec<Vec<[f64; 2]>>> },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct Feature {
    pub geometry: Geometry,
    #[serde(default)]
    pub properties: Map<String, Value>,
}

impl Feature {
    pub fn point(lng: f64, lat: f64, properties: Map<String, Value>) -> Self {
        Feature {
            geometry: Geometry::Point {
                coordinates: [lng, lat],
            },
            properties,
        }
    }

    /// Closed rectangle polygon from south-west and north-east corners.
    pub fn rectangle(sw: [f64; 2], ne: [f64; 2], properties: Map<String, Value>) -> Self {
        let ring = vec![
            [sw[0], sw[1]],
            [sw[0], ne[1]],
            [ne[0], ne[1]],
            [ne[0], sw[1]],
            [sw[0], sw[1]],
        ];
        Feature {
            geometry: Geometry::Polygon {
                coordinates: vec![ring],
            },
            properties,
        }
    }

    pub fn prop_f64(&self, key: &str) -> Option<f64> {
        self.properties.get(key).and_then(Value::as_f64)
    }

    pub fn prop_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(Value::as_str)
    }

    pub fn set_prop(&mut self, key: &str, value: impl Into<Value>) {
        self.properties.insert(key.to_string(), value.into());
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

impl FeatureCollection {
    pub fn new(features: Vec<Feature>) -> Self {
        FeatureCollection { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

// Mock API payloads

/// `GET /api/peace-data/{country}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeaceDataRecord {
    pub signed_count: u64,
    pub population: u64,
    pub signed_percentage: f64,
}

/// `GET /api/peace/{country}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeaceVoteRecord {
    pub country: String,
    pub total_population: u64,
    pub vote_amount: u64,
    pub percentage: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiErrorBody {
    pub error: String,
}

/// ISO-3 country code to peace percentage, as served at `/peace-map.json`.
pub type PeaceMap = BTreeMap<String, f64>;
