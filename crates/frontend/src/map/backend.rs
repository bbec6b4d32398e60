//! The slice of the MapLibre API the controller and layers drive.
//!
//! Everything goes through [`MapBackend`] so orchestration can run against an
//! in-memory map in tests and against `maplibregl.Map` in the browser.
use peaceboard_shared::models::{CameraState, FeatureCollection};
use serde::Serialize;
use serde_json::{Map, Value};

use super::style::StyleDocument;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MapError {
    #[error("style is not done loading")]
    StyleNotLoaded,
    #[error("source {0:?} already exists")]
    DuplicateSource(String),
    #[error("layer {0:?} already exists")]
    DuplicateLayer(String),
    #[error("source {0:?} does not exist")]
    MissingSource(String),
    #[error("layer {0:?} does not exist")]
    MissingLayer(String),
    #[error("map library: {0}")]
    Library(String),
}

/// Library events forwarded into the controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapEvent {
    StyleLoad,
    MoveStart,
    MoveEnd,
}

impl MapEvent {
    pub const ALL: [MapEvent; 3] = [MapEvent::StyleLoad, MapEvent::MoveStart, MapEvent::MoveEnd];

    /// Event name as the library emits it.
    pub fn name(self) -> &'static str {
        match self {
            MapEvent::StyleLoad => "style.load",
            MapEvent::MoveStart => "movestart",
            MapEvent::MoveEnd => "moveend",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LayerKind {
    Heatmap,
    Circle,
    Fill,
    Line,
    Symbol,
}

/// A style layer as passed to `addLayer`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LayerSpec {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: LayerKind,
    pub source: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minzoom: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maxzoom: Option<f64>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub layout: Map<String, Value>,
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub paint: Map<String, Value>,
}

impl LayerSpec {
    pub fn new(id: impl Into<String>, kind: LayerKind, source: impl Into<String>) -> Self {
        LayerSpec {
            id: id.into(),
            kind,
            source: source.into(),
            minzoom: None,
            maxzoom: None,
            layout: Map::new(),
            paint: Map::new(),
        }
    }

    pub fn minzoom(mut self, zoom: f64) -> Self {
        self.minzoom = Some(zoom);
        self
    }

    pub fn maxzoom(mut self, zoom: f64) -> Self {
        self.maxzoom = Some(zoom);
        self
    }

    pub fn layout(mut self, layout: Map<String, Value>) -> Self {
        self.layout.extend(layout);
        self
    }

    pub fn paint(mut self, paint: Map<String, Value>) -> Self {
        self.paint = paint;
        self
    }

    pub fn visibility(mut self, visible: bool) -> Self {
        self.layout
            .insert("visibility".into(), visibility_value(visible));
        self
    }
}

pub fn visibility_value(visible: bool) -> Value {
    Value::from(if visible { "visible" } else { "none" })
}

/// A GeoJSON source as passed to `addSource`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename = "geojson", rename_all = "camelCase")]
pub struct GeoJsonSource {
    pub data: FeatureCollection,
    pub generate_id: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub buffer: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cluster: Option<bool>,
}

impl GeoJsonSource {
    pub fn new(data: FeatureCollection) -> Self {
        GeoJsonSource {
            data,
            generate_id: true,
            buffer: None,
            tolerance: None,
            cluster: None,
        }
    }
}

/// `easeTo` options; unset fields keep their current value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EaseOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pitch: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f64>,
    pub duration: u32,
    pub essential: bool,
}

pub trait MapBackend {
    fn is_style_loaded(&self) -> bool;
    /// Replace the whole style. Custom sources and layers are dropped.
    fn set_style(&mut self, style: &StyleDocument) -> Result<(), MapError>;

    fn has_source(&self, id: &str) -> bool;
    fn add_source(&mut self, id: &str, source: &GeoJsonSource) -> Result<(), MapError>;
    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), MapError>;
    fn remove_source(&mut self, id: &str) -> Result<(), MapError>;

    fn has_layer(&self, id: &str) -> bool;
    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError>;
    fn remove_layer(&mut self, id: &str) -> Result<(), MapError>;
    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Value)
        -> Result<(), MapError>;

    fn camera(&self) -> CameraState;
    fn jump_to(&mut self, camera: &CameraState) -> Result<(), MapError>;
    fn ease_to(&mut self, options: &EaseOptions) -> Result<(), MapError>;
}
