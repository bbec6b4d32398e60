//! In-memory map for orchestration tests. Mirrors the library's rules that
//! matter here: no sources or layers while a style loads, duplicate ids are
//! errors, and a new style drops everything custom.
use std::collections::BTreeMap;

use peaceboard_shared::models::{CameraState, FeatureCollection};
use serde_json::Value;

use super::backend::{EaseOptions, GeoJsonSource, LayerSpec, MapBackend, MapError};
use super::style::StyleDocument;

#[derive(Debug, Default)]
pub struct FakeMap {
    pub style: Option<StyleDocument>,
    pub style_loaded: bool,
    pub style_sets: usize,
    sources: BTreeMap<String, FeatureCollection>,
    source_order: Vec<String>,
    layers: Vec<LayerSpec>,
    pub camera: CameraState,
    pub eases: Vec<EaseOptions>,
    pub jumps: Vec<CameraState>,
    pub data_pushes: usize,
    pub failed_calls: usize,
}

impl FakeMap {
    /// A map whose initial style is still loading.
    pub fn loading() -> Self {
        FakeMap::default()
    }

    /// A map with a loaded, empty style.
    pub fn ready() -> Self {
        FakeMap {
            style_loaded: true,
            ..FakeMap::default()
        }
    }

    pub fn loaded(style: &StyleDocument) -> Self {
        FakeMap {
            style: Some(style.clone()),
            style_loaded: true,
            ..FakeMap::default()
        }
    }

    pub fn with_style(style: &StyleDocument) -> Self {
        FakeMap {
            style: Some(style.clone()),
            ..FakeMap::default()
        }
    }

    pub fn finish_loading(&mut self) {
        self.style_loaded = true;
    }

    pub fn unload(&mut self) {
        self.style_loaded = false;
    }

    pub fn current_projection(&self) -> Option<String> {
        self.style
            .as_ref()
            .and_then(|s| s.projection_type())
            .map(str::to_string)
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.layers.iter().map(|l| l.id.clone()).collect()
    }

    pub fn source_ids(&self) -> Vec<String> {
        self.source_order.clone()
    }

    pub fn layer(&self, id: &str) -> Option<&LayerSpec> {
        self.layers.iter().find(|l| l.id == id)
    }

    pub fn source_len(&self, id: &str) -> Option<usize> {
        self.sources.get(id).map(FeatureCollection::len)
    }

    pub fn source(&self, id: &str) -> Option<&FeatureCollection> {
        self.sources.get(id)
    }

    fn fail(&mut self, err: MapError) -> Result<(), MapError> {
        self.failed_calls += 1;
        Err(err)
    }

    fn check_loaded(&mut self) -> Result<(), MapError> {
        if self.style_loaded {
            Ok(())
        } else {
            self.fail(MapError::StyleNotLoaded)
        }
    }
}

impl MapBackend for FakeMap {
    fn is_style_loaded(&self) -> bool {
        self.style_loaded
    }

    fn set_style(&mut self, style: &StyleDocument) -> Result<(), MapError> {
        self.style = Some(style.clone());
        self.style_loaded = false;
        self.style_sets += 1;
        self.sources.clear();
        self.source_order.clear();
        self.layers.clear();
        Ok(())
    }

    fn has_source(&self, id: &str) -> bool {
        self.sources.contains_key(id)
    }

    fn add_source(&mut self, id: &str, source: &GeoJsonSource) -> Result<(), MapError> {
        self.check_loaded()?;
        if self.sources.contains_key(id) {
            return self.fail(MapError::DuplicateSource(id.to_string()));
        }
        self.sources.insert(id.to_string(), source.data.clone());
        self.source_order.push(id.to_string());
        Ok(())
    }

    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), MapError> {
        match self.sources.get_mut(id) {
            Some(existing) => {
                *existing = data.clone();
                self.data_pushes += 1;
                Ok(())
            }
            None => self.fail(MapError::MissingSource(id.to_string())),
        }
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        if self.layers.iter().any(|l| l.source == id) {
            return self.fail(MapError::Library(format!("source {id:?} is in use")));
        }
        if self.sources.remove(id).is_none() {
            return self.fail(MapError::MissingSource(id.to_string()));
        }
        self.source_order.retain(|s| s != id);
        Ok(())
    }

    fn has_layer(&self, id: &str) -> bool {
        self.layer(id).is_some()
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError> {
        self.check_loaded()?;
        if self.has_layer(&layer.id) {
            return self.fail(MapError::DuplicateLayer(layer.id.clone()));
        }
        if !self.sources.contains_key(&layer.source) {
            return self.fail(MapError::MissingSource(layer.source.clone()));
        }
        self.layers.push(layer.clone());
        Ok(())
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        let before = self.layers.len();
        self.layers.retain(|l| l.id != id);
        if self.layers.len() == before {
            return self.fail(MapError::MissingLayer(id.to_string()));
        }
        Ok(())
    }

    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), MapError> {
        match self.layers.iter_mut().find(|l| l.id == layer) {
            Some(spec) => {
                spec.layout.insert(name.to_string(), value.clone());
                Ok(())
            }
            None => self.fail(MapError::MissingLayer(layer.to_string())),
        }
    }

    fn camera(&self) -> CameraState {
        self.camera
    }

    fn jump_to(&mut self, camera: &CameraState) -> Result<(), MapError> {
        self.camera = *camera;
        self.jumps.push(*camera);
        Ok(())
    }

    fn ease_to(&mut self, options: &EaseOptions) -> Result<(), MapError> {
        if let Some(pitch) = options.pitch {
            self.camera.pitch = pitch;
        }
        if let Some(bearing) = options.bearing {
            self.camera.bearing = bearing;
        }
        self.eases.push(*options);
        Ok(())
    }
}
