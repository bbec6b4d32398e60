//! MapLibre GL bindings. The library itself is loaded from a script tag in
//! `main.rs` and exposes the `maplibregl` global.
use peaceboard_shared::models::{CameraState, FeatureCollection, LngLat};
use serde::Serialize;
use serde_json::{json, Value};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::map::backend::{EaseOptions, GeoJsonSource, LayerSpec, MapBackend, MapError, MapEvent};
use crate::map::style::StyleDocument;

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = maplibregl, js_name = Map)]
    type JsMap;

    #[wasm_bindgen(constructor, catch, js_namespace = maplibregl, js_class = "Map")]
    fn new(options: &JsValue) -> Result<JsMap, JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = isStyleLoaded)]
    fn is_style_loaded(this: &JsMap) -> JsValue;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = setStyle)]
    fn set_style(this: &JsMap, style: &JsValue, options: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = getSource)]
    fn get_source(this: &JsMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = addSource)]
    fn add_source(this: &JsMap, id: &str, source: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = removeSource)]
    fn remove_source(this: &JsMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = getLayer)]
    fn get_layer(this: &JsMap, id: &str) -> JsValue;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = addLayer)]
    fn add_layer(this: &JsMap, layer: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = removeLayer)]
    fn remove_layer(this: &JsMap, id: &str) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = setLayoutProperty)]
    fn set_layout_property(this: &JsMap, layer: &str, name: &str, value: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map", js_name = getCenter)]
    fn get_center(this: &JsMap) -> JsLngLat;

    #[wasm_bindgen(method, js_class = "Map", js_name = getZoom)]
    fn get_zoom(this: &JsMap) -> f64;

    #[wasm_bindgen(method, js_class = "Map", js_name = getPitch)]
    fn get_pitch(this: &JsMap) -> f64;

    #[wasm_bindgen(method, js_class = "Map", js_name = getBearing)]
    fn get_bearing(this: &JsMap) -> f64;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = jumpTo)]
    fn jump_to(this: &JsMap, options: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, catch, js_class = "Map", js_name = easeTo)]
    fn ease_to(this: &JsMap, options: &JsValue) -> Result<(), JsValue>;

    #[wasm_bindgen(method, js_class = "Map")]
    fn on(this: &JsMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_class = "Map")]
    fn off(this: &JsMap, event: &str, listener: &js_sys::Function);

    #[wasm_bindgen(method, js_class = "Map")]
    fn remove(this: &JsMap);
}

#[wasm_bindgen]
extern "C" {
    type JsLngLat;

    #[wasm_bindgen(method, getter)]
    fn lng(this: &JsLngLat) -> f64;

    #[wasm_bindgen(method, getter)]
    fn lat(this: &JsLngLat) -> f64;

    type JsGeoJsonSource;

    #[wasm_bindgen(method, catch, js_name = setData)]
    fn set_data(this: &JsGeoJsonSource, data: &JsValue) -> Result<(), JsValue>;
}

/// Whether the `maplibregl` global has been loaded.
pub fn library_available() -> bool {
    js_sys::Reflect::get(&js_sys::global(), &JsValue::from_str("maplibregl"))
        .map(|v| !v.is_undefined())
        .unwrap_or(false)
}

fn js_error(err: JsValue) -> MapError {
    let message = match err.dyn_ref::<js_sys::Error>() {
        Some(e) => String::from(e.message()),
        None => format!("{err:?}"),
    };
    MapError::Library(message)
}

/// Serialize through JSON so the library receives plain objects.
fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, MapError> {
    let text = serde_json::to_string(value).map_err(|e| MapError::Library(e.to_string()))?;
    js_sys::JSON::parse(&text).map_err(js_error)
}

fn is_present(value: &JsValue) -> bool {
    !value.is_undefined() && !value.is_null()
}

fn camera_options(camera: &CameraState) -> Value {
    json!({
        "center": [camera.center.lng, camera.center.lat],
        "zoom": camera.zoom,
        "pitch": camera.pitch,
        "bearing": camera.bearing,
    })
}

/// A live MapLibre map plus the event listeners registered on it.
/// Dropping it detaches the listeners and destroys the map.
pub struct MapLibreMap {
    inner: JsMap,
    listeners: Vec<(MapEvent, Closure<dyn FnMut(JsValue)>)>,
}

impl MapLibreMap {
    pub fn new(container_id: &str, style: &StyleDocument, camera: &CameraState) -> Result<Self, MapError> {
        if !library_available() {
            return Err(MapError::Library("maplibregl is not loaded".into()));
        }
        let mut options = camera_options(camera);
        options["container"] = json!(container_id);
        options["style"] = style.as_value().clone();
        options["attributionControl"] = json!(false);

        let inner = JsMap::new(&to_js(&options)?).map_err(js_error)?;
        Ok(MapLibreMap {
            inner,
            listeners: Vec::new(),
        })
    }

    pub fn on(&mut self, event: MapEvent, mut handler: impl FnMut() + 'static) {
        let closure = Closure::<dyn FnMut(JsValue)>::new(move |_: JsValue| handler());
        self.inner.on(event.name(), closure.as_ref().unchecked_ref());
        self.listeners.push((event, closure));
    }
}

impl Drop for MapLibreMap {
    fn drop(&mut self) {
        for (event, closure) in self.listeners.drain(..) {
            self.inner.off(event.name(), closure.as_ref().unchecked_ref());
        }
        self.inner.remove();
    }
}

impl MapBackend for MapLibreMap {
    fn is_style_loaded(&self) -> bool {
        self.inner.is_style_loaded().is_truthy()
    }

    fn set_style(&mut self, style: &StyleDocument) -> Result<(), MapError> {
        // A full reload so that style.load fires for every swap.
        let options = to_js(&json!({ "diff": false }))?;
        self.inner
            .set_style(&to_js(style.as_value())?, &options)
            .map_err(js_error)
    }

    fn has_source(&self, id: &str) -> bool {
        is_present(&self.inner.get_source(id))
    }

    fn add_source(&mut self, id: &str, source: &GeoJsonSource) -> Result<(), MapError> {
        if self.has_source(id) {
            return Err(MapError::DuplicateSource(id.to_string()));
        }
        self.inner.add_source(id, &to_js(source)?).map_err(js_error)
    }

    fn set_source_data(&mut self, id: &str, data: &FeatureCollection) -> Result<(), MapError> {
        let source = self.inner.get_source(id);
        if !is_present(&source) {
            return Err(MapError::MissingSource(id.to_string()));
        }
        source
            .unchecked_into::<JsGeoJsonSource>()
            .set_data(&to_js(data)?)
            .map_err(js_error)
    }

    fn remove_source(&mut self, id: &str) -> Result<(), MapError> {
        self.inner.remove_source(id).map_err(js_error)
    }

    fn has_layer(&self, id: &str) -> bool {
        is_present(&self.inner.get_layer(id))
    }

    fn add_layer(&mut self, layer: &LayerSpec) -> Result<(), MapError> {
        if self.has_layer(&layer.id) {
            return Err(MapError::DuplicateLayer(layer.id.clone()));
        }
        self.inner.add_layer(&to_js(layer)?).map_err(js_error)
    }

    fn remove_layer(&mut self, id: &str) -> Result<(), MapError> {
        self.inner.remove_layer(id).map_err(js_error)
    }

    fn set_layout_property(&mut self, layer: &str, name: &str, value: &Value) -> Result<(), MapError> {
        self.inner
            .set_layout_property(layer, name, &to_js(value)?)
            .map_err(js_error)
    }

    fn camera(&self) -> CameraState {
        let center = self.inner.get_center();
        CameraState {
            center: LngLat {
                lng: center.lng(),
                lat: center.lat(),
            },
            zoom: self.inner.get_zoom(),
            pitch: self.inner.get_pitch(),
            bearing: self.inner.get_bearing(),
        }
    }

    fn jump_to(&mut self, camera: &CameraState) -> Result<(), MapError> {
        self.inner
            .jump_to(&to_js(&camera_options(camera))?)
            .map_err(js_error)
    }

    fn ease_to(&mut self, options: &EaseOptions) -> Result<(), MapError> {
        self.inner.ease_to(&to_js(options)?).map_err(js_error)
    }
}
