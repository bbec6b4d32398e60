//! Map strategies: one (projection, mode) style configuration each.
use peaceboard_shared::models::{MapMode, Projection};
use peaceboard_shared::ramp;
use serde_json::{json, Map, Value};

use super::backend::{EaseOptions, MapBackend, MapError};
use super::object;
use super::style::{self, StyleDocument};

/// Duration of the camera ease after a strategy's own style reload.
pub const SETTLE_EASE_MS: u32 = 2000;
pub const GLOBE_PITCH: f64 = 55.0;

/// Outcome of [`MapStrategy::configure_map`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Configured {
    Done,
    /// The strategy replaced the style; finish with
    /// [`MapStrategy::after_style_reload`] on the next style load.
    AwaitingReload,
}

/// Layout and paint fragments shared by every label layer.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelConfig {
    pub layout: Map<String, Value>,
    pub background_paint: Map<String, Value>,
    pub foreground_paint: Map<String, Value>,
}

impl LabelConfig {
    /// "{name}\n{round(pct)}% for peace", coloured along the peace ramp.
    pub fn base() -> Self {
        LabelConfig {
            layout: object(json!({
                "text-field": [
                    "format",
                    ["get", "name"],
                    { "font-scale": 1.4 },
                    "\n",
                    {},
                    [
                        "case",
                        ["has", "peacePercentage"],
                        ["concat", ["to-string", ["round", ["get", "peacePercentage"]]], "% for peace"],
                        "0% for peace"
                    ],
                    { "font-scale": 1.2 }
                ],
                "text-font": ["Open Sans Bold"],
                "text-size": 24,
                "text-anchor": "center",
                "text-justify": "center",
                "text-radial-offset": 0.5,
                "text-variable-anchor": ["center", "top", "bottom", "left", "right"],
                "text-allow-overlap": true,
                "text-ignore-placement": true,
                "symbol-placement": "point",
                "symbol-sort-key": ["get", "peacePercentage"]
            })),
            background_paint: object(json!({
                "text-color": "#ffffff",
                "text-halo-color": "#000000",
                "text-halo-width": 4,
                "text-opacity": 1
            })),
            foreground_paint: object(json!({
                "text-color": ramp::ramp_expression("peacePercentage"),
                "text-opacity": 1
            })),
        }
    }

    fn with_layout(mut self, key: &str, value: Value) -> Self {
        self.layout.insert(key.to_string(), value);
        self
    }

    fn with_background(mut self, key: &str, value: Value) -> Self {
        self.background_paint.insert(key.to_string(), value);
        self
    }

    pub fn text_size(&self) -> Option<f64> {
        self.layout.get("text-size").and_then(Value::as_f64)
    }
}

impl Default for LabelConfig {
    fn default() -> Self {
        LabelConfig::base()
    }
}

pub trait MapStrategy {
    fn projection(&self) -> Projection;
    fn mode(&self) -> MapMode;

    /// Fresh copy of the style document for this strategy.
    fn style_spec(&self) -> StyleDocument;

    /// Called once the strategy's style (or the initial style) has loaded.
    fn configure_map(&self, map: &mut dyn MapBackend) -> Result<Configured, MapError>;

    fn after_style_reload(&self, _map: &mut dyn MapBackend) -> Result<(), MapError> {
        Ok(())
    }

    fn label_config(&self) -> LabelConfig {
        LabelConfig::base()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MercatorStrategy {
    mode: MapMode,
}

impl MercatorStrategy {
    pub fn new(mode: MapMode) -> Self {
        MercatorStrategy { mode }
    }
}

impl MapStrategy for MercatorStrategy {
    fn projection(&self) -> Projection {
        Projection::Mercator
    }

    fn mode(&self) -> MapMode {
        self.mode
    }

    fn style_spec(&self) -> StyleDocument {
        let mut style = style::styled(Projection::Mercator, self.mode);
        style.set("projection", json!({ "type": "mercator" }));
        style.strip(&["fog", "light", "sky"]);
        style
    }

    fn configure_map(&self, map: &mut dyn MapBackend) -> Result<Configured, MapError> {
        tracing::debug!(mode = %self.mode, "configuring mercator map");
        map.set_style(&self.style_spec())?;
        Ok(Configured::AwaitingReload)
    }

    fn after_style_reload(&self, map: &mut dyn MapBackend) -> Result<(), MapError> {
        map.ease_to(&EaseOptions {
            pitch: Some(0.0),
            bearing: Some(0.0),
            duration: SETTLE_EASE_MS,
            essential: true,
        })
    }

    fn label_config(&self) -> LabelConfig {
        LabelConfig::base()
            .with_layout("text-size", json!(20))
            .with_layout("text-radial-offset", json!(0.3))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlobeStrategy {
    mode: MapMode,
}

impl GlobeStrategy {
    pub fn new(mode: MapMode) -> Self {
        GlobeStrategy { mode }
    }
}

impl MapStrategy for GlobeStrategy {
    fn projection(&self) -> Projection {
        Projection::Globe
    }

    fn mode(&self) -> MapMode {
        self.mode
    }

    fn style_spec(&self) -> StyleDocument {
        style::styled(Projection::Globe, self.mode)
    }

    fn configure_map(&self, map: &mut dyn MapBackend) -> Result<Configured, MapError> {
        tracing::debug!(mode = %self.mode, "configuring globe map");
        map.set_style(&self.style_spec())?;
        Ok(Configured::AwaitingReload)
    }

    fn after_style_reload(&self, map: &mut dyn MapBackend) -> Result<(), MapError> {
        map.ease_to(&EaseOptions {
            pitch: Some(GLOBE_PITCH),
            bearing: None,
            duration: SETTLE_EASE_MS,
            essential: true,
        })
    }

    fn label_config(&self) -> LabelConfig {
        LabelConfig::base()
            .with_layout("text-size", json!(28))
            .with_layout("text-radial-offset", json!(0.8))
            .with_background("text-halo-width", json!(5))
    }
}

pub fn strategy_for(projection: Projection, mode: MapMode) -> Box<dyn MapStrategy> {
    match projection {
        Projection::Mercator => Box::new(MercatorStrategy::new(mode)),
        Projection::Globe => Box::new(GlobeStrategy::new(mode)),
    }
}
