//! Style documents keyed by (projection, mode).
use peaceboard_shared::models::{MapMode, Projection};
use serde_json::{json, Value};

const TILES_URL: &str = "https://demotiles.maplibre.org/tiles/tiles.json";
const GLYPHS_URL: &str = "https://demotiles.maplibre.org/font/{fontstack}/{range}.pbf";

/// A complete MapLibre style. Immutable once handed to the map; a change of
/// projection or mode builds a new one.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleDocument(Value);

impl StyleDocument {
    pub fn new(value: Value) -> Self {
        StyleDocument(value)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn has(&self, key: &str) -> bool {
        self.0.get(key).is_some()
    }

    pub fn projection_type(&self) -> Option<&str> {
        self.0.pointer("/projection/type").and_then(Value::as_str)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.0["layers"]
            .as_array()
            .map(|layers| layers.iter().filter_map(|l| l["id"].as_str()).collect())
            .unwrap_or_default()
    }

    pub fn set(&mut self, key: &str, value: Value) {
        if let Some(obj) = self.0.as_object_mut() {
            obj.insert(key.to_string(), value);
        }
    }

    pub fn strip(&mut self, keys: &[&str]) {
        if let Some(obj) = self.0.as_object_mut() {
            for key in keys {
                obj.remove(*key);
            }
        }
    }

    /// Blank every source attribution.
    pub fn clear_attributions(&mut self) {
        if let Some(sources) = self.0.get_mut("sources").and_then(Value::as_object_mut) {
            for source in sources.values_mut() {
                if let Some(src) = source.as_object_mut() {
                    if src.contains_key("attribution") {
                        src.insert("attribution".into(), json!(""));
                    }
                }
            }
        }
    }
}

struct Palette {
    background: &'static str,
    land: &'static str,
    border: &'static str,
}

const HEAT_PALETTE: Palette = Palette {
    background: "#050b16",
    land: "#142235",
    border: "#2c4a6e",
};

const PEACE_PALETTE: Palette = Palette {
    background: "#0b1f33",
    land: "#d9d4c7",
    border: "#6b6b6b",
};

/// The static base document for one combination.
pub fn base_style(projection: Projection, mode: MapMode) -> StyleDocument {
    let palette = match mode {
        MapMode::Heat => &HEAT_PALETTE,
        MapMode::Peace => &PEACE_PALETTE,
    };
    let mut style = json!({
        "version": 8,
        "name": format!("peaceboard-{projection}-{mode}"),
        "glyphs": GLYPHS_URL,
        "sources": {
            "maplibre": {
                "type": "vector",
                "url": TILES_URL,
                "attribution": "MapLibre"
            }
        },
        "layers": [
            {
                "id": "background",
                "type": "background",
                "paint": { "background-color": palette.background }
            },
            {
                "id": "countries-fill",
                "type": "fill",
                "source": "maplibre",
                "source-layer": "countries",
                "paint": { "fill-color": palette.land, "fill-opacity": 0.9 }
            },
            {
                "id": "countries-boundary",
                "type": "line",
                "source": "maplibre",
                "source-layer": "countries",
                "paint": {
                    "line-color": palette.border,
                    "line-width": ["interpolate", ["linear"], ["zoom"], 1, 0.5, 6, 1.5]
                }
            }
        ]
    });
    if projection == Projection::Globe {
        style["projection"] = json!({ "type": "globe" });
    }
    StyleDocument(style)
}

/// Base document with the per-combination adjustments: attributions blanked,
/// atmosphere added for the globe, 3D settings dropped for mercator.
pub fn styled(projection: Projection, mode: MapMode) -> StyleDocument {
    let mut style = base_style(projection, mode);
    style.clear_attributions();

    match projection {
        Projection::Globe => {
            let heat = mode == MapMode::Heat;
            style.set("projection", json!({ "type": "globe" }));
            style.set(
                "light",
                json!({
                    "anchor": "viewport",
                    "color": "white",
                    "intensity": if heat { 0.7 } else { 0.5 },
                    "position": [1.15, 210, 30]
                }),
            );
            style.set(
                "fog",
                json!({
                    "color": "rgb(186, 210, 235)",
                    "high-color": "rgb(36, 92, 223)",
                    "horizon-blend": if heat { 0.15 } else { 0.1 },
                    "space-color": "rgb(11, 11, 25)",
                    "star-intensity": if heat { 0.9 } else { 0.8 }
                }),
            );
            style.set(
                "transition",
                json!({ "duration": if heat { 1500 } else { 1000 }, "delay": 0 }),
            );
        }
        Projection::Mercator => style.strip(&["projection", "light", "fog"]),
    }

    style.set("version", json!(8));
    style
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_styles_share_layer_ids() {
        for projection in [Projection::Globe, Projection::Mercator] {
            for mode in [MapMode::Heat, MapMode::Peace] {
                let style = base_style(projection, mode);
                assert_eq!(
                    style.layer_ids(),
                    ["background", "countries-fill", "countries-boundary"]
                );
            }
        }
    }

    #[test]
    fn test_globe_gets_atmosphere_tuned_per_mode() {
        let heat = styled(Projection::Globe, MapMode::Heat);
        let peace = styled(Projection::Globe, MapMode::Peace);
        assert_eq!(heat.projection_type(), Some("globe"));
        assert_eq!(heat.get("light").unwrap()["intensity"], 0.7);
        assert_eq!(peace.get("light").unwrap()["intensity"], 0.5);
        assert_eq!(heat.get("fog").unwrap()["star-intensity"], 0.9);
        assert_eq!(peace.get("transition").unwrap()["duration"], 1000);
    }

    #[test]
    fn test_mercator_drops_3d_settings() {
        let style = styled(Projection::Mercator, MapMode::Peace);
        assert!(!style.has("projection"));
        assert!(!style.has("fog"));
        assert!(!style.has("light"));
        assert_eq!(style.get("version").unwrap(), 8);
    }

    #[test]
    fn test_attributions_are_blanked() {
        let style = styled(Projection::Mercator, MapMode::Heat);
        assert_eq!(style.as_value()["sources"]["maplibre"]["attribution"], "");
    }
}
