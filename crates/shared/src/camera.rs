//! Camera persistence codec. The browser side hands in a key lookup so the
//! parsing rules stay testable off-wasm.
use crate::models::{CameraState, LngLat};

pub const KEY_ZOOM: &str = "map_zoom";
pub const KEY_LAT: &str = "map_lat";
pub const KEY_LNG: &str = "map_lng";
pub const KEY_PITCH: &str = "map_pitch";
pub const KEY_BEARING: &str = "map_bearing";

/// Bergen, whole world in view.
pub const DEFAULT_CAMERA: CameraState = CameraState {
    center: LngLat {
        lng: 5.3266662,
        lat: 60.3804532,
    },
    zoom: 1.0,
    pitch: 0.0,
    bearing: 0.0,
};

impl Default for CameraState {
    fn default() -> Self {
        DEFAULT_CAMERA
    }
}

impl CameraState {
    pub fn is_finite(&self) -> bool {
        [
            self.center.lng,
            self.center.lat,
            self.zoom,
            self.pitch,
            self.bearing,
        ]
        .iter()
        .all(|v| v.is_finite())
    }

    /// Rebuild a camera from stored strings. Any missing, unparsable or
    /// non-finite entry discards the whole record.
    pub fn from_storage(mut get: impl FnMut(&str) -> Option<String>) -> CameraState {
        let mut read = |key: &str| -> f64 {
            get(key)
                .and_then(|raw| raw.trim().parse::<f64>().ok())
                .unwrap_or(f64::NAN)
        };
        let camera = CameraState {
            zoom: read(KEY_ZOOM),
            center: LngLat {
                lat: read(KEY_LAT),
                lng: read(KEY_LNG),
            },
            pitch: read(KEY_PITCH),
            bearing: read(KEY_BEARING),
        };
        if camera.is_finite() {
            camera
        } else {
            tracing::debug!("stored camera invalid, using default");
            DEFAULT_CAMERA
        }
    }

    pub fn storage_entries(&self) -> [(&'static str, String); 5] {
        [
            (KEY_ZOOM, self.zoom.to_string()),
            (KEY_LAT, self.center.lat.to_string()),
            (KEY_LNG, self.center.lng.to_string()),
            (KEY_PITCH, self.pitch.to_string()),
            (KEY_BEARING, self.bearing.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn stored(entries: &[(&str, &str)]) -> HashMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_roundtrip_through_storage() {
        let cam = CameraState {
            center: LngLat { lng: 12.5, lat: -33.25 },
            zoom: 3.0,
            pitch: 40.0,
            bearing: 15.0,
        };
        let store: HashMap<String, String> = cam
            .storage_entries()
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
        let loaded = CameraState::from_storage(|k| store.get(k).cloned());
        assert_eq!(loaded, cam);
    }

    #[test]
    fn test_empty_storage_gives_default() {
        let loaded = CameraState::from_storage(|_| None);
        assert_eq!(loaded, DEFAULT_CAMERA);
    }

    #[test]
    fn test_non_finite_value_gives_default() {
        for bad in ["NaN", "Infinity", "-inf", "abc", ""] {
            let store = stored(&[
                (KEY_ZOOM, "2"),
                (KEY_LAT, bad),
                (KEY_LNG, "10"),
                (KEY_PITCH, "0"),
                (KEY_BEARING, "0"),
            ]);
            let loaded = CameraState::from_storage(|k| store.get(k).cloned());
            assert_eq!(loaded, DEFAULT_CAMERA, "value {bad:?} should be rejected");
        }
    }

    #[test]
    fn test_default_matches_bergen() {
        assert_eq!(DEFAULT_CAMERA.zoom, 1.0);
        assert!((DEFAULT_CAMERA.center.lat - 60.38).abs() < 0.01);
        assert!((DEFAULT_CAMERA.center.lng - 5.33).abs() < 0.01);
        assert_eq!(DEFAULT_CAMERA.pitch, 0.0);
        assert_eq!(DEFAULT_CAMERA.bearing, 0.0);
    }
}
