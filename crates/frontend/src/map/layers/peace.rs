use peaceboard_shared::models::{Feature, FeatureCollection, MapMode};
use peaceboard_shared::ramp;
use serde_json::json;

use super::{
    remove_ids, set_layers_visibility, ApplyOutcome, DataUpdate, LayerState, LayerStrategy,
    Lifecycle,
};
use crate::map::backend::{GeoJsonSource, LayerKind, LayerSpec, MapBackend, MapError};
use crate::map::object;
use crate::map::strategy::{LabelConfig, MapStrategy};

/// Country choropleth by peace percentage, with borders and two-pass labels.
pub struct PeaceLayer {
    id: String,
    source_id: String,
    data: FeatureCollection,
    lifecycle: Lifecycle,
    labels: Option<LabelConfig>,
}

/// Merge key: `iso`, or `name` for features without one.
fn feature_key(feature: &Feature) -> Option<&str> {
    feature.prop_str("iso").or_else(|| feature.prop_str("name"))
}

impl PeaceLayer {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, data: FeatureCollection) -> Self {
        PeaceLayer {
            id: id.into(),
            source_id: source_id.into(),
            data,
            lifecycle: Lifecycle::default(),
            labels: None,
        }
    }

    pub fn data(&self) -> &FeatureCollection {
        &self.data
    }

    fn fill_id(&self) -> String {
        format!("{}-fill", self.id)
    }

    fn layer_ids(&self) -> [String; 4] {
        [
            self.fill_id(),
            format!("{}-border", self.id),
            format!("{}-label-bg", self.id),
            format!("{}-label", self.id),
        ]
    }

    /// Replace features with a matching key, append the rest.
    fn merge(&mut self, features: Vec<Feature>) {
        for feature in features {
            let existing = feature_key(&feature).and_then(|key| {
                self.data
                    .features
                    .iter()
                    .position(|f| feature_key(f) == Some(key))
            });
            match existing {
                Some(i) => self.data.features[i] = feature,
                None => self.data.features.push(feature),
            }
        }
    }

    fn apply_with_labels(&mut self, map: &mut dyn MapBackend) -> ApplyOutcome {
        if let Some(outcome) = self.lifecycle.gate(&*map, &self.id) {
            return outcome;
        }

        if self.lifecycle.initialized && map.has_source(&self.source_id) && map.has_layer(&self.fill_id()) {
            return ApplyOutcome::AlreadyApplied;
        }

        remove_ids(map, &self.layer_ids(), std::slice::from_ref(&self.source_id));
        self.lifecycle.initialized = false;

        match self.add_to_map(map) {
            Ok(()) => {
                self.lifecycle.initialized = true;
                tracing::debug!(layer = %self.id, countries = self.data.len(), "peace layer applied");
                ApplyOutcome::Applied
            }
            Err(e) => {
                tracing::error!(layer = %self.id, error = %e, "failed to apply peace layer");
                self.lifecycle.failed(&*map)
            }
        }
    }

    fn add_to_map(&self, map: &mut dyn MapBackend) -> Result<(), MapError> {
        map.add_source(&self.source_id, &GeoJsonSource::new(self.data.clone()))?;

        let visible = self.lifecycle.visible;
        let [fill, border, label_bg, label] = self.layer_ids();
        map.add_layer(
            &LayerSpec::new(fill, LayerKind::Fill, self.source_id.clone())
                .visibility(visible)
                .paint(object(json!({
                    "fill-color": ramp::ramp_expression("peacePercentage"),
                    "fill-opacity": 0.6
                }))),
        )?;
        map.add_layer(
            &LayerSpec::new(border, LayerKind::Line, self.source_id.clone())
                .visibility(visible)
                .paint(object(json!({
                    "line-color": "#000000",
                    "line-width": 1,
                    "line-opacity": 0.5
                }))),
        )?;

        let labels = self.labels.clone().unwrap_or_default();
        for (id, paint) in [(label_bg, labels.background_paint), (label, labels.foreground_paint)] {
            map.add_layer(
                &LayerSpec::new(id, LayerKind::Symbol, self.source_id.clone())
                    .visibility(visible)
                    .layout(labels.layout.clone())
                    .paint(paint),
            )?;
        }
        Ok(())
    }
}

impl LayerStrategy for PeaceLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, map: &mut dyn MapBackend, strategy: &dyn MapStrategy) -> ApplyOutcome {
        self.labels = Some(strategy.label_config());
        self.apply_with_labels(map)
    }

    fn remove(&mut self, map: &mut dyn MapBackend) {
        remove_ids(map, &self.layer_ids(), std::slice::from_ref(&self.source_id));
        self.lifecycle.initialized = false;
    }

    fn update_data(
        &mut self,
        map: &mut dyn MapBackend,
        features: Vec<Feature>,
        _now_ms: f64,
    ) -> DataUpdate {
        if features.is_empty() {
            return DataUpdate::Ignored;
        }
        self.merge(features);

        if !self.lifecycle.initialized || !map.is_style_loaded() || !map.has_source(&self.source_id) {
            return DataUpdate::Deferred;
        }
        match map.set_source_data(&self.source_id, &self.data) {
            Ok(()) => DataUpdate::Pushed,
            Err(e) => {
                tracing::error!(layer = %self.id, error = %e, "failed to push peace data");
                DataUpdate::Deferred
            }
        }
    }

    fn is_compatible_with(&self, strategy: &dyn MapStrategy) -> bool {
        strategy.mode() == MapMode::Peace
    }

    fn buffer_data(&mut self, features: Vec<Feature>) {
        self.merge(features);
    }

    fn set_visibility(&mut self, map: Option<&mut dyn MapBackend>, visible: bool) {
        self.lifecycle.visible = visible;
        if let (Some(map), true) = (map, self.lifecycle.initialized) {
            set_layers_visibility(map, &self.layer_ids(), visible);
        }
    }

    fn state(&self) -> LayerState {
        self.lifecycle.state()
    }

    fn style_loaded(&mut self) {
        self.lifecycle.style_loaded();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::fake::FakeMap;
    use crate::map::strategy::{GlobeStrategy, MercatorStrategy};
    use peaceboard_shared::peace;
    use serde_json::Map;

    fn country(name: &str, iso: Option<&str>, pct: f64) -> Feature {
        let mut props = Map::new();
        props.insert("name".into(), json!(name));
        if let Some(iso) = iso {
            props.insert("iso".into(), json!(iso));
        }
        props.insert("peacePercentage".into(), json!(pct));
        Feature::rectangle([0.0, 0.0], [1.0, 1.0], props)
    }

    fn applied(map: &mut FakeMap) -> PeaceLayer {
        let mut layer = PeaceLayer::new("peace", "peace-src", peace::sample_countries());
        assert_eq!(
            layer.apply(map, &MercatorStrategy::new(MapMode::Peace)),
            ApplyOutcome::Applied
        );
        layer
    }

    #[test]
    fn test_apply_adds_fill_border_and_labels() {
        let mut map = FakeMap::ready();
        applied(&mut map);
        assert_eq!(
            map.layer_ids(),
            ["peace-fill", "peace-border", "peace-label-bg", "peace-label"]
        );
        assert_eq!(map.source_ids(), ["peace-src"]);
        assert_eq!(map.source_len("peace-src"), Some(10));
        assert_eq!(map.layer("peace-label").unwrap().layout["text-size"], 20);
    }

    #[test]
    fn test_apply_twice_never_duplicates() {
        let mut map = FakeMap::ready();
        let mut layer = applied(&mut map);
        let outcome = layer.apply(&mut map, &MercatorStrategy::new(MapMode::Peace));
        assert_eq!(outcome, ApplyOutcome::AlreadyApplied);
        assert_eq!(map.layer_ids().len(), 4);
        assert_eq!(map.source_ids().len(), 1);
    }

    #[test]
    fn test_reapply_after_external_removal() {
        let mut map = FakeMap::ready();
        let mut layer = applied(&mut map);
        map.remove_layer("peace-fill").unwrap();
        let outcome = layer.apply(&mut map, &GlobeStrategy::new(MapMode::Peace));
        assert_eq!(outcome, ApplyOutcome::Applied);
        assert_eq!(map.layer_ids().len(), 4);
        assert_eq!(map.layer("peace-label-bg").unwrap().paint["text-halo-width"], 5);
    }

    #[test]
    fn test_update_merges_by_iso_then_name() {
        let mut map = FakeMap::ready();
        let mut layer = PeaceLayer::new(
            "peace",
            "peace-src",
            FeatureCollection::new(vec![
                country("Norway", Some("NOR"), 10.0),
                country("Atlantis", None, 5.0),
            ]),
        );
        layer.apply(&mut map, &MercatorStrategy::new(MapMode::Peace));

        let update = layer.update_data(
            &mut map,
            vec![
                country("Kingdom of Norway", Some("NOR"), 40.0),
                country("Atlantis", None, 55.0),
                country("Sweden", Some("SWE"), 20.0),
            ],
            0.0,
        );
        assert_eq!(update, DataUpdate::Pushed);

        let data = layer.data();
        assert_eq!(data.len(), 3);
        assert_eq!(data.features[0].prop_str("name"), Some("Kingdom of Norway"));
        assert_eq!(data.features[0].prop_f64("peacePercentage"), Some(40.0));
        assert_eq!(data.features[1].prop_f64("peacePercentage"), Some(55.0));
        assert_eq!(data.features[2].prop_str("iso"), Some("SWE"));
        assert_eq!(map.source_len("peace-src"), Some(3));
    }

    #[test]
    fn test_update_before_apply_is_kept() {
        let mut map = FakeMap::ready();
        let mut layer = PeaceLayer::new("peace", "peace-src", FeatureCollection::default());
        let update = layer.update_data(&mut map, vec![country("Norway", Some("NOR"), 1.0)], 0.0);
        assert_eq!(update, DataUpdate::Deferred);
        layer.apply(&mut map, &MercatorStrategy::new(MapMode::Peace));
        assert_eq!(map.source_len("peace-src"), Some(1));
    }

    #[test]
    fn test_hidden_before_apply_adds_hidden_layers() {
        let mut map = FakeMap::ready();
        let mut layer = PeaceLayer::new("peace", "peace-src", peace::sample_countries());
        layer.set_visibility(None, false);
        assert!(!layer.state().visible);
        layer.apply(&mut map, &MercatorStrategy::new(MapMode::Peace));
        for id in map.layer_ids() {
            assert_eq!(map.layer(&id).unwrap().layout["visibility"], "none", "{id}");
        }
    }

    #[test]
    fn test_buffered_data_merges_before_apply() {
        let mut map = FakeMap::ready();
        let mut layer = PeaceLayer::new("peace", "peace-src", FeatureCollection::default());
        layer.buffer_data(vec![country("Germany", Some("DEU"), 5.0)]);
        layer.buffer_data(vec![country("Germany", Some("DEU"), 8.0)]);
        layer.apply(&mut map, &MercatorStrategy::new(MapMode::Peace));
        assert_eq!(map.source_len("peace-src"), Some(1));
        assert_eq!(layer.data().features[0].prop_f64("peacePercentage"), Some(8.0));
    }

    #[test]
    fn test_requires_peace_mode() {
        let layer = PeaceLayer::new("peace", "peace-src", FeatureCollection::default());
        assert!(layer.is_compatible_with(&GlobeStrategy::new(MapMode::Peace)));
        assert!(!layer.is_compatible_with(&MercatorStrategy::new(MapMode::Heat)));
    }

    #[test]
    fn test_remove_is_safe_when_absent() {
        let mut map = FakeMap::ready();
        let mut layer = PeaceLayer::new("peace", "peace-src", FeatureCollection::default());
        layer.remove(&mut map);
        assert!(map.layer_ids().is_empty());
        assert_eq!(map.failed_calls, 0);
    }

    #[test]
    fn test_hidden_layers_stay_hidden_on_reapply() {
        let mut map = FakeMap::ready();
        let mut layer = applied(&mut map);
        layer.set_visibility(Some(&mut map), false);
        layer.remove(&mut map);
        layer.apply(&mut map, &MercatorStrategy::new(MapMode::Peace));
        assert_eq!(map.layer("peace-border").unwrap().layout["visibility"], "none");
    }
}
