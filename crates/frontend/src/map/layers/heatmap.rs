use peaceboard_shared::models::{Feature, FeatureCollection};
use serde_json::{json, Map, Value};

use super::{
    remove_ids, set_layers_visibility, ApplyOutcome, DataUpdate, LayerState, LayerStrategy,
    Lifecycle, Timer, TimerTask,
};
use crate::map::backend::{GeoJsonSource, LayerKind, LayerSpec, MapBackend, MapError};
use crate::map::object;
use crate::map::strategy::{LabelConfig, MapStrategy};

pub const DEFAULT_MAX_POINTS: usize = 2000;
/// Minimum interval between two source pushes.
pub const DEBOUNCE_MS: u32 = 200;
/// Quiet time after `moveend` before queued batches flush.
pub const SETTLE_MS: u32 = 500;

/// Activity points as a heatmap, with circles at high zoom and optional
/// country labels.
pub struct HeatmapLayer {
    id: String,
    source_id: String,
    data: FeatureCollection,
    countries: Option<FeatureCollection>,
    max_points: usize,
    lifecycle: Lifecycle,
    labels: Option<LabelConfig>,
    moving: bool,
    motion_epoch: u64,
    queue: Vec<Vec<Feature>>,
    flush_pending: bool,
    last_push_ms: Option<f64>,
    /// Buffered data has not reached the map source.
    dirty: bool,
}

impl HeatmapLayer {
    pub fn new(id: impl Into<String>, source_id: impl Into<String>, data: FeatureCollection) -> Self {
        HeatmapLayer {
            id: id.into(),
            source_id: source_id.into(),
            data,
            countries: None,
            max_points: DEFAULT_MAX_POINTS,
            lifecycle: Lifecycle::default(),
            labels: None,
            moving: false,
            motion_epoch: 0,
            queue: Vec::new(),
            flush_pending: false,
            last_push_ms: None,
            dirty: false,
        }
    }

    /// Label countries on top of the heat.
    pub fn with_countries(mut self, countries: FeatureCollection) -> Self {
        self.countries = Some(countries);
        self
    }

    pub fn with_max_points(mut self, max_points: usize) -> Self {
        self.max_points = max_points.max(1);
        self
    }

    pub fn data(&self) -> &FeatureCollection {
        &self.data
    }

    pub fn queued_batches(&self) -> usize {
        self.queue.len()
    }

    fn point_id(&self) -> String {
        format!("{}-point", self.id)
    }

    fn countries_source_id(&self) -> String {
        format!("{}-countries", self.source_id)
    }

    fn label_ids(&self) -> [String; 2] {
        [
            format!("{}-country-labels-bg", self.id),
            format!("{}-country-labels", self.id),
        ]
    }

    fn all_layer_ids(&self) -> Vec<String> {
        let [bg, fg] = self.label_ids();
        vec![self.id.clone(), self.point_id(), fg, bg]
    }

    fn source_ids(&self) -> Vec<String> {
        vec![self.source_id.clone(), self.countries_source_id()]
    }

    fn apply_with_labels(&mut self, map: &mut dyn MapBackend) -> ApplyOutcome {
        if let Some(outcome) = self.lifecycle.gate(&*map, &self.id) {
            if outcome == ApplyOutcome::Deferred {
                self.dirty = true;
            }
            return outcome;
        }

        if self.lifecycle.initialized && map.has_source(&self.source_id) && map.has_layer(&self.id) {
            if self.dirty {
                self.push_source(map);
            }
            return ApplyOutcome::AlreadyApplied;
        }

        tracing::debug!(layer = %self.id, points = self.data.len(), "applying heatmap layer");
        remove_ids(map, &self.all_layer_ids(), &self.source_ids());
        self.lifecycle.initialized = false;

        match self.add_to_map(map) {
            Ok(()) => {
                self.lifecycle.initialized = true;
                self.dirty = false;
                ApplyOutcome::Applied
            }
            Err(e) => {
                tracing::error!(layer = %self.id, error = %e, "failed to apply heatmap layer");
                self.lifecycle.failed(&*map)
            }
        }
    }

    fn add_to_map(&self, map: &mut dyn MapBackend) -> Result<(), MapError> {
        let mut source = GeoJsonSource::new(self.data.clone());
        source.generate_id = false;
        source.buffer = Some(256);
        source.tolerance = Some(0.5);
        source.cluster = Some(false);
        map.add_source(&self.source_id, &source)?;

        if let Some(countries) = &self.countries {
            map.add_source(&self.countries_source_id(), &GeoJsonSource::new(countries.clone()))?;
        }

        map.add_layer(
            &LayerSpec::new(self.id.clone(), LayerKind::Heatmap, self.source_id.clone())
                .visibility(self.lifecycle.visible)
                .maxzoom(9.0)
                .paint(heatmap_paint()),
        )?;
        map.add_layer(
            &LayerSpec::new(self.point_id(), LayerKind::Circle, self.source_id.clone())
                .visibility(self.lifecycle.visible)
                .minzoom(7.0)
                .paint(point_paint()),
        )?;

        if self.countries.is_some() {
            let labels = self.labels.clone().unwrap_or_default();
            let [bg, fg] = self.label_ids();
            for (id, paint) in [(bg, labels.background_paint.clone()), (fg, labels.foreground_paint.clone())] {
                map.add_layer(
                    &LayerSpec::new(id, LayerKind::Symbol, self.countries_source_id())
                        .visibility(self.lifecycle.visible)
                        .layout(labels.layout.clone())
                        .paint(paint),
                )?;
            }
        }
        Ok(())
    }

    /// Append, evicting the oldest points past `max_points`.
    fn buffer(&mut self, features: Vec<Feature>) {
        self.data.features.extend(features);
        let len = self.data.features.len();
        if len > self.max_points {
            let excess = len - self.max_points;
            self.data.features.drain(..excess);
            tracing::debug!(layer = %self.id, excess, "evicted oldest points");
        }
        self.dirty = true;
    }

    fn update_immediate(
        &mut self,
        map: &mut dyn MapBackend,
        features: Vec<Feature>,
        now_ms: f64,
    ) -> DataUpdate {
        self.buffer(features);

        if !self.lifecycle.initialized {
            return match self.apply_with_labels(map) {
                ApplyOutcome::Applied | ApplyOutcome::AlreadyApplied => {
                    self.last_push_ms = Some(now_ms);
                    DataUpdate::Pushed
                }
                ApplyOutcome::Deferred | ApplyOutcome::Failed => DataUpdate::Deferred,
            };
        }

        if !map.is_style_loaded() {
            return DataUpdate::Deferred;
        }

        let too_soon = self
            .last_push_ms
            .is_some_and(|last| now_ms - last < f64::from(DEBOUNCE_MS));
        if self.flush_pending {
            return DataUpdate::Coalesced;
        }
        if too_soon {
            self.flush_pending = true;
            return DataUpdate::Scheduled(self.timer(TimerTask::FlushData, DEBOUNCE_MS));
        }

        self.push_source(map);
        self.last_push_ms = Some(now_ms);
        DataUpdate::Pushed
    }

    fn push_source(&mut self, map: &mut dyn MapBackend) {
        if !map.has_source(&self.source_id) {
            tracing::debug!(layer = %self.id, "source missing, re-applying");
            self.apply_with_labels(map);
            return;
        }
        match map.set_source_data(&self.source_id, &self.data) {
            Ok(()) => self.dirty = false,
            Err(e) => tracing::error!(layer = %self.id, error = %e, "failed to push heatmap data"),
        }
    }

    fn timer(&self, task: TimerTask, delay_ms: u32) -> Timer {
        Timer {
            layer_id: self.id.clone(),
            task,
            delay_ms,
        }
    }
}

fn heatmap_paint() -> Map<String, Value> {
    object(json!({
        "heatmap-weight": ["interpolate", ["linear"], ["get", "mag"], 0, 0, 2, 0.3, 4, 0.6, 6, 1],
        "heatmap-intensity": ["interpolate", ["linear"], ["zoom"], 0, 2, 5, 3, 9, 5],
        "heatmap-color": [
            "interpolate", ["linear"], ["heatmap-density"],
            0, "rgba(0,0,255,0)",
            0.1, "royalblue",
            0.3, "cyan",
            0.5, "lime",
            0.7, "yellow",
            1, "red"
        ],
        "heatmap-radius": ["interpolate", ["linear"], ["zoom"], 0, 5, 3, 10, 6, 15, 9, 25],
        "heatmap-opacity": 0.75
    }))
}

fn point_paint() -> Map<String, Value> {
    object(json!({
        "circle-radius": [
            "interpolate", ["linear"], ["zoom"],
            7, ["interpolate", ["linear"], ["get", "mag"], 1, 1, 6, 6],
            16, ["interpolate", ["linear"], ["get", "mag"], 1, 10, 6, 60]
        ],
        "circle-color": [
            "interpolate", ["linear"], ["get", "mag"],
            1, "royalblue",
            2, "cyan",
            3, "lime",
            4, "yellow",
            5, "orange",
            6, "red"
        ],
        "circle-stroke-color": "white",
        "circle-stroke-width": 1,
        "circle-opacity": ["interpolate", ["linear"], ["zoom"], 7, 0, 8, 0.5, 9, 1]
    }))
}

impl LayerStrategy for HeatmapLayer {
    fn id(&self) -> &str {
        &self.id
    }

    fn apply(&mut self, map: &mut dyn MapBackend, strategy: &dyn MapStrategy) -> ApplyOutcome {
        self.labels = Some(strategy.label_config());
        self.apply_with_labels(map)
    }

    fn remove(&mut self, map: &mut dyn MapBackend) {
        remove_ids(map, &self.all_layer_ids(), &self.source_ids());
        self.lifecycle.initialized = false;
        self.queue.clear();
    }

    fn update_data(
        &mut self,
        map: &mut dyn MapBackend,
        features: Vec<Feature>,
        now_ms: f64,
    ) -> DataUpdate {
        if features.is_empty() {
            return DataUpdate::Ignored;
        }
        if self.moving {
            tracing::debug!(layer = %self.id, points = features.len(), "map moving, queueing batch");
            self.queue.push(features);
            return DataUpdate::Queued;
        }
        self.update_immediate(map, features, now_ms)
    }

    fn is_compatible_with(&self, _strategy: &dyn MapStrategy) -> bool {
        true
    }

    fn buffer_data(&mut self, features: Vec<Feature>) {
        if !features.is_empty() {
            self.buffer(features);
        }
    }

    fn update_countries(&mut self, map: Option<&mut dyn MapBackend>, countries: &FeatureCollection) {
        let had_labels = self.countries.is_some();
        self.countries = Some(countries.clone());
        let Some(map) = map else {
            return;
        };
        if !self.lifecycle.initialized || !map.is_style_loaded() {
            return;
        }
        let source_id = self.countries_source_id();
        if had_labels && map.has_source(&source_id) {
            if let Err(e) = map.set_source_data(&source_id, countries) {
                tracing::error!(layer = %self.id, error = %e, "failed to push country labels");
            }
            return;
        }
        // Labels were never added; rebuild with them.
        self.lifecycle.initialized = false;
        self.apply_with_labels(map);
    }

    fn set_visibility(&mut self, map: Option<&mut dyn MapBackend>, visible: bool) {
        self.lifecycle.visible = visible;
        if let (Some(map), true) = (map, self.lifecycle.initialized) {
            set_layers_visibility(map, &self.all_layer_ids(), visible);
        }
    }

    fn state(&self) -> LayerState {
        self.lifecycle.state()
    }

    fn style_loaded(&mut self) {
        self.lifecycle.style_loaded();
    }

    fn on_move_start(&mut self) {
        self.moving = true;
        // Invalidates any settle timer already handed out.
        self.motion_epoch += 1;
    }

    fn on_move_end(&mut self) -> Option<Timer> {
        Some(self.timer(
            TimerTask::MotionSettled {
                epoch: self.motion_epoch,
            },
            SETTLE_MS,
        ))
    }

    fn run_task(&mut self, map: &mut dyn MapBackend, task: TimerTask, now_ms: f64) -> Option<Timer> {
        match task {
            TimerTask::FlushData => {
                self.flush_pending = false;
                self.last_push_ms = Some(now_ms);
                if self.moving {
                    tracing::debug!(layer = %self.id, "map started moving, skipping flush");
                } else if self.lifecycle.initialized && map.is_style_loaded() {
                    self.push_source(map);
                }
                None
            }
            TimerTask::MotionSettled { epoch } if epoch == self.motion_epoch => {
                self.moving = false;
                if self.queue.is_empty() {
                    return None;
                }
                let batches = std::mem::take(&mut self.queue);
                tracing::debug!(layer = %self.id, batches = batches.len(), "flushing queued batches");
                let features = batches.into_iter().flatten().collect();
                match self.update_immediate(map, features, now_ms) {
                    DataUpdate::Scheduled(timer) => Some(timer),
                    _ => None,
                }
            }
            TimerTask::MotionSettled { .. } => None,
        }
    }
}
