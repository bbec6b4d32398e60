//! Layer strategies: one visual layer each, owning its sources and data.
mod heatmap;
mod peace;

pub use heatmap::{HeatmapLayer, DEBOUNCE_MS, DEFAULT_MAX_POINTS, SETTLE_MS};
pub use peace::PeaceLayer;

use peaceboard_shared::models::{Feature, FeatureCollection};

use super::backend::MapBackend;
use super::strategy::MapStrategy;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerState {
    pub initialized: bool,
    pub visible: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    Applied,
    /// Sources and layers were already on the map.
    AlreadyApplied,
    /// Style not loaded; retried on the next style load.
    Deferred,
    Failed,
}

/// What `update_data` did with a batch.
#[derive(Debug, Clone, PartialEq)]
pub enum DataUpdate {
    /// Empty batch.
    Ignored,
    /// Map is moving; held until motion settles.
    Queued,
    Pushed,
    /// Buffered; the layer is not on the map yet.
    Deferred,
    /// Buffered; the caller must fire the timer to flush.
    Scheduled(Timer),
    /// Buffered; an already scheduled flush will carry it.
    Coalesced,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerTask {
    /// Trailing debounced push of buffered data.
    FlushData,
    /// Motion has been over for a while. Stale once another motion starts.
    MotionSettled { epoch: u64 },
}

/// Deferred work a layer asks its owner to run after `delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Timer {
    pub layer_id: String,
    pub task: TimerTask,
    pub delay_ms: u32,
}

pub trait LayerStrategy {
    fn id(&self) -> &str;

    /// Add sources and layers. Idempotent while they are still on the map.
    fn apply(&mut self, map: &mut dyn MapBackend, strategy: &dyn MapStrategy) -> ApplyOutcome;

    /// Delete everything this layer may have created and reset its state.
    fn remove(&mut self, map: &mut dyn MapBackend);

    fn update_data(
        &mut self,
        map: &mut dyn MapBackend,
        features: Vec<Feature>,
        now_ms: f64,
    ) -> DataUpdate;

    /// Keep a batch while there is no map; it goes out with the first apply.
    fn buffer_data(&mut self, features: Vec<Feature>);

    /// Replace the country shapes a layer labels. Layers without labels of
    /// their own ignore it.
    fn update_countries(&mut self, _map: Option<&mut dyn MapBackend>, _countries: &FeatureCollection) {}

    fn is_compatible_with(&self, strategy: &dyn MapStrategy) -> bool;

    /// Record visibility; touches the map only once the layer is on it.
    fn set_visibility(&mut self, map: Option<&mut dyn MapBackend>, visible: bool);

    fn state(&self) -> LayerState;

    /// The map finished loading a style; clears any pending deferral.
    fn style_loaded(&mut self);

    fn on_move_start(&mut self) {}

    fn on_move_end(&mut self) -> Option<Timer> {
        None
    }

    fn run_task(&mut self, _map: &mut dyn MapBackend, _task: TimerTask, _now_ms: f64) -> Option<Timer> {
        None
    }
}

/// Initialization bookkeeping shared by the layer strategies.
#[derive(Debug, Clone)]
struct Lifecycle {
    initialized: bool,
    visible: bool,
    style_loaded_once: bool,
    pending_initialization: bool,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Lifecycle {
            initialized: false,
            visible: true,
            style_loaded_once: false,
            pending_initialization: false,
        }
    }
}

impl Lifecycle {
    /// `Some(Deferred)` when layer work has to wait for a style load.
    fn gate(&mut self, map: &dyn MapBackend, id: &str) -> Option<ApplyOutcome> {
        if self.pending_initialization {
            tracing::debug!(layer = id, "already waiting for style load");
            return Some(ApplyOutcome::Deferred);
        }
        if !map.is_style_loaded() {
            if self.style_loaded_once {
                tracing::debug!(layer = id, "style unloaded since last apply");
                self.style_loaded_once = false;
                self.initialized = false;
            }
            self.pending_initialization = true;
            return Some(ApplyOutcome::Deferred);
        }
        self.style_loaded_once = true;
        None
    }

    fn style_loaded(&mut self) {
        self.pending_initialization = false;
        self.style_loaded_once = true;
    }

    /// Record a failed add; defers when the failure was an unloaded style.
    fn failed(&mut self, map: &dyn MapBackend) -> ApplyOutcome {
        self.initialized = false;
        if map.is_style_loaded() {
            ApplyOutcome::Failed
        } else {
            self.pending_initialization = true;
            ApplyOutcome::Deferred
        }
    }

    fn state(&self) -> LayerState {
        LayerState {
            initialized: self.initialized,
            visible: self.visible,
        }
    }
}

/// Remove layers then sources, each only if present. Errors are logged.
fn remove_ids(map: &mut dyn MapBackend, layer_ids: &[String], source_ids: &[String]) {
    for id in layer_ids {
        if map.has_layer(id) {
            if let Err(e) = map.remove_layer(id) {
                tracing::error!(layer = %id, error = %e, "failed to remove layer");
            }
        }
    }
    for id in source_ids {
        if map.has_source(id) {
            if let Err(e) = map.remove_source(id) {
                tracing::error!(source = %id, error = %e, "failed to remove source");
            }
        }
    }
}

fn set_layers_visibility(map: &mut dyn MapBackend, layer_ids: &[String], visible: bool) {
    let value = super::backend::visibility_value(visible);
    for id in layer_ids {
        if map.has_layer(id) {
            if let Err(e) = map.set_layout_property(id, "visibility", &value) {
                tracing::error!(layer = %id, error = %e, "failed to set visibility");
            }
        }
    }
}
