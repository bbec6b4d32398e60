//! Owns the map instance and sequences style swaps with layer application.
//!
//! The controller never waits. Library events come in through
//! [`MapController::handle_event`]; timer requests from layers go back out to
//! the caller, who fires them later through [`MapController::run_timer`].
use peaceboard_shared::models::{CameraState, Feature, FeatureCollection};

use super::backend::{MapBackend, MapError, MapEvent};
use super::layers::{ApplyOutcome, DataUpdate, LayerState, LayerStrategy, Timer};
use super::strategy::{Configured, MapStrategy};
use super::style::StyleDocument;

/// What the next `style.load` completes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PendingLoad {
    /// The map's first style.
    Initial,
    /// A strategy swap; the camera from before the swap is restored.
    Swap { camera: CameraState },
    /// The strategy's own style replacement from `configure_map`.
    Reconfigure,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Uninitialized,
    AwaitingStyleLoad(PendingLoad),
    Ready,
}

pub struct MapController<M: MapBackend> {
    map: Option<M>,
    strategy: Box<dyn MapStrategy>,
    layers: Vec<Box<dyn LayerStrategy>>,
    phase: Phase,
}

impl<M: MapBackend> MapController<M> {
    pub fn new(strategy: Box<dyn MapStrategy>) -> Self {
        MapController {
            map: None,
            strategy,
            layers: Vec::new(),
            phase: Phase::Uninitialized,
        }
    }

    /// Build the map with the current strategy's style. A second call is a
    /// no-op.
    pub fn initialize<F>(&mut self, create: F) -> Result<(), MapError>
    where
        F: FnOnce(&StyleDocument) -> Result<M, MapError>,
    {
        if self.map.is_some() {
            tracing::warn!("map is already initialized");
            return Ok(());
        }
        let map = create(&self.strategy.style_spec())?;
        self.map = Some(map);
        self.phase = Phase::AwaitingStyleLoad(PendingLoad::Initial);
        Ok(())
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_ready(&self) -> bool {
        self.phase == Phase::Ready
    }

    pub fn strategy(&self) -> &dyn MapStrategy {
        self.strategy.as_ref()
    }

    pub fn map(&self) -> Option<&M> {
        self.map.as_ref()
    }

    pub fn map_mut(&mut self) -> Option<&mut M> {
        self.map.as_mut()
    }

    pub fn camera(&self) -> Option<CameraState> {
        self.map.as_ref().map(MapBackend::camera)
    }

    pub fn layer_ids(&self) -> Vec<&str> {
        self.layers.iter().map(|l| l.id()).collect()
    }

    pub fn layer_state(&self, id: &str) -> Option<LayerState> {
        self.layers.iter().find(|l| l.id() == id).map(|l| l.state())
    }

    /// Swap styles. A swap still waiting for its style load is superseded;
    /// the camera captured before the first pending swap is the one restored.
    pub fn set_strategy(&mut self, strategy: Box<dyn MapStrategy>) {
        tracing::info!(
            projection = %strategy.projection(),
            mode = %strategy.mode(),
            "switching map strategy"
        );
        self.strategy = strategy;

        let Some(map) = self.map.as_mut() else {
            return;
        };
        let camera = match self.phase {
            Phase::AwaitingStyleLoad(PendingLoad::Swap { camera }) => camera,
            _ => map.camera(),
        };
        self.phase = Phase::AwaitingStyleLoad(PendingLoad::Swap { camera });
        if let Err(e) = map.set_style(&self.strategy.style_spec()) {
            tracing::error!(error = %e, "failed to set style");
        }
    }

    /// Store a layer and apply it now if the style is ready. Rejected when
    /// incompatible with the current strategy. Replaces a layer with the same
    /// id.
    pub fn add_layer(&mut self, mut layer: Box<dyn LayerStrategy>) -> bool {
        if !layer.is_compatible_with(self.strategy.as_ref()) {
            tracing::warn!(
                layer = layer.id(),
                mode = %self.strategy.mode(),
                "layer is not compatible with current map strategy"
            );
            return false;
        }

        if let (Some(map), true) = (self.map.as_mut(), self.phase == Phase::Ready) {
            apply_layer(map, self.strategy.as_ref(), layer.as_mut());
        }

        match self.layers.iter().position(|l| l.id() == layer.id()) {
            Some(i) => self.layers[i] = layer,
            None => self.layers.push(layer),
        }
        true
    }

    pub fn remove_layer(&mut self, id: &str) -> bool {
        let Some(i) = self.layers.iter().position(|l| l.id() == id) else {
            return false;
        };
        let mut layer = self.layers.remove(i);
        if let Some(map) = self.map.as_mut() {
            layer.remove(map);
        }
        true
    }

    pub fn clear_layers(&mut self) {
        if let Some(map) = self.map.as_mut() {
            for layer in self.layers.iter_mut() {
                layer.remove(map);
            }
        }
        self.layers.clear();
    }

    /// Show or hide a layer. Held by the layer until it reaches the map.
    pub fn set_layer_visibility(&mut self, id: &str, visible: bool) {
        let Some(layer) = self.layers.iter_mut().find(|l| l.id() == id) else {
            return;
        };
        layer.set_visibility(self.map.as_mut().map(|m| m as &mut dyn MapBackend), visible);
    }

    /// Feed a batch to one layer. Returns a timer the caller must schedule.
    pub fn update_layer_data(&mut self, id: &str, features: Vec<Feature>, now_ms: f64) -> Option<Timer> {
        let layer = self.layers.iter_mut().find(|l| l.id() == id)?;
        let Some(map) = self.map.as_mut() else {
            tracing::debug!(layer = id, "no map yet, buffering data");
            layer.buffer_data(features);
            return None;
        };
        match layer.update_data(map, features, now_ms) {
            DataUpdate::Scheduled(timer) => Some(timer),
            _ => None,
        }
    }

    /// Hand fresh country shapes to every layer that labels them.
    pub fn update_countries(&mut self, countries: &FeatureCollection) {
        for layer in self.layers.iter_mut() {
            layer.update_countries(self.map.as_mut().map(|m| m as &mut dyn MapBackend), countries);
        }
    }

    /// Fire a timer previously handed out. Timers for removed layers are
    /// dropped.
    pub fn run_timer(&mut self, timer: Timer, now_ms: f64) -> Option<Timer> {
        let map = self.map.as_mut()?;
        let layer = self.layers.iter_mut().find(|l| l.id() == timer.layer_id)?;
        layer.run_task(map, timer.task, now_ms)
    }

    pub fn handle_event(&mut self, event: MapEvent) -> Vec<Timer> {
        match event {
            MapEvent::StyleLoad => {
                self.on_style_load();
                Vec::new()
            }
            MapEvent::MoveStart => {
                for layer in self.layers.iter_mut() {
                    layer.on_move_start();
                }
                Vec::new()
            }
            MapEvent::MoveEnd => self
                .layers
                .iter_mut()
                .filter_map(|l| l.on_move_end())
                .collect(),
        }
    }

    fn on_style_load(&mut self) {
        let Some(map) = self.map.as_mut() else {
            return;
        };
        let strategy = self.strategy.as_ref();

        let next = match self.phase {
            Phase::Uninitialized => return,
            Phase::Ready => Phase::Ready,
            Phase::AwaitingStyleLoad(PendingLoad::Reconfigure) => {
                if let Err(e) = strategy.after_style_reload(map) {
                    tracing::error!(error = %e, "failed to finish map configuration");
                }
                Phase::Ready
            }
            Phase::AwaitingStyleLoad(pending) => {
                let configured = strategy.configure_map(map);
                if let PendingLoad::Swap { camera } = pending {
                    if let Err(e) = map.jump_to(&camera) {
                        tracing::error!(error = %e, "failed to restore camera");
                    }
                }
                match configured {
                    Ok(Configured::AwaitingReload) => {
                        Phase::AwaitingStyleLoad(PendingLoad::Reconfigure)
                    }
                    Ok(Configured::Done) => Phase::Ready,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to configure map");
                        Phase::Ready
                    }
                }
            }
        };
        self.phase = next;

        if next == Phase::Ready {
            for layer in self.layers.iter_mut() {
                if layer.is_compatible_with(strategy) {
                    layer.style_loaded();
                    apply_layer(map, strategy, layer.as_mut());
                }
            }
        }
    }
}

fn apply_layer<M: MapBackend>(map: &mut M, strategy: &dyn MapStrategy, layer: &mut dyn LayerStrategy) {
    let outcome = layer.apply(map, strategy);
    if outcome == ApplyOutcome::Failed {
        tracing::warn!(layer = layer.id(), "layer left partially applied");
    }
}
