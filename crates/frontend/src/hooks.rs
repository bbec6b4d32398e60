//! Browser glue around [`MapController`]: library listeners, layer timers,
//! camera persistence and the idle drift.
//!
//! The controller lives in an `Rc<RefCell<_>>`. Library callbacks and timers
//! only hold a `Weak`, so unmounting the component drops the map. The library
//! can fire events synchronously from inside a controller call (a camera jump
//! emits `movestart`/`moveend`); those find the controller borrowed and are
//! re-queued on a zero-delay timeout.
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use dioxus::prelude::*;
use gloo_timers::callback::{Interval, Timeout};
use peaceboard_shared::models::{Feature, FeatureCollection, MapMode, Projection};

use crate::map::drift::Drift;
use crate::map::layers::{LayerStrategy, Timer};
use crate::map::strategy::strategy_for;
use crate::map::{MapBackend, MapController, MapEvent};
use crate::maplibre::{self, MapLibreMap};
use crate::storage;

const DRIFT_TICK_MS: u32 = 50;
const LIBRARY_WAIT_MS: u32 = 100;
const LIBRARY_WAIT_ATTEMPTS: u32 = 100;

type Controller = MapController<MapLibreMap>;
type WeakController = Weak<RefCell<Controller>>;

fn now_ms() -> f64 {
    js_sys::Date::now()
}

fn schedule(controller: WeakController, timer: Timer) {
    Timeout::new(timer.delay_ms, move || {
        let Some(shared) = controller.upgrade() else {
            return;
        };
        let next = match shared.try_borrow_mut() {
            Ok(mut c) => c.run_timer(timer, now_ms()),
            Err(_) => Some(Timer { delay_ms: 0, ..timer }),
        };
        if let Some(next) = next {
            schedule(controller, next);
        }
    })
    .forget();
}

fn dispatch(controller: &WeakController, event: MapEvent) {
    let Some(shared) = controller.upgrade() else {
        return;
    };
    let Ok(mut c) = shared.try_borrow_mut() else {
        let controller = controller.clone();
        Timeout::new(0, move || dispatch(&controller, event)).forget();
        return;
    };
    let timers = c.handle_event(event);
    let camera = match event {
        MapEvent::MoveEnd => c.camera(),
        _ => None,
    };
    drop(c);

    for timer in timers {
        schedule(controller.clone(), timer);
    }
    if let Some(camera) = camera {
        storage::save_camera(&camera);
    }
}

/// Shared handle to the page's map. Cloning is cheap; all clones drive the
/// same controller.
#[derive(Clone)]
pub struct MapHandle {
    controller: Rc<RefCell<Controller>>,
    drift: Rc<RefCell<Option<Interval>>>,
}

impl PartialEq for MapHandle {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.controller, &other.controller)
    }
}

impl MapHandle {
    pub fn new(projection: Projection, mode: MapMode) -> Self {
        MapHandle {
            controller: Rc::new(RefCell::new(MapController::new(strategy_for(projection, mode)))),
            drift: Rc::new(RefCell::new(None)),
        }
    }

    fn weak(&self) -> WeakController {
        Rc::downgrade(&self.controller)
    }

    fn with<R>(&self, f: impl FnOnce(&mut Controller) -> R) -> Option<R> {
        match self.controller.try_borrow_mut() {
            Ok(mut c) => Some(f(&mut c)),
            Err(_) => {
                tracing::warn!("map controller is busy, dropping call");
                None
            }
        }
    }

    /// Create the map inside `container_id` at the persisted camera, once the
    /// library script has loaded.
    pub fn initialize(&self, container_id: &'static str) {
        self.initialize_when_loaded(container_id, 0);
    }

    fn initialize_when_loaded(&self, container_id: &'static str, attempt: u32) {
        if !maplibre::library_available() {
            if attempt >= LIBRARY_WAIT_ATTEMPTS {
                tracing::error!("map library never loaded");
                return;
            }
            let handle = self.clone();
            Timeout::new(LIBRARY_WAIT_MS, move || {
                handle.initialize_when_loaded(container_id, attempt + 1)
            })
            .forget();
            return;
        }
        self.create_map(container_id);
    }

    fn create_map(&self, container_id: &str) {
        let weak = self.weak();
        let camera = storage::load_camera();
        let result = self.with(|c| {
            c.initialize(|style| {
                let mut map = MapLibreMap::new(container_id, style, &camera)?;
                for event in MapEvent::ALL {
                    let weak = weak.clone();
                    map.on(event, move || dispatch(&weak, event));
                }
                Ok(map)
            })
        });
        if let Some(Err(e)) = result {
            tracing::error!(error = %e, "failed to create map");
        }
    }

    pub fn strategy(&self) -> Option<(Projection, MapMode)> {
        self.with(|c| (c.strategy().projection(), c.strategy().mode()))
    }

    /// Switch strategy unless it already matches.
    pub fn set_strategy(&self, projection: Projection, mode: MapMode) {
        self.with(|c| {
            let current = c.strategy();
            if (current.projection(), current.mode()) != (projection, mode) {
                c.set_strategy(strategy_for(projection, mode));
            }
        });
    }

    /// Drop every layer and add `layers` in order.
    pub fn replace_layers(&self, layers: Vec<Box<dyn LayerStrategy>>) {
        self.with(|c| {
            c.clear_layers();
            for layer in layers {
                c.add_layer(layer);
            }
        });
    }

    pub fn has_layers(&self) -> bool {
        self.with(|c| !c.layer_ids().is_empty()).unwrap_or(false)
    }

    pub fn set_layer_visibility(&self, id: &str, visible: bool) {
        self.with(|c| c.set_layer_visibility(id, visible));
    }

    pub fn update_layer_data(&self, id: &str, features: Vec<Feature>) {
        let timer = self
            .with(|c| c.update_layer_data(id, features, now_ms()))
            .flatten();
        if let Some(timer) = timer {
            schedule(self.weak(), timer);
        }
    }

    pub fn update_countries(&self, countries: &FeatureCollection) {
        self.with(|c| c.update_countries(countries));
    }

    /// Start or stop the idle camera drift.
    pub fn set_drift(&self, enabled: bool) {
        let mut slot = self.drift.borrow_mut();
        if !enabled {
            // Dropping the interval cancels it.
            slot.take();
            return;
        }
        if slot.is_some() {
            return;
        }

        let weak = self.weak();
        let mut drift: Option<Drift> = None;
        *slot = Some(Interval::new(DRIFT_TICK_MS, move || {
            let Some(shared) = weak.upgrade() else {
                return;
            };
            let Ok(mut c) = shared.try_borrow_mut() else {
                return;
            };
            if !c.is_ready() {
                return;
            }
            let Some(map) = c.map_mut() else {
                return;
            };
            let mut camera = map.camera();
            let state = drift.get_or_insert_with(|| Drift::starting_at(camera.center.lng));
            camera.center = state.step(now_ms());
            if let Err(e) = map.jump_to(&camera) {
                tracing::debug!(error = %e, "drift step failed");
            }
        }));
    }
}

/// One map controller per component instance, created on first render.
pub fn use_map_handle(projection: Projection, mode: MapMode) -> MapHandle {
    use_hook(|| MapHandle::new(projection, mode))
}
