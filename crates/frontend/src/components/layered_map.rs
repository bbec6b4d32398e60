use dioxus::prelude::*;
use peaceboard_shared::models::{FeatureCollection, MapMode, PeaceMap, Projection};
use peaceboard_shared::peace;
use peaceboard_shared::store::PeaceStore;

use crate::hooks::MapHandle;
use crate::map::layers::{HeatmapLayer, LayerStrategy, PeaceLayer};

const MAP_CONTAINER_ID: &str = "peace-map-container";

pub const HEAT_LAYER: &str = "activity";
const HEAT_SOURCE: &str = "activity-source";
pub const PEACE_LAYER: &str = "peace";
const PEACE_SOURCE: &str = "peace-source";

/// Sample country polygons with `peace_map` percentages written onto them.
pub fn peace_countries(peace_map: &PeaceMap) -> FeatureCollection {
    let mut countries = peace::sample_countries();
    peace::apply_peace_map(&mut countries, peace_map);
    countries
}

/// The layer stack shown in each mode.
pub fn layers_for(mode: MapMode, peace_map: &PeaceMap) -> Vec<Box<dyn LayerStrategy>> {
    let countries = peace_countries(peace_map);
    match mode {
        MapMode::Heat => vec![Box::new(
            HeatmapLayer::new(HEAT_LAYER, HEAT_SOURCE, peace::sample_activity()).with_countries(countries),
        )],
        MapMode::Peace => vec![Box::new(PeaceLayer::new(PEACE_LAYER, PEACE_SOURCE, countries))],
    }
}

#[component]
pub fn LayeredMap(
    handle: MapHandle,
    projection: Signal<Projection>,
    mode: Signal<MapMode>,
    drift: Signal<bool>,
    layers_visible: Signal<bool>,
    store: Signal<PeaceStore>,
) -> Element {
    // Runs once the container is in the DOM.
    use_effect({
        let handle = handle.clone();
        move || handle.initialize(MAP_CONTAINER_ID)
    });

    use_effect({
        let handle = handle.clone();
        move || {
            let (projection, mode) = (projection(), mode());
            let mode_changed = handle.strategy().map_or(true, |(_, current)| current != mode);
            handle.set_strategy(projection, mode);
            if mode_changed || !handle.has_layers() {
                let peace_map = store.peek().peace_map.clone();
                handle.replace_layers(layers_for(mode, &peace_map));
            }
        }
    });

    use_effect({
        let handle = handle.clone();
        move || {
            let peace_map = store.read().peace_map.clone();
            if !peace_map.is_empty() {
                let countries = peace_countries(&peace_map);
                handle.update_countries(&countries);
                handle.update_layer_data(PEACE_LAYER, countries.features);
            }
        }
    });

    use_effect({
        let handle = handle.clone();
        move || {
            let visible = layers_visible();
            let id = match mode() {
                MapMode::Heat => HEAT_LAYER,
                MapMode::Peace => PEACE_LAYER,
            };
            handle.set_layer_visibility(id, visible);
        }
    });

    use_effect(move || handle.set_drift(drift()));

    rsx! {
        div { id: "{MAP_CONTAINER_ID}", class: "map-container" }
    }
}
