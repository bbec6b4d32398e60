use dioxus::prelude::*;
use peaceboard_shared::models::{MapMode, Projection};
use peaceboard_shared::ramp::{self, PEACE_RAMP};

#[component]
pub fn MapControls(
    projection: Signal<Projection>,
    mode: Signal<MapMode>,
    drift: Signal<bool>,
    layers_visible: Signal<bool>,
) -> Element {
    let current_projection = *projection.read();
    let current_mode = *mode.read();
    let drifting = *drift.read();
    let visible = *layers_visible.read();

    rsx! {
        div { class: "map-controls",
            div { class: "control-group",
                for (value, label) in [(MapMode::Heat, "Activity"), (MapMode::Peace, "Peace")] {
                    button {
                        class: if current_mode == value { "active" } else { "" },
                        onclick: move |_| mode.set(value),
                        "{label}"
                    }
                }
            }
            div { class: "control-group",
                for (value, label) in [(Projection::Globe, "Globe"), (Projection::Mercator, "Flat")] {
                    button {
                        class: if current_projection == value { "active" } else { "" },
                        onclick: move |_| projection.set(value),
                        "{label}"
                    }
                }
            }
            button {
                class: if drifting { "active" } else { "" },
                onclick: move |_| drift.set(!drifting),
                "Drift"
            }
            button {
                class: if visible { "" } else { "active" },
                onclick: move |_| layers_visible.set(!visible),
                "Hide overlay"
            }
            if current_mode == MapMode::Peace {
                div { class: "legend",
                    for (stop, color) in PEACE_RAMP {
                        div { class: "legend-item",
                            span { class: "swatch", style: "background: {color};" }
                            span { "{ramp::percentage_label(Some(stop))}" }
                        }
                    }
                }
            }
        }
    }
}
