use std::rc::Rc;

use dioxus::prelude::*;
use peaceboard_shared::models::{MapMode, Projection};
use peaceboard_shared::store::{PeaceStore, StoreChange};
use serde_json::json;

use crate::api;
use crate::components::layered_map::{LayeredMap, HEAT_LAYER};
use crate::components::map_controls::MapControls;
use crate::components::stats_bar::StatsBar;
use crate::config;
use crate::hooks::use_map_handle;
use crate::socket::{self, LiveSocket};
use crate::Route;

#[component]
pub fn Home() -> Element {
    let mut store = use_context::<Signal<PeaceStore>>();
    let projection = use_signal(|| Projection::Globe);
    let mode = use_signal(|| MapMode::Heat);
    let drift = use_signal(|| false);
    let layers_visible = use_signal(|| true);
    let handle = use_map_handle(*projection.peek(), *mode.peek());

    // Served peace map, built-in table on failure.
    let _peace_map = use_resource(move || async move {
        let peace_map = api::load_peace_map().await;
        store.write().set_peace_map(peace_map);
    });

    let live = use_hook({
        let handle = handle.clone();
        move || {
            let url = config::socket_url()?;
            let connected = LiveSocket::connect(url, move |event| {
                let heat = socket::heat_features(&event);
                let change = store.write().apply(event);
                if change == StoreChange::Heatmap && !heat.is_empty() {
                    handle.update_layer_data(HEAT_LAYER, heat);
                }
            });
            match connected {
                Ok(socket) => Some(Rc::new(socket)),
                Err(e) => {
                    tracing::warn!(error = %e, "live updates unavailable");
                    None
                }
            }
        }
    });

    rsx! {
        div { class: "app",
            div { class: "header",
                h1 { "The Peace Board" }
                MapControls { projection, mode, drift, layers_visible }
                CountryLookup {}
            }
            LayeredMap { handle, projection, mode, drift, layers_visible, store }
            StatsBar {
                store,
                on_sign: move |_| {
                    let signature = json!({ "signedAt": js_sys::Date::now() });
                    let sent = live.as_ref().is_some_and(|s| s.sign_for_peace(&signature));
                    if !sent {
                        tracing::info!("pledge not sent, no live connection");
                    }
                },
            }
        }
    }
}

#[component]
fn CountryLookup() -> Element {
    let mut query = use_signal(String::new);
    let nav = navigator();

    rsx! {
        form {
            class: "country-lookup",
            onsubmit: move |evt: Event<FormData>| {
                evt.prevent_default();
                let name = query.read().trim().to_string();
                if !name.is_empty() {
                    nav.push(Route::Country { name });
                }
            },
            input {
                r#type: "text",
                placeholder: "Look up a country...",
                value: "{query}",
                oninput: move |evt: Event<FormData>| query.set(evt.value()),
            }
        }
    }
}
