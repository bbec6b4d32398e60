mod api;
mod components;
mod config;
mod hooks;
mod map;
mod maplibre;
mod pages;
mod socket;
mod storage;

use dioxus::prelude::*;
use peaceboard_shared::store::PeaceStore;

#[derive(Routable, Clone, PartialEq)]
enum Route {
    #[route("/")]
    Home {},
    #[route("/country/:name")]
    Country { name: String },
}

#[component]
fn Home() -> Element {
    rsx! {
        pages::home::Home {}
    }
}

#[component]
fn Country(name: String) -> Element {
    rsx! {
        pages::country::Country { name }
    }
}

const CSS: Asset = asset!("/assets/main.css");
const FAVICON: Asset = asset!("/assets/favicon.svg");
const MAPLIBRE_JS: &str = "https://unpkg.com/maplibre-gl@5/dist/maplibre-gl.js";
const MAPLIBRE_CSS: &str = "https://unpkg.com/maplibre-gl@5/dist/maplibre-gl.css";

#[allow(non_snake_case)]
fn App() -> Element {
    use_context_provider(|| Signal::new(PeaceStore::default()));

    rsx! {
        document::Link { rel: "icon", r#type: "image/svg+xml", href: FAVICON }
        document::Stylesheet { href: MAPLIBRE_CSS }
        document::Stylesheet { href: CSS }
        document::Script { src: MAPLIBRE_JS }
        Router::<Route> {}
    }
}

fn main() {
    launch(App);
}
