use dioxus::prelude::*;
use peaceboard_shared::ramp;

use crate::api;
use crate::components::stats_bar::group_thousands;
use crate::Route;

/// Per-country lookup against both mock endpoints.
#[component]
pub fn Country(name: String) -> Element {
    let vote = use_resource({
        let name = name.clone();
        move || {
            let name = name.clone();
            async move {
                match api::fetch_peace_vote(&name).await {
                    Ok(vote) => vote,
                    Err(e) => {
                        tracing::warn!(country = %name, error = %e, "vote lookup failed");
                        api::empty_vote(&name)
                    }
                }
            }
        }
    });
    let signatures = use_resource({
        let name = name.clone();
        move || {
            let name = name.clone();
            async move { api::fetch_peace_data(&name).await }
        }
    });

    let vote_panel = match &*vote.read() {
        Some(vote) => {
            let pct = Some(f64::from(vote.percentage));
            rsx! {
                div { class: "panel",
                    h2 { "{vote.country}" }
                    div { class: "percentage",
                        span { class: "swatch", style: "background: {ramp::ramp_color(pct)};" }
                        span { "{ramp::percentage_label(pct)}" }
                    }
                    p { "{group_thousands(vote.vote_amount)} of {group_thousands(vote.total_population)} people" }
                }
            }
        }
        None => rsx! { div { class: "panel", "Loading..." } },
    };

    let signature_panel = match &*signatures.read() {
        Some(Ok(data)) => rsx! {
            div { class: "panel",
                h3 { "Signatures" }
                p { "{group_thousands(data.signed_count)} signed ({data.signed_percentage}% of {group_thousands(data.population)})" }
            }
        },
        Some(Err(_)) => rsx! { div { class: "panel", "Signature data unavailable" } },
        None => rsx! {},
    };

    rsx! {
        div { class: "country-page",
            Link { to: Route::Home {}, "Back to the map" }
            {vote_panel}
            {signature_panel}
        }
    }
}
