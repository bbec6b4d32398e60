use peaceboard_shared::models::{PeaceDataRecord, PeaceMap, PeaceVoteRecord};
use peaceboard_shared::peace;
use reqwest::Url;
use serde::de::DeserializeOwned;

use crate::config;

/// Join `segments` onto `origin`, percent-encoding each one.
pub fn api_url(origin: &str, segments: &[&str]) -> Result<Url, String> {
    let mut url = Url::parse(origin).map_err(|e| format!("invalid origin {origin:?}: {e}"))?;
    url.path_segments_mut()
        .map_err(|_| format!("origin {origin:?} cannot carry a path"))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

fn origin() -> Result<String, String> {
    if let Some(origin) = config::api_origin() {
        return Ok(origin.to_string());
    }
    web_sys::window()
        .ok_or("no window")?
        .location()
        .origin()
        .map_err(|e| format!("{e:?}"))
}

async fn get_json<T: DeserializeOwned>(segments: &[&str]) -> Result<T, String> {
    let url = api_url(&origin()?, segments)?;
    let resp = reqwest::Client::new()
        .get(url)
        .send()
        .await
        .map_err(|e| e.to_string())?
        .error_for_status()
        .map_err(|e| e.to_string())?;
    resp.json().await.map_err(|e| e.to_string())
}

pub async fn fetch_peace_data(country: &str) -> Result<PeaceDataRecord, String> {
    get_json(&["api", "peace-data", country]).await
}

pub async fn fetch_peace_vote(country: &str) -> Result<PeaceVoteRecord, String> {
    get_json(&["api", "peace", country]).await
}

pub async fn fetch_peace_map() -> Result<PeaceMap, String> {
    get_json(&["peace-map.json"]).await
}

/// Served peace map, or the built-in table when the request fails.
pub async fn load_peace_map() -> PeaceMap {
    match fetch_peace_map().await {
        Ok(map) => map,
        Err(e) => {
            tracing::warn!(error = %e, "peace map unavailable, using built-in table");
            peace::default_peace_map()
        }
    }
}

/// Zeroed vote record for `country`, shown when the lookup fails.
pub fn empty_vote(country: &str) -> PeaceVoteRecord {
    PeaceVoteRecord {
        country: country.to_string(),
        total_population: 0,
        vote_amount: 0,
        percentage: 0,
    }
}
