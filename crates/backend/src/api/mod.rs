//! Mock peace endpoints. Records are hardcoded samples or random fill-ins.
use axum::extract::rejection::PathRejection;
use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use peaceboard_shared::models::{PeaceDataRecord, PeaceMap, PeaceVoteRecord};
use peaceboard_shared::peace;
use rand::Rng;

use crate::error::ApiError;
use crate::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/peace-data/{country}", get(peace_data))
        .route("/api/peace/{country}", get(peace_vote))
        .route("/peace-map.json", get(peace_map))
}

/// Believable stand-in for a country missing from the sample table:
/// 0.1%–5% of a population between one and a hundred million.
pub fn random_signed_record<R: Rng + ?Sized>(rng: &mut R) -> PeaceDataRecord {
    let signed_percentage = rng.gen_range(0.1..5.0);
    let population: u64 = rng.gen_range(1_000_000..100_000_000);
    let signed_count = (population as f64 * (signed_percentage / 100.0)).floor() as u64;
    PeaceDataRecord {
        signed_count,
        population,
        signed_percentage,
    }
}

async fn peace_data(
    country: Result<Path<String>, PathRejection>,
) -> Result<Json<PeaceDataRecord>, ApiError> {
    let Path(country) =
        country.map_err(|e| ApiError::internal("Failed to load peace data", e))?;
    let record = match peace::signed_sample(&country) {
        Some(record) => record,
        None => {
            tracing::debug!(%country, "no sample, generating record");
            random_signed_record(&mut rand::thread_rng())
        }
    };
    Ok(Json(record))
}

async fn peace_vote(
    country: Result<Path<String>, PathRejection>,
) -> Result<Json<PeaceVoteRecord>, ApiError> {
    let Path(country) =
        country.map_err(|e| ApiError::internal("Failed to process peace data", e))?;
    Ok(Json(peace::vote_record(&country)))
}

async fn peace_map(State(state): State<AppState>) -> Json<PeaceMap> {
    Json(state.assets.peace_map.clone())
}
