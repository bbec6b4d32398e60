mod api;
mod assets;
mod config;
mod error;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use axum::http::HeaderValue;
use axum::{extract::State, response::Html, routing::get, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use assets::Assets;
use config::Config;

#[derive(Clone)]
pub struct AppState {
    pub assets: Arc<Assets>,
    pub dist_dir: Arc<PathBuf>,
}

/// Build a cache-controlled static file router.
fn cached_static_router(dir: &Path, cache_header: &'static str) -> Router {
    let layer = SetResponseHeaderLayer::overriding(
        axum::http::header::CACHE_CONTROL,
        HeaderValue::from_static(cache_header),
    );
    Router::new()
        .fallback_service(ServeDir::new(dir))
        .layer(layer)
}

const CACHE_1DAY: &str = "public, max-age=86400, must-revalidate";
const CACHE_IMMUTABLE: &str = "public, max-age=31536000, immutable";

/// Build the full application router.
fn build_app(state: AppState, assets_dir: &Path) -> Router {
    let dist_dir = state.dist_dir.as_path().to_path_buf();
    // Static file routers are stateless, merge them before adding app state
    let static_files = Router::new()
        .nest("/static", cached_static_router(assets_dir, CACHE_1DAY))
        .nest("/dist", cached_static_router(&dist_dir, CACHE_IMMUTABLE))
        .nest(
            "/assets",
            cached_static_router(&dist_dir.join("assets"), CACHE_IMMUTABLE),
        );

    Router::new()
        .route("/", get(serve_index))
        .route("/country/{name}", get(serve_index))
        .merge(api::router())
        .with_state(state)
        .merge(static_files)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("peaceboard_backend=info,tower_http=info"));
    let _ = tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(filter)
        .try_init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let config = Config::from_env()?;
    let state = AppState {
        assets: Arc::new(Assets::load_or_default(&config.assets_dir)),
        dist_dir: Arc::new(config.dist_dir.clone()),
    };
    let app = build_app(state, &config.assets_dir);

    tracing::info!(addr = %config.bind, "The Peace Board listening");

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn serve_index(State(state): State<AppState>) -> Html<String> {
    // Try to serve the built frontend, fall back to a simple message
    match tokio::fs::read_to_string(state.dist_dir.join("index.html")).await {
        Ok(html) => Html(html),
        Err(_) => Html(
            r#"<!DOCTYPE html>
<html>
<head><title>The Peace Board</title></head>
<body>
<h1>The Peace Board</h1>
<p>Frontend not built yet. Try <a href="/api/peace/Germany">/api/peace/Germany</a>.</p>
</body>
</html>"#
                .to_string(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use peaceboard_shared::peace;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    /// Create a temp dir with a test file and return the dir path.
    fn temp_dir_with_file(file_name: &str, content: &str) -> tempfile::TempDir {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(file_name), content).unwrap();
        dir
    }

    fn api_app(dist_dir: &Path) -> Router {
        let state = AppState {
            assets: Arc::new(Assets {
                peace_map: peace::default_peace_map(),
            }),
            dist_dir: Arc::new(dist_dir.to_path_buf()),
        };
        build_app(state, dist_dir)
    }

    async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    #[tokio::test]
    async fn test_peace_data_known_country_is_exact() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/api/peace-data/Germany").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"signedCount": 2300000, "population": 83200000, "signedPercentage": 2.76})
        );
    }

    #[tokio::test]
    async fn test_peace_data_decodes_escaped_names() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/api/peace-data/South%20Korea").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["signedCount"], 980000);
    }

    #[tokio::test]
    async fn test_peace_data_unknown_country_is_random_but_plausible() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/api/peace-data/Atlantis").await;
        assert_eq!(status, StatusCode::OK);
        let pct = body["signedPercentage"].as_f64().unwrap();
        assert!((0.1..5.0).contains(&pct));
        assert!(body["population"].as_u64().unwrap() >= 1_000_000);
    }

    #[tokio::test]
    async fn test_peace_vote_unknown_country_is_zeroed() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/api/peace/Unknown%20Country").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"country": "Unknown Country", "totalPopulation": 0, "voteAmount": 0, "percentage": 0})
        );
    }

    #[tokio::test]
    async fn test_peace_vote_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/api/peace/jApAn").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["country"], "Japan");
        assert_eq!(body["percentage"], 90);
    }

    #[tokio::test]
    async fn test_peace_vote_malformed_escape_is_500() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/api/peace/%E0%A4%A").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"error": "Failed to process peace data"}));
    }

    #[tokio::test]
    async fn test_peace_map_served_from_state() {
        let dir = tempfile::tempdir().unwrap();
        let (status, body) = get(api_app(dir.path()), "/peace-map.json").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["CAN"], 90.0);
        assert_eq!(body.as_object().unwrap().len(), 14);
    }

    #[tokio::test]
    async fn test_index_falls_back_without_build() {
        let dir = tempfile::tempdir().unwrap();
        let resp = api_app(dir.path())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(String::from_utf8_lossy(&bytes).contains("Frontend not built yet"));
    }

    #[tokio::test]
    async fn test_index_serves_built_frontend() {
        let dist = temp_dir_with_file("index.html", "<html>built</html>");
        let resp = api_app(dist.path())
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>built</html>");
    }

    #[tokio::test]
    async fn test_country_deep_link_serves_index() {
        let dist = temp_dir_with_file("index.html", "<html>built</html>");
        let resp = api_app(dist.path())
            .oneshot(
                Request::builder()
                    .uri("/country/South%20Korea")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&bytes[..], b"<html>built</html>");
    }

    #[tokio::test]
    async fn test_static_cache_policy() {
        let dir = temp_dir_with_file("app-abc123.js", "bundle()");

        let resp = api_app(dir.path())
            .oneshot(Request::builder().uri("/static/app-abc123.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), CACHE_1DAY);

        let resp = api_app(dir.path())
            .oneshot(Request::builder().uri("/dist/app-abc123.js").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(resp.headers().get("cache-control").unwrap(), CACHE_IMMUTABLE);
    }
}
