use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use peaceboard_shared::models::ApiErrorBody;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{public}: {detail}")]
    Internal { public: &'static str, detail: String },
}

impl ApiError {
    pub fn internal(public: &'static str, detail: impl ToString) -> Self {
        ApiError::Internal {
            public,
            detail: detail.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Internal { public, detail } => {
                tracing::error!(%detail, "{public}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorBody {
                        error: public.to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}
