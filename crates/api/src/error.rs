use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use quillpress_core::pipeline::PipelineError;
use quillpress_core::post::validate::ValidationError;
use quillpress_markup::render::RenderError;

/// API error type that maps to the JSON error envelope.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("bad request: {0}")]
    BadRequest(String),

    #[error("unauthorized")]
    Unauthorized,

    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The markup renderer failed or timed out; the save was aborted
    /// before anything was persisted.
    #[error("rendering unavailable: {0}")]
    RenderUnavailable(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        match err {
            PipelineError::Validation(err) => ApiError::Validation(err),
            PipelineError::Render(RenderError::Unavailable(msg)) => {
                ApiError::RenderUnavailable(msg)
            }
        }
    }
}

impl From<RenderError> for ApiError {
    fn from(err: RenderError) -> Self {
        let RenderError::Unavailable(msg) = err;
        ApiError::RenderUnavailable(msg)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_type, message, field) = match &self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, "notFound", msg.clone(), None),
            ApiError::BadRequest(msg) => {
                (StatusCode::BAD_REQUEST, "badRequest", msg.clone(), None)
            }
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized",
                "Authentication required".to_string(),
                None,
            ),
            ApiError::Validation(err) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "validationError",
                err.to_string(),
                Some(err.field()),
            ),
            ApiError::RenderUnavailable(msg) => {
                tracing::warn!("markup rendering unavailable: {msg}");
                (
                    StatusCode::BAD_GATEWAY,
                    "renderUnavailable",
                    "Markup rendering is unavailable; the save was aborted".to_string(),
                    None,
                )
            }
            ApiError::Internal(msg) => {
                tracing::error!("Internal error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
            ApiError::Database(err) => {
                tracing::error!("Database error: {err}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internalError",
                    "An internal error occurred".to_string(),
                    None,
                )
            }
        };

        let mut body = json!({
            "error": {
                "type": error_type,
                "message": message,
                "statusCode": status.as_u16(),
            }
        });
        if let Some(field) = field {
            body["error"]["field"] = json!(field);
        }

        (status, Json(body)).into_response()
    }
}

/// Convenience type alias for route handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_errors_carry_their_field() {
        let response = ApiError::Validation(ValidationError::MissingTitle).into_response();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn render_failures_are_bad_gateway() {
        let response = ApiError::RenderUnavailable("timed out".into()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn not_found_maps_to_404() {
        let response = ApiError::NotFound("no such post".into()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
