//! Mapping of application errors to HTTP responses.

use axum::{
    Json,
    extract::{
        FromRequest, multipart::MultipartRejection, rejection::JsonRejection,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
};
use folio_shared::AppError;
use serde_json::json;
use tracing::error;
use validator::ValidationErrors;

/// An [`AppError`] on its way out as a JSON response.
#[derive(Debug)]
pub struct ApiError(pub AppError);

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        bad_request(rejection.body_text())
    }
}

/// `Json` extractor whose rejections are 400 `validation_error` responses.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.0.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        if status.is_server_error() {
            error!(error = %self.0, "request failed");
        }

        (
            status,
            Json(json!({
                "error": self.0.error_code(),
                "message": self.0.message(),
            })),
        )
            .into_response()
    }
}

/// Handler result.
pub type ApiResult<T> = Result<T, ApiError>;

/// First failing field's message, or a generic one.
pub fn validation_error(errors: &ValidationErrors) -> ApiError {
    let message = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map_or_else(|| format!("{field} is invalid"), ToString::to_string)
            })
        })
        .next()
        .unwrap_or_else(|| "Invalid request".to_string());

    ApiError(AppError::Validation(message))
}

/// 400 with a message.
pub fn bad_request(message: impl Into<String>) -> ApiError {
    ApiError(AppError::Validation(message.into()))
}

/// 404 with a message.
pub fn not_found(message: impl Into<String>) -> ApiError {
    ApiError(AppError::NotFound(message.into()))
}

/// 500 for a database failure.
pub fn database_error(err: &sea_orm::DbErr) -> ApiError {
    ApiError(AppError::Database(err.to_string()))
}
