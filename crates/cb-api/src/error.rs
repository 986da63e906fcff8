//! # ApiError
//!
//! Maps `AppError` onto HTTP statuses. Failures carry no body, except form
//! validation, which returns the per-field messages for the client to show.

use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use cb_core::AppError;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub AppError);

impl ApiError {
    pub fn invalid(message: impl Into<String>) -> Self {
        ApiError(AppError::InvalidInput(message.into()))
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            AppError::InvalidInput(_) | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(..) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match &self.0 {
            AppError::Internal(e) => log::error!("request failed: {e}"),
            other => log::debug!("request rejected: {other}"),
        }

        match &self.0 {
            AppError::Validation(errors) => {
                HttpResponse::BadRequest().json(json!({ "errors": errors }))
            }
            _ => HttpResponse::build(self.status_code()).finish(),
        }
    }
}
