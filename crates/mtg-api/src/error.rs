//! # API Errors
//!
//! Every failure leaves the API as `{ "success": false, "message": "..." }`
//! with the status from [`ShopError::status_code`].

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{JsonRejection, QueryRejection},
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use mtg_core::ShopError;
use serde::Serialize;
use thiserror::Error;
use tracing::error;

/// Error returned by every handler
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Shop(#[from] ShopError),

    #[error("Invalid JSON body: {}", .0.body_text())]
    Json(#[from] JsonRejection),

    #[error("Invalid query string: {}", .0.body_text())]
    Query(#[from] QueryRejection),

    #[error("Invalid multipart body: {}", .0.body_text())]
    Multipart(#[from] MultipartError),

    #[error("Invalid multipart request: {}", .0.body_text())]
    MultipartRejection(#[from] MultipartRejection),
}

/// Error body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

impl ApiError {
    /// HTTP status for this error
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Shop(e) => {
                StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            ApiError::Json(e) => rejection_status(e.status()),
            ApiError::Query(e) => rejection_status(e.status()),
            ApiError::Multipart(e) => rejection_status(e.status()),
            ApiError::MultipartRejection(e) => rejection_status(e.status()),
        }
    }
}

/// Body-size rejections keep their 413; every other malformed request is 422
fn rejection_status(status: StatusCode) -> StatusCode {
    if status == StatusCode::PAYLOAD_TOO_LARGE {
        status
    } else {
        StatusCode::UNPROCESSABLE_ENTITY
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(status = status.as_u16(), "Request failed: {}", self);
        }
        (status, Json(ErrorResponse::new(self.to_string()))).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
