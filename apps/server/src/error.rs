// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types and handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use blueprint_vision::VisionError;
use serde::Serialize;
use thiserror::Error;

/// Summary attached to every server-side failure.
pub const DETECTION_FAILED: &str = "Failed to detect rooms from blueprint";

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request itself is unusable.
    #[error("{0}")]
    Validation(String),

    /// The blueprint could not be fetched or decoded.
    #[error("Failed to download blueprint: {0}")]
    Download(String),

    #[error(transparent)]
    Detection(#[from] VisionError),

    #[error("Detection task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, None),
            ApiError::Download(_) | ApiError::Detection(_) | ApiError::Join(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Some(DETECTION_FAILED))
            }
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Room detection failed");
        }

        let body = ErrorResponse {
            error: self.to_string(),
            message,
        };

        (status, Json(body)).into_response()
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::Download(format!("request timed out: {}", err))
        } else {
            ApiError::Download(err.to_string())
        }
    }
}
