//! HTTP handlers and the mapping from rotation errors to responses.

pub mod auth;
pub mod health;
pub mod refresh;
pub mod root;

use crate::rotation::{ErrorClass, RotationError};
use axum::{
    http::{HeaderValue, StatusCode, header::CACHE_CONTROL},
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

pub const UNAUTHORIZED_MESSAGE: &str = "invalid or expired credentials";
pub const INTERNAL_MESSAGE: &str = "internal server error";

#[derive(ToSchema, Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ErrorBody {
    pub message: String,
}

/// JSON response marked `Cache-Control: no-store`.
pub(crate) fn no_store(status: StatusCode, body: impl Serialize) -> Response {
    let mut response = (status, Json(body)).into_response();
    response
        .headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}

pub(crate) fn bad_request(message: impl Into<String>) -> Response {
    no_store(
        StatusCode::BAD_REQUEST,
        ErrorBody {
            message: message.into(),
        },
    )
}

impl IntoResponse for RotationError {
    fn into_response(self) -> Response {
        match self.class() {
            ErrorClass::InvalidRequest => match self {
                Self::InvalidRequest(message) => bad_request(message),
                other => bad_request(other.to_string()),
            },
            // Unknown identity, replayed token and lost race look the same.
            ErrorClass::Unauthorized => no_store(
                StatusCode::UNAUTHORIZED,
                ErrorBody {
                    message: UNAUTHORIZED_MESSAGE.to_string(),
                },
            ),
            ErrorClass::Internal => no_store(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorBody {
                    message: INTERNAL_MESSAGE.to_string(),
                },
            ),
        }
    }
}
