use super::{ErrorBody, bad_request, no_store};
use crate::{identity::IdentityRecord, rotation::RotationEngine};
use axum::{
    extract::{Extension, Json, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, instrument};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

impl std::fmt::Debug for RefreshRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefreshRequest")
            .field("refresh_token", &"***")
            .finish()
    }
}

#[utoipa::path(
    post,
    path = "/refresh",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Tokens rotated", body = IdentityRecord),
        (status = 400, description = "Missing or malformed refresh token", body = ErrorBody),
        (status = 401, description = "Unknown, replayed or concurrently rotated token", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    ),
    tag = "rotation"
)]
#[instrument(skip_all)]
pub async fn refresh(
    Extension(engine): Extension<Arc<RotationEngine>>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Response {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected refresh body: {}", rejection.body_text());
            return bad_request(rejection.body_text());
        }
    };

    match engine.rotate_by_refresh_token(&request.refresh_token).await {
        Ok(record) => no_store(StatusCode::OK, record),
        Err(err) => err.into_response(),
    }
}
