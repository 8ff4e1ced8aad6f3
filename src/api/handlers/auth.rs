use super::{ErrorBody, no_store};
use crate::{identity::IdentityRecord, rotation::RotationEngine};
use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::instrument;

#[utoipa::path(
    get,
    path = "/auth/{id}",
    params(
        ("id" = String, Path, description = "Identity identifier")
    ),
    responses(
        (status = 200, description = "Tokens rotated", body = IdentityRecord),
        (status = 400, description = "Malformed request", body = ErrorBody),
        (status = 401, description = "Unknown identity or concurrent rotation", body = ErrorBody),
        (status = 500, description = "Internal error", body = ErrorBody),
    ),
    tag = "rotation"
)]
#[instrument(skip(engine))]
pub async fn rotate_by_id(
    Path(id): Path<String>,
    Extension(engine): Extension<Arc<RotationEngine>>,
) -> Response {
    match engine.rotate_by_id(&id).await {
        Ok(record) => no_store(StatusCode::OK, record),
        Err(err) => err.into_response(),
    }
}
