use crate::{GIT_COMMIT_HASH, rotation::RotationEngine};
use axum::{
    body::Body,
    extract::Extension,
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error};
use utoipa::ToSchema;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct Health {
    commit: String,
    name: String,
    version: String,
    directory: String,
}

fn x_app_header(health: &Health) -> HeaderMap {
    let short_hash = if health.commit.len() > 7 {
        health.commit.get(0..7).unwrap_or("")
    } else {
        ""
    };

    let mut headers = HeaderMap::new();
    match format!("{}:{}:{}", health.name, health.version, short_hash).parse::<HeaderValue>() {
        Ok(value) => {
            debug!("X-App header: {:?}", value);
            headers.insert("X-App", value);
        }
        Err(err) => error!("Failed to parse X-App header: {}", err),
    }
    headers
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "User directory is reachable", body = Health),
        (status = 503, description = "User directory is unreachable", body = Health)
    ),
    tag = "health"
)]
pub async fn health(
    method: Method,
    Extension(engine): Extension<Arc<RotationEngine>>,
) -> impl IntoResponse {
    let directory = engine.check_directory().await;
    if let Err(err) = &directory {
        error!("User directory health check failed: {}", err);
    }

    let health = Health {
        commit: GIT_COMMIT_HASH.to_string(),
        name: env!("CARGO_PKG_NAME").to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        directory: if directory.is_ok() { "ok" } else { "error" }.to_string(),
    };

    let headers = x_app_header(&health);

    let body = if method == Method::GET {
        Json(&health).into_response()
    } else {
        Body::empty().into_response()
    };

    let status = if directory.is_ok() {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, headers, body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_app_uses_short_hash() {
        let health = Health {
            commit: "0123456789abcdef".to_string(),
            name: "revolve".to_string(),
            version: "0.1.0".to_string(),
            directory: "ok".to_string(),
        };
        let headers = x_app_header(&health);
        assert_eq!(
            headers.get("X-App").and_then(|v| v.to_str().ok()),
            Some("revolve:0.1.0:0123456")
        );
    }

    #[test]
    fn x_app_without_hash() {
        let health = Health {
            commit: "unknown".to_string(),
            name: "revolve".to_string(),
            version: "0.1.0".to_string(),
            directory: "ok".to_string(),
        };
        let headers = x_app_header(&health);
        assert_eq!(
            headers.get("X-App").and_then(|v| v.to_str().ok()),
            Some("revolve:0.1.0:")
        );
    }
}
