use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/hello",
    responses(
        (status = 200, description = "Liveness greeting", body = String, content_type = "text/plain")
    ),
    tag = "health"
)]
pub async fn hello() -> impl IntoResponse {
    "Hello"
}

// Undocumented alias of `/hello` served at `/`.
pub async fn root() -> impl IntoResponse {
    "Hello"
}
