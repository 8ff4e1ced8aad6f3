use crate::{
    directory::PostgresDirectory,
    rotation::RotationEngine,
    token::TokenMinter,
};
use anyhow::{Context, Result};
use axum::{
    Extension, Router,
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, options},
};
use sqlx::postgres::PgPoolOptions;
use std::{sync::Arc, time::Duration};
use tokio::{net::TcpListener, sync::mpsc};
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{Span, info, info_span};
use ulid::Ulid;

pub mod handlers;
mod openapi;

pub use openapi::openapi;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Build the full application router around `engine`.
///
/// Documented routes come from the `OpenAPI` router; `/` (alias of `/hello`)
/// and `OPTIONS /health` (headers only) are added here undocumented.
#[must_use]
pub fn app(engine: Arc<RotationEngine>) -> Router {
    let (router, _openapi) = openapi::api_router().split_for_parts();

    router
        .route("/", get(handlers::root::root))
        .route("/health", options(handlers::health::health))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static(REQUEST_ID_HEADER),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    REQUEST_ID_HEADER,
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(engine)),
        )
}

/// Connect to the database and serve until Ctrl-C or a message on `shutdown`.
///
/// # Errors
/// Returns an error if the database is unreachable or the listener cannot bind.
pub async fn new(
    port: u16,
    dsn: String,
    minter: TokenMinter,
    directory_timeout: Duration,
    shutdown: mpsc::UnboundedReceiver<()>,
) -> Result<()> {
    let pool = PgPoolOptions::new()
        .min_connections(1)
        .max_connections(5)
        .max_lifetime(Duration::from_secs(60 * 2))
        .acquire_timeout(directory_timeout)
        .test_before_acquire(true)
        .connect(&dsn)
        .await
        .context("Failed to connect to database")?;

    let directory = Arc::new(PostgresDirectory::new(pool.clone()));
    let engine = Arc::new(
        RotationEngine::new(directory, minter).with_directory_timeout(directory_timeout),
    );

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    let served = axum::serve(listener, app(engine).into_make_service())
        .with_graceful_shutdown(shutdown_signal(shutdown))
        .await;

    pool.close().await;

    served?;

    Ok(())
}

async fn shutdown_signal(mut shutdown: mpsc::UnboundedReceiver<()>) {
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("Received Ctrl-C"),
        _ = shutdown.recv() => info!("Received shutdown signal"),
    }
    info!("Gracefully shutdown");
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|val| val.to_str().ok())
        .unwrap_or("none");
    let matched_path = request
        .extensions()
        .get::<MatchedPath>()
        .map_or_else(|| request.uri().path(), MatchedPath::as_str);

    info_span!(
        "http.request",
        http.method = %request.method(),
        http.route = matched_path,
        request_id
    )
}
