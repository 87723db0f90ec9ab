//! HTTP surface: settings CRUD, patient registry, health check.

pub mod patients;
pub mod settings;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use tokio::net::TcpListener;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;

use crate::db::DbPool;
use crate::error::AppError;

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct ServerState {
    pub pool: DbPool,
}

/// Build the full application router.
pub fn router(pool: DbPool) -> Router {
    let state = ServerState { pool };

    Router::new()
        .route(
            "/api/settings",
            get(settings::read_all)
                .post(settings::write_many)
                .put(settings::write_one),
        )
        .route("/api/patients", get(patients::list).post(patients::create))
        .route("/api/patients/{id}", get(patients::get_one))
        .route("/health", get(health))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

/// Bind to `addr` and serve until the shutdown channel fires.
pub async fn start_server(
    addr: SocketAddr,
    pool: DbPool,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let listener = TcpListener::bind(addr).await?;
    serve(listener, pool, shutdown_rx).await
}

/// Serve on an already-bound listener. Tests bind port 0 and call this directly.
pub async fn serve(
    listener: TcpListener,
    pool: DbPool,
    mut shutdown_rx: watch::Receiver<bool>,
) -> Result<(), AppError> {
    let app = router(pool);
    tracing::info!("Clinic server listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            // Wait until the shutdown signal is sent
            let _ = shutdown_rx.changed().await;
            tracing::info!("Clinic server shutting down");
        })
        .await?;

    Ok(())
}

/// Health check endpoint.
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ok", "service": "clinic-desk" }))
}

/// `{ "error": message }` with the given status.
pub(crate) fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

/// Run a blocking repository call off the async workers.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, AppError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f).await?
}

#[cfg(test)]
pub(crate) mod test_support {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use axum::Router;
    use tower::ServiceExt;

    /// Send one request through the router and decode the JSON reply.
    pub async fn call(
        router: &Router,
        method: &str,
        uri: &str,
        body: Option<&str>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if body.is_some() {
            builder = builder.header("content-type", "application/json");
        }
        let request = builder
            .body(body.map(|b| Body::from(b.to_string())).unwrap_or_else(Body::empty))
            .unwrap();

        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), 1024 * 1024).await.unwrap();
        let value = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }
}
