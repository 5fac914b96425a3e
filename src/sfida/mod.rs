//! HTTP surface of the challenge service.
//!
//! - `POST /v1/triggers` answers the provider's Define, Create and Verify calls.
//! - `PUT /v1/security-questions/:user_id` enrolls the first challenge.
//! - `GET /health` reports whether the security question store is reachable.

use anyhow::Result;
use axum::{
    body::Body,
    extract::MatchedPath,
    http::{HeaderName, HeaderValue, Request},
    routing::{get, post, put},
    Extension, Router,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::PropagateRequestIdLayer, set_header::SetRequestHeaderLayer, trace::TraceLayer,
};
use tracing::{info, info_span, Span};
use ulid::Ulid;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::challenge::{Orchestrator, SecurityQuestionStore};

pub mod handlers;
pub mod openapi;

pub use openapi::ApiDoc;

/// Build the application router with every route, the API docs and the
/// request-id/trace layers.
pub fn router(orchestrator: Arc<Orchestrator>, store: Arc<dyn SecurityQuestionStore>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health).options(handlers::health::health))
        .route("/v1/triggers", post(handlers::trigger::trigger))
        .route(
            "/v1/security-questions/:user_id",
            put(handlers::security_question::store_security_question),
        )
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestHeaderLayer::if_not_present(
                    HeaderName::from_static("x-request-id"),
                    |_req: &_| HeaderValue::from_str(Ulid::new().to_string().as_str()).ok(),
                ))
                .layer(PropagateRequestIdLayer::new(HeaderName::from_static(
                    "x-request-id",
                )))
                .layer(TraceLayer::new_for_http().make_span_with(make_span))
                .layer(Extension(orchestrator))
                .layer(Extension(store)),
        )
}

/// Start the server
/// # Errors
/// Return error if failed to bind or serve
pub async fn new(
    port: u16,
    orchestrator: Arc<Orchestrator>,
    store: Arc<dyn SecurityQuestionStore>,
) -> Result<()> {
    let app = router(orchestrator, store);

    let listener = TcpListener::bind(format!("::0:{port}")).await?;

    info!("Listening on [::]:{}", port);

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Gracefully shutdown");
            }
        })
        .await?;

    Ok(())
}

fn make_span(request: &Request<Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
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
