use std::sync::Arc;

use axum::extract::Request;
use axum::http::{header, HeaderName};
use axum::routing::get;
use axum::Router;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::sensitive_headers::SetSensitiveRequestHeadersLayer;
use tower_http::trace::TraceLayer;

use crate::store::PersonStore;

pub mod configuration;
pub mod error;
pub mod routes;
pub mod store;
pub mod structs;
pub mod telemetry;

pub use store::mongo::get_database_connection;

const REQUEST_ID_HEADER: &str = "x-request-id";

pub async fn run<S: PersonStore>(listener: TcpListener, store: S) -> Result<(), std::io::Error> {
    axum::serve(listener, app(Arc::new(store)).into_make_service()).await
}

pub fn app<S: PersonStore>(store: Arc<S>) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health-check", get(routes::health_check))
        .route(
            "/persons/",
            get(routes::list_persons::<S>).post(routes::create_person::<S>),
        )
        .route("/persons/search/", get(routes::search_persons::<S>))
        .route(
            "/persons/:id/",
            get(routes::get_person::<S>)
                .put(routes::update_person::<S>)
                .patch(routes::partial_update_person::<S>)
                .delete(routes::delete_person::<S>),
        )
        .with_state(store)
        .layer(
            ServiceBuilder::new()
                .layer(SetSensitiveRequestHeadersLayer::new([
                    header::AUTHORIZATION,
                    header::COOKIE,
                ]))
                .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http().make_span_with(|request: &Request| {
                        let request_id = request
                            .headers()
                            .get(REQUEST_ID_HEADER)
                            .and_then(|value| value.to_str().ok())
                            .unwrap_or_default();
                        tracing::info_span!(
                            "http_request",
                            method = %request.method(),
                            uri = %request.uri(),
                            request_id = %request_id,
                        )
                    }),
                )
                .layer(PropagateRequestIdLayer::new(request_id)),
        )
}
