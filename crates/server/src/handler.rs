//! HTTP application wiring.
//!
//! This module defines the shared state and the router that maps the
//! site catalog and query endpoints to their handlers.

use std::sync::Arc;

use axum::{Router, middleware, routing::get};
use stackpager_client::QuestionSource;
use stackpager_core::{SessionDb, SiteCatalog};
use tower_http::trace::TraceLayer;

use crate::routes::{fetch_handler, sites_handler};
use crate::throttle::{ThrottleState, throttle_middleware};

/// State shared by all handlers.
#[derive(Clone)]
pub struct AppState {
    pub sessions: SessionDb,
    pub source: Arc<dyn QuestionSource>,
    pub catalog: Arc<SiteCatalog>,
    /// Max-Age for newly issued session cookies.
    pub session_ttl_secs: i64,
}

/// Build the application router.
///
/// The throttle only guards the query endpoint.
pub fn router(state: AppState, throttle: ThrottleState) -> Router {
    let fetch = Router::new()
        .route("/fetch", get(fetch_handler))
        .layer(middleware::from_fn_with_state(throttle, throttle_middleware));

    Router::new()
        .route("/", get(sites_handler))
        .merge(fetch)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
