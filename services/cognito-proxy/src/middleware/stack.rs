//! Service Stack Builder
//!
//! Composes the outer middleware layers in the correct order.

use axum::Router;
use tower::ServiceBuilder;

use crate::config::ServerConfig;
use crate::middleware::timeout::TimeoutLayer;
use crate::middleware::tracing::TracingLayer;

/// Wraps the routes with the outer middleware.
///
/// Layer order (outermost to innermost):
/// 1. Tracing - one span per request, every outcome logged
/// 2. Timeout - bounds the whole request, including the upstream call
/// 3. Routes - boundary gate, body limit, handlers
pub fn build_service_stack(routes: Router, server: &ServerConfig) -> Router {
    routes.layer(
        ServiceBuilder::new()
            .layer(TracingLayer::new("cognito-proxy"))
            .layer(TimeoutLayer::new(server.request_timeout)),
    )
}
