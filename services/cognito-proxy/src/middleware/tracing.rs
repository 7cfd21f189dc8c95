//! Request tracing Tower layer.
//!
//! Opens one span per request carrying a fresh correlation id. Only the
//! method, path and resulting status are recorded; headers and bodies of
//! the forwarded call stay out of the logs.

use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::extract::Request;
use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tower::{Layer, Service};
use tracing::{info_span, Instrument};
use uuid::Uuid;

/// Tracing layer for Tower
#[derive(Debug, Clone)]
pub struct TracingLayer {
    service_name: &'static str,
}

impl TracingLayer {
    /// Creates a new tracing layer
    #[must_use]
    pub const fn new(service_name: &'static str) -> Self {
        Self { service_name }
    }
}

impl<S> Layer<S> for TracingLayer {
    type Service = TracingService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TracingService {
            inner,
            service_name: self.service_name,
        }
    }
}

/// Tracing service wrapper
#[derive(Debug, Clone)]
pub struct TracingService<S> {
    inner: S,
    service_name: &'static str,
}

impl<S> Service<Request> for TracingService<S>
where
    S: Service<Request, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request) -> Self::Future {
        let correlation_id = Uuid::new_v4();
        let span = info_span!(
            "request",
            service = self.service_name,
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let started = Instant::now();
                let response = inner.call(req).await?.into_response();
                let status = response.status();
                let elapsed_ms = started.elapsed().as_millis();

                if status.is_server_error() {
                    tracing::warn!(status = status.as_u16(), elapsed_ms, "request completed");
                } else {
                    tracing::info!(status = status.as_u16(), elapsed_ms, "request completed");
                }
                Ok(response)
            }
            .instrument(span),
        )
    }
}
