//! Timeout Tower Layer
//!
//! Bounds the whole request, including the upstream call. Expiry becomes a
//! `504` response rather than a service error so axum can serve it.

use std::convert::Infallible;
use std::task::{Context, Poll};
use std::time::Duration;

use axum::response::{IntoResponse, Response};
use futures::future::BoxFuture;
use tokio::time::timeout;
use tower::{Layer, Service};

use crate::error::ProxyError;

/// Timeout layer for Tower
#[derive(Debug, Clone, Copy)]
pub struct TimeoutLayer {
    duration: Duration,
}

impl TimeoutLayer {
    /// Creates a new timeout layer with the given duration
    #[must_use]
    pub const fn new(duration: Duration) -> Self {
        Self { duration }
    }
}

impl<S> Layer<S> for TimeoutLayer {
    type Service = TimeoutService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TimeoutService {
            inner,
            duration: self.duration,
        }
    }
}

/// Timeout service wrapper
#[derive(Debug, Clone)]
pub struct TimeoutService<S> {
    inner: S,
    duration: Duration,
}

impl<S, Req> Service<Req> for TimeoutService<S>
where
    S: Service<Req, Error = Infallible> + Clone + Send + 'static,
    S::Response: IntoResponse,
    S::Future: Send + 'static,
    Req: Send + 'static,
{
    type Response = Response;
    type Error = Infallible;
    type Future = BoxFuture<'static, Result<Response, Infallible>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Req) -> Self::Future {
        let duration = self.duration;
        // Drive the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(async move {
            match timeout(duration, inner.call(req)).await {
                Ok(result) => result.map(IntoResponse::into_response),
                Err(_) => Ok(ProxyError::UpstreamTimeout { duration }.into_response()),
            }
        })
    }
}
