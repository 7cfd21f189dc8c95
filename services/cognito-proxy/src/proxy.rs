//! The private authentication proxy.
//!
//! Every request crosses the boundary gate first. Only requests the access
//! policy allows reach a handler; everything else is answered with a generic
//! 403 and never forwarded.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;

use crate::blueprint::STAGE_NAME;
use crate::boundary::NetworkBoundary;
use crate::config::Config;
use crate::cors::CorsPolicy;
use crate::error::ProxyError;
use crate::middleware::build_service_stack;
use crate::policy::{PolicyDocument, RequestContext};
use crate::upstream::{ForwardRequest, HttpForwarder, IdentityForwarder};

/// Shared, read-only state for all requests.
#[derive(Clone)]
pub struct ProxyState {
    forwarder: Arc<dyn IdentityForwarder>,
    policy: Arc<PolicyDocument>,
    boundary: Arc<NetworkBoundary>,
    cors: Arc<CorsPolicy>,
    body_limit: usize,
}

impl ProxyState {
    /// Assembles state around an arbitrary forwarder.
    pub fn new(config: &Config, forwarder: Arc<dyn IdentityForwarder>) -> anyhow::Result<Self> {
        let boundary = config.boundary()?;
        let policy = PolicyDocument::private_endpoint_only(boundary.endpoint_id());
        Ok(Self {
            forwarder,
            policy: Arc::new(policy),
            boundary: Arc::new(boundary),
            cors: Arc::new(CorsPolicy::for_domain(&config.system.domain)?),
            body_limit: config.server.max_body_bytes,
        })
    }

    /// State forwarding to the configured identity endpoint over HTTPS.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let forwarder = HttpForwarder::new(config.identity_endpoint()?, &config.http_config())?;
        tracing::info!(endpoint = %forwarder.endpoint().url(), "identity endpoint resolved");
        Self::new(config, Arc::new(forwarder))
    }

    /// The policy the gate enforces.
    #[must_use]
    pub fn policy(&self) -> &PolicyDocument {
        &self.policy
    }
}

/// Routes plus boundary gate, without the outer middleware.
///
/// The body limit sits inside the gate so a caller outside the boundary
/// always sees the same 403, whatever it sends.
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/", post(forward).options(preflight).fallback(forbidden))
        .fallback(forbidden)
        .layer(RequestBodyLimitLayer::new(state.body_limit))
        .layer(middleware::from_fn_with_state(state.clone(), boundary_gate))
        .with_state(state)
}

/// The complete application: outer middleware around [`router`].
pub fn app(config: &Config, state: ProxyState) -> Router {
    build_service_stack(router(state), &config.server)
}

async fn boundary_gate(State(state): State<ProxyState>, request: Request, next: Next) -> Response {
    let source = state.boundary.source_of(request.headers());
    let ctx = RequestContext::invoke(
        STAGE_NAME,
        request.method().as_str(),
        request.uri().path(),
        source.as_deref(),
    );
    let decision = state.policy.evaluate(&ctx);

    if decision.is_allowed() {
        next.run(request).await
    } else {
        tracing::warn!(
            source = source.as_deref().unwrap_or("<none>"),
            ?decision,
            "request refused at network boundary"
        );
        ProxyError::AccessDenied.into_response()
    }
}

async fn forward(
    State(state): State<ProxyState>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Response {
    let mut response = match relay(&state, &headers, body).await {
        Ok(response) => response,
        Err(err) => err.into_response(),
    };
    state.cors.apply(response.headers_mut());
    response
}

async fn relay(
    state: &ProxyState,
    headers: &HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Result<Response, ProxyError> {
    let body = body.map_err(|rejection| {
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ProxyError::PayloadTooLarge
        } else {
            ProxyError::Internal(anyhow::anyhow!(rejection.body_text()))
        }
    })?;

    let upstream = state
        .forwarder
        .forward(ForwardRequest::from_parts(headers, body))
        .await?;

    let mut response = (upstream.status, upstream.body).into_response();
    *response.headers_mut() = upstream.headers;
    Ok(response)
}

async fn preflight(State(state): State<ProxyState>) -> Response {
    state.cors.preflight()
}

async fn forbidden() -> ProxyError {
    ProxyError::AccessDenied
}
