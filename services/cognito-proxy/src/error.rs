//! Error handling module with type-safe, non-exhaustive error types
//!
//! Only failures the proxy itself produces live here. An identity endpoint
//! that answers 4xx/5xx is not an error: that answer is relayed verbatim as
//! an [`UpstreamResponse`](crate::upstream::UpstreamResponse).
//!
//! Response bodies are generic. A denied caller learns nothing
//! about why, and transport details never reach the client.

use std::time::Duration;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_common::PlatformError;
use thiserror::Error;

/// Non-exhaustive error enum for forward compatibility.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum ProxyError {
    /// Request did not arrive through the designated interface endpoint
    #[error("Access denied")]
    AccessDenied,

    /// Identity endpoint could not be reached or its body could not be read
    #[error("Identity endpoint unavailable: {reason}")]
    UpstreamUnavailable {
        /// Transport detail, logged but never returned
        reason: String,
    },

    /// The forwarded call exceeded the request timeout
    #[error("Identity endpoint timed out after {duration:?}")]
    UpstreamTimeout {
        /// How long the call ran
        duration: Duration,
    },

    /// Request body exceeded the configured limit
    #[error("Request body too large")]
    PayloadTooLarge,

    /// Internal error (details sanitized in responses)
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

/// Stable error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    /// See [`ProxyError::AccessDenied`]
    AccessDenied,
    /// See [`ProxyError::UpstreamUnavailable`]
    UpstreamUnavailable,
    /// See [`ProxyError::UpstreamTimeout`]
    UpstreamTimeout,
    /// See [`ProxyError::PayloadTooLarge`]
    PayloadTooLarge,
    /// See [`ProxyError::Internal`]
    Internal,
}

impl ErrorCode {
    /// String form used in logs.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::AccessDenied => "ACCESS_DENIED",
            Self::UpstreamUnavailable => "UPSTREAM_UNAVAILABLE",
            Self::UpstreamTimeout => "UPSTREAM_TIMEOUT",
            Self::PayloadTooLarge => "PAYLOAD_TOO_LARGE",
            Self::Internal => "INTERNAL_ERROR",
        }
    }

    /// HTTP status returned for this code.
    #[must_use]
    pub const fn http_status(&self) -> StatusCode {
        match self {
            Self::AccessDenied => StatusCode::FORBIDDEN,
            Self::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
            Self::UpstreamTimeout => StatusCode::GATEWAY_TIMEOUT,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing message; carries no request-specific detail.
    #[must_use]
    pub const fn public_message(&self) -> &'static str {
        match self {
            Self::AccessDenied => "Forbidden",
            Self::UpstreamUnavailable => "Bad Gateway",
            Self::UpstreamTimeout => "Endpoint request timed out",
            Self::PayloadTooLarge => "Request Too Long",
            Self::Internal => "Internal server error",
        }
    }
}

impl ProxyError {
    /// Get the error code for this error
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::AccessDenied => ErrorCode::AccessDenied,
            Self::UpstreamUnavailable { .. } => ErrorCode::UpstreamUnavailable,
            Self::UpstreamTimeout { .. } => ErrorCode::UpstreamTimeout,
            Self::PayloadTooLarge => ErrorCode::PayloadTooLarge,
            Self::Internal(_) => ErrorCode::Internal,
        }
    }
}

impl From<PlatformError> for ProxyError {
    fn from(err: PlatformError) -> Self {
        match err {
            PlatformError::Unavailable(reason) | PlatformError::InvalidInput(reason) => {
                Self::UpstreamUnavailable { reason }
            }
            other => Self::Internal(anyhow::Error::new(other)),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let code = self.code();
        match &self {
            Self::AccessDenied | Self::PayloadTooLarge => {}
            other => tracing::error!(code = code.as_str(), error = %other, "proxy failure"),
        }
        let body = serde_json::json!({ "message": code.public_message() });
        (code.http_status(), Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;

    async fn body_of(err: ProxyError) -> (StatusCode, String) {
        let resp = err.into_response();
        let status = resp.status();
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn access_denied_is_generic_403() {
        let (status, body) = body_of(ProxyError::AccessDenied).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body, r#"{"message":"Forbidden"}"#);
    }

    #[tokio::test]
    async fn transport_detail_is_not_exposed() {
        let err = ProxyError::UpstreamUnavailable {
            reason: "dns error: cognito-idp.us-east-1.amazonaws.com".to_string(),
        };
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert!(!body.contains("cognito-idp"));
    }

    #[tokio::test]
    async fn internal_detail_is_not_exposed() {
        let (status, body) = body_of(ProxyError::Internal(anyhow::anyhow!("secret path /etc/x"))).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!body.contains("secret"));
    }

    #[test]
    fn platform_errors_map_to_gateway_codes() {
        assert_eq!(
            ProxyError::from(PlatformError::unavailable("refused")).code(),
            ErrorCode::UpstreamUnavailable
        );
        assert_eq!(
            ProxyError::from(PlatformError::Internal("x".into())).code(),
            ErrorCode::Internal
        );
    }
}
