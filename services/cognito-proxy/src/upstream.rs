//! Forwarding target and the outbound call to it.

use std::fmt;
use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::Bytes;
use axum::http::{header, HeaderMap, HeaderName, StatusCode};
use regex::Regex;
use reqwest::Client;
use rust_common::{build_http_client, HttpConfig, PlatformError};
use url::Url;

use crate::config::ConfigError;
use crate::error::ProxyError;

/// Request headers copied to the identity endpoint.
///
/// `Authorization` and `Content-Type` are the contract; the two AWS JSON
/// protocol headers are required by the identity API to select an operation.
pub const FORWARDED_HEADERS: [HeaderName; 4] = [
    header::AUTHORIZATION,
    header::CONTENT_TYPE,
    HeaderName::from_static("x-amz-target"),
    HeaderName::from_static("x-amz-user-agent"),
];

/// Connection-scoped headers never relayed back to the caller.
const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRAILER,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

fn region_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^[a-z]{2}(-gov|-iso[a-z]?)?-[a-z]+-[0-9]{1,2}$").expect("static pattern")
    })
}

/// Validated region identifier such as `us-east-1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Region(String);

impl Region {
    /// Parses a region identifier.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if region_pattern().is_match(raw) {
            Ok(Self(raw.to_string()))
        } else {
            Err(ConfigError::InvalidRegion(raw.to_string()))
        }
    }

    /// The identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// DNS suffix of the partition this region belongs to.
    #[must_use]
    pub fn dns_suffix(&self) -> &'static str {
        if self.0.starts_with("cn-") {
            "amazonaws.com.cn"
        } else {
            "amazonaws.com"
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The identity-provider token endpoint for one deployment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityEndpoint {
    url: Url,
}

impl IdentityEndpoint {
    /// `https://cognito-idp.<region>.<suffix>`
    pub fn for_region(region: &Region) -> Result<Self, ConfigError> {
        let raw = format!("https://cognito-idp.{}.{}/", region.as_str(), region.dns_suffix());
        let url = Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
            field: "AWS_REGION".to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self { url })
    }

    /// Uses an explicit URL.
    #[must_use]
    pub fn from_url(url: Url) -> Self {
        Self { url }
    }

    /// The target URL.
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }
}

/// What is sent upstream: the allow-listed headers and the untouched body.
#[derive(Debug, Clone, Default)]
pub struct ForwardRequest {
    /// Copied request headers
    pub headers: HeaderMap,
    /// Raw request body
    pub body: Bytes,
}

impl ForwardRequest {
    /// Selects the forwarded headers from an inbound request.
    #[must_use]
    pub fn from_parts(inbound: &HeaderMap, body: Bytes) -> Self {
        let mut headers = HeaderMap::new();
        for name in &FORWARDED_HEADERS {
            for value in inbound.get_all(name) {
                headers.append(name.clone(), value.clone());
            }
        }
        Self { headers, body }
    }
}

/// Whatever the identity endpoint answered, success or not.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    /// Upstream status, relayed as-is
    pub status: StatusCode,
    /// End-to-end upstream headers
    pub headers: HeaderMap,
    /// Upstream body
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Builds a response, dropping connection-scoped headers.
    #[must_use]
    pub fn new(status: StatusCode, mut headers: HeaderMap, body: Bytes) -> Self {
        for name in &HOP_BY_HOP {
            headers.remove(name);
        }
        headers.remove(header::CONTENT_LENGTH);
        Self { status, headers, body }
    }
}

/// Sends a request to the identity endpoint.
#[async_trait]
pub trait IdentityForwarder: Send + Sync {
    /// Performs exactly one upstream call. Upstream 4xx/5xx are `Ok`.
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse, ProxyError>;
}

/// `reqwest`-backed forwarder.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client,
    endpoint: IdentityEndpoint,
    timeout: Duration,
}

impl HttpForwarder {
    /// Builds the forwarder and its pooled client.
    pub fn new(endpoint: IdentityEndpoint, http: &HttpConfig) -> Result<Self, PlatformError> {
        Ok(Self {
            client: build_http_client(http)?,
            endpoint,
            timeout: http.timeout,
        })
    }

    fn transport_error(&self, err: &reqwest::Error) -> ProxyError {
        match PlatformError::from_transport(err) {
            PlatformError::Timeout(_) => ProxyError::UpstreamTimeout {
                duration: self.timeout,
            },
            other => other.into(),
        }
    }

    /// Target endpoint.
    #[must_use]
    pub fn endpoint(&self) -> &IdentityEndpoint {
        &self.endpoint
    }
}

#[async_trait]
impl IdentityForwarder for HttpForwarder {
    async fn forward(&self, request: ForwardRequest) -> Result<UpstreamResponse, ProxyError> {
        let response = self
            .client
            .post(self.endpoint.url().clone())
            .headers(request.headers)
            .body(request.body)
            .send()
            .await
            .map_err(|e| self.transport_error(&e))?;

        let status = response.status();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(&e))?;

        tracing::debug!(status = status.as_u16(), bytes = body.len(), "identity endpoint answered");
        Ok(UpstreamResponse::new(status, headers, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn derives_commercial_endpoint() {
        let region = Region::parse("us-east-1").unwrap();
        assert_eq!(
            IdentityEndpoint::for_region(&region).unwrap().url().as_str(),
            "https://cognito-idp.us-east-1.amazonaws.com/"
        );
    }

    #[test]
    fn derives_china_endpoint() {
        let region = Region::parse("cn-north-1").unwrap();
        assert_eq!(
            IdentityEndpoint::for_region(&region).unwrap().url().as_str(),
            "https://cognito-idp.cn-north-1.amazonaws.com.cn/"
        );
    }

    #[test]
    fn accepts_gov_regions_and_rejects_garbage() {
        assert!(Region::parse("us-gov-west-1").is_ok());
        for raw in ["", "US-EAST-1", "us-east", "us-east-1/evil", "us-east-1.attacker.com"] {
            assert!(Region::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn forward_request_keeps_only_allowed_headers() {
        let mut inbound = HeaderMap::new();
        inbound.insert(header::AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        inbound.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-amz-json-1.1"));
        inbound.insert("x-amz-target", HeaderValue::from_static("AWSCognitoIdentityProviderService.InitiateAuth"));
        inbound.insert("x-amzn-vpce-id", HeaderValue::from_static("vpce-12345678"));
        inbound.insert(header::COOKIE, HeaderValue::from_static("session=1"));

        let req = ForwardRequest::from_parts(&inbound, Bytes::from_static(b"{}"));

        assert_eq!(req.headers.len(), 3);
        assert_eq!(req.headers[header::AUTHORIZATION], "Bearer abc");
        assert!(req.headers.get("x-amzn-vpce-id").is_none());
        assert!(req.headers.get(header::COOKIE).is_none());
        assert_eq!(&req.body[..], b"{}");
    }

    #[test]
    fn upstream_response_strips_hop_by_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        headers.insert(header::TRANSFER_ENCODING, HeaderValue::from_static("chunked"));
        headers.insert(header::CONTENT_LENGTH, HeaderValue::from_static("2"));
        headers.insert("x-amzn-requestid", HeaderValue::from_static("req-1"));

        let resp = UpstreamResponse::new(StatusCode::OK, headers, Bytes::from_static(b"{}"));

        assert_eq!(resp.headers.len(), 1);
        assert_eq!(resp.headers["x-amzn-requestid"], "req-1");
    }
}
