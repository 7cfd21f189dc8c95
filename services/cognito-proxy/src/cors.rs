//! Fixed CORS header set.
//!
//! The origin is configured, never echoed from the request.

use axum::http::header::{
    ACCESS_CONTROL_ALLOW_CREDENTIALS, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
    ACCESS_CONTROL_ALLOW_ORIGIN,
};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::config::ConfigError;

/// Request headers a browser may send.
pub const ALLOWED_HEADERS: [&str; 5] = [
    "Content-Type",
    "Authorization",
    "Cache-Control",
    "X-Amz-User-Target",
    "X-Amz-User-Agent",
];

/// Methods exposed by the proxy.
pub const ALLOWED_METHODS: [Method; 2] = [Method::POST, Method::OPTIONS];

/// CORS policy bound to one origin.
#[derive(Debug, Clone)]
pub struct CorsPolicy {
    origin: HeaderValue,
    headers: HeaderValue,
    methods: HeaderValue,
}

impl CorsPolicy {
    /// Policy allowing only `https://<domain>`.
    pub fn for_domain(domain: &str) -> Result<Self, ConfigError> {
        let origin = HeaderValue::from_str(&format!("https://{domain}"))
            .map_err(|_| ConfigError::InvalidDomain(domain.to_string()))?;
        let methods = ALLOWED_METHODS
            .iter()
            .map(Method::as_str)
            .collect::<Vec<_>>()
            .join(",");
        Ok(Self {
            origin,
            headers: HeaderValue::from_static(concat!(
                "Content-Type,Authorization,Cache-Control,",
                "X-Amz-User-Target,X-Amz-User-Agent"
            )),
            methods: HeaderValue::from_str(&methods)
                .map_err(|_| ConfigError::InvalidDomain(domain.to_string()))?,
        })
    }

    /// The single accepted origin.
    #[must_use]
    pub fn origin(&self) -> &HeaderValue {
        &self.origin
    }

    /// Sets the four CORS headers, replacing any existing values.
    pub fn apply(&self, headers: &mut HeaderMap) {
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, self.origin.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_CREDENTIALS, HeaderValue::from_static("true"));
        headers.insert(ACCESS_CONTROL_ALLOW_HEADERS, self.headers.clone());
        headers.insert(ACCESS_CONTROL_ALLOW_METHODS, self.methods.clone());
    }

    /// Response to `OPTIONS /`: status 200, CORS headers, empty body.
    #[must_use]
    pub fn preflight(&self) -> Response {
        let mut response = StatusCode::OK.into_response();
        self.apply(response.headers_mut());
        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn applies_fixed_headers() {
        let policy = CorsPolicy::for_domain("app.example.com").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
        policy.apply(&mut headers);

        assert_eq!(headers.get_all(ACCESS_CONTROL_ALLOW_ORIGIN).iter().count(), 1);
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_CREDENTIALS], "true");
        assert_eq!(headers[ACCESS_CONTROL_ALLOW_METHODS], "POST,OPTIONS");
        assert_eq!(
            headers[ACCESS_CONTROL_ALLOW_HEADERS],
            ALLOWED_HEADERS.join(",").as_str()
        );
    }

    #[test]
    fn preflight_is_empty_200() {
        let policy = CorsPolicy::for_domain("app.example.com").unwrap();
        let response = policy.preflight();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[ACCESS_CONTROL_ALLOW_ORIGIN], "https://app.example.com");
    }

    #[test]
    fn rejects_domain_with_control_chars() {
        assert!(CorsPolicy::for_domain("bad\ndomain").is_err());
    }
}
