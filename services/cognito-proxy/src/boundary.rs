//! Network boundary descriptor.
//!
//! The unit of trust is the interface endpoint a request arrived through,
//! not the caller. The hosting network stamps the endpoint identifier on
//! each request; we only read it.

use std::fmt;
use std::sync::OnceLock;

use axum::http::{HeaderMap, HeaderName};
use regex::Regex;
use serde::{Serialize, Serializer};

use crate::config::ConfigError;

/// Header AWS private API endpoints use to report the source interface endpoint.
pub const DEFAULT_BOUNDARY_HEADER: &str = "x-amzn-vpce-id";

fn endpoint_id_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        #[allow(clippy::expect_used)]
        Regex::new(r"^vpce-[0-9a-f]{8,17}$").expect("static pattern")
    })
}

/// Interface endpoint identifier, e.g. `vpce-0a1b2c3d4e5f60718`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VpcEndpointId(String);

impl VpcEndpointId {
    /// Parses and validates an identifier.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let trimmed = raw.trim();
        if endpoint_id_pattern().is_match(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(ConfigError::InvalidBoundary(raw.to_string()))
        }
    }

    /// The identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VpcEndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Serialize for VpcEndpointId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// The single private entry point allowed to reach the proxy.
#[derive(Debug, Clone)]
pub struct NetworkBoundary {
    endpoint_id: VpcEndpointId,
    header: HeaderName,
}

impl NetworkBoundary {
    /// Creates a boundary read from `header`.
    pub fn new(endpoint_id: VpcEndpointId, header: &str) -> Result<Self, ConfigError> {
        let header = HeaderName::from_bytes(header.as_bytes()).map_err(|_| {
            ConfigError::InvalidHeader {
                field: "boundary header".to_string(),
                value: header.to_string(),
            }
        })?;
        Ok(Self { endpoint_id, header })
    }

    /// The configured endpoint identifier.
    #[must_use]
    pub fn endpoint_id(&self) -> &VpcEndpointId {
        &self.endpoint_id
    }

    /// Header carrying the observed source endpoint.
    #[must_use]
    pub fn header(&self) -> &HeaderName {
        &self.header
    }

    /// Source endpoint reported for a request, if any.
    ///
    /// A header that is absent, repeated, empty or not valid UTF-8 yields
    /// `None`, which no policy condition can match.
    #[must_use]
    pub fn source_of(&self, headers: &HeaderMap) -> Option<String> {
        let mut values = headers.get_all(&self.header).iter();
        let first = values.next()?;
        if values.next().is_some() {
            return None;
        }
        let value = first.to_str().ok()?.trim();
        (!value.is_empty()).then(|| value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn boundary() -> NetworkBoundary {
        NetworkBoundary::new(
            VpcEndpointId::parse("vpce-0a1b2c3d4e5f60718").unwrap(),
            DEFAULT_BOUNDARY_HEADER,
        )
        .unwrap()
    }

    #[test]
    fn parses_valid_ids() {
        assert!(VpcEndpointId::parse("vpce-0a1b2c3d4e5f60718").is_ok());
        assert!(VpcEndpointId::parse("vpce-12345678").is_ok());
        assert_eq!(
            VpcEndpointId::parse(" vpce-12345678 ").unwrap().as_str(),
            "vpce-12345678"
        );
    }

    #[test]
    fn rejects_malformed_ids() {
        for raw in ["", "vpce-", "vpce-XYZ12345", "vpc-12345678", "vpce-1234567", "vpce-0a1b2c3d4e5f607189"] {
            assert!(VpcEndpointId::parse(raw).is_err(), "{raw} should be rejected");
        }
    }

    #[test]
    fn reads_source_from_header() {
        let mut headers = HeaderMap::new();
        headers.insert(DEFAULT_BOUNDARY_HEADER, HeaderValue::from_static("vpce-0a1b2c3d4e5f60718"));
        assert_eq!(boundary().source_of(&headers).as_deref(), Some("vpce-0a1b2c3d4e5f60718"));
    }

    #[test]
    fn missing_or_repeated_header_has_no_source() {
        let b = boundary();
        assert_eq!(b.source_of(&HeaderMap::new()), None);

        let mut headers = HeaderMap::new();
        headers.append(DEFAULT_BOUNDARY_HEADER, HeaderValue::from_static("vpce-0a1b2c3d4e5f60718"));
        headers.append(DEFAULT_BOUNDARY_HEADER, HeaderValue::from_static("vpce-99999999"));
        assert_eq!(b.source_of(&headers), None);
    }

    #[test]
    fn rejects_invalid_header_name() {
        let id = VpcEndpointId::parse("vpce-12345678").unwrap();
        assert!(NetworkBoundary::new(id, "bad header").is_err());
    }
}
