//! Type-Safe Configuration with Validation
//!
//! The provisioning record ([`SystemConfig`]) and the runtime knobs
//! ([`ServerConfig`]) are loaded once at startup, validated, and then passed
//! explicitly to whatever needs them. Nothing here is global.

use std::env;
use std::path::Path;
use std::time::Duration;

use axum::http::HeaderName;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use crate::boundary::{NetworkBoundary, VpcEndpointId, DEFAULT_BOUNDARY_HEADER};
use crate::upstream::{IdentityEndpoint, Region};

/// Configuration errors.
///
/// These only ever fail startup or blueprint rendering, never a request.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Domain is empty or not a bare host name
    #[error("Invalid domain {0:?}: expected a bare host name such as app.example.com")]
    InvalidDomain(String),

    /// Region identifier is malformed
    #[error("Invalid region {0:?}")]
    InvalidRegion(String),

    /// Interface endpoint identifier is malformed
    #[error("Invalid private network id {0:?}: expected vpce-<hex>")]
    InvalidBoundary(String),

    /// Invalid URL format
    #[error("Invalid URL for {field}: {reason}")]
    InvalidUrl {
        /// Variable or field name
        field: String,
        /// Parser message
        reason: String,
    },

    /// Invalid header name
    #[error("Invalid header name for {field}: {value:?}")]
    InvalidHeader {
        /// Variable or field name
        field: String,
        /// Offending value
        value: String,
    },

    /// Invalid port number
    #[error("Invalid port: must be between 1 and 65535")]
    InvalidPort,

    /// A duration or size that must be positive was zero
    #[error("Invalid {0}: must be greater than 0")]
    NotPositive(&'static str),

    /// Missing required field
    #[error("Missing required configuration: {0}")]
    MissingRequired(String),

    /// Environment variable parse error
    #[error("Failed to parse environment variable {name}: {reason}")]
    ParseError {
        /// Variable name
        name: String,
        /// Parser message
        reason: String,
    },

    /// Config file could not be read or decoded
    #[error("Failed to load config file {path}: {reason}")]
    File {
        /// File path
        path: String,
        /// Underlying error
        reason: String,
    },
}

/// Provisioning-time record for one deployment.
///
/// Field names follow the JSON system config file (`camelCase`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemConfig {
    /// The single allowed CORS origin host, without scheme
    pub domain: String,
    /// Region selecting the identity endpoint
    pub region: String,
    /// Interface endpoint identifier that forms the trust boundary
    pub private_network_id: String,
    /// Enables request tracing on the provisioned stage
    #[serde(default)]
    pub advanced_monitoring: bool,
    /// Subnets the interface endpoint is placed in
    #[serde(default)]
    pub subnets: Vec<String>,
}

impl SystemConfig {
    /// Reads a JSON system config file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let file_err = |reason: String| ConfigError::File {
            path: path.display().to_string(),
            reason,
        };
        let raw = std::fs::read_to_string(path).map_err(|e| file_err(e.to_string()))?;
        serde_json::from_str(&raw).map_err(|e| file_err(e.to_string()))
    }

    /// Validates domain, region and boundary id.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_domain(&self.domain)?;
        self.region()?;
        self.endpoint_id()?;
        Ok(())
    }

    /// The parsed region.
    pub fn region(&self) -> Result<Region, ConfigError> {
        if self.region.is_empty() {
            return Err(ConfigError::MissingRequired("region".to_string()));
        }
        Region::parse(&self.region)
    }

    /// The parsed interface endpoint identifier.
    pub fn endpoint_id(&self) -> Result<VpcEndpointId, ConfigError> {
        if self.private_network_id.is_empty() {
            return Err(ConfigError::MissingRequired("privateNetworkId".to_string()));
        }
        VpcEndpointId::parse(&self.private_network_id)
    }

    /// `https://<domain>`
    #[must_use]
    pub fn allowed_origin(&self) -> String {
        format!("https://{}", self.domain)
    }
}

fn validate_domain(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::MissingRequired("domain".to_string()));
    }
    let bare = !domain.contains("://")
        && !domain.contains('/')
        && !domain.chars().any(char::is_whitespace);
    let parses = Url::parse(&format!("https://{domain}"))
        .ok()
        .and_then(|u| u.host_str().map(str::to_owned))
        .is_some();
    if bare && parses {
        Ok(())
    } else {
        Err(ConfigError::InvalidDomain(domain.to_string()))
    }
}

/// Runtime settings for the listening proxy.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address
    pub host: String,
    /// Bind port (1-65535)
    pub port: u16,
    /// Upper bound for one forwarded request
    pub request_timeout: Duration,
    /// Grace period for in-flight requests on shutdown
    pub shutdown_timeout: Duration,
    /// Largest accepted request body
    pub max_body_bytes: usize,
    /// Header through which the network reports the source endpoint
    pub boundary_header: String,
    /// Replaces the derived identity endpoint when set
    pub identity_endpoint_override: Option<Url>,
    /// Fallback log filter
    pub log_level: String,
    /// Emit JSON log lines
    pub log_json: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8443,
            request_timeout: Duration::from_secs(29),
            shutdown_timeout: Duration::from_secs(30),
            max_body_bytes: 10 * 1024 * 1024,
            boundary_header: DEFAULT_BOUNDARY_HEADER.to_string(),
            identity_endpoint_override: None,
            log_level: "info".to_string(),
            log_json: false,
        }
    }
}

impl ServerConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidPort);
        }
        if self.request_timeout.is_zero() {
            return Err(ConfigError::NotPositive("request timeout"));
        }
        if self.shutdown_timeout.is_zero() {
            return Err(ConfigError::NotPositive("shutdown timeout"));
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::NotPositive("body limit"));
        }
        HeaderName::from_bytes(self.boundary_header.as_bytes()).map_err(|_| {
            ConfigError::InvalidHeader {
                field: "BOUNDARY_HEADER".to_string(),
                value: self.boundary_header.clone(),
            }
        })?;
        Ok(())
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Provisioning record
    pub system: SystemConfig,
    /// Runtime settings
    pub server: ServerConfig,
}

impl Config {
    /// Loads configuration from the process environment (and `.env`).
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Loads configuration from an arbitrary variable source.
    ///
    /// When `CONFIG_FILE` is present the file supplies the system record and
    /// individual variables override its fields.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut system = match lookup("CONFIG_FILE") {
            Some(path) => SystemConfig::from_file(Path::new(&path))?,
            None => SystemConfig::default(),
        };
        if let Some(domain) = lookup("DOMAIN") {
            system.domain = domain;
        }
        if let Some(region) = lookup("AWS_REGION") {
            system.region = region;
        }
        if let Some(id) = lookup("PRIVATE_NETWORK_ID") {
            system.private_network_id = id;
        }
        if lookup("ADVANCED_MONITORING").is_some() {
            system.advanced_monitoring = parse_var(&lookup, "ADVANCED_MONITORING", false)?;
        }
        if let Some(subnets) = lookup("SUBNET_IDS") {
            system.subnets = parse_list(&subnets);
        }

        let defaults = ServerConfig::default();
        let identity_endpoint_override = lookup("IDENTITY_ENDPOINT_URL")
            .map(|raw| {
                Url::parse(&raw).map_err(|e| ConfigError::InvalidUrl {
                    field: "IDENTITY_ENDPOINT_URL".to_string(),
                    reason: e.to_string(),
                })
            })
            .transpose()?;

        let server = ServerConfig {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_var(&lookup, "PORT", defaults.port)?,
            request_timeout: Duration::from_secs(parse_var(
                &lookup,
                "REQUEST_TIMEOUT",
                defaults.request_timeout.as_secs(),
            )?),
            shutdown_timeout: Duration::from_secs(parse_var(
                &lookup,
                "SHUTDOWN_TIMEOUT",
                defaults.shutdown_timeout.as_secs(),
            )?),
            max_body_bytes: parse_var(&lookup, "MAX_BODY_BYTES", defaults.max_body_bytes)?,
            boundary_header: lookup("BOUNDARY_HEADER")
                .map(|h| h.to_ascii_lowercase())
                .unwrap_or(defaults.boundary_header),
            identity_endpoint_override,
            log_level: lookup("LOG_LEVEL").unwrap_or(defaults.log_level),
            log_json: parse_var(&lookup, "LOG_JSON", defaults.log_json)?,
        };

        let config = Self { system, server };
        config.validate()?;
        Ok(config)
    }

    /// Validates both halves.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.system.validate()?;
        self.server.validate()
    }

    /// The trust boundary described by this configuration.
    pub fn boundary(&self) -> Result<NetworkBoundary, ConfigError> {
        NetworkBoundary::new(self.system.endpoint_id()?, &self.server.boundary_header)
    }

    /// The forwarding target, honouring the override.
    pub fn identity_endpoint(&self) -> Result<IdentityEndpoint, ConfigError> {
        match &self.server.identity_endpoint_override {
            Some(url) => Ok(IdentityEndpoint::from_url(url.clone())),
            None => IdentityEndpoint::for_region(&self.system.region()?),
        }
    }

    /// Outbound client settings derived from the runtime config.
    #[must_use]
    pub fn http_config(&self) -> rust_common::HttpConfig {
        rust_common::HttpConfig::default().with_timeout(self.server.request_timeout)
    }

    /// Socket address string to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}

/// Parse a variable with a default value.
fn parse_var<T, F>(lookup: &F, name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(val) => val.trim().parse().map_err(|e: T::Err| ConfigError::ParseError {
            name: name.to_string(),
            reason: e.to_string(),
        }),
        None => Ok(default),
    }
}

/// Parse a comma-separated list, dropping empty items.
fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
