//! Cognito private proxy.
//!
//! A passthrough in front of the regional Cognito identity endpoint that is
//! reachable only through one designated interface endpoint. Requests that
//! pass the network-boundary policy are forwarded verbatim; the upstream
//! answer is relayed unchanged apart from a fixed CORS header set.
//!
//! The same configuration also renders the provisioning [`blueprint`] that
//! describes the interface endpoint, private API and resource policy.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod blueprint;
pub mod boundary;
pub mod config;
pub mod cors;
pub mod error;
pub mod middleware;
pub mod policy;
pub mod proxy;
pub mod shutdown;
pub mod upstream;

pub use blueprint::{Blueprint, ResourceGraph};
pub use config::{Config, ConfigError, ServerConfig, SystemConfig};
pub use error::{ErrorCode, ProxyError};
pub use proxy::{app, router, ProxyState};
pub use upstream::{ForwardRequest, IdentityForwarder, UpstreamResponse};
