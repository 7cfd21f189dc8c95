//! Shared library for cross-cutting concerns in the chatbot proxy services.
//!
//! This crate provides centralized implementations for:
//! - Error types with retryability classification
//! - Outbound HTTP client configuration and building
//! - `tracing` subscriber initialization

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod http;
pub mod tracing_config;

pub use error::PlatformError;
pub use http::{build_http_client, HttpConfig};
pub use tracing_config::{init_tracing, TracingConfig};
