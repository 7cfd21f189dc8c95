//! Tower Middleware Stack
//!
//! Composable middleware layers for the proxy.

pub mod stack;
pub mod timeout;
pub mod tracing;

pub use self::stack::build_service_stack;
pub use self::timeout::TimeoutLayer;
pub use self::tracing::TracingLayer;
