//! Shared test utilities for the chatbot proxy services.
//!
//! This crate provides:
//! - Proptest generators for boundary identifiers, headers and bodies
//! - Fixtures describing a sample deployment

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use generators::*;
