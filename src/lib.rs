//! Clipforge - single-job media editing pipeline
//!
//! This library crate exposes the binary's building blocks for integration
//! testing.

pub mod config;
pub mod job;
