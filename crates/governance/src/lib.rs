#![deny(unused)]
//! Observability for the Webs gateway.
//!
//! This crate provides:
//! - Tracing subscriber setup (plain or JSON logs, optional OTLP export)
//! - Prometheus metrics recorder and helpers

pub mod metrics;
pub mod tracing_layer;

pub use metrics::{setup_metrics_recorder, track_provider_attempt, track_reply, track_request};
pub use tracing_layer::configure_tracing;
