//! Polling facade for device telemetry
//!
//! Time-gates requests into the connection manager and exposes the
//! last-known telemetry values as formatted strings for a metrics exporter.
//! A failed poll never raises; the previously cached values keep being
//! served so the consumer sees stale data rather than gaps.

pub mod plug;

pub use plug::{PlugMonitor, PlugSettings};
