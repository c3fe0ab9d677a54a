//! Observability: Prometheus metrics for the bridge

pub mod metrics;

pub use metrics::{GaugeSnapshot, TransportMetrics};
