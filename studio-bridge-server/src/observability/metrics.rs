//! Metrics for the bridge and its HTTP surface
//!
//! Bridge counters come from [`BridgeStats`]; HTTP counters live here.
//! Exported in Prometheus text format by `GET /metrics`.

use std::sync::atomic::{AtomicU64, Ordering};

use crate::bridge::BridgeStats;

/// Point-in-time gauge values collected on each metrics request
#[derive(Debug, Default)]
pub struct GaugeSnapshot {
    /// Invocations currently awaiting the plugin
    pub pending_requests: u64,
    /// 1 once the plugin has announced itself
    pub plugin_connected: u64,
    /// 1 while an MCP client is attached
    pub mcp_server_active: u64,
    /// Process resident set size in bytes (Linux only)
    pub process_memory_bytes: Option<u64>,
    /// Number of open file descriptors (Linux only)
    pub process_open_fds: Option<u64>,
}

impl GaugeSnapshot {
    /// Collect gauge values from /proc on Linux
    #[cfg(target_os = "linux")]
    pub fn collect_process_metrics(&mut self) {
        // Second field of statm is RSS in pages
        if let Ok(content) = std::fs::read_to_string("/proc/self/statm") {
            let parts: Vec<&str> = content.split_whitespace().collect();
            if parts.len() >= 2 {
                if let Ok(pages) = parts[1].parse::<u64>() {
                    self.process_memory_bytes = Some(pages * 4096);
                }
            }
        }

        if let Ok(entries) = std::fs::read_dir("/proc/self/fd") {
            self.process_open_fds = Some(entries.count() as u64);
        }
    }

    /// No-op for non-Linux platforms
    #[cfg(not(target_os = "linux"))]
    pub fn collect_process_metrics(&mut self) {}
}

/// HTTP transport counters
#[derive(Debug, Default)]
pub struct TransportMetrics {
    /// Total HTTP requests served
    pub http_requests_total: AtomicU64,
    /// Polls that handed out an invocation
    pub polls_with_work_total: AtomicU64,
    /// `POST /response` bodies received
    pub deliveries_total: AtomicU64,
    /// Deliveries naming no pending invocation
    pub deliveries_unmatched_total: AtomicU64,
    /// `POST /mcp/<tool>` calls
    pub http_tool_calls_total: AtomicU64,
}

impl TransportMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_request(&self) {
        self.http_requests_total.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_poll(&self, had_work: bool) {
        if had_work {
            self.polls_with_work_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_delivery(&self, matched: bool) {
        self.deliveries_total.fetch_add(1, Ordering::Relaxed);
        if !matched {
            self.deliveries_unmatched_total.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_tool_call(&self) {
        self.http_tool_calls_total.fetch_add(1, Ordering::Relaxed);
    }

    /// Export metrics in Prometheus text format
    pub fn to_prometheus(&self, bridge: &BridgeStats, gauges: &GaugeSnapshot) -> String {
        use std::fmt::Write;

        let mut output = String::with_capacity(2048);

        macro_rules! counter {
            ($name:expr, $help:expr, $value:expr) => {
                let _ = writeln!(output, "# HELP {} {}", $name, $help);
                let _ = writeln!(output, "# TYPE {} counter", $name);
                let _ = writeln!(output, "{} {}", $name, $value);
            };
        }

        macro_rules! gauge {
            ($name:expr, $help:expr, $value:expr) => {
                let _ = writeln!(output, "# HELP {} {}", $name, $help);
                let _ = writeln!(output, "# TYPE {} gauge", $name);
                let _ = writeln!(output, "{} {}", $name, $value);
            };
        }

        // === Bridge counters ===

        counter!(
            "studio_bridge_invocations_submitted_total",
            "Invocations submitted to the bridge",
            bridge.submitted
        );
        counter!(
            "studio_bridge_invocations_completed_total",
            "Invocations resolved with a result",
            bridge.completed
        );
        counter!(
            "studio_bridge_invocations_failed_total",
            "Invocations failed by the plugin",
            bridge.failed
        );
        counter!(
            "studio_bridge_invocations_timed_out_total",
            "Invocations expired without a response",
            bridge.timed_out
        );
        counter!(
            "studio_bridge_invocations_cancelled_total",
            "Invocations cancelled at shutdown",
            bridge.cancelled
        );
        counter!("studio_bridge_polls_total", "Plugin polls served", bridge.polls);

        // === Transport counters ===

        counter!(
            "studio_bridge_http_requests_total",
            "HTTP requests served",
            self.http_requests_total.load(Ordering::Relaxed)
        );
        counter!(
            "studio_bridge_polls_with_work_total",
            "Polls that returned an invocation",
            self.polls_with_work_total.load(Ordering::Relaxed)
        );
        counter!(
            "studio_bridge_deliveries_total",
            "Responses posted by the plugin",
            self.deliveries_total.load(Ordering::Relaxed)
        );
        counter!(
            "studio_bridge_deliveries_unmatched_total",
            "Responses naming no pending invocation",
            self.deliveries_unmatched_total.load(Ordering::Relaxed)
        );
        counter!(
            "studio_bridge_http_tool_calls_total",
            "Tool calls made over HTTP",
            self.http_tool_calls_total.load(Ordering::Relaxed)
        );

        // === Gauges ===

        gauge!(
            "studio_bridge_pending_requests",
            "Invocations awaiting the plugin",
            gauges.pending_requests
        );
        gauge!(
            "studio_bridge_plugin_connected",
            "Whether the Studio plugin has connected",
            gauges.plugin_connected
        );
        gauge!(
            "studio_bridge_mcp_server_active",
            "Whether an MCP client is attached",
            gauges.mcp_server_active
        );

        if let Some(memory) = gauges.process_memory_bytes {
            gauge!(
                "studio_bridge_process_memory_bytes",
                "Process resident set size in bytes",
                memory
            );
        }
        if let Some(fds) = gauges.process_open_fds {
            gauge!(
                "studio_bridge_process_open_fds",
                "Number of open file descriptors",
                fds
            );
        }

        output
    }
}
