//! Process-wide shared state

use std::sync::atomic::{AtomicBool, Ordering};

use tokio::sync::broadcast;
use tracing::{debug, info};

use studio_bridge_protocol::StatusResponse;

use crate::bridge::RequestBridge;
use crate::config::AppConfig;
use crate::observability::TransportMetrics;
use crate::tools::StudioTools;

/// Whether the Studio plugin has announced itself
///
/// Starts false and is only ever set, never cleared.
#[derive(Debug, Default)]
pub struct PluginStatus {
    connected: AtomicBool,
}

impl PluginStatus {
    /// Record a `/ready`; returns true only for the first one
    pub fn mark_ready(&self) -> bool {
        !self.connected.swap(true, Ordering::AcqRel)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// State shared by the HTTP server, MCP server and sweeper
pub struct SharedState {
    pub config: AppConfig,
    pub bridge: RequestBridge,
    pub tools: StudioTools,
    pub plugin: PluginStatus,
    pub metrics: TransportMetrics,
    mcp_active: AtomicBool,
    shutdown_tx: broadcast::Sender<()>,
}

impl SharedState {
    pub fn new(config: AppConfig) -> Self {
        let bridge = RequestBridge::with_timeout(config.bridge.request_timeout());
        let (shutdown_tx, _) = broadcast::channel(1);
        Self {
            config,
            tools: StudioTools::new(bridge.clone()),
            bridge,
            plugin: PluginStatus::default(),
            metrics: TransportMetrics::new(),
            mcp_active: AtomicBool::new(false),
            shutdown_tx,
        }
    }

    pub fn set_mcp_active(&self, active: bool) {
        self.mcp_active.store(active, Ordering::Release);
    }

    pub fn mcp_active(&self) -> bool {
        self.mcp_active.load(Ordering::Acquire)
    }

    /// Body of `GET /status`
    pub fn status(&self) -> StatusResponse {
        StatusResponse {
            plugin_connected: self.plugin.is_connected(),
            mcp_server_active: self.mcp_active(),
            pending_requests: self.bridge.len(),
        }
    }

    pub fn subscribe_shutdown(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    /// Stop background tasks and cancel every pending invocation
    pub fn shutdown(&self) {
        if self.bridge.is_closed() {
            debug!("Shutdown already done");
            return;
        }
        // No receivers just means nothing is running yet
        let _ = self.shutdown_tx.send(());
        let cancelled = self.bridge.close();
        info!(cancelled, "Bridge shut down");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_plugin_status_first_ready_only() {
        let status = PluginStatus::default();
        assert!(!status.is_connected());
        assert!(status.mark_ready());
        assert!(!status.mark_ready());
        assert!(status.is_connected());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_and_notifies() {
        let state = SharedState::new(AppConfig::default());
        let mut rx = state.subscribe_shutdown();
        let handle = state.bridge.submit("/api/selection", json!({})).unwrap();

        state.shutdown();

        assert!(rx.recv().await.is_ok());
        assert!(handle.await.is_err());
        assert!(state.bridge.is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_repeated_shutdown_is_harmless() {
        let state = SharedState::new(AppConfig::default());
        let mut rx = state.subscribe_shutdown();

        state.shutdown();
        state.shutdown();

        assert!(rx.recv().await.is_ok());
        assert!(rx.try_recv().is_err(), "shutdown is broadcast once");
        assert!(state.bridge.is_closed());
        assert_eq!(state.bridge.stats().cancelled, 0);
    }

    #[test]
    fn test_status_snapshot() {
        let state = SharedState::new(AppConfig::default());
        state.set_mcp_active(true);
        state.plugin.mark_ready();

        let status = state.status();
        assert!(status.plugin_connected);
        assert!(status.mcp_server_active);
        assert_eq!(status.pending_requests, 0);
    }
}
