//! Pending invocation records and the caller-side handle

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::task::{Context, Poll};

use serde_json::Value;
use tokio::sync::oneshot;
use tokio::time::Instant;

use studio_bridge_protocol::InvocationId;

use super::error::BridgeError;

/// Result delivered to the caller of `submit`
pub type Outcome = Result<Value, BridgeError>;

/// Snapshot of one outstanding invocation
///
/// This is what the poller sees; the settle side lives only in the table.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingInvocation {
    pub id: InvocationId,
    pub endpoint: String,
    pub payload: Value,
    pub created_at: Instant,
}

/// Awaitable handle returned by `RequestBridge::submit`
///
/// Resolves exactly once. If the bridge goes away without settling the
/// invocation the handle resolves as [`BridgeError::Cancelled`].
#[derive(Debug)]
pub struct InvocationHandle {
    id: InvocationId,
    rx: oneshot::Receiver<Outcome>,
}

impl InvocationHandle {
    pub(super) fn new(id: InvocationId, rx: oneshot::Receiver<Outcome>) -> Self {
        Self { id, rx }
    }

    /// Correlation id of the invocation
    pub fn id(&self) -> InvocationId {
        self.id
    }
}

impl Future for InvocationHandle {
    type Output = Outcome;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Err(BridgeError::Cancelled)))
    }
}

/// Lifetime counters for one bridge
#[derive(Debug, Default)]
pub(super) struct Counters {
    pub submitted: AtomicU64,
    pub completed: AtomicU64,
    pub failed: AtomicU64,
    pub timed_out: AtomicU64,
    pub cancelled: AtomicU64,
    pub polls: AtomicU64,
}

impl Counters {
    pub fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    pub fn snapshot(&self, pending: usize) -> BridgeStats {
        BridgeStats {
            pending,
            submitted: self.submitted.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            polls: self.polls.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of bridge activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BridgeStats {
    /// Invocations currently in the table
    pub pending: usize,
    pub submitted: u64,
    pub completed: u64,
    pub failed: u64,
    pub timed_out: u64,
    pub cancelled: u64,
    pub polls: u64,
}
