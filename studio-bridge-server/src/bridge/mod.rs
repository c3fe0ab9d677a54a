//! Request bridge between tool callers and the polling Studio plugin
//!
//! The plugin cannot receive pushed work. Callers `submit` an invocation
//! and await its handle; the plugin repeatedly asks for the oldest pending
//! invocation and later posts back a result or an error, which settles the
//! handle. Invocations that receive nothing within the timeout are expired
//! by a per-invocation timer or by the periodic sweep, whichever runs first.
//!
//! Every settle path removes the entry from the table under the lock before
//! touching its sender, so an invocation can only ever be settled once and a
//! late `complete`/`fail` for a departed id is a no-op.

mod error;
mod invocation;
pub mod sweeper;

#[cfg(test)]
mod tests;

pub use error::BridgeError;
pub use invocation::{BridgeStats, InvocationHandle, PendingInvocation};
pub use sweeper::spawn_sweeper;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use serde_json::Value;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use studio_bridge_protocol::InvocationId;

use self::invocation::{Counters, Outcome};

/// Default time an invocation may wait for the plugin
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(30_000);

/// Default period of the maintenance sweep
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5);

/// Handle to the pending-invocation table
///
/// Cheap to clone; all clones share one table.
#[derive(Clone)]
pub struct RequestBridge {
    inner: Arc<Inner>,
}

struct Inner {
    timeout: Duration,
    table: Mutex<Table>,
    counters: Counters,
}

#[derive(Default)]
struct Table {
    entries: HashMap<InvocationId, Entry>,
    /// Submission sequence -> id; the first key is the oldest invocation
    order: BTreeMap<u64, InvocationId>,
    next_seq: u64,
    closed: bool,
}

struct Entry {
    invocation: PendingInvocation,
    seq: u64,
    settle: oneshot::Sender<Outcome>,
    timer: Option<JoinHandle<()>>,
}

impl Table {
    fn fresh_id(&self) -> InvocationId {
        loop {
            let id = InvocationId::new();
            if !self.entries.contains_key(&id) {
                return id;
            }
        }
    }

    fn remove(&mut self, id: &InvocationId) -> Option<Entry> {
        let entry = self.entries.remove(id)?;
        self.order.remove(&entry.seq);
        Some(entry)
    }

    fn oldest(&self) -> Option<&Entry> {
        self.order
            .values()
            .next()
            .and_then(|id| self.entries.get(id))
    }
}

impl Entry {
    /// The single expiry rule shared by the timer and the sweep
    fn is_due(&self, now: Instant, timeout: Duration) -> bool {
        now.saturating_duration_since(self.invocation.created_at) >= timeout
    }

    fn settle(self, outcome: Outcome) {
        if let Some(timer) = self.timer {
            timer.abort();
        }
        if self.settle.send(outcome).is_err() {
            debug!(request_id = %self.invocation.id, "Caller stopped waiting before settle");
        }
    }
}

impl Drop for Inner {
    fn drop(&mut self) {
        // Senders drop with the table, which resolves their handles as Cancelled
        for entry in self.table.get_mut().entries.values_mut() {
            if let Some(timer) = entry.timer.take() {
                timer.abort();
            }
        }
    }
}

impl RequestBridge {
    /// Create a bridge with the default 30 second timeout
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_REQUEST_TIMEOUT)
    }

    /// Create a bridge with a custom invocation timeout
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                timeout,
                table: Mutex::new(Table::default()),
                counters: Counters::default(),
            }),
        }
    }

    /// Configured invocation timeout
    pub fn timeout(&self) -> Duration {
        self.inner.timeout
    }

    /// Record a new invocation and return the handle its caller awaits
    ///
    /// Never blocks. When called inside a Tokio runtime a deadline timer is
    /// armed; outside one, expiry relies on [`sweep`](Self::sweep).
    pub fn submit(
        &self,
        endpoint: impl Into<String>,
        payload: Value,
    ) -> Result<InvocationHandle, BridgeError> {
        let endpoint = endpoint.into();
        let (tx, rx) = oneshot::channel();

        let id = {
            let mut table = self.inner.table.lock();
            if table.closed {
                return Err(BridgeError::TransportFailure(
                    "bridge is shut down".into(),
                ));
            }

            let id = table.fresh_id();
            let seq = table.next_seq;
            table.next_seq += 1;

            let entry = Entry {
                invocation: PendingInvocation {
                    id,
                    endpoint: endpoint.clone(),
                    payload,
                    created_at: Instant::now(),
                },
                seq,
                settle: tx,
                timer: self.arm_timer(id),
            };
            table.order.insert(seq, id);
            table.entries.insert(id, entry);
            id
        };

        Counters::bump(&self.inner.counters.submitted, 1);
        debug!(request_id = %id, endpoint = %endpoint, "Invocation submitted");

        Ok(InvocationHandle::new(id, rx))
    }

    fn arm_timer(&self, id: InvocationId) -> Option<JoinHandle<()>> {
        let runtime = tokio::runtime::Handle::try_current().ok()?;
        let inner: Weak<Inner> = Arc::downgrade(&self.inner);
        let timeout = self.inner.timeout;

        Some(runtime.spawn(async move {
            tokio::time::sleep(timeout).await;
            if let Some(inner) = inner.upgrade() {
                RequestBridge { inner }.expire_if_due(id);
            }
        }))
    }

    /// The oldest pending invocation, without claiming it
    ///
    /// Repeated calls return the same invocation until it is settled.
    pub fn peek_oldest(&self) -> Option<PendingInvocation> {
        Counters::bump(&self.inner.counters.polls, 1);
        let table = self.inner.table.lock();
        table.oldest().map(|entry| entry.invocation.clone())
    }

    /// Settle `id` with a result
    ///
    /// Returns `false` (and does nothing) when `id` is not pending.
    pub fn complete(&self, id: InvocationId, result: Value) -> bool {
        let Some(entry) = self.inner.table.lock().remove(&id) else {
            debug!(request_id = %id, "Ignoring response for unknown or settled invocation");
            return false;
        };

        info!(
            request_id = %id,
            endpoint = %entry.invocation.endpoint,
            elapsed_ms = entry.invocation.created_at.elapsed().as_millis() as u64,
            "Invocation completed"
        );
        Counters::bump(&self.inner.counters.completed, 1);
        entry.settle(Ok(result));
        true
    }

    /// Settle `id` as a remote failure
    ///
    /// Returns `false` (and does nothing) when `id` is not pending.
    pub fn fail(&self, id: InvocationId, error: Value) -> bool {
        let Some(entry) = self.inner.table.lock().remove(&id) else {
            debug!(request_id = %id, "Ignoring error for unknown or settled invocation");
            return false;
        };

        let err = BridgeError::remote(error);
        info!(
            request_id = %id,
            endpoint = %entry.invocation.endpoint,
            error = %err,
            "Invocation failed remotely"
        );
        Counters::bump(&self.inner.counters.failed, 1);
        entry.settle(Err(err));
        true
    }

    /// Expire `id` if it is still pending and has reached the timeout
    pub fn expire_if_due(&self, id: InvocationId) -> bool {
        let timeout = self.inner.timeout;
        let entry = {
            let mut table = self.inner.table.lock();
            let due = table
                .entries
                .get(&id)
                .is_some_and(|entry| entry.is_due(Instant::now(), timeout));
            if !due {
                return false;
            }
            table.remove(&id)
        };

        match entry {
            Some(entry) => {
                self.settle_timeout(entry);
                true
            }
            None => false,
        }
    }

    /// Expire every invocation that has reached the timeout
    ///
    /// Returns the number of invocations expired.
    pub fn sweep(&self) -> usize {
        let timeout = self.inner.timeout;
        let now = Instant::now();

        let expired: Vec<Entry> = {
            let mut table = self.inner.table.lock();
            let due: Vec<InvocationId> = table
                .entries
                .values()
                .filter(|entry| entry.is_due(now, timeout))
                .map(|entry| entry.invocation.id)
                .collect();
            due.iter().filter_map(|id| table.remove(id)).collect()
        };

        let count = expired.len();
        for entry in expired {
            self.settle_timeout(entry);
        }
        count
    }

    fn settle_timeout(&self, entry: Entry) {
        warn!(
            request_id = %entry.invocation.id,
            endpoint = %entry.invocation.endpoint,
            timeout_ms = self.inner.timeout.as_millis() as u64,
            "Invocation timed out waiting for the plugin"
        );
        Counters::bump(&self.inner.counters.timed_out, 1);
        entry.settle(Err(BridgeError::Timeout {
            timeout_ms: self.inner.timeout.as_millis() as u64,
        }));
    }

    /// Stop accepting work and cancel everything still pending
    ///
    /// Returns the number of invocations cancelled. Later calls are no-ops.
    pub fn close(&self) -> usize {
        let drained: Vec<Entry> = {
            let mut table = self.inner.table.lock();
            table.closed = true;
            table.order.clear();
            table.entries.drain().map(|(_, entry)| entry).collect()
        };

        let count = drained.len();
        if count > 0 {
            info!(cancelled = count, "Cancelling pending invocations");
        }
        Counters::bump(&self.inner.counters.cancelled, count as u64);
        for entry in drained {
            entry.settle(Err(BridgeError::Cancelled));
        }
        count
    }

    /// Whether `close` has been called
    pub fn is_closed(&self) -> bool {
        self.inner.table.lock().closed
    }

    /// Number of pending invocations
    pub fn len(&self) -> usize {
        self.inner.table.lock().entries.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Counter snapshot for status and metrics endpoints
    pub fn stats(&self) -> BridgeStats {
        self.inner.counters.snapshot(self.len())
    }
}

impl Default for RequestBridge {
    fn default() -> Self {
        Self::new()
    }
}
