//! Pending call table.
//!
//! Maps correlation IDs to callers waiting on a reply. Every entry is
//! resolved at most once: whichever of {reply, timeout, cancel, connection
//! loss} removes it first wins, and the others find nothing to remove.

use crate::domain::correlation::CorrelationId;
use crate::domain::error::LinkError;
use dashmap::DashMap;
use shared_types::{OperationTag, Reply};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;
use tracing::{debug, warn};

/// What a waiting caller receives.
pub type CallOutcome = Result<Reply, LinkError>;

/// A call waiting for its reply
struct PendingCall {
    sender: oneshot::Sender<CallOutcome>,
    created_at: Instant,
    operation: OperationTag,
}

/// Counters for the pending table
#[derive(Debug, Default)]
pub struct PendingStats {
    pub total_registered: AtomicU64,
    pub total_completed: AtomicU64,
    pub total_timeouts: AtomicU64,
    /// Send failures, dropped callers, connection loss
    pub total_cancelled: AtomicU64,
    /// Inbound messages that matched nothing or did not parse
    pub total_discarded: AtomicU64,
}

/// Point-in-time copy of [`PendingStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PendingStatsSnapshot {
    pub registered: u64,
    pub completed: u64,
    pub timeouts: u64,
    pub cancelled: u64,
    pub discarded: u64,
}

/// Pending call table.
///
/// Flow:
/// 1. Client calls `register()` and gets a correlation ID plus a receiver
/// 2. Client transmits the envelope carrying that ID
/// 3. Inbound dispatcher calls `complete()` when the reply arrives
/// 4. Client awaits the receiver; on timeout it calls `expire()`
pub struct PendingCallStore {
    pending: DashMap<CorrelationId, PendingCall>,
    timeout: Duration,
    stats: PendingStats,
}

impl PendingCallStore {
    pub fn new(timeout: Duration) -> Self {
        Self {
            pending: DashMap::new(),
            timeout,
            stats: PendingStats::default(),
        }
    }

    /// Timeout applied to every call.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Register a call and get the receiver its outcome will arrive on.
    pub fn register(
        &self,
        operation: OperationTag,
    ) -> (CorrelationId, oneshot::Receiver<CallOutcome>) {
        let correlation_id = CorrelationId::new();
        let (tx, rx) = oneshot::channel();

        self.pending.insert(
            correlation_id,
            PendingCall {
                sender: tx,
                created_at: Instant::now(),
                operation,
            },
        );
        self.stats.total_registered.fetch_add(1, Ordering::Relaxed);

        debug!(
            correlation_id = %correlation_id,
            operation = %operation,
            "Registered pending call"
        );

        (correlation_id, rx)
    }

    /// Resolve a call with its reply.
    ///
    /// Returns false if the id is unknown or already resolved; the reply is
    /// dropped and the table is left untouched.
    pub fn complete(&self, correlation_id: CorrelationId, reply: Reply) -> bool {
        let Some((_, call)) = self.pending.remove(&correlation_id) else {
            self.stats.total_discarded.fetch_add(1, Ordering::Relaxed);
            warn!(
                correlation_id = %correlation_id,
                "Reply for unknown or expired correlation ID"
            );
            return false;
        };

        let elapsed = call.created_at.elapsed();
        let success = reply.success;
        match call.sender.send(Ok(reply)) {
            Ok(()) => {
                self.stats.total_completed.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = %call.operation,
                    success,
                    response_time_ms = elapsed.as_millis() as u64,
                    "Completed pending call"
                );
                true
            }
            Err(_) => {
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                debug!(
                    correlation_id = %correlation_id,
                    operation = %call.operation,
                    "Caller went away before its reply arrived"
                );
                false
            }
        }
    }

    /// Remove a call whose timeout fired. Returns false when a reply got
    /// there first.
    pub fn expire(&self, correlation_id: &CorrelationId) -> bool {
        match self.pending.remove(correlation_id) {
            Some((_, call)) => {
                self.stats.total_timeouts.fetch_add(1, Ordering::Relaxed);
                warn!(
                    correlation_id = %correlation_id,
                    operation = %call.operation,
                    elapsed_ms = call.created_at.elapsed().as_millis() as u64,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Pending call timed out"
                );
                true
            }
            None => false,
        }
    }

    /// Drop a call without resolving it (send failure, caller dropped).
    pub fn cancel(&self, correlation_id: &CorrelationId) -> bool {
        if self.pending.remove(correlation_id).is_some() {
            self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
            true
        } else {
            false
        }
    }

    /// Fail every pending call with `ConnectionClosed`. Returns how many
    /// calls were failed.
    pub fn fail_all(&self) -> usize {
        let ids: Vec<CorrelationId> = self.pending.iter().map(|entry| *entry.key()).collect();
        let mut failed = 0;
        for id in ids {
            if let Some((_, call)) = self.pending.remove(&id) {
                let _ = call.sender.send(Err(LinkError::ConnectionClosed));
                self.stats.total_cancelled.fetch_add(1, Ordering::Relaxed);
                failed += 1;
            }
        }
        failed
    }

    /// Count an inbound message that could not be matched at all.
    pub fn record_discarded(&self) {
        self.stats.total_discarded.fetch_add(1, Ordering::Relaxed);
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }

    pub fn is_pending(&self, correlation_id: &CorrelationId) -> bool {
        self.pending.contains_key(correlation_id)
    }

    pub fn stats(&self) -> PendingStatsSnapshot {
        PendingStatsSnapshot {
            registered: self.stats.total_registered.load(Ordering::Relaxed),
            completed: self.stats.total_completed.load(Ordering::Relaxed),
            timeouts: self.stats.total_timeouts.load(Ordering::Relaxed),
            cancelled: self.stats.total_cancelled.load(Ordering::Relaxed),
            discarded: self.stats.total_discarded.load(Ordering::Relaxed),
        }
    }
}
