use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Notify;
use tokio::time::Instant;

use crate::error::{ConfigError, ReplicationError};
use crate::replication::FollowerEndpoint;
use crate::util::WriteRequest;

/// Result of a write that reached quorum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuorumOutcome {
    /// Acks counted when the wait resolved; equals the quorum.
    pub acks: usize,
    pub elapsed: Duration,
}

/// Counts replication tasks that outlive the write that launched them.
#[derive(Debug, Default)]
pub struct ReplicationTracker {
    in_flight: AtomicUsize,
    acks: AtomicU64,
    failures: AtomicU64,
    idle: Notify,
}

impl ReplicationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub fn acks(&self) -> u64 {
        self.acks.load(Ordering::SeqCst)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::SeqCst)
    }

    /// Resolves once no replication task is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.idle.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.in_flight() == 0 {
                return;
            }
            notified.await;
        }
    }

    fn start(self: &Arc<Self>) -> InFlightGuard {
        self.in_flight.fetch_add(1, Ordering::SeqCst);
        InFlightGuard {
            tracker: Arc::clone(self),
        }
    }

    fn record(&self, ok: bool) {
        if ok {
            self.acks.fetch_add(1, Ordering::SeqCst);
        } else {
            self.failures.fetch_add(1, Ordering::SeqCst);
        }
    }
}

// Decrements on drop so a panicking task is still accounted for.
struct InFlightGuard {
    tracker: Arc<ReplicationTracker>,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        if self.tracker.in_flight.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.tracker.idle.notify_waiters();
        }
    }
}

/// Fans one write out to every follower and waits for `quorum` acks.
#[derive(Debug, Clone)]
pub struct QuorumReplicator {
    followers: Vec<Arc<dyn FollowerEndpoint>>,
    quorum: usize,
    deadline: Option<Duration>,
    tracker: Arc<ReplicationTracker>,
}

impl QuorumReplicator {
    pub fn new(
        followers: Vec<Arc<dyn FollowerEndpoint>>,
        quorum: usize,
    ) -> Result<Self, ConfigError> {
        if quorum == 0 || quorum > followers.len() {
            return Err(ConfigError::InvalidQuorum {
                quorum,
                followers: followers.len(),
            });
        }
        Ok(QuorumReplicator {
            followers,
            quorum,
            deadline: None,
            tracker: Arc::new(ReplicationTracker::new()),
        })
    }

    /// Gives up waiting for quorum after `deadline`. Tasks already launched
    /// keep running.
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn quorum(&self) -> usize {
        self.quorum
    }

    pub fn deadline(&self) -> Option<Duration> {
        self.deadline
    }

    pub fn followers(&self) -> &[Arc<dyn FollowerEndpoint>] {
        &self.followers
    }

    pub fn tracker(&self) -> &Arc<ReplicationTracker> {
        &self.tracker
    }

    /// Replicates `request` to all followers concurrently.
    ///
    /// Resolves as soon as `quorum` followers have acked. Tasks still running
    /// at that point are detached, not cancelled. Without a deadline the call
    /// waits as long as some task is pending, so a follower that never
    /// answers can stall it indefinitely.
    pub async fn replicate(&self, request: &WriteRequest) -> Result<QuorumOutcome, ReplicationError> {
        let start = Instant::now();
        let deadline = self.deadline.map(|d| start + d);

        // Every task is spawned before any is awaited so the delays overlap.
        let mut tasks = FuturesUnordered::new();
        for follower in &self.followers {
            let follower = Arc::clone(follower);
            let request = request.clone();
            let tracker = Arc::clone(&self.tracker);
            let guard = tracker.start();
            tasks.push(tokio::spawn(async move {
                let _guard = guard;
                let result = follower.replicate(&request).await;
                tracker.record(result.is_ok());
                if let Err(err) = &result {
                    tracing::warn!(follower = follower.id(), key = %request.key, error = %err, "replication failed");
                }
                result
            }));
        }

        let mut acks = 0;
        loop {
            let next = match deadline {
                Some(at) => match tokio::time::timeout_at(at, tasks.next()).await {
                    Ok(next) => next,
                    Err(_) => {
                        tracing::warn!(key = %request.key, required = self.quorum, acked = acks, "quorum deadline passed");
                        break;
                    }
                },
                None => tasks.next().await,
            };
            let Some(joined) = next else { break };

            if let Ok(Ok(_ack)) = joined {
                acks += 1;
                if acks >= self.quorum {
                    // Dropping `tasks` detaches the remaining join handles.
                    return Ok(QuorumOutcome {
                        acks,
                        elapsed: start.elapsed(),
                    });
                }
            }
        }

        Err(ReplicationError::QuorumUnreachable {
            required: self.quorum,
            acked: acks,
        })
    }
}
