use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ReplicationError;
use crate::replication::DelayModel;
use crate::store::TimestampedStore;
use crate::util::{Ack, Timestamp, WriteRequest};

/// A replica the leader can push writes to.
///
/// A stale write that the follower rejects is still an `Ok(Ack)`: the
/// follower is caught up, just not mutated. Only failing to reach the
/// follower is an error.
#[async_trait]
pub trait FollowerEndpoint: Send + Sync + fmt::Debug {
    fn id(&self) -> &str;

    async fn replicate(&self, request: &WriteRequest) -> Result<Ack, ReplicationError>;
}

/// In-process follower: waits out a sampled delay, then applies the write to
/// its own store.
#[derive(Debug)]
pub struct LocalFollower {
    id: String,
    store: Arc<TimestampedStore>,
    delay: Arc<dyn DelayModel>,
}

impl LocalFollower {
    pub fn new(id: impl Into<String>, delay: Arc<dyn DelayModel>) -> Self {
        LocalFollower {
            id: id.into(),
            store: Arc::new(TimestampedStore::new()),
            delay,
        }
    }

    pub fn store(&self) -> &Arc<TimestampedStore> {
        &self.store
    }

    /// Applies a write immediately, without the simulated network delay.
    pub fn apply(&self, key: &str, value: &str, timestamp: Timestamp) -> Ack {
        let applied = self
            .store
            .set(key.to_string(), value.to_string(), Some(timestamp));
        Ack {
            follower_id: self.id.clone(),
            applied,
        }
    }
}

#[async_trait]
impl FollowerEndpoint for LocalFollower {
    fn id(&self) -> &str {
        &self.id
    }

    async fn replicate(&self, request: &WriteRequest) -> Result<Ack, ReplicationError> {
        let delay = self.delay.sample();
        tokio::time::sleep(delay).await;
        let ack = self.apply(&request.key, &request.value, request.timestamp);
        tracing::debug!(
            follower = %self.id,
            key = %request.key,
            timestamp = %request.timestamp,
            delay_ms = delay.as_millis() as u64,
            applied = ack.applied,
            "replicated write"
        );
        Ok(ack)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::replication::{FixedDelay, ScriptedDelay};

    fn request(key: &str, value: &str, ts: f64) -> WriteRequest {
        WriteRequest {
            key: key.into(),
            value: value.into(),
            timestamp: Timestamp(ts),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn replicate_waits_for_the_sampled_delay() {
        let follower = LocalFollower::new("f1", Arc::new(FixedDelay::from_millis(40)));
        let start = tokio::time::Instant::now();

        let ack = follower.replicate(&request("x", "1", 10.0)).await.unwrap();

        assert_eq!(start.elapsed(), Duration::from_millis(40));
        assert_eq!(
            ack,
            Ack {
                follower_id: "f1".into(),
                applied: true
            }
        );
        assert_eq!(follower.store().get("x").as_deref(), Some("1"));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_write_still_acks() {
        let follower = LocalFollower::new("f1", Arc::new(FixedDelay(Duration::ZERO)));
        follower.replicate(&request("x", "new", 200.0)).await.unwrap();

        let ack = follower.replicate(&request("x", "old", 100.0)).await.unwrap();

        assert!(!ack.applied);
        assert_eq!(follower.store().get("x").as_deref(), Some("new"));
    }

    #[tokio::test(start_paused = true)]
    async fn reordered_delivery_keeps_the_newer_write() {
        // W1 is slow, W2 is fast: W2 lands first and W1 arrives stale.
        let delays = ScriptedDelay::new(
            [Duration::from_millis(50), Duration::from_millis(10)],
            Duration::ZERO,
        );
        let follower = LocalFollower::new("f1", Arc::new(delays));
        let (w1, w2) = (request("x", "1", 100.0), request("x", "2", 200.0));

        let (ack1, ack2) = tokio::join!(follower.replicate(&w1), follower.replicate(&w2));
        let (ack1, ack2) = (ack1.unwrap(), ack2.unwrap());

        assert!(ack2.applied);
        assert!(!ack1.applied);
        assert_eq!(follower.store().get("x").as_deref(), Some("2"));
        assert_eq!(follower.store().timestamp("x"), Timestamp(200.0));
    }
}
