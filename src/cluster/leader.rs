use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cluster::{QuorumReplicator, ReplicationTracker};
use crate::error::ReplicationError;
use crate::store::TimestampedStore;
use crate::util::{Timestamp, WriteRequest};

/// What the caller learns about a successful write.
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOutcome {
    pub timestamp: Timestamp,
    pub replicated: usize,
}

/// The single writer of the cluster.
///
/// A write commits to the leader's own store first, then goes out to the
/// followers with the timestamp assigned at commit. The store stamps and
/// inserts under one lock, so concurrent writes to a key get distinct
/// timestamps in commit order.
#[derive(Debug)]
pub struct Leader {
    node_id: String,
    store: Arc<TimestampedStore>,
    replicator: QuorumReplicator,
}

impl Leader {
    pub fn new(node_id: impl Into<String>, replicator: QuorumReplicator) -> Self {
        Leader {
            node_id: node_id.into(),
            store: Arc::new(TimestampedStore::new()),
            replicator,
        }
    }

    pub async fn write(&self, key: String, value: String) -> Result<WriteOutcome, ReplicationError> {
        let timestamp = self.store.commit(key.clone(), value.clone());
        let request = WriteRequest {
            key,
            value,
            timestamp,
        };

        match self.replicator.replicate(&request).await {
            Ok(outcome) => {
                tracing::debug!(
                    node_id = %self.node_id,
                    key = %request.key,
                    timestamp = %timestamp,
                    acks = outcome.acks,
                    elapsed_ms = outcome.elapsed.as_secs_f64() * 1000.0,
                    "write reached quorum"
                );
                Ok(WriteOutcome {
                    timestamp,
                    replicated: outcome.acks,
                })
            }
            Err(err) => {
                tracing::warn!(node_id = %self.node_id, key = %request.key, error = %err, "write missed quorum");
                Err(err)
            }
        }
    }

    /// Like [`Leader::write`], reduced to whether quorum was reached.
    pub async fn set(&self, key: String, value: String) -> bool {
        self.write(key, value).await.is_ok()
    }

    /// Reads the leader's own store. Followers may still lag behind.
    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.store.snapshot()
    }

    pub fn store(&self) -> &Arc<TimestampedStore> {
        &self.store
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn quorum(&self) -> usize {
        self.replicator.quorum()
    }

    pub fn follower_count(&self) -> usize {
        self.replicator.followers().len()
    }

    pub fn tracker(&self) -> &Arc<ReplicationTracker> {
        self.replicator.tracker()
    }
}
