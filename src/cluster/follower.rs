use std::collections::BTreeMap;
use std::sync::Arc;

use crate::store::TimestampedStore;
use crate::util::{Ack, WriteRequest};

/// Receiving side of replication: applies what the leader sends.
#[derive(Debug)]
pub struct FollowerNode {
    node_id: String,
    store: Arc<TimestampedStore>,
}

impl FollowerNode {
    pub fn new(node_id: impl Into<String>) -> Self {
        FollowerNode {
            node_id: node_id.into(),
            store: Arc::new(TimestampedStore::new()),
        }
    }

    pub fn apply(&self, request: WriteRequest) -> Ack {
        let applied = self
            .store
            .set(request.key, request.value, Some(request.timestamp));
        Ack {
            follower_id: self.node_id.clone(),
            applied,
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        self.store.snapshot()
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}
