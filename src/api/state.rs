use std::collections::BTreeMap;
use std::sync::Arc;

use crate::api::Metrics;
use crate::cluster::{ClusterState, FollowerNode, Leader};

/// The replica behind the HTTP surface.
#[derive(Debug, Clone)]
pub enum Node {
    Leader(Arc<Leader>),
    Follower(Arc<FollowerNode>),
}

impl Node {
    pub fn get(&self, key: &str) -> Option<String> {
        match self {
            Node::Leader(leader) => leader.get(key),
            Node::Follower(follower) => follower.get(key),
        }
    }

    pub fn snapshot(&self) -> BTreeMap<String, String> {
        match self {
            Node::Leader(leader) => leader.snapshot(),
            Node::Follower(follower) => follower.snapshot(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct ApiState {
    pub node: Node,
    pub cluster: Arc<ClusterState>,
    pub metrics: Metrics,
}
