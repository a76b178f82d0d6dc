use std::net::SocketAddr;

use crate::config::{CliArgs, Role};

/// Identity of the running node, as reported by `/` and `/health`.
#[derive(Debug, Clone)]
pub struct ClusterState {
    pub node_id: String,
    pub role: Role,
    pub address: SocketAddr,
    pub follower_urls: Vec<String>,
}

impl From<&CliArgs> for ClusterState {
    fn from(args: &CliArgs) -> Self {
        ClusterState {
            node_id: args.node_id.clone(),
            role: args.role,
            address: args.listen_addr(),
            follower_urls: args.follower_urls(),
        }
    }
}
