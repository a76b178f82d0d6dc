pub mod follower;
pub mod leader;
pub mod local;
pub mod quorum;
pub mod state;

pub use follower::FollowerNode;
pub use leader::{Leader, WriteOutcome};
pub use local::LocalCluster;
pub use quorum::{QuorumOutcome, QuorumReplicator, ReplicationTracker};
pub use state::ClusterState;
