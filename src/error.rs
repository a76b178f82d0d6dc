use std::time::Duration;

/// Rejected at startup; never produced by a write.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("write quorum {quorum} must be between 1 and the number of followers ({followers})")]
    InvalidQuorum { quorum: usize, followers: usize },
    #[error("minimum delay {min:?} exceeds maximum delay {max:?}")]
    InvalidDelayRange { min: Duration, max: Duration },
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReplicationError {
    #[error("quorum not reached: need {required}, got {acked}")]
    QuorumUnreachable { required: usize, acked: usize },
    #[error("replication to {follower} failed: {reason}")]
    Transport { follower: String, reason: String },
}
