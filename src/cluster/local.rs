use std::sync::Arc;

use crate::cluster::{Leader, QuorumReplicator};
use crate::config::ReplicationConfig;
use crate::error::ConfigError;
use crate::replication::{DelayModel, FixedDelay, FollowerEndpoint, LocalFollower};

/// A leader and its followers inside one process, wired through
/// [`LocalFollower`] endpoints.
#[derive(Debug)]
pub struct LocalCluster {
    pub leader: Leader,
    pub followers: Vec<Arc<LocalFollower>>,
}

impl LocalCluster {
    /// Builds `config.num_followers` followers that all draw from one uniform
    /// delay model.
    pub fn spawn(config: &ReplicationConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let delay: Arc<dyn DelayModel> = Arc::new(config.delay_model()?);
        let followers = (1..=config.num_followers)
            .map(|i| Arc::new(LocalFollower::new(format!("follower-{i}"), Arc::clone(&delay))))
            .collect();
        Self::assemble(followers, config.write_quorum, config.write_deadline)
    }

    /// Builds one follower per entry of `delays_ms`, each with that fixed
    /// delay.
    pub fn with_delays(delays_ms: &[u64], write_quorum: usize) -> Result<Self, ConfigError> {
        let followers = delays_ms
            .iter()
            .enumerate()
            .map(|(i, ms)| {
                Arc::new(LocalFollower::new(
                    format!("follower-{}", i + 1),
                    Arc::new(FixedDelay::from_millis(*ms)),
                ))
            })
            .collect();
        Self::assemble(followers, write_quorum, None)
    }

    fn assemble(
        followers: Vec<Arc<LocalFollower>>,
        write_quorum: usize,
        deadline: Option<std::time::Duration>,
    ) -> Result<Self, ConfigError> {
        let endpoints = followers
            .iter()
            .map(|f| Arc::clone(f) as Arc<dyn FollowerEndpoint>)
            .collect();
        let mut replicator = QuorumReplicator::new(endpoints, write_quorum)?;
        if let Some(deadline) = deadline {
            replicator = replicator.with_deadline(deadline);
        }
        Ok(LocalCluster {
            leader: Leader::new("leader", replicator),
            followers,
        })
    }

    /// Waits until every replication task, including those detached after
    /// quorum, has finished.
    pub async fn settle(&self) {
        self.leader.tracker().wait_idle().await;
    }
}
