use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Serialize;

use crate::error::ConfigError;
use crate::replication::UniformDelay;

#[derive(ValueEnum, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Leader,
    Follower,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Leader => f.write_str("leader"),
            Role::Follower => f.write_str("follower"),
        }
    }
}

#[derive(Parser, Debug, Clone)]
#[command(name = "semisync-kv", about = "Key-value node with semi-synchronous replication")]
pub struct CliArgs {
    #[arg(long, env = "ROLE", value_enum, default_value_t = Role::Follower)]
    pub role: Role,

    #[arg(long, env = "NODE_ID", default_value = "unknown")]
    pub node_id: String,

    #[arg(long, env = "LISTEN_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    /// Base URLs of every follower, comma separated. Leader only.
    #[arg(long, env = "FOLLOWER_URLS", value_delimiter = ',')]
    pub follower_urls: Vec<String>,

    #[arg(long, env = "WRITE_QUORUM", default_value_t = 1)]
    pub write_quorum: usize,

    #[arg(long, env = "MIN_DELAY_MS", default_value_t = 0)]
    pub min_delay_ms: u64,

    #[arg(long, env = "MAX_DELAY_MS", default_value_t = 1000)]
    pub max_delay_ms: u64,

    /// Report a write as failed if quorum is not reached within this many
    /// milliseconds. Unset means wait indefinitely.
    #[arg(long, env = "WRITE_DEADLINE_MS")]
    pub write_deadline_ms: Option<u64>,
}

impl CliArgs {
    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn follower_urls(&self) -> Vec<String> {
        self.follower_urls
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn replication_config(&self) -> ReplicationConfig {
        ReplicationConfig {
            num_followers: self.follower_urls().len(),
            write_quorum: self.write_quorum,
            min_delay: Duration::from_millis(self.min_delay_ms),
            max_delay: Duration::from_millis(self.max_delay_ms),
            write_deadline: self.write_deadline_ms.map(Duration::from_millis),
        }
    }
}

/// Replication knobs, checked once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplicationConfig {
    pub num_followers: usize,
    pub write_quorum: usize,
    pub min_delay: Duration,
    pub max_delay: Duration,
    pub write_deadline: Option<Duration>,
}

impl ReplicationConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.write_quorum == 0 || self.write_quorum > self.num_followers {
            return Err(ConfigError::InvalidQuorum {
                quorum: self.write_quorum,
                followers: self.num_followers,
            });
        }
        self.delay_model().map(|_| ())
    }

    pub fn delay_model(&self) -> Result<UniformDelay, ConfigError> {
        UniformDelay::new(self.min_delay, self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(followers: usize, quorum: usize) -> ReplicationConfig {
        ReplicationConfig {
            num_followers: followers,
            write_quorum: quorum,
            min_delay: Duration::ZERO,
            max_delay: Duration::from_millis(1000),
            write_deadline: None,
        }
    }

    #[test]
    fn quorum_must_be_within_follower_count() {
        assert!(config(5, 1).validate().is_ok());
        assert!(config(5, 5).validate().is_ok());
        assert_eq!(
            config(5, 0).validate(),
            Err(ConfigError::InvalidQuorum { quorum: 0, followers: 5 })
        );
        assert_eq!(
            config(5, 6).validate(),
            Err(ConfigError::InvalidQuorum { quorum: 6, followers: 5 })
        );
    }

    #[test]
    fn inverted_delay_range_is_rejected() {
        let mut cfg = config(3, 2);
        cfg.min_delay = Duration::from_millis(50);
        cfg.max_delay = Duration::from_millis(10);
        assert!(matches!(cfg.validate(), Err(ConfigError::InvalidDelayRange { .. })));
    }

    #[test]
    fn parses_leader_flags() {
        let args = CliArgs::try_parse_from([
            "semisync-kv",
            "--role",
            "leader",
            "--node-id",
            "leader",
            "--port",
            "8000",
            "--follower-urls",
            "http://localhost:8001,http://localhost:8002/,",
            "--write-quorum",
            "2",
            "--min-delay-ms",
            "10",
            "--max-delay-ms",
            "50",
            "--write-deadline-ms",
            "2000",
        ])
        .unwrap();

        assert_eq!(args.role, Role::Leader);
        assert_eq!(args.listen_addr().port(), 8000);
        assert_eq!(
            args.follower_urls(),
            vec!["http://localhost:8001", "http://localhost:8002/"]
        );
        assert_eq!(
            args.replication_config(),
            ReplicationConfig {
                num_followers: 2,
                write_quorum: 2,
                min_delay: Duration::from_millis(10),
                max_delay: Duration::from_millis(50),
                write_deadline: Some(Duration::from_secs(2)),
            }
        );
    }
}
