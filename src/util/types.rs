use std::fmt;

use serde::{Deserialize, Serialize};

/// Seconds since the Unix epoch, with sub-millisecond precision.
///
/// Unseen keys compare as [`Timestamp::ZERO`].
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Timestamp(pub f64);

impl Timestamp {
    pub const ZERO: Timestamp = Timestamp(0.0);

    pub fn from_micros(micros: u64) -> Self {
        Timestamp(micros as f64 / 1_000_000.0)
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}", self.0)
    }
}

/// One write as it travels from the leader to every follower.
///
/// The timestamp is assigned once at the leader's local commit and reused
/// verbatim for every replication attempt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WriteRequest {
    pub key: String,
    pub value: String,
    pub timestamp: Timestamp,
}

/// Acknowledgement from a follower. `applied` is false when the follower
/// already held a newer (or equal) timestamp for the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    pub follower_id: String,
    pub applied: bool,
}
