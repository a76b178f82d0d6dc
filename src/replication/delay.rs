//! Per-task replication latency.
//!
//! Every (write, follower) pair draws its own delay; nothing is shared between
//! draws, so the delay model is the only source of reordering in the system.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use rand::Rng;

use crate::error::ConfigError;

pub trait DelayModel: Send + Sync + fmt::Debug {
    fn sample(&self) -> Duration;
}

/// Uniform on `[min, max]`, microsecond resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UniformDelay {
    min: Duration,
    max: Duration,
}

impl UniformDelay {
    pub fn new(min: Duration, max: Duration) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvalidDelayRange { min, max });
        }
        Ok(UniformDelay { min, max })
    }

    pub fn from_millis(min_ms: u64, max_ms: u64) -> Result<Self, ConfigError> {
        Self::new(Duration::from_millis(min_ms), Duration::from_millis(max_ms))
    }

    pub fn min(&self) -> Duration {
        self.min
    }

    pub fn max(&self) -> Duration {
        self.max
    }

    pub fn mean(&self) -> Duration {
        (self.min + self.max) / 2
    }
}

impl DelayModel for UniformDelay {
    fn sample(&self) -> Duration {
        let lo = self.min.as_micros() as u64;
        let hi = self.max.as_micros() as u64;
        Duration::from_micros(rand::thread_rng().gen_range(lo..=hi))
    }
}

/// Always the same delay. Pins one follower's latency in tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_millis(ms: u64) -> Self {
        FixedDelay(Duration::from_millis(ms))
    }
}

impl DelayModel for FixedDelay {
    fn sample(&self) -> Duration {
        self.0
    }
}

/// Hands out queued delays in order, then `fallback` once the queue is empty.
#[derive(Debug)]
pub struct ScriptedDelay {
    queue: Mutex<VecDeque<Duration>>,
    fallback: Duration,
}

impl ScriptedDelay {
    pub fn new(delays: impl IntoIterator<Item = Duration>, fallback: Duration) -> Self {
        ScriptedDelay {
            queue: Mutex::new(delays.into_iter().collect()),
            fallback,
        }
    }
}

impl DelayModel for ScriptedDelay {
    fn sample(&self) -> Duration {
        self.queue
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(self.fallback)
    }
}
