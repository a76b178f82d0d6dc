pub mod clock;
pub mod engine;

pub use clock::MonotonicClock;
pub use engine::{Entry, TimestampedStore};
