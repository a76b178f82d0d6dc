pub mod types;

pub use types::{Ack, Timestamp, WriteRequest};
