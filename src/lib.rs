//! Single-leader key-value store with semi-synchronous replication.
//!
//! A write commits on the leader, fans out to every follower at once, and
//! returns as soon as a configured quorum of followers has acknowledged it.
//! Replications still running at that point finish in the background.
//! Followers resolve out-of-order delivery with last-writer-wins on the
//! leader-assigned timestamp.
//!
//! - [`store`]: per-node timestamped map and the monotonic clock behind it
//! - [`replication`]: delay models and the follower endpoints writes go to
//! - [`cluster`]: quorum fan-out, the leader, the follower node and an
//!   in-process cluster
//! - [`api`]: axum routes for both roles
//! - [`config`]: command-line and environment configuration

pub mod api;
pub mod cluster;
pub mod config;
pub mod error;
pub mod replication;
pub mod store;
pub mod util;
