pub mod delay;
pub mod endpoint;
pub mod http;

pub use delay::{DelayModel, FixedDelay, ScriptedDelay, UniformDelay};
pub use endpoint::{FollowerEndpoint, LocalFollower};
pub use http::{HttpFollower, ReplicateResponse};
