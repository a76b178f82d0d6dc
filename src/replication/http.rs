use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::error::ReplicationError;
use crate::replication::{DelayModel, FollowerEndpoint};
use crate::util::{Ack, WriteRequest};

/// Body a follower returns from `POST /replicate`.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReplicateResponse {
    pub success: bool,
    pub follower_id: String,
    pub applied: bool,
}

/// Follower reached over HTTP. The simulated network delay is taken on the
/// leader side, before the request is sent.
#[derive(Debug, Clone)]
pub struct HttpFollower {
    base_url: String,
    url: String,
    client: Client,
    delay: Arc<dyn DelayModel>,
}

impl HttpFollower {
    pub fn new(client: Client, base_url: &str, delay: Arc<dyn DelayModel>) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        let url = format!("{base_url}/replicate");
        HttpFollower {
            base_url,
            url,
            client,
            delay,
        }
    }

    fn transport(&self, reason: impl ToString) -> ReplicationError {
        ReplicationError::Transport {
            follower: self.base_url.clone(),
            reason: reason.to_string(),
        }
    }
}

#[async_trait]
impl FollowerEndpoint for HttpFollower {
    fn id(&self) -> &str {
        &self.base_url
    }

    async fn replicate(&self, request: &WriteRequest) -> Result<Ack, ReplicationError> {
        tokio::time::sleep(self.delay.sample()).await;

        let resp = self
            .client
            .post(&self.url)
            .json(request)
            .send()
            .await
            .map_err(|e| self.transport(e))?;

        if !resp.status().is_success() {
            return Err(self.transport(format!("status {}", resp.status())));
        }

        let body: ReplicateResponse = resp.json().await.map_err(|e| self.transport(e))?;
        if !body.success {
            return Err(self.transport("follower reported failure"));
        }
        Ok(Ack {
            follower_id: body.follower_id,
            applied: body.applied,
        })
    }
}
