use std::collections::BTreeMap;

use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::api::{internal, ApiState, Node};
use crate::config::Role;
use crate::error::ReplicationError;
use crate::util::Timestamp;

pub struct RouterBuilder;

impl RouterBuilder {
    pub fn with_state(state: ApiState) -> Router {
        let router = Router::new()
            .route("/", get(root))
            .route("/health", get(health))
            .route("/read/:key", get(read_key))
            .route("/all", get(all))
            .route("/metrics", get(metrics));

        let router = match state.cluster.role {
            Role::Leader => router.route("/write", post(write)),
            Role::Follower => router.route("/replicate", post(internal::replicate)),
        };
        router.with_state(state)
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteBody {
    pub key: String,
    pub value: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct WriteResponse {
    pub success: bool,
    pub message: String,
    pub replicated_count: usize,
    pub timestamp: Option<Timestamp>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ReadResponse {
    pub success: bool,
    pub key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AllResponse {
    pub success: bool,
    pub data: BTreeMap<String, String>,
    pub count: usize,
}

async fn write(State(state): State<ApiState>, Json(body): Json<WriteBody>) -> Response {
    let Node::Leader(leader) = &state.node else {
        state.metrics.requests.with_label_values(&["POST", "/write", "403"]).inc();
        let detail = json!({ "detail": "Write operations are only allowed on the leader" });
        return (StatusCode::FORBIDDEN, Json(detail)).into_response();
    };

    let timer = state.metrics.write_latency.start_timer();
    let resp = match leader.write(body.key, body.value).await {
        Ok(outcome) => {
            timer.observe_duration();
            state.metrics.kv_ops.with_label_values(&["write"]).inc();
            WriteResponse {
                success: true,
                message: format!(
                    "Write successful, replicated to {} followers",
                    outcome.replicated
                ),
                replicated_count: outcome.replicated,
                timestamp: Some(outcome.timestamp),
            }
        }
        Err(ReplicationError::QuorumUnreachable { required, acked }) => {
            timer.stop_and_discard();
            state.metrics.errors.with_label_values(&["quorum_unreachable"]).inc();
            WriteResponse {
                success: false,
                message: format!(
                    "Write failed to meet quorum. Required: {required}, Achieved: {acked}"
                ),
                replicated_count: acked,
                timestamp: None,
            }
        }
        Err(err) => {
            timer.stop_and_discard();
            state.metrics.errors.with_label_values(&["replication"]).inc();
            WriteResponse {
                success: false,
                message: err.to_string(),
                replicated_count: 0,
                timestamp: None,
            }
        }
    };

    state.metrics.requests.with_label_values(&["POST", "/write", "200"]).inc();
    (StatusCode::OK, Json(resp)).into_response()
}

async fn read_key(State(state): State<ApiState>, Path(key): Path<String>) -> Response {
    let (status, resp) = match state.node.get(&key) {
        Some(value) => {
            state.metrics.kv_ops.with_label_values(&["read"]).inc();
            let body = ReadResponse {
                success: true,
                key,
                value: Some(value),
                message: None,
            };
            (StatusCode::OK, body)
        }
        None => {
            state.metrics.errors.with_label_values(&["not_found"]).inc();
            let body = ReadResponse {
                success: false,
                key,
                value: None,
                message: Some("Key not found".into()),
            };
            (StatusCode::NOT_FOUND, body)
        }
    };

    let status_label = if status == StatusCode::OK { "200" } else { "404" };
    state.metrics.requests.with_label_values(&["GET", "/read/:key", status_label]).inc();

    (status, Json(resp)).into_response()
}

async fn all(State(state): State<ApiState>) -> Response {
    let data = state.node.snapshot();
    state.metrics.requests.with_label_values(&["GET", "/all", "200"]).inc();
    let count = data.len();
    Json(AllResponse {
        success: true,
        data,
        count,
    })
    .into_response()
}

async fn health(State(state): State<ApiState>) -> Response {
    let body = match &state.node {
        Node::Leader(leader) => json!({
            "status": "healthy",
            "role": Role::Leader,
            "node_id": state.cluster.node_id,
            "write_quorum": leader.quorum(),
            "followers": leader.follower_count(),
        }),
        Node::Follower(_) => json!({
            "status": "healthy",
            "role": Role::Follower,
            "node_id": state.cluster.node_id,
        }),
    };
    Json(body).into_response()
}

async fn root(State(state): State<ApiState>) -> Response {
    Json(json!({
        "service": "Key-Value Store",
        "node_id": state.cluster.node_id,
        "role": state.cluster.role,
        "status": "running",
    }))
    .into_response()
}

async fn metrics(State(state): State<ApiState>) -> Response {
    if let Node::Leader(leader) = &state.node {
        state.metrics.observe_tracker(leader.tracker());
    }
    match state.metrics.encode() {
        Ok((content_type, buffer)) => {
            (StatusCode::OK, [(header::CONTENT_TYPE, content_type)], buffer).into_response()
        }
        Err(err) => {
            tracing::error!(error = %err, "failed to encode metrics");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}
