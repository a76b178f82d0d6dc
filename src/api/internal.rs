use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

use crate::api::{ApiState, Node};
use crate::replication::ReplicateResponse;
use crate::util::WriteRequest;

/// Applies a write pushed by the leader. Stale writes are acknowledged with
/// `applied: false`.
pub async fn replicate(State(state): State<ApiState>, Json(request): Json<WriteRequest>) -> Response {
    let Node::Follower(follower) = &state.node else {
        state.metrics.requests.with_label_values(&["POST", "/replicate", "403"]).inc();
        let detail = json!({ "detail": "Replication is only accepted by followers" });
        return (StatusCode::FORBIDDEN, Json(detail)).into_response();
    };

    let key = request.key.clone();
    let timestamp = request.timestamp;
    let ack = follower.apply(request);
    if ack.applied {
        state.metrics.kv_ops.with_label_values(&["replicate"]).inc();
    } else {
        state.metrics.kv_ops.with_label_values(&["replicate_stale"]).inc();
        tracing::debug!(node_id = %ack.follower_id, key = %key, timestamp = %timestamp, "ignored stale write");
    }

    state.metrics.requests.with_label_values(&["POST", "/replicate", "200"]).inc();
    Json(ReplicateResponse {
        success: true,
        follower_id: ack.follower_id,
        applied: ack.applied,
    })
    .into_response()
}
