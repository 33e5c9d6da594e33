use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde_json::json;

use crate::error::BrokerError;
use crate::state::BrokerState;
use crate::wire::{
    FetchResponse, HealthResponse, LogResponse, MessagesResponse, PromoteResponse, ReplicateRequest,
    ReplicateResponse, ReplicationResult, StoreRequest, StoreResponse,
};

/// PRIMARY path: writes locally, then sequentially POSTs `/replicate` to
/// each replica URL (spec.md §4.2). A replication failure is recorded in
/// `replicationResults` but never rolls back the local write or fails the
/// overall request.
pub async fn store(
    State(state): State<Arc<BrokerState>>,
    Json(body): Json<StoreRequest>,
) -> Result<(axum::http::StatusCode, Json<StoreResponse>), BrokerError> {
    let key = body.key.ok_or_else(|| BrokerError::BadRequest("key".to_string()))?;
    let payload = body.payload.ok_or_else(|| BrokerError::BadRequest("payload".to_string()))?;

    state.store.store_primary(key.clone(), payload.clone());

    let mut replication_results = Vec::with_capacity(body.replicate_to.len());
    for url in &body.replicate_to {
        let request = json!({ "key": key, "payload": payload, "primaryNode": state.node_id });
        let send = state.client.post(format!("{url}/replicate")).json(&request).send();

        let result = match send.await.and_then(reqwest::Response::error_for_status) {
            Ok(_) => ReplicationResult { node: url.clone(), status: "success", error: None },
            Err(err) => {
                tracing::warn!(%url, error = %err, "replication failed");
                ReplicationResult { node: url.clone(), status: "failed", error: Some(err.to_string()) }
            }
        };
        replication_results.push(result);
    }

    Ok((
        axum::http::StatusCode::CREATED,
        Json(StoreResponse {
            success: true,
            node: state.node_id.clone(),
            role: "primary",
            key,
            replicated_to: body.replicate_to,
            replication_results,
        }),
    ))
}

/// REPLICA path: writes locally with role=replica.
pub async fn replicate(
    State(state): State<Arc<BrokerState>>,
    Json(body): Json<ReplicateRequest>,
) -> Result<Json<ReplicateResponse>, BrokerError> {
    let key = body.key.ok_or_else(|| BrokerError::BadRequest("key".to_string()))?;
    let payload = body.payload.ok_or_else(|| BrokerError::BadRequest("payload".to_string()))?;
    let primary_node = body.primary_node.ok_or_else(|| BrokerError::BadRequest("primaryNode".to_string()))?;

    state.store.replicate(key.clone(), payload, primary_node);

    Ok(Json(ReplicateResponse {
        success: true,
        node: state.node_id.clone(),
        role: "replica",
        key,
    }))
}

pub async fn fetch(
    State(state): State<Arc<BrokerState>>,
    Path(key): Path<String>,
) -> Result<Json<FetchResponse>, BrokerError> {
    let entry = state.store.fetch(&key).ok_or_else(|| BrokerError::NotFound(key.clone()))?;

    Ok(Json(FetchResponse {
        success: true,
        node: state.node_id.clone(),
        key,
        payload: entry.payload,
        timestamp: entry.timestamp,
        role: entry.role.to_string(),
        replica_of: entry.replica_of,
    }))
}

pub async fn health(State(state): State<Arc<BrokerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        node: state.node_id.clone(),
        message_count: state.store.message_count(),
        timestamp: queuemesh_types::now(),
    })
}

pub async fn messages(State(state): State<Arc<BrokerState>>) -> Json<MessagesResponse> {
    let entries = state.store.all_entries();
    let messages = entries.iter().map(|(k, v)| (k.clone(), v.payload.clone())).collect();

    Json(MessagesResponse {
        node: state.node_id.clone(),
        message_count: entries.len(),
        messages,
    })
}

pub async fn log(State(state): State<Arc<BrokerState>>) -> Json<LogResponse> {
    let stored_as_primary = state.store.stored_as_primary();
    let stored_as_replica = state.store.stored_as_replica();

    Json(LogResponse {
        node: state.node_id.clone(),
        summary: format!(
            "{} stored as primary, {} stored as replica",
            stored_as_primary.len(),
            stored_as_replica.len()
        ),
        stored_as_primary: stored_as_primary.iter().map(|e| serde_json::to_value(e).unwrap()).collect(),
        stored_as_replica: stored_as_replica.iter().map(|e| serde_json::to_value(e).unwrap()).collect(),
    })
}

pub async fn promote(State(state): State<Arc<BrokerState>>) -> Json<PromoteResponse> {
    state.store.promote();
    Json(PromoteResponse {
        success: true,
        node: state.node_id.clone(),
        message: "promoted to primary".to_string(),
    })
}
