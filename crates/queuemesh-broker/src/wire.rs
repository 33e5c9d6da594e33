//! JSON wire shapes for the Broker's HTTP surface (spec.md §6).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct StoreRequest {
    pub key: Option<String>,
    pub payload: Option<Value>,
    #[serde(default, rename = "replicateTo")]
    pub replicate_to: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ReplicationResult {
    pub node: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    pub success: bool,
    pub node: String,
    pub role: &'static str,
    pub key: String,
    pub replicated_to: Vec<String>,
    pub replication_results: Vec<ReplicationResult>,
}

#[derive(Debug, Deserialize)]
pub struct ReplicateRequest {
    pub key: Option<String>,
    pub payload: Option<Value>,
    #[serde(rename = "primaryNode")]
    pub primary_node: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ReplicateResponse {
    pub success: bool,
    pub node: String,
    pub role: &'static str,
    pub key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub success: bool,
    pub node: String,
    pub key: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replica_of: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub node: String,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct MessagesResponse {
    pub node: String,
    #[serde(rename = "messageCount")]
    pub message_count: usize,
    pub messages: std::collections::HashMap<String, Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogResponse {
    pub node: String,
    pub summary: String,
    pub stored_as_primary: Vec<Value>,
    pub stored_as_replica: Vec<Value>,
}

#[derive(Debug, Serialize)]
pub struct PromoteResponse {
    pub success: bool,
    pub node: String,
    pub message: String,
}
