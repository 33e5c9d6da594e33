//! JSON wire shapes for the Coordinator's HTTP surface (spec.md §6).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Deserialize)]
pub struct ProduceRequest {
    pub key: Option<String>,
    pub payload: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplicationResult {
    pub node: String,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreRequest {
    pub key: String,
    pub payload: Value,
    pub replicate_to: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreResponse {
    #[serde(default)]
    pub replication_results: Vec<ReplicationResult>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProduceResponse {
    pub success: bool,
    pub key: String,
    pub key_hash: u32,
    pub primary: String,
    pub replicas: Vec<String>,
    pub replication_results: Vec<ReplicationResult>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchResponse {
    pub key: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub role: String,
    #[serde(default)]
    pub replica_of: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeResponse {
    pub success: bool,
    pub key: String,
    pub payload: Value,
    pub timestamp: DateTime<Utc>,
    pub role: String,
    pub served_by: String,
    pub source: String,
    pub failover: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeInfo {
    pub url: String,
    pub virtual_node_count: usize,
    pub ring_coverage: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RingResponse {
    pub total_nodes: usize,
    pub virtual_node_count: u32,
    pub total_virtual_nodes: usize,
    pub hash_space: u64,
    pub nodes: HashMap<String, NodeInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteResponse {
    pub key: String,
    pub key_hash: u32,
    pub primary: String,
    pub primary_url: String,
    pub replicas: Vec<String>,
    pub replica_urls: Vec<String>,
    pub failover_active: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthNodeInfo {
    pub status: String,
    pub fail_count: u32,
    pub last_check: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailoverEventWire {
    pub failed_node: String,
    pub promoted_node: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FailoverStatusResponse {
    pub total_failovers: usize,
    pub active_promotions: HashMap<String, String>,
    pub events: Vec<FailoverEventWire>,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub timestamp: DateTime<Utc>,
}
