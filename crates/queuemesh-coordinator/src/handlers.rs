use std::collections::HashMap;
use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use queuemesh_ring::Placement;
use queuemesh_types::BrokerName;

use crate::error::RouterError;
use crate::state::CoordinatorState;
use crate::wire::{
    ConsumeResponse, FailoverEventWire, FailoverStatusResponse, FetchResponse, HealthNodeInfo, HealthResponse,
    NodeInfo, ProduceRequest, ProduceResponse, RingResponse, RouteResponse, StoreRequest, StoreResponse,
};

/// Raw ring placement plus the override-resolved effective primary and
/// replicas for one key (spec.md I2).
struct ResolvedPlacement {
    placement: Placement,
    effective_primary: String,
    effective_replicas: Vec<String>,
}

fn resolve_placement(state: &CoordinatorState, key: &str) -> Result<ResolvedPlacement, RouterError> {
    let placement = state
        .ring
        .get_nodes_for_key(key, state.config.replication_factor)
        .map_err(|_| RouterError::RingEmpty)?;

    let effective_primary = state.failover.resolve(&BrokerName::new(placement.primary.clone())).to_string();

    let mut effective_replicas = Vec::new();
    for raw in &placement.replicas {
        let resolved = state.failover.resolve(&BrokerName::new(raw.clone())).to_string();
        if resolved != effective_primary && !effective_replicas.contains(&resolved) {
            effective_replicas.push(resolved);
        }
    }

    Ok(ResolvedPlacement {
        placement,
        effective_primary,
        effective_replicas,
    })
}

pub async fn produce(
    State(state): State<Arc<CoordinatorState>>,
    Json(body): Json<ProduceRequest>,
) -> Result<(axum::http::StatusCode, Json<ProduceResponse>), RouterError> {
    let key = body.key.ok_or_else(|| RouterError::BadRequest("key".to_string()))?;
    let payload = body.payload.ok_or_else(|| RouterError::BadRequest("payload".to_string()))?;

    let resolved = resolve_placement(&state, &key)?;

    let primary_url = state
        .ring
        .get_node_url(&resolved.effective_primary)
        .unwrap_or_default()
        .to_string();
    let replica_urls: Vec<String> = resolved
        .effective_replicas
        .iter()
        .filter_map(|name| state.ring.get_node_url(name))
        .map(str::to_string)
        .collect();

    let store_request = StoreRequest {
        key: key.clone(),
        payload,
        replicate_to: replica_urls,
    };

    let send = state.client.post(format!("{primary_url}/store")).json(&store_request).send();
    let response = tokio::time::timeout(state.probe_timeout(), send)
        .await
        .map_err(|_| RouterError::PrimaryUnreachable {
            key: key.clone(),
            message: "timed out".to_string(),
        })?
        .and_then(reqwest::Response::error_for_status)
        .map_err(|err| RouterError::PrimaryUnreachable { key: key.clone(), message: err.to_string() })?;

    let body: StoreResponse = response
        .json()
        .await
        .map_err(|err| RouterError::PrimaryUnreachable { key: key.clone(), message: err.to_string() })?;

    tracing::info!(%key, primary = %resolved.effective_primary, "produce complete");

    Ok((
        axum::http::StatusCode::CREATED,
        Json(ProduceResponse {
            success: true,
            key,
            key_hash: resolved.placement.key_hash,
            primary: resolved.effective_primary,
            replicas: resolved.effective_replicas,
            replication_results: body.replication_results,
        }),
    ))
}

pub async fn consume(
    State(state): State<Arc<CoordinatorState>>,
    Path(key): Path<String>,
) -> Result<Json<ConsumeResponse>, RouterError> {
    let resolved = resolve_placement(&state, &key)?;

    let mut candidates = vec![resolved.effective_primary.clone()];
    candidates.extend(resolved.effective_replicas.clone());

    for candidate in &candidates {
        let Some(url) = state.ring.get_node_url(candidate) else {
            continue;
        };

        let send = state.client.get(format!("{url}/fetch/{key}")).send();
        let Ok(Ok(response)) = tokio::time::timeout(state.probe_timeout(), send).await else {
            continue;
        };
        let Ok(response) = response.error_for_status() else {
            continue;
        };
        let Ok(fetched) = response.json::<FetchResponse>().await else {
            continue;
        };

        let source = if *candidate == resolved.placement.primary { "primary" } else { "replica" };

        return Ok(Json(ConsumeResponse {
            success: true,
            key: fetched.key,
            payload: fetched.payload,
            timestamp: fetched.timestamp,
            role: fetched.role,
            served_by: candidate.clone(),
            source: source.to_string(),
            failover: state.failover.failover_has_ever_occurred(),
        }));
    }

    Err(RouterError::NotFound { key })
}

pub async fn ring(State(state): State<Arc<CoordinatorState>>) -> Json<RingResponse> {
    let coverage = state.ring.coverage();
    let total_virtual_nodes = state.ring.total_virtual_nodes();

    let nodes = coverage
        .into_iter()
        .map(|(name, info)| {
            let ring_coverage = if total_virtual_nodes == 0 {
                0.0
            } else {
                info.virtual_node_count as f64 / total_virtual_nodes as f64
            };
            (
                name,
                NodeInfo {
                    url: info.url,
                    virtual_node_count: info.virtual_node_count,
                    ring_coverage,
                },
            )
        })
        .collect();

    Json(RingResponse {
        total_nodes: state.ring.total_nodes(),
        virtual_node_count: state.config.virtual_nodes,
        total_virtual_nodes,
        hash_space: queuemesh_ring::HASH_SPACE,
        nodes,
    })
}

pub async fn route(
    State(state): State<Arc<CoordinatorState>>,
    Path(key): Path<String>,
) -> Result<Json<RouteResponse>, RouterError> {
    let resolved = resolve_placement(&state, &key)?;

    let primary_url = state.ring.get_node_url(&resolved.effective_primary).unwrap_or_default().to_string();
    let replica_urls = resolved
        .effective_replicas
        .iter()
        .filter_map(|name| state.ring.get_node_url(name))
        .map(str::to_string)
        .collect();

    Ok(Json(RouteResponse {
        key,
        key_hash: resolved.placement.key_hash,
        failover_active: resolved.effective_primary != resolved.placement.primary,
        primary: resolved.effective_primary,
        primary_url,
        replicas: resolved.effective_replicas,
        replica_urls,
    }))
}

pub async fn health_nodes(State(state): State<Arc<CoordinatorState>>) -> Json<HashMap<String, HealthNodeInfo>> {
    let snapshot = state.health.snapshot();
    let nodes = snapshot
        .into_iter()
        .map(|(name, record)| {
            (
                name.to_string(),
                HealthNodeInfo {
                    status: record.status.to_string(),
                    fail_count: record.fail_count,
                    last_check: record.last_check,
                    last_success: record.last_success,
                    failed_at: record.failed_at,
                },
            )
        })
        .collect();
    Json(nodes)
}

pub async fn failover_status(State(state): State<Arc<CoordinatorState>>) -> Json<FailoverStatusResponse> {
    let overrides = state.failover.overrides_snapshot();
    let active_promotions = overrides
        .into_iter()
        .map(|(failed, promoted)| (failed.to_string(), promoted.to_string()))
        .collect();

    let events = state
        .failover
        .events_snapshot()
        .into_iter()
        .map(|e| FailoverEventWire {
            failed_node: e.failed_node.to_string(),
            promoted_node: e.promoted_node.to_string(),
            timestamp: e.timestamp,
        })
        .collect();

    Json(FailoverStatusResponse {
        total_failovers: state.failover.total_failovers(),
        active_promotions,
        events,
    })
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        service: "coordinator",
        timestamp: queuemesh_types::now(),
    })
}
