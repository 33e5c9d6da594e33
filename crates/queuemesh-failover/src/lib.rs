//! # queuemesh-failover: Promotion controller
//!
//! Consumes [`HealthEvent`](queuemesh_health::HealthEvent)s from the health
//! detector, one at a time, and drives the promotion protocol from
//! spec.md §4.4: clockwise candidate walk, `/health` probe, `/promote`
//! POST, override-map update, failover event log append.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use queuemesh_health::{HealthDetector, HealthEvent};
use queuemesh_types::{BrokerName, BrokerRecord};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// One append-only failover event (spec.md §3, Failover event log).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverEvent {
    pub failed_node: BrokerName,
    pub promoted_node: BrokerName,
    pub timestamp: DateTime<Utc>,
}

/// Reacts to broker failures by promoting a replacement and recording the
/// routing override. Owns the override map and the failover event log —
/// the single source of post-failover routing truth (spec.md §9).
pub struct FailoverController {
    brokers: Vec<BrokerRecord>,
    probe_timeout: Duration,
    client: reqwest::Client,
    overrides: Mutex<HashMap<BrokerName, BrokerName>>,
    events: Mutex<Vec<FailoverEvent>>,
}

impl FailoverController {
    pub fn new(brokers: Vec<BrokerRecord>, probe_timeout: Duration) -> Self {
        Self {
            brokers,
            probe_timeout,
            client: reqwest::Client::new(),
            overrides: Mutex::new(HashMap::new()),
            events: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of the override map, for routing and `/route/:key`.
    pub fn overrides_snapshot(&self) -> HashMap<BrokerName, BrokerName> {
        self.overrides.lock().unwrap().clone()
    }

    /// Resolves the effective node for a raw node name: `override[name]` if
    /// present, otherwise `name` itself (spec.md I2).
    pub fn resolve(&self, name: &BrokerName) -> BrokerName {
        self.overrides
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .unwrap_or_else(|| name.clone())
    }

    /// `true` iff any failover has ever occurred (spec.md §9 open question:
    /// this preserves the source's literal "any failover ever" semantics
    /// rather than per-read fallback detection).
    pub fn failover_has_ever_occurred(&self) -> bool {
        !self.overrides.lock().unwrap().is_empty()
    }

    pub fn total_failovers(&self) -> usize {
        self.events.lock().unwrap().len()
    }

    pub fn events_snapshot(&self) -> Vec<FailoverEvent> {
        self.events.lock().unwrap().clone()
    }

    /// Drains `events_rx` until the channel closes, driving one failure or
    /// recovery at a time — two failovers never run concurrently for the
    /// same failed node because this loop processes events serially
    /// (spec.md §5 ordering guarantee).
    pub async fn run(
        self: std::sync::Arc<Self>,
        health: std::sync::Arc<HealthDetector>,
        mut events_rx: mpsc::UnboundedReceiver<HealthEvent>,
    ) {
        while let Some(event) = events_rx.recv().await {
            match event {
                HealthEvent::Failure(failed) => {
                    self.handle_failure(&health, &failed).await;
                }
                HealthEvent::Recovery(node) => {
                    // No un-promotion after recovery (spec.md §4.4
                    // recovery policy): the promoted node remains the
                    // effective primary.
                    tracing::info!(broker = %node, "broker recovered, override retained");
                }
            }
        }
    }

    async fn handle_failure(&self, health: &HealthDetector, failed: &BrokerName) {
        let Some(failed_index) = self.brokers.iter().position(|b| &b.name == failed) else {
            tracing::warn!(broker = %failed, "failure event for unregistered broker, ignoring");
            return;
        };

        let candidate_count = self.brokers.len();
        for step in 1..candidate_count {
            let idx = (failed_index + step) % candidate_count;
            let candidate = &self.brokers[idx];

            if !self.probe_health(candidate.url.as_str()).await {
                continue;
            }

            if self.promote(candidate.url.as_str()).await {
                let timestamp = queuemesh_types::now();
                self.overrides
                    .lock()
                    .unwrap()
                    .insert(failed.clone(), candidate.name.clone());
                health.mark_failed_over(failed);
                self.events.lock().unwrap().push(FailoverEvent {
                    failed_node: failed.clone(),
                    promoted_node: candidate.name.clone(),
                    timestamp,
                });
                tracing::warn!(failed = %failed, promoted = %candidate.name, "failover complete");
                return;
            }

            tracing::warn!(candidate = %candidate.name, "promotion POST failed, trying next candidate");
        }

        tracing::error!(broker = %failed, "no candidate available, entering degraded mode");
    }

    async fn probe_health(&self, url: &str) -> bool {
        let request = self.client.get(format!("{url}/health")).send();
        match tokio::time::timeout(self.probe_timeout, request).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        }
    }

    async fn promote(&self, url: &str) -> bool {
        let request = self.client.post(format!("{url}/promote")).send();
        match tokio::time::timeout(self.probe_timeout, request).await {
            Ok(Ok(response)) => response.status().is_success(),
            _ => false,
        }
    }
}
