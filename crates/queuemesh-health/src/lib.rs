//! # queuemesh-health: Broker liveness detector
//!
//! Runs a periodic probe round against every registered broker and drives
//! the per-broker state machine from spec.md §4.3: HEALTHY, FAILED,
//! FAILED_OVER, RECOVERED. Failure/recovery events are delivered to a
//! single consumer (the failover controller) over an `mpsc` channel,
//! mirroring `ClusterSupervisor::monitor_loop`'s tick-loop shape in the
//! teacher workspace but probing HTTP brokers instead of child processes.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};
use queuemesh_types::{BrokerName, BrokerRecord, HealthStatus};
use tokio::sync::{mpsc, Notify};
use tokio::task::JoinHandle;

/// Tuning parameters for the detector (spec.md §4.3).
#[derive(Debug, Clone)]
pub struct HealthDetectorConfig {
    /// Probe interval, default 5s.
    pub probe_interval: Duration,
    /// Consecutive failures required to declare FAILED, default 3.
    pub failure_threshold: u32,
    /// Per-probe timeout, default 2s.
    pub probe_timeout: Duration,
}

impl Default for HealthDetectorConfig {
    fn default() -> Self {
        Self {
            probe_interval: Duration::from_secs(5),
            failure_threshold: 3,
            probe_timeout: Duration::from_secs(2),
        }
    }
}

/// Per-broker health bookkeeping (spec.md §3, Health record).
#[derive(Debug, Clone, PartialEq)]
pub struct HealthRecord {
    pub status: HealthStatus,
    pub fail_count: u32,
    pub last_check: Option<DateTime<Utc>>,
    pub last_success: Option<DateTime<Utc>>,
    pub failed_at: Option<DateTime<Utc>>,
}

impl HealthRecord {
    fn initial() -> Self {
        Self {
            status: HealthStatus::Healthy,
            fail_count: 0,
            last_check: None,
            last_success: None,
            failed_at: None,
        }
    }
}

/// Emitted by a probe round and consumed by the failover controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthEvent {
    Failure(BrokerName),
    Recovery(BrokerName),
}

/// Probes every registered broker on a timer and maintains their health
/// records. Construct once per Coordinator process.
pub struct HealthDetector {
    config: HealthDetectorConfig,
    brokers: Vec<BrokerRecord>,
    records: Mutex<HashMap<BrokerName, HealthRecord>>,
    client: reqwest::Client,
    stop_signal: Notify,
}

impl HealthDetector {
    pub fn new(brokers: Vec<BrokerRecord>, config: HealthDetectorConfig) -> Self {
        let mut records = HashMap::new();
        for broker in &brokers {
            records.insert(broker.name.clone(), HealthRecord::initial());
        }

        Self {
            config,
            brokers,
            records: Mutex::new(records),
            client: reqwest::Client::new(),
            stop_signal: Notify::new(),
        }
    }

    /// Snapshot of every broker's health record, for `/health/nodes`.
    pub fn snapshot(&self) -> HashMap<BrokerName, HealthRecord> {
        self.records.lock().unwrap().clone()
    }

    /// Records the external FAILED → FAILED_OVER transition once the
    /// failover controller has successfully promoted a replacement.
    pub fn mark_failed_over(&self, name: &BrokerName) {
        if let Some(record) = self.records.lock().unwrap().get_mut(name) {
            if record.status == HealthStatus::Failed {
                record.status = HealthStatus::FailedOver;
            }
        }
    }

    /// Cancels the periodic tick. In-flight probes may finish; no further
    /// events are emitted after this call observes effect.
    pub fn stop(&self) {
        self.stop_signal.notify_one();
    }

    /// Spawns the periodic probe loop. Events are sent to `events_tx`
    /// until [`HealthDetector::stop`] is called.
    pub fn spawn(
        self: std::sync::Arc<Self>,
        events_tx: mpsc::UnboundedSender<HealthEvent>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(self.config.probe_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let events = self.probe_round().await;
                        for event in events {
                            if events_tx.send(event).is_err() {
                                return;
                            }
                        }
                    }
                    () = self.stop_signal.notified() => {
                        tracing::info!("health detector stopped");
                        return;
                    }
                }
            }
        })
    }

    /// Runs one round: probes every broker concurrently, applies the
    /// state-machine transition per broker, and returns the events to
    /// emit for this round. The lock is held only while applying
    /// transitions, never across the outbound probes.
    async fn probe_round(&self) -> Vec<HealthEvent> {
        let probes = self.brokers.iter().map(|broker| {
            let client = self.client.clone();
            let url = broker.url.as_str().to_string();
            let timeout = self.config.probe_timeout;
            async move {
                let ok = probe_once(&client, &url, timeout).await;
                (broker.name.clone(), ok)
            }
        });

        let results = futures::future::join_all(probes).await;

        let mut events = Vec::new();
        let mut records = self.records.lock().unwrap();
        let now = queuemesh_types::now();

        for (name, ok) in results {
            let Some(record) = records.get_mut(&name) else {
                continue;
            };
            record.last_check = Some(now);

            if ok {
                record.last_success = Some(now);
                let was_down = matches!(record.status, HealthStatus::Failed | HealthStatus::FailedOver);
                record.fail_count = 0;
                if was_down {
                    record.status = HealthStatus::Recovered;
                    tracing::info!(broker = %name, "broker recovered");
                    events.push(HealthEvent::Recovery(name));
                }
            } else {
                record.fail_count += 1;
                if record.status == HealthStatus::Healthy
                    && record.fail_count >= self.config.failure_threshold
                {
                    record.status = HealthStatus::Failed;
                    record.failed_at = Some(now);
                    tracing::warn!(broker = %name, "broker declared failed");
                    events.push(HealthEvent::Failure(name));
                }
            }
        }

        events
    }
}

async fn probe_once(client: &reqwest::Client, url: &str, timeout: Duration) -> bool {
    let request = client.get(format!("{url}/health")).send();
    match tokio::time::timeout(timeout, request).await {
        Ok(Ok(response)) => response.status().is_success(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use queuemesh_types::{BrokerName, BrokerUrl};

    use super::*;

    fn broker(name: &str, url: &str) -> BrokerRecord {
        BrokerRecord {
            name: BrokerName::new(name),
            url: BrokerUrl::new(url),
        }
    }

    #[test]
    fn new_detector_starts_every_broker_healthy() {
        let detector = HealthDetector::new(
            vec![broker("node-a", "http://127.0.0.1:1"), broker("node-b", "http://127.0.0.1:2")],
            HealthDetectorConfig::default(),
        );

        let snapshot = detector.snapshot();
        assert_eq!(snapshot.len(), 2);
        for record in snapshot.values() {
            assert_eq!(record.status, HealthStatus::Healthy);
            assert_eq!(record.fail_count, 0);
        }
    }

    #[tokio::test]
    async fn unreachable_broker_accumulates_failures_below_threshold() {
        let detector = HealthDetector::new(
            vec![broker("node-a", "http://127.0.0.1:1")],
            HealthDetectorConfig {
                probe_interval: Duration::from_millis(10),
                failure_threshold: 3,
                probe_timeout: Duration::from_millis(50),
            },
        );

        detector.probe_round().await;
        let record = detector.snapshot()[&BrokerName::new("node-a")].clone();
        assert_eq!(record.status, HealthStatus::Healthy);
        assert_eq!(record.fail_count, 1);
    }

    #[tokio::test]
    async fn threshold_crossing_declares_failed_and_emits_event() {
        let detector = HealthDetector::new(
            vec![broker("node-a", "http://127.0.0.1:1")],
            HealthDetectorConfig {
                probe_interval: Duration::from_millis(10),
                failure_threshold: 2,
                probe_timeout: Duration::from_millis(50),
            },
        );

        let first = detector.probe_round().await;
        assert!(first.is_empty());
        let second = detector.probe_round().await;
        assert_eq!(second, vec![HealthEvent::Failure(BrokerName::new("node-a"))]);

        let record = detector.snapshot()[&BrokerName::new("node-a")].clone();
        assert_eq!(record.status, HealthStatus::Failed);
        assert!(record.failed_at.is_some());
    }

    #[tokio::test]
    async fn recovery_after_failure_resets_fail_count_and_emits_event() {
        let router = axum::Router::new().route("/health", axum::routing::get(|| async { "ok" }));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });

        let detector = HealthDetector::new(
            vec![broker("node-a", &format!("http://{addr}"))],
            HealthDetectorConfig {
                probe_interval: Duration::from_millis(10),
                failure_threshold: 1,
                probe_timeout: Duration::from_millis(50),
            },
        );

        // seed a FAILED state directly, as a prior round would have.
        {
            let mut records = detector.records.lock().unwrap();
            let record = records.get_mut(&BrokerName::new("node-a")).unwrap();
            record.status = HealthStatus::Failed;
            record.fail_count = 1;
        }

        let events = detector.probe_round().await;
        assert_eq!(events, vec![HealthEvent::Recovery(BrokerName::new("node-a"))]);

        let record = detector.snapshot()[&BrokerName::new("node-a")].clone();
        assert_eq!(record.status, HealthStatus::Recovered);
        assert_eq!(record.fail_count, 0);
    }

    #[test]
    fn mark_failed_over_only_applies_from_failed_state() {
        let detector = HealthDetector::new(vec![broker("node-a", "http://127.0.0.1:1")], HealthDetectorConfig::default());
        detector.mark_failed_over(&BrokerName::new("node-a"));
        assert_eq!(
            detector.snapshot()[&BrokerName::new("node-a")].status,
            HealthStatus::Healthy
        );
    }
}
