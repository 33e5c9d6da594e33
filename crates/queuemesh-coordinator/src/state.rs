use std::sync::Arc;
use std::time::Duration;

use queuemesh_config::CoordinatorConfig;
use queuemesh_failover::FailoverController;
use queuemesh_health::{HealthDetector, HealthDetectorConfig};
use queuemesh_ring::Ring;

/// Shared Coordinator state. The Ring is built once at startup and never
/// mutated afterward (spec.md §5: "Ring is immutable after initial
/// configuration"), so it needs no lock. The override map and failover
/// event log live inside [`FailoverController`], which guards them
/// internally; the health records live inside [`HealthDetector`] the same
/// way.
pub struct CoordinatorState {
    pub ring: Ring,
    pub config: CoordinatorConfig,
    pub health: Arc<HealthDetector>,
    pub failover: Arc<FailoverController>,
    pub client: reqwest::Client,
}

impl CoordinatorState {
    pub fn new(config: CoordinatorConfig) -> Arc<Self> {
        let mut ring = Ring::new(config.virtual_nodes);
        for broker in &config.broker_nodes {
            ring.add_node(broker.name.as_str(), broker.url.as_str());
        }

        let health = Arc::new(HealthDetector::new(
            config.broker_nodes.clone(),
            HealthDetectorConfig {
                probe_interval: config.probe_interval,
                failure_threshold: config.failure_threshold,
                probe_timeout: config.probe_timeout,
            },
        ));
        let failover = Arc::new(FailoverController::new(config.broker_nodes.clone(), config.probe_timeout));

        Arc::new(Self {
            ring,
            config,
            health,
            failover,
            client: reqwest::Client::new(),
        })
    }

    pub fn probe_timeout(&self) -> Duration {
        self.config.probe_timeout
    }
}
