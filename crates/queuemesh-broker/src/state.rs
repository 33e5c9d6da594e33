use std::sync::Arc;

use queuemesh_store::BrokerStore;

/// Shared Broker state: node identity plus the in-memory store.
pub struct BrokerState {
    pub node_id: String,
    pub store: BrokerStore,
    pub client: reqwest::Client,
}

impl BrokerState {
    pub fn new(node_id: String) -> Arc<Self> {
        Arc::new(Self {
            node_id,
            store: BrokerStore::new(),
            client: reqwest::Client::new(),
        })
    }
}
