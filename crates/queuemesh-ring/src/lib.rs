//! # queuemesh-ring: Placement routing for `QueueMesh`
//!
//! The ring determines which brokers own a given key via consistent hashing
//! with virtual nodes. It is a pure data structure: no I/O, no locking
//! beyond what the caller supplies.
//!
//! # Example
//!
//! ```
//! use queuemesh_ring::Ring;
//!
//! let mut ring = Ring::new(150);
//! ring.add_node("node-a", "http://node-a:5000");
//! ring.add_node("node-b", "http://node-b:5000");
//! ring.add_node("node-c", "http://node-c:5000");
//!
//! let placement = ring.get_nodes_for_key("order_1", 3).unwrap();
//! assert_eq!(placement.replicas.len(), 2);
//! ```

use std::collections::HashMap;

use sha2::{Digest, Sha256};

mod tests;

/// The size of the ring's hash space: positions fall in `[0, 2^32)`.
pub const HASH_SPACE: u64 = 1 << 32;

/// Errors returned by ring operations.
#[derive(thiserror::Error, Debug, PartialEq, Eq)]
pub enum RingError {
    /// `getNodesForKey` (or any lookup) was attempted on a ring with no
    /// registered brokers. Per spec.md §4.1 this is a fatal programmer
    /// error, surfaced to the caller rather than silently returning an
    /// empty placement.
    #[error("ring is empty: no brokers registered")]
    EmptyRing,
}

/// One virtual node: a position on the ring plus the broker that owns it.
#[derive(Debug, Clone, PartialEq, Eq)]
struct VirtualNode {
    position: u32,
    broker: String,
}

/// Placement result for a key: the raw primary, the raw replicas (in ring
/// order, primary excluded), and the key's hash position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placement {
    pub primary: String,
    pub replicas: Vec<String>,
    pub key_hash: u32,
}

/// Per-broker ring coverage, for the `/ring` introspection endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeCoverage {
    pub url: String,
    pub virtual_node_count: usize,
}

/// Consistent-hash ring with virtual nodes.
///
/// Positions are kept in a single sorted `Vec`, looked up by binary search
/// and walked forward with modular increment (spec.md §9: "avoid linked
/// structures; an indexed array is simpler and cache-friendly").
pub struct Ring {
    virtual_nodes_per_broker: u32,
    /// Sorted by `position`, strictly increasing (spec.md §3 invariant).
    positions: Vec<VirtualNode>,
    broker_urls: HashMap<String, String>,
}

impl Ring {
    /// Creates an empty ring with `virtual_nodes_per_broker` virtual nodes
    /// assigned to each broker added later (default 150 per spec.md §3).
    pub fn new(virtual_nodes_per_broker: u32) -> Self {
        Self {
            virtual_nodes_per_broker,
            positions: Vec::new(),
            broker_urls: HashMap::new(),
        }
    }

    /// Hashes a label to a ring position: the first 4 bytes of its SHA-256
    /// digest, big-endian, reduced mod 2^32. Used for both keys and
    /// virtual-node labels so they share the same space (spec.md §4.1).
    pub fn hash_label(label: &str) -> u32 {
        let digest = Sha256::digest(label.as_bytes());
        let bytes: [u8; 4] = [digest[0], digest[1], digest[2], digest[3]];
        u32::from_be_bytes(bytes)
    }

    /// Inserts `virtual_nodes_per_broker` virtual positions for `name`.
    /// Collisions on position are resolved by linear probing (+1 mod 2^32)
    /// until a free position is found.
    pub fn add_node(&mut self, name: impl Into<String>, url: impl Into<String>) {
        let name = name.into();
        let url = url.into();

        for i in 0..self.virtual_nodes_per_broker {
            let label = format!("{name}:vnode{i}");
            let mut position = Self::hash_label(&label);

            while self.position_occupied(position) {
                position = position.wrapping_add(1);
            }

            let insert_at = self
                .positions
                .binary_search_by_key(&position, |vn| vn.position)
                .unwrap_or_else(|idx| idx);
            self.positions.insert(
                insert_at,
                VirtualNode {
                    position,
                    broker: name.clone(),
                },
            );
        }

        self.broker_urls.insert(name, url);
    }

    fn position_occupied(&self, position: u32) -> bool {
        self.positions
            .binary_search_by_key(&position, |vn| vn.position)
            .is_ok()
    }

    /// Removes every virtual position owned by `name`.
    pub fn remove_node(&mut self, name: &str) {
        self.positions.retain(|vn| vn.broker != name);
        self.broker_urls.remove(name);
    }

    /// Returns `(primary, replicas, key_hash)` for `key`: the up-to-`r`
    /// distinct brokers found walking clockwise from `hash(key)`.
    ///
    /// Binary-searches for the smallest position >= the key's hash
    /// (wrapping to index 0 if the hash exceeds the ring's maximum
    /// position), then walks forward collecting distinct broker names
    /// until `r` are gathered or every broker has been seen.
    pub fn get_nodes_for_key(&self, key: &str, r: usize) -> Result<Placement, RingError> {
        if self.positions.is_empty() {
            return Err(RingError::EmptyRing);
        }

        let key_hash = Self::hash_label(key);
        let start = self
            .positions
            .binary_search_by_key(&key_hash, |vn| vn.position)
            .unwrap_or_else(|idx| idx)
            % self.positions.len();

        let mut owners: Vec<String> = Vec::new();
        let total_positions = self.positions.len();

        for step in 0..total_positions {
            let idx = (start + step) % total_positions;
            let broker = &self.positions[idx].broker;
            if !owners.contains(broker) {
                owners.push(broker.clone());
            }
            if owners.len() >= r {
                break;
            }
        }

        let primary = owners.remove(0);
        Ok(Placement {
            primary,
            replicas: owners,
            key_hash,
        })
    }

    /// Returns the registered URL for `name`, if any.
    pub fn get_node_url(&self, name: &str) -> Option<&str> {
        self.broker_urls.get(name).map(String::as_str)
    }

    /// Returns all registered broker names, in registration order.
    pub fn get_all_node_names(&self) -> Vec<String> {
        let mut seen = Vec::new();
        for name in self.broker_urls.keys() {
            seen.push(name.clone());
        }
        seen.sort();
        seen
    }

    /// Total number of physical brokers registered.
    pub fn total_nodes(&self) -> usize {
        self.broker_urls.len()
    }

    /// Total number of virtual positions on the ring across all brokers.
    pub fn total_virtual_nodes(&self) -> usize {
        self.positions.len()
    }

    /// Per-broker coverage snapshot for the `/ring` introspection endpoint:
    /// URL and virtual-node count.
    pub fn coverage(&self) -> HashMap<String, NodeCoverage> {
        let mut counts: HashMap<String, usize> = HashMap::new();
        for vn in &self.positions {
            *counts.entry(vn.broker.clone()).or_insert(0) += 1;
        }

        self.broker_urls
            .iter()
            .map(|(name, url)| {
                (
                    name.clone(),
                    NodeCoverage {
                        url: url.clone(),
                        virtual_node_count: counts.get(name).copied().unwrap_or(0),
                    },
                )
            })
            .collect()
    }
}
