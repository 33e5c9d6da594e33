#![cfg(test)]

use crate::{Ring, RingError};

fn three_node_ring() -> Ring {
    let mut ring = Ring::new(150);
    ring.add_node("node-a", "http://node-a:5000");
    ring.add_node("node-b", "http://node-b:5000");
    ring.add_node("node-c", "http://node-c:5000");
    ring
}

#[test]
fn empty_ring_lookup_is_an_error() {
    let ring = Ring::new(150);
    assert_eq!(ring.get_nodes_for_key("any", 3), Err(RingError::EmptyRing));
}

#[test]
fn placement_returns_distinct_brokers_up_to_r() {
    let ring = three_node_ring();
    let placement = ring.get_nodes_for_key("order_1", 3).unwrap();

    let mut all = vec![placement.primary.clone()];
    all.extend(placement.replicas.clone());
    let mut deduped = all.clone();
    deduped.sort();
    deduped.dedup();

    assert_eq!(all.len(), deduped.len(), "placement must not repeat a broker");
    assert!(all.len() <= 3);
}

#[test]
fn r_greater_than_broker_count_saturates_at_total_nodes() {
    let ring = three_node_ring();
    let placement = ring.get_nodes_for_key("order_1", 10).unwrap();
    assert_eq!(placement.replicas.len() + 1, 3);
}

#[test]
fn single_broker_ring_returns_only_primary() {
    let mut ring = Ring::new(150);
    ring.add_node("solo", "http://solo:5000");
    let placement = ring.get_nodes_for_key("k", 3).unwrap();
    assert_eq!(placement.primary, "solo");
    assert!(placement.replicas.is_empty());
}

#[test]
fn lookup_is_deterministic_across_calls() {
    let ring = three_node_ring();
    let first = ring.get_nodes_for_key("order_1", 2).unwrap();
    let second = ring.get_nodes_for_key("order_1", 2).unwrap();
    assert_eq!(first, second);
}

#[test]
fn remove_then_readd_same_broker_reproduces_its_positions() {
    let mut ring = three_node_ring();
    let before = ring.get_nodes_for_key("order_1", 3).unwrap();

    ring.remove_node("node-b");
    ring.add_node("node-b", "http://node-b:5000");

    let after = ring.get_nodes_for_key("order_1", 3).unwrap();
    assert_eq!(before, after);
}

#[test]
fn remove_node_drops_its_coverage_and_url() {
    let mut ring = three_node_ring();
    ring.remove_node("node-b");

    assert_eq!(ring.total_nodes(), 2);
    assert!(ring.get_node_url("node-b").is_none());
    assert!(!ring.get_all_node_names().contains(&"node-b".to_string()));
}

#[test]
fn virtual_node_count_matches_broker_count_times_v() {
    let ring = three_node_ring();
    assert_eq!(ring.total_virtual_nodes(), 3 * 150);
}

#[test]
fn coverage_share_is_roughly_even_across_equal_brokers() {
    let ring = three_node_ring();
    let coverage = ring.coverage();

    assert_eq!(coverage.len(), 3);
    for node in coverage.values() {
        // 150 labels per broker, collisions are rare enough that every
        // broker should retain the large majority of its labels.
        assert!(node.virtual_node_count > 100, "coverage collapsed under collisions");
    }
}

#[test]
fn hash_label_is_pure_and_deterministic() {
    assert_eq!(Ring::hash_label("order_1"), Ring::hash_label("order_1"));
    assert_ne!(Ring::hash_label("order_1"), Ring::hash_label("order_2"));
}

#[cfg(test)]
mod proptests {
    use proptest::prelude::*;

    use crate::Ring;

    proptest! {
        #[test]
        fn lookup_never_exceeds_broker_count(key in "[a-z0-9_]{1,16}", r in 1usize..10) {
            let mut ring = Ring::new(20);
            ring.add_node("node-a", "http://node-a:5000");
            ring.add_node("node-b", "http://node-b:5000");
            ring.add_node("node-c", "http://node-c:5000");

            let placement = ring.get_nodes_for_key(&key, r).unwrap();
            prop_assert!(placement.replicas.len() + 1 <= 3);
            prop_assert!(placement.replicas.len() + 1 <= r);
        }

        #[test]
        fn lookup_is_deterministic_for_arbitrary_keys(key in "[a-z0-9_]{1,16}") {
            let mut ring = Ring::new(20);
            ring.add_node("node-a", "http://node-a:5000");
            ring.add_node("node-b", "http://node-b:5000");

            let first = ring.get_nodes_for_key(&key, 2).unwrap();
            let second = ring.get_nodes_for_key(&key, 2).unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
