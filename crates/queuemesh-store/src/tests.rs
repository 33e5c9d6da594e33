#![cfg(test)]

use queuemesh_types::Role;
use serde_json::json;

use crate::BrokerStore;

#[test]
fn store_primary_is_readable_with_primary_role() {
    let store = BrokerStore::new();
    store.store_primary("order_1".into(), json!({"event": "order_placed"}));

    let entry = store.fetch("order_1").unwrap();
    assert_eq!(entry.role, Role::Primary);
    assert!(entry.replica_of.is_none());
    assert_eq!(entry.payload, json!({"event": "order_placed"}));
}

#[test]
fn replicate_is_readable_with_replica_role_and_origin() {
    let store = BrokerStore::new();
    store.replicate("order_1".into(), json!({"event": "order_placed"}), "node-a".into());

    let entry = store.fetch("order_1").unwrap();
    assert_eq!(entry.role, Role::Replica);
    assert_eq!(entry.replica_of.as_deref(), Some("node-a"));
}

#[test]
fn fetch_missing_key_returns_none() {
    let store = BrokerStore::new();
    assert!(store.fetch("missing_42").is_none());
}

#[test]
fn last_writer_wins_on_same_key() {
    let store = BrokerStore::new();
    store.store_primary("k".into(), json!(1));
    store.store_primary("k".into(), json!(2));

    assert_eq!(store.fetch("k").unwrap().payload, json!(2));
    assert_eq!(store.message_count(), 1);
}

#[test]
fn every_write_appends_a_classified_audit_entry() {
    let store = BrokerStore::new();
    store.store_primary("a".into(), json!(1));
    store.replicate("b".into(), json!(2), "node-a".into());
    store.promote();

    assert_eq!(store.stored_as_primary().len(), 1);
    assert_eq!(store.stored_as_replica().len(), 1);
}

#[test]
fn promote_does_not_erase_existing_entries() {
    let store = BrokerStore::new();
    store.replicate("a".into(), json!(1), "node-a".into());
    store.promote();

    assert!(store.fetch("a").is_some());
}

#[test]
fn message_count_reflects_distinct_keys_only() {
    let store = BrokerStore::new();
    store.store_primary("a".into(), json!(1));
    store.store_primary("a".into(), json!(2));
    store.store_primary("b".into(), json!(3));

    assert_eq!(store.message_count(), 2);
}
