use queuemesh_broker::{build_router, BrokerState};
use serde_json::{json, Value};

async fn spawn_broker(node_id: &str) -> (std::net::SocketAddr, reqwest::Client) {
    let state = BrokerState::new(node_id.to_string());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = build_router(state);
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (addr, reqwest::Client::new())
}

#[tokio::test]
async fn store_then_fetch_round_trips_payload() {
    let (addr, client) = spawn_broker("node-a").await;

    let store_resp: Value = client
        .post(format!("http://{addr}/store"))
        .json(&json!({"key": "order_1", "payload": {"event": "order_placed"}, "replicateTo": []}))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(store_resp["success"], json!(true));
    assert_eq!(store_resp["role"], json!("primary"));

    let fetch_resp: Value = client.get(format!("http://{addr}/fetch/order_1")).send().await.unwrap().json().await.unwrap();
    assert_eq!(fetch_resp["payload"], json!({"event": "order_placed"}));
    assert_eq!(fetch_resp["role"], json!("primary"));
}

#[tokio::test]
async fn fetch_missing_key_is_404() {
    let (addr, client) = spawn_broker("node-a").await;
    let response = client.get(format!("http://{addr}/fetch/missing_42")).send().await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["key"], json!("missing_42"));
}

#[tokio::test]
async fn store_missing_payload_is_400() {
    let (addr, client) = spawn_broker("node-a").await;
    let response = client
        .post(format!("http://{addr}/store"))
        .json(&json!({"key": "order_1"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn store_fans_out_replication_and_reports_degraded_result() {
    let (primary_addr, client) = spawn_broker("node-a").await;
    let (replica_addr, _) = spawn_broker("node-b").await;
    let dead_replica_url = "http://127.0.0.1:1";

    let store_resp: Value = client
        .post(format!("http://{primary_addr}/store"))
        .json(&json!({
            "key": "order_1",
            "payload": {"event": "order_placed"},
            "replicateTo": [format!("http://{replica_addr}"), dead_replica_url],
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    let results = store_resp["replicationResults"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    assert!(results.iter().any(|r| r["status"] == json!("success")));
    assert!(results.iter().any(|r| r["status"] == json!("failed")));

    let replica_fetch: Value = client
        .get(format!("http://{replica_addr}/fetch/order_1"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(replica_fetch["role"], json!("replica"));
    assert_eq!(replica_fetch["replicaOf"], json!("node-a"));
}

#[tokio::test]
async fn promote_appends_audit_entry_without_clearing_store() {
    let (addr, client) = spawn_broker("node-b").await;
    client
        .post(format!("http://{addr}/replicate"))
        .json(&json!({"key": "order_1", "payload": {"event": "order_placed"}, "primaryNode": "node-a"}))
        .send()
        .await
        .unwrap();

    let promote_resp: Value = client.post(format!("http://{addr}/promote")).send().await.unwrap().json().await.unwrap();
    assert_eq!(promote_resp["success"], json!(true));

    let fetch_resp = client.get(format!("http://{addr}/fetch/order_1")).send().await.unwrap();
    assert_eq!(fetch_resp.status(), reqwest::StatusCode::OK);
}

#[tokio::test]
async fn health_reports_message_count() {
    let (addr, client) = spawn_broker("node-a").await;
    client
        .post(format!("http://{addr}/store"))
        .json(&json!({"key": "a", "payload": 1, "replicateTo": []}))
        .send()
        .await
        .unwrap();

    let health: Value = client.get(format!("http://{addr}/health")).send().await.unwrap().json().await.unwrap();
    assert_eq!(health["status"], json!("healthy"));
    assert_eq!(health["messageCount"], json!(1));
}
