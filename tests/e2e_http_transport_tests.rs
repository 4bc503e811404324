//! End-to-end tests for the streamable HTTP transport.

mod common;

use common::client::TestClient;
use common::server::TestServer;
use serde_json::{json, Value};

#[tokio::test]
async fn test_health_endpoint() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get("/health").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_ready_endpoint_reports_auth_state() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.get("/ready").await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["auth"]["enabled"], false);
    assert!(body["tools"].as_u64().unwrap() > 0);
    let timestamp = body["timestamp"].as_str().expect("timestamp present");
    assert!(chrono::DateTime::parse_from_rfc3339(timestamp).is_ok());
}

#[tokio::test]
async fn test_wrong_verb_gets_protocol_envelope() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    for request in [
        client.client.get(format!("{}/mcp", server.base_url)),
        client.client.delete(format!("{}/mcp", server.base_url)),
    ] {
        let response = request.send().await.unwrap();
        assert_eq!(response.status(), 405);
        let body: Value = response.json().await.unwrap();
        assert_eq!(body["error"]["code"], -32000);
        assert_eq!(body["error"]["message"], "Method not allowed.");
    }
}

#[tokio::test]
async fn test_trailing_slash_is_equivalent() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = json!({"jsonrpc":"2.0","id":1,"method":"ping"}).to_string();
    let response = client
        .client
        .post(format!("{}/mcp/", server.base_url))
        .header("content-type", "application/json")
        .body(body)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client.post_mcp_raw("{not json").await;
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32700);
    assert_eq!(body["id"], Value::Null);
}

#[tokio::test]
async fn test_notification_is_accepted_without_body() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post_mcp_raw(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
        .await;
    assert_eq!(response.status(), 202);
    assert!(response.bytes().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_stateless_tool_call_without_initialize() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    // No initialize handshake on the stateless channel
    let body = client.call_tool("list_pods", json!({})).await;
    assert!(body["error"].is_null(), "unexpected error: {body}");
    let text = body["result"]["content"][0]["text"].as_str().unwrap();
    assert!(text.contains("NAME READY"));
}

#[tokio::test]
async fn test_initialize_reports_capabilities() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .rpc(
            "initialize",
            json!({
                "protocolVersion": "2024-11-05",
                "clientInfo": {"name": "e2e", "version": "0.0.0"}
            }),
        )
        .await;
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["result"]["protocolVersion"], "2024-11-05");
    assert!(body["result"]["capabilities"]["tools"].is_object());
    assert_eq!(body["result"]["serverInfo"]["name"], "kube-mcp-gateway");
}

#[tokio::test]
async fn test_unknown_tool_carries_requested_name() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let body = client.call_tool("frobnicate", json!({})).await;
    assert_eq!(body["error"]["code"], -32600);
    assert_eq!(body["error"]["message"], "Unknown tool: frobnicate");
}

#[tokio::test]
async fn test_failing_kubectl_surfaces_execution_error() {
    let server = TestServer::spawn_with(&[], false, "echo 'no such pod' >&2; exit 1").await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .rpc(
            "tools/call",
            json!({"name": "describe_pod", "arguments": {"name": "gone"}}),
        )
        .await;
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], -32603);
    let message = body["error"]["message"].as_str().unwrap();
    assert!(message.starts_with("Tool execution failed:"));
    assert!(message.contains("no such pod"));
}

#[tokio::test]
async fn test_string_request_id_is_preserved() {
    let server = TestServer::spawn().await;
    let client = TestClient::new(server.base_url.clone());

    let response = client
        .post_mcp_raw(r#"{"jsonrpc":"2.0","id":"req-abc","method":"ping"}"#)
        .await;
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["id"], "req-abc");
}
