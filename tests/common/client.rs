//! HTTP client for end-to-end tests.

use std::time::Duration;

use reqwest::Response;
use serde_json::{json, Value};

pub struct TestClient {
    pub client: reqwest::Client,
    pub base_url: String,
    bearer: Option<String>,
}

impl TestClient {
    pub fn new(base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .expect("Failed to build reqwest client");
        Self {
            client,
            base_url,
            bearer: None,
        }
    }

    pub fn with_token(base_url: String, token: &str) -> Self {
        let mut client = Self::new(base_url);
        client.bearer = Some(token.to_string());
        client
    }

    pub async fn get(&self, path: &str) -> Response {
        self.client
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await
            .expect("GET failed")
    }

    /// POST a raw body to the protocol endpoint.
    pub async fn post_mcp_raw(&self, body: &str) -> Response {
        let mut request = self
            .client
            .post(format!("{}/mcp", self.base_url))
            .header("content-type", "application/json")
            .body(body.to_string());
        if let Some(token) = &self.bearer {
            request = request.bearer_auth(token);
        }
        request.send().await.expect("POST failed")
    }

    pub async fn rpc(&self, method: &str, params: Value) -> Response {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params
        });
        self.post_mcp_raw(&body.to_string()).await
    }

    pub async fn call_tool(&self, name: &str, arguments: Value) -> Value {
        let response = self
            .rpc("tools/call", json!({"name": name, "arguments": arguments}))
            .await;
        response.json().await.expect("invalid JSON response")
    }

    pub async fn list_tool_names(&self) -> Vec<String> {
        let response = self.rpc("tools/list", json!({})).await;
        let body: Value = response.json().await.expect("invalid JSON response");
        body["result"]["tools"]
            .as_array()
            .expect("tools array")
            .iter()
            .map(|t| t["name"].as_str().expect("tool name").to_string())
            .collect()
    }
}
