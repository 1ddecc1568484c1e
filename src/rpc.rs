//! JSON-RPC 2.0 over HTTP, the built-in [`RemoteClient`].
//!
//! Each target is addressed as a path under one endpoint, so
//! `call("github", "count_prs", {...})` posts to `{endpoint}/github`.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SourceError;
use crate::source::RemoteClient;

#[derive(Debug, Serialize)]
struct Request<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
struct Response {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcError>,
}

#[derive(Debug, Deserialize)]
struct RpcError {
    message: String,
}

pub struct JsonRpcClient {
    endpoint: String,
    http: reqwest::Client,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(endpoint: impl Into<String>, http: reqwest::Client) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            http,
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl RemoteClient for JsonRpcClient {
    async fn call(&self, target: &str, method: &str, params: Map<String, Value>) -> Result<Value, SourceError> {
        let request = Request {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        let response = self
            .http
            .post(format!("{}/{}", self.endpoint, target))
            .json(&request)
            .send()
            .await?
            .error_for_status()?
            .json::<Response>()
            .await?;

        match (response.result, response.error) {
            (_, Some(err)) => Err(SourceError::Remote(err.message)),
            (Some(result), None) => Ok(result),
            (None, None) => Err(SourceError::Payload("response has neither result nor error".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    #[tokio::test]
    async fn posts_request_and_returns_result() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/github")
            .match_body(Matcher::PartialJson(json!({
                "jsonrpc": "2.0",
                "method": "count_prs",
                "params": { "repo": "x/y" },
            })))
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"result":{"value":4}}"#)
            .create_async()
            .await;

        let client = JsonRpcClient::new(format!("{}/", server.url()), reqwest::Client::new());
        let mut params = Map::new();
        params.insert("repo".into(), json!("x/y"));
        let result = client.call("github", "count_prs", params).await.unwrap();

        assert_eq!(result, json!({ "value": 4 }));
    }

    #[tokio::test]
    async fn rpc_error_is_surfaced() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("POST", "/svc")
            .with_status(200)
            .with_body(r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#)
            .create_async()
            .await;

        let client = JsonRpcClient::new(server.url(), reqwest::Client::new());
        let err = client.call("svc", "nope", Map::new()).await.unwrap_err();
        assert_eq!(err.to_string(), "Method not found");
    }
}
