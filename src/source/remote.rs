//! Generic remote-call source.
//!
//! The dashboard never talks to a remote service directly here: it calls
//! through an injected [`RemoteClient`].  Running without a client is a
//! valid setup; affected tiles simply report that none is configured.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{DataPoint, DataSource};
use crate::config::SourceDescriptor;
use crate::error::SourceError;

/// Capability to invoke `method` on a named remote `target`.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    async fn call(&self, target: &str, method: &str, params: Map<String, Value>) -> Result<Value, SourceError>;
}

pub struct McpSource {
    desc: SourceDescriptor,
    client: Option<Arc<dyn RemoteClient>>,
}

impl McpSource {
    pub fn new(desc: SourceDescriptor, client: Option<Arc<dyn RemoteClient>>) -> Self {
        Self { desc, client }
    }
}

#[async_trait]
impl DataSource for McpSource {
    fn name(&self) -> &str {
        &self.desc.name
    }

    fn refresh_interval(&self) -> Duration {
        self.desc.refresh_interval()
    }

    async fn fetch(&mut self) -> Result<DataPoint, SourceError> {
        let Some(client) = &self.client else {
            return Err(SourceError::config_with_detail(
                "MCP client not configured",
                "Provide an MCP client instance at runtime.",
            ));
        };

        let options = &self.desc.options;
        let (Some(server), Some(method)) = (options.str("server"), options.str("method")) else {
            return Err(SourceError::config("Missing MCP configuration"));
        };
        let params = options.object("params").cloned().unwrap_or_default();

        let result = client.call(&server, &method, params).await?;
        Ok(DataPoint::ok(self.name(), render_result(&result)))
    }
}

/// A `{"value": ...}` object renders its value; anything else renders whole.
pub fn render_result(result: &Value) -> String {
    let shown = match result.get("value") {
        Some(value) if result.is_object() => value,
        _ => result,
    };
    match shown {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::Status;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records calls and replies with a canned result.
    struct StubClient {
        reply: Result<Value, String>,
        calls: Mutex<Vec<(String, String, Map<String, Value>)>>,
    }

    impl StubClient {
        fn new(reply: Result<Value, String>) -> Arc<Self> {
            Arc::new(Self { reply, calls: Mutex::new(Vec::new()) })
        }
    }

    #[async_trait]
    impl RemoteClient for StubClient {
        async fn call(&self, target: &str, method: &str, params: Map<String, Value>) -> Result<Value, SourceError> {
            self.calls
                .lock()
                .unwrap()
                .push((target.to_string(), method.to_string(), params));
            self.reply.clone().map_err(SourceError::Remote)
        }
    }

    fn desc(options: Value) -> SourceDescriptor {
        SourceDescriptor::for_test("Remote", "mcp", options)
    }

    #[tokio::test]
    async fn absent_client_is_config_error() {
        let point = McpSource::new(desc(json!({ "server": "s", "method": "m" })), None)
            .produce()
            .await;
        assert_eq!(point.status, Status::Error);
        assert_eq!(point.value, "MCP client not configured");
        assert_eq!(point.detail, "Provide an MCP client instance at runtime.");
    }

    #[tokio::test]
    async fn missing_target_is_config_error_without_calling() {
        let stub = StubClient::new(Ok(json!(1)));
        let point = McpSource::new(desc(json!({ "method": "m" })), Some(stub.clone()))
            .produce()
            .await;
        assert_eq!(point.value, "Missing MCP configuration");
        assert!(stub.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn forwards_params_and_renders_value_field() {
        let stub = StubClient::new(Ok(json!({ "value": "12 open PRs", "extra": true })));
        let point = McpSource::new(
            desc(json!({ "server": "github", "method": "count", "params": { "repo": "x/y" } })),
            Some(stub.clone()),
        )
        .produce()
        .await;

        assert_eq!(point.status, Status::Ok);
        assert_eq!(point.value, "12 open PRs");
        let calls = stub.calls.lock().unwrap();
        assert_eq!(calls[0].0, "github");
        assert_eq!(calls[0].1, "count");
        assert_eq!(calls[0].2.get("repo"), Some(&json!("x/y")));
    }

    #[tokio::test]
    async fn client_failure_is_error_result() {
        let stub = StubClient::new(Err("connection refused".into()));
        let point = McpSource::new(desc(json!({ "server": "s", "method": "m" })), Some(stub))
            .produce()
            .await;
        assert_eq!(point.status, Status::Error);
        assert_eq!(point.value, "connection refused");
    }

    #[test]
    fn render_result_shapes() {
        assert_eq!(render_result(&json!({ "value": 3 })), "3");
        assert_eq!(render_result(&json!({ "count": 3 })), r#"{"count":3}"#);
        assert_eq!(render_result(&json!("plain")), "plain");
        assert_eq!(render_result(&json!([1, 2])), "[1,2]");
    }
}
