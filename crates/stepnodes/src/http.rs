use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::OnceLock;
use stepcore::{JsonMap, NodeError, NodeHandler, NodeInput};

pub(crate) const NODE_TYPE: &str = "http.request";

/// HTTP request node
///
/// Config: `url` (required), `method` (default GET), `headers` (object of
/// strings), `body` (JSON). Without a configured body, an upstream input
/// named `body` is sent instead.
pub struct HttpRequestNode {
    client: &'static reqwest::Client,
}

/// Process-wide client so connections and TLS sessions are pooled across runs
fn shared_client() -> &'static reqwest::Client {
    static CLIENT: OnceLock<reqwest::Client> = OnceLock::new();
    CLIENT.get_or_init(reqwest::Client::new)
}

impl HttpRequestNode {
    pub fn new() -> Self {
        Self {
            client: shared_client(),
        }
    }
}

impl Default for HttpRequestNode {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl NodeHandler for HttpRequestNode {
    fn node_type(&self) -> &'static str {
        NODE_TYPE
    }

    async fn execute(&self, input: NodeInput<'_>) -> Result<Value, NodeError> {
        let url = input
            .require_config("url")?
            .as_str()
            .ok_or_else(|| NodeError::InvalidInputType {
                field: "url".to_string(),
                expected: "string".to_string(),
                actual: "other".to_string(),
            })?;
        let method = input.config_str("method").unwrap_or("GET").to_uppercase();

        tracing::debug!(node_id = %input.node.id, "{} {}", method, url);

        let body = input.config("body").or_else(|| input.inputs.get("body"));

        let request = match method.as_str() {
            "GET" => self.client.get(url),
            "DELETE" => self.client.delete(url),
            "POST" | "PUT" => {
                let req = if method == "POST" {
                    self.client.post(url)
                } else {
                    self.client.put(url)
                };
                match body {
                    Some(Value::String(text)) => req.body(text.clone()),
                    Some(json) => req.json(json),
                    None => req,
                }
            }
            _ => {
                return Err(NodeError::Configuration(format!(
                    "Unsupported method: {}",
                    method
                )))
            }
        };

        // Add headers if provided
        let request = match input.config("headers") {
            Some(Value::Object(headers)) => headers.iter().fold(request, |req, (key, value)| {
                match value.as_str() {
                    Some(val) => req.header(key.as_str(), val),
                    None => req,
                }
            }),
            _ => request,
        };

        let response = request
            .send()
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("HTTP request failed: {}", e)))?;

        let status = response.status().as_u16();
        let headers: JsonMap = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.to_string(),
                    Value::String(v.to_str().unwrap_or("").to_string()),
                )
            })
            .collect();

        let text = response
            .text()
            .await
            .map_err(|e| NodeError::ExecutionFailed(format!("Failed to read response: {}", e)))?;
        let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));

        tracing::debug!(node_id = %input.node.id, "Response status: {}", status);

        Ok(json!({
            "status": status,
            "body": body,
            "headers": headers,
        }))
    }
}
