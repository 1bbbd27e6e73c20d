//! MCP tool implementations.
//!
//! Each tool turns its parameters into a [`WorkerEvent`](crate::worker::WorkerEvent)
//! (or a storage query) and renders the worker's answer as pretty JSON text.

pub mod cache;
pub mod events;
pub mod fetch;
pub mod lifecycle;

use rmcp::{
    ErrorData as McpError,
    model::{CallToolResult, Content},
};
use schemars::JsonSchema;
use serde::Serialize;
use swcache_core::Response;

use crate::error::ToolError;

pub use cache::{CacheInspectParams, inspect_impl};
pub use events::{SwMessageParams, SwNotificationClickParams, SwPushParams, message_impl, notification_click_impl, push_impl};
pub use fetch::{SwFetchParams, fetch_impl};
pub use lifecycle::{activate_impl, install_impl};

pub(crate) fn json_result<T: Serialize>(output: &T) -> Result<CallToolResult, McpError> {
    let json = serde_json::to_string_pretty(output).map_err(|e| ToolError::Serialize(e.to_string()))?;
    Ok(CallToolResult::success(vec![Content::text(json)]))
}

/// A response as reported back to the tool caller.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct ResponseView {
    pub status: u16,
    pub status_text: String,
    pub url: Option<String>,
    pub content_type: Option<String>,
    pub headers: Vec<(String, String)>,
    /// Body decoded as UTF-8, lossily.
    pub body: String,
    pub body_bytes: usize,
}

impl From<&Response> for ResponseView {
    fn from(response: &Response) -> Self {
        Self {
            status: response.status,
            status_text: response.status_text.clone(),
            url: response.url.clone(),
            content_type: response.content_type().map(str::to_string),
            headers: response.headers.clone(),
            body: String::from_utf8_lossy(&response.body).into_owned(),
            body_bytes: response.body.len(),
        }
    }
}

#[cfg(test)]
pub(crate) fn result_json(result: &CallToolResult) -> serde_json::Value {
    let text = result.content[0].as_text().map(|t| t.text.clone()).unwrap_or_default();
    serde_json::from_str(&text).unwrap()
}
