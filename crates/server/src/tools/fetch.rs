//! sw_fetch tool implementation.
//!
//! Delivers a fetch event for a URL as if a controlled page had requested it.
//! Requests the worker passes through are fetched straight from the network,
//! the way the platform would.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_client::canonicalize;
use swcache_core::{Destination, Request};

use super::{ResponseView, json_result};
use crate::error::ToolError;
use crate::worker::{FetchOutcome, PassthroughReason, ResourceClass, ServiceWorker, WorkerAction, WorkerEvent};

/// Input parameters for sw_fetch.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwFetchParams {
    /// Absolute URL, or a path resolved against the worker's origin.
    pub url: String,

    /// HTTP method (default: GET).
    #[serde(default)]
    pub method: Option<String>,

    /// Request destination: document, image, style, script, font or empty.
    #[serde(default)]
    pub destination: Option<String>,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwFetchOutput {
    pub url: String,
    /// Whether the worker answered the request.
    pub intercepted: bool,
    /// Resource class, when intercepted.
    pub class: Option<ResourceClass>,
    /// Why the worker did not intercept.
    pub passthrough: Option<PassthroughReason>,
    pub response: ResponseView,
}

fn build_request(worker: &ServiceWorker, params: &SwFetchParams) -> Result<Request, McpError> {
    let url = canonicalize(&params.url, worker.origin()).map_err(ToolError::from)?;

    let mut request = Request::get(url);
    if let Some(method) = params.method.as_deref().filter(|m| !m.trim().is_empty()) {
        request = request.with_method(method.trim());
    }
    if let Some(destination) = &params.destination {
        request = request.with_destination(destination.parse::<Destination>()?);
    }
    Ok(request)
}

/// Implementation of the sw_fetch tool.
pub async fn fetch_impl(worker: &ServiceWorker, params: SwFetchParams) -> Result<CallToolResult, McpError> {
    let request = build_request(worker, &params)?;
    let url = request.url.to_string();

    let outcome = match worker.handle(WorkerEvent::Fetch(request.clone())).await? {
        WorkerAction::Fetch(outcome) => outcome,
        other => return Err(ToolError::UnexpectedAction(format!("fetch answered with {other:?}")).into()),
    };

    let output = match outcome {
        FetchOutcome::Respond { class, response } => SwFetchOutput {
            url,
            intercepted: true,
            class: Some(class),
            passthrough: None,
            response: ResponseView::from(&response),
        },
        FetchOutcome::Passthrough(reason) => {
            let response = worker.network().fetch(&request).await?;
            SwFetchOutput {
                url,
                intercepted: false,
                class: None,
                passthrough: Some(reason),
                response: ResponseView::from(&response),
            }
        }
    };

    json_result(&output)
}
