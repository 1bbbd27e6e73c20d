//! MCP server handler implementation.
//!
//! Routes tool calls to the tool implementations, all of which share one
//! [`ServiceWorker`].
use crate::tools::{
    CacheInspectParams, SwFetchParams, SwMessageParams, SwNotificationClickParams, SwPushParams, activate_impl,
    fetch_impl, inspect_impl, install_impl, message_impl, notification_click_impl, push_impl,
};
use crate::worker::ServiceWorker;

use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::{
        tool::{ToolCallContext, ToolRouter},
        wrapper::Parameters,
    },
    model::{
        CallToolRequestParam, CallToolResult, Implementation, ListToolsResult, PaginatedRequestParam, ProtocolVersion,
        ServerCapabilities, ServerInfo,
    },
    service::{RequestContext, RoleServer},
    tool, tool_router,
};

/// The MCP server handler for swcache.
#[derive(Clone)]
pub struct SwCacheServer {
    tool_router: ToolRouter<Self>,
    worker: ServiceWorker,
}

#[tool_router]
impl SwCacheServer {
    pub fn new(worker: ServiceWorker) -> Self {
        Self { tool_router: Self::tool_router(), worker }
    }

    #[tool(description = "Deliver the install event: pre-cache the static manifest. All-or-nothing.")]
    async fn sw_install(&self) -> Result<CallToolResult, McpError> {
        install_impl(&self.worker).await
    }

    #[tool(description = "Deliver the activate event: delete old cache generations and claim clients.")]
    async fn sw_activate(&self) -> Result<CallToolResult, McpError> {
        activate_impl(&self.worker).await
    }

    /// Intercept a request the way a controlled page's fetch would be.
    #[tool(
        description = "Deliver a fetch event. Relative URLs resolve against the worker origin. Returns the response and whether the worker intercepted it."
    )]
    async fn sw_fetch(&self, params: Parameters<SwFetchParams>) -> Result<CallToolResult, McpError> {
        fetch_impl(&self.worker, params.0).await
    }

    #[tool(description = "Post a message to the worker. {\"type\": \"CLEAN_CACHE\"} prunes the dynamic and image caches.")]
    async fn sw_message(&self, params: Parameters<SwMessageParams>) -> Result<CallToolResult, McpError> {
        message_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a push event with an optional JSON payload {title, body}.")]
    async fn sw_push(&self, params: Parameters<SwPushParams>) -> Result<CallToolResult, McpError> {
        push_impl(&self.worker, params.0).await
    }

    #[tool(description = "Deliver a notification click with an optional action (view, dismiss).")]
    async fn sw_notification_click(
        &self, params: Parameters<SwNotificationClickParams>,
    ) -> Result<CallToolResult, McpError> {
        notification_click_impl(&self.worker, params.0).await
    }

    #[tool(description = "List cache partitions, or the entries of one partition oldest first.")]
    async fn cache_inspect(&self, params: Parameters<CacheInspectParams>) -> Result<CallToolResult, McpError> {
        inspect_impl(self.worker.storage().as_ref(), params.0).await
    }
}

impl ServerHandler for SwCacheServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            server_info: Implementation {
                name: "swcache".into(),
                version: env!("CARGO_PKG_VERSION").into(),
                ..Default::default()
            },
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            instructions: Some(format!("Service worker cache host for {}", self.worker.origin())),
            ..Default::default()
        }
    }

    async fn list_tools(
        &self, _request: Option<PaginatedRequestParam>, _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, rmcp::model::ErrorData> {
        Ok(ListToolsResult { meta: None, tools: self.tool_router.list_all(), next_cursor: None })
    }

    async fn call_tool(
        &self, request: CallToolRequestParam, context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, rmcp::model::ErrorData> {
        self.tool_router
            .call(ToolCallContext::new(self, request, context))
            .await
    }
}
