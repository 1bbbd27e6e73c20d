//! Tool-level errors for the swcache host.
//!
//! Worker and storage failures arrive as `swcache_core::Error` and convert on
//! their own; these cover problems with the tool call itself.

use rmcp::model::{ErrorCode, ErrorData as McpError};

#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// A parameter could not be interpreted (e.g., a non-http URL).
    #[error("INVALID_PARAMS: {0}")]
    InvalidParams(String),

    /// The worker answered an event with an action the tool does not expect.
    #[error("UNEXPECTED_ACTION: {0}")]
    UnexpectedAction(String),

    /// Tool output could not be rendered as JSON.
    #[error("SERIALIZE_FAILED: {0}")]
    Serialize(String),
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        let (code, message) = match &err {
            ToolError::InvalidParams(msg) => (-32602, msg.clone()),
            ToolError::UnexpectedAction(msg) => (-32603, msg.clone()),
            ToolError::Serialize(msg) => (-32603, msg.clone()),
        };

        McpError { code: ErrorCode(code), message: message.into(), data: None }
    }
}

impl From<swcache_client::UrlError> for ToolError {
    fn from(err: swcache_client::UrlError) -> Self {
        ToolError::InvalidParams(err.to_string())
    }
}
