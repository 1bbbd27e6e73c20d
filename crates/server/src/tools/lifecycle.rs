//! sw_install and sw_activate tools.

use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::Serialize;

use super::json_result;
use crate::error::ToolError;
use crate::worker::{ActivationReport, InstallReport, ServiceWorker, WorkerAction, WorkerEvent, WorkerStatus};

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwInstallOutput {
    pub report: InstallReport,
    pub status: WorkerStatus,
}

#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SwActivateOutput {
    pub report: ActivationReport,
    pub status: WorkerStatus,
}

/// Deliver the install event.
pub async fn install_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    match worker.handle(WorkerEvent::Install).await? {
        WorkerAction::Installed(report) => json_result(&SwInstallOutput { report, status: worker.status().await }),
        other => Err(ToolError::UnexpectedAction(format!("install answered with {other:?}")).into()),
    }
}

/// Deliver the activate event.
pub async fn activate_impl(worker: &ServiceWorker) -> Result<CallToolResult, McpError> {
    match worker.handle(WorkerEvent::Activate).await? {
        WorkerAction::Activated(report) => json_result(&SwActivateOutput { report, status: worker.status().await }),
        other => Err(ToolError::UnexpectedAction(format!("activate answered with {other:?}")).into()),
    }
}
