//! sw_message, sw_push and sw_notification_click tools.

use bytes::Bytes;
use rmcp::{ErrorData as McpError, model::CallToolResult};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::json_result;
use crate::worker::{EvictionReport, Notification, ServiceWorker, WorkerAction, WorkerEvent};

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwMessageParams {
    /// Message data, e.g. `{"type": "CLEAN_CACHE"}`.
    pub data: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwPushParams {
    /// Raw push payload. Omit for a push without data.
    #[serde(default)]
    pub data: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct SwNotificationClickParams {
    /// Action button that was clicked; omit for a click on the body.
    #[serde(default)]
    pub action: Option<String>,
}

/// What the host was asked to do.
#[derive(Debug, Clone, Serialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EventOutput {
    Cleaned { report: EvictionReport, removed: usize },
    ShowNotification { notification: Notification },
    OpenWindow { path: String },
    None,
}

impl EventOutput {
    fn from_action(action: WorkerAction) -> Self {
        match action {
            WorkerAction::Cleaned(report) => {
                let removed = report.total_removed();
                EventOutput::Cleaned { report, removed }
            }
            WorkerAction::ShowNotification(notification) => EventOutput::ShowNotification { notification },
            WorkerAction::OpenWindow(path) => EventOutput::OpenWindow { path },
            _ => EventOutput::None,
        }
    }
}

async fn deliver(worker: &ServiceWorker, event: WorkerEvent) -> Result<CallToolResult, McpError> {
    let action = worker.handle(event).await?;
    json_result(&EventOutput::from_action(action))
}

pub async fn message_impl(worker: &ServiceWorker, params: SwMessageParams) -> Result<CallToolResult, McpError> {
    deliver(worker, WorkerEvent::Message(params.data)).await
}

pub async fn push_impl(worker: &ServiceWorker, params: SwPushParams) -> Result<CallToolResult, McpError> {
    deliver(worker, WorkerEvent::Push(params.data.map(Bytes::from))).await
}

pub async fn notification_click_impl(
    worker: &ServiceWorker, params: SwNotificationClickParams,
) -> Result<CallToolResult, McpError> {
    deliver(worker, WorkerEvent::NotificationClick { action: params.action }).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::result_json;
    use crate::worker::testing::site_worker;
    use serde_json::json;

    #[tokio::test]
    async fn test_clean_cache_message() {
        let (worker, _, _) = site_worker();
        let output = result_json(
            &message_impl(&worker, SwMessageParams { data: json!({ "type": "CLEAN_CACHE" }) })
                .await
                .unwrap(),
        );
        assert_eq!(output["action"], "cleaned");
        assert_eq!(output["removed"], 0);
        assert_eq!(output["report"]["partitions"][0]["partition"], "dynamic-v1");
    }

    #[tokio::test]
    async fn test_other_message_is_none() {
        let (worker, _, _) = site_worker();
        let output = result_json(&message_impl(&worker, SwMessageParams { data: json!("hello") }).await.unwrap());
        assert_eq!(output["action"], "none");
    }

    #[tokio::test]
    async fn test_push_shows_notification() {
        let (worker, _, _) = site_worker();
        let params = SwPushParams { data: Some(r#"{"title":"Update","body":"v1.3 is live"}"#.into()) };
        let output = result_json(&push_impl(&worker, params).await.unwrap());
        assert_eq!(output["action"], "show_notification");
        assert_eq!(output["notification"]["title"], "Update");
        assert_eq!(output["notification"]["tag"], "game-update");
    }

    #[tokio::test]
    async fn test_malformed_push_code() {
        let (worker, _, _) = site_worker();
        let err = push_impl(&worker, SwPushParams { data: Some("nope".into()) }).await.unwrap_err();
        assert_eq!(err.code.0, -32022);
    }

    #[tokio::test]
    async fn test_view_click_opens_news() {
        let (worker, _, _) = site_worker();
        let params = SwNotificationClickParams { action: Some("view".into()) };
        let output = result_json(&notification_click_impl(&worker, params).await.unwrap());
        assert_eq!(output["action"], "open_window");
        assert_eq!(output["path"], "/news/");
    }
}
