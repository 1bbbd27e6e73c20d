//! Push notifications and notification clicks.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use swcache_core::Error;

const ICON: &str = "/images/icon-192x192.png";
const BADGE: &str = "/images/badge-72x72.png";
const TAG: &str = "game-update";

/// Window opened by the `view` action.
pub const VIEW_TARGET: &str = "/news/";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct NotificationAction {
    pub action: String,
    pub title: String,
}

/// A notification the host should display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, JsonSchema)]
pub struct Notification {
    pub title: String,
    pub body: String,
    pub icon: String,
    pub badge: String,
    pub tag: String,
    pub require_interaction: bool,
    pub actions: Vec<NotificationAction>,
}

#[derive(Debug, Deserialize)]
struct PushPayload {
    title: String,
    #[serde(default)]
    body: String,
}

impl Notification {
    fn game_update(title: String, body: String) -> Self {
        let action = |action: &str, title: &str| NotificationAction { action: action.into(), title: title.into() };
        Self {
            title,
            body,
            icon: ICON.into(),
            badge: BADGE.into(),
            tag: TAG.into(),
            require_interaction: true,
            actions: vec![action("view", "詳細を見る"), action("dismiss", "閉じる")],
        }
    }
}

/// Build the notification for a push. `None` when the push carried no data.
pub fn notification_from_push(data: Option<&[u8]>) -> Result<Option<Notification>, Error> {
    let Some(data) = data else {
        return Ok(None);
    };

    let payload: PushPayload = serde_json::from_slice(data).map_err(|e| Error::MalformedPush(e.to_string()))?;
    tracing::info!(title = %payload.title, "push received");
    Ok(Some(Notification::game_update(payload.title, payload.body)))
}

/// Path to open for a clicked notification action, if any.
pub fn notification_click(action: Option<&str>) -> Option<&'static str> {
    match action {
        Some("view") => Some(VIEW_TARGET),
        _ => None,
    }
}
