/// WebSocket message schema
///
/// Every frame is a JSON object discriminated by `type`:
/// - `subscribe` / `unsubscribe` (client → server) carry a component name
/// - `componentUpdate` (server → client) carries freshly rendered HTML
///
/// Informational replies to subscription requests are not part of this enum;
/// see `Reply`.
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// ============================================================================
// WIRE MESSAGES
// ============================================================================

/// Action carried by component updates (always `"update"`)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpdateAction {
    #[default]
    Update,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Message {
    /// Start receiving updates for a component
    Subscribe { component: String },

    /// Stop receiving updates for a component
    Unsubscribe { component: String },

    /// Rendered fragment for one component instance
    ComponentUpdate {
        component: String,
        #[serde(default)]
        action: UpdateAction,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<Uuid>,
        html: String,
    },
}

impl Message {
    pub fn subscribe(component: impl Into<String>) -> Self {
        Message::Subscribe {
            component: component.into(),
        }
    }

    pub fn unsubscribe(component: impl Into<String>) -> Self {
        Message::Unsubscribe {
            component: component.into(),
        }
    }

    pub fn component_update(
        component: impl Into<String>,
        id: Option<Uuid>,
        html: impl Into<String>,
    ) -> Self {
        Message::ComponentUpdate {
            component: component.into(),
            action: UpdateAction::Update,
            id,
            html: html.into(),
        }
    }

    /// Wire name of the variant
    pub fn kind(&self) -> &'static str {
        match self {
            Message::Subscribe { .. } => "subscribe",
            Message::Unsubscribe { .. } => "unsubscribe",
            Message::ComponentUpdate { .. } => "componentUpdate",
        }
    }

    /// Component named by the message
    pub fn component(&self) -> &str {
        match self {
            Message::Subscribe { component }
            | Message::Unsubscribe { component }
            | Message::ComponentUpdate { component, .. } => component,
        }
    }

    /// Serialize to JSON text
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parse JSON text; an unknown `type` is an error
    pub fn decode(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.kind(), self.component())
    }
}

// ============================================================================
// REPLIES
// ============================================================================

/// Informational text sent back to the requesting connection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Subscribed(String),
    Unsubscribed(String),
    NotFound(String),
}

impl Reply {
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Reply::Subscribed(component) => {
                serde_json::json!({ "msg": format!("Subscribed to {}", component) })
            }
            Reply::Unsubscribed(component) => {
                serde_json::json!({ "msg": format!("Unsubscribed to {}", component) })
            }
            Reply::NotFound(component) => {
                serde_json::json!({ "error": format!("Component '{}' not found", component) })
            }
        }
    }

    pub fn to_text(&self) -> String {
        self.to_json().to_string()
    }
}
