//! Trigger (entry node) definition within a workflow.

use serde::{Deserialize, Serialize};
use tapestry_core::{TriggerId, WebhookAuthMethodId};

/// An entry node that starts the workflow when its external event fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Unique trigger identifier within this workflow.
    pub id: TriggerId,
    /// What kind of external event starts the workflow.
    pub kind: TriggerKind,
    /// Whether the trigger is active. New triggers start disabled so that
    /// creating a workflow never counts against usage limits until the user
    /// deliberately activates it.
    pub enabled: bool,
    /// Webhook auth methods accepted by this trigger (webhook kind only).
    #[serde(default)]
    pub webhook_auth_method_ids: Vec<WebhookAuthMethodId>,
}

impl Trigger {
    /// Create a disabled trigger of the given kind.
    #[must_use]
    pub fn new(id: TriggerId, kind: TriggerKind) -> Self {
        Self {
            id,
            kind,
            enabled: false,
            webhook_auth_method_ids: Vec::new(),
        }
    }

    /// Create a disabled webhook trigger.
    #[must_use]
    pub fn webhook(id: TriggerId) -> Self {
        Self::new(id, TriggerKind::Webhook)
    }

    /// Create a disabled cron trigger with the given schedule expression.
    #[must_use]
    pub fn cron(id: TriggerId, expression: impl Into<String>) -> Self {
        Self::new(
            id,
            TriggerKind::Cron {
                expression: expression.into(),
            },
        )
    }

    /// Create a disabled kafka trigger.
    #[must_use]
    pub fn kafka(id: TriggerId) -> Self {
        Self::new(id, TriggerKind::Kafka)
    }

    /// Set the enabled flag.
    #[must_use]
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Associate a webhook auth method.
    #[must_use]
    pub fn with_auth_method(mut self, auth_method_id: WebhookAuthMethodId) -> Self {
        self.webhook_auth_method_ids.push(auth_method_id);
        self
    }
}

/// The kind of external event a trigger listens for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TriggerKind {
    /// An inbound HTTP request.
    Webhook,
    /// A cron schedule.
    Cron {
        /// The cron schedule expression.
        expression: String,
    },
    /// A message on a kafka topic.
    Kafka,
}
