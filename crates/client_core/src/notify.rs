//! User-facing feedback: toasts, alerts and confirmation prompts.

use async_trait::async_trait;
use shared::domain::ItemId;
use tracing::{error, info, warn};

use crate::error::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastLevel {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    pub level: ToastLevel,
    pub message: String,
}

impl Toast {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: ToastLevel::Error,
            message: message.into(),
        }
    }
}

pub trait Notifier: Send + Sync {
    /// Non-blocking, transient.
    fn toast(&self, toast: Toast);
    /// Blocking until acknowledged.
    fn alert(&self, message: &str);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmPrompt {
    Delete {
        id: ItemId,
        label: Option<String>,
    },
    ForceDelete {
        id: ItemId,
        dependents: u32,
        message: Option<String>,
    },
}

impl ConfirmPrompt {
    pub fn text(&self) -> String {
        match self {
            Self::Delete {
                label: Some(label), ..
            } => format!("Delete \"{label}\"? This cannot be undone."),
            Self::Delete { id, label: None } => {
                format!("Delete item {id}? This cannot be undone.")
            }
            Self::ForceDelete {
                dependents,
                message,
                ..
            } => {
                let reason = message
                    .as_deref()
                    .map(|message| format!("{message}. "))
                    .unwrap_or_default();
                format!(
                    "{reason}This item has {dependents} associated record(s). Delete it anyway?"
                )
            }
        }
    }
}

#[async_trait]
pub trait Confirmer: Send + Sync {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool;
}

/// Routes an error to the right surface.
pub fn report_error(notifier: &dyn Notifier, action: &str, err: &ClientError) {
    warn!(action, error = %err, "dashboard action failed");
    let message = err.user_message();
    if err.wants_alert() {
        notifier.alert(&message);
    } else {
        notifier.toast(Toast::error(message));
    }
}

/// Notifier for headless use: everything goes to the log.
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn toast(&self, toast: Toast) {
        match toast.level {
            ToastLevel::Error => error!(message = %toast.message, "toast"),
            ToastLevel::Success | ToastLevel::Info => info!(message = %toast.message, "toast"),
        }
    }

    fn alert(&self, message: &str) {
        error!(message, "alert");
    }
}

/// Answers every prompt the same way.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl Confirmer for AutoConfirm {
    async fn confirm(&self, prompt: &ConfirmPrompt) -> bool {
        info!(prompt = %prompt.text(), answer = self.0, "auto-confirm");
        self.0
    }
}
