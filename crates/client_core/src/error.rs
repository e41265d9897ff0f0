use shared::{domain::ItemId, error::ErrorBody, error::ErrorCode};
use thiserror::Error;

pub const CONNECTION_ERROR_MESSAGE: &str = "Connection error. Check your network and try again.";
pub const GENERIC_ERROR_MESSAGE: &str = "The operation could not be completed.";
pub const SESSION_EXPIRED_MESSAGE: &str = "Your session has expired. Sign in again.";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("request rejected with status {status}: {}", .message.as_deref().unwrap_or("no details"))]
    Rejected {
        status: u16,
        code: ErrorCode,
        message: Option<String>,
    },
    #[error("{dependents} dependent record(s) still reference item {id}")]
    HasDependents {
        id: ItemId,
        dependents: u32,
        message: Option<String>,
    },
    #[error("unauthorized")]
    Unauthorized,
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("invalid endpoint url: {0}")]
    InvalidUrl(String),
    #[error("invalid attachment: {0}")]
    Attachment(String),
    #[error("request cancelled")]
    Cancelled,
}

impl ClientError {
    pub fn rejected(status: u16, body: &ErrorBody) -> Self {
        Self::Rejected {
            status,
            code: ErrorCode::from_status(status),
            message: body.human_message(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::Rejected {
            status: 404,
            code: ErrorCode::NotFound,
            message: Some(message.into()),
        }
    }

    /// Text suitable for a toast or alert.
    pub fn user_message(&self) -> String {
        match self {
            Self::Transport(_) => CONNECTION_ERROR_MESSAGE.to_string(),
            Self::Rejected {
                message: Some(message),
                ..
            } => message.clone(),
            Self::HasDependents {
                dependents,
                message,
                ..
            } => message.clone().unwrap_or_else(|| {
                format!("This item still has {dependents} associated record(s).")
            }),
            Self::Unauthorized => SESSION_EXPIRED_MESSAGE.to_string(),
            Self::Cancelled => "The request was cancelled.".to_string(),
            Self::Attachment(reason) => format!("Attachment could not be sent: {reason}"),
            Self::Rejected { message: None, .. } | Self::Decode(_) | Self::InvalidUrl(_) => {
                GENERIC_ERROR_MESSAGE.to_string()
            }
        }
    }

    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    pub fn requires_reauth(&self) -> bool {
        matches!(self, Self::Unauthorized)
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Rejected { status, .. } => Some(*status),
            Self::Unauthorized => Some(401),
            _ => None,
        }
    }

    /// Validation problems keep the form open, so they go to a blocking alert.
    pub fn wants_alert(&self) -> bool {
        matches!(
            self,
            Self::Rejected {
                code: ErrorCode::Validation,
                ..
            }
        )
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::Decode(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}

impl From<url::ParseError> for ClientError {
    fn from(err: url::ParseError) -> Self {
        Self::InvalidUrl(err.to_string())
    }
}
