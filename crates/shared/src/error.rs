use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    Unauthorized,
    Forbidden,
    NotFound,
    Validation,
    Conflict,
    Internal,
}

impl ErrorCode {
    pub fn from_status(status: u16) -> Self {
        match status {
            401 => Self::Unauthorized,
            403 => Self::Forbidden,
            404 => Self::NotFound,
            409 => Self::Conflict,
            400 | 422 => Self::Validation,
            _ => Self::Internal,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    #[serde(default, alias = "campo", alias = "path")]
    pub field: Option<String>,
    #[serde(alias = "msg", alias = "mensaje")]
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldErrors {
    Detailed(Vec<FieldError>),
    Messages(Vec<String>),
    ByField(BTreeMap<String, OneOrMany>),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl FieldErrors {
    fn lines(&self) -> Vec<String> {
        match self {
            Self::Detailed(errors) => errors
                .iter()
                .map(|error| match &error.field {
                    Some(field) => format!("{field}: {}", error.message),
                    None => error.message.clone(),
                })
                .collect(),
            Self::Messages(messages) => messages.clone(),
            Self::ByField(map) => map
                .iter()
                .flat_map(|(field, messages)| {
                    let messages = match messages {
                        OneOrMany::One(message) => vec![message.clone()],
                        OneOrMany::Many(messages) => messages.clone(),
                    };
                    messages
                        .into_iter()
                        .map(move |message| format!("{field}: {message}"))
                })
                .collect(),
        }
    }
}

/// Whatever JSON a failing endpoint sent back. Every field is optional since
/// the backend is not consistent across controllers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(default, alias = "mensaje")]
    pub message: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default, alias = "errores")]
    pub errors: Option<FieldErrors>,
    #[serde(default, rename = "dependentsCount", alias = "dependents_count")]
    pub dependents_count: Option<u32>,
}

impl ErrorBody {
    pub fn parse(raw: &str) -> Option<Self> {
        serde_json::from_str(raw).ok()
    }

    pub fn human_message(&self) -> Option<String> {
        if let Some(errors) = &self.errors {
            let lines = errors.lines();
            if !lines.is_empty() {
                return Some(lines.join("; "));
            }
        }
        [&self.message, &self.error]
            .into_iter()
            .flatten()
            .map(|text| text.trim())
            .find(|text| !text.is_empty())
            .map(str::to_string)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_errors_win_over_generic_message() {
        let body = ErrorBody::parse(
            r#"{"message":"Validation failed","errors":{"email":["is invalid"],"name":"is required"}}"#,
        )
        .expect("body");
        assert_eq!(
            body.human_message().as_deref(),
            Some("email: is invalid; name: is required")
        );
    }

    #[test]
    fn falls_back_to_error_string() {
        let body = ErrorBody::parse(r#"{"error":"  Tipo con documentos asociados  "}"#)
            .expect("body");
        assert_eq!(
            body.human_message().as_deref(),
            Some("Tipo con documentos asociados")
        );
    }

    #[test]
    fn reads_dependents_count_in_camel_case() {
        let body = ErrorBody::parse(r#"{"error":"has dependents","dependentsCount":3}"#)
            .expect("body");
        assert_eq!(body.dependents_count, Some(3));
    }

    #[test]
    fn empty_body_has_no_message() {
        let body = ErrorBody::parse("{}").expect("body");
        assert_eq!(body.human_message(), None);
    }

    #[test]
    fn status_codes_map_to_error_codes() {
        assert_eq!(ErrorCode::from_status(401), ErrorCode::Unauthorized);
        assert_eq!(ErrorCode::from_status(409), ErrorCode::Conflict);
        assert_eq!(ErrorCode::from_status(422), ErrorCode::Validation);
        assert_eq!(ErrorCode::from_status(503), ErrorCode::Internal);
    }
}
