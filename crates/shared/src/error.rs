use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    PermissionDenied,
    Service,
    Network,
}

/// A draft field that failed client-side checks.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    pub field: &'static str,
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, "is required")
    }
}

/// Error body shapes the remote service is known to produce.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceErrorBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<BTreeMap<String, Vec<String>>>,
}

impl ServiceErrorBody {
    pub fn into_message(self) -> Option<String> {
        if let Some(message) = self.message.as_ref().and_then(message_from_value) {
            return Some(message);
        }
        if let Some(message) = self.error.as_ref().and_then(message_from_value) {
            return Some(message);
        }
        if let Some(first) = self
            .errors
            .as_ref()
            .and_then(|errors| errors.values().flatten().find(|m| !m.trim().is_empty()))
        {
            return Some(first.trim().to_string());
        }
        self.detail
            .filter(|d| !d.trim().is_empty())
            .or(self.title.filter(|t| !t.trim().is_empty()))
    }
}

fn message_from_value(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
        Value::Object(_) => serde_json::from_value::<ServiceErrorBody>(value.clone())
            .ok()
            .and_then(ServiceErrorBody::into_message),
        _ => None,
    }
}

/// Reduces a response body to the plain message a user should see.
///
/// Accepts a bare JSON string, any nesting of `message`/`error` objects,
/// problem-details documents, or plain text.
pub fn extract_message(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(trimmed) {
        Ok(value @ (Value::String(_) | Value::Object(_))) => message_from_value(&value),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
