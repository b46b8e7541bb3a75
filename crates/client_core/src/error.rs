use shared::error::{ErrorKind, ValidationError};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("invalid draft: {0}")]
    Validation(#[from] ValidationError),
    #[error("no credential available for a protected operation")]
    Unauthorized,
    #[error("permission denied{}", suffix(.message))]
    PermissionDenied { message: Option<String> },
    #[error("service responded with status {status}{}", suffix(.message))]
    Service {
        status: u16,
        message: Option<String>,
    },
    #[error("request could not complete: {0}")]
    Network(String),
    #[error("unexpected response body: {0}")]
    Decode(String),
    #[error("{resource} does not support {operation}")]
    Unsupported {
        resource: &'static str,
        operation: &'static str,
    },
}

fn suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

impl ClientError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ClientError::Validation(_) | ClientError::Unsupported { .. } => ErrorKind::Validation,
            ClientError::Unauthorized => ErrorKind::Unauthorized,
            ClientError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            ClientError::Service { .. } | ClientError::Decode(_) => ErrorKind::Service,
            ClientError::Network(_) => ErrorKind::Network,
        }
    }

    /// The single string shown to the operator for this failure.
    pub fn user_message(&self) -> String {
        match self {
            ClientError::Validation(err) => format!("{} {}", err.field, err.reason),
            ClientError::Unauthorized => "Unauthorized! Please log in again.".to_string(),
            ClientError::PermissionDenied { .. } => {
                "Access denied! You don't have permission.".to_string()
            }
            ClientError::Service {
                message: Some(message),
                ..
            } => message.clone(),
            ClientError::Service {
                status,
                message: None,
            } => format!("Request failed with status {status}"),
            ClientError::Network(_) => "Network error, please try again later.".to_string(),
            ClientError::Decode(_) => "The service returned an unexpected response.".to_string(),
            ClientError::Unsupported {
                resource,
                operation,
            } => format!("{operation} is not available for {resource}"),
        }
    }

    pub(crate) fn unsupported(resource: &'static str, operation: &'static str) -> Self {
        ClientError::Unsupported {
            resource,
            operation,
        }
    }
}

/// A `list()` that left the collection untouched.
#[derive(Debug, Clone, Error)]
#[error("failed to fetch {resource}: {source}")]
pub struct FetchError {
    pub resource: &'static str,
    #[source]
    pub source: ClientError,
}

impl FetchError {
    pub fn new(resource: &'static str, source: ClientError) -> Self {
        Self { resource, source }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn user_message(&self) -> String {
        self.source.user_message()
    }
}
