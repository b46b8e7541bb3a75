use std::time::Duration;

use reqwest::{
    multipart::{Form, Part},
    Client, Method, StatusCode,
};
use serde::{de::DeserializeOwned, Serialize};
use shared::error::{extract_message, ValidationError};
use tracing::debug;
use url::Url;

use crate::{error::ClientError, session::Credential};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct TransportConfig {
    pub base_url: Url,
    pub request_timeout: Duration,
}

impl TransportConfig {
    pub fn parse(base_url: &str) -> Result<Self, url::ParseError> {
        Ok(Self {
            base_url: Url::parse(base_url.trim())?,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, request_timeout: Duration) -> Self {
        self.request_timeout = request_timeout;
        self
    }
}

/// Binary image uploaded alongside a multi-part create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageAttachment {
    pub filename: String,
    pub mime_type: Option<String>,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartBody {
    pub fields: Vec<(String, String)>,
    pub file: Option<(String, ImageAttachment)>,
}

impl MultipartBody {
    pub fn text(mut self, name: &str, value: impl Into<String>) -> Self {
        self.fields.push((name.to_string(), value.into()));
        self
    }

    pub fn file(mut self, name: &str, attachment: ImageAttachment) -> Self {
        self.file = Some((name.to_string(), attachment));
        self
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    fn into_form(self) -> Result<Form, ClientError> {
        let mut form = Form::new();
        for (name, value) in self.fields {
            form = form.text(name, value);
        }
        if let Some((name, attachment)) = self.file {
            let mime_type = attachment
                .mime_type
                .unwrap_or_else(|| "application/octet-stream".to_string());
            let part = Part::bytes(attachment.bytes)
                .file_name(attachment.filename)
                .mime_str(&mime_type)
                .map_err(|e| {
                    ValidationError::new("imageFile", format!("invalid content type: {e}"))
                })?;
            form = form.part(name, part);
        }
        Ok(form)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum RequestBody {
    #[default]
    Empty,
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// One call against the remote service, relative to the configured base url.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: RequestBody,
}

impl ResourceRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: RequestBody::Empty,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query(mut self, key: &str, value: impl ToString) -> Self {
        self.query.push((key.to_string(), value.to_string()));
        self
    }

    pub fn json<T: Serialize>(mut self, payload: &T) -> Result<Self, ClientError> {
        let value = serde_json::to_value(payload)
            .map_err(|e| ValidationError::new("payload", format!("cannot be encoded: {e}")))?;
        self.body = RequestBody::Json(value);
        Ok(self)
    }

    pub fn multipart(mut self, body: MultipartBody) -> Self {
        self.body = RequestBody::Multipart(body);
        self
    }
}

pub struct HttpTransport {
    http: Client,
    base_url: String,
}

impl HttpTransport {
    pub fn new(config: TransportConfig) -> Result<Self, ClientError> {
        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| ClientError::Network(format!("failed to build http client: {e}")))?;
        Ok(Self {
            http,
            base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Sends `request` and returns the raw success body.
    pub async fn execute(
        &self,
        request: ResourceRequest,
        credential: Option<&Credential>,
    ) -> Result<String, ClientError> {
        let url = format!("{}/{}", self.base_url, request.path.trim_start_matches('/'));
        debug!(method = %request.method, %url, "transport: sending request");

        let mut builder = self.http.request(request.method, url);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(credential) = credential {
            builder = builder.bearer_auth(credential.expose());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(body) => builder.multipart(body.into_form()?),
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ClientError::Network(e.to_string()))?;

        if status.is_success() {
            return Ok(body);
        }
        Err(error_for_status(status, &body))
    }

    pub async fn fetch_json<T: DeserializeOwned>(
        &self,
        request: ResourceRequest,
        credential: Option<&Credential>,
    ) -> Result<T, ClientError> {
        let body = self.execute(request, credential).await?;
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

pub(crate) fn error_for_status(status: StatusCode, body: &str) -> ClientError {
    let message = extract_message(body);
    if status == StatusCode::FORBIDDEN {
        ClientError::PermissionDenied { message }
    } else {
        ClientError::Service {
            status: status.as_u16(),
            message,
        }
    }
}

#[cfg(test)]
#[path = "tests/transport_tests.rs"]
mod tests;
