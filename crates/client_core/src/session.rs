use std::fmt;

use async_trait::async_trait;
use shared::{
    error::ValidationError,
    records::{LoginRequest, LoginResponse},
};
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::{
    error::ClientError,
    transport::{HttpTransport, ResourceRequest},
};

const MIN_PASSWORD_LEN: usize = 6;

/// Opaque bearer token. The secret is wiped when the credential is dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Returns `None` for blank tokens so callers never send an empty bearer.
    pub fn bearer(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

impl Drop for Credential {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    pub credential: Option<Credential>,
    pub user_id: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            credential: Credential::bearer(token),
            user_id: None,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        self.credential.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.credential.is_some()
    }

    pub fn logout(&mut self) {
        self.credential = None;
        self.user_id = None;
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, ValidationError> {
        let email = self.email.trim();
        if !is_valid_email(email) {
            return Err(ValidationError::new(
                "email",
                "must be a valid email address",
            ));
        }
        if self.password.chars().count() < MIN_PASSWORD_LEN {
            return Err(ValidationError::new(
                "password",
                format!("must be at least {MIN_PASSWORD_LEN} characters long"),
            ));
        }
        Ok(LoginRequest {
            email: email.to_string(),
            password: self.password.clone(),
        })
    }
}

fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || email.chars().any(char::is_whitespace) || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

/// Exchanges credentials for a session token.
pub async fn login(transport: &HttpTransport, form: &LoginForm) -> Result<Session, ClientError> {
    let request = form.validate()?;
    let email = request.email.clone();
    let outcome = transport
        .fetch_json::<LoginResponse>(ResourceRequest::post("Users/Login").json(&request)?, None)
        .await;

    let response = match outcome {
        Ok(response) => response,
        Err(ClientError::Service { status, .. }) if (400..500).contains(&status) => {
            warn!(status, "session: login rejected");
            return Err(ClientError::Service {
                status,
                message: Some(
                    "The username or password you entered is incorrect, please try again."
                        .to_string(),
                ),
            });
        }
        Err(err) => return Err(err),
    };

    let credential = Credential::bearer(response.token.as_str())
        .ok_or_else(|| ClientError::Decode("login response carried an empty token".into()))?;
    info!(%email, "session: logged in");
    Ok(Session {
        credential: Some(credential),
        user_id: response.user_id(),
    })
}

/// Where a console session gets its credential from, once, at start-up.
#[async_trait]
pub trait SessionSource: Send + Sync {
    async fn open(&self, transport: &HttpTransport) -> Result<Session, ClientError>;
}

/// A token handed over by the environment or a previous login.
pub struct StaticToken(pub Option<String>);

#[async_trait]
impl SessionSource for StaticToken {
    async fn open(&self, _transport: &HttpTransport) -> Result<Session, ClientError> {
        Ok(match self.0.as_deref() {
            Some(token) => Session::with_token(token),
            None => Session::anonymous(),
        })
    }
}

pub struct PasswordLogin(pub LoginForm);

#[async_trait]
impl SessionSource for PasswordLogin {
    async fn open(&self, transport: &HttpTransport) -> Result<Session, ClientError> {
        login(transport, &self.0).await
    }
}
