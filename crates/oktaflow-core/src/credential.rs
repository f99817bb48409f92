//! Okta credential record and the store the host resolves it from.

use std::convert::Infallible;
use std::fmt::{Debug, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::OktaError;

/// Name under which the host stores the Okta credential record.
pub const CREDENTIAL_NAME: &str = "oktaApi";

/// Authentication scheme selected by the credential.
///
/// Any setting other than `apiToken` selects the bearer scheme, so records
/// written by newer hosts with additional OAuth flavours keep working.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum AuthMethod {
    /// Static `SSWS` API token.
    #[default]
    #[serde(rename = "apiToken")]
    ApiToken,
    /// OAuth 2.0; the access token is supplied by the host, never acquired here.
    #[serde(rename = "oauth2")]
    OAuth2,
}

impl AuthMethod {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ApiToken => "apiToken",
            Self::OAuth2 => "oauth2",
        }
    }
}

impl From<&str> for AuthMethod {
    fn from(value: &str) -> Self {
        match value {
            "apiToken" => Self::ApiToken,
            _ => Self::OAuth2,
        }
    }
}

impl From<String> for AuthMethod {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

impl FromStr for AuthMethod {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::from(value))
    }
}

/// Per-invocation Okta credential. Immutable for the duration of a request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credential {
    pub org_url: String,
    #[serde(default)]
    pub auth_method: AuthMethod,
    #[serde(default)]
    pub api_token: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub private_key: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub scopes: Option<String>,
}

impl Credential {
    pub fn api_token(org_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            org_url: org_url.into(),
            auth_method: AuthMethod::ApiToken,
            api_token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn oauth2(org_url: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            org_url: org_url.into(),
            auth_method: AuthMethod::OAuth2,
            access_token: Some(access_token.into()),
            ..Self::default()
        }
    }

    /// Reads the credential from `OKTA_*` environment variables.
    pub fn from_env() -> Result<Self, OktaError> {
        let org_url = std::env::var("OKTA_ORG_URL")
            .map_err(|_| OktaError::Credential(String::from("OKTA_ORG_URL is not set")))?;
        let auth_method = match std::env::var("OKTA_AUTH_METHOD") {
            Ok(value) => AuthMethod::from(value.as_str()),
            Err(_) => AuthMethod::default(),
        };

        let credential = Self {
            org_url,
            auth_method,
            api_token: std::env::var("OKTA_API_TOKEN").ok(),
            client_id: std::env::var("OKTA_CLIENT_ID").ok(),
            private_key: std::env::var("OKTA_PRIVATE_KEY").ok(),
            access_token: std::env::var("OKTA_ACCESS_TOKEN").ok(),
            scopes: std::env::var("OKTA_SCOPES").ok(),
        };
        credential.validate()?;
        Ok(credential)
    }

    pub fn validate(&self) -> Result<(), OktaError> {
        if self.org_url.trim().is_empty() {
            return Err(OktaError::Credential(String::from(
                "organization URL cannot be empty",
            )));
        }
        Ok(())
    }

    /// Organization URL with a single trailing slash removed.
    pub fn base_url(&self) -> &str {
        self.org_url.strip_suffix('/').unwrap_or(&self.org_url)
    }

    /// `Authorization` header value for the configured auth method.
    pub fn authorization_header(&self) -> String {
        match self.auth_method {
            AuthMethod::ApiToken => {
                format!("SSWS {}", self.api_token.as_deref().unwrap_or_default())
            }
            AuthMethod::OAuth2 => {
                format!("Bearer {}", self.access_token.as_deref().unwrap_or_default())
            }
        }
    }
}

impl Debug for Credential {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let redact = |value: &Option<String>| value.as_ref().map(|_| "<redacted>");
        f.debug_struct("Credential")
            .field("org_url", &self.org_url)
            .field("auth_method", &self.auth_method)
            .field("api_token", &redact(&self.api_token))
            .field("client_id", &self.client_id)
            .field("private_key", &redact(&self.private_key))
            .field("access_token", &redact(&self.access_token))
            .field("scopes", &self.scopes)
            .finish()
    }
}

/// Host capability resolving a named credential record.
pub trait CredentialStore: Send + Sync {
    fn credential(&self, name: &str) -> Result<Credential, OktaError>;
}

/// Store holding a single fixed credential, served under [`CREDENTIAL_NAME`].
#[derive(Debug, Clone)]
pub struct StaticCredentialStore {
    credential: Credential,
}

impl StaticCredentialStore {
    pub fn new(credential: Credential) -> Self {
        Self { credential }
    }
}

impl CredentialStore for StaticCredentialStore {
    fn credential(&self, name: &str) -> Result<Credential, OktaError> {
        if name != CREDENTIAL_NAME {
            return Err(OktaError::Credential(format!(
                "credential '{name}' is not configured"
            )));
        }
        Ok(self.credential.clone())
    }
}

/// Store reading the credential from the process environment on every lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentialStore;

impl CredentialStore for EnvCredentialStore {
    fn credential(&self, _name: &str) -> Result<Credential, OktaError> {
        Credential::from_env()
    }
}
