//! Configuration types for client construction.

use std::collections::BTreeMap;
use std::fmt;

use crate::version::MINIMUM_API_VERSION;

/// Configuration for [`ApiClient`] construction.
///
/// Exactly one of `token` or `username`+`password` may be supplied; leaving
/// all of them unset yields an anonymous client that only probes the endpoint
/// for liveness.
///
/// [`ApiClient`]: crate::ApiClient
#[derive(Clone)]
pub struct ClientConfig {
    /// Base URL of the API. A missing scheme defaults to `http://` and any
    /// trailing slash is stripped during construction.
    pub base_url: String,
    /// Bearer token for authentication.
    pub token: Option<String>,
    /// Username for credential-based authentication.
    pub username: Option<String>,
    /// Password for credential-based authentication.
    pub password: Option<String>,
    /// Minimum API version this client expects. The version gate compares the
    /// server's advertised version against this and warns on skew.
    pub minimum_api_version: String,
    /// Additional headers to include in every request.
    pub extra_headers: BTreeMap<String, String>,
    /// Optional user agent override.
    pub user_agent: Option<String>,
}

// Hand-written so the token and password never end up in logs.
impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ClientConfig {
    /// An anonymous configuration for the given endpoint.
    pub fn new(base_url: impl Into<String>) -> Self {
        ClientConfig {
            base_url: base_url.into(),
            token: None,
            username: None,
            password: None,
            minimum_api_version: MINIMUM_API_VERSION.to_string(),
            extra_headers: BTreeMap::new(),
            user_agent: None,
        }
    }

    /// Authenticate with a pre-issued bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Authenticate by exchanging a username and password for a token.
    pub fn with_credentials(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }
}
