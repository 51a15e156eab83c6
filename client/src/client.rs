//! Session bootstrap and version gate.
//!
//! [`ApiClient`] is the single concrete session type every operation in this
//! crate hangs off of. Construction establishes an authenticated (or
//! anonymous) transport handle and then best-effort checks that the server is
//! new enough for this client.

use std::fmt;

use http::StatusCode;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use tracing::{debug, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{error_detail, ClientError};
use crate::version::{Version, VersionWarning};

/// One authenticated (or anonymous) connection to one catalog endpoint.
///
/// The client is immutable after construction except for token rotation via
/// [`ApiClient::acquire_token`], which takes `&mut self`. Consumers needing
/// concurrent use should hold one client per caller.
pub struct ApiClient {
    config: ClientConfig,
    base_url: String,
    http: reqwest::Client,
    token: Option<String>,
    api_version: Option<String>,
    version_warning: Option<VersionWarning>,
}

// Hand-written so the attached token never ends up in logs.
impl fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("api_version", &self.api_version)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Establish a session against `config.base_url`.
    ///
    /// Three mutually exclusive initialization paths:
    /// - a token is supplied: attach it as a bearer header, then run the
    ///   version check;
    /// - username and password are supplied: exchange them for a token at
    ///   `POST {base}/token`, attach it, then run the version check;
    /// - neither: probe `GET {base}` for liveness only.
    ///
    /// Supplying both a token and credentials is a configuration error. The
    /// version check never fails construction; its outcome is observable via
    /// [`ApiClient::version_warning`].
    pub async fn connect(config: ClientConfig) -> Result<Self, ClientError> {
        if config.token.is_some() && (config.username.is_some() || config.password.is_some()) {
            return Err(ClientError::Configuration(
                "provide either a token or username/password, not both".to_string(),
            ));
        }

        let base_url = normalize_base_url(&config.base_url)?;
        let http = build_http_client(&config, None)?;
        let mut client = ApiClient {
            base_url,
            http,
            token: None,
            api_version: None,
            version_warning: None,
            config,
        };

        if let Some(token) = client.config.token.clone() {
            client.attach_token(token)?;
            client.check_api_version().await;
        } else if let (Some(username), Some(password)) = (
            client.config.username.clone(),
            client.config.password.clone(),
        ) {
            client.exchange_credentials(&username, &password).await?;
            client.check_api_version().await;
        } else {
            client.check_availability().await?;
        }

        debug!(
            base_url = %client.base_url,
            authenticated = client.token.is_some(),
            api_version = ?client.api_version,
            "catalog client ready"
        );
        Ok(client)
    }

    /// The normalized base URL this client talks to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The bearer token currently attached, if any.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// The API version advertised by the server, when the probe found one.
    pub fn api_version(&self) -> Option<&str> {
        self.api_version.as_deref()
    }

    /// The version-skew warning recorded during construction, if any.
    pub fn version_warning(&self) -> Option<&VersionWarning> {
        self.version_warning.as_ref()
    }

    /// The underlying transport handle, with the bearer header pre-attached
    /// when authenticated.
    pub fn http(&self) -> &reqwest::Client {
        &self.http
    }

    /// Exchange `username`/`password` for a fresh token and attach it,
    /// replacing any previously attached token.
    pub async fn acquire_token(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        self.exchange_credentials(username, password).await
    }

    /// Absolute URL for an endpoint path under the base URL.
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn attach_token(&mut self, token: String) -> Result<(), ClientError> {
        self.http = build_http_client(&self.config, Some(&token))?;
        self.token = Some(token);
        Ok(())
    }

    async fn exchange_credentials(
        &mut self,
        username: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let url = self.endpoint("/token");
        let form = [("username", username), ("password", password)];
        let response = self.http.post(&url).form(&form).send().await.map_err(|source| {
            ClientError::Unreachable {
                url: self.base_url.clone(),
                source,
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            if status == StatusCode::UNAUTHORIZED {
                return Err(ClientError::Authentication(
                    "invalid username or password".to_string(),
                ));
            }
            let (status, detail) = error_detail(response).await;
            return Err(ClientError::Authentication(format!(
                "token exchange failed with status {status}: {detail}"
            )));
        }

        let body: serde_json::Value = response.json().await.map_err(|err| {
            ClientError::Authentication(format!("malformed token response: {err}"))
        })?;
        let token = body
            .get("access_token")
            .and_then(serde_json::Value::as_str)
            .filter(|token| !token.is_empty())
            .map(str::to_string)
            .ok_or_else(|| ClientError::Authentication("no access token received".to_string()))?;

        self.attach_token(token)
    }

    async fn check_availability(&self) -> Result<(), ClientError> {
        let response = self.http.get(&self.base_url).send().await.map_err(|source| {
            ClientError::Unreachable {
                url: self.base_url.clone(),
                source,
            }
        })?;
        response
            .error_for_status()
            .map_err(|source| ClientError::Unreachable {
                url: self.base_url.clone(),
                source,
            })?;
        Ok(())
    }

    /// Best-effort version probe against `GET {base}/status/`.
    ///
    /// Uses a fresh, unauthenticated transport handle: the status endpoint is
    /// expected to be publicly reachable and the bearer header must not leak
    /// into the probe. Every transport or JSON failure here is swallowed;
    /// construction never fails because of the version gate.
    async fn check_api_version(&mut self) {
        let url = self.endpoint("/status/");
        let probe = match reqwest::Client::builder().build() {
            Ok(probe) => probe,
            Err(err) => {
                debug!(%err, "could not build the probe client, skipping version check");
                return;
            },
        };
        let body: serde_json::Value = match probe.get(&url).send().await {
            Ok(response) if response.status().is_success() => match response.json().await {
                Ok(body) => body,
                Err(err) => {
                    debug!(%err, "status endpoint returned malformed JSON, skipping version check");
                    return;
                },
            },
            Ok(response) => {
                debug!(status = %response.status(), "status endpoint not available, skipping version check");
                return;
            },
            Err(err) => {
                debug!(%err, "status endpoint unreachable, skipping version check");
                return;
            },
        };

        // First non-empty field wins, in this order.
        let server_version = ["version", "api_version", "app_version"]
            .iter()
            .find_map(|field| body.get(*field))
            .and_then(serde_json::Value::as_str)
            .filter(|version| !version.is_empty())
            .map(str::to_string);

        let Some(server_version) = server_version else {
            let warning = VersionWarning::Undetermined;
            warn!("{warning}");
            self.version_warning = Some(warning);
            return;
        };

        self.api_version = Some(server_version.clone());

        let minimum = &self.config.minimum_api_version;
        match (
            server_version.parse::<Version>(),
            minimum.parse::<Version>(),
        ) {
            (Ok(server), Ok(min)) if server < min => {
                let warning = VersionWarning::Incompatible {
                    server: server_version,
                    minimum: minimum.clone(),
                };
                warn!("{warning}");
                self.version_warning = Some(warning);
            },
            (Ok(_), Ok(_)) => {},
            _ => {
                let warning = VersionWarning::Undetermined;
                warn!("{warning}");
                self.version_warning = Some(warning);
            },
        }
    }
}

/// Normalize a base URL: default the scheme to `http://` when absent and
/// strip any trailing slash. Idempotent.
pub(crate) fn normalize_base_url(raw: &str) -> Result<String, ClientError> {
    let schemed = if raw.contains("://") {
        raw.to_string()
    } else {
        format!("http://{raw}")
    };
    let normalized = schemed.trim_end_matches('/').to_string();
    Url::parse(&normalized)
        .map_err(|err| ClientError::Configuration(format!("invalid base URL '{raw}': {err}")))?;
    Ok(normalized)
}

fn build_http_client(
    config: &ClientConfig,
    token: Option<&str>,
) -> Result<reqwest::Client, ClientError> {
    let mut headers = HeaderMap::new();

    if let Some(token) = token {
        let mut value = HeaderValue::from_str(&format!("Bearer {token}"))
            .map_err(|err| ClientError::InvalidHeader(err.to_string()))?;
        value.set_sensitive(true);
        headers.insert(header::AUTHORIZATION, value);
    }

    for (key, value) in &config.extra_headers {
        headers.insert(
            key.parse::<HeaderName>()
                .map_err(|err| ClientError::InvalidHeader(err.to_string()))?,
            HeaderValue::from_str(value)
                .map_err(|err| ClientError::InvalidHeader(err.to_string()))?,
        );
    }

    let mut builder = reqwest::Client::builder().default_headers(headers);
    if let Some(user_agent) = &config.user_agent {
        builder = builder.user_agent(user_agent.clone());
    }

    builder
        .build()
        .map_err(|err| ClientError::Configuration(err.to_string()))
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::version::MINIMUM_API_VERSION;

    #[test]
    fn base_url_gets_default_scheme_and_no_trailing_slash() {
        assert_eq!(
            normalize_base_url("example.com/api/").unwrap(),
            "http://example.com/api"
        );
        assert_eq!(
            normalize_base_url("https://example.com/").unwrap(),
            "https://example.com"
        );
        assert_eq!(
            normalize_base_url("http://example.com").unwrap(),
            "http://example.com"
        );
    }

    #[test]
    fn base_url_normalization_is_idempotent() {
        let once = normalize_base_url("example.com/").unwrap();
        let twice = normalize_base_url(&once).unwrap();
        assert_eq!(once, twice);
    }

    #[tokio::test]
    async fn token_and_credentials_is_a_configuration_error() {
        let config = ClientConfig::new("http://localhost:1")
            .with_token("abc")
            .with_credentials("user", "pass");
        let err = ApiClient::connect(config).await.unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)), "{err:?}");
    }

    #[tokio::test]
    async fn anonymous_probe_failure_is_unreachable() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(503);
        });

        let err = ApiClient::connect(ClientConfig::new(server.base_url()))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Unreachable { .. }), "{err:?}");
    }

    #[tokio::test]
    async fn anonymous_probe_success_skips_version_check() {
        let server = MockServer::start_async().await;
        let liveness = server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        });
        let status = server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).json_body(json!({"version": "9.9.9"}));
        });

        let client = ApiClient::connect(ClientConfig::new(server.base_url()))
            .await
            .unwrap();
        assert_eq!(client.token(), None);
        assert_eq!(client.api_version(), None);
        liveness.assert();
        status.assert_hits(0);
    }

    #[tokio::test]
    async fn credential_exchange_attaches_bearer_token() {
        let server = MockServer::start_async().await;
        let token_exchange = server.mock(|when, then| {
            when.method(POST)
                .path("/token")
                .header("content-type", "application/x-www-form-urlencoded");
            then.status(200).json_body(json!({"access_token": "T"}));
        });
        let authed = server.mock(|when, then| {
            when.method(GET)
                .path("/organization")
                .header("authorization", "Bearer T");
            then.status(200).json_body(json!(["org-a"]));
        });

        let config = ClientConfig::new(server.base_url()).with_credentials("user", "pass");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.token(), Some("T"));

        let orgs = client.list_organizations(None, "global").await.unwrap();
        assert_eq!(orgs, vec!["org-a".to_string()]);
        token_exchange.assert();
        authed.assert();
    }

    #[tokio::test]
    async fn missing_access_token_is_an_authentication_error() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({"token_type": "bearer"}));
        });

        let config = ClientConfig::new(server.base_url()).with_credentials("user", "pass");
        let err = ApiClient::connect(config).await.unwrap_err();
        assert!(matches!(err, ClientError::Authentication(_)), "{err:?}");
        assert!(err.to_string().to_lowercase().contains("no access token"));
    }

    #[tokio::test]
    async fn rejected_credentials_name_invalid_credentials() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(401).json_body(json!({"detail": "bad creds"}));
        });

        let config = ClientConfig::new(server.base_url()).with_credentials("user", "wrong");
        let err = ApiClient::connect(config).await.unwrap_err();
        assert!(err.to_string().contains("invalid username or password"));
    }

    #[tokio::test]
    async fn outdated_server_version_records_one_warning() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let server = MockServer::start_async().await;
        let status = server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).json_body(json!({"version": "0.0.1"}));
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), Some("0.0.1"));

        let warning = client.version_warning().expect("warning should be recorded");
        let message = warning.to_string();
        assert!(message.contains("0.0.1"), "{message}");
        assert!(message.contains(MINIMUM_API_VERSION), "{message}");
        status.assert();
    }

    #[tokio::test]
    async fn compatible_server_version_records_no_warning() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).json_body(json!({"version": "1.0.0"}));
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), Some("1.0.0"));
        assert_eq!(client.version_warning(), None);
    }

    #[tokio::test]
    async fn alternative_version_fields_are_recognized() {
        for (body, expected) in [
            (json!({"api_version": "1.1.0"}), "1.1.0"),
            (json!({"app_version": "1.2.0"}), "1.2.0"),
        ] {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(GET).path("/status/");
                then.status(200).json_body(body);
            });

            let config = ClientConfig::new(server.base_url()).with_token("abc");
            let client = ApiClient::connect(config).await.unwrap();
            assert_eq!(client.api_version(), Some(expected));
            assert_eq!(client.version_warning(), None);
        }
    }

    #[tokio::test]
    async fn missing_version_field_records_undetermined_warning() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).json_body(json!({"status": "healthy"}));
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), None);
        assert_eq!(client.version_warning(), Some(&VersionWarning::Undetermined));
    }

    #[tokio::test]
    async fn unparsable_version_records_undetermined_warning() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).json_body(json!({"version": "not-a-version"}));
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), Some("not-a-version"));
        assert_eq!(client.version_warning(), Some(&VersionWarning::Undetermined));
    }

    #[tokio::test]
    async fn unreachable_status_endpoint_is_swallowed_silently() {
        // Nothing listens on this port; the token path performs no liveness
        // probe, so only the version probe hits the network and it must be
        // absorbed without warning or error.
        let config = ClientConfig::new("http://127.0.0.1:1").with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), None);
        assert_eq!(client.version_warning(), None);
    }

    #[tokio::test]
    async fn failing_status_endpoint_is_swallowed_silently() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(500);
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), None);
        assert_eq!(client.version_warning(), None);
    }

    #[tokio::test]
    async fn malformed_status_json_is_swallowed_silently() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).body("not json");
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), None);
        assert_eq!(client.version_warning(), None);
    }

    #[tokio::test]
    async fn version_probe_does_not_send_the_bearer_token() {
        let server = MockServer::start_async().await;
        // Mocks match in creation order: if the probe leaked the bearer
        // header, the first mock would swallow the request.
        let leaked_auth = server.mock(|when, then| {
            when.method(GET).path("/status/").header_exists("authorization");
            then.status(200).json_body(json!({"version": "0.0.1"}));
        });
        let unauthenticated = server.mock(|when, then| {
            when.method(GET).path("/status/");
            then.status(200).json_body(json!({"version": "1.0.0"}));
        });

        let config = ClientConfig::new(server.base_url()).with_token("abc");
        let client = ApiClient::connect(config).await.unwrap();
        assert_eq!(client.api_version(), Some("1.0.0"));
        leaked_auth.assert_hits(0);
        unauthenticated.assert();
    }

    #[tokio::test]
    async fn debug_output_redacts_the_token() {
        let config = ClientConfig::new("http://127.0.0.1:1").with_token("secret-token");
        let client = ApiClient::connect(config).await.unwrap();
        let rendered = format!("{client:?}");
        assert!(rendered.contains("127.0.0.1"), "{rendered}");
        assert!(!rendered.contains("secret-token"), "{rendered}");
    }

    #[tokio::test]
    async fn acquire_token_swaps_the_attached_header() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/");
            then.status(200);
        });
        server.mock(|when, then| {
            when.method(POST).path("/token");
            then.status(200).json_body(json!({"access_token": "fresh"}));
        });
        let authed = server.mock(|when, then| {
            when.method(GET)
                .path("/organization")
                .header("authorization", "Bearer fresh");
            then.status(200).json_body(json!([]));
        });

        let mut client = ApiClient::connect(ClientConfig::new(server.base_url()))
            .await
            .unwrap();
        assert_eq!(client.token(), None);

        client.acquire_token("user", "pass").await.unwrap();
        assert_eq!(client.token(), Some("fresh"));

        client.list_organizations(None, "global").await.unwrap();
        authed.assert();
    }

    #[tokio::test]
    async fn extra_headers_are_sent_on_requests() {
        let server = MockServer::start_async().await;
        let liveness = server.mock(|when, then| {
            when.method(GET).path("/").header("x-invocation-source", "tests");
            then.status(200);
        });

        let mut config = ClientConfig::new(server.base_url());
        config
            .extra_headers
            .insert("x-invocation-source".to_string(), "tests".to_string());
        ApiClient::connect(config).await.unwrap();
        liveness.assert();
    }
}
