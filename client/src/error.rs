//! Error handling for catalog API operations.

use http::StatusCode;
use serde::Deserialize;
use thiserror::Error;

/// Common error type for all client operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Invalid construction arguments or invalid client-side inputs.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The API endpoint could not be reached, or the liveness probe failed.
    #[error("failed to reach the API at {url}; check that the URL is correct and reachable")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Credential exchange was rejected or returned no usable token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The API rejected an operation. `detail` is the structured error detail
    /// from the response body when present, otherwise the raw body text.
    #[error("{context}: {status}: {detail}")]
    Api {
        context: &'static str,
        status: StatusCode,
        detail: String,
    },

    /// Transport-level failure while performing an operation.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// A token or configured header could not be encoded as an HTTP header.
    #[error("invalid header value: {0}")]
    InvalidHeader(String),
}

/// Error bodies follow the FastAPI convention of a top-level `detail` field.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: serde_json::Value,
}

/// Extract `(status, detail)` from an error response, consuming it.
///
/// Prefers the structured `detail` field; falls back to the raw body text
/// when the body is not JSON or carries no detail.
pub(crate) async fn error_detail(response: reqwest::Response) -> (StatusCode, String) {
    let status = response.status();
    let text = response.text().await.unwrap_or_default();
    let detail = match serde_json::from_str::<ErrorBody>(&text) {
        Ok(ErrorBody {
            detail: serde_json::Value::String(detail),
        }) => detail,
        Ok(ErrorBody { detail }) => detail.to_string(),
        Err(_) => text,
    };
    (status, detail)
}

/// Extension trait turning a `reqwest::Response` into a typed result.
#[allow(async_fn_in_trait)]
pub(crate) trait ResponseExt: Sized {
    /// Deserialize a 2xx response as `T`, or map the error body into
    /// [`ClientError::Api`] with the given operation context.
    async fn api_result<T: serde::de::DeserializeOwned>(
        self,
        context: &'static str,
    ) -> Result<T, ClientError>;

    /// As [`ResponseExt::api_result`], but replaces the detail of a 404
    /// response with a caller-supplied message naming the missing entity.
    async fn api_result_or_not_found<T: serde::de::DeserializeOwned>(
        self,
        context: &'static str,
        not_found: String,
    ) -> Result<T, ClientError>;
}

impl ResponseExt for reqwest::Response {
    async fn api_result<T: serde::de::DeserializeOwned>(
        self,
        context: &'static str,
    ) -> Result<T, ClientError> {
        if self.status().is_success() {
            return Ok(self.json().await?);
        }
        let (status, detail) = error_detail(self).await;
        Err(ClientError::Api {
            context,
            status,
            detail,
        })
    }

    async fn api_result_or_not_found<T: serde::de::DeserializeOwned>(
        self,
        context: &'static str,
        not_found: String,
    ) -> Result<T, ClientError> {
        if self.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::Api {
                context,
                status: StatusCode::NOT_FOUND,
                detail: not_found,
            });
        }
        self.api_result(context).await
    }
}
