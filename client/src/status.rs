//! System status, metrics, connection details, and user identity.

use http::StatusCode;

use crate::client::ApiClient;
use crate::error::{error_detail, ClientError, ResponseExt};
use crate::types::KafkaDetails;

impl ApiClient {
    /// Check whether the backing catalog and auth servers are reachable.
    pub async fn get_system_status(&self) -> Result<serde_json::Value, ClientError> {
        let response = self.http().get(self.endpoint("/status/")).send().await?;
        response.api_result("fetching system status").await
    }

    /// Detailed system metrics and per-service status.
    pub async fn get_system_metrics(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/status/metrics"))
            .send()
            .await?;
        response.api_result("fetching system metrics").await
    }

    /// Kafka connection details for the platform's message bus.
    pub async fn get_kafka_details(&self) -> Result<KafkaDetails, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/status/kafka-details"))
            .send()
            .await?;
        response.api_result("fetching Kafka details").await
    }

    /// Where the platform's JupyterHub is accessible.
    pub async fn get_jupyter_details(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/status/jupyter"))
            .send()
            .await?;
        response.api_result("fetching Jupyter details").await
    }

    /// Details about the currently authenticated user. Requires a valid
    /// bearer token.
    pub async fn get_user_info(&self) -> Result<serde_json::Value, ClientError> {
        let response = self.http().get(self.endpoint("/user/info")).send().await?;
        if response.status().is_success() {
            return Ok(response.json().await?);
        }

        let (status, detail) = error_detail(response).await;
        let detail = match status {
            StatusCode::UNAUTHORIZED if detail.is_empty() => {
                "not authenticated: invalid or missing token".to_string()
            },
            StatusCode::UNAUTHORIZED => format!("not authenticated: {detail}"),
            StatusCode::FORBIDDEN if detail.is_empty() => {
                "forbidden: insufficient permissions".to_string()
            },
            StatusCode::FORBIDDEN => format!("forbidden: {detail}"),
            StatusCode::BAD_GATEWAY => format!("authentication service unavailable: {detail}"),
            _ => detail,
        };
        Err(ClientError::Api {
            context: "fetching user info",
            status,
            detail,
        })
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;
    use crate::config::ClientConfig;

    async fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::connect(ClientConfig::new(server.base_url()).with_token("test-token"))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn kafka_details_deserialize_with_extra_fields() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/status/kafka-details");
            then.status(200).json_body(json!({
                "kafka_host": "kafka.example.com",
                "kafka_port": 9092,
                "kafka_connection": true,
                "cluster_id": "abc123"
            }));
        });

        let client = client_for(&server).await;
        let details = client.get_kafka_details().await.unwrap();
        assert_eq!(details.kafka_host, "kafka.example.com");
        assert_eq!(details.kafka_port, 9092);
        assert!(details.kafka_connection);
        assert_eq!(details.extra["cluster_id"], "abc123");
    }

    #[tokio::test]
    async fn system_status_is_fetched_with_the_session_headers() {
        let server = MockServer::start_async().await;
        let mock = server.mock(|when, then| {
            when.method(GET)
                .path("/status/")
                .header("authorization", "Bearer test-token");
            then.status(200).json_body(json!({"ckan": "ok", "keycloak": "ok"}));
        });

        let client = client_for(&server).await;
        let status = client.get_system_status().await.unwrap();
        assert_eq!(status["ckan"], "ok");
        // One authenticated hit from this call; the construction-time version
        // probe goes out without the bearer header and does not match.
        mock.assert();
    }

    #[tokio::test]
    async fn user_info_maps_auth_failures_by_status() {
        let cases = [
            (401, Some(json!({"detail": "token expired"})), "not authenticated: token expired"),
            (403, None, "forbidden: insufficient permissions"),
            (502, Some(json!({"detail": "keycloak down"})), "authentication service unavailable: keycloak down"),
        ];
        for (status, body, expected) in cases {
            let server = MockServer::start_async().await;
            server.mock(|when, then| {
                when.method(GET).path("/user/info");
                match body {
                    Some(body) => then.status(status).json_body(body),
                    None => then.status(status),
                };
            });

            let client = client_for(&server).await;
            let err = client.get_user_info().await.unwrap_err();
            assert!(err.to_string().contains(expected), "{err}");
        }
    }

    #[tokio::test]
    async fn user_info_returns_the_profile() {
        let server = MockServer::start_async().await;
        server.mock(|when, then| {
            when.method(GET).path("/user/info");
            then.status(200).json_body(json!({
                "username": "john.doe",
                "email": "john@example.com",
                "roles": ["user"]
            }));
        });

        let client = client_for(&server).await;
        let user = client.get_user_info().await.unwrap();
        assert_eq!(user["username"], "john.doe");
    }
}
