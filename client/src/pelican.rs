//! Pelican federation operations: browsing, metadata, downloads, and
//! importing federation files into the local catalog.

use bytes::Bytes;
use futures::Stream;

use crate::client::ApiClient;
use crate::error::{ClientError, ResponseExt};
use crate::types::PelicanImportRequest;

impl ApiClient {
    /// List available Pelican federations.
    pub async fn list_federations(&self) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/pelican/federations"))
            .send()
            .await?;
        response.api_result("listing federations").await
    }

    /// Browse files in a federation namespace.
    pub async fn browse_pelican(
        &self,
        path: &str,
        federation: &str,
        detail: bool,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/pelican/browse"))
            .query(&[
                ("path", path),
                ("federation", federation),
                ("detail", if detail { "true" } else { "false" }),
            ])
            .send()
            .await?;
        response
            .api_result_or_not_found("browsing Pelican", format!("path not found: {path}"))
            .await
    }

    /// Get metadata for a federation file without downloading it.
    pub async fn get_pelican_info(
        &self,
        path: &str,
        federation: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/pelican/info"))
            .query(&[("path", path), ("federation", federation)])
            .send()
            .await?;
        response
            .api_result_or_not_found("getting Pelican info", format!("file not found: {path}"))
            .await
    }

    /// Download a federation file in full.
    pub async fn download_pelican(
        &self,
        path: &str,
        federation: &str,
    ) -> Result<Bytes, ClientError> {
        let response = self.pelican_download_response(path, federation, false).await?;
        Ok(response.bytes().await?)
    }

    /// Download a federation file as a stream of chunks.
    pub async fn download_pelican_stream(
        &self,
        path: &str,
        federation: &str,
    ) -> Result<impl Stream<Item = Result<Bytes, reqwest::Error>>, ClientError> {
        let response = self.pelican_download_response(path, federation, true).await?;
        Ok(response.bytes_stream())
    }

    async fn pelican_download_response(
        &self,
        path: &str,
        federation: &str,
        stream: bool,
    ) -> Result<reqwest::Response, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/pelican/download"))
            .query(&[
                ("path", path),
                ("federation", federation),
                ("stream", if stream { "true" } else { "false" }),
            ])
            .send()
            .await?;
        if !response.status().is_success() {
            let (status, detail) = crate::error::error_detail(response).await;
            return Err(ClientError::Api {
                context: "downloading from Pelican",
                status,
                detail,
            });
        }
        Ok(response)
    }

    /// Import a Pelican file as a resource in the local catalog, so it shows
    /// up in searches alongside local resources.
    pub async fn import_pelican_metadata(
        &self,
        import: &PelicanImportRequest,
    ) -> Result<serde_json::Value, ClientError> {
        if !import.pelican_url.starts_with("pelican://") {
            return Err(ClientError::Configuration(
                "URL must start with pelican://".to_string(),
            ));
        }
        let response = self
            .http()
            .post(self.endpoint("/pelican/import-metadata"))
            .json(import)
            .send()
            .await?;
        response.api_result("importing Pelican metadata").await
    }
}
