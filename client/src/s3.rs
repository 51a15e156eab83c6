//! S3 bucket and object passthrough operations.
//!
//! These endpoints proxy an object store behind the API; the client does not
//! talk to S3 directly.

use bytes::Bytes;
use http::StatusCode;
use reqwest::multipart;

use crate::client::ApiClient;
use crate::error::{ClientError, ResponseExt};
use crate::types::Extras;

impl ApiClient {
    /// List all buckets.
    pub async fn list_buckets(&self) -> Result<Vec<serde_json::Value>, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/s3/buckets/"))
            .send()
            .await?;
        response.api_result("listing S3 buckets").await
    }

    /// Create a bucket. `options` carries additional bucket configuration.
    pub async fn create_bucket(
        &self,
        bucket_name: &str,
        options: Option<Extras>,
    ) -> Result<serde_json::Value, ClientError> {
        let mut body = options.unwrap_or_default();
        body.insert(
            "name".to_string(),
            serde_json::Value::String(bucket_name.to_string()),
        );
        let response = self
            .http()
            .post(self.endpoint("/s3/buckets/"))
            .json(&body)
            .send()
            .await?;
        response.api_result("creating S3 bucket").await
    }

    /// Get information about a bucket.
    pub async fn get_bucket_info(
        &self,
        bucket_name: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint(&format!("/s3/buckets/{bucket_name}")))
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "getting S3 bucket info",
                format!("S3 bucket '{bucket_name}' not found"),
            )
            .await
    }

    /// Delete a bucket.
    pub async fn delete_bucket(&self, bucket_name: &str) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint(&format!("/s3/buckets/{bucket_name}")))
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting S3 bucket",
                format!("S3 bucket '{bucket_name}' not found"),
            )
            .await
    }

    /// List objects in a bucket, optionally filtered by key prefix.
    pub async fn list_objects(
        &self,
        bucket_name: &str,
        prefix: Option<&str>,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        let mut request = self
            .http()
            .get(self.endpoint(&format!("/s3/objects/{bucket_name}")));
        if let Some(prefix) = prefix {
            request = request.query(&[("prefix", prefix)]);
        }
        let response = request.send().await?;
        response.api_result("listing S3 objects").await
    }

    /// Upload an object as a multipart form.
    pub async fn upload_object(
        &self,
        bucket_name: &str,
        object_key: &str,
        data: impl Into<Bytes>,
        content_type: Option<&str>,
    ) -> Result<serde_json::Value, ClientError> {
        let mut part =
            multipart::Part::bytes(data.into().to_vec()).file_name(object_key.to_string());
        if let Some(content_type) = content_type {
            part = part
                .mime_str(content_type)
                .map_err(|err| ClientError::Configuration(format!("invalid content type: {err}")))?;
        }
        let form = multipart::Form::new()
            .text("object_key", object_key.to_string())
            .part("file", part);

        let response = self
            .http()
            .post(self.endpoint(&format!("/s3/objects/{bucket_name}")))
            .multipart(form)
            .send()
            .await?;
        response.api_result("uploading S3 object").await
    }

    /// Download an object's content.
    pub async fn download_object(
        &self,
        bucket_name: &str,
        object_key: &str,
    ) -> Result<Bytes, ClientError> {
        let response = self
            .http()
            .get(self.endpoint(&format!("/s3/objects/{bucket_name}/{object_key}")))
            .send()
            .await?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ClientError::Api {
                context: "downloading S3 object",
                status: StatusCode::NOT_FOUND,
                detail: format!("S3 object '{object_key}' not found in bucket '{bucket_name}'"),
            });
        }
        let response = response.error_for_status()?;
        Ok(response.bytes().await?)
    }

    /// Delete an object.
    pub async fn delete_object(
        &self,
        bucket_name: &str,
        object_key: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint(&format!("/s3/objects/{bucket_name}/{object_key}")))
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting S3 object",
                format!("S3 object '{object_key}' not found in bucket '{bucket_name}'"),
            )
            .await
    }

    /// Get an object's metadata.
    pub async fn get_object_metadata(
        &self,
        bucket_name: &str,
        object_key: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint(&format!("/s3/objects/{bucket_name}/{object_key}/metadata")))
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "getting S3 object metadata",
                format!("S3 object '{object_key}' not found in bucket '{bucket_name}'"),
            )
            .await
    }

    /// Generate a presigned upload URL for an object.
    pub async fn presigned_upload_url(
        &self,
        bucket_name: &str,
        object_key: &str,
        expiration: Option<u64>,
    ) -> Result<serde_json::Value, ClientError> {
        self.presigned_url(bucket_name, object_key, expiration, "presigned-upload")
            .await
    }

    /// Generate a presigned download URL for an object.
    pub async fn presigned_download_url(
        &self,
        bucket_name: &str,
        object_key: &str,
        expiration: Option<u64>,
    ) -> Result<serde_json::Value, ClientError> {
        self.presigned_url(bucket_name, object_key, expiration, "presigned-download")
            .await
    }

    async fn presigned_url(
        &self,
        bucket_name: &str,
        object_key: &str,
        expiration: Option<u64>,
        kind: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let mut body = serde_json::Map::new();
        if let Some(expiration) = expiration {
            body.insert("expiration".to_string(), expiration.into());
        }
        let response = self
            .http()
            .post(self.endpoint(&format!("/s3/objects/{bucket_name}/{object_key}/{kind}")))
            .json(&body)
            .send()
            .await?;
        response.api_result("generating presigned URL").await
    }
}
