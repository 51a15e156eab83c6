//! Catalog operations: organizations, datasets, typed resource
//! registrations, resource management, and search.
//!
//! Every method is one request/response round trip. The `server` argument
//! selects the backing catalog instance (`"local"`, `"global"` or
//! `"pre_ckan"`) and is passed through as a query parameter.

use tracing::debug;

use crate::client::ApiClient;
use crate::error::{ClientError, ResponseExt};
use crate::types::{
    DatasetRequest,
    DatasetUpdate,
    KafkaTopicRequest,
    KafkaTopicUpdate,
    OrganizationRequest,
    ResourcePatch,
    ResourceSearchQuery,
    ResourceSearchResults,
    S3ResourceRequest,
    S3ResourceUpdate,
    SearchRequest,
    ServiceRequest,
    ServiceUpdate,
    UrlResourceRequest,
    UrlResourceUpdate,
};

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

impl ApiClient {
    /// List organization names, optionally filtered by `name`.
    pub async fn list_organizations(
        &self,
        name: Option<&str>,
        server: &str,
    ) -> Result<Vec<String>, ClientError> {
        let mut query = vec![("server", server.to_string())];
        if let Some(name) = name {
            query.push(("name", name.to_string()));
        }
        let response = self
            .http()
            .get(self.endpoint("/organization"))
            .query(&query)
            .send()
            .await?;
        response.api_result("listing organizations").await
    }

    /// Register a new organization.
    pub async fn register_organization(
        &self,
        organization: &OrganizationRequest,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/organization"))
            .query(&[("server", server)])
            .json(organization)
            .send()
            .await?;
        response.api_result("creating organization").await
    }

    /// Delete an organization by name.
    pub async fn delete_organization(
        &self,
        organization_name: &str,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint(&format!("/organization/{organization_name}")))
            .query(&[("server", server)])
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting organization",
                format!("organization '{organization_name}' not found"),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// General datasets
// ---------------------------------------------------------------------------

impl ApiClient {
    /// Register a new general dataset.
    pub async fn register_general_dataset(
        &self,
        dataset: &DatasetRequest,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/dataset"))
            .query(&[("server", server)])
            .json(dataset)
            .send()
            .await?;
        response.api_result("creating dataset").await
    }

    /// Replace an existing dataset.
    pub async fn update_general_dataset(
        &self,
        dataset_id: &str,
        dataset: &DatasetUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .put(self.endpoint(&format!("/dataset/{dataset_id}")))
            .query(&[("server", server)])
            .json(dataset)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating dataset",
                format!("dataset '{dataset_id}' not found"),
            )
            .await
    }

    /// Partially update a dataset, leaving unspecified fields unchanged.
    pub async fn patch_general_dataset(
        &self,
        dataset_id: &str,
        dataset: &DatasetUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .patch(self.endpoint(&format!("/dataset/{dataset_id}")))
            .query(&[("server", server)])
            .json(dataset)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating dataset",
                format!("dataset '{dataset_id}' not found"),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Typed resource registrations
// ---------------------------------------------------------------------------

impl ApiClient {
    /// Register a URL resource.
    pub async fn register_url(
        &self,
        resource: &UrlResourceRequest,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/url"))
            .query(&[("server", server)])
            .json(resource)
            .send()
            .await?;
        response.api_result("creating URL resource").await
    }

    /// Replace an existing URL resource.
    pub async fn update_url_resource(
        &self,
        resource_id: &str,
        resource: &UrlResourceUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .put(self.endpoint(&format!("/url/{resource_id}")))
            .query(&[("server", server)])
            .json(resource)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating URL resource",
                format!("URL resource '{resource_id}' not found"),
            )
            .await
    }

    /// Register an S3 link.
    pub async fn register_s3_link(
        &self,
        resource: &S3ResourceRequest,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/s3"))
            .query(&[("server", server)])
            .json(resource)
            .send()
            .await?;
        response.api_result("creating S3 resource").await
    }

    /// Replace an existing S3 resource.
    pub async fn update_s3_resource(
        &self,
        resource_id: &str,
        resource: &S3ResourceUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .put(self.endpoint(&format!("/s3/{resource_id}")))
            .query(&[("server", server)])
            .json(resource)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating S3 resource",
                format!("S3 resource '{resource_id}' not found"),
            )
            .await
    }

    /// Partially update an S3 resource.
    pub async fn patch_s3_resource(
        &self,
        resource_id: &str,
        resource: &S3ResourceUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .patch(self.endpoint(&format!("/s3/{resource_id}")))
            .query(&[("server", server)])
            .json(resource)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating S3 resource",
                format!("S3 resource '{resource_id}' not found"),
            )
            .await
    }

    /// Register a Kafka topic dataset.
    pub async fn register_kafka_topic(
        &self,
        topic: &KafkaTopicRequest,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/kafka"))
            .query(&[("server", server)])
            .json(topic)
            .send()
            .await?;
        response.api_result("creating Kafka dataset").await
    }

    /// Replace an existing Kafka topic dataset.
    pub async fn update_kafka_topic(
        &self,
        dataset_id: &str,
        topic: &KafkaTopicUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .put(self.endpoint(&format!("/kafka/{dataset_id}")))
            .query(&[("server", server)])
            .json(topic)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating Kafka dataset",
                format!("Kafka dataset '{dataset_id}' not found"),
            )
            .await
    }

    /// Register a service. `owner_org` must be the `services` organization.
    pub async fn register_service(
        &self,
        service: &ServiceRequest,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/services"))
            .query(&[("server", server)])
            .json(service)
            .send()
            .await?;
        response.api_result("creating service").await
    }

    /// Replace an existing service.
    pub async fn update_service(
        &self,
        service_id: &str,
        service: &ServiceUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .put(self.endpoint(&format!("/services/{service_id}")))
            .query(&[("server", server)])
            .json(service)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating service",
                format!("service '{service_id}' not found"),
            )
            .await
    }

    /// Partially update a service.
    pub async fn patch_service(
        &self,
        service_id: &str,
        service: &ServiceUpdate,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .patch(self.endpoint(&format!("/services/{service_id}")))
            .query(&[("server", server)])
            .json(service)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating service",
                format!("service '{service_id}' not found"),
            )
            .await
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

impl ApiClient {
    /// Get a resource by ID, without needing the parent dataset ID.
    pub async fn get_resource(
        &self,
        resource_id: &str,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .get(self.endpoint(&format!("/resource/{resource_id}")))
            .query(&[("server", server)])
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "getting resource",
                format!("resource '{resource_id}' not found"),
            )
            .await
    }

    /// Partially update a resource by ID.
    pub async fn patch_resource(
        &self,
        resource_id: &str,
        patch: &ResourcePatch,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .patch(self.endpoint(&format!("/resource/{resource_id}")))
            .query(&[("server", server)])
            .json(patch)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating resource",
                format!("resource '{resource_id}' not found"),
            )
            .await
    }

    /// Delete a resource by ID. The parent dataset and its other resources
    /// remain intact.
    pub async fn delete_resource(
        &self,
        resource_id: &str,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint(&format!("/resource/{resource_id}")))
            .query(&[("server", server)])
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting resource",
                format!("resource '{resource_id}' not found"),
            )
            .await
    }

    /// Delete a resource by ID via the legacy query-parameter endpoint.
    pub async fn delete_resource_by_id(
        &self,
        resource_id: &str,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint("/resource"))
            .query(&[("resource_id", resource_id), ("server", server)])
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting resource",
                format!("resource '{resource_id}' not found"),
            )
            .await
    }

    /// Delete a resource by name via the legacy endpoint.
    pub async fn delete_resource_by_name(
        &self,
        resource_name: &str,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint(&format!("/resource/{resource_name}")))
            .query(&[("server", server)])
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting resource",
                format!("resource '{resource_name}' not found"),
            )
            .await
    }

    /// Partially update a resource within a dataset.
    pub async fn patch_dataset_resource(
        &self,
        dataset_id: &str,
        resource_id: &str,
        patch: &ResourcePatch,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .patch(self.endpoint(&format!("/dataset/{dataset_id}/resource/{resource_id}")))
            .query(&[("server", server)])
            .json(patch)
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "updating resource",
                format!("resource '{resource_id}' not found in dataset '{dataset_id}'"),
            )
            .await
    }

    /// Delete a resource from a dataset; the dataset itself is unchanged.
    pub async fn delete_dataset_resource(
        &self,
        dataset_id: &str,
        resource_id: &str,
        server: &str,
    ) -> Result<serde_json::Value, ClientError> {
        let response = self
            .http()
            .delete(self.endpoint(&format!("/dataset/{dataset_id}/resource/{resource_id}")))
            .query(&[("server", server)])
            .send()
            .await?;
        response
            .api_result_or_not_found(
                "deleting resource",
                format!("resource '{resource_id}' not found in dataset '{dataset_id}'"),
            )
            .await
    }

    /// Search resources across all datasets.
    pub async fn search_resources(
        &self,
        query: &ResourceSearchQuery,
    ) -> Result<ResourceSearchResults, ClientError> {
        let response = self
            .http()
            .get(self.endpoint("/resources/search"))
            .query(query)
            .send()
            .await?;
        response.api_result("searching resources").await
    }
}

// ---------------------------------------------------------------------------
// Dataset search
// ---------------------------------------------------------------------------

impl ApiClient {
    /// Search datasets by terms, with optional per-term key restrictions.
    ///
    /// When `keys` is given it must have exactly one entry per term; a `None`
    /// entry means a global match for the corresponding term and is sent as
    /// the literal string `"null"`.
    pub async fn search_datasets(
        &self,
        terms: &[&str],
        keys: Option<&[Option<&str>]>,
        server: &str,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        if let Some(keys) = keys {
            if keys.len() != terms.len() {
                return Err(ClientError::Configuration(
                    "the number of terms must match the number of keys, or keys must be omitted"
                        .to_string(),
                ));
            }
        }

        let mut query: Vec<(&str, String)> = terms
            .iter()
            .map(|term| ("terms", term.to_string()))
            .collect();
        if let Some(keys) = keys {
            query.extend(
                keys.iter()
                    .map(|key| ("keys", key.unwrap_or("null").to_string())),
            );
        }
        query.push(("server", server.to_string()));

        debug!(n_terms = terms.len(), server, "searching datasets");
        let response = self
            .http()
            .get(self.endpoint("/search"))
            .query(&query)
            .send()
            .await?;
        response.api_result("searching for datasets").await
    }

    /// Advanced search via `POST /search`.
    pub async fn advanced_search(
        &self,
        search: &SearchRequest,
    ) -> Result<Vec<serde_json::Value>, ClientError> {
        let response = self
            .http()
            .post(self.endpoint("/search"))
            .json(search)
            .send()
            .await?;
        response.api_result("advanced search").await
    }
}
