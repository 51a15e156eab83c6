//! Request and response models for the catalog API.
//!
//! Registration payloads are typed after the API's documented schemas;
//! open-ended metadata (`extras`, `mapping`, `processing`) stays a JSON map.
//! Responses that the API documents only loosely are returned as raw
//! `serde_json::Value` by the operations that produce them.

use serde::{Deserialize, Serialize};

/// Open-ended key/value metadata attached to datasets and resources.
pub type Extras = serde_json::Map<String, serde_json::Value>;

// ---------------------------------------------------------------------------
// Organizations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationRequest {
    /// Unique name of the organization.
    pub name: String,
    /// Display title of the organization.
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

// ---------------------------------------------------------------------------
// General datasets
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatasetRequest {
    /// Unique name for the dataset (lowercase, no spaces).
    pub name: String,
    /// Human-readable title.
    pub title: String,
    /// Organization ID that owns this dataset.
    pub owner_org: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Partial dataset payload for `PUT`/`PATCH` updates; only the provided
/// fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resources: Option<Vec<serde_json::Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub private: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

// ---------------------------------------------------------------------------
// Typed resource registrations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UrlResourceRequest {
    pub resource_name: String,
    pub resource_title: String,
    pub owner_org: String,
    pub resource_url: String,
    /// File type: stream, CSV, TXT, JSON, NetCDF.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<Extras>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UrlResourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<Extras>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3ResourceRequest {
    pub resource_name: String,
    pub resource_title: String,
    pub owner_org: String,
    /// S3 URL of the resource.
    pub resource_s3: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct S3ResourceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_s3: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KafkaTopicRequest {
    pub dataset_name: String,
    pub dataset_title: String,
    pub owner_org: String,
    pub kafka_topic: String,
    pub kafka_host: String,
    pub kafka_port: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<Extras>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KafkaTopicUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_topic: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_host: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kafka_port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mapping: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub processing: Option<Extras>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceRequest {
    pub service_name: String,
    pub service_title: String,
    /// Must be the `services` organization.
    pub owner_org: String,
    pub service_url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServiceUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extras: Option<Extras>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub health_check_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub documentation_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Partial resource payload; only the provided fields change.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourcePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Format type: CSV, JSON, PDF, etc.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

/// Query for `GET /resources/search`; serialized as query parameters.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceSearchQuery {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Maximum results to return (server caps at 1000).
    pub limit: u32,
    /// Number of results to skip for pagination.
    pub offset: u32,
    pub server: String,
}

impl Default for ResourceSearchQuery {
    fn default() -> Self {
        ResourceSearchQuery {
            q: None,
            name: None,
            url: None,
            format: None,
            description: None,
            limit: 100,
            offset: 0,
            server: "local".to_string(),
        }
    }
}

/// Results of a resource search: resources plus parent dataset context.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceSearchResults {
    pub count: u64,
    pub results: Vec<serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Search
// ---------------------------------------------------------------------------

/// Body for `POST /search` (the API's `SearchRequest` model).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SearchRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner_org: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dataset_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_term: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter_list: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<String>,
}

// ---------------------------------------------------------------------------
// Pelican federation
// ---------------------------------------------------------------------------

/// Body for `POST /pelican/import-metadata`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PelicanImportRequest {
    /// Full Pelican URL, e.g. `pelican://osg-htc.org/ospool/data.csv`.
    pub pelican_url: String,
    /// Dataset to add the resource to.
    pub package_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_description: Option<String>,
}

// ---------------------------------------------------------------------------
// Status
// ---------------------------------------------------------------------------

/// Kafka connection details from `GET /status/kafka-details`.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaDetails {
    pub kafka_host: String,
    pub kafka_port: u16,
    pub kafka_connection: bool,
    /// Any additional fields the server reports.
    #[serde(flatten)]
    pub extra: Extras,
}
