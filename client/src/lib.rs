//! Client library for the NDP EP data-catalog API.
//!
//! This crate provides:
//! - session bootstrap with token, credential, or anonymous initialization
//! - best-effort version-skew detection against a pinned minimum API version
//! - dataset, organization, and resource registration and management
//! - dataset and resource search
//! - S3 bucket/object passthrough and Pelican federation browsing
//!
//! ## Usage
//!
//! ```ignore
//! use ndp_ep::{ApiClient, ClientConfig};
//!
//! let config = ClientConfig::new("https://api.example.com").with_token(token);
//! let client = ApiClient::connect(config).await?;
//!
//! if let Some(warning) = client.version_warning() {
//!     eprintln!("{warning}");
//! }
//!
//! let organizations = client.list_organizations(None, "global").await?;
//! ```
//!
//! Every operation is one request/response round trip; there is no retry or
//! backoff layer. A client is cheap to construct, and token rotation takes
//! `&mut self`, so consumers needing concurrency hold one client per caller.

mod catalog;
mod client;
mod config;
mod error;
mod pelican;
mod s3;
mod status;
mod types;
mod version;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::ClientError;
pub use types::{
    DatasetRequest,
    DatasetUpdate,
    Extras,
    KafkaDetails,
    KafkaTopicRequest,
    KafkaTopicUpdate,
    OrganizationRequest,
    PelicanImportRequest,
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
pub use version::{
    is_version_compatible,
    Version,
    VersionParseError,
    VersionWarning,
    MINIMUM_API_VERSION,
};
