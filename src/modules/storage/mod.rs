//! Storage module for image hosting
//!
//! Provides the gateway to the S3-compatible image CDN. The rest of the
//! application consumes it through the narrow [`CdnGateway`] trait and treats
//! remote URLs as opaque unique strings.

mod cdn_client;

use async_trait::async_trait;

use crate::core::error::AppError;

pub use cdn_client::CdnClient;

/// Result of a successful CDN upload
#[derive(Debug, Clone)]
pub struct CdnUpload {
    /// Identifier of the object on the CDN (used for deletes)
    pub remote_file_id: String,
    /// Publicly served URL of the object
    pub remote_url: String,
}

/// The two CDN primitives the image lifecycle subsystem consumes.
#[async_trait]
pub trait CdnGateway: Send + Sync {
    /// Upload image bytes under the given folder, returning the CDN identifiers.
    async fn upload(
        &self,
        data: Vec<u8>,
        file_name: &str,
        content_type: &str,
        folder: &str,
    ) -> Result<CdnUpload, AppError>;

    /// Delete an object from the CDN by its file id.
    async fn delete(&self, remote_file_id: &str) -> Result<(), AppError>;
}
