mod cleanup_service;
mod image_service;
mod reconciler_service;
mod url_extractor;

pub use cleanup_service::ImageCleanupService;
pub use image_service::ImageService;
pub use reconciler_service::ImageReconciler;
pub use url_extractor::UrlExtractor;
