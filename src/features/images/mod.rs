pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod store;
pub mod workers;

pub use routes::admin_routes;
pub use services::{ImageCleanupService, ImageReconciler, ImageService, UrlExtractor};
pub use store::{ImageRecordStore, PgImageRecordStore};
pub use workers::CleanupWorker;
