#[cfg(test)]
use std::collections::HashSet;
#[cfg(test)]
use std::sync::Mutex;

#[cfg(test)]
use async_trait::async_trait;

#[cfg(test)]
use crate::core::error::AppError;
#[cfg(test)]
use crate::modules::storage::{CdnGateway, CdnUpload};

/// Scripted CDN gateway for lifecycle tests: records calls and fails
/// deletes for file ids registered via `fail_on`.
#[cfg(test)]
#[derive(Default)]
pub struct FakeCdn {
    base_url: String,
    failing: Mutex<HashSet<String>>,
    deleted: Mutex<Vec<String>>,
    uploaded: Mutex<Vec<String>>,
}

#[cfg(test)]
impl FakeCdn {
    pub fn new() -> Self {
        Self {
            base_url: "https://cdn.example".to_string(),
            ..Default::default()
        }
    }

    pub fn fail_on(&self, remote_file_id: &str) {
        self.failing
            .lock()
            .unwrap()
            .insert(remote_file_id.to_string());
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }

    pub fn uploaded(&self) -> Vec<String> {
        self.uploaded.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl CdnGateway for FakeCdn {
    async fn upload(
        &self,
        _data: Vec<u8>,
        file_name: &str,
        _content_type: &str,
        folder: &str,
    ) -> Result<CdnUpload, AppError> {
        let remote_file_id = format!("{}/{}", folder, file_name);
        self.uploaded.lock().unwrap().push(remote_file_id.clone());
        Ok(CdnUpload {
            remote_url: format!("{}/{}", self.base_url, remote_file_id),
            remote_file_id,
        })
    }

    async fn delete(&self, remote_file_id: &str) -> Result<(), AppError> {
        if self.failing.lock().unwrap().contains(remote_file_id) {
            return Err(AppError::ExternalService(format!(
                "CDN refused to delete '{}'",
                remote_file_id
            )));
        }
        self.deleted.lock().unwrap().push(remote_file_id.to_string());
        Ok(())
    }
}
