use super::{derive_cdn_url, CdnUrlOptions, ImageFile, MediaService, UploadProfile};
use crate::models::StoredImage;
use crate::{Error, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// In-memory media service. Clones share state, so a clone kept by a test
/// observes uploads made through the app.
///
/// Uploaded bytes are kept for inspection unless `with_retained_files(false)`
/// is set, as it is for a long-running dry-run server.
#[derive(Clone)]
pub struct MockMediaService {
    files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    retain_files: bool,
    cloud_name: String,
    profile: UploadProfile,
    upload_count: Arc<Mutex<usize>>,
    should_fail: Arc<Mutex<bool>>,
}

impl MockMediaService {
    pub fn new() -> Self {
        Self {
            files: Arc::new(Mutex::new(HashMap::new())),
            retain_files: true,
            cloud_name: "mock-cloud".to_string(),
            profile: UploadProfile::default(),
            upload_count: Arc::new(Mutex::new(0)),
            should_fail: Arc::new(Mutex::new(false)),
        }
    }

    pub fn with_cloud_name(mut self, cloud_name: String) -> Self {
        self.cloud_name = cloud_name;
        self
    }

    pub fn with_profile(mut self, profile: UploadProfile) -> Self {
        self.profile = profile;
        self
    }

    pub fn with_retained_files(mut self, retain_files: bool) -> Self {
        self.retain_files = retain_files;
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_upload_count(&self) -> usize {
        *self.upload_count.lock().unwrap()
    }

    pub fn get_files(&self) -> HashMap<String, Vec<u8>> {
        self.files.lock().unwrap().clone()
    }
}

impl Default for MockMediaService {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MediaService for MockMediaService {
    async fn upload_image(&self, image: &ImageFile) -> Result<StoredImage> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Media("Mock upload failure".to_string()));
        }

        *self.upload_count.lock().unwrap() += 1;

        let public_id = format!("{}/{}", self.profile.folder, Uuid::new_v4().simple());
        if self.retain_files {
            self.files
                .lock()
                .unwrap()
                .insert(public_id.clone(), image.data.to_vec());
        }

        let url = format!(
            "https://{}/{}/image/upload/v1/{}.{}",
            super::DELIVERY_HOST,
            self.cloud_name,
            public_id,
            self.profile.format
        );

        Ok(StoredImage { public_id, url })
    }

    fn cdn_url(&self, public_id: &str) -> String {
        derive_cdn_url(public_id, &CdnUrlOptions::auto(self.cloud_name.clone()))
    }
}
