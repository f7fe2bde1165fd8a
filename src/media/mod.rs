//! Media service integration for product images
//!
//! Uploads product images to a Cloudinary-compatible media service, which
//! stores them, converts them to a web format and serves them from its CDN.
//! Delivery URLs are derived locally from the stored public id.

pub mod cloudinary;
pub mod mime;
pub mod mock;

pub use cloudinary::CloudinaryClient;
pub use mock::MockMediaService;

use crate::models::StoredImage;
use crate::Result;
use async_trait::async_trait;
use axum::body::Bytes;

/// Host serving delivery URLs for every cloud.
pub const DELIVERY_HOST: &str = "res.cloudinary.com";

/// An image file received from a client, not yet uploaded.
#[derive(Debug, Clone)]
pub struct ImageFile {
    pub file_name: Option<String>,
    pub content_type: String,
    pub data: Bytes,
}

/// Fixed processing applied by the media service on upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadProfile {
    pub folder: String,
    pub format: String,
    pub max_width: u32,
    pub max_height: u32,
    pub crop: String,
    pub quality: String,
}

impl UploadProfile {
    pub fn new(folder: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            format: "webp".to_string(),
            max_width: 800,
            max_height: 800,
            crop: "limit".to_string(),
            quality: "auto".to_string(),
        }
    }

    /// Transformation string, parameters in alphabetical order.
    pub fn transformation(&self) -> String {
        format!(
            "c_{},h_{},q_{},w_{}",
            self.crop, self.max_height, self.quality, self.max_width
        )
    }
}

impl Default for UploadProfile {
    fn default() -> Self {
        Self::new(crate::models::DEFAULT_MEDIA_FOLDER)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdnUrlOptions {
    pub cloud_name: String,
    pub secure: bool,
    pub fetch_format: Option<String>,
    pub quality: Option<String>,
}

impl CdnUrlOptions {
    /// Automatic format negotiation and automatic quality over https.
    pub fn auto(cloud_name: impl Into<String>) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            secure: true,
            fetch_format: Some("auto".to_string()),
            quality: Some("auto".to_string()),
        }
    }
}

fn has_version(public_id: &str) -> bool {
    public_id
        .split_once('/')
        .map(|(head, _)| {
            head.len() > 1 && head.starts_with('v') && head[1..].chars().all(|c| c.is_ascii_digit())
        })
        .unwrap_or(false)
}

/// Build the CDN delivery URL for a stored image.
///
/// Ids inside a folder get the `v1` version component, as the media
/// service's own URL builder does when no version is known.
pub fn derive_cdn_url(public_id: &str, options: &CdnUrlOptions) -> String {
    let scheme = if options.secure { "https" } else { "http" };

    let mut transformation = Vec::new();
    if let Some(format) = &options.fetch_format {
        transformation.push(format!("f_{}", format));
    }
    if let Some(quality) = &options.quality {
        transformation.push(format!("q_{}", quality));
    }

    let mut url = format!(
        "{}://{}/{}/image/upload",
        scheme, DELIVERY_HOST, options.cloud_name
    );
    if !transformation.is_empty() {
        url.push('/');
        url.push_str(&transformation.join(","));
    }
    if public_id.contains('/') && !has_version(public_id) {
        url.push_str("/v1");
    }
    url.push('/');
    url.push_str(public_id);
    url
}

#[async_trait]
pub trait MediaService: Send + Sync {
    /// Upload an image with the service's fixed profile.
    async fn upload_image(&self, image: &ImageFile) -> Result<StoredImage>;

    /// CDN URL for a stored image. Pure; never touches the network.
    fn cdn_url(&self, public_id: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_upload_profile_transformation() {
        let profile = UploadProfile::default();
        assert_eq!(profile.folder, "products");
        assert_eq!(profile.format, "webp");
        assert_eq!(profile.transformation(), "c_limit,h_800,q_auto,w_800");
    }

    #[test]
    fn test_derive_cdn_url_for_folder_id() {
        let url = derive_cdn_url("products/abc123", &CdnUrlOptions::auto("demo"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto/v1/products/abc123"
        );
    }

    #[test]
    fn test_derive_cdn_url_for_root_id() {
        let url = derive_cdn_url("sample", &CdnUrlOptions::auto("demo"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto/sample"
        );
    }

    #[test]
    fn test_derive_cdn_url_keeps_explicit_version() {
        let url = derive_cdn_url("v1712345678/products/abc", &CdnUrlOptions::auto("demo"));
        assert_eq!(
            url,
            "https://res.cloudinary.com/demo/image/upload/f_auto,q_auto/v1712345678/products/abc"
        );
    }

    #[test]
    fn test_derive_cdn_url_without_transformation() {
        let options = CdnUrlOptions {
            cloud_name: "demo".to_string(),
            secure: false,
            fetch_format: None,
            quality: None,
        };
        assert_eq!(
            derive_cdn_url("sample", &options),
            "http://res.cloudinary.com/demo/image/upload/sample"
        );
    }

    #[test]
    fn test_derive_cdn_url_is_deterministic() {
        let options = CdnUrlOptions::auto("demo");
        assert_eq!(
            derive_cdn_url("products/x", &options),
            derive_cdn_url("products/x", &options)
        );
    }
}
