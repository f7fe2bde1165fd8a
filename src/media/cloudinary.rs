use super::{derive_cdn_url, CdnUrlOptions, ImageFile, MediaService, UploadProfile};
use crate::models::StoredImage;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use serde::Deserialize;
use sha1::{Digest, Sha1};
use std::collections::BTreeMap;
use std::time::Duration;

const DEFAULT_API_BASE_URL: &str = "https://api.cloudinary.com";

#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    width: Option<u32>,
    #[serde(default)]
    height: Option<u32>,
    #[serde(default)]
    bytes: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Sign upload parameters: sorted `key=value` pairs joined with `&`, the API
/// secret appended, SHA-1 as lowercase hex.
pub fn sign_params(params: &BTreeMap<&str, String>, api_secret: &str) -> String {
    let payload = params
        .iter()
        .map(|(key, value)| format!("{}={}", key, value))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha1::new();
    hasher.update(payload.as_bytes());
    hasher.update(api_secret.as_bytes());
    format!("{:x}", hasher.finalize())
}

pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: String,
    profile: UploadProfile,
    base_url: String,
}

impl CloudinaryClient {
    pub fn new(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        profile: UploadProfile,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self::new_with_client(
            cloud_name, api_key, api_secret, profile, client,
        ))
    }

    pub fn new_with_client(
        cloud_name: String,
        api_key: String,
        api_secret: String,
        profile: UploadProfile,
        client: Client,
    ) -> Self {
        Self {
            client,
            cloud_name,
            api_key,
            api_secret,
            profile,
            base_url: DEFAULT_API_BASE_URL.to_string(),
        }
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: String) -> Self {
        self.base_url = base_url;
        self
    }

    fn upload_url(&self) -> String {
        format!("{}/v1_1/{}/image/upload", self.base_url, self.cloud_name)
    }

    fn signed_params(&self, timestamp: i64) -> BTreeMap<&'static str, String> {
        let mut params = BTreeMap::new();
        params.insert("folder", self.profile.folder.clone());
        params.insert("format", self.profile.format.clone());
        params.insert("timestamp", timestamp.to_string());
        params.insert("transformation", self.profile.transformation());

        let signature = sign_params(&params, &self.api_secret);
        params.insert("api_key", self.api_key.clone());
        params.insert("signature", signature);
        params
    }
}

#[async_trait]
impl MediaService for CloudinaryClient {
    async fn upload_image(&self, image: &ImageFile) -> Result<StoredImage> {
        let timestamp = chrono::Utc::now().timestamp();

        let file = Part::stream_with_length(image.data.clone(), image.data.len() as u64)
            .file_name(
                image
                    .file_name
                    .clone()
                    .unwrap_or_else(|| "upload".to_string()),
            )
            .mime_str(&image.content_type)?;

        let form = self
            .signed_params(timestamp)
            .into_iter()
            .fold(Form::new(), |form, (key, value)| form.text(key, value))
            .part("file", file);

        tracing::debug!(
            "Uploading {} bytes to media folder '{}'",
            image.data.len(),
            self.profile.folder
        );

        let response = self
            .client
            .post(self.upload_url())
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to send upload request to media service: {}", e);
                e
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            let message = serde_json::from_str::<ErrorResponse>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            tracing::error!("Media service error (status {}): {}", status, message);
            return Err(Error::Media(format!(
                "Upload failed (status {}): {}",
                status, message
            )));
        }

        let body = response.text().await?;
        let uploaded: UploadResponse = serde_json::from_str(&body).map_err(|e| {
            tracing::error!("Failed to parse media service response: {}\nBody: {}", e, body);
            Error::Media(format!("Failed to parse upload response: {}", e))
        })?;

        tracing::info!(
            public_id = %uploaded.public_id,
            format = uploaded.format.as_deref().unwrap_or("unknown"),
            width = uploaded.width.unwrap_or_default(),
            height = uploaded.height.unwrap_or_default(),
            bytes = uploaded.bytes.unwrap_or_default(),
            "Uploaded product image"
        );

        Ok(StoredImage {
            public_id: uploaded.public_id,
            url: uploaded.secure_url,
        })
    }

    fn cdn_url(&self, public_id: &str) -> String {
        derive_cdn_url(public_id, &CdnUrlOptions::auto(self.cloud_name.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Bytes;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_image() -> ImageFile {
        ImageFile {
            file_name: Some("honey.gif".to_string()),
            content_type: "image/gif".to_string(),
            data: Bytes::from_static(b"GIF89a-test-image"),
        }
    }

    fn test_client(server: &MockServer) -> CloudinaryClient {
        CloudinaryClient::new(
            "demo".to_string(),
            "test-key".to_string(),
            "test-secret".to_string(),
            UploadProfile::default(),
        )
        .unwrap()
        .with_base_url(server.uri())
    }

    #[test]
    fn test_sign_params_matches_documented_example() {
        let mut params = BTreeMap::new();
        params.insert("timestamp", "1315060510".to_string());
        params.insert("public_id", "sample_image".to_string());
        params.insert("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string());

        assert_eq!(
            sign_params(&params, "abcd"),
            "bfd09f95f331f558cbd1320e67aa8d488770583e"
        );
    }

    #[test]
    fn test_signed_params_cover_upload_profile() {
        let client = CloudinaryClient::new(
            "demo".to_string(),
            "test-key".to_string(),
            "secret".to_string(),
            UploadProfile::default(),
        )
        .unwrap();

        let params = client.signed_params(1_700_000_000);
        assert_eq!(params["folder"], "products");
        assert_eq!(params["format"], "webp");
        assert_eq!(params["transformation"], "c_limit,h_800,q_auto,w_800");
        assert_eq!(params["api_key"], "test-key");
        assert_eq!(
            params["signature"],
            "c5352f05f27da797bfb2a0e0a7075aa901564af7"
        );
    }

    #[tokio::test]
    async fn test_upload_image_parses_response() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .and(body_string_contains("name=\"signature\""))
            .and(body_string_contains("c_limit,h_800,q_auto,w_800"))
            .and(body_string_contains("filename=\"honey.gif\""))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "public_id": "products/k3j4h5",
                "version": 1712345678,
                "format": "webp",
                "width": 800,
                "height": 600,
                "bytes": 40213,
                "url": "http://res.cloudinary.com/demo/image/upload/v1712345678/products/k3j4h5.webp",
                "secure_url": "https://res.cloudinary.com/demo/image/upload/v1712345678/products/k3j4h5.webp"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let stored = test_client(&server)
            .upload_image(&test_image())
            .await
            .unwrap();

        assert_eq!(stored.public_id, "products/k3j4h5");
        assert_eq!(
            stored.url,
            "https://res.cloudinary.com/demo/image/upload/v1712345678/products/k3j4h5.webp"
        );
    }

    #[tokio::test]
    async fn test_upload_error_returns_media_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .respond_with(ResponseTemplate::new(401).set_body_json(serde_json::json!({
                "error": { "message": "Invalid Signature" }
            })))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .upload_image(&test_image())
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Media(_)));
        assert!(err.to_string().contains("Invalid Signature"));
    }

    #[tokio::test]
    async fn test_malformed_response_returns_media_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/v1_1/demo/image/upload"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server)
            .upload_image(&test_image())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Media(_)));
    }

    #[test]
    fn test_cdn_url_uses_cloud_name() {
        let client = CloudinaryClient::new(
            "shop-cloud".to_string(),
            "key".to_string(),
            "secret".to_string(),
            UploadProfile::default(),
        )
        .unwrap();

        assert_eq!(
            client.cdn_url("products/abc"),
            "https://res.cloudinary.com/shop-cloud/image/upload/f_auto,q_auto/v1/products/abc"
        );
    }
}
