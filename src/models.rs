//! Data models and structures
//!
//! Defines the product record exposed over HTTP, the records handed to the
//! store, and the service configuration loaded from the environment.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Category {
    Jaggery,
    Honey,
    Spices,
    Other,
}

/// Identifiers assigned by the media service to an uploaded image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredImage {
    pub public_id: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductImage {
    pub public_id: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cdn_url: Option<String>,
}

impl From<StoredImage> for ProductImage {
    fn from(image: StoredImage) -> Self {
        Self {
            public_id: image.public_id,
            url: image.url,
            cdn_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    #[serde(rename = "_id")]
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub is_featured: bool,
    pub image: ProductImage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    pub fn with_cdn_url(mut self, cdn_url: String) -> Self {
        self.image.cdn_url = Some(cdn_url);
        self
    }
}

/// A validated product ready to be written, with its image already uploaded.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: Category,
    pub is_featured: bool,
    pub image: StoredImage,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub mongo_uri: String,
    pub mongo_database: Option<String>,
    pub cloudinary_cloud_name: Option<String>,
    pub cloudinary_api_key: Option<String>,
    pub cloudinary_api_secret: Option<String>,
    pub media_folder: String,
    pub host: String,
    pub port: u16,
    pub dry_run: bool,
}

pub const DEFAULT_MEDIA_FOLDER: &str = "products";
pub const DEFAULT_PORT: u16 = 5000;

impl Config {
    pub fn from_env() -> crate::Result<Self> {
        dotenvy::dotenv().ok();

        let dry_run = std::env::var("DRY_RUN")
            .map(|v| v == "true" || v == "1")
            .unwrap_or(false);

        let config = Self {
            mongo_uri: std::env::var("MONGO_URI")
                .map_err(|_| crate::Error::Config("MONGO_URI not set".to_string()))?,
            mongo_database: std::env::var("MONGO_DB_NAME").ok(),
            cloudinary_cloud_name: std::env::var("CLOUDINARY_CLOUD_NAME").ok(),
            cloudinary_api_key: std::env::var("CLOUDINARY_API_KEY").ok(),
            cloudinary_api_secret: std::env::var("CLOUDINARY_API_SECRET").ok(),
            media_folder: std::env::var("CLOUDINARY_FOLDER")
                .unwrap_or_else(|_| DEFAULT_MEDIA_FOLDER.to_string()),
            host: std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: match std::env::var("PORT") {
                Ok(port) => port
                    .parse()
                    .map_err(|e| crate::Error::Config(format!("Invalid PORT '{}': {}", port, e)))?,
                Err(_) => DEFAULT_PORT,
            },
            dry_run,
        };

        config.validate()?;
        Ok(config)
    }

    /// Media credentials are only needed when uploads go to the real service.
    fn validate(&self) -> crate::Result<()> {
        if self.dry_run {
            return Ok(());
        }

        let missing: Vec<&str> = [
            ("CLOUDINARY_CLOUD_NAME", &self.cloudinary_cloud_name),
            ("CLOUDINARY_API_KEY", &self.cloudinary_api_key),
            ("CLOUDINARY_API_SECRET", &self.cloudinary_api_secret),
        ]
        .iter()
        .filter(|(_, value)| value.as_deref().map_or(true, str::is_empty))
        .map(|(name, _)| *name)
        .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(crate::Error::Config(format!(
                "{} not set",
                missing.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;
    use strum::IntoEnumIterator;

    fn test_config() -> Config {
        Config {
            mongo_uri: "mongodb://localhost:27017/shop".to_string(),
            mongo_database: None,
            cloudinary_cloud_name: Some("demo".to_string()),
            cloudinary_api_key: Some("key".to_string()),
            cloudinary_api_secret: Some("secret".to_string()),
            media_folder: DEFAULT_MEDIA_FOLDER.to_string(),
            host: "127.0.0.1".to_string(),
            port: DEFAULT_PORT,
            dry_run: false,
        }
    }

    #[test]
    fn test_category_parsing_is_exact_lowercase() {
        assert_eq!(Category::from_str("honey").unwrap(), Category::Honey);
        assert!(Category::from_str("Honey").is_err());
        assert!(Category::from_str("candles").is_err());

        let names: Vec<String> = Category::iter().map(|c| c.to_string()).collect();
        assert_eq!(names, vec!["jaggery", "honey", "spices", "other"]);
    }

    #[test]
    fn test_product_serialization_uses_api_field_names() {
        let product = Product {
            id: "65a1f0c2e4b0a1b2c3d4e5f6".to_string(),
            name: "Wildflower Honey".to_string(),
            description: "Raw and unfiltered".to_string(),
            price: 12.5,
            category: Category::Honey,
            is_featured: true,
            image: ProductImage {
                public_id: "products/abc".to_string(),
                url: "https://res.cloudinary.com/demo/image/upload/v1/products/abc.webp"
                    .to_string(),
                cdn_url: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let json = serde_json::to_value(&product).unwrap();
        assert_eq!(json["_id"], "65a1f0c2e4b0a1b2c3d4e5f6");
        assert_eq!(json["isFeatured"], true);
        assert_eq!(json["category"], "honey");
        assert_eq!(json["image"]["public_id"], "products/abc");
        assert!(json["image"].get("cdn_url").is_none());
        assert!(json.get("createdAt").is_some());
        assert!(json.get("updatedAt").is_some());

        let with_cdn = product.with_cdn_url("https://cdn/abc".to_string());
        let json = serde_json::to_value(&with_cdn).unwrap();
        assert_eq!(json["image"]["cdn_url"], "https://cdn/abc");
    }

    #[test]
    fn test_config_requires_media_credentials() {
        let mut config = test_config();
        assert!(config.validate().is_ok());

        config.cloudinary_api_secret = None;
        config.cloudinary_cloud_name = Some(String::new());
        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("CLOUDINARY_CLOUD_NAME"));
        assert!(err.contains("CLOUDINARY_API_SECRET"));
        assert!(!err.contains("CLOUDINARY_API_KEY"));
    }

    #[test]
    fn test_config_dry_run_skips_media_credentials() {
        let mut config = test_config();
        config.cloudinary_api_key = None;
        config.dry_run = true;
        assert!(config.validate().is_ok());
    }
}
