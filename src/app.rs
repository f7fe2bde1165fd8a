//! Application orchestration for creating and listing catalog products.

use crate::api;
use crate::media::{CloudinaryClient, ImageFile, MediaService, MockMediaService, UploadProfile};
use crate::models::{Config, Product};
use crate::store::{MongoProductStore, ProductStore};
use crate::validation::{validate_product, ProductFields};
use crate::{Error, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Coordinates validation, image upload and persistence for products.
pub struct App {
    store: Box<dyn ProductStore>,
    media: Box<dyn MediaService>,
}

/// Injectable service bundle used to construct [`App`] in tests/harnesses.
pub struct AppServices {
    pub store: Box<dyn ProductStore>,
    pub media: Box<dyn MediaService>,
}

impl App {
    /// Build an app from concrete service dependencies.
    pub fn with_services(services: AppServices) -> Self {
        Self {
            store: services.store,
            media: services.media,
        }
    }

    /// Connect to the database and set up the media service from configuration.
    pub async fn new(config: &Config) -> Result<Self> {
        let store = MongoProductStore::connect(&config.mongo_uri, config.mongo_database.as_deref())
            .await?;

        let profile = UploadProfile::new(config.media_folder.clone());
        let media: Box<dyn MediaService> = if config.dry_run {
            info!("DRY_RUN enabled, image uploads are not sent anywhere");
            Box::new(dry_run_media(profile, config.cloudinary_cloud_name.as_deref()))
        } else {
            let credential = |value: &Option<String>, name: &str| {
                value
                    .clone()
                    .ok_or_else(|| Error::Config(format!("{} not set", name)))
            };
            let cloud_name = credential(&config.cloudinary_cloud_name, "CLOUDINARY_CLOUD_NAME")?;
            info!(
                "Media service: cloud '{}', folder '{}'",
                cloud_name, profile.folder
            );
            Box::new(CloudinaryClient::new(
                cloud_name,
                credential(&config.cloudinary_api_key, "CLOUDINARY_API_KEY")?,
                credential(&config.cloudinary_api_secret, "CLOUDINARY_API_SECRET")?,
                profile,
            )?)
        };

        Ok(Self::with_services(AppServices {
            store: Box::new(store),
            media,
        }))
    }

    /// Validate the submitted fields, upload the image, then persist the record.
    ///
    /// Nothing is uploaded when validation fails. A store failure after a
    /// successful upload leaves the remote asset in place.
    pub async fn create_product(&self, fields: &ProductFields, image: ImageFile) -> Result<Product> {
        let draft = validate_product(fields).map_err(|errors| {
            warn!("Product validation failed: {}", errors);
            Error::Validation(errors)
        })?;

        let stored = self.media.upload_image(&image).await?;
        let public_id = stored.public_id.clone();
        info!("Uploaded image {} for product '{}'", public_id, draft.name);

        let product = self
            .store
            .create(draft.with_image(stored))
            .await
            .map_err(|e| {
                error!("Failed to save product, image {} is orphaned: {}", public_id, e);
                e
            })?;
        info!("Created product {} ('{}')", product.id, product.name);

        Ok(self.with_cdn_url(product))
    }

    /// All products, newest first, each carrying a delivery URL.
    pub async fn list_products(&self) -> Result<Vec<Product>> {
        let products = self.store.list_all().await?;
        info!("Listing {} products", products.len());

        Ok(products
            .into_iter()
            .map(|product| self.with_cdn_url(product))
            .collect())
    }

    fn with_cdn_url(&self, product: Product) -> Product {
        let cdn_url = self.media.cdn_url(&product.image.public_id);
        product.with_cdn_url(cdn_url)
    }

    /// Serve the HTTP API until ctrl-c or SIGTERM, then release the store.
    pub async fn serve(self, addr: SocketAddr) -> Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("Listening on {}", listener.local_addr()?);

        let app = Arc::new(self);
        let served = axum::serve(listener, api::router(app.clone()))
            .with_graceful_shutdown(shutdown_signal())
            .await;

        app.store.shutdown().await;
        info!("Server stopped");
        Ok(served?)
    }
}

/// In-memory media service for dry runs. Only ids are issued; image bytes
/// are dropped so a long-running server does not accumulate them.
fn dry_run_media(profile: UploadProfile, cloud_name: Option<&str>) -> MockMediaService {
    let media = MockMediaService::new()
        .with_profile(profile)
        .with_retained_files(false);
    match cloud_name {
        Some(cloud_name) => media.with_cloud_name(cloud_name.to_string()),
        None => media,
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!("Could not listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
