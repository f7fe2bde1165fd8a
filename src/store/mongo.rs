use super::ProductStore;
use crate::models::{Category, NewProduct, Product, ProductImage};
use crate::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, DateTime as BsonDateTime};
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection, IndexModel};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const COLLECTION: &str = "products";
pub const DEFAULT_DATABASE: &str = "product_catalog";

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ImageDocument {
    public_id: String,
    url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductDocument {
    #[serde(rename = "_id")]
    id: ObjectId,
    name: String,
    description: String,
    price: f64,
    category: Category,
    #[serde(default)]
    is_featured: bool,
    image: ImageDocument,
    created_at: BsonDateTime,
    updated_at: BsonDateTime,
}

fn to_chrono(value: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(value.timestamp_millis()).unwrap_or_default()
}

impl From<ProductDocument> for Product {
    fn from(document: ProductDocument) -> Self {
        Self {
            id: document.id.to_hex(),
            name: document.name,
            description: document.description,
            price: document.price,
            category: document.category,
            is_featured: document.is_featured,
            image: ProductImage {
                public_id: document.image.public_id,
                url: document.image.url,
                cdn_url: None,
            },
            created_at: to_chrono(document.created_at),
            updated_at: to_chrono(document.updated_at),
        }
    }
}

impl ProductDocument {
    fn new(product: NewProduct, now: BsonDateTime) -> Self {
        Self {
            id: ObjectId::new(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            is_featured: product.is_featured,
            image: ImageDocument {
                public_id: product.image.public_id,
                url: product.image.url,
            },
            created_at: now,
            updated_at: now,
        }
    }
}

pub struct MongoProductStore {
    client: Client,
    collection: Collection<ProductDocument>,
}

impl MongoProductStore {
    /// Connect and ping the database. Fails when the server is unreachable.
    pub async fn connect(uri: &str, database: Option<&str>) -> Result<Self> {
        let mut options = ClientOptions::parse(uri).await?;
        options.app_name = Some(env!("CARGO_PKG_NAME").to_string());

        let client = Client::with_options(options)?;
        let db = match database {
            Some(name) => client.database(name),
            None => client
                .default_database()
                .unwrap_or_else(|| client.database(DEFAULT_DATABASE)),
        };

        db.run_command(doc! { "ping": 1 }).await?;
        info!("Connected to database '{}'", db.name());

        let collection = db.collection::<ProductDocument>(COLLECTION);

        let index = IndexModel::builder()
            .keys(doc! { "createdAt": -1 })
            .build();
        if let Err(e) = collection.create_index(index).await {
            warn!("Could not ensure createdAt index on '{}': {}", COLLECTION, e);
        }

        Ok(Self { client, collection })
    }
}

#[async_trait]
impl ProductStore for MongoProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let document = ProductDocument::new(product, BsonDateTime::now());
        self.collection.insert_one(&document).await?;

        debug!("Inserted product document {}", document.id);
        Ok(document.into())
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        let documents: Vec<ProductDocument> = self
            .collection
            .find(doc! {})
            .sort(doc! { "createdAt": -1, "_id": -1 })
            .await?
            .try_collect()
            .await?;

        Ok(documents.into_iter().map(Product::from).collect())
    }

    async fn shutdown(&self) {
        self.client.clone().shutdown().await;
        info!("Database client shut down");
    }
}
