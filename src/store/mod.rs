//! Product persistence
//!
//! Stores product records in a single flat document collection and lists
//! them newest first.

pub mod mock;
pub mod mongo;

pub use mock::MockProductStore;
pub use mongo::MongoProductStore;

use crate::models::{NewProduct, Product};
use crate::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Persist a validated product; returns it with id and timestamps.
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// Every product ordered by creation time, most recent first.
    async fn list_all(&self) -> Result<Vec<Product>>;

    /// Release connections held by the store.
    async fn shutdown(&self) {}
}
