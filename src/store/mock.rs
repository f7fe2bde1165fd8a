use super::ProductStore;
use crate::models::{NewProduct, Product};
use crate::{Error, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

#[derive(Clone)]
pub struct MockProductStore {
    products: Arc<Mutex<Vec<Product>>>,
    should_fail: Arc<Mutex<bool>>,
    create_count: Arc<Mutex<usize>>,
}

impl MockProductStore {
    pub fn new() -> Self {
        Self {
            products: Arc::new(Mutex::new(Vec::new())),
            should_fail: Arc::new(Mutex::new(false)),
            create_count: Arc::new(Mutex::new(0)),
        }
    }

    pub fn with_product(self, product: Product) -> Self {
        self.products.lock().unwrap().push(product);
        self
    }

    pub fn with_failure(self, should_fail: bool) -> Self {
        *self.should_fail.lock().unwrap() = should_fail;
        self
    }

    pub fn get_create_count(&self) -> usize {
        *self.create_count.lock().unwrap()
    }

    pub fn get_products(&self) -> Vec<Product> {
        self.products.lock().unwrap().clone()
    }

    fn check_failure(&self) -> Result<()> {
        if *self.should_fail.lock().unwrap() {
            return Err(Error::Io(std::io::Error::other("Mock store failure")));
        }
        Ok(())
    }
}

impl Default for MockProductStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductStore for MockProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        self.check_failure()?;
        *self.create_count.lock().unwrap() += 1;

        let now = Utc::now();
        let stored = Product {
            id: Uuid::new_v4().simple().to_string()[..24].to_string(),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            is_featured: product.is_featured,
            image: product.image.into(),
            created_at: now,
            updated_at: now,
        };

        self.products.lock().unwrap().push(stored.clone());
        Ok(stored)
    }

    async fn list_all(&self) -> Result<Vec<Product>> {
        self.check_failure()?;

        // Reverse insertion order first so equal timestamps keep newest first.
        let mut products: Vec<Product> =
            self.products.lock().unwrap().iter().rev().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(products)
    }
}
