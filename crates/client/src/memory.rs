use async_trait::async_trait;
use storefront_core::{Product, ProductDraft, ProductId};
use tokio::sync::RwLock;

use crate::{ApiError, ProductApi};

#[derive(Default)]
struct Inventory {
    products: Vec<Product>,
    last_id: u64,
    outage: Option<String>,
}

/// Product API held in memory. Ids are assigned like a json-server: one past the
/// largest numeric id seen so far.
#[derive(Default)]
pub struct InMemoryProductApi {
    inventory: RwLock<Inventory>,
}

impl InMemoryProductApi {
    pub fn with_products(products: Vec<Product>) -> Self {
        let last_id =
            products.iter().filter_map(|product| product.id.0.parse::<u64>().ok()).max();
        Self {
            inventory: RwLock::new(Inventory {
                products,
                last_id: last_id.unwrap_or(0),
                outage: None,
            }),
        }
    }

    /// Every call fails with `ApiError::Unavailable` until `recover` is called.
    pub async fn fail_with(&self, message: impl Into<String>) {
        self.inventory.write().await.outage = Some(message.into());
    }

    pub async fn recover(&self) {
        self.inventory.write().await.outage = None;
    }

    pub async fn products(&self) -> Vec<Product> {
        self.inventory.read().await.products.clone()
    }
}

fn check_outage(inventory: &Inventory) -> Result<(), ApiError> {
    match &inventory.outage {
        Some(message) => Err(ApiError::Unavailable(message.clone())),
        None => Ok(()),
    }
}

#[async_trait]
impl ProductApi for InMemoryProductApi {
    async fn list(&self) -> Result<Vec<Product>, ApiError> {
        let inventory = self.inventory.read().await;
        check_outage(&inventory)?;
        Ok(inventory.products.clone())
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        let mut inventory = self.inventory.write().await;
        check_outage(&inventory)?;
        inventory.last_id += 1;
        let product = Product {
            id: ProductId(inventory.last_id.to_string()),
            name: draft.name.clone(),
            price: draft.price.clone(),
        };
        inventory.products.push(product.clone());
        Ok(product)
    }

    async fn update(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product, ApiError> {
        let mut inventory = self.inventory.write().await;
        check_outage(&inventory)?;
        let product = inventory
            .products
            .iter_mut()
            .find(|product| &product.id == id)
            .ok_or_else(|| ApiError::NotFound(id.clone()))?;
        product.name = draft.name.clone();
        product.price = draft.price.clone();
        Ok(product.clone())
    }

    async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        let mut inventory = self.inventory.write().await;
        check_outage(&inventory)?;
        let before = inventory.products.len();
        inventory.products.retain(|product| &product.id != id);
        if inventory.products.len() == before {
            return Err(ApiError::NotFound(id.clone()));
        }
        Ok(())
    }
}
