use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use storefront_core::config::ApiConfig;
use storefront_core::{Product, ProductDraft, ProductId};
use tracing::{debug, warn};

use crate::{ApiError, ProductApi};

/// Product API over HTTP/JSON. `products_url` is the collection resource; items
/// live at `{products_url}/{id}`.
#[derive(Clone, Debug)]
pub struct HttpProductApi {
    client: Client,
    products_url: Url,
}

impl HttpProductApi {
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        Self::from_url(&config.products_url, config.timeout_secs.map(Duration::from_secs))
    }

    pub fn from_url(products_url: &str, timeout: Option<Duration>) -> Result<Self, ApiError> {
        let products_url = Url::parse(products_url.trim()).map_err(|error| {
            ApiError::InvalidUrl { url: products_url.to_string(), reason: error.to_string() }
        })?;
        if products_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl {
                url: products_url.to_string(),
                reason: "url cannot carry a product id path segment".to_string(),
            });
        }

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(ApiError::Transport)?;

        Ok(Self { client, products_url })
    }

    pub fn products_url(&self) -> &Url {
        &self.products_url
    }

    fn item_url(&self, id: &ProductId) -> Result<Url, ApiError> {
        let mut url = self.products_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidUrl {
                url: self.products_url.to_string(),
                reason: "url cannot carry a product id path segment".to_string(),
            })?
            .pop_if_empty()
            .push(id.as_str());
        Ok(url)
    }
}

#[async_trait]
impl ProductApi for HttpProductApi {
    async fn list(&self) -> Result<Vec<Product>, ApiError> {
        debug!(event_name = "api.products.list", url = %self.products_url, "fetching products");
        let response =
            self.client.get(self.products_url.clone()).send().await.map_err(ApiError::Transport)?;
        let products: Vec<Product> = decode(ensure_success(response).await?).await?;
        debug!(event_name = "api.products.listed", count = products.len(), "products fetched");
        Ok(products)
    }

    async fn create(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
        debug!(event_name = "api.products.create", name = %draft.name, "creating product");
        let response = self
            .client
            .post(self.products_url.clone())
            .json(draft)
            .send()
            .await
            .map_err(ApiError::Transport)?;
        let product: Product = decode(ensure_success(response).await?).await?;
        debug!(event_name = "api.products.created", product_id = %product.id, "product created");
        Ok(product)
    }

    async fn update(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product, ApiError> {
        let url = self.item_url(id)?;
        debug!(event_name = "api.products.update", product_id = %id, "updating product");
        let response =
            self.client.put(url).json(draft).send().await.map_err(ApiError::Transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id.clone()));
        }
        decode(ensure_success(response).await?).await
    }

    async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
        let url = self.item_url(id)?;
        debug!(event_name = "api.products.delete", product_id = %id, "deleting product");
        let response = self.client.delete(url).send().await.map_err(ApiError::Transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(id.clone()));
        }
        ensure_success(response).await?;
        Ok(())
    }
}

async fn ensure_success(response: Response) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    warn!(
        event_name = "api.products.status_error",
        status = status.as_u16(),
        "product api returned a non-success status"
    );
    Err(ApiError::Status { status: status.as_u16(), body })
}

async fn decode<T>(response: Response) -> Result<T, ApiError>
where
    T: DeserializeOwned,
{
    response.json::<T>().await.map_err(|error| ApiError::Decode(error.to_string()))
}
