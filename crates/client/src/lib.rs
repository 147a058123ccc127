//! Product API client.
//!
//! `ProductApi` is the seam between the storefront and the remote product
//! service:
//! - **HTTP** (`http`) - reqwest client for `GET/POST /products` and
//!   `PUT/DELETE /products/:id`
//! - **In-memory** (`memory`) - deterministic stand-in with server-style id
//!   assignment and a switchable failure mode

use async_trait::async_trait;
use storefront_core::{ApplicationError, Product, ProductDraft, ProductId};
use thiserror::Error;

pub mod http;
pub mod memory;

pub use http::HttpProductApi;
pub use memory::InMemoryProductApi;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid products url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("product api request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("product api returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("could not decode product api response: {0}")]
    Decode(String),
    #[error("product `{0}` was not found")]
    NotFound(ProductId),
    #[error("product api unavailable: {0}")]
    Unavailable(String),
}

impl ApiError {
    /// Stable, machine-friendly classification used in command output.
    pub fn class(&self) -> &'static str {
        match self {
            Self::InvalidUrl { .. } => "invalid_url",
            Self::Transport(_) => "transport",
            Self::Status { .. } => "http_status",
            Self::Decode(_) => "decode",
            Self::NotFound(_) => "not_found",
            Self::Unavailable(_) => "unavailable",
        }
    }
}

impl From<ApiError> for ApplicationError {
    fn from(value: ApiError) -> Self {
        match value {
            ApiError::InvalidUrl { .. } => Self::Configuration(value.to_string()),
            ApiError::Status { status, .. } if (400..500).contains(&status) => {
                Self::Rejected(value.to_string())
            }
            ApiError::NotFound(_) => Self::Rejected(value.to_string()),
            ApiError::Transport(_)
            | ApiError::Status { .. }
            | ApiError::Decode(_)
            | ApiError::Unavailable(_) => Self::Integration(value.to_string()),
        }
    }
}

#[async_trait]
pub trait ProductApi: Send + Sync {
    async fn list(&self) -> Result<Vec<Product>, ApiError>;
    async fn create(&self, draft: &ProductDraft) -> Result<Product, ApiError>;
    async fn update(&self, id: &ProductId, draft: &ProductDraft) -> Result<Product, ApiError>;
    async fn delete(&self, id: &ProductId) -> Result<(), ApiError>;
}
