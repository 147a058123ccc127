use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::cart::Cart;
use crate::catalog::Catalog;
use crate::domain::product::{Product, ProductDraft, ProductId};
use crate::errors::ApplicationError;
use crate::notification::{ClearSchedule, Generation, NotificationChannel};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CatalogStatus {
    #[default]
    NotLoaded,
    Loading,
    Loaded,
    Failed,
}

/// Token tying a product-creation completion to the submission that issued it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubmissionId(pub u64);

impl fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Everything the storefront knows. Owned by one event loop and only changed
/// through `StoreEngine::apply`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AppState {
    pub catalog: Catalog,
    pub catalog_status: CatalogStatus,
    pub cart: Cart,
    pub draft: ProductDraft,
    pub filter: String,
    pub notification: NotificationChannel,
    pub pending: BTreeMap<SubmissionId, ProductDraft>,
    pub(crate) last_submission: u64,
}

impl AppState {
    /// State with an already-loaded catalog.
    pub fn with_catalog(products: Vec<Product>) -> Self {
        Self {
            catalog: Catalog::new(products),
            catalog_status: CatalogStatus::Loaded,
            ..Self::default()
        }
    }

    pub fn visible_products(&self) -> Vec<&Product> {
        self.catalog.view(&self.filter)
    }

    pub(crate) fn next_submission(&mut self) -> SubmissionId {
        self.last_submission += 1;
        SubmissionId(self.last_submission)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    Started,
    CatalogLoaded { products: Vec<Product> },
    CatalogLoadFailed { error: ApplicationError },
    DraftNameChanged(String),
    DraftPriceChanged(String),
    DraftSubmitted,
    ProductCreated { submission: SubmissionId, product: Product },
    ProductCreateFailed { submission: SubmissionId, error: ApplicationError },
    FilterChanged(String),
    AddToCart(ProductId),
    RemoveFromCart(ProductId),
    NotificationExpired { generation: Generation },
}

impl StoreEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Started => "started",
            Self::CatalogLoaded { .. } => "catalog_loaded",
            Self::CatalogLoadFailed { .. } => "catalog_load_failed",
            Self::DraftNameChanged(_) => "draft_name_changed",
            Self::DraftPriceChanged(_) => "draft_price_changed",
            Self::DraftSubmitted => "draft_submitted",
            Self::ProductCreated { .. } => "product_created",
            Self::ProductCreateFailed { .. } => "product_create_failed",
            Self::FilterChanged(_) => "filter_changed",
            Self::AddToCart(_) => "add_to_cart",
            Self::RemoveFromCart(_) => "remove_from_cart",
            Self::NotificationExpired { .. } => "notification_expired",
        }
    }
}

/// Side effects requested by a transition, carried out by the session runtime.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEffect {
    FetchCatalog,
    CreateProduct { submission: SubmissionId, draft: ProductDraft },
    ScheduleNotificationClear(ClearSchedule),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Transition {
    pub state: AppState,
    pub effects: Vec<StoreEffect>,
}
