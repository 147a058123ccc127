use std::time::Duration;

use thiserror::Error;
use tracing::debug;

use crate::audit::{AuditCategory, AuditContext, AuditEvent, AuditOutcome, AuditSink};
use crate::cart::CartAddOutcome;
use crate::domain::product::ProductDraft;
use crate::errors::ApplicationError;
use crate::notification::NotificationLevel;
use crate::store::state::{
    AppState, CatalogStatus, StoreEffect, StoreEvent, SubmissionId, Transition,
};

pub const PRODUCT_ADDED_NOTICE: Duration = Duration::from_millis(5_000);
pub const CART_CHANGE_NOTICE: Duration = Duration::from_millis(3_000);
pub const FAILURE_NOTICE: Duration = Duration::from_millis(5_000);

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct NotificationTimings {
    pub product_added: Duration,
    pub cart_change: Duration,
    pub failure: Duration,
}

impl Default for NotificationTimings {
    fn default() -> Self {
        Self {
            product_added: PRODUCT_ADDED_NOTICE,
            cart_change: CART_CHANGE_NOTICE,
            failure: FAILURE_NOTICE,
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum StoreTransitionError {
    #[error("catalog fetch was already requested (status {status:?})")]
    CatalogAlreadyRequested { status: CatalogStatus },
    #[error("catalog response arrived while status was {status:?}")]
    UnexpectedCatalogResponse { status: CatalogStatus },
    #[error("no pending product submission {submission}")]
    UnknownSubmission { submission: SubmissionId },
}

/// Pure reducer over `AppState`.
#[derive(Clone, Debug, Default)]
pub struct StoreEngine {
    timings: NotificationTimings,
}

impl StoreEngine {
    pub fn new(timings: NotificationTimings) -> Self {
        Self { timings }
    }

    pub fn initial_state(&self) -> AppState {
        AppState::default()
    }

    pub fn apply(
        &self,
        current: &AppState,
        event: StoreEvent,
    ) -> Result<Transition, StoreTransitionError> {
        let mut state = current.clone();
        let mut effects = Vec::new();

        match event {
            StoreEvent::Started => {
                if state.catalog_status != CatalogStatus::NotLoaded {
                    return Err(StoreTransitionError::CatalogAlreadyRequested {
                        status: state.catalog_status,
                    });
                }
                state.catalog_status = CatalogStatus::Loading;
                effects.push(StoreEffect::FetchCatalog);
            }
            StoreEvent::CatalogLoaded { products } => {
                expect_loading(&state)?;
                state.catalog.replace_all(products);
                state.catalog_status = CatalogStatus::Loaded;
            }
            StoreEvent::CatalogLoadFailed { error } => {
                expect_loading(&state)?;
                state.catalog_status = CatalogStatus::Failed;
                let message = format!("Could not load products: {}", error.user_message());
                let after = self.timings.failure;
                notify(&mut state, &mut effects, message, NotificationLevel::Error, after);
            }
            StoreEvent::DraftNameChanged(name) => state.draft.name = name,
            StoreEvent::DraftPriceChanged(price) => state.draft.price = price,
            StoreEvent::DraftSubmitted => {
                let submission = state.next_submission();
                let draft = state.draft.clone();
                state.pending.insert(submission, draft.clone());
                effects.push(StoreEffect::CreateProduct { submission, draft });
            }
            StoreEvent::ProductCreated { submission, product } => {
                let submitted = take_pending(&mut state, submission)?;
                state.catalog.append(product);
                state.draft = ProductDraft::default();
                let message = format!("Added {}", submitted.name);
                let after = self.timings.product_added;
                notify(&mut state, &mut effects, message, NotificationLevel::Success, after);
            }
            StoreEvent::ProductCreateFailed { submission, error } => {
                let submitted = take_pending(&mut state, submission)?;
                let message = failure_message(&submitted, &error);
                let after = self.timings.failure;
                notify(&mut state, &mut effects, message, NotificationLevel::Error, after);
            }
            StoreEvent::FilterChanged(filter) => state.filter = filter,
            StoreEvent::AddToCart(product_id) => {
                let Some(product) = state.catalog.find(&product_id).cloned() else {
                    debug!(
                        event_name = "store.cart.unknown_product",
                        product_id = %product_id,
                        "ignoring add-to-cart for a product missing from the catalog"
                    );
                    return Ok(Transition { state, effects });
                };

                let (message, level) = match state.cart.add(&product) {
                    CartAddOutcome::Added => {
                        (format!("{} added to cart", product.name), NotificationLevel::Success)
                    }
                    CartAddOutcome::AlreadyPresent => (
                        format!("{} is already in the cart", product.name),
                        NotificationLevel::Warning,
                    ),
                };
                let after = self.timings.cart_change;
                notify(&mut state, &mut effects, message, level, after);
            }
            StoreEvent::RemoveFromCart(product_id) => {
                state.cart.remove(&product_id);
                notify(
                    &mut state,
                    &mut effects,
                    "Removed item from cart".to_owned(),
                    NotificationLevel::Info,
                    self.timings.cart_change,
                );
            }
            StoreEvent::NotificationExpired { generation } => {
                state.notification.expire(generation);
            }
        }

        Ok(Transition { state, effects })
    }

    pub fn apply_with_audit<S>(
        &self,
        current: &AppState,
        event: StoreEvent,
        sink: &S,
        audit: &AuditContext,
    ) -> Result<Transition, StoreTransitionError>
    where
        S: AuditSink + ?Sized,
    {
        let event_name = event.name();
        let category = category_for(&event);
        let result = self.apply(current, event);
        match &result {
            Ok(transition) => {
                sink.emit(
                    AuditEvent::new(
                        audit.correlation_id.clone(),
                        "store.transition_applied",
                        category,
                        audit.actor.clone(),
                        AuditOutcome::Success,
                    )
                    .with_metadata("event", event_name)
                    .with_metadata("effects", transition.effects.len().to_string())
                    .with_metadata("catalog_size", transition.state.catalog.len().to_string())
                    .with_metadata("cart_size", transition.state.cart.len().to_string()),
                );
            }
            Err(error) => {
                sink.emit(
                    AuditEvent::new(
                        audit.correlation_id.clone(),
                        "store.transition_rejected",
                        category,
                        audit.actor.clone(),
                        AuditOutcome::Rejected,
                    )
                    .with_metadata("event", event_name)
                    .with_metadata("error", error.to_string()),
                );
            }
        }
        result
    }
}

fn notify(
    state: &mut AppState,
    effects: &mut Vec<StoreEffect>,
    message: String,
    level: NotificationLevel,
    after: Duration,
) {
    let schedule = state.notification.notify(message, level, after);
    effects.push(StoreEffect::ScheduleNotificationClear(schedule));
}

fn expect_loading(state: &AppState) -> Result<(), StoreTransitionError> {
    if state.catalog_status == CatalogStatus::Loading {
        Ok(())
    } else {
        Err(StoreTransitionError::UnexpectedCatalogResponse { status: state.catalog_status })
    }
}

fn take_pending(
    state: &mut AppState,
    submission: SubmissionId,
) -> Result<ProductDraft, StoreTransitionError> {
    state.pending.remove(&submission).ok_or(StoreTransitionError::UnknownSubmission { submission })
}

fn failure_message(draft: &ProductDraft, error: &ApplicationError) -> String {
    if draft.name.is_empty() {
        format!("Could not add product: {}", error.user_message())
    } else {
        format!("Could not add {}: {}", draft.name, error.user_message())
    }
}

fn category_for(event: &StoreEvent) -> AuditCategory {
    match event {
        StoreEvent::Started => AuditCategory::System,
        StoreEvent::CatalogLoaded { .. }
        | StoreEvent::CatalogLoadFailed { .. }
        | StoreEvent::ProductCreated { .. }
        | StoreEvent::ProductCreateFailed { .. } => AuditCategory::Catalog,
        StoreEvent::DraftNameChanged(_)
        | StoreEvent::DraftPriceChanged(_)
        | StoreEvent::DraftSubmitted => AuditCategory::Draft,
        StoreEvent::FilterChanged(_) => AuditCategory::Filter,
        StoreEvent::AddToCart(_) | StoreEvent::RemoveFromCart(_) => AuditCategory::Cart,
        StoreEvent::NotificationExpired { .. } => AuditCategory::Notification,
    }
}
