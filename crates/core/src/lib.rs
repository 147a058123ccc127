pub mod audit;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod notification;
pub mod store;

pub use audit::{AuditContext, AuditEvent, AuditSink, InMemoryAuditSink};
pub use cart::{Cart, CartAddOutcome};
pub use catalog::{filter_products, Catalog};
pub use domain::product::{Product, ProductDraft, ProductId};
pub use errors::{ApplicationError, InterfaceError};
pub use notification::{
    ClearSchedule, Generation, Notification, NotificationChannel, NotificationLevel,
};
pub use store::{
    AppState, CatalogStatus, NotificationTimings, StoreEffect, StoreEngine, StoreEvent,
    StoreTransitionError, SubmissionId, Transition,
};
