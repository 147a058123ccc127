pub mod engine;
pub mod state;

pub use engine::{NotificationTimings, StoreEngine, StoreTransitionError};
pub use state::{AppState, CatalogStatus, StoreEffect, StoreEvent, SubmissionId, Transition};
