use std::sync::Arc;

use storefront_client::{ApiError, HttpProductApi, ProductApi};
use storefront_core::config::{AppConfig, ConfigError};
use storefront_core::{AuditContext, AuditSink, StoreEngine};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

use crate::session::Session;

pub struct Application {
    pub config: AppConfig,
    pub api: Arc<dyn ProductApi>,
    pub audit_sink: Arc<dyn AuditSink>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("product api client could not be built: {0}")]
    ProductApi(#[source] ApiError),
}

pub fn bootstrap_with_config(
    config: AppConfig,
    audit_sink: Arc<dyn AuditSink>,
) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        products_url = %config.api.products_url,
        "starting storefront bootstrap"
    );

    let api = HttpProductApi::new(&config.api).map_err(BootstrapError::ProductApi)?;
    info!(
        event_name = "system.bootstrap.api_client_ready",
        correlation_id = "bootstrap",
        products_url = %api.products_url(),
        "product api client ready"
    );

    Ok(Application { config, api: Arc::new(api), audit_sink })
}

impl Application {
    /// Fresh session with its own correlation id.
    pub fn session(&self) -> Session {
        let correlation_id = format!("session-{}", Uuid::new_v4());
        Session::new(
            StoreEngine::new(self.config.notifications.timings()),
            Arc::clone(&self.api),
            Arc::clone(&self.audit_sink),
            AuditContext::new(correlation_id, "storefront"),
        )
    }
}
