//! Event loop that owns `AppState`.
//!
//! User commands and task completions are both `StoreEvent`s and go through
//! `Session::dispatch` in the order they arrive. Effects returned by the engine
//! are spawned as tokio tasks which post their completion back over an
//! unbounded channel.

use std::sync::Arc;

use storefront_client::{ApiError, ProductApi};
use storefront_core::audit::{AuditCategory, AuditOutcome};
use storefront_core::{
    AppState, ApplicationError, AuditContext, AuditEvent, AuditSink, ClearSchedule,
    InterfaceError, ProductDraft, StoreEffect, StoreEngine, StoreEvent, SubmissionId,
};
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

pub struct Session {
    engine: StoreEngine,
    state: AppState,
    api: Arc<dyn ProductApi>,
    audit_sink: Arc<dyn AuditSink>,
    audit: AuditContext,
    completions_tx: UnboundedSender<StoreEvent>,
    completions_rx: UnboundedReceiver<StoreEvent>,
    clear_task: Option<JoinHandle<()>>,
}

impl Session {
    pub fn new(
        engine: StoreEngine,
        api: Arc<dyn ProductApi>,
        audit_sink: Arc<dyn AuditSink>,
        audit: AuditContext,
    ) -> Self {
        let (completions_tx, completions_rx) = mpsc::unbounded_channel();
        Self {
            state: engine.initial_state(),
            engine,
            api,
            audit_sink,
            audit,
            completions_tx,
            completions_rx,
            clear_task: None,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn correlation_id(&self) -> &str {
        &self.audit.correlation_id
    }

    /// Applies one event and starts whatever work the transition asked for.
    /// A rejected event leaves the state untouched and comes back as a bad
    /// request tagged with the session's correlation id.
    pub fn dispatch(&mut self, event: StoreEvent) -> Result<(), InterfaceError> {
        let event_name = event.name();
        let transition = match self.engine.apply_with_audit(
            &self.state,
            event,
            self.audit_sink.as_ref(),
            &self.audit,
        ) {
            Ok(transition) => transition,
            Err(error) => {
                warn!(
                    event_name = "session.transition_rejected",
                    correlation_id = %self.audit.correlation_id,
                    store_event = event_name,
                    error = %error,
                    "store event rejected"
                );
                return Err(ApplicationError::from(error)
                    .into_interface(self.audit.correlation_id.clone()));
            }
        };

        debug!(
            event_name = "session.transition_applied",
            correlation_id = %self.audit.correlation_id,
            store_event = event_name,
            effects = transition.effects.len(),
            "store event applied"
        );
        self.state = transition.state;
        for effect in transition.effects {
            self.run_effect(effect);
        }
        Ok(())
    }

    /// Waits for the next completion posted by a spawned task.
    pub async fn next_completion(&mut self) -> Option<StoreEvent> {
        self.completions_rx.recv().await
    }

    /// Dispatches every completion that is already queued, returning how many
    /// were applied.
    pub fn pump(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.completions_rx.try_recv() {
            if self.dispatch(event).is_ok() {
                applied += 1;
            }
        }
        applied
    }

    fn run_effect(&mut self, effect: StoreEffect) {
        match effect {
            StoreEffect::FetchCatalog => self.spawn_fetch(),
            StoreEffect::CreateProduct { submission, draft } => {
                self.spawn_create(submission, draft)
            }
            StoreEffect::ScheduleNotificationClear(schedule) => self.schedule_clear(schedule),
        }
    }

    fn spawn_fetch(&self) {
        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();
        let audit_sink = Arc::clone(&self.audit_sink);
        let audit = self.audit.clone();
        let correlation_id = self.audit.correlation_id.clone();

        tokio::spawn(async move {
            let event = match api.list().await {
                Ok(products) => {
                    info!(
                        event_name = "session.catalog.loaded",
                        correlation_id = %correlation_id,
                        count = products.len(),
                        "catalog loaded"
                    );
                    StoreEvent::CatalogLoaded { products }
                }
                Err(error) => {
                    warn!(
                        event_name = "session.catalog.load_failed",
                        correlation_id = %correlation_id,
                        error_class = error.class(),
                        error = %error,
                        "catalog fetch failed"
                    );
                    audit_sink.emit(api_failure(&audit, "list", &error));
                    StoreEvent::CatalogLoadFailed { error: ApplicationError::from(error) }
                }
            };
            let _ = completions.send(event);
        });
    }

    fn spawn_create(&self, submission: SubmissionId, draft: ProductDraft) {
        let api = Arc::clone(&self.api);
        let completions = self.completions_tx.clone();
        let audit_sink = Arc::clone(&self.audit_sink);
        let audit = self.audit.clone();
        let correlation_id = self.audit.correlation_id.clone();

        tokio::spawn(async move {
            let event = match api.create(&draft).await {
                Ok(product) => {
                    info!(
                        event_name = "session.product.created",
                        correlation_id = %correlation_id,
                        submission = %submission,
                        product_id = %product.id,
                        "product created"
                    );
                    StoreEvent::ProductCreated { submission, product }
                }
                Err(error) => {
                    warn!(
                        event_name = "session.product.create_failed",
                        correlation_id = %correlation_id,
                        submission = %submission,
                        error_class = error.class(),
                        error = %error,
                        "product creation failed"
                    );
                    audit_sink.emit(
                        api_failure(&audit, "create", &error)
                            .with_metadata("submission", submission.to_string()),
                    );
                    StoreEvent::ProductCreateFailed {
                        submission,
                        error: ApplicationError::from(error),
                    }
                }
            };
            let _ = completions.send(event);
        });
    }

    fn schedule_clear(&mut self, schedule: ClearSchedule) {
        if let Some(previous) = self.clear_task.take() {
            previous.abort();
        }

        let completions = self.completions_tx.clone();
        self.clear_task = Some(tokio::spawn(async move {
            tokio::time::sleep(schedule.after).await;
            let _ = completions
                .send(StoreEvent::NotificationExpired { generation: schedule.generation });
        }));
    }
}

fn api_failure(audit: &AuditContext, operation: &str, error: &ApiError) -> AuditEvent {
    AuditEvent::new(
        audit.correlation_id.clone(),
        "product_api.request_failed",
        AuditCategory::Catalog,
        audit.actor.clone(),
        AuditOutcome::Failed,
    )
    .with_metadata("operation", operation)
    .with_metadata("error_class", error.class())
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Some(task) = self.clear_task.take() {
            task.abort();
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use async_trait::async_trait;
    use storefront_client::{ApiError, InMemoryProductApi, ProductApi};
    use storefront_core::audit::AuditOutcome;
    use storefront_core::{
        AuditContext, CatalogStatus, Generation, InMemoryAuditSink, InterfaceError,
        NotificationLevel, Product, ProductDraft, ProductId, StoreEngine, StoreEvent,
    };
    use tokio::sync::oneshot;

    use crate::session::Session;

    fn product(id: &str, name: &str, price: &str) -> Product {
        Product { id: ProductId::from(id), name: name.to_owned(), price: price.to_owned() }
    }

    fn session_with(api: Arc<dyn ProductApi>) -> (Session, InMemoryAuditSink) {
        let sink = InMemoryAuditSink::default();
        let session = Session::new(
            StoreEngine::default(),
            api,
            Arc::new(sink.clone()),
            AuditContext::new("session-test", "storefront"),
        );
        (session, sink)
    }

    async fn settle(session: &mut Session) {
        let event = session.next_completion().await.expect("completion");
        session.dispatch(event).expect("completion applies");
    }

    /// Resolves each `create` only when the test releases the gate for that
    /// product name.
    #[derive(Default)]
    struct GatedProductApi {
        gates: Mutex<HashMap<String, oneshot::Receiver<Product>>>,
    }

    impl GatedProductApi {
        fn gate(&self, name: &str) -> oneshot::Sender<Product> {
            let (release, gate) = oneshot::channel();
            self.gates.lock().expect("gates lock").insert(name.to_owned(), gate);
            release
        }
    }

    #[async_trait]
    impl ProductApi for GatedProductApi {
        async fn list(&self) -> Result<Vec<Product>, ApiError> {
            Ok(Vec::new())
        }

        async fn create(&self, draft: &ProductDraft) -> Result<Product, ApiError> {
            let gate = self.gates.lock().expect("gates lock").remove(&draft.name);
            match gate {
                Some(gate) => gate.await.map_err(|_| ApiError::Unavailable("gate dropped".into())),
                None => Err(ApiError::Unavailable(format!("no gate for {}", draft.name))),
            }
        }

        async fn update(&self, id: &ProductId, _draft: &ProductDraft) -> Result<Product, ApiError> {
            Err(ApiError::NotFound(id.clone()))
        }

        async fn delete(&self, id: &ProductId) -> Result<(), ApiError> {
            Err(ApiError::NotFound(id.clone()))
        }
    }

    #[tokio::test]
    async fn startup_fetches_catalog_through_the_api() {
        let api = Arc::new(InMemoryProductApi::with_products(vec![product("1", "Apple", "1.00")]));
        let (mut session, sink) = session_with(api);

        session.dispatch(StoreEvent::Started).expect("start");
        assert_eq!(session.state().catalog_status, CatalogStatus::Loading);
        settle(&mut session).await;

        assert_eq!(session.state().catalog_status, CatalogStatus::Loaded);
        assert_eq!(session.state().catalog.products(), &[product("1", "Apple", "1.00")]);
        assert_eq!(sink.events().len(), 2);

        let error = session.dispatch(StoreEvent::Started).expect_err("second start");
        assert!(matches!(error, InterfaceError::BadRequest { ref message, .. }
            if message.starts_with("catalog fetch was already requested")));
        assert_eq!(error.correlation_id(), "session-test");
        assert_eq!(
            error.user_message(),
            "The request could not be processed. Check inputs and try again."
        );
    }

    #[tokio::test]
    async fn fetch_failure_shows_error_and_keeps_catalog_empty() {
        let api = Arc::new(InMemoryProductApi::default());
        api.fail_with("connection refused").await;
        let (mut session, sink) = session_with(api);

        session.dispatch(StoreEvent::Started).expect("start");
        settle(&mut session).await;

        let failure = sink
            .events()
            .into_iter()
            .find(|event| event.outcome == AuditOutcome::Failed)
            .expect("api failure audited");
        assert_eq!(failure.event_type, "product_api.request_failed");
        assert_eq!(failure.correlation_id, "session-test");
        assert_eq!(failure.metadata.get("operation").map(String::as_str), Some("list"));
        assert_eq!(failure.metadata.get("error_class").map(String::as_str), Some("unavailable"));

        let state = session.state();
        assert_eq!(state.catalog_status, CatalogStatus::Failed);
        assert!(state.catalog.is_empty());
        let notification = state.notification.current().expect("error notification");
        assert_eq!(notification.level, NotificationLevel::Error);
        assert_eq!(
            notification.message,
            "Could not load products: The product service is unavailable. Please retry shortly."
        );
    }

    #[tokio::test]
    async fn submitted_draft_is_created_remotely_then_appended() {
        let api = Arc::new(InMemoryProductApi::with_products(vec![
            product("1", "Apple", "1.00"),
            product("4", "Grape", "3.00"),
        ]));
        let (mut session, _sink) = session_with(api.clone());
        session.dispatch(StoreEvent::Started).expect("start");
        settle(&mut session).await;

        session.dispatch(StoreEvent::DraftNameChanged("Pen".to_owned())).expect("name");
        session.dispatch(StoreEvent::DraftPriceChanged("2.00".to_owned())).expect("price");
        session.dispatch(StoreEvent::DraftSubmitted).expect("submit");
        assert_eq!(session.state().catalog.len(), 2);
        settle(&mut session).await;

        let state = session.state();
        assert_eq!(state.catalog.products().last(), Some(&product("5", "Pen", "2.00")));
        assert_eq!(state.draft, ProductDraft::default());
        assert_eq!(state.notification.message(), Some("Added Pen"));
        assert_eq!(api.products().await.len(), 3);
    }

    #[tokio::test]
    async fn concurrent_submissions_append_in_completion_order() {
        let api = Arc::new(GatedProductApi::default());
        let release_first = api.gate("First");
        let release_second = api.gate("Second");
        let (mut session, _sink) = session_with(api);
        session.dispatch(StoreEvent::Started).expect("start");
        settle(&mut session).await;

        for name in ["First", "Second"] {
            session.dispatch(StoreEvent::DraftNameChanged(name.to_owned())).expect("name");
            session.dispatch(StoreEvent::DraftSubmitted).expect("submit");
        }
        assert_eq!(session.state().pending.len(), 2);

        release_second.send(product("11", "Second", "")).expect("release second");
        settle(&mut session).await;
        release_first.send(product("10", "First", "")).expect("release first");
        settle(&mut session).await;

        let names: Vec<_> =
            session.state().catalog.products().iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Second", "First"]);
        assert!(session.state().pending.is_empty());
    }

    #[tokio::test]
    async fn failed_creation_keeps_draft_and_reports_error() {
        let api = Arc::new(InMemoryProductApi::default());
        let (mut session, _sink) = session_with(api.clone());
        session.dispatch(StoreEvent::Started).expect("start");
        settle(&mut session).await;

        api.fail_with("timeout").await;
        session.dispatch(StoreEvent::DraftNameChanged("Pen".to_owned())).expect("name");
        session.dispatch(StoreEvent::DraftSubmitted).expect("submit");
        settle(&mut session).await;

        let state = session.state();
        assert_eq!(state.draft.name, "Pen");
        assert!(state.catalog.is_empty());
        assert_eq!(
            state.notification.message(),
            Some("Could not add Pen: The product service is unavailable. Please retry shortly.")
        );
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn notification_clears_after_its_duration() {
        let api = Arc::new(InMemoryProductApi::with_products(vec![product("1", "Apple", "1.00")]));
        let (mut session, _sink) = session_with(api);
        session.dispatch(StoreEvent::Started).expect("start");
        settle(&mut session).await;

        let started = tokio::time::Instant::now();
        session.dispatch(StoreEvent::AddToCart(ProductId::from("1"))).expect("add");
        assert_eq!(session.state().notification.message(), Some("Apple added to cart"));

        settle(&mut session).await;

        assert!(session.state().notification.is_empty());
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(3_000) && elapsed < Duration::from_millis(3_100));
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn newer_notification_cancels_the_pending_clear() {
        let api = Arc::new(InMemoryProductApi::with_products(vec![product("1", "Apple", "1.00")]));
        let (mut session, _sink) = session_with(api);
        session.dispatch(StoreEvent::Started).expect("start");
        settle(&mut session).await;

        let started = tokio::time::Instant::now();
        session.dispatch(StoreEvent::AddToCart(ProductId::from("1"))).expect("add");
        tokio::task::yield_now().await;
        tokio::time::advance(Duration::from_millis(1_000)).await;
        session.dispatch(StoreEvent::RemoveFromCart(ProductId::from("1"))).expect("remove");

        let expired = session.next_completion().await.expect("expiry");
        assert_eq!(expired, StoreEvent::NotificationExpired { generation: Generation(2) });
        let elapsed = started.elapsed();
        assert!(elapsed >= Duration::from_millis(4_000) && elapsed < Duration::from_millis(4_100));

        session.dispatch(expired).expect("expire");
        assert!(session.state().notification.is_empty());
        assert_eq!(session.pump(), 0);
    }

    #[tokio::test]
    async fn pump_applies_queued_completions_and_skips_rejected_ones() {
        let api = Arc::new(InMemoryProductApi::with_products(vec![product("1", "Apple", "1.00")]));
        let (mut session, sink) = session_with(api);
        session.dispatch(StoreEvent::Started).expect("start");

        while session.state().catalog_status == CatalogStatus::Loading {
            tokio::task::yield_now().await;
            session.pump();
        }
        assert_eq!(session.state().catalog.len(), 1);

        session
            .completions_tx
            .send(StoreEvent::CatalogLoaded { products: Vec::new() })
            .expect("queue late response");
        assert_eq!(session.pump(), 0);
        assert_eq!(session.state().catalog.len(), 1);
        assert_eq!(
            sink.events().last().map(|event| event.event_type.as_str()),
            Some("store.transition_rejected")
        );
    }
}
