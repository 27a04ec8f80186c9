//! One page session.
//!
//! `FormSession` owns every component for the lifetime of an open form and wires them together
//! explicitly: the guard, the validator, the focus tracker and the presenter are registered as
//! event handlers, the guard's observer runs in the background, and the reference data is
//! requested exactly once when the session opens.

use crate::clock::Clock;
use crate::config::RelayConfig;
use crate::events::{EventDispatcher, FocusTracker, Propagation, UiEvent};
use crate::form::{FieldStatus, FormState};
use crate::guard::FieldGuard;
use crate::notification::{NotificationPresenter, NotificationSurface};
use crate::reference::{LoadStatus, ReferenceDataLoader, ReferenceSet, ReferenceStore};
use crate::submission::{SubmissionController, SubmissionOutcome, SubmissionPhase};
use crate::transport::HttpTransport;
use crate::validation::FieldValidator;
use relay_types::FieldName;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;

pub struct FormSession {
    config: RelayConfig,
    form: Arc<FormState>,
    store: Arc<ReferenceStore>,
    presenter: NotificationPresenter,
    validator: Arc<FieldValidator>,
    controller: SubmissionController,
    dispatcher: EventDispatcher,
    background: Mutex<Vec<JoinHandle<()>>>,
}

impl FormSession {
    /// Open the form. Must be called from within a Tokio runtime.
    pub fn open(
        config: RelayConfig,
        transport: Arc<dyn HttpTransport>,
        surface: Arc<dyn NotificationSurface>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let timings = config.timings();
        let form = Arc::new(FormState::new());
        let store = Arc::new(ReferenceStore::new());
        let presenter = NotificationPresenter::new(surface, timings.notification_auto_hide);

        let guard = FieldGuard::new(form.clone(), clock);
        guard.enforce();
        let mut background = vec![guard.observe()];

        let validator = Arc::new(FieldValidator::new(form.clone(), store.clone()));

        let mut dispatcher = EventDispatcher::new(form.clone());
        dispatcher.register(Arc::new(guard.clone()));
        dispatcher.register(validator.clone());
        dispatcher.register(Arc::new(FocusTracker::new(form.clone())));
        dispatcher.register(Arc::new(presenter.clone()));

        let loader = Arc::new(ReferenceDataLoader::new(
            transport.clone(),
            config.users_url(),
            store.clone(),
            presenter.clone(),
        ));
        background.extend(loader.spawn_initial_load());

        let controller = SubmissionController::new(
            form.clone(),
            store.clone(),
            transport,
            presenter.clone(),
            guard,
            config.webhook_url(),
            timings,
        );

        tracing::info!(
            users_url = %config.users_url(),
            webhook_url = %config.webhook_url(),
            "form session opened"
        );

        Self {
            config,
            form,
            store,
            presenter,
            validator,
            controller,
            dispatcher,
            background: Mutex::new(background),
        }
    }

    pub fn config(&self) -> &RelayConfig {
        &self.config
    }

    pub fn form(&self) -> &Arc<FormState> {
        &self.form
    }

    pub fn presenter(&self) -> &NotificationPresenter {
        &self.presenter
    }

    pub fn reference_data(&self) -> Arc<ReferenceSet> {
        self.store.current()
    }

    pub fn load_status(&self) -> LoadStatus {
        self.store.status()
    }

    /// Resolve once the page-open load has either succeeded or failed.
    ///
    /// This is for callers that want to report on the load; submission never waits for it.
    pub async fn wait_for_reference_data(&self) -> LoadStatus {
        self.store.wait_until_settled().await
    }

    pub fn validate(&self, field: FieldName, raw: &str) -> FieldStatus {
        self.validator.validate(field, raw)
    }

    pub fn phase(&self) -> SubmissionPhase {
        self.controller.phase()
    }

    pub fn dispatch(&self, event: UiEvent) -> Propagation {
        self.dispatcher.dispatch(&event)
    }

    /// Press the submit control.
    ///
    /// Returns `None` when the control is disabled because a submission is already in flight.
    pub async fn submit(&self) -> Option<SubmissionOutcome> {
        if self.form.submit_control().disabled {
            tracing::debug!("submit ignored while control is disabled");
            return None;
        }
        Some(self.controller.on_submit(self.form.snapshot()).await)
    }

    /// Stop background work: the guard observer, an unfinished reference load and any pending
    /// post-success reset.
    pub fn close(&self) {
        let mut background = self
            .background
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for task in background.drain(..) {
            task.abort();
        }
        self.controller.cancel_pending_reset();
        self.presenter.hide();
        tracing::info!("form session closed");
    }
}

impl Drop for FormSession {
    fn drop(&mut self) {
        let background = self
            .background
            .get_mut()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        for task in background.drain(..) {
            task.abort();
        }
    }
}
