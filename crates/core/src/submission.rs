//! Form submission.
//!
//! One submission at a time moves through
//! `Idle -> Validating -> (Rejected | Submitting -> (Succeeded | Failed))`. A terminal phase is
//! kept until the next submission starts. The only thing stopping a second submission while one
//! is in flight is the disabled submit control; there is no queue and no cancellation.

use crate::config::Timings;
use crate::constants::{SUBMIT_SUCCESS_MESSAGE, SYNTHETIC_ACK_MESSAGE};
use crate::form::{FormSnapshot, FormState};
use crate::guard::FieldGuard;
use crate::notification::{NotificationKind, NotificationPresenter};
use crate::reference::ReferenceStore;
use crate::transport::{HttpTransport, TransportError};
use crate::validation::validate_payload;
use crate::{RelayError, RelayResult};
use relay_types::FormPayload;
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::sync::watch;
use tokio::task::JoinHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionPhase {
    Idle,
    Validating,
    Rejected,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SubmissionOutcome {
    /// Stopped before any network call.
    Rejected(RelayError),
    /// The webhook accepted the payload. `ack` is its JSON reply or a synthetic one.
    Succeeded { payload: FormPayload, ack: Value },
    /// The webhook call failed.
    Failed(RelayError),
}

impl SubmissionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SubmissionOutcome::Succeeded { .. })
    }

    pub fn error(&self) -> Option<&RelayError> {
        match self {
            SubmissionOutcome::Rejected(err) | SubmissionOutcome::Failed(err) => Some(err),
            SubmissionOutcome::Succeeded { .. } => None,
        }
    }
}

/// Interpret a successful webhook body.
///
/// The webhook is not required to answer with JSON: an empty body or one that does not parse
/// is replaced by `{"success": true, "message": "Data received successfully"}`.
pub fn parse_ack(body: &str) -> Value {
    let synthetic = || json!({ "success": true, "message": SYNTHETIC_ACK_MESSAGE });

    if body.trim().is_empty() {
        return synthetic();
    }

    serde_json::from_str(body).unwrap_or_else(|e| {
        tracing::debug!(error = %e, "webhook replied with non-JSON body; treating as success");
        synthetic()
    })
}

pub struct SubmissionController {
    form: Arc<FormState>,
    store: Arc<ReferenceStore>,
    transport: Arc<dyn HttpTransport>,
    presenter: NotificationPresenter,
    guard: FieldGuard,
    webhook_url: String,
    timings: Timings,
    phase: watch::Sender<SubmissionPhase>,
    reset_task: Mutex<Option<JoinHandle<()>>>,
}

impl SubmissionController {
    pub fn new(
        form: Arc<FormState>,
        store: Arc<ReferenceStore>,
        transport: Arc<dyn HttpTransport>,
        presenter: NotificationPresenter,
        guard: FieldGuard,
        webhook_url: impl Into<String>,
        timings: Timings,
    ) -> Self {
        let (phase, _) = watch::channel(SubmissionPhase::Idle);
        Self {
            form,
            store,
            transport,
            presenter,
            guard,
            webhook_url: webhook_url.into(),
            timings,
            phase,
            reset_task: Mutex::new(None),
        }
    }

    pub fn phase(&self) -> SubmissionPhase {
        *self.phase.borrow()
    }

    pub fn subscribe_phase(&self) -> watch::Receiver<SubmissionPhase> {
        self.phase.subscribe()
    }

    fn enter(&self, phase: SubmissionPhase) {
        tracing::debug!(?phase, "submission phase");
        self.phase.send_replace(phase);
    }

    /// Handle a submit event for the given form contents.
    ///
    /// Nothing navigates away in a headless form, so the browser's default submit effect has
    /// no counterpart here; the snapshot is all that is needed.
    pub async fn on_submit(&self, snapshot: FormSnapshot) -> SubmissionOutcome {
        self.enter(SubmissionPhase::Validating);

        let payload = match self.compose(&snapshot) {
            Ok(payload) => payload,
            Err(err) => return self.reject(err),
        };

        self.enter(SubmissionPhase::Submitting);
        self.form.set_loading(true);
        tracing::info!(name = %payload.field1, dep = %payload.dep, "submitting report");

        let result = self.post(&payload).await;

        // Loading is cleared on every outcome.
        self.form.set_loading(false);

        match result {
            Ok(ack) => {
                self.enter(SubmissionPhase::Succeeded);
                tracing::info!(?ack, "submission accepted");
                self.presenter
                    .show(SUBMIT_SUCCESS_MESSAGE, NotificationKind::Success);
                self.schedule_reset();
                SubmissionOutcome::Succeeded { payload, ack }
            }
            Err(err) => {
                self.enter(SubmissionPhase::Failed);
                tracing::error!("Submission error: {:?}", err);
                self.presenter
                    .show(err.user_message(), NotificationKind::Error);
                SubmissionOutcome::Failed(err)
            }
        }
    }

    /// Look the name up and build the payload, then check it.
    fn compose(&self, snapshot: &FormSnapshot) -> RelayResult<FormPayload> {
        let name = snapshot.field1.trim();
        let refs = self.store.current();

        let entity = refs.find_unique(name).ok_or(RelayError::InvalidName)?;

        let payload = FormPayload {
            field1: name.to_string(),
            field2: snapshot.field2.clone(),
            field3: snapshot.field3.clone(),
            dep: entity.dep.clone(),
        };

        validate_payload(&payload)?;
        Ok(payload)
    }

    fn reject(&self, err: RelayError) -> SubmissionOutcome {
        self.enter(SubmissionPhase::Rejected);
        tracing::warn!(error = ?err, "submission rejected");
        self.presenter
            .show(err.user_message(), NotificationKind::Error);
        SubmissionOutcome::Rejected(err)
    }

    async fn post(&self, payload: &FormPayload) -> RelayResult<Value> {
        let body =
            serde_json::to_string(payload).map_err(|e| RelayError::Unknown(e.to_string()))?;

        let response = self
            .transport
            .post_json(&self.webhook_url, body)
            .await
            .map_err(|e| match e {
                TransportError::Unreachable(detail) => {
                    tracing::warn!(%detail, "webhook unreachable");
                    RelayError::Connectivity
                }
                TransportError::Other(message) => RelayError::Unknown(message),
            })?;

        if !response.is_success() {
            return Err(RelayError::Http {
                status: response.status,
            });
        }

        Ok(parse_ack(&response.body))
    }

    /// After a success: wait, clear the form, let it settle, put the date back, then dismiss
    /// the notification.
    fn schedule_reset(&self) {
        let form = self.form.clone();
        let guard = self.guard.clone();
        let presenter = self.presenter.clone();
        let Timings {
            reset_delay,
            guard_settle,
            ..
        } = self.timings;

        let task = tokio::spawn(async move {
            tokio::time::sleep(reset_delay).await;
            form.reset();
            tokio::time::sleep(guard_settle).await;
            guard.enforce();
            presenter.hide();
            tracing::debug!("form reset after successful submission");
        });

        let mut slot = self
            .reset_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(previous) = slot.replace(task) {
            previous.abort();
        }
    }

    /// Abort a pending post-success reset, if any.
    pub fn cancel_pending_reset(&self) {
        let mut slot = self
            .reset_task
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(task) = slot.take() {
            task.abort();
        }
    }
}
