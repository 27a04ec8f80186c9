//! # Relay Core
//!
//! Headless controller for the daily report form.
//!
//! The form has three fields: a name that must belong to an authorised user, a date locked to
//! today, and a free-text report. This crate contains everything that happens between the user
//! touching the form and the webhook receiving it:
//! - fetching the authorised-user list once per session ([`reference`])
//! - keeping the date field pinned to today ([`guard`])
//! - live and submission-time validation ([`validation`])
//! - composing and posting the payload, with loading state and outcome reporting ([`submission`])
//! - transient notifications ([`notification`])
//!
//! [`session::FormSession`] wires the pieces together for one open form.
//!
//! **No rendering concerns**: drawing the form and its notifications belongs to whoever
//! implements [`notification::NotificationSurface`] and feeds [`events::UiEvent`]s in, such as the
//! terminal front end in `relay-cli`.

pub mod clock;
pub mod config;
pub mod constants;
pub mod error;
pub mod events;
pub mod form;
pub mod guard;
pub mod notification;
pub mod reference;
pub mod session;
pub mod submission;
pub mod transport;
pub mod validation;

pub use clock::{format_date, Clock, FixedClock, SystemClock};
pub use config::{RelayConfig, Timings};
pub use error::{RelayError, RelayResult};
pub use events::{FormEventHandler, Propagation, UiEvent};
pub use form::{FieldStatus, FormSnapshot, FormState, SubmitControl};
pub use notification::{
    NotificationKind, NotificationPresenter, NotificationState, NotificationSurface,
};
pub use reference::{LoadStatus, ReferenceSet, ReferenceStore};
pub use relay_types::{FieldName, FieldValue, FormPayload, ReferenceEntity};
pub use session::FormSession;
pub use submission::{SubmissionOutcome, SubmissionPhase};
pub use transport::{HttpResponse, HttpTransport, ReqwestTransport, TransportError};
