//! Input validation.
//!
//! Two levels: advisory per-keystroke marks on each field, and the authoritative check of a
//! composed [`FormPayload`] right before it is sent. The live marks never block typing and an
//! empty field is left unmarked; required-ness is only enforced at submission.

use crate::constants::{MIN_NAME_LEN, MIN_REPORT_LEN};
use crate::events::{FormEventHandler, Propagation};
use crate::form::{FieldStatus, FormState};
use crate::reference::{ReferenceSet, ReferenceStore};
use crate::{RelayError, RelayResult};
use relay_types::{FieldName, FieldValue, FormPayload};
use std::sync::Arc;

/// Advisory check of a single field value against the given reference set.
///
/// - empty after trimming: `Unmarked`
/// - `field1`: at least two characters and present in `refs` (case-insensitive)
/// - `field2`: any non-empty value (the guard owns its format)
/// - `field3`: at least ten characters
pub fn validate_field(field: FieldName, raw: &str, refs: &ReferenceSet) -> FieldStatus {
    let Some(text) = FieldValue::parse(raw) else {
        return FieldStatus::Unmarked;
    };

    let valid = match field {
        FieldName::Name => text.char_len() >= MIN_NAME_LEN && refs.contains(text.as_str()),
        FieldName::Date => true,
        FieldName::Report => text.char_len() >= MIN_REPORT_LEN,
    };

    if valid {
        FieldStatus::Valid
    } else {
        FieldStatus::Invalid
    }
}

/// Authoritative submission check: every user-facing field must be non-empty after trimming.
pub fn validate_payload(payload: &FormPayload) -> RelayResult<()> {
    match payload.first_blank_field() {
        Some(field) => Err(RelayError::Validation(format!("{field} is empty"))),
        None => Ok(()),
    }
}

/// Live validation bound to the form: marks a field on every input event.
pub struct FieldValidator {
    form: Arc<FormState>,
    store: Arc<ReferenceStore>,
}

impl FieldValidator {
    pub fn new(form: Arc<FormState>, store: Arc<ReferenceStore>) -> Self {
        Self { form, store }
    }

    /// Validate against whatever reference data has arrived so far.
    pub fn validate(&self, field: FieldName, raw: &str) -> FieldStatus {
        validate_field(field, raw, &self.store.current())
    }
}

impl FormEventHandler for FieldValidator {
    fn on_input(&self, field: FieldName, _value: &str) -> Propagation {
        // Read back from the form: another handler may already have rewritten the value.
        let value = self.form.value(field);
        let status = self.validate(field, &value);
        tracing::debug!(%field, %status, "live validation");
        self.form.set_status(field, status);
        Propagation::Continue
    }
}
