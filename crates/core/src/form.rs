//! Headless form model.
//!
//! `FormState` stands in for the DOM form: three named fields, their inline validation marks,
//! the floating-label focus flag and the submit control. Every mutation bumps a revision number
//! published on a `watch` channel; that channel is the change-detection signal the date guard
//! listens to for out-of-band edits.

use relay_types::FieldName;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};
use tokio::sync::watch;

/// Inline validation mark on a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FieldStatus {
    /// Neither valid nor invalid; the value is empty or has not been checked.
    #[default]
    Unmarked,
    Valid,
    Invalid,
}

impl std::fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            FieldStatus::Unmarked => "unmarked",
            FieldStatus::Valid => "valid",
            FieldStatus::Invalid => "invalid",
        })
    }
}

/// Mirror of LoadingState on the submit button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SubmitControl {
    pub disabled: bool,
    pub loading: bool,
}

/// Raw field values at the moment of submission.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FormSnapshot {
    pub field1: String,
    pub field2: String,
    pub field3: String,
}

impl FormSnapshot {
    pub fn get(&self, field: FieldName) -> &str {
        match field {
            FieldName::Name => &self.field1,
            FieldName::Date => &self.field2,
            FieldName::Report => &self.field3,
        }
    }
}

#[derive(Debug, Clone, Default)]
struct FieldSlot {
    value: String,
    status: FieldStatus,
    focused: bool,
}

#[derive(Debug, Default)]
struct FormInner {
    fields: BTreeMap<FieldName, FieldSlot>,
    submit: SubmitControl,
}

/// The form a session drives.
#[derive(Debug)]
pub struct FormState {
    inner: Mutex<FormInner>,
    revision: watch::Sender<u64>,
}

impl Default for FormState {
    fn default() -> Self {
        Self::new()
    }
}

impl FormState {
    pub fn new() -> Self {
        let fields = FieldName::ALL
            .into_iter()
            .map(|field| (field, FieldSlot::default()))
            .collect();
        let (revision, _) = watch::channel(0);

        Self {
            inner: Mutex::new(FormInner {
                fields,
                submit: SubmitControl::default(),
            }),
            revision,
        }
    }

    fn lock(&self) -> MutexGuard<'_, FormInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn bump(&self) {
        self.revision.send_modify(|rev| *rev = rev.wrapping_add(1));
    }

    /// Subscribe to mutation notifications. The value is a revision counter.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    pub fn value(&self, field: FieldName) -> String {
        self.lock()
            .fields
            .get(&field)
            .map(|slot| slot.value.clone())
            .unwrap_or_default()
    }

    /// Overwrite a field's value. This is the programmatic path; it bypasses input and paste
    /// handlers entirely.
    pub fn set_value(&self, field: FieldName, value: impl Into<String>) {
        let value = value.into();
        {
            let mut inner = self.lock();
            let slot = inner.fields.entry(field).or_default();
            if slot.value == value {
                return;
            }
            slot.value = value;
        }
        self.bump();
    }

    pub fn status(&self, field: FieldName) -> FieldStatus {
        self.lock()
            .fields
            .get(&field)
            .map(|slot| slot.status)
            .unwrap_or_default()
    }

    pub fn set_status(&self, field: FieldName, status: FieldStatus) {
        self.lock().fields.entry(field).or_default().status = status;
        self.bump();
    }

    pub fn is_focused(&self, field: FieldName) -> bool {
        self.lock()
            .fields
            .get(&field)
            .map(|slot| slot.focused)
            .unwrap_or(false)
    }

    pub fn set_focused(&self, field: FieldName, focused: bool) {
        self.lock().fields.entry(field).or_default().focused = focused;
        self.bump();
    }

    pub fn submit_control(&self) -> SubmitControl {
        self.lock().submit
    }

    /// Reflect LoadingState onto the submit control: loading disables it.
    pub fn set_loading(&self, loading: bool) {
        self.lock().submit = SubmitControl {
            disabled: loading,
            loading,
        };
        self.bump();
    }

    /// Clear every user-editable field along with its validation mark and focus flag.
    ///
    /// The guarded date keeps its value; the guard reasserts it separately.
    pub fn reset(&self) {
        {
            let mut inner = self.lock();
            for (field, slot) in inner.fields.iter_mut() {
                slot.status = FieldStatus::Unmarked;
                slot.focused = false;
                if field.is_user_editable() {
                    slot.value.clear();
                }
            }
        }
        self.bump();
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let inner = self.lock();
        let value = |field: FieldName| {
            inner
                .fields
                .get(&field)
                .map(|slot| slot.value.clone())
                .unwrap_or_default()
        };

        FormSnapshot {
            field1: value(FieldName::Name),
            field2: value(FieldName::Date),
            field3: value(FieldName::Report),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reset_clears_editable_fields_and_marks() {
        let form = FormState::new();
        form.set_value(FieldName::Name, "Alice");
        form.set_value(FieldName::Date, "November 1, 2025");
        form.set_value(FieldName::Report, "Completed the report.");
        form.set_status(FieldName::Name, FieldStatus::Valid);
        form.set_focused(FieldName::Report, true);

        form.reset();

        let snapshot = form.snapshot();
        assert_eq!(snapshot.field1, "");
        assert_eq!(snapshot.field2, "November 1, 2025");
        assert_eq!(snapshot.field3, "");
        assert_eq!(form.status(FieldName::Name), FieldStatus::Unmarked);
        assert!(!form.is_focused(FieldName::Report));
    }

    #[test]
    fn loading_disables_submit_control() {
        let form = FormState::new();
        assert_eq!(form.submit_control(), SubmitControl::default());

        form.set_loading(true);
        assert_eq!(
            form.submit_control(),
            SubmitControl {
                disabled: true,
                loading: true
            }
        );

        form.set_loading(false);
        assert!(!form.submit_control().disabled);
    }

    #[test]
    fn mutations_bump_revision_but_identical_writes_do_not() {
        let form = FormState::new();
        let mut rx = form.subscribe();

        form.set_value(FieldName::Name, "Alice");
        assert!(rx.has_changed().unwrap());
        rx.borrow_and_update();

        form.set_value(FieldName::Name, "Alice");
        assert!(!rx.has_changed().unwrap());
    }

    #[test]
    fn snapshot_reads_by_field() {
        let form = FormState::new();
        form.set_value(FieldName::Report, "Shipped the release.");
        let snapshot = form.snapshot();
        assert_eq!(snapshot.get(FieldName::Report), "Shipped the release.");
        assert_eq!(snapshot.get(FieldName::Name), "");
    }
}
