//! Date field guard.
//!
//! Keeps `field2` equal to today's formatted date. Direct input and paste are suppressed and
//! undone; anything that writes the field some other way is caught by the observer task, which
//! wakes on every form mutation and reasserts the date when the value has drifted.

use crate::clock::{format_date, Clock};
use crate::events::{FormEventHandler, Propagation};
use crate::form::FormState;
use relay_types::FieldName;
use std::sync::Arc;
use tokio::task::JoinHandle;

const GUARDED: FieldName = FieldName::Date;

#[derive(Clone)]
pub struct FieldGuard {
    form: Arc<FormState>,
    clock: Arc<dyn Clock>,
}

impl FieldGuard {
    pub fn new(form: Arc<FormState>, clock: Arc<dyn Clock>) -> Self {
        Self { form, clock }
    }

    /// The value the field must hold right now.
    pub fn expected(&self) -> String {
        format_date(self.clock.today())
    }

    /// Write today's date into the field if it holds anything else.
    ///
    /// Returns `true` when a correction was made.
    pub fn enforce(&self) -> bool {
        let expected = self.expected();
        if self.form.value(GUARDED) == expected {
            return false;
        }
        self.form.set_value(GUARDED, expected);
        true
    }

    /// Spawn the out-of-band observer. The task holds the form, so it runs until the returned
    /// handle is aborted.
    pub fn observe(&self) -> JoinHandle<()> {
        let guard = self.clone();
        let mut changes = self.form.subscribe();

        tokio::spawn(async move {
            while changes.changed().await.is_ok() {
                changes.borrow_and_update();
                if guard.enforce() {
                    tracing::warn!(field = %GUARDED, "guarded field was modified; date reasserted");
                }
            }
        })
    }
}

impl FormEventHandler for FieldGuard {
    fn on_input(&self, field: FieldName, value: &str) -> Propagation {
        if field != GUARDED {
            return Propagation::Continue;
        }
        tracing::debug!(attempted = %value, "rejected direct edit of guarded field");
        self.enforce();
        Propagation::PreventDefault
    }

    fn on_paste(&self, field: FieldName, _text: &str) -> Propagation {
        if field != GUARDED {
            return Propagation::Continue;
        }
        tracing::debug!("rejected paste into guarded field");
        self.enforce();
        Propagation::PreventDefault
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::events::{EventDispatcher, UiEvent};
    use chrono::NaiveDate;
    use std::time::Duration;

    fn setup() -> (Arc<FormState>, FieldGuard, FixedClock) {
        let form = Arc::new(FormState::new());
        let clock = FixedClock::new(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap());
        let guard = FieldGuard::new(form.clone(), Arc::new(clock.clone()));
        (form, guard, clock)
    }

    #[test]
    fn enforce_writes_today_once() {
        let (form, guard, _clock) = setup();
        assert!(guard.enforce());
        assert_eq!(form.value(FieldName::Date), "November 1, 2025");
        assert!(!guard.enforce());
    }

    #[test]
    fn direct_input_and_paste_are_undone() {
        let (form, guard, _clock) = setup();
        guard.enforce();

        let mut dispatcher = EventDispatcher::new(form.clone());
        dispatcher.register(Arc::new(guard.clone()));

        let propagation = dispatcher.dispatch(&UiEvent::Input {
            field: FieldName::Date,
            value: "January 1, 1970".into(),
        });
        assert_eq!(propagation, Propagation::PreventDefault);
        assert_eq!(form.value(FieldName::Date), "November 1, 2025");

        let propagation = dispatcher.dispatch(&UiEvent::Paste {
            field: FieldName::Date,
            text: "tomorrow".into(),
        });
        assert_eq!(propagation, Propagation::PreventDefault);
        assert_eq!(form.value(FieldName::Date), "November 1, 2025");
    }

    #[test]
    fn other_fields_are_left_alone() {
        let (_form, guard, _clock) = setup();
        assert_eq!(
            guard.on_input(FieldName::Name, "Alice"),
            Propagation::Continue
        );
        assert_eq!(
            guard.on_paste(FieldName::Report, "text"),
            Propagation::Continue
        );
    }

    #[tokio::test]
    async fn observer_reverts_programmatic_writes() {
        let (form, guard, _clock) = setup();
        guard.enforce();
        let observer = guard.observe();

        form.set_value(FieldName::Date, "spoofed");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(form.value(FieldName::Date), "November 1, 2025");
        observer.abort();
    }

    #[tokio::test]
    async fn date_rolls_over_on_next_pass_after_midnight() {
        let (form, guard, clock) = setup();
        guard.enforce();
        let observer = guard.observe();

        clock.set(NaiveDate::from_ymd_opt(2025, 11, 2).unwrap());
        // Any mutation wakes the observer.
        form.set_value(FieldName::Name, "Alice");
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(form.value(FieldName::Date), "November 2, 2025");
        observer.abort();
    }
}
