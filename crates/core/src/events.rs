//! UI-event abstraction.
//!
//! Components register a [`FormEventHandler`] with the [`EventDispatcher`] instead of attaching
//! callbacks to a rendering toolkit. Default effects follow browser ordering: an input event's
//! new value is already in the field when handlers run, while a paste is only inserted after
//! every handler has run and none of them prevented it.

use crate::form::FormState;
use relay_types::FieldName;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Focus(FieldName),
    Blur(FieldName),
    /// The field's whole value after the edit.
    Input { field: FieldName, value: String },
    /// Text about to be inserted at the end of the field.
    Paste { field: FieldName, text: String },
    KeyDown { key: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Propagation {
    Continue,
    PreventDefault,
}

impl Propagation {
    fn merge(self, other: Propagation) -> Propagation {
        match (self, other) {
            (Propagation::Continue, Propagation::Continue) => Propagation::Continue,
            _ => Propagation::PreventDefault,
        }
    }
}

/// Callbacks a component can register for. Every method defaults to doing nothing.
pub trait FormEventHandler: Send + Sync {
    fn on_focus(&self, _field: FieldName) -> Propagation {
        Propagation::Continue
    }

    fn on_blur(&self, _field: FieldName) -> Propagation {
        Propagation::Continue
    }

    fn on_input(&self, _field: FieldName, _value: &str) -> Propagation {
        Propagation::Continue
    }

    fn on_paste(&self, _field: FieldName, _text: &str) -> Propagation {
        Propagation::Continue
    }

    fn on_key_down(&self, _key: &str) -> Propagation {
        Propagation::Continue
    }
}

/// Delivers UI events to registered handlers in registration order.
pub struct EventDispatcher {
    form: Arc<FormState>,
    handlers: Vec<Arc<dyn FormEventHandler>>,
}

impl EventDispatcher {
    pub fn new(form: Arc<FormState>) -> Self {
        Self {
            form,
            handlers: Vec::new(),
        }
    }

    pub fn register(&mut self, handler: Arc<dyn FormEventHandler>) {
        self.handlers.push(handler);
    }

    pub fn dispatch(&self, event: &UiEvent) -> Propagation {
        tracing::debug!(?event, "dispatching ui event");

        match event {
            UiEvent::Focus(field) => self.each(|h| h.on_focus(*field)),
            UiEvent::Blur(field) => self.each(|h| h.on_blur(*field)),
            UiEvent::Input { field, value } => {
                self.form.set_value(*field, value.as_str());
                self.each(|h| h.on_input(*field, value))
            }
            UiEvent::Paste { field, text } => {
                let propagation = self.each(|h| h.on_paste(*field, text));
                if propagation == Propagation::Continue {
                    let mut value = self.form.value(*field);
                    value.push_str(text);
                    self.form.set_value(*field, value.as_str());
                    // Pasting also fires an input event once the text lands.
                    return self.each(|h| h.on_input(*field, &value));
                }
                propagation
            }
            UiEvent::KeyDown { key } => self.each(|h| h.on_key_down(key)),
        }
    }

    fn each(&self, mut call: impl FnMut(&dyn FormEventHandler) -> Propagation) -> Propagation {
        self.handlers
            .iter()
            .fold(Propagation::Continue, |acc, handler| {
                acc.merge(call(handler.as_ref()))
            })
    }
}

/// Floating-label behaviour: focusing a field marks it focused; blurring only clears the mark
/// when the field is empty so the label stays raised over a filled-in value.
pub struct FocusTracker {
    form: Arc<FormState>,
}

impl FocusTracker {
    pub fn new(form: Arc<FormState>) -> Self {
        Self { form }
    }
}

impl FormEventHandler for FocusTracker {
    fn on_focus(&self, field: FieldName) -> Propagation {
        self.form.set_focused(field, true);
        Propagation::Continue
    }

    fn on_blur(&self, field: FieldName) -> Propagation {
        if self.form.value(field).is_empty() {
            self.form.set_focused(field, false);
        }
        Propagation::Continue
    }
}
