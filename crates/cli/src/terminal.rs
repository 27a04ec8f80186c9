//! Terminal rendering of the form and its notification region.

use relay_core::{
    FieldName, FieldStatus, FormState, NotificationKind, NotificationState, NotificationSurface,
};

/// Prints notifications to stdout as they appear and disappear.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalSurface;

impl NotificationSurface for TerminalSurface {
    fn render(&self, state: &NotificationState) {
        println!("{}", format_notification(state));
    }

    fn conceal(&self) {
        println!("   (notification dismissed)");
    }
}

pub fn format_notification(state: &NotificationState) -> String {
    let marker = match state.kind {
        NotificationKind::Success => "[ok]",
        NotificationKind::Error => "[!!]",
    };
    format!("{marker} {} <{}>", state.message, state.kind.style().icon)
}

/// One line per field plus the submit control.
pub fn describe_form(form: &FormState) -> String {
    let mut lines: Vec<String> = FieldName::ALL
        .into_iter()
        .map(|field| {
            let status = match form.status(field) {
                FieldStatus::Unmarked => String::new(),
                other => format!(" [{other}]"),
            };
            let focus = if form.is_focused(field) { " *" } else { "" };
            let lock = if field.is_user_editable() { "" } else { " (locked)" };
            format!(
                "{:<6} {:<7}{lock}: {}{status}{focus}",
                field.wire_name(),
                field.label(),
                form.value(field)
            )
        })
        .collect();

    let submit = form.submit_control();
    lines.push(if submit.loading {
        "[ Submitting... ] (disabled)".to_string()
    } else if submit.disabled {
        "[ Submit ] (disabled)".to_string()
    } else {
        "[ Submit ]".to_string()
    });

    lines.join("\n")
}
