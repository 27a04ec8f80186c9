//! Constants used throughout the relay core crate.
//!
//! User-facing notification text, default endpoints and the fixed timings of the form
//! controller live here so the binaries and tests agree on them.

use std::time::Duration;

/// Default reference-data endpoint when none is configured.
pub const DEFAULT_USERS_URL: &str = "http://127.0.0.1:3000/users";

/// Default webhook endpoint when none is configured.
pub const DEFAULT_WEBHOOK_URL: &str = "http://127.0.0.1:3000/webhook";

/// How long a notification stays visible without another `show`.
pub const NOTIFICATION_AUTO_HIDE: Duration = Duration::from_millis(5000);

/// Delay between a successful submission and the form reset.
pub const RESET_DELAY: Duration = Duration::from_millis(2000);

/// Extra delay after the reset before the date field is reasserted.
pub const GUARD_SETTLE: Duration = Duration::from_millis(50);

/// Upper bound on a single HTTP exchange.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum trimmed length of a name before it is looked up.
pub const MIN_NAME_LEN: usize = 2;

/// Minimum trimmed length of the report body.
pub const MIN_REPORT_LEN: usize = 10;

/// Key that dismisses a visible notification.
pub const DISMISS_KEY: &str = "Escape";

/// Shown after a submission the webhook accepted.
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Form submitted successfully!";

/// Fallback when a failure carries no usable message.
pub const SUBMIT_FAILURE_MESSAGE: &str = "Failed to submit form. Please try again.";

/// Message carried by the synthetic acknowledgement for non-JSON success bodies.
pub const SYNTHETIC_ACK_MESSAGE: &str = "Data received successfully";

/// Notification styling for successes: background and icon class.
pub const SUCCESS_BACKGROUND: &str = "linear-gradient(135deg, #48bb78, #38a169)";
pub const SUCCESS_ICON: &str = "fas fa-check-circle";

/// Notification styling for errors: background and icon class.
pub const ERROR_BACKGROUND: &str = "linear-gradient(135deg, #f56565, #e53e3e)";
pub const ERROR_ICON: &str = "fas fa-exclamation-circle";
