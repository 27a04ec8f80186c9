use crate::constants::SUBMIT_FAILURE_MESSAGE;

/// Every failure the form controller can surface.
///
/// The `Display` text of each variant is exactly what the notification shows, so callers can
/// hand `err.to_string()` straight to the presenter.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RelayError {
    /// Field-level or submission-level validation failed. The inner text names the field for
    /// logs; the notification stays generic.
    #[error("Please fill in all fields correctly")]
    Validation(String),
    #[error("Invalid name. Please enter a valid name from the system.")]
    InvalidName,
    #[error("HTTP error! status: {status}")]
    Http { status: u16 },
    #[error("Unable to connect to server. Please check your internet connection and try again.")]
    Connectivity,
    /// The reference-data fetch failed or its body did not parse.
    #[error("Failed to load user data. Please refresh the page.")]
    ReferenceLoad(String),
    /// Anything else, carried with its original message.
    #[error("{0}")]
    Unknown(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

impl RelayError {
    /// The text a notification should carry for this error.
    ///
    /// Falls back to a generic message when an unknown error arrived without one.
    pub fn user_message(&self) -> String {
        match self {
            RelayError::Unknown(message) if message.trim().is_empty() => {
                SUBMIT_FAILURE_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type RelayResult<T> = std::result::Result<T, RelayError>;
