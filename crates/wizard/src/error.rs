use domain::StepId;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum WizardError {
    /// Non-2xx response or network failure.
    #[error("Request failed ({status}): {message}")]
    Transport { status: u16, message: String },

    /// Client-side check failed before any request was made.
    #[error("{0}")]
    Validation(String),

    #[error("Cannot move from {from} to {to}")]
    IllegalTransition { from: StepId, to: String },

    #[error("Unknown step: {0}")]
    UnknownStep(String),

    #[error("No prescription ID found. Please start over.")]
    MissingPrescription,

    #[error("Modal not found: {0}")]
    ModalNotFound(String),

    #[error("Invalid response payload: {0}")]
    Payload(String),
}

impl WizardError {
    /// Status 0 marks a request that never got a response.
    pub fn network(err: impl std::fmt::Display) -> Self {
        Self::Transport {
            status: 0,
            message: format!("Network error: {err}"),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, WizardError::Transport { status: 404, .. })
    }
}

impl From<domain::Error> for WizardError {
    fn from(err: domain::Error) -> Self {
        match err {
            domain::Error::UnknownStep { id } => WizardError::UnknownStep(id),
            domain::Error::Validation { message } => WizardError::Validation(message),
            other => WizardError::Validation(other.to_string()),
        }
    }
}

impl From<reqwest::Error> for WizardError {
    fn from(err: reqwest::Error) -> Self {
        match err.status() {
            Some(status) => WizardError::Transport {
                status: status.as_u16(),
                message: err.to_string(),
            },
            None if err.is_decode() => WizardError::Payload(err.to_string()),
            None => WizardError::network(err),
        }
    }
}

impl From<serde_json::Error> for WizardError {
    fn from(err: serde_json::Error) -> Self {
        WizardError::Payload(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WizardError>;
