//! What the wizard tells its UI.

use domain::StepId;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Indicator {
    Active,
    Completed,
    Pending,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct StepIndicator {
    pub step: StepId,
    pub title: &'static str,
    pub indicator: Indicator,
}

/// Progress bar and navigation button state after a refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ProgressSnapshot {
    pub current_step: StepId,
    pub title: &'static str,
    pub indicators: Vec<StepIndicator>,
    pub prev_enabled: bool,
    pub show_next: bool,
    pub show_submit: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    Success,
    Info,
    Error,
}

/// Transient notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }
}

pub trait WizardView: Send + Sync {
    fn refresh(&self, snapshot: &ProgressSnapshot);

    /// Navigation controls are disabled while a transition is in flight.
    fn set_navigation_enabled(&self, enabled: bool);

    fn notify(&self, notice: Notice);

    fn redirect(&self, path: &str);
}
