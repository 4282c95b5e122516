//! Prescription intake wizard: navigation, modal sequencing and step
//! persistence against the portal API.

/// Wizard errors
pub mod error;

/// Client configuration
pub mod config;

/// Backend gateway
pub mod gateway;

/// Step fragment loading
pub mod content;

/// Progress and notices shown to the user
pub mod view;

pub mod controller;
pub mod sequencer;
pub mod form;
pub mod adapter;
pub mod debounce;
pub mod session;

#[cfg(test)]
mod test_support;

pub use adapter::{AdapterRegistry, SaveAck, StepAdapter};
pub use config::ClientConfig;
pub use controller::{WizardController, WizardState};
pub use error::{Result, WizardError};
pub use gateway::{Gateway, HttpGateway};
pub use sequencer::{ModalHost, ModalSequencer};
pub use session::IntakeSession;
