//! Orthotics Prescription Domain Models

/// Domain errors
pub mod errors;

/// Step registry
pub mod steps;

/// Field tables and value normalization
pub mod schema;

/// Canonical step payloads
pub mod payloads;

/// Prescription aggregate
pub mod prescriptions;

/// Patients, orders and invoices
pub mod records;

pub use errors::Error;
pub use payloads::{StepData, StepPayload};
pub use steps::{SaveMethod, Step, StepId};
