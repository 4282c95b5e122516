use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;

use super::id_string;

/// The patient chosen on the first step. Saving it creates the prescription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientSelection {
    pub patient_id: String,
}

impl PatientSelection {
    pub fn new(patient_id: impl Into<String>) -> Result<Self, Error> {
        let patient_id = patient_id.into();
        if patient_id.trim().is_empty() {
            return Err(Error::validation("Please select a patient"));
        }
        Ok(Self { patient_id })
    }

    pub fn from_json(wire: &Value) -> Result<Self, Error> {
        let patient_id = wire
            .get("patient_id")
            .or_else(|| wire.get("patient"))
            .and_then(id_string)
            .ok_or_else(|| Error::validation("Please select a patient"))?;
        Ok(Self { patient_id })
    }
}
