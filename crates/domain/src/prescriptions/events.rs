use chrono::{DateTime, Utc};
use cqrs_es::DomainEvent;
use serde::{Deserialize, Serialize};

use crate::payloads::{Attachment, ScanRecord, StepData};

use super::aggregate::PrescriptionStatus;

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Event {
    PrescriptionStarted {
        id: String,
        patient_id: String,
        created_at: DateTime<Utc>,
        status: PrescriptionStatus,
    },

    StepSaved {
        id: String,
        payload: StepData,
        updated_at: DateTime<Utc>,
    },

    ScansUploaded {
        id: String,
        scans: Vec<ScanRecord>,
        updated_at: DateTime<Utc>,
    },

    AttachmentAdded {
        id: String,
        attachment: Attachment,
        updated_at: DateTime<Utc>,
    },

    PrescriptionSubmitted {
        id: String,
        submitted_at: DateTime<Utc>,
    },
}

impl DomainEvent for Event {
    fn event_type(&self) -> String {
        match self {
            Event::PrescriptionStarted { .. } => "Prescription:Started".to_string(),
            Event::StepSaved { .. } => "Prescription:StepSaved".to_string(),
            Event::ScansUploaded { .. } => "Prescription:ScansUploaded".to_string(),
            Event::AttachmentAdded { .. } => "Prescription:AttachmentAdded".to_string(),
            Event::PrescriptionSubmitted { .. } => "Prescription:Submitted".to_string(),
        }
    }

    fn event_version(&self) -> String {
        "1.0".to_string()
    }
}
