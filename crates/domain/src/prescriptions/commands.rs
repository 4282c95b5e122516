use serde::{Deserialize, Serialize};

use crate::payloads::{Attachment, ScanRecord, StepData};

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub enum Command {
    /// Create the prescription once a patient is selected
    StartPrescription { id: String, patient_id: String },

    /// Persist one step's payload; the last write wins
    SaveStep { payload: StepData },

    /// Record uploaded foot scans
    AddScans { scans: Vec<ScanRecord> },

    /// Record an uploaded attachment
    AddAttachment { attachment: Attachment },

    /// Send to the lab
    SubmitPrescription,
}
