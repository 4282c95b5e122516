use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::schema::FieldSpec;
use crate::steps::StepId;

use super::StepPayload;

const TURNAROUNDS: &[&str] = &["standard", "express", "urgent"];

const FIELDS: &[FieldSpec] = &[
    FieldSpec::flag("contact_clinician", "contactClinician", "Contact clinician", false),
    FieldSpec::flag(
        "confirm_before_manufacture",
        "confirmBeforeManufacture",
        "Confirm before manufacture",
        false,
    ),
    FieldSpec::flag(
        "clinician_computer_aided_design",
        "clinicianCAD",
        "Clinician CAD",
        false,
    ),
    FieldSpec::choice("turnaround", "turnaroundTime", "Turnaround", TURNAROUNDS, "standard"),
    FieldSpec::text("general_notes", "generalNotes", "General notes"),
    FieldSpec::text("left_foot_notes", "leftFootNotes", "Left foot notes"),
    FieldSpec::text("right_foot_notes", "rightFootNotes", "Right foot notes"),
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Turnaround {
    /// 5 working days.
    #[default]
    Standard,
    /// 3 working days.
    Express,
    /// 1 working day.
    Urgent,
}

/// Administration options and free-text notes kept on the prescription itself.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NotesAttachments {
    pub prescription_id: String,
    pub contact_clinician: bool,
    pub confirm_before_manufacture: bool,
    pub clinician_computer_aided_design: bool,
    pub turnaround: Turnaround,
    pub general_notes: String,
    pub left_foot_notes: String,
    pub right_foot_notes: String,
}

impl StepPayload for NotesAttachments {
    const STEP: StepId = StepId::Notes;

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn prescription_id(&self) -> &str {
        &self.prescription_id
    }
}

/// A document the clinician is about to attach.
#[derive(Clone, Debug, PartialEq)]
pub struct AttachmentFile {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl AttachmentFile {
    pub fn validate(&self) -> Result<(), Error> {
        if self.file_name.trim().is_empty() {
            return Err(Error::validation("attachment needs a file name"));
        }
        if self.bytes.is_empty() {
            return Err(Error::validation(format!(
                "attachment {} is empty",
                self.file_name
            )));
        }
        Ok(())
    }
}

/// An attachment stored against a prescription.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: String,
    pub file_name: String,
    pub size: usize,
    pub uploaded_at: DateTime<Utc>,
}
