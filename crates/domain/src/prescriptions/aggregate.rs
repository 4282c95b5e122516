use std::collections::{BTreeMap, BTreeSet};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use cqrs_es::Aggregate;
use serde::{Deserialize, Serialize};

use crate::errors::Error;
use crate::payloads::{Attachment, ScanRecord, StepData};
use crate::steps::{self, StepId};

use super::{Command, Event};

/// Prescription lifecycle status
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum PrescriptionStatus {
    /// Being authored in the wizard
    #[default]
    Draft,
    /// Sent to the lab
    Submitted,
}

impl PrescriptionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PrescriptionStatus::Draft => "draft",
            PrescriptionStatus::Submitted => "submitted",
        }
    }
}

/// Prescription aggregate
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct Prescription {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub status: PrescriptionStatus,

    pub patient_id: Option<String>,

    // Latest saved payload per step
    pub steps: BTreeMap<StepId, StepData>,
    pub scans: Vec<ScanRecord>,
    pub attachments: Vec<Attachment>,
}

pub const AGGREGATE_TYPE: &str = "Prescription";

#[derive(Clone, Default)]
pub struct Services {}

#[async_trait]
impl Aggregate for Prescription {
    type Command = Command;
    type Event = Event;
    type Error = Error;
    type Services = Services;

    fn aggregate_type() -> String {
        AGGREGATE_TYPE.to_string()
    }

    async fn handle(
        &self,
        command: Self::Command,
        _services: &Self::Services,
    ) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            Command::StartPrescription { id, patient_id } => {
                self.validate_new()?;
                if patient_id.trim().is_empty() {
                    return Err(Error::validation("Please select a patient"));
                }

                Ok(vec![Event::PrescriptionStarted {
                    id,
                    patient_id,
                    created_at: Utc::now(),
                    status: PrescriptionStatus::Draft,
                }])
            }

            Command::SaveStep { payload } => {
                self.validate_draft("save")?;
                self.validate_payload(&payload)?;

                Ok(vec![Event::StepSaved {
                    id: self.id.clone(),
                    payload,
                    updated_at: Utc::now(),
                }])
            }

            Command::AddScans { scans } => {
                self.validate_draft("upload scans")?;
                if scans.is_empty() {
                    return Err(Error::validation("No scan files received"));
                }

                Ok(vec![Event::ScansUploaded {
                    id: self.id.clone(),
                    scans,
                    updated_at: Utc::now(),
                }])
            }

            Command::AddAttachment { attachment } => {
                self.validate_draft("attach")?;

                Ok(vec![Event::AttachmentAdded {
                    id: self.id.clone(),
                    attachment,
                    updated_at: Utc::now(),
                }])
            }

            Command::SubmitPrescription => {
                self.validate_draft("submit")?;
                self.validate_can_submit()?;

                Ok(vec![Event::PrescriptionSubmitted {
                    id: self.id.clone(),
                    submitted_at: Utc::now(),
                }])
            }
        }
    }

    fn apply(&mut self, event: Self::Event) {
        match event {
            Event::PrescriptionStarted {
                id,
                patient_id,
                created_at,
                status,
            } => {
                self.id = id;
                self.patient_id = Some(patient_id);
                self.created_at = created_at;
                self.updated_at = created_at;
                self.status = status;
            }

            Event::StepSaved {
                payload, updated_at, ..
            } => {
                self.steps.insert(payload.step(), payload);
                self.updated_at = updated_at;
            }

            Event::ScansUploaded {
                scans, updated_at, ..
            } => {
                // A new upload for a foot replaces the previous one.
                for scan in scans {
                    self.scans.retain(|s| s.foot != scan.foot);
                    self.scans.push(scan);
                }
                self.updated_at = updated_at;
            }

            Event::AttachmentAdded {
                attachment,
                updated_at,
                ..
            } => {
                self.attachments.push(attachment);
                self.updated_at = updated_at;
            }

            Event::PrescriptionSubmitted { submitted_at, .. } => {
                self.status = PrescriptionStatus::Submitted;
                self.submitted_at = Some(submitted_at);
                self.updated_at = submitted_at;
            }
        }
    }
}

impl Prescription {
    /// Steps with data the server has confirmed.
    pub fn saved_steps(&self) -> BTreeSet<StepId> {
        steps::steps()
            .iter()
            .map(|s| s.id)
            .filter(|id| self.has_saved(*id))
            .collect()
    }

    pub fn has_saved(&self, step: StepId) -> bool {
        match step {
            StepId::Patient => self.patient_id.is_some(),
            StepId::Scans => {
                let feet: BTreeSet<_> = self.scans.iter().map(|s| s.foot.as_str()).collect();
                feet.len() == 2
            }
            other => self.steps.contains_key(&other),
        }
    }

    pub fn step(&self, step: StepId) -> Option<&StepData> {
        self.steps.get(&step)
    }

    fn validate_new(&self) -> Result<(), Error> {
        if !self.id.is_empty() {
            return Err(Error::Uniqueness {
                field: "id".to_string(),
            });
        }
        Ok(())
    }

    fn validate_draft(&self, action: &str) -> Result<(), Error> {
        if self.id.is_empty() {
            return Err(Error::NotFound {
                entity: AGGREGATE_TYPE.to_string(),
            });
        }
        if self.status == PrescriptionStatus::Submitted {
            return Err(Error::InvalidStateTransition {
                from: self.status.as_str().to_string(),
                to: action.to_string(),
            });
        }
        Ok(())
    }

    fn validate_payload(&self, payload: &StepData) -> Result<(), Error> {
        match payload {
            StepData::Patient(_) => Err(Error::validation(
                "The patient is chosen when the prescription is created",
            )),
            StepData::Scans(_) => Err(Error::validation(
                "Scans are uploaded as files, not saved as step data",
            )),
            other if other.prescription_id() != Some(self.id.as_str()) => Err(
                Error::validation(format!(
                    "{} payload belongs to another prescription",
                    other.step()
                )),
            ),
            _ => Ok(()),
        }
    }

    fn validate_can_submit(&self) -> Result<(), Error> {
        let missing: Vec<&str> = steps::steps()
            .iter()
            .map(|s| s.id)
            .filter(|id| *id != StepId::Notes && !self.has_saved(*id))
            .map(|id| id.title())
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(format!(
                "Cannot submit prescription before completing: {}",
                missing.join(", ")
            )))
        }
    }
}
