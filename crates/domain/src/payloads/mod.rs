//! Canonical per-step payloads.
//!
//! Schema-driven payloads are flat records whose left/right fields carry a
//! `left_`/`right_` prefix. Their form representation and their normalization
//! come from the static field tables, so every conversion funnels through
//! [`crate::schema::normalize_values`].

mod clinical;
mod device;
mod intrinsic;
mod material;
mod notes;
mod offloading;
mod patient;
mod plantar;
mod posting;
mod scans;
mod shoe;

use std::fmt;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::Error;
use crate::schema::{self, FieldSpec, FormValues, SchemaError};
use crate::steps::StepId;

pub use clinical::ClinicalMeasures;
pub use device::DeviceOptions;
pub use intrinsic::{IntrinsicAdjustments, SkiveInclination, SkiveType};
pub use material::MaterialSelection;
pub use notes::{Attachment, AttachmentFile, NotesAttachments, Turnaround};
pub use offloading::Offloading;
pub use patient::PatientSelection;
pub use plantar::PlantarModifiers;
pub use posting::Posting;
pub use scans::{Foot, ScanFile, ScanRecord, ScanUpload, ACCEPTED_SCAN_EXTENSIONS};
pub use shoe::ShoeFitting;

/// A step payload described by a field table.
pub trait StepPayload:
    Serialize + DeserializeOwned + Clone + PartialEq + fmt::Debug + Send + Sync + 'static
{
    const STEP: StepId;

    fn fields() -> &'static [FieldSpec];

    fn prescription_id(&self) -> &str;

    fn to_values(&self) -> FormValues {
        match serde_json::to_value(self) {
            Ok(json) => schema::values_from_json(Self::fields(), &json),
            Err(_) => schema::defaults(Self::fields()),
        }
    }

    fn from_values(prescription_id: &str, values: &FormValues) -> Result<Self, Error> {
        let normalized = schema::normalize_values(Self::fields(), values);
        let mut object = schema::values_to_json(&normalized);
        object.insert(
            "prescription_id".to_string(),
            Value::String(prescription_id.to_string()),
        );
        serde_json::from_value(Value::Object(object))
            .map_err(|e| Error::validation(format!("{} payload: {e}", Self::STEP)))
    }

    /// The all-default payload for a prescription.
    fn defaults(prescription_id: &str) -> Result<Self, Error> {
        Self::from_values(prescription_id, &FormValues::new())
    }

    fn normalized(&self) -> Result<Self, Error> {
        Self::from_values(self.prescription_id(), &self.to_values())
    }

    /// Reshape a wire object into the form shape. Identity for most steps.
    fn wire_to_form(wire: Value) -> Value {
        wire
    }

    fn form_to_wire(form: Value) -> Value {
        form
    }

    fn to_wire(&self) -> Result<Value, Error> {
        serde_json::to_value(self)
            .map(Self::form_to_wire)
            .map_err(|e| Error::validation(format!("{} payload: {e}", Self::STEP)))
    }

    /// Parse a loosely typed wire object. Values are coerced and normalized
    /// against the field table; only `prescription_id` is required.
    fn from_json(wire: &Value) -> Result<Self, Error> {
        let form = Self::wire_to_form(wire.clone());
        let prescription_id = form
            .get("prescription_id")
            .and_then(id_string)
            .ok_or_else(|| Error::validation("prescription_id is required"))?;
        Self::from_values(
            &prescription_id,
            &schema::values_from_json(Self::fields(), &form),
        )
    }
}

/// Identifiers arrive either as strings or as integers.
pub fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Saved data for any step.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", content = "payload", rename_all = "lowercase")]
pub enum StepData {
    Patient(PatientSelection),
    Scans(ScanUpload),
    Clinical(ClinicalMeasures),
    Intrinsic(IntrinsicAdjustments),
    Offloading(Offloading),
    Plantar(PlantarModifiers),
    Posting(Posting),
    Material(MaterialSelection),
    Shoe(ShoeFitting),
    Device(DeviceOptions),
    Notes(NotesAttachments),
}

impl StepData {
    pub fn step(&self) -> StepId {
        match self {
            StepData::Patient(_) => StepId::Patient,
            StepData::Scans(_) => StepId::Scans,
            StepData::Clinical(_) => StepId::Clinical,
            StepData::Intrinsic(_) => StepId::Intrinsic,
            StepData::Offloading(_) => StepId::Offloading,
            StepData::Plantar(_) => StepId::Plantar,
            StepData::Posting(_) => StepId::Posting,
            StepData::Material(_) => StepId::Material,
            StepData::Shoe(_) => StepId::Shoe,
            StepData::Device(_) => StepId::Device,
            StepData::Notes(_) => StepId::Notes,
        }
    }

    /// `None` only for the patient selection, which precedes the prescription.
    pub fn prescription_id(&self) -> Option<&str> {
        match self {
            StepData::Patient(_) => None,
            StepData::Scans(p) => Some(&p.prescription_id),
            StepData::Clinical(p) => Some(p.prescription_id()),
            StepData::Intrinsic(p) => Some(p.prescription_id()),
            StepData::Offloading(p) => Some(p.prescription_id()),
            StepData::Plantar(p) => Some(p.prescription_id()),
            StepData::Posting(p) => Some(p.prescription_id()),
            StepData::Material(p) => Some(p.prescription_id()),
            StepData::Shoe(p) => Some(p.prescription_id()),
            StepData::Device(p) => Some(p.prescription_id()),
            StepData::Notes(p) => Some(p.prescription_id()),
        }
    }

    pub fn to_wire(&self) -> Result<Value, Error> {
        match self {
            StepData::Patient(p) => serde_json::to_value(p)
                .map_err(|e| Error::validation(format!("patient payload: {e}"))),
            StepData::Scans(p) => Ok(serde_json::json!({
                "prescription_id": p.prescription_id,
                "left_foot": p.left.as_ref().map(|f| f.file_name.clone()),
                "right_foot": p.right.as_ref().map(|f| f.file_name.clone()),
            })),
            StepData::Clinical(p) => p.to_wire(),
            StepData::Intrinsic(p) => p.to_wire(),
            StepData::Offloading(p) => p.to_wire(),
            StepData::Plantar(p) => p.to_wire(),
            StepData::Posting(p) => p.to_wire(),
            StepData::Material(p) => p.to_wire(),
            StepData::Shoe(p) => p.to_wire(),
            StepData::Device(p) => p.to_wire(),
            StepData::Notes(p) => p.to_wire(),
        }
    }

    /// Parse a wire object for a step. Scans travel as multipart and have no
    /// JSON form.
    pub fn from_wire(step: StepId, wire: &Value) -> Result<StepData, Error> {
        Ok(match step {
            StepId::Patient => StepData::Patient(PatientSelection::from_json(wire)?),
            StepId::Scans => {
                return Err(Error::validation("scans are uploaded as multipart files"))
            }
            StepId::Clinical => StepData::Clinical(ClinicalMeasures::from_json(wire)?),
            StepId::Intrinsic => StepData::Intrinsic(IntrinsicAdjustments::from_json(wire)?),
            StepId::Offloading => StepData::Offloading(Offloading::from_json(wire)?),
            StepId::Plantar => StepData::Plantar(PlantarModifiers::from_json(wire)?),
            StepId::Posting => StepData::Posting(Posting::from_json(wire)?),
            StepId::Material => StepData::Material(MaterialSelection::from_json(wire)?),
            StepId::Shoe => StepData::Shoe(ShoeFitting::from_json(wire)?),
            StepId::Device => StepData::Device(DeviceOptions::from_json(wire)?),
            StepId::Notes => StepData::Notes(NotesAttachments::from_json(wire)?),
        })
    }
}

macro_rules! step_data_from {
    ($($variant:ident($payload:ty)),* $(,)?) => {
        $(
            impl From<$payload> for StepData {
                fn from(payload: $payload) -> Self {
                    StepData::$variant(payload)
                }
            }
        )*
    };
}

step_data_from!(
    Patient(PatientSelection),
    Scans(ScanUpload),
    Clinical(ClinicalMeasures),
    Intrinsic(IntrinsicAdjustments),
    Offloading(Offloading),
    Plantar(PlantarModifiers),
    Posting(Posting),
    Material(MaterialSelection),
    Shoe(ShoeFitting),
    Device(DeviceOptions),
    Notes(NotesAttachments),
);

/// Apply the shared normalization rules to a wire object for `step`.
pub fn normalize_wire(step: StepId, wire: &Value) -> Result<Value, Error> {
    StepData::from_wire(step, wire)?.to_wire()
}

/// Field table for a schema-driven step.
pub fn fields_for(step: StepId) -> Option<&'static [FieldSpec]> {
    match step {
        StepId::Patient | StepId::Scans => None,
        StepId::Clinical => Some(ClinicalMeasures::fields()),
        StepId::Intrinsic => Some(IntrinsicAdjustments::fields()),
        StepId::Offloading => Some(Offloading::fields()),
        StepId::Plantar => Some(PlantarModifiers::fields()),
        StepId::Posting => Some(Posting::fields()),
        StepId::Material => Some(MaterialSelection::fields()),
        StepId::Shoe => Some(ShoeFitting::fields()),
        StepId::Device => Some(DeviceOptions::fields()),
        StepId::Notes => Some(NotesAttachments::fields()),
    }
}

/// Validate every field table; run once at startup.
pub fn validate_all() -> Result<(), SchemaError> {
    crate::steps::steps()
        .iter()
        .filter_map(|s| fields_for(s.id))
        .try_for_each(schema::validate_schema)
}
