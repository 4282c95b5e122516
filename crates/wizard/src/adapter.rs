//! Per-step save adapters: collect the form into a canonical payload, persist
//! it through the gateway, and load it back.

use std::collections::BTreeMap;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use domain::payloads::{
    Attachment, AttachmentFile, ClinicalMeasures, DeviceOptions, Foot, IntrinsicAdjustments,
    MaterialSelection, NotesAttachments, Offloading, PatientSelection, PlantarModifiers, Posting,
    ScanFile, ScanUpload, ShoeFitting,
};
use domain::schema::FieldSpec;
use domain::steps::{self, StepId};
use domain::{StepData, StepPayload};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{Result, WizardError};
use crate::form::FormState;
use crate::gateway::Gateway;

/// What the backend confirmed for a save.
#[derive(Clone, Debug, PartialEq)]
pub struct SaveAck {
    pub step: StepId,
    pub prescription_id: String,
    pub response: Value,
}

#[async_trait]
pub trait StepAdapter: Send + Sync {
    fn step(&self) -> StepId;

    /// Controls bound while this step is mounted.
    fn fields(&self) -> &'static [FieldSpec] {
        &[]
    }

    /// Saved data, or `None` when the step has not been saved.
    async fn load(&self, gateway: &dyn Gateway, prescription_id: &str)
        -> Result<Option<StepData>>;

    /// Build the canonical payload from the form. No network access.
    fn collect(&self, form: &FormState, prescription_id: Option<&str>) -> Result<StepData>;

    async fn save(&self, gateway: &dyn Gateway, data: &StepData) -> Result<SaveAck>;

    /// Fill the form from saved data; `None` leaves the defaults.
    fn populate(&self, form: &mut FormState, data: Option<&StepData>) -> Result<()>;
}

fn require_prescription(prescription_id: Option<&str>) -> Result<&str> {
    prescription_id
        .filter(|id| !id.is_empty())
        .ok_or(WizardError::MissingPrescription)
}

fn mismatch(expected: StepId, data: &StepData) -> WizardError {
    WizardError::Payload(format!(
        "expected {expected} data, got {}",
        data.step()
    ))
}

/// Adapter for a step whose controls are described by a field table.
pub struct SchemaAdapter<P> {
    _payload: PhantomData<fn() -> P>,
}

impl<P> SchemaAdapter<P> {
    pub fn new() -> Self {
        Self {
            _payload: PhantomData,
        }
    }
}

impl<P> Default for SchemaAdapter<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: StepPayload + Into<StepData>> SchemaAdapter<P> {
    fn collect_payload(&self, form: &FormState, prescription_id: Option<&str>) -> Result<P> {
        let prescription_id = require_prescription(prescription_id)?;
        Ok(P::from_values(prescription_id, form.values())?)
    }

    fn populate_form(&self, form: &mut FormState, data: Option<&StepData>) -> Result<()> {
        let Some(data) = data else {
            form.apply(&domain::schema::defaults(P::fields()));
            return Ok(());
        };
        if data.step() != P::STEP {
            return Err(mismatch(P::STEP, data));
        }
        let payload = P::from_json(&data.to_wire()?)?;
        form.apply(&payload.to_values());
        Ok(())
    }
}

#[async_trait]
impl<P: StepPayload + Into<StepData>> StepAdapter for SchemaAdapter<P> {
    fn step(&self) -> StepId {
        P::STEP
    }

    fn fields(&self) -> &'static [FieldSpec] {
        P::fields()
    }

    async fn load(
        &self,
        gateway: &dyn Gateway,
        prescription_id: &str,
    ) -> Result<Option<StepData>> {
        match gateway.fetch_step(prescription_id, P::STEP).await? {
            Some(wire) => Ok(Some(StepData::from_wire(P::STEP, &wire)?)),
            None => {
                debug!("No saved {} data for {}", P::STEP, prescription_id);
                Ok(None)
            }
        }
    }

    fn collect(&self, form: &FormState, prescription_id: Option<&str>) -> Result<StepData> {
        self.collect_payload(form, prescription_id).map(Into::into)
    }

    async fn save(&self, gateway: &dyn Gateway, data: &StepData) -> Result<SaveAck> {
        if data.step() != P::STEP {
            return Err(mismatch(P::STEP, data));
        }
        let prescription_id = require_prescription(data.prescription_id())?;
        let response = gateway
            .save_step(prescription_id, P::STEP, &data.to_wire()?)
            .await?;
        info!("Saved {} for {}", P::STEP, prescription_id);
        Ok(SaveAck {
            step: P::STEP,
            prescription_id: prescription_id.to_string(),
            response,
        })
    }

    fn populate(&self, form: &mut FormState, data: Option<&StepData>) -> Result<()> {
        self.populate_form(form, data)
    }
}

/// Selecting the patient creates the prescription.
#[derive(Default)]
pub struct PatientAdapter;

#[async_trait]
impl StepAdapter for PatientAdapter {
    fn step(&self) -> StepId {
        StepId::Patient
    }

    async fn load(
        &self,
        gateway: &dyn Gateway,
        prescription_id: &str,
    ) -> Result<Option<StepData>> {
        Ok(gateway
            .fetch_prescription(prescription_id)
            .await?
            .and_then(|record| PatientSelection::from_json(&record).ok())
            .map(StepData::Patient))
    }

    fn collect(&self, form: &FormState, _prescription_id: Option<&str>) -> Result<StepData> {
        let patient = PatientSelection::new(form.selected_patient().unwrap_or_default())?;
        Ok(StepData::Patient(patient))
    }

    async fn save(&self, gateway: &dyn Gateway, data: &StepData) -> Result<SaveAck> {
        let StepData::Patient(selection) = data else {
            return Err(mismatch(StepId::Patient, data));
        };
        let summary = gateway.create_prescription(&selection.patient_id).await?;
        info!(
            "Created prescription {} for patient {}",
            summary.id, selection.patient_id
        );
        Ok(SaveAck {
            step: StepId::Patient,
            prescription_id: summary.id.clone(),
            response: serde_json::to_value(&summary)?,
        })
    }

    fn populate(&self, form: &mut FormState, data: Option<&StepData>) -> Result<()> {
        match data {
            Some(StepData::Patient(selection)) => form.select_patient(selection.patient_id.clone()),
            Some(other) => return Err(mismatch(StepId::Patient, other)),
            None => {}
        }
        Ok(())
    }
}

/// Left and right foot scans, uploaded together as multipart.
#[derive(Default)]
pub struct ScansAdapter;

#[async_trait]
impl StepAdapter for ScansAdapter {
    fn step(&self) -> StepId {
        StepId::Scans
    }

    async fn load(
        &self,
        gateway: &dyn Gateway,
        prescription_id: &str,
    ) -> Result<Option<StepData>> {
        let records = gateway.list_scans(prescription_id).await?;
        if records.is_empty() {
            return Ok(None);
        }
        let stored = |foot: Foot| {
            records.iter().find(|r| r.foot == foot).map(|r| ScanFile {
                file_name: r.original_name.clone(),
                content_type: String::new(),
                bytes: Vec::new(),
            })
        };
        Ok(Some(StepData::Scans(ScanUpload {
            prescription_id: prescription_id.to_string(),
            left: stored(Foot::Left),
            right: stored(Foot::Right),
        })))
    }

    fn collect(&self, form: &FormState, prescription_id: Option<&str>) -> Result<StepData> {
        let upload = ScanUpload {
            prescription_id: require_prescription(prescription_id)?.to_string(),
            left: form.scan(Foot::Left).cloned(),
            right: form.scan(Foot::Right).cloned(),
        };
        upload.validate()?;
        Ok(StepData::Scans(upload))
    }

    async fn save(&self, gateway: &dyn Gateway, data: &StepData) -> Result<SaveAck> {
        let StepData::Scans(upload) = data else {
            return Err(mismatch(StepId::Scans, data));
        };
        upload.validate()?;
        let files: Vec<(Foot, ScanFile)> = upload
            .files()
            .into_iter()
            .filter_map(|(foot, file)| file.map(|f| (foot, f.clone())))
            .collect();
        let records = gateway
            .upload_scans(&upload.prescription_id, &files)
            .await?;
        info!(
            "Uploaded {} scan(s) for {}",
            records.len(),
            upload.prescription_id
        );
        Ok(SaveAck {
            step: StepId::Scans,
            prescription_id: upload.prescription_id.clone(),
            response: serde_json::to_value(&records)?,
        })
    }

    /// Stored scans cannot be re-selected; the form keeps empty file slots.
    fn populate(&self, _form: &mut FormState, data: Option<&StepData>) -> Result<()> {
        match data {
            Some(StepData::Scans(_)) | None => Ok(()),
            Some(other) => Err(mismatch(StepId::Scans, other)),
        }
    }
}

/// Notes and administrative options live on the prescription record itself.
#[derive(Default)]
pub struct NotesAdapter {
    schema: SchemaAdapter<NotesAttachments>,
}

impl NotesAdapter {
    pub async fn upload_attachment(
        &self,
        gateway: &dyn Gateway,
        prescription_id: Option<&str>,
        file: &AttachmentFile,
    ) -> Result<Attachment> {
        let prescription_id = require_prescription(prescription_id)?;
        file.validate()?;
        let attachment = gateway.upload_attachment(prescription_id, file).await?;
        info!("Attached {} to {}", attachment.file_name, prescription_id);
        Ok(attachment)
    }
}

#[async_trait]
impl StepAdapter for NotesAdapter {
    fn step(&self) -> StepId {
        StepId::Notes
    }

    fn fields(&self) -> &'static [FieldSpec] {
        NotesAttachments::fields()
    }

    async fn load(
        &self,
        gateway: &dyn Gateway,
        prescription_id: &str,
    ) -> Result<Option<StepData>> {
        let Some(mut record) = gateway.fetch_prescription(prescription_id).await? else {
            return Ok(None);
        };
        let saved = record
            .get("saved_steps")
            .and_then(Value::as_array)
            .is_some_and(|steps| steps.iter().any(|s| s == StepId::Notes.as_str()));
        if !saved {
            return Ok(None);
        }
        // The prescription record names its id `id`.
        if let Some(object) = record.as_object_mut() {
            object
                .entry("prescription_id")
                .or_insert_with(|| Value::String(prescription_id.to_string()));
        }
        Ok(Some(StepData::from_wire(StepId::Notes, &record)?))
    }

    fn collect(&self, form: &FormState, prescription_id: Option<&str>) -> Result<StepData> {
        self.schema.collect(form, prescription_id)
    }

    async fn save(&self, gateway: &dyn Gateway, data: &StepData) -> Result<SaveAck> {
        if data.step() != StepId::Notes {
            return Err(mismatch(StepId::Notes, data));
        }
        let prescription_id = require_prescription(data.prescription_id())?;
        let response = gateway
            .update_prescription(prescription_id, &data.to_wire()?)
            .await?;
        info!("Saved notes for {}", prescription_id);
        Ok(SaveAck {
            step: StepId::Notes,
            prescription_id: prescription_id.to_string(),
            response,
        })
    }

    fn populate(&self, form: &mut FormState, data: Option<&StepData>) -> Result<()> {
        self.schema.populate(form, data)
    }
}

/// One adapter per registry step.
pub struct AdapterRegistry {
    adapters: BTreeMap<StepId, Arc<dyn StepAdapter>>,
    notes: Arc<NotesAdapter>,
}

impl AdapterRegistry {
    pub fn standard() -> Self {
        let notes = Arc::new(NotesAdapter::default());
        let list: Vec<Arc<dyn StepAdapter>> = vec![
            Arc::new(PatientAdapter),
            Arc::new(ScansAdapter),
            Arc::new(SchemaAdapter::<ClinicalMeasures>::new()),
            Arc::new(SchemaAdapter::<IntrinsicAdjustments>::new()),
            Arc::new(SchemaAdapter::<Offloading>::new()),
            Arc::new(SchemaAdapter::<PlantarModifiers>::new()),
            Arc::new(SchemaAdapter::<Posting>::new()),
            Arc::new(SchemaAdapter::<MaterialSelection>::new()),
            Arc::new(SchemaAdapter::<ShoeFitting>::new()),
            Arc::new(SchemaAdapter::<DeviceOptions>::new()),
            notes.clone() as Arc<dyn StepAdapter>,
        ];
        Self {
            adapters: list.into_iter().map(|a| (a.step(), a)).collect(),
            notes,
        }
    }

    pub fn get(&self, step: StepId) -> Result<Arc<dyn StepAdapter>> {
        self.adapters
            .get(&step)
            .cloned()
            .ok_or_else(|| WizardError::UnknownStep(step.to_string()))
    }

    pub fn notes(&self) -> &NotesAdapter {
        &self.notes
    }

    /// True when every registry step has an adapter.
    pub fn is_complete(&self) -> bool {
        steps::steps()
            .iter()
            .all(|s| self.adapters.contains_key(&s.id))
    }
}
