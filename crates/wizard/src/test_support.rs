//! In-memory fakes for the wizard's collaborators.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use domain::payloads::{Attachment, AttachmentFile, Foot, ScanFile, ScanRecord};
use domain::prescriptions::{PrescriptionStatus, PrescriptionSummary};
use domain::records::{InvoiceSummary, Order, Patient};
use domain::{StepId, StepPayload};
use serde_json::{json, Value};
use tokio::sync::oneshot;

use crate::content::StepContentLoader;
use crate::error::{Result, WizardError};
use crate::gateway::Gateway;
use crate::sequencer::ModalHost;
use crate::view::{Notice, ProgressSnapshot, WizardView};

const STAMP: &str = "2026-01-01T00:00:00Z";

#[derive(Default)]
struct GatewayState {
    calls: Vec<String>,
    steps: HashMap<(String, StepId), Value>,
    prescriptions: HashMap<String, Value>,
    scans: HashMap<String, Vec<ScanRecord>>,
    failing: HashSet<&'static str>,
    next_id: u32,
}

/// Gateway double keeping saved payloads in memory. Operations named in
/// `fail` answer with a 500.
#[derive(Default, Clone)]
pub struct FakeGateway {
    state: Arc<Mutex<GatewayState>>,
}

impl FakeGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.insert(operation);
    }

    pub fn recover(&self, operation: &'static str) {
        self.state.lock().unwrap().failing.remove(operation);
    }

    pub fn calls(&self) -> Vec<String> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn call_count(&self, operation: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.split(' ').next() == Some(operation))
            .count()
    }

    pub fn saved(&self, prescription_id: &str, step: StepId) -> Option<Value> {
        self.state
            .lock()
            .unwrap()
            .steps
            .get(&(prescription_id.to_string(), step))
            .cloned()
    }

    pub fn seed_step(&self, prescription_id: &str, step: StepId, payload: Value) {
        self.state
            .lock()
            .unwrap()
            .steps
            .insert((prescription_id.to_string(), step), payload);
    }

    pub fn seed_prescription(&self, prescription_id: &str, record: Value) {
        self.state
            .lock()
            .unwrap()
            .prescriptions
            .insert(prescription_id.to_string(), record);
    }

    pub fn seed_scans(&self, prescription_id: &str) {
        let scans = [Foot::Left, Foot::Right]
            .into_iter()
            .map(|foot| scan_record(prescription_id, foot, "scan.stl"))
            .collect();
        self.state
            .lock()
            .unwrap()
            .scans
            .insert(prescription_id.to_string(), scans);
    }

    fn record(&self, operation: &'static str, detail: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(format!("{operation} {detail}"));
        if state.failing.contains(operation) {
            return Err(WizardError::Transport {
                status: 500,
                message: format!("{operation} failed"),
            });
        }
        Ok(())
    }
}

fn scan_record(prescription_id: &str, foot: Foot, original: &str) -> ScanRecord {
    ScanRecord {
        foot,
        file_name: format!("{prescription_id}_{}.stl", foot.as_str()),
        original_name: original.to_string(),
        size: 3,
        uploaded_at: STAMP.parse().unwrap(),
    }
}

fn summary(id: &str, patient_id: &str, status: PrescriptionStatus) -> PrescriptionSummary {
    serde_json::from_value(json!({
        "id": id,
        "patient_id": patient_id,
        "status": status,
        "created_at": STAMP,
        "updated_at": STAMP,
        "submitted_at": null,
        "saved_steps": ["patient"],
    }))
    .unwrap()
}

#[async_trait]
impl Gateway for FakeGateway {
    async fn fetch_step(&self, prescription_id: &str, step: StepId) -> Result<Option<Value>> {
        self.record("fetch_step", &format!("{prescription_id} {step}"))?;
        Ok(self.saved(prescription_id, step))
    }

    async fn save_step(
        &self,
        prescription_id: &str,
        step: StepId,
        payload: &Value,
    ) -> Result<Value> {
        self.record("save_step", &format!("{prescription_id} {step}"))?;
        self.seed_step(prescription_id, step, payload.clone());
        Ok(payload.clone())
    }

    async fn create_prescription(&self, patient_id: &str) -> Result<PrescriptionSummary> {
        self.record("create_prescription", patient_id)?;
        let id = {
            let mut state = self.state.lock().unwrap();
            state.next_id += 1;
            format!("rx-{}", state.next_id)
        };
        self.seed_prescription(&id, json!({ "id": id, "patient_id": patient_id, "saved_steps": ["patient"] }));
        Ok(summary(&id, patient_id, PrescriptionStatus::Draft))
    }

    async fn fetch_prescription(&self, prescription_id: &str) -> Result<Option<Value>> {
        self.record("fetch_prescription", prescription_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .prescriptions
            .get(prescription_id)
            .cloned())
    }

    async fn update_prescription(&self, prescription_id: &str, payload: &Value) -> Result<Value> {
        self.record("update_prescription", prescription_id)?;
        let mut state = self.state.lock().unwrap();
        let record = state
            .prescriptions
            .entry(prescription_id.to_string())
            .or_insert_with(|| json!({ "id": prescription_id, "saved_steps": [] }));
        if let (Some(record), Some(update)) = (record.as_object_mut(), payload.as_object()) {
            for (k, v) in update {
                record.insert(k.clone(), v.clone());
            }
            if let Some(Value::Array(steps)) = record.get_mut("saved_steps") {
                steps.push(json!("notes"));
            }
        }
        Ok(record.clone())
    }

    async fn submit_prescription(&self, prescription_id: &str) -> Result<PrescriptionSummary> {
        self.record("submit_prescription", prescription_id)?;
        Ok(summary(prescription_id, "p-1", PrescriptionStatus::Submitted))
    }

    async fn upload_scans(
        &self,
        prescription_id: &str,
        files: &[(Foot, ScanFile)],
    ) -> Result<Vec<ScanRecord>> {
        self.record("upload_scans", prescription_id)?;
        let records: Vec<ScanRecord> = files
            .iter()
            .map(|(foot, file)| scan_record(prescription_id, *foot, &file.file_name))
            .collect();
        self.state
            .lock()
            .unwrap()
            .scans
            .insert(prescription_id.to_string(), records.clone());
        Ok(records)
    }

    async fn list_scans(&self, prescription_id: &str) -> Result<Vec<ScanRecord>> {
        self.record("list_scans", prescription_id)?;
        Ok(self
            .state
            .lock()
            .unwrap()
            .scans
            .get(prescription_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn upload_attachment(
        &self,
        prescription_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment> {
        self.record("upload_attachment", prescription_id)?;
        Ok(Attachment {
            id: "att-1".into(),
            file_name: file.file_name.clone(),
            size: file.bytes.len(),
            uploaded_at: STAMP.parse().unwrap(),
        })
    }

    async fn search_patients(&self, query: &str) -> Result<Vec<Patient>> {
        self.record("search_patients", query)?;
        Ok(vec![Patient::new("p-1".into(), "Ada".into(), "Lovelace".into(), None)])
    }

    async fn create_patient(&self, input: &Value) -> Result<Patient> {
        self.record("create_patient", &input.to_string())?;
        Ok(Patient::new("p-2".into(), "New".into(), "Patient".into(), None))
    }

    async fn list_prescriptions(&self, status: Option<&str>) -> Result<Vec<PrescriptionSummary>> {
        self.record("list_prescriptions", status.unwrap_or(""))?;
        Ok(Vec::new())
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.record("list_orders", "")?;
        Ok(Vec::new())
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>> {
        self.record("list_invoices", "")?;
        Ok(Vec::new())
    }
}

/// Content loader recording mounts; steps in `broken` fail to load.
#[derive(Default, Clone)]
pub struct FakeContent {
    mounted: Arc<Mutex<Vec<StepId>>>,
    broken: Arc<Mutex<HashSet<StepId>>>,
}

impl FakeContent {
    pub fn break_step(&self, step: StepId) {
        self.broken.lock().unwrap().insert(step);
    }

    pub fn mounted(&self) -> Vec<StepId> {
        self.mounted.lock().unwrap().clone()
    }
}

#[async_trait]
impl StepContentLoader for FakeContent {
    async fn mount(&self, step: StepId, _prescription_id: Option<&str>) -> Result<()> {
        if self.broken.lock().unwrap().contains(&step) {
            return Err(WizardError::Transport {
                status: 404,
                message: format!("{step}.html missing"),
            });
        }
        self.mounted.lock().unwrap().push(step);
        Ok(())
    }
}

#[derive(Default, Clone)]
pub struct RecordingView {
    snapshots: Arc<Mutex<Vec<ProgressSnapshot>>>,
    notices: Arc<Mutex<Vec<Notice>>>,
    redirects: Arc<Mutex<Vec<String>>>,
    nav_toggles: Arc<Mutex<Vec<bool>>>,
}

impl RecordingView {
    pub fn last_snapshot(&self) -> Option<ProgressSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    pub fn nav_toggles(&self) -> Vec<bool> {
        self.nav_toggles.lock().unwrap().clone()
    }
}

impl WizardView for RecordingView {
    fn refresh(&self, snapshot: &ProgressSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }

    fn set_navigation_enabled(&self, enabled: bool) {
        self.nav_toggles.lock().unwrap().push(enabled);
    }

    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }

    fn redirect(&self, path: &str) {
        self.redirects.lock().unwrap().push(path.to_string());
    }
}

#[derive(Default)]
struct HostState {
    modals: HashSet<String>,
    active: Option<String>,
    backdrops: usize,
    body_scroll_locked: bool,
    pending_hide: Option<(String, oneshot::Sender<()>)>,
    events: Vec<String>,
}

/// Modal host double. Hides complete on `finish_hide` unless `auto_hide`.
#[derive(Default, Clone)]
pub struct FakeModalHost {
    state: Arc<Mutex<HostState>>,
    auto_hide: bool,
}

impl FakeModalHost {
    pub fn with_modals<'a>(ids: impl IntoIterator<Item = &'a str>) -> Self {
        let host = Self {
            auto_hide: true,
            ..Self::default()
        };
        host.state.lock().unwrap().modals = ids.into_iter().map(str::to_string).collect();
        host
    }

    pub fn with_all_steps() -> Self {
        Self::with_modals(domain::steps::steps().iter().map(|s| s.id.modal_id()))
    }

    pub fn manual_hide(mut self) -> Self {
        self.auto_hide = false;
        self
    }

    pub fn set_active(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.active = Some(id.to_string());
        state.backdrops = 1;
        state.body_scroll_locked = true;
    }

    pub fn add_stray_backdrops(&self, n: usize) {
        let mut state = self.state.lock().unwrap();
        state.backdrops += n;
        state.body_scroll_locked = true;
    }

    pub fn finish_hide(&self) {
        let pending = self.state.lock().unwrap().pending_hide.take();
        if let Some((id, done)) = pending {
            self.complete_hide(&id);
            let _ = done.send(());
        }
    }

    fn complete_hide(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        if state.active.as_deref() == Some(id) {
            state.active = None;
        }
        state.events.push(format!("hidden {id}"));
    }

    pub fn active(&self) -> Option<String> {
        self.state.lock().unwrap().active.clone()
    }

    pub fn backdrops(&self) -> usize {
        self.state.lock().unwrap().backdrops
    }

    pub fn body_scroll_locked(&self) -> bool {
        self.state.lock().unwrap().body_scroll_locked
    }

    pub fn events(&self) -> Vec<String> {
        self.state.lock().unwrap().events.clone()
    }
}

impl ModalHost for FakeModalHost {
    fn exists(&self, id: &str) -> bool {
        self.state.lock().unwrap().modals.contains(id)
    }

    fn is_active(&self, id: &str) -> bool {
        self.state.lock().unwrap().active.as_deref() == Some(id)
    }

    fn any_visible(&self) -> bool {
        self.state.lock().unwrap().active.is_some()
    }

    fn request_hide(&self, id: &str) -> oneshot::Receiver<()> {
        let (tx, rx) = oneshot::channel();
        self.state
            .lock()
            .unwrap()
            .events
            .push(format!("hide requested {id}"));
        if self.auto_hide {
            self.complete_hide(id);
            let _ = tx.send(());
        } else {
            self.state.lock().unwrap().pending_hide = Some((id.to_string(), tx));
        }
        rx
    }

    fn remove_backdrops(&self) -> usize {
        let mut state = self.state.lock().unwrap();
        let removed = state.backdrops;
        state.backdrops = 0;
        state.events.push(format!("removed {removed} backdrops"));
        removed
    }

    fn restore_body_scroll(&self) {
        let mut state = self.state.lock().unwrap();
        state.body_scroll_locked = false;
        state.events.push("scroll restored".to_string());
    }

    fn show(&self, id: &str) {
        let mut state = self.state.lock().unwrap();
        state.active = Some(id.to_string());
        state.backdrops += 1;
        state.body_scroll_locked = true;
        state.events.push(format!("shown {id}"));
    }
}

/// Assert helper for payload round trips through the fake.
pub fn saved_payload<P: StepPayload>(gateway: &FakeGateway, prescription_id: &str) -> P {
    P::from_json(&gateway.saved(prescription_id, P::STEP).unwrap()).unwrap()
}
