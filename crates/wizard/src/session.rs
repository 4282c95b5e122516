//! An authoring session: the controller, the mounted form, the step adapters
//! and the modal sequencer working together.
//!
//! Completing a step saves it first and advances only after the backend has
//! confirmed the save. Every failure is reported to the view as an error
//! notice and leaves the completed steps untouched.

use std::collections::BTreeSet;
use std::sync::Arc;

use domain::payloads::{Attachment, AttachmentFile, Foot, ScanFile};
use domain::schema::{self, FieldValue};
use domain::steps::{self, StepId};
use domain::StepData;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::adapter::{AdapterRegistry, SaveAck};
use crate::config::ClientConfig;
use crate::content::StepContentLoader;
use crate::controller::WizardController;
use crate::debounce::Debouncer;
use crate::error::{Result, WizardError};
use crate::form::{Control, Direction, FormState};
use crate::gateway::Gateway;
use crate::sequencer::{ModalHost, ModalSequencer};
use crate::view::{Notice, ProgressSnapshot, WizardView};

struct SessionInner {
    controller: WizardController,
    form: FormState,
    adapters: Arc<AdapterRegistry>,
    gateway: Arc<dyn Gateway>,
    view: Arc<dyn WizardView>,
}

impl SessionInner {
    /// Bind the step's controls and fill them from saved data. A failed load
    /// is reported and leaves the defaults in place.
    async fn populate_step(&mut self, step: StepId) -> Result<()> {
        let adapter = self.adapters.get(step)?;
        self.form.bind(adapter.fields())?;

        let data = match self.controller.prescription_id() {
            Some(prescription_id) => {
                match adapter.load(self.gateway.as_ref(), prescription_id).await {
                    Ok(data) => data,
                    Err(err) => {
                        warn!("Loading saved {} data failed: {}", step, err);
                        self.view.notify(Notice::error(format!(
                            "Failed to load {}: {err}",
                            step.title()
                        )));
                        None
                    }
                }
            }
            None => None,
        };
        adapter.populate(&mut self.form, data.as_ref())
    }

    async fn enter(&mut self, step: StepId) -> Result<StepId> {
        self.controller.navigate_to_step(step).await?;
        self.populate_step(step).await?;
        Ok(step)
    }

    async fn enter_prev(&mut self) -> Result<Option<StepId>> {
        let Some(prev) = self.controller.navigate_to_prev_step().await? else {
            return Ok(None);
        };
        self.populate_step(prev).await?;
        Ok(Some(prev))
    }

    /// Collect, save and mark the current step completed.
    async fn save_current(&mut self) -> Result<SaveAck> {
        let step = self.controller.current_step();
        let adapter = self.adapters.get(step)?;
        let data = adapter.collect(&self.form, self.controller.prescription_id())?;

        let ack = match (&data, self.controller.prescription_id()) {
            (StepData::Patient(selection), Some(prescription_id)) => {
                let prescription_id = prescription_id.to_string();
                match adapter.load(self.gateway.as_ref(), &prescription_id).await? {
                    Some(StepData::Patient(existing))
                        if existing.patient_id == selection.patient_id =>
                    {
                        SaveAck {
                            step,
                            prescription_id,
                            response: serde_json::to_value(&existing)?,
                        }
                    }
                    _ => {
                        return Err(WizardError::Validation(format!(
                            "Prescription {prescription_id} belongs to another patient"
                        )))
                    }
                }
            }
            _ => adapter.save(self.gateway.as_ref(), &data).await?,
        };

        if step == StepId::Patient {
            self.controller
                .set_prescription_id(ack.prescription_id.clone())?;
        }
        self.controller.mark_step_as_completed(step);
        Ok(ack)
    }

    async fn autosave(&mut self, step: StepId) {
        let controller = &self.controller;
        if controller.current_step() != step
            || controller.state().is_submitted()
            || controller.prescription_id().is_none()
            || matches!(step, StepId::Patient | StepId::Scans)
        {
            debug!("Auto-save for {} skipped", step);
            return;
        }
        match self.save_current().await {
            Ok(ack) => info!("Auto-saved {} for {}", step, ack.prescription_id),
            Err(err) => {
                warn!("Auto-save of {} failed: {}", step, err);
                self.view
                    .notify(Notice::error(format!("Auto-save failed: {err}")));
            }
        }
    }
}

pub struct IntakeSession {
    inner: Arc<Mutex<SessionInner>>,
    navigation: Mutex<()>,
    sequencer: ModalSequencer,
    autosave: Debouncer<(StepId, &'static str)>,
    view: Arc<dyn WizardView>,
}

impl IntakeSession {
    pub fn new(
        config: &ClientConfig,
        gateway: Arc<dyn Gateway>,
        content: Arc<dyn StepContentLoader>,
        view: Arc<dyn WizardView>,
        host: Arc<dyn ModalHost>,
    ) -> Self {
        let controller = WizardController::new(
            gateway.clone(),
            content,
            view.clone(),
            config.prescriptions_listing_path(),
        );
        let inner = SessionInner {
            controller,
            form: FormState::new(),
            adapters: Arc::new(AdapterRegistry::standard()),
            gateway,
            view: view.clone(),
        };
        Self {
            inner: Arc::new(Mutex::new(inner)),
            navigation: Mutex::new(()),
            sequencer: ModalSequencer::new(host),
            autosave: Debouncer::new(config.autosave_delay),
            view,
        }
    }

    /// Open the wizard at `initial_step` (or the first step).
    pub async fn start(
        &self,
        initial_step: Option<StepId>,
        prescription_id: Option<String>,
    ) -> Result<()> {
        let _navigation = self.navigation.lock().await;
        self.autosave.cancel_all();
        let mut inner = self.inner.lock().await;
        let result = self.open(&mut inner, initial_step, prescription_id).await;
        self.report(result)
    }

    /// Reopen a draft after a reload. Steps the backend holds data for are
    /// marked completed and the wizard opens on the first step without data.
    pub async fn resume(&self, prescription_id: &str) -> Result<StepId> {
        let _navigation = self.navigation.lock().await;
        self.autosave.cancel_all();
        let mut inner = self.inner.lock().await;
        let result = self.reopen(&mut inner, prescription_id).await;
        self.report(result)
    }

    /// Save the current step, then move to the next one. `Ok(None)` when the
    /// last step was saved or another navigation is in flight.
    ///
    /// Scan files are not kept once uploaded, so completing a revisited scans
    /// step uploads again. Use [`IntakeSession::go_to`] to leave it as is.
    pub async fn complete_step(&self) -> Result<Option<StepId>> {
        let Ok(_navigation) = self.navigation.try_lock() else {
            warn!("Complete ignored: a navigation is in flight");
            return Ok(None);
        };
        self.autosave.cancel_all();
        let mut inner = self.inner.lock().await;
        let result = self.advance(&mut inner).await;
        self.report(result)
    }

    pub async fn go_back(&self) -> Result<Option<StepId>> {
        let Ok(_navigation) = self.navigation.try_lock() else {
            warn!("Back ignored: a navigation is in flight");
            return Ok(None);
        };
        self.autosave.cancel_all();
        let mut inner = self.inner.lock().await;
        let result = self.retreat(&mut inner).await;
        self.report(result)
    }

    /// Jump to a step from the progress bar.
    pub async fn go_to(&self, step_id: &str) -> Result<Option<StepId>> {
        let Ok(_navigation) = self.navigation.try_lock() else {
            warn!("Jump ignored: a navigation is in flight");
            return Ok(None);
        };
        let mut inner = self.inner.lock().await;
        let result = self.jump(&mut inner, step_id).await;
        if matches!(result, Ok(Some(_))) {
            self.autosave.cancel_all();
        }
        self.report(result)
    }

    /// Save the last step and submit the prescription.
    pub async fn submit(&self) -> Result<()> {
        let _navigation = self.navigation.lock().await;
        self.autosave.cancel_all();
        let mut inner = self.inner.lock().await;

        if inner.controller.current_step().is_last() && !inner.controller.state().is_submitted() {
            let saved = inner.save_current().await;
            self.report(saved)?;
        }
        match inner.controller.submit_prescription().await {
            // The controller reports gateway and missing-id failures itself.
            Err(err @ WizardError::IllegalTransition { .. }) => self.report(Err(err)),
            other => other,
        }
    }

    /// Apply typed input to a control and schedule its auto-save.
    pub async fn edit(&self, control: &str, raw: &str) -> Result<FieldValue> {
        let result = {
            let mut inner = self.inner.lock().await;
            inner.form.set_input(control, raw)
        };
        let value = self.report(result)?;
        self.field_edited(control).await?;
        Ok(value)
    }

    pub async fn step_control(&self, control: &str, direction: Direction) -> Result<f64> {
        let result = {
            let mut inner = self.inner.lock().await;
            inner.form.step_control(control, direction)
        };
        let value = self.report(result)?;
        self.field_edited(control).await?;
        Ok(value)
    }

    /// Restart the auto-save timer for `control` on the current step.
    pub async fn field_edited(&self, control: &str) -> Result<()> {
        let (step, control) = {
            let inner = self.inner.lock().await;
            let step = inner.controller.current_step();
            match schema::find_control(inner.form.fields(), control) {
                Some(field) => (step, field.control),
                None => {
                    return self.report(Err(WizardError::Validation(format!(
                        "Unknown control {control}"
                    ))))
                }
            }
        };

        let inner = Arc::clone(&self.inner);
        self.autosave.schedule((step, control), move || async move {
            inner.lock().await.autosave(step).await;
        });
        Ok(())
    }

    pub async fn select_patient(&self, patient_id: &str) {
        self.inner.lock().await.form.select_patient(patient_id);
    }

    pub async fn choose_scan(&self, foot: Foot, file: ScanFile) {
        self.inner.lock().await.form.choose_scan(foot, file);
    }

    pub async fn attach(&self, file: &AttachmentFile) -> Result<Attachment> {
        let inner = self.inner.lock().await;
        let result = inner
            .adapters
            .notes()
            .upload_attachment(
                inner.gateway.as_ref(),
                inner.controller.prescription_id(),
                file,
            )
            .await;
        self.report(result)
    }

    pub async fn snapshot(&self) -> ProgressSnapshot {
        self.inner.lock().await.controller.snapshot()
    }

    pub async fn current_step(&self) -> StepId {
        self.inner.lock().await.controller.current_step()
    }

    pub async fn completed_steps(&self) -> BTreeSet<StepId> {
        self.inner.lock().await.controller.completed_steps().clone()
    }

    pub async fn prescription_id(&self) -> Option<String> {
        self.inner
            .lock()
            .await
            .controller
            .prescription_id()
            .map(str::to_string)
    }

    pub async fn controls(&self) -> Vec<Control> {
        self.inner.lock().await.form.controls()
    }

    pub async fn value(&self, control: &str) -> Option<FieldValue> {
        self.inner.lock().await.form.value(control).cloned()
    }

    pub fn pending_autosaves(&self) -> usize {
        self.autosave.pending()
    }

    async fn open(
        &self,
        inner: &mut SessionInner,
        initial_step: Option<StepId>,
        prescription_id: Option<String>,
    ) -> Result<()> {
        let shown = inner.controller.current_step().modal_id();
        inner
            .controller
            .initialize(initial_step, prescription_id)
            .await?;
        let step = inner.controller.current_step();
        let target = &mut *inner;
        self.sequencer
            .transition(Some(shown), step.modal_id(), move || {
                target.populate_step(step)
            })
            .await?
            .transpose()
            .map(|_| ())
    }

    async fn reopen(&self, inner: &mut SessionInner, prescription_id: &str) -> Result<StepId> {
        let mut confirmed = Vec::new();
        for step in steps::steps().iter().map(|s| s.id) {
            let adapter = inner.adapters.get(step)?;
            let saved = match adapter.load(inner.gateway.as_ref(), prescription_id).await? {
                Some(StepData::Scans(upload)) => upload.left.is_some() && upload.right.is_some(),
                Some(_) => true,
                None => false,
            };
            if saved {
                confirmed.push(step);
            }
        }
        if !confirmed.contains(&StepId::Patient) {
            return Err(WizardError::Transport {
                status: 404,
                message: format!("Prescription {prescription_id} not found"),
            });
        }

        let resume_at = steps::steps()
            .iter()
            .map(|s| s.id)
            .find(|step| !confirmed.contains(step))
            .unwrap_or_else(steps::last);
        self.open(inner, Some(resume_at), Some(prescription_id.to_string()))
            .await?;
        for step in confirmed {
            inner.controller.mark_step_as_completed(step);
        }
        info!("Resumed prescription {} at {}", prescription_id, resume_at);
        Ok(resume_at)
    }

    async fn advance(&self, inner: &mut SessionInner) -> Result<Option<StepId>> {
        let from = inner.controller.current_step();
        inner.save_current().await?;
        let Some(next) = from.next() else {
            return Ok(None);
        };

        let target = &mut *inner;
        let entered = self
            .sequencer
            .transition(Some(from.modal_id()), next.modal_id(), move || {
                target.enter(next)
            })
            .await?;
        self.restore_on_failure(inner, next, entered).await
    }

    async fn retreat(&self, inner: &mut SessionInner) -> Result<Option<StepId>> {
        let from = inner.controller.current_step();
        let Some(prev) = from.prev() else {
            return Ok(None);
        };
        if inner.controller.state().is_submitted() {
            return Err(WizardError::IllegalTransition {
                from,
                to: prev.to_string(),
            });
        }

        let target = &mut *inner;
        let entered = self
            .sequencer
            .transition(Some(from.modal_id()), prev.modal_id(), move || {
                target.enter_prev()
            })
            .await?;
        Ok(self.restore_on_failure(inner, prev, entered).await?.flatten())
    }

    async fn jump(&self, inner: &mut SessionInner, step_id: &str) -> Result<Option<StepId>> {
        let to = step_id.parse::<StepId>()?;
        let from = inner.controller.current_step();
        if !inner.controller.can_advance_to(to) {
            return Err(WizardError::IllegalTransition {
                from,
                to: to.to_string(),
            });
        }

        let target = &mut *inner;
        let entered = self
            .sequencer
            .transition(Some(from.modal_id()), to.modal_id(), move || target.enter(to))
            .await?;
        self.restore_on_failure(inner, to, entered).await
    }

    /// The sequencer shows `shown` before the controller enters it. When
    /// entering fails, put the dialog of the controller's step back up.
    async fn restore_on_failure<T>(
        &self,
        inner: &SessionInner,
        shown: StepId,
        entered: Option<Result<T>>,
    ) -> Result<Option<T>> {
        let err = match entered {
            Some(Err(err)) => err,
            other => return other.transpose(),
        };

        let current = inner.controller.current_step();
        if current != shown {
            match self
                .sequencer
                .transition(Some(shown.modal_id()), current.modal_id(), || async {})
                .await
            {
                Ok(_) => info!("Entering {} failed; back on {}", shown, current),
                Err(restore) => warn!("Restoring {} failed: {}", current, restore),
            }
        }
        Err(err)
    }

    fn report<T>(&self, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            warn!("Wizard operation failed: {}", err);
            self.view.notify(Notice::error(err.to_string()));
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        saved_payload, FakeContent, FakeGateway, FakeModalHost, RecordingView,
    };
    use crate::view::NoticeLevel;
    use domain::payloads::{ClinicalMeasures, IntrinsicAdjustments};
    use pretty_assertions::assert_eq;
    use serde_json::json;
    use std::time::Duration;

    struct Fixture {
        session: IntakeSession,
        gateway: FakeGateway,
        content: FakeContent,
        view: RecordingView,
        host: FakeModalHost,
    }

    fn fixture() -> Fixture {
        let gateway = FakeGateway::new();
        let content = FakeContent::default();
        let view = RecordingView::default();
        let host = FakeModalHost::with_all_steps();
        let config = ClientConfig::default().with_autosave_delay(Duration::from_millis(1000));
        let session = IntakeSession::new(
            &config,
            Arc::new(gateway.clone()),
            Arc::new(content.clone()),
            Arc::new(view.clone()),
            Arc::new(host.clone()),
        );
        Fixture {
            session,
            gateway,
            content,
            view,
            host,
        }
    }

    fn scan(name: &str) -> ScanFile {
        ScanFile {
            file_name: name.into(),
            content_type: "model/stl".into(),
            bytes: vec![0; 4],
        }
    }

    fn errors(view: &RecordingView) -> Vec<String> {
        view.notices()
            .into_iter()
            .filter(|n| n.level == NoticeLevel::Error)
            .map(|n| n.message)
            .collect()
    }

    /// Patient and scans saved; wizard sits on clinical measures.
    async fn at_clinical(f: &Fixture) {
        f.session.start(None, None).await.unwrap();
        f.session.select_patient("p-1").await;
        f.session.complete_step().await.unwrap();
        f.session.choose_scan(Foot::Left, scan("left.stl")).await;
        f.session.choose_scan(Foot::Right, scan("right.stl")).await;
        f.session.complete_step().await.unwrap();
    }

    async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    #[tokio::test]
    async fn start_shows_the_first_step_with_defaults() {
        let f = fixture();
        f.session.start(None, None).await.unwrap();

        assert_eq!(f.session.current_step().await, StepId::Patient);
        assert_eq!(f.host.active().as_deref(), Some("patientModal"));
        assert_eq!(f.content.mounted(), vec![StepId::Patient]);
        assert!(errors(&f.view).is_empty());
    }

    #[tokio::test]
    async fn patient_then_scans_then_clinical() {
        let f = fixture();
        at_clinical(&f).await;

        assert_eq!(f.session.current_step().await, StepId::Clinical);
        assert_eq!(f.session.prescription_id().await.as_deref(), Some("rx-1"));
        assert_eq!(
            f.session.completed_steps().await,
            BTreeSet::from([StepId::Patient, StepId::Scans])
        );
        assert_eq!(f.host.active().as_deref(), Some("clinicalMeasuresModal"));
        assert_eq!(f.host.backdrops(), 1);
        assert_eq!(
            f.gateway.calls(),
            vec![
                "create_prescription p-1",
                "list_scans rx-1",
                "upload_scans rx-1",
                "fetch_step rx-1 clinical",
            ]
        );
    }

    #[tokio::test]
    async fn completing_without_a_patient_is_a_validation_notice() {
        let f = fixture();
        f.session.start(None, None).await.unwrap();

        let err = f.session.complete_step().await.unwrap_err();
        assert_eq!(err, WizardError::Validation("Please select a patient".into()));
        assert_eq!(errors(&f.view), vec!["Please select a patient"]);
        assert!(f.gateway.calls().is_empty());
        assert!(f.session.completed_steps().await.is_empty());
    }

    #[tokio::test]
    async fn failed_save_keeps_the_step_incomplete() {
        let f = fixture();
        at_clinical(&f).await;
        f.gateway.fail("save_step");

        assert!(f.session.complete_step().await.is_err());
        assert_eq!(f.session.current_step().await, StepId::Clinical);
        assert!(!f.session.completed_steps().await.contains(&StepId::Clinical));
        assert_eq!(errors(&f.view), vec!["Request failed (500): save_step failed"]);

        f.gateway.recover("save_step");
        assert_eq!(
            f.session.complete_step().await.unwrap(),
            Some(StepId::Intrinsic)
        );
        assert!(f.session.completed_steps().await.contains(&StepId::Clinical));
    }

    #[tokio::test]
    async fn saved_values_come_back_when_revisiting_a_step() {
        let f = fixture();
        at_clinical(&f).await;
        f.session.edit("leftScanVv", "4.3").await.unwrap();
        f.session.complete_step().await.unwrap();

        assert_eq!(f.session.go_back().await.unwrap(), Some(StepId::Clinical));
        assert_eq!(
            f.session.value("leftScanVv").await,
            Some(FieldValue::Number(4.5))
        );
        let saved: ClinicalMeasures = saved_payload(&f.gateway, "rx-1");
        assert_eq!(saved.left_scan_vv, 4.5);
    }

    #[tokio::test]
    async fn nothing_saved_populates_defaults_without_a_notice() {
        let f = fixture();
        at_clinical(&f).await;
        f.session.complete_step().await.unwrap();

        assert_eq!(f.session.current_step().await, StepId::Intrinsic);
        assert_eq!(
            f.session.value("leftSkiveType").await,
            Some(FieldValue::Text("none".into()))
        );
        assert!(errors(&f.view).is_empty());
    }

    #[tokio::test]
    async fn reselecting_another_patient_is_refused() {
        let f = fixture();
        at_clinical(&f).await;
        f.session.go_back().await.unwrap();
        f.session.go_back().await.unwrap();
        assert_eq!(f.session.current_step().await, StepId::Patient);

        f.session.select_patient("p-9").await;
        assert!(matches!(
            f.session.complete_step().await,
            Err(WizardError::Validation(_))
        ));
        assert_eq!(f.gateway.call_count("create_prescription"), 1);

        f.session.select_patient("p-1").await;
        assert_eq!(f.session.complete_step().await.unwrap(), Some(StepId::Scans));
        assert_eq!(f.session.prescription_id().await.as_deref(), Some("rx-1"));
    }

    #[tokio::test]
    async fn jumping_ahead_past_incomplete_steps_is_refused() {
        let f = fixture();
        at_clinical(&f).await;

        let err = f.session.go_to("posting").await.unwrap_err();
        assert!(matches!(err, WizardError::IllegalTransition { .. }));
        assert_eq!(f.session.current_step().await, StepId::Clinical);
        assert_eq!(f.session.go_to("patient").await.unwrap(), Some(StepId::Patient));
    }

    #[tokio::test]
    async fn failed_content_load_leaves_the_current_steps_dialog_up() {
        let f = fixture();
        f.session.start(None, None).await.unwrap();
        f.session.select_patient("p-1").await;
        f.content.break_step(StepId::Scans);

        let err = f.session.complete_step().await.unwrap_err();
        assert_eq!(
            err,
            WizardError::Transport {
                status: 404,
                message: "scans.html missing".into(),
            }
        );

        let current = f.session.current_step().await;
        assert_eq!(current, StepId::Patient);
        assert_eq!(f.host.active().as_deref(), Some(current.modal_id()));
        assert_eq!(f.host.backdrops(), 1);
        assert_eq!(f.session.completed_steps().await, BTreeSet::from([StepId::Patient]));
    }

    #[tokio::test]
    async fn failed_jump_keeps_the_dialog_in_step_with_the_controller() {
        let f = fixture();
        at_clinical(&f).await;
        f.content.break_step(StepId::Patient);

        assert!(f.session.go_to("patient").await.is_err());
        assert_eq!(f.session.current_step().await, StepId::Clinical);
        assert_eq!(f.host.active().as_deref(), Some("clinicalMeasuresModal"));

        assert!(f.session.go_back().await.is_ok());
        assert_eq!(f.host.active().as_deref(), Some("scanUploadModal"));
    }

    #[tokio::test]
    async fn navigation_during_another_is_ignored() {
        let f = fixture();
        f.session.start(None, None).await.unwrap();
        f.session.select_patient("p-1").await;

        let held = f.session.navigation.lock().await;
        assert_eq!(f.session.complete_step().await.unwrap(), None);
        assert_eq!(f.session.go_back().await.unwrap(), None);
        assert_eq!(f.session.go_to("patient").await.unwrap(), None);
        drop(held);

        assert!(f.gateway.calls().is_empty());
        assert_eq!(f.session.current_step().await, StepId::Patient);
        assert_eq!(
            f.session.complete_step().await.unwrap(),
            Some(StepId::Scans)
        );
    }

    #[tokio::test]
    async fn revisited_scans_are_left_without_another_upload() {
        let f = fixture();
        at_clinical(&f).await;

        assert_eq!(f.session.go_to("scans").await.unwrap(), Some(StepId::Scans));
        assert_eq!(f.session.go_to("clinical").await.unwrap(), Some(StepId::Clinical));
        assert_eq!(f.gateway.call_count("upload_scans"), 1);
        assert_eq!(f.host.active().as_deref(), Some("clinicalMeasuresModal"));
    }

    #[tokio::test]
    async fn missing_modal_fails_without_moving() {
        let gateway = FakeGateway::new();
        let view = RecordingView::default();
        let host = FakeModalHost::with_modals(["patientModal"]);
        let session = IntakeSession::new(
            &ClientConfig::default(),
            Arc::new(gateway.clone()),
            Arc::new(FakeContent::default()),
            Arc::new(view.clone()),
            Arc::new(host.clone()),
        );
        session.start(None, None).await.unwrap();
        session.select_patient("p-1").await;

        let err = session.complete_step().await.unwrap_err();
        assert_eq!(err, WizardError::ModalNotFound("scanUploadModal".into()));
        assert_eq!(session.current_step().await, StepId::Patient);
        assert_eq!(host.active().as_deref(), Some("patientModal"));
    }

    #[tokio::test(start_paused = true)]
    async fn edits_auto_save_after_the_quiet_period() {
        let f = fixture();
        at_clinical(&f).await;
        f.session.complete_step().await.unwrap();

        f.session.edit("leftArchHeight", "2").await.unwrap();
        settle().await;
        tokio::time::advance(Duration::from_millis(500)).await;
        f.session.step_control("leftArchHeight", Direction::Up).await.unwrap();
        settle().await;
        tokio::time::advance(Duration::from_millis(999)).await;
        settle().await;
        assert_eq!(f.gateway.call_count("save_step"), 1);

        tokio::time::advance(Duration::from_millis(1)).await;
        settle().await;
        assert_eq!(f.gateway.call_count("save_step"), 2);
        assert_eq!(f.session.pending_autosaves(), 0);
        assert!(f.session.completed_steps().await.contains(&StepId::Intrinsic));

        let saved: IntrinsicAdjustments = saved_payload(&f.gateway, "rx-1");
        assert_eq!(saved.left_arch_height, 2.5);
    }

    #[tokio::test(start_paused = true)]
    async fn leaving_a_step_drops_its_pending_auto_save() {
        let f = fixture();
        at_clinical(&f).await;
        f.session.edit("leftScanVv", "1").await.unwrap();
        assert_eq!(f.session.pending_autosaves(), 1);

        f.session.go_back().await.unwrap();
        assert_eq!(f.session.pending_autosaves(), 0);
        tokio::time::advance(Duration::from_secs(2)).await;
        settle().await;
        assert_eq!(f.gateway.call_count("save_step"), 0);
    }

    #[tokio::test]
    async fn resume_marks_exactly_the_confirmed_steps() {
        let f = fixture();
        f.gateway.seed_prescription(
            "rx-5",
            json!({ "id": "rx-5", "patient_id": "p-1", "saved_steps": ["patient"] }),
        );
        f.gateway.seed_scans("rx-5");
        f.gateway.seed_step("rx-5", StepId::Clinical, json!({ "prescription_id": "rx-5" }));
        f.gateway.seed_step("rx-5", StepId::Posting, json!({ "prescription_id": "rx-5" }));

        let at = f.session.resume("rx-5").await.unwrap();

        assert_eq!(at, StepId::Intrinsic);
        assert_eq!(
            f.session.completed_steps().await,
            BTreeSet::from([
                StepId::Patient,
                StepId::Scans,
                StepId::Clinical,
                StepId::Posting
            ])
        );
        assert_eq!(f.session.prescription_id().await.as_deref(), Some("rx-5"));
        assert_eq!(f.host.active().as_deref(), Some("intrinsicAdjustmentsModal"));
        assert!(f.session.snapshot().await.prev_enabled);
    }

    #[tokio::test]
    async fn resume_of_an_unknown_prescription_fails() {
        let f = fixture();
        let err = f.session.resume("rx-404").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(errors(&f.view).len(), 1);
    }

    #[tokio::test]
    async fn submit_saves_notes_then_redirects() {
        let f = fixture();
        f.gateway.seed_prescription(
            "rx-5",
            json!({ "id": "rx-5", "patient_id": "p-1", "saved_steps": ["patient"] }),
        );
        f.gateway.seed_scans("rx-5");
        for step in steps::steps().iter().map(|s| s.id) {
            if step.resource().is_some() && step != StepId::Scans {
                f.gateway
                    .seed_step("rx-5", step, json!({ "prescription_id": "rx-5" }));
            }
        }
        assert_eq!(f.session.resume("rx-5").await.unwrap(), StepId::Notes);

        f.session.edit("turnaroundTime", "urgent").await.unwrap();
        f.session.submit().await.unwrap();

        assert_eq!(f.gateway.call_count("update_prescription"), 1);
        assert_eq!(f.gateway.call_count("submit_prescription"), 1);
        assert_eq!(f.view.redirects(), vec!["/orthotics_portal/prescriptions"]);
        assert!(f.session.snapshot().await.indicators.iter().all(|i| i.step == StepId::Notes
            || i.indicator == crate::view::Indicator::Completed));
    }

    #[tokio::test]
    async fn submit_without_a_prescription_never_reaches_the_gateway() {
        let f = fixture();
        f.session.start(Some(StepId::Notes), None).await.unwrap();

        assert_eq!(f.session.submit().await, Err(WizardError::MissingPrescription));
        assert_eq!(
            errors(&f.view),
            vec!["No prescription ID found. Please start over."]
        );
        assert!(f.gateway.calls().is_empty());
    }

    #[tokio::test]
    async fn attachments_upload_against_the_current_prescription() {
        let f = fixture();
        at_clinical(&f).await;
        let file = AttachmentFile {
            file_name: "referral.pdf".into(),
            content_type: "application/pdf".into(),
            bytes: b"%PDF".to_vec(),
        };
        let stored = f.session.attach(&file).await.unwrap();
        assert_eq!(stored.file_name, "referral.pdf");
        assert_eq!(f.gateway.call_count("upload_attachment"), 1);
    }
}
