//! Wizard controller: which step is current, which are completed, and what
//! transitions are legal.

use std::collections::BTreeSet;
use std::sync::Arc;

use domain::steps::{self, StepId};
use tracing::{info, warn};

use crate::content::StepContentLoader;
use crate::error::{Result, WizardError};
use crate::gateway::Gateway;
use crate::view::{Indicator, Notice, ProgressSnapshot, StepIndicator, WizardView};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Lifecycle {
    #[default]
    Draft,
    Submitted,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WizardState {
    pub current_step: StepId,
    pub completed_steps: BTreeSet<StepId>,
    pub prescription_id: Option<String>,
    pub lifecycle: Lifecycle,
}

impl Default for WizardState {
    fn default() -> Self {
        Self::new(None, None)
    }
}

impl WizardState {
    pub fn new(initial_step: Option<StepId>, prescription_id: Option<String>) -> Self {
        Self {
            current_step: initial_step.unwrap_or_else(steps::first),
            completed_steps: BTreeSet::new(),
            prescription_id,
            lifecycle: Lifecycle::Draft,
        }
    }

    /// A completed step, or the one immediately after the current step.
    pub fn can_advance_to(&self, target: StepId) -> bool {
        if self.lifecycle == Lifecycle::Submitted {
            return false;
        }
        self.completed_steps.contains(&target)
            || target.position() == self.current_step.position() + 1
    }

    pub fn is_submitted(&self) -> bool {
        self.lifecycle == Lifecycle::Submitted
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        let indicators = steps::steps()
            .iter()
            .map(|step| StepIndicator {
                step: step.id,
                title: step.title,
                indicator: if step.id == self.current_step {
                    Indicator::Active
                } else if self.completed_steps.contains(&step.id) {
                    Indicator::Completed
                } else {
                    Indicator::Pending
                },
            })
            .collect();

        let draft = !self.is_submitted();
        ProgressSnapshot {
            current_step: self.current_step,
            title: self.current_step.title(),
            indicators,
            prev_enabled: draft && !self.current_step.is_first(),
            show_next: !self.current_step.is_last(),
            show_submit: draft && self.current_step.is_last(),
        }
    }
}

/// Owns the one [`WizardState`] of an authoring session.
pub struct WizardController {
    state: WizardState,
    gateway: Arc<dyn Gateway>,
    content: Arc<dyn StepContentLoader>,
    view: Arc<dyn WizardView>,
    listing_path: String,
}

impl WizardController {
    pub fn new(
        gateway: Arc<dyn Gateway>,
        content: Arc<dyn StepContentLoader>,
        view: Arc<dyn WizardView>,
        listing_path: impl Into<String>,
    ) -> Self {
        Self {
            state: WizardState::default(),
            gateway,
            content,
            view,
            listing_path: listing_path.into(),
        }
    }

    pub fn state(&self) -> &WizardState {
        &self.state
    }

    pub fn current_step(&self) -> StepId {
        self.state.current_step
    }

    pub fn prescription_id(&self) -> Option<&str> {
        self.state.prescription_id.as_deref()
    }

    pub fn completed_steps(&self) -> &BTreeSet<StepId> {
        &self.state.completed_steps
    }

    pub fn can_advance_to(&self, target: StepId) -> bool {
        self.state.can_advance_to(target)
    }

    /// Reset to `initial_step` (or the first step) with nothing completed,
    /// then load that step's content.
    pub async fn initialize(
        &mut self,
        initial_step: Option<StepId>,
        prescription_id: Option<String>,
    ) -> Result<()> {
        self.state = WizardState::new(initial_step, prescription_id);
        info!(
            "Wizard initialized at {} (prescription {:?})",
            self.state.current_step, self.state.prescription_id
        );
        self.refresh();
        self.load_content(self.state.current_step).await
    }

    pub async fn navigate_to(&mut self, step_id: &str) -> Result<StepId> {
        let target = step_id.parse::<StepId>()?;
        self.navigate_to_step(target).await
    }

    pub async fn navigate_to_step(&mut self, target: StepId) -> Result<StepId> {
        if !self.can_advance_to(target) {
            warn!("Blocked navigation {} -> {}", self.state.current_step, target);
            return Err(self.illegal(target.as_str()));
        }
        self.enter(target).await
    }

    /// `Ok(None)` at the last step.
    pub async fn navigate_to_next_step(&mut self) -> Result<Option<StepId>> {
        match self.state.current_step.next() {
            Some(next) => self.navigate_to_step(next).await.map(Some),
            None => {
                info!("Already at the last step");
                Ok(None)
            }
        }
    }

    /// Stepping back one step is always allowed while in draft. `Ok(None)` at
    /// the first step.
    pub async fn navigate_to_prev_step(&mut self) -> Result<Option<StepId>> {
        let Some(prev) = self.state.current_step.prev() else {
            info!("Already at the first step");
            return Ok(None);
        };
        if self.state.is_submitted() {
            return Err(self.illegal(prev.as_str()));
        }
        self.enter(prev).await.map(Some)
    }

    /// Only after a confirmed save. Idempotent.
    pub fn mark_step_as_completed(&mut self, step: StepId) {
        if self.state.completed_steps.insert(step) {
            info!("Step {} completed", step);
        }
        self.refresh();
    }

    pub fn set_prescription_id(&mut self, prescription_id: impl Into<String>) -> Result<()> {
        let prescription_id = prescription_id.into();
        match &self.state.prescription_id {
            Some(existing) if *existing != prescription_id => Err(WizardError::Validation(
                format!("Prescription {existing} is already in progress"),
            )),
            _ => {
                info!("Prescription id set to {}", prescription_id);
                self.state.prescription_id = Some(prescription_id);
                Ok(())
            }
        }
    }

    /// Submit from the last step. Failures leave the state untouched.
    pub async fn submit_prescription(&mut self) -> Result<()> {
        if self.state.is_submitted() {
            return Err(self.illegal("submitted"));
        }
        let Some(prescription_id) = self.state.prescription_id.clone() else {
            let err = WizardError::MissingPrescription;
            self.view.notify(Notice::error(err.to_string()));
            return Err(err);
        };
        if !self.state.current_step.is_last() {
            return Err(self.illegal("submitted"));
        }

        self.view.set_navigation_enabled(false);
        let result = self.gateway.submit_prescription(&prescription_id).await;
        self.view.set_navigation_enabled(true);

        match result {
            Ok(_) => {
                self.state.lifecycle = Lifecycle::Submitted;
                info!("Prescription {} submitted", prescription_id);
                self.refresh();
                self.view
                    .notify(Notice::success("Prescription submitted successfully"));
                self.view.redirect(&self.listing_path);
                Ok(())
            }
            Err(err) => {
                warn!("Submitting prescription {} failed: {}", prescription_id, err);
                self.view.notify(Notice::error(format!(
                    "Failed to submit prescription: {err}"
                )));
                Err(err)
            }
        }
    }

    pub fn snapshot(&self) -> ProgressSnapshot {
        self.state.snapshot()
    }

    fn refresh(&self) {
        self.view.refresh(&self.state.snapshot());
    }

    /// Load first, then commit, so a failed load changes nothing.
    async fn enter(&mut self, target: StepId) -> Result<StepId> {
        self.load_content(target).await?;
        let from = self.state.current_step;
        self.state.current_step = target;
        info!("Navigated {} -> {}", from, target);
        self.refresh();
        Ok(target)
    }

    async fn load_content(&self, step: StepId) -> Result<()> {
        self.view.set_navigation_enabled(false);
        let loaded = self
            .content
            .mount(step, self.state.prescription_id.as_deref())
            .await;
        self.view.set_navigation_enabled(true);
        if let Err(err) = &loaded {
            warn!("Loading content for {} failed: {}", step, err);
        }
        loaded
    }

    fn illegal(&self, to: &str) -> WizardError {
        WizardError::IllegalTransition {
            from: self.state.current_step,
            to: to.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeContent, FakeGateway, RecordingView};
    use crate::view::NoticeLevel;
    use pretty_assertions::assert_eq;

    struct Fixture {
        controller: WizardController,
        gateway: FakeGateway,
        content: FakeContent,
        view: RecordingView,
    }

    fn fixture() -> Fixture {
        let gateway = FakeGateway::new();
        let content = FakeContent::default();
        let view = RecordingView::default();
        let controller = WizardController::new(
            Arc::new(gateway.clone()),
            Arc::new(content.clone()),
            Arc::new(view.clone()),
            "/orthotics_portal/prescriptions",
        );
        Fixture {
            controller,
            gateway,
            content,
            view,
        }
    }

    #[test]
    fn reachability_matches_completed_or_immediate_next() {
        let mut state = WizardState::default();
        state.completed_steps.insert(StepId::Clinical);
        state.current_step = StepId::Scans;

        for step in steps::steps().iter().map(|s| s.id) {
            let expected = state.completed_steps.contains(&step)
                || step.position() == state.current_step.position() + 1;
            assert_eq!(state.can_advance_to(step), expected, "{step}");
        }
    }

    #[tokio::test]
    async fn patient_scans_clinical_scenario() {
        let Fixture {
            mut controller,
            content,
            ..
        } = fixture();
        controller.initialize(None, None).await.unwrap();

        assert_eq!(controller.current_step(), StepId::Patient);
        assert!(controller.completed_steps().is_empty());
        assert!(controller.can_advance_to(StepId::Scans));
        assert!(!controller.can_advance_to(StepId::Clinical));

        controller.mark_step_as_completed(StepId::Patient);
        controller.navigate_to_step(StepId::Scans).await.unwrap();
        controller.mark_step_as_completed(StepId::Scans);

        assert!(controller.can_advance_to(StepId::Clinical));
        assert_eq!(content.mounted(), vec![StepId::Patient, StepId::Scans]);
    }

    #[tokio::test]
    async fn mark_step_as_completed_is_idempotent() {
        let mut f = fixture();
        f.controller.mark_step_as_completed(StepId::Patient);
        let once = f.controller.completed_steps().clone();
        f.controller.mark_step_as_completed(StepId::Patient);
        assert_eq!(f.controller.completed_steps(), &once);
    }

    #[tokio::test]
    async fn skipping_ahead_is_illegal_and_changes_nothing() {
        let mut f = fixture();
        f.controller.initialize(None, None).await.unwrap();
        let before = f.controller.state().clone();

        let err = f.controller.navigate_to_step(StepId::Posting).await.unwrap_err();
        assert_eq!(
            err,
            WizardError::IllegalTransition {
                from: StepId::Patient,
                to: "posting".into()
            }
        );
        assert_eq!(f.controller.state(), &before);
    }

    #[tokio::test]
    async fn unknown_step_ids_are_rejected() {
        let mut f = fixture();
        let err = f.controller.navigate_to("billing").await.unwrap_err();
        assert_eq!(err, WizardError::UnknownStep("billing".into()));
    }

    #[tokio::test]
    async fn failed_content_load_keeps_the_current_step() {
        let mut f = fixture();
        f.controller.initialize(None, None).await.unwrap();
        f.content.break_step(StepId::Scans);

        assert!(f.controller.navigate_to_next_step().await.is_err());
        assert_eq!(f.controller.current_step(), StepId::Patient);
        // Controls come back even though the load failed.
        assert_eq!(f.view.nav_toggles().last(), Some(&true));
    }

    #[tokio::test]
    async fn prev_and_next_report_the_boundaries() {
        let mut f = fixture();
        f.controller.initialize(None, None).await.unwrap();
        assert_eq!(f.controller.navigate_to_prev_step().await.unwrap(), None);

        f.controller
            .initialize(Some(StepId::Notes), Some("rx-1".into()))
            .await
            .unwrap();
        assert_eq!(f.controller.navigate_to_next_step().await.unwrap(), None);
        assert_eq!(
            f.controller.navigate_to_prev_step().await.unwrap(),
            Some(StepId::Device)
        );
    }

    #[tokio::test]
    async fn submit_without_prescription_makes_no_gateway_call() {
        let mut f = fixture();
        f.controller
            .initialize(Some(StepId::Notes), None)
            .await
            .unwrap();

        let err = f.controller.submit_prescription().await.unwrap_err();
        assert_eq!(err, WizardError::MissingPrescription);
        assert!(f.gateway.calls().is_empty());
        assert_eq!(f.controller.state().lifecycle, Lifecycle::Draft);
    }

    #[tokio::test]
    async fn submit_is_only_allowed_from_the_last_step() {
        let mut f = fixture();
        f.controller
            .initialize(Some(StepId::Device), Some("rx-1".into()))
            .await
            .unwrap();
        assert!(matches!(
            f.controller.submit_prescription().await,
            Err(WizardError::IllegalTransition { .. })
        ));
        assert_eq!(f.gateway.call_count("submit_prescription"), 0);
    }

    #[tokio::test]
    async fn successful_submit_is_terminal_and_redirects() {
        let mut f = fixture();
        f.controller
            .initialize(Some(StepId::Notes), Some("rx-1".into()))
            .await
            .unwrap();

        f.controller.submit_prescription().await.unwrap();

        assert_eq!(f.controller.state().lifecycle, Lifecycle::Submitted);
        assert_eq!(f.view.redirects(), vec!["/orthotics_portal/prescriptions"]);
        assert_eq!(f.view.notices()[0].level, NoticeLevel::Success);
        assert!(!f.controller.can_advance_to(StepId::Notes));
        assert!(f.controller.navigate_to_prev_step().await.is_err());
        assert!(f.controller.submit_prescription().await.is_err());
        assert_eq!(f.gateway.call_count("submit_prescription"), 1);
    }

    #[tokio::test]
    async fn failed_submit_leaves_state_unchanged() {
        let mut f = fixture();
        f.controller
            .initialize(Some(StepId::Notes), Some("rx-1".into()))
            .await
            .unwrap();
        f.gateway.fail("submit_prescription");
        let before = f.controller.state().clone();

        assert!(f.controller.submit_prescription().await.is_err());
        assert_eq!(f.controller.state(), &before);
        assert!(f.view.redirects().is_empty());
        assert_eq!(f.view.notices()[0].level, NoticeLevel::Error);
    }

    #[tokio::test]
    async fn snapshot_reflects_progress() {
        let mut f = fixture();
        f.controller.initialize(None, None).await.unwrap();
        f.controller.mark_step_as_completed(StepId::Patient);
        f.controller.navigate_to_next_step().await.unwrap();

        let snap = f.view.last_snapshot().unwrap();
        assert_eq!(snap.current_step, StepId::Scans);
        assert_eq!(snap.title, "Scan Upload");
        assert_eq!(snap.indicators[0].indicator, Indicator::Completed);
        assert_eq!(snap.indicators[1].indicator, Indicator::Active);
        assert_eq!(snap.indicators[2].indicator, Indicator::Pending);
        assert!(snap.prev_enabled);
        assert!(snap.show_next && !snap.show_submit);
    }

    #[tokio::test]
    async fn changing_the_prescription_id_is_refused() {
        let mut f = fixture();
        f.controller.set_prescription_id("rx-1").unwrap();
        f.controller.set_prescription_id("rx-1").unwrap();
        assert!(f.controller.set_prescription_id("rx-2").is_err());
        assert_eq!(f.controller.prescription_id(), Some("rx-1"));
    }
}
