use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use cqrs_es::{
    persist::{PersistenceError, ViewContext, ViewRepository},
    Aggregate, EventEnvelope, View as CqrsView,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;

use crate::payloads::Attachment;
use crate::steps::StepId;

use super::{Prescription, PrescriptionStatus, AGGREGATE_TYPE};

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct View {
    pub aggregate_type: String,
    pub command_id: String,
    pub id: String,
    pub prescription: Prescription,
}

impl CqrsView<Prescription> for View {
    fn update(&mut self, event: &EventEnvelope<Prescription>) {
        self.id.clone_from(&event.aggregate_id);
        self.aggregate_type = AGGREGATE_TYPE.to_string();
        self.command_id = event
            .metadata
            .get("command_id")
            .cloned()
            .unwrap_or_default();
        self.prescription.apply(event.payload.clone());
    }
}

/// A prescription as the API lists it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrescriptionSummary {
    pub id: String,
    pub patient_id: Option<String>,
    pub status: PrescriptionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitted_at: Option<DateTime<Utc>>,
    pub saved_steps: Vec<StepId>,
    #[serde(default)]
    pub attachments: Vec<Attachment>,
}

impl From<&Prescription> for PrescriptionSummary {
    fn from(rx: &Prescription) -> Self {
        Self {
            id: rx.id.clone(),
            patient_id: rx.patient_id.clone(),
            status: rx.status,
            created_at: rx.created_at,
            updated_at: rx.updated_at,
            submitted_at: rx.submitted_at,
            saved_steps: rx.saved_steps().into_iter().collect(),
            attachments: rx.attachments.clone(),
        }
    }
}

/// Views by prescription id, kept in process memory.
#[derive(Default)]
pub struct MemViewRepository {
    views: RwLock<HashMap<String, (View, i64)>>,
}

impl MemViewRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every stored view, newest prescription first.
    pub fn all(&self) -> Result<Vec<View>, PersistenceError> {
        let views = self.views.read().map_err(poisoned)?;
        let mut all: Vec<View> = views.values().map(|(view, _)| view.clone()).collect();
        all.sort_by(|a, b| b.prescription.created_at.cmp(&a.prescription.created_at));
        Ok(all)
    }
}

fn poisoned<T>(_: T) -> PersistenceError {
    PersistenceError::UnknownError("prescription view lock poisoned".into())
}

#[async_trait]
impl ViewRepository<View, Prescription> for MemViewRepository {
    async fn load(&self, view_id: &str) -> Result<Option<View>, PersistenceError> {
        Ok(self.load_with_context(view_id).await?.map(|(view, _)| view))
    }

    async fn load_with_context(
        &self,
        view_id: &str,
    ) -> Result<Option<(View, ViewContext)>, PersistenceError> {
        let views = self.views.read().map_err(poisoned)?;
        Ok(views.get(view_id).map(|(view, version)| {
            (view.clone(), ViewContext::new(view_id.to_string(), *version))
        }))
    }

    async fn update_view(&self, view: View, context: ViewContext) -> Result<(), PersistenceError> {
        let mut views = self.views.write().map_err(poisoned)?;
        let current = views.get(&context.view_instance_id).map(|(_, v)| *v).unwrap_or(0);
        if current != context.version {
            return Err(PersistenceError::OptimisticLockError);
        }
        views.insert(context.view_instance_id, (view, current + 1));
        Ok(())
    }
}

pub struct Query {
    repo: Arc<MemViewRepository>,
}

impl Query {
    pub fn new(repo: Arc<MemViewRepository>) -> Self {
        Self { repo }
    }

    async fn update(
        &self,
        prescription_id: &str,
        events: &[EventEnvelope<Prescription>],
    ) -> Result<(), PersistenceError> {
        let (mut view, view_context) = match self.repo.load_with_context(prescription_id).await? {
            None => {
                let view_context = ViewContext::new(prescription_id.to_string(), 0);
                (View::default(), view_context)
            }
            Some((view, context)) => (view, context),
        };

        for event in events {
            view.update(event);
        }

        self.repo.update_view(view, view_context).await
    }
}

#[async_trait]
impl cqrs_es::Query<Prescription> for Query {
    async fn dispatch(&self, prescription_id: &str, events: &[EventEnvelope<Prescription>]) {
        if let Err(err) = self.update(prescription_id, events).await {
            error!("PrescriptionQuery error for {}: {}", prescription_id, err);
        }
    }
}
