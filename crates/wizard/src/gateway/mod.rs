//! Backend gateway: the REST API the wizard persists through.

mod http;

use async_trait::async_trait;
use domain::payloads::{Attachment, AttachmentFile, Foot, ScanFile, ScanRecord};
use domain::prescriptions::PrescriptionSummary;
use domain::records::{InvoiceSummary, Order, Patient};
use domain::StepId;
use serde_json::Value;

use crate::error::Result;

pub(crate) use http::check;
pub use http::{error_message, HttpGateway, CSRF_COOKIE, CSRF_HEADER};

/// Every call is a single request. Mutations carry the anti-forgery token.
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Saved data for a step resource; `None` when nothing is saved yet.
    async fn fetch_step(&self, prescription_id: &str, step: StepId) -> Result<Option<Value>>;

    /// POST or PUT the step payload, as the step's registry entry dictates.
    async fn save_step(&self, prescription_id: &str, step: StepId, payload: &Value)
        -> Result<Value>;

    async fn create_prescription(&self, patient_id: &str) -> Result<PrescriptionSummary>;

    /// The prescription record, including notes fields once saved.
    async fn fetch_prescription(&self, prescription_id: &str) -> Result<Option<Value>>;

    async fn update_prescription(&self, prescription_id: &str, payload: &Value) -> Result<Value>;

    async fn submit_prescription(&self, prescription_id: &str) -> Result<PrescriptionSummary>;

    async fn upload_scans(
        &self,
        prescription_id: &str,
        files: &[(Foot, ScanFile)],
    ) -> Result<Vec<ScanRecord>>;

    async fn list_scans(&self, prescription_id: &str) -> Result<Vec<ScanRecord>>;

    async fn upload_attachment(
        &self,
        prescription_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment>;

    async fn search_patients(&self, query: &str) -> Result<Vec<Patient>>;

    async fn create_patient(&self, input: &Value) -> Result<Patient>;

    async fn list_prescriptions(&self, status: Option<&str>) -> Result<Vec<PrescriptionSummary>>;

    async fn list_orders(&self) -> Result<Vec<Order>>;

    async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>>;
}

/// Resource path of a step under its prescription.
pub fn step_resource(prescription_id: &str, step: StepId) -> String {
    match step.resource() {
        Some(resource) => format!("prescriptions/{prescription_id}/{resource}"),
        None => format!("prescriptions/{prescription_id}"),
    }
}
