use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Days, Utc};
use cqrs_es::persist::ViewRepository;
use domain::payloads::Turnaround;
use domain::prescriptions::{self, cqrs::PrescriptionCqrs, MemViewRepository, Prescription};
use domain::records::{Invoice, InvoiceItem, Order, Patient};
use tokio::sync::RwLock;
use tracing::info;
use ulid::Ulid;

use crate::config::ApiConfig;
use crate::error::{ApiError, ApiResult};

/// Price of one orthotic prescription, in cents.
pub const PRESCRIPTION_PRICE_CENTS: u64 = 10_000;
pub const INVOICE_TERMS_DAYS: u64 = 30;

/// Patients, orders and invoices. Prescriptions live in the event store.
#[derive(Default)]
pub struct Records {
    pub patients: RwLock<Vec<Patient>>,
    pub orders: RwLock<Vec<Order>>,
    pub invoices: RwLock<Vec<Invoice>>,
}

#[derive(Clone)]
pub struct AppState {
    pub prescriptions_repo: Arc<MemViewRepository>,
    pub prescriptions_cqrs: Arc<PrescriptionCqrs>,
    pub records: Arc<Records>,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> Self {
        let prescriptions_repo = prescriptions::cqrs::init_repo();
        let prescriptions_cqrs = prescriptions::cqrs::init(prescriptions_repo.clone());

        Self {
            prescriptions_repo,
            prescriptions_cqrs,
            records: Arc::new(Records::default()),
            config: Arc::new(config),
        }
    }

    /// Run a prescription command, tagging it with a fresh command id.
    pub async fn execute(&self, id: &str, command: prescriptions::Command) -> ApiResult<()> {
        let mut metadata = HashMap::new();
        metadata.insert("command_id".to_string(), Ulid::new().to_string());

        self.prescriptions_cqrs
            .execute_with_metadata(id, command, metadata)
            .await?;
        Ok(())
    }

    pub async fn prescription(&self, id: &str) -> ApiResult<Prescription> {
        self.prescriptions_repo
            .load(id)
            .await?
            .map(|view| view.prescription)
            .ok_or_else(|| ApiError::not_found(format!("Prescription {id}")))
    }

    pub async fn patient(&self, id: &str) -> Option<Patient> {
        self.records
            .patients
            .read()
            .await
            .iter()
            .find(|p| p.id == id)
            .cloned()
    }

    /// A submitted prescription becomes a pending order with a pending
    /// invoice for it.
    pub async fn place_order(&self, prescription: &Prescription) -> Order {
        let turnaround = match prescription.step(domain::StepId::Notes) {
            Some(domain::StepData::Notes(notes)) => notes.turnaround,
            _ => Turnaround::default(),
        };
        let order = Order::new(
            Ulid::new().to_string(),
            prescription.id.clone(),
            prescription.patient_id.clone(),
            turnaround,
        );

        let mut invoices = self.records.invoices.write().await;
        let due_date = Utc::now()
            .date_naive()
            .checked_add_days(Days::new(INVOICE_TERMS_DAYS))
            .unwrap_or_else(|| Utc::now().date_naive());
        let invoice_number = format!("INV-{:05}", invoices.len() + 1);
        invoices.push(Invoice::new(
            Ulid::new().to_string(),
            invoice_number,
            order.id.clone(),
            vec![InvoiceItem::new(
                format!("Orthotic prescription {}", prescription.id),
                PRESCRIPTION_PRICE_CENTS,
                1,
            )],
            due_date,
        ));
        drop(invoices);

        self.records.orders.write().await.push(order.clone());
        info!("Order {} placed for prescription {}", order.id, prescription.id);
        order
    }
}
