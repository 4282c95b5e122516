//! Plain records behind the portal's list views.

use chrono::{DateTime, NaiveDate, Utc};
use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::payloads::Turnaround;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Patient {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    #[new(default)]
    pub external_id: Option<String>,
    #[new(value = "Utc::now()")]
    pub created_at: DateTime<Utc>,
}

impl Patient {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }

    /// Case-insensitive match on name or external id.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.trim().to_lowercase();
        if query.is_empty() {
            return true;
        }
        self.full_name().to_lowercase().contains(&query)
            || self
                .external_id
                .as_deref()
                .is_some_and(|id| id.to_lowercase().contains(&query))
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct CreatePatientInput {
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub external_id: Option<String>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Order {
    pub id: String,
    pub prescription_id: String,
    pub patient_id: Option<String>,
    pub turnaround: Turnaround,
    #[new(default)]
    pub status: OrderStatus,
    #[new(value = "Utc::now()")]
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[default]
    Pending,
    Paid,
    Cancelled,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct InvoiceItem {
    pub description: String,
    pub price_cents: u64,
    pub quantity: u32,
}

impl InvoiceItem {
    pub fn line_total_cents(&self) -> u64 {
        self.price_cents * u64::from(self.quantity)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct Invoice {
    pub id: String,
    pub invoice_number: String,
    pub order_id: String,
    pub items: Vec<InvoiceItem>,
    #[new(default)]
    pub status: InvoiceStatus,
    pub due_date: NaiveDate,
    #[new(value = "Utc::now()")]
    pub created_at: DateTime<Utc>,
}

impl Invoice {
    pub fn subtotal_cents(&self) -> u64 {
        self.items.iter().map(InvoiceItem::line_total_cents).sum()
    }
}

/// Invoice as listed, with its subtotal.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceSummary {
    #[serde(flatten)]
    pub invoice: Invoice,
    pub subtotal_cents: u64,
}

impl From<Invoice> for InvoiceSummary {
    fn from(invoice: Invoice) -> Self {
        let subtotal_cents = invoice.subtotal_cents();
        Self {
            invoice,
            subtotal_cents,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subtotal_is_a_plain_sum_of_lines() {
        let invoice = Invoice::new(
            "inv-1".into(),
            "INV-0001".into(),
            "ord-1".into(),
            vec![
                InvoiceItem::new("Orthosis pair".into(), 12_500, 2),
                InvoiceItem::new("Express turnaround".into(), 2_000, 1),
            ],
            NaiveDate::from_ymd_opt(2026, 1, 31).unwrap(),
        );
        assert_eq!(invoice.subtotal_cents(), 27_000);
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(InvoiceSummary::from(invoice).subtotal_cents, 27_000);
    }

    #[test]
    fn patients_match_on_name_and_external_id() {
        let mut patient = Patient::new("p-1".into(), "Ada".into(), "Lovelace".into(), None);
        patient.external_id = Some("NHS-42".into());
        assert!(patient.matches("love"));
        assert!(patient.matches("nhs-4"));
        assert!(patient.matches(""));
        assert!(!patient.matches("turing"));
    }
}
