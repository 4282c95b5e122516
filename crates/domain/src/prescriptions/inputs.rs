use serde::{Deserialize, Serialize};

use super::aggregate::PrescriptionStatus;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CreatePrescriptionInput {
    #[serde(alias = "patient")]
    pub patient_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SubmitPrescriptionInput {
    pub prescription_id: String,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ListPrescriptionsQuery {
    pub status: Option<PrescriptionStatus>,
    pub patient_id: Option<String>,
}
