use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::prescriptions::inputs::{
    CreatePrescriptionInput, ListPrescriptionsQuery, SubmitPrescriptionInput,
};
use domain::prescriptions::{Command, Prescription, PrescriptionSummary};
use domain::StepId;
use serde_json::{Map, Value};
use tracing::info;
use ulid::Ulid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

use super::steps::save_payload;

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListPrescriptionsQuery>,
) -> ApiResult<Json<Vec<PrescriptionSummary>>> {
    let summaries = state
        .prescriptions_repo
        .all()?
        .iter()
        .map(|view| &view.prescription)
        .filter(|rx| query.status.map_or(true, |status| rx.status == status))
        .filter(|rx| {
            query
                .patient_id
                .as_deref()
                .map_or(true, |patient| rx.patient_id.as_deref() == Some(patient))
        })
        .map(PrescriptionSummary::from)
        .collect();
    Ok(Json(summaries))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePrescriptionInput>,
) -> ApiResult<impl IntoResponse> {
    let patient_id = input.patient_id.trim().to_string();
    if patient_id.is_empty() {
        return Err(domain::Error::validation("Please select a patient").into());
    }
    if state.patient(&patient_id).await.is_none() {
        return Err(ApiError::BadRequest(format!(
            "Patient {patient_id} does not exist"
        )));
    }

    let id = Ulid::new().to_string();
    state
        .execute(
            &id,
            Command::StartPrescription {
                id: id.clone(),
                patient_id,
            },
        )
        .await?;

    let prescription = state.prescription(&id).await?;
    info!("Prescription {} started", id);
    Ok((
        StatusCode::CREATED,
        Json(PrescriptionSummary::from(&prescription)),
    ))
}

/// The summary, with the notes step's fields inlined once they are saved.
fn record(prescription: &Prescription) -> ApiResult<Value> {
    let mut record = serde_json::to_value(PrescriptionSummary::from(prescription))?;
    if let (Some(object), Some(notes)) = (
        record.as_object_mut(),
        prescription.step(StepId::Notes),
    ) {
        if let Value::Object(fields) = notes.to_wire()? {
            object.extend(fields);
        }
    }
    Ok(record)
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Value>> {
    let prescription = state.prescription(&id).await?;
    Ok(Json(record(&prescription)?))
}

/// Notes and administration options live on the prescription itself.
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> ApiResult<Json<Value>> {
    let mut body = match body {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    body.remove("id");

    let saved = save_payload(&state, &id, StepId::Notes, Value::Object(body)).await?;
    info!("Prescription {} notes updated", id);
    Ok(Json(saved))
}

pub async fn submit(
    State(state): State<AppState>,
    Json(input): Json<SubmitPrescriptionInput>,
) -> ApiResult<Json<PrescriptionSummary>> {
    let id = input.prescription_id.trim().to_string();
    state.execute(&id, Command::SubmitPrescription).await?;

    let prescription = state.prescription(&id).await?;
    state.place_order(&prescription).await;

    info!("Prescription {} submitted", id);
    Ok(Json(PrescriptionSummary::from(&prescription)))
}

