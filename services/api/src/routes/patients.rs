use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use domain::records::{CreatePatientInput, Patient};
use serde::Deserialize;
use tracing::info;
use ulid::Ulid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct PatientSearch {
    pub q: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(search): Query<PatientSearch>,
) -> ApiResult<Json<Vec<Patient>>> {
    let query = search.q.unwrap_or_default();
    let patients = state.records.patients.read().await;

    let mut found: Vec<Patient> = patients
        .iter()
        .filter(|p| p.matches(&query))
        .cloned()
        .collect();
    found.sort_by(|a, b| {
        (a.last_name.to_lowercase(), a.first_name.to_lowercase())
            .cmp(&(b.last_name.to_lowercase(), b.first_name.to_lowercase()))
    });
    Ok(Json(found))
}

pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreatePatientInput>,
) -> ApiResult<impl IntoResponse> {
    let first_name = input.first_name.trim();
    let last_name = input.last_name.trim();
    if first_name.is_empty() || last_name.is_empty() {
        return Err(domain::Error::validation("First and last name are required").into());
    }
    let external_id = input
        .external_id
        .map(|id| id.trim().to_string())
        .filter(|id| !id.is_empty());

    let mut patients = state.records.patients.write().await;
    if let Some(external_id) = &external_id {
        if patients
            .iter()
            .any(|p| p.external_id.as_ref() == Some(external_id))
        {
            return Err(domain::Error::Uniqueness {
                field: "external_id".to_string(),
            }
            .into());
        }
    }

    let mut patient = Patient::new(
        Ulid::new().to_string(),
        first_name.to_string(),
        last_name.to_string(),
        input.date_of_birth,
    );
    patient.external_id = external_id;
    patients.push(patient.clone());

    info!("Patient {} created", patient.id);
    Ok((StatusCode::CREATED, Json(patient)))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Patient>> {
    state
        .patient(&id)
        .await
        .map(Json)
        .ok_or_else(|| ApiError::not_found(format!("Patient {id}")))
}
