use axum::extract::{Path, State};
use axum::http::{Method, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use domain::prescriptions::Command;
use domain::{StepData, StepId};
use serde_json::Value;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

fn step_for(resource: &str) -> ApiResult<StepId> {
    StepId::from_resource(resource).ok_or_else(|| ApiError::not_found(format!("Resource {resource}")))
}

/// Normalize a wire object with the step's field table and store it. The
/// path id fills in a missing `prescription_id`; a different one is refused
/// by the aggregate.
pub async fn save_payload(
    state: &AppState,
    prescription_id: &str,
    step: StepId,
    body: Value,
) -> ApiResult<Value> {
    let mut wire = match body {
        Value::Object(object) => object,
        _ => {
            return Err(ApiError::BadRequest(format!(
                "{} payload must be a JSON object",
                step.title()
            )))
        }
    };
    wire.entry("prescription_id")
        .or_insert_with(|| Value::String(prescription_id.to_string()));

    let payload = StepData::from_wire(step, &Value::Object(wire))?;
    let saved = payload.to_wire()?;
    state
        .execute(prescription_id, Command::SaveStep { payload })
        .await?;

    info!("Saved {} for prescription {}", step, prescription_id);
    Ok(saved)
}

pub async fn fetch(
    State(state): State<AppState>,
    Path((id, resource)): Path<(String, String)>,
) -> ApiResult<Json<Value>> {
    let step = step_for(&resource)?;
    let prescription = state.prescription(&id).await?;

    match prescription.step(step) {
        Some(data) => Ok(Json(data.to_wire()?)),
        None => Err(ApiError::NotFound(format!(
            "No {} saved for prescription {id}",
            step.title()
        ))),
    }
}

/// POST and PUT both replace the step's payload.
pub async fn save(
    State(state): State<AppState>,
    method: Method,
    Path((id, resource)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> ApiResult<impl IntoResponse> {
    let step = step_for(&resource)?;
    let saved = save_payload(&state, &id, step, body).await?;

    let status = if method == Method::POST {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(saved)))
}
