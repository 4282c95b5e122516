//! Multipart uploads. Only file metadata is recorded; contents are dropped
//! once measured.

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use domain::payloads::{Attachment, AttachmentFile, Foot, ScanFile, ScanRecord};
use domain::prescriptions::Command;
use tracing::{info, warn};
use ulid::Ulid;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

pub async fn list_scans(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ScanRecord>>> {
    let prescription = state.prescription(&id).await?;
    Ok(Json(prescription.scans))
}

pub async fn upload_scans(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut records = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or_default().to_string();

        if name == "prescription_id" {
            let claimed = field.text().await?;
            if claimed.trim() != id {
                return Err(ApiError::BadRequest(format!(
                    "Scans for prescription {} posted to {id}",
                    claimed.trim()
                )));
            }
            continue;
        }

        let Some(foot) = Foot::from_form_field(&name) else {
            warn!("ignoring unexpected upload field {:?}", name);
            continue;
        };

        let file = ScanFile {
            file_name: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().unwrap_or_default().to_string(),
            bytes: field.bytes().await?.to_vec(),
        };
        file.validate(foot)?;

        records.push(ScanRecord {
            foot,
            file_name: file.stored_name(&id, foot),
            original_name: file.file_name.clone(),
            size: file.bytes.len(),
            uploaded_at: Utc::now(),
        });
    }

    state
        .execute(
            &id,
            Command::AddScans {
                scans: records.clone(),
            },
        )
        .await?;

    info!("{} scan(s) stored for prescription {}", records.len(), id);
    Ok((StatusCode::CREATED, Json(records)))
}

pub async fn upload_attachment(
    State(state): State<AppState>,
    Path(id): Path<String>,
    mut multipart: Multipart,
) -> ApiResult<impl IntoResponse> {
    let mut file = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        file = Some(AttachmentFile {
            file_name: field.file_name().unwrap_or_default().to_string(),
            content_type: field.content_type().unwrap_or_default().to_string(),
            bytes: field.bytes().await?.to_vec(),
        });
    }

    let file = file.ok_or_else(|| ApiError::BadRequest("No file received".to_string()))?;
    file.validate()?;

    let attachment = Attachment {
        id: Ulid::new().to_string(),
        file_name: file.file_name,
        size: file.bytes.len(),
        uploaded_at: Utc::now(),
    };
    state
        .execute(
            &id,
            Command::AddAttachment {
                attachment: attachment.clone(),
            },
        )
        .await?;

    info!("Attachment {} added to prescription {}", attachment.id, id);
    Ok((StatusCode::CREATED, Json(attachment)))
}
