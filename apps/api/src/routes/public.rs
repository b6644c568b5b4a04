use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::warn;

use crate::admin::export::content_disposition;
use crate::errors::AppError;
use crate::models::profile::Profile;
use crate::state::AppState;
use crate::store::Blob;

#[derive(Serialize)]
pub struct PublicProfile {
    #[serde(flatten)]
    pub profile: Profile,
    pub has_avatar: bool,
    pub has_resume: bool,
}

/// GET /api/v1/profile
pub async fn handle_get_profile(State(state): State<AppState>) -> Json<PublicProfile> {
    let (has_avatar, has_resume) = match state.store.read().await {
        Ok(doc) => (doc.avatar.is_some(), doc.resume.is_some()),
        Err(e) => {
            warn!("Could not read shared document for profile: {e}");
            (false, false)
        }
    };

    Json(PublicProfile {
        profile: (*state.profile).clone(),
        has_avatar,
        has_resume,
    })
}

fn blob_response(blob: &Blob, disposition: &str) -> Result<Response, AppError> {
    let bytes = blob
        .decode()
        .map_err(|e| anyhow::anyhow!("Stored blob {} is not valid base64: {e}", blob.file_name))?;
    Ok((
        [
            (header::CONTENT_TYPE, blob.content_type.clone()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition(disposition, &blob.file_name),
            ),
        ],
        bytes,
    )
        .into_response())
}

/// GET /api/v1/avatar
pub async fn handle_get_avatar(State(state): State<AppState>) -> Result<Response, AppError> {
    let doc = state.store.read().await?;
    let avatar = doc
        .avatar
        .ok_or_else(|| AppError::NotFound("No avatar uploaded".to_string()))?;
    blob_response(&avatar, "inline")
}

/// GET /api/v1/resume
pub async fn handle_get_resume(State(state): State<AppState>) -> Result<Response, AppError> {
    let doc = state.store.read().await?;
    let resume = doc
        .resume
        .ok_or_else(|| AppError::NotFound("No résumé uploaded".to_string()))?;
    blob_response(&resume.file, "attachment")
}
