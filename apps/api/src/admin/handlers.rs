use anyhow::Context;
use axum::{
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode},
    response::Response,
    Json,
};
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::admin::export::{attachment, conversations_csv, document_json, users_csv};
use crate::admin::{password_matches, require_admin};
use crate::errors::AppError;
use crate::extraction::{extract_text, ExtractedText, MAX_UPLOAD_BYTES};
use crate::fetcher::DEFAULT_MAX_PAGES;
use crate::knowledge::loader::{index_profile, index_resume};
use crate::knowledge::{ChunkSource, KnowledgeStats};
use crate::models::conversation::ConversationEntry;
use crate::models::user::UserRecord;
use crate::state::AppState;
use crate::store::{Blob, ResumeBlob};

pub const MAX_AVATAR_BYTES: usize = 2 * 1024 * 1024;
/// Request body limit for upload routes; leaves room for multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;
const AVATAR_TYPES: &[&str] = &["image/png", "image/jpeg", "image/gif", "image/webp"];

// ── Login / stats ────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub ok: bool,
}

/// POST /api/v1/admin/login
pub async fn handle_login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    if !password_matches(&req.password, &state.config.admin_password) {
        warn!("Rejected admin login attempt");
        return Err(AppError::Unauthorized);
    }
    info!("Admin logged in");
    Ok(Json(LoginResponse { ok: true }))
}

#[derive(Serialize)]
pub struct AdminStats {
    pub users: usize,
    pub users_with_email: usize,
    pub conversations: usize,
    pub messages: usize,
    pub active_sessions: usize,
    pub has_resume: bool,
    pub has_avatar: bool,
    pub store_backend: &'static str,
    pub updated_at: Option<DateTime<Utc>>,
    pub knowledge: KnowledgeStats,
}

/// GET /api/v1/admin/stats
pub async fn handle_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<AdminStats>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let doc = state.store.read().await?;

    Ok(Json(AdminStats {
        users: doc.users.len(),
        users_with_email: doc.users.values().filter(|u| u.email.is_some()).count(),
        conversations: doc.conversations.values().filter(|c| !c.is_empty()).count(),
        messages: doc.message_count(),
        active_sessions: state.sessions.active_count().await,
        has_resume: doc.resume.is_some(),
        has_avatar: doc.avatar.is_some(),
        store_backend: state.store.backend_name(),
        updated_at: doc.updated_at,
        knowledge: state.knowledge.read().await.stats(),
    }))
}

// ── Visitors ─────────────────────────────────────────────────────────────────

#[derive(Serialize)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: UserRecord,
    pub messages: usize,
}

#[derive(Serialize)]
pub struct UserConversation {
    pub user: UserRecord,
    pub entries: Vec<ConversationEntry>,
}

/// GET /api/v1/admin/users (newest first)
pub async fn handle_list_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<UserSummary>>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let mut doc = state.store.read().await?;

    let mut users: Vec<UserSummary> = std::mem::take(&mut doc.users)
        .into_values()
        .map(|user| UserSummary {
            messages: doc.conversations.get(&user.id).map_or(0, Vec::len),
            user,
        })
        .collect();
    users.sort_by(|a, b| b.user.created_at.cmp(&a.user.created_at));

    Ok(Json(users))
}

/// GET /api/v1/admin/users/:id/conversations
pub async fn handle_user_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserConversation>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let mut doc = state.store.read().await?;

    let user = doc
        .users
        .remove(&user_id)
        .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;
    let entries = doc.conversations.remove(&user_id).unwrap_or_default();

    Ok(Json(UserConversation { user, entries }))
}

/// DELETE /api/v1/admin/users/:id
pub async fn handle_delete_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(user_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    if !state.store.delete_user(user_id).await? {
        return Err(AppError::NotFound(format!("User {user_id} not found")));
    }
    info!("Deleted user {user_id} and their conversation log");
    Ok(StatusCode::NO_CONTENT)
}

#[derive(Serialize)]
pub struct ClearedResponse {
    pub removed: usize,
}

/// DELETE /api/v1/admin/conversations
pub async fn handle_clear_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<ClearedResponse>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let removed = state.store.clear_conversations().await?;
    info!("Cleared {removed} logged messages");
    Ok(Json(ClearedResponse { removed }))
}

// ── Uploads ──────────────────────────────────────────────────────────────────

/// The `file` part of a multipart upload.
struct Upload {
    file_name: String,
    content_type: Option<String>,
    bytes: Bytes,
}

async fn read_file_field(mut multipart: Multipart) -> Result<Upload, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field
            .file_name()
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .ok_or_else(|| AppError::Validation("The 'file' part has no file name".to_string()))?;
        let content_type = field.content_type().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("Could not read upload: {e}")))?;
        return Ok(Upload {
            file_name,
            content_type,
            bytes,
        });
    }
    Err(AppError::Validation(
        "Multipart field 'file' is required".to_string(),
    ))
}

/// Runs text extraction on the blocking pool.
async fn extract_upload(upload: &Upload) -> Result<ExtractedText, AppError> {
    let file_name = upload.file_name.clone();
    let bytes = upload.bytes.clone();
    let extracted = tokio::task::spawn_blocking(move || extract_text(&file_name, &bytes))
        .await
        .context("Text extraction task failed")??;
    Ok(extracted)
}

#[derive(Serialize)]
pub struct IndexedUpload {
    pub file_name: String,
    pub word_count: usize,
    pub chunks: usize,
}

/// POST /api/v1/admin/resume (multipart `file`)
///
/// Stores the file and its text in the shared document and replaces the résumé chunks.
pub async fn handle_upload_resume(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<IndexedUpload>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let upload = read_file_field(multipart).await?;
    let extracted = extract_upload(&upload).await?;

    let resume = ResumeBlob {
        file: Blob::from_bytes(&upload.file_name, extracted.kind.content_type(), &upload.bytes),
        text: extracted.text,
        uploaded_at: Utc::now(),
    };
    state.store.set_resume(resume.clone()).await?;
    let chunks = index_resume(&mut *state.knowledge.write().await, &resume);

    info!(
        "Résumé {} uploaded: {} words, {chunks} chunks",
        upload.file_name, extracted.word_count
    );
    Ok(Json(IndexedUpload {
        file_name: upload.file_name,
        word_count: extracted.word_count,
        chunks,
    }))
}

/// POST /api/v1/admin/documents (multipart `file`)
pub async fn handle_upload_document(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<IndexedUpload>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let upload = read_file_field(multipart).await?;
    let extracted = extract_upload(&upload).await?;

    let chunks = state.knowledge.write().await.replace_origin(
        ChunkSource::Document,
        &upload.file_name,
        &extracted.text,
    );

    info!(
        "Document {} indexed: {} words, {chunks} chunks",
        upload.file_name, extracted.word_count
    );
    Ok(Json(IndexedUpload {
        file_name: upload.file_name,
        word_count: extracted.word_count,
        chunks,
    }))
}

/// POST /api/v1/admin/avatar (multipart `file`, images only)
pub async fn handle_upload_avatar(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<StatusCode, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let upload = read_file_field(multipart).await?;

    let content_type = upload
        .content_type
        .as_deref()
        .filter(|ct| AVATAR_TYPES.contains(ct))
        .ok_or_else(|| {
            AppError::Validation(format!(
                "Avatar must be one of {}",
                AVATAR_TYPES.join(", ")
            ))
        })?;
    if upload.bytes.len() > MAX_AVATAR_BYTES {
        return Err(AppError::PayloadTooLarge(format!(
            "Avatar is {} bytes, limit is {MAX_AVATAR_BYTES} bytes",
            upload.bytes.len()
        )));
    }

    state
        .store
        .set_avatar(Blob::from_bytes(&upload.file_name, content_type, &upload.bytes))
        .await?;
    info!("Avatar {} uploaded ({} bytes)", upload.file_name, upload.bytes.len());
    Ok(StatusCode::NO_CONTENT)
}

// ── Knowledge ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct CrawlRequest {
    pub url: String,
    pub max_pages: Option<usize>,
}

#[derive(Serialize)]
pub struct CrawlResponse {
    pub pages: usize,
    pub chunks: usize,
    pub urls: Vec<String>,
}

/// POST /api/v1/admin/knowledge/crawl
pub async fn handle_crawl(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<CrawlRequest>,
) -> Result<Json<CrawlResponse>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let pages = state
        .crawler
        .crawl(&req.url, req.max_pages.unwrap_or(DEFAULT_MAX_PAGES))
        .await?;

    let mut kb = state.knowledge.write().await;
    let chunks: usize = pages
        .iter()
        .map(|page| kb.replace_origin(ChunkSource::Website, &page.url, &page.text))
        .sum();
    drop(kb);

    Ok(Json(CrawlResponse {
        pages: pages.len(),
        chunks,
        urls: pages.into_iter().map(|p| p.url).collect(),
    }))
}

/// GET /api/v1/admin/knowledge
pub async fn handle_knowledge_stats(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<KnowledgeStats>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    Ok(Json(state.knowledge.read().await.stats()))
}

#[derive(Serialize)]
pub struct KnowledgeCleared {
    pub removed: usize,
    pub reindexed: usize,
}

/// DELETE /api/v1/admin/knowledge
///
/// Drops every chunk, then re-indexes the profile and the stored résumé.
pub async fn handle_clear_knowledge(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<KnowledgeCleared>, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let resume = match state.store.read().await {
        Ok(doc) => doc.resume,
        Err(e) => {
            warn!("Could not load stored résumé for re-indexing: {e}");
            None
        }
    };

    let mut kb = state.knowledge.write().await;
    let removed = kb.len();
    kb.clear();
    let mut reindexed = index_profile(&mut kb, &state.profile);
    if let Some(resume) = &resume {
        reindexed += index_resume(&mut kb, resume);
    }
    drop(kb);

    info!("Cleared {removed} knowledge chunks, re-indexed {reindexed}");
    Ok(Json(KnowledgeCleared { removed, reindexed }))
}

// ── Exports ──────────────────────────────────────────────────────────────────

fn export_name(stem: &str, ext: &str) -> String {
    format!("chatfolio_{stem}_{}.{ext}", Utc::now().format("%Y%m%d"))
}

/// GET /api/v1/admin/export/users.csv
pub async fn handle_export_users(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let doc = state.store.read().await?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        &export_name("users", "csv"),
        users_csv(&doc)?,
    ))
}

/// GET /api/v1/admin/export/conversations.csv
pub async fn handle_export_conversations(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let doc = state.store.read().await?;
    Ok(attachment(
        "text/csv; charset=utf-8",
        &export_name("conversations", "csv"),
        conversations_csv(&doc)?,
    ))
}

/// GET /api/v1/admin/export/document.json
pub async fn handle_export_document(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    require_admin(&headers, &state.config.admin_password)?;
    let doc = state.store.read().await?;
    Ok(attachment(
        "application/json",
        &export_name("document", "json"),
        document_json(&doc)?,
    ))
}
