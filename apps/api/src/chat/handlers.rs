use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use crate::chat::conversation::{ChatState, Step};
use crate::chat::responder::{ReplyContext, ReplySource};
use crate::chat::session::{Exchange, Speaker, Turn};
use crate::errors::AppError;
use crate::intent::Intent;
use crate::knowledge::ChunkSource;
use crate::models::conversation::ConversationEntry;
use crate::state::AppState;

pub const MAX_MESSAGE_CHARS: usize = 2000;

#[derive(Serialize)]
pub struct SessionCreated {
    pub session_id: Uuid,
    pub reply: String,
    pub state: ChatState,
}

#[derive(Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

#[derive(Serialize)]
pub struct MessageResponse {
    pub reply: String,
    pub state: ChatState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub intent: Option<Intent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<ReplySource>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<String>,
}

#[derive(Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub state: ChatState,
    pub visitor_name: Option<String>,
    pub visitor_email: Option<String>,
    pub registered: bool,
    pub created_at: DateTime<Utc>,
    pub transcript: Vec<Turn>,
}

fn session_not_found(id: Uuid) -> AppError {
    AppError::NotFound(format!("Chat session {id} not found or expired"))
}

/// POST /api/v1/chat/sessions
pub async fn handle_create_session(
    State(state): State<AppState>,
) -> (StatusCode, Json<SessionCreated>) {
    let (session_id, reply) = state.sessions.create(state.profile.first_name()).await;
    info!("Opened chat session {session_id}");
    (
        StatusCode::CREATED,
        Json(SessionCreated {
            session_id,
            reply,
            state: ChatState::AwaitingName,
        }),
    )
}

/// GET /api/v1/chat/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionView>, AppError> {
    let session = state
        .sessions
        .snapshot(id)
        .await
        .ok_or_else(|| session_not_found(id))?;

    Ok(Json(SessionView {
        session_id: session.id,
        state: session.conversation.state(),
        visitor_name: session.conversation.visitor_name().map(str::to_string),
        visitor_email: session.conversation.visitor_email().map(str::to_string),
        registered: session.user_id.is_some(),
        created_at: session.created_at,
        transcript: session.transcript,
    }))
}

/// POST /api/v1/chat/sessions/:id/messages
pub async fn handle_post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let length = req.text.chars().count();
    if length > MAX_MESSAGE_CHARS {
        return Err(AppError::Validation(format!(
            "Message is {length} characters, limit is {MAX_MESSAGE_CHARS}"
        )));
    }

    let (step, visitor_name, history, user_id) = state
        .sessions
        .with_session(id, |s| {
            s.push(Speaker::Visitor, &req.text);
            let step = s.conversation.handle(&req.text);
            (
                step,
                s.conversation.visitor_name().map(str::to_string),
                s.recent_exchanges(),
                s.user_id,
            )
        })
        .await
        .ok_or_else(|| session_not_found(id))?;

    let mut response = MessageResponse {
        reply: String::new(),
        state: ChatState::AwaitingName,
        intent: None,
        source: None,
        references: Vec::new(),
    };

    match step {
        Step::Prompt(text) => {
            response.reply = text;
        }
        Step::Registered { name, email, reply } => {
            // Registration failures leave the session anonymous.
            let registered = match state.store.register_user(name, email).await {
                Ok(user) => Some(user.id),
                Err(e) => {
                    warn!("Could not persist visitor for session {id}: {e}");
                    None
                }
            };
            state
                .sessions
                .with_session(id, |s| s.user_id = registered)
                .await;
            response.reply = reply;
        }
        Step::Chat(message) => {
            let has_resume = state.knowledge.read().await.has_source(ChunkSource::Resume);
            let reply = state
                .responder
                .respond(ReplyContext {
                    message: &message,
                    visitor_name: visitor_name.as_deref(),
                    history: &history,
                    has_resume,
                })
                .await;

            state
                .sessions
                .with_session(id, |s| {
                    s.exchanges.push(Exchange {
                        question: message.clone(),
                        answer: reply.text.clone(),
                    })
                })
                .await;

            if let Some(user_id) = user_id {
                let entry = ConversationEntry {
                    at: Utc::now(),
                    user_message: message,
                    bot_reply: reply.text.clone(),
                    intent: reply.intent.label().to_string(),
                };
                match state.store.append_conversation(user_id, entry).await {
                    Ok(true) => {}
                    Ok(false) => {
                        info!("Visitor {user_id} was deleted; session {id} continues unlogged");
                        state.sessions.with_session(id, |s| s.user_id = None).await;
                    }
                    Err(e) => warn!("Could not log exchange for visitor {user_id}: {e}"),
                }
            }

            response.reply = reply.text;
            response.intent = Some(reply.intent);
            response.source = Some(reply.source);
            response.references = reply.references;
        }
    }

    response.state = state
        .sessions
        .with_session(id, |s| {
            s.push(Speaker::Assistant, &response.reply);
            s.conversation.state()
        })
        .await
        .ok_or_else(|| session_not_found(id))?;

    Ok(Json(response))
}
