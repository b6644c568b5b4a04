use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::debug;
use uuid::Uuid;

use crate::chat::conversation::Conversation;

/// Number of past exchanges passed to the LLM as history.
pub const HISTORY_EXCHANGES: usize = 3;

/// Idle sessions never outlive this, whatever SESSION_TTL_MINUTES says.
pub const MAX_SESSION_TTL_MINUTES: i64 = 30 * 24 * 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Visitor,
    Assistant,
}

#[derive(Debug, Clone, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// One free-chat question and the reply it got.
#[derive(Debug, Clone, PartialEq)]
pub struct Exchange {
    pub question: String,
    pub answer: String,
}

/// Per-visitor memory. Lives only in this process.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub conversation: Conversation,
    /// Set once the visitor has been written to the shared document.
    pub user_id: Option<Uuid>,
    pub transcript: Vec<Turn>,
    pub exchanges: Vec<Exchange>,
    pub created_at: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
}

impl Session {
    pub fn push(&mut self, speaker: Speaker, text: &str) {
        let now = Utc::now();
        self.transcript.push(Turn {
            speaker,
            text: text.to_string(),
            at: now,
        });
        self.last_seen = now;
    }

    /// The most recent exchanges, oldest first.
    pub fn recent_exchanges(&self) -> Vec<Exchange> {
        let skip = self.exchanges.len().saturating_sub(HISTORY_EXCHANGES);
        self.exchanges[skip..].to_vec()
    }
}

pub struct SessionRegistry {
    sessions: Mutex<HashMap<Uuid, Session>>,
    ttl: Duration,
}

impl SessionRegistry {
    pub fn new(ttl_minutes: i64) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            ttl: Duration::minutes(ttl_minutes.clamp(1, MAX_SESSION_TTL_MINUTES)),
        }
    }

    /// Opens a session for `owner_first_name`'s assistant. Expired sessions are purged first.
    pub async fn create(&self, owner_first_name: &str) -> (Uuid, String) {
        let now = Utc::now();
        let (conversation, welcome) = Conversation::start(owner_first_name);
        let mut session = Session {
            id: Uuid::new_v4(),
            conversation,
            user_id: None,
            transcript: Vec::new(),
            exchanges: Vec::new(),
            created_at: now,
            last_seen: now,
        };
        session.push(Speaker::Assistant, &welcome);
        let id = session.id;

        let mut sessions = self.sessions.lock().await;
        let purged = purge(&mut sessions, now, self.ttl);
        if purged > 0 {
            debug!("Purged {purged} idle sessions");
        }
        sessions.insert(id, session);
        (id, welcome)
    }

    /// Runs `f` against the session. `None` if the id is unknown or expired.
    pub async fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut Session) -> T) -> Option<T> {
        let mut sessions = self.sessions.lock().await;
        let session = sessions.get_mut(&id)?;
        if Utc::now() - session.last_seen > self.ttl {
            sessions.remove(&id);
            return None;
        }
        Some(f(session))
    }

    pub async fn snapshot(&self, id: Uuid) -> Option<Session> {
        self.with_session(id, |s| s.clone()).await
    }

    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        purge(&mut *self.sessions.lock().await, now, self.ttl)
    }

    pub async fn active_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

fn purge(sessions: &mut HashMap<Uuid, Session>, now: DateTime<Utc>, ttl: Duration) -> usize {
    let before = sessions.len();
    sessions.retain(|_, s| now - s.last_seen <= ttl);
    before - sessions.len()
}
