use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One question/answer exchange, as logged in the shared document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationEntry {
    #[serde(default = "Utc::now")]
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub user_message: String,
    #[serde(default)]
    pub bot_reply: String,
    #[serde(default = "general_intent")]
    pub intent: String,
}

fn general_intent() -> String {
    "general".to_string()
}
