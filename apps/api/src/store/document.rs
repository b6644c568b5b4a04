use std::collections::BTreeMap;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::models::conversation::ConversationEntry;
use crate::models::user::UserRecord;

/// The whole shared database: one JSON document, read and rewritten wholesale.
///
/// Every field defaults when missing so older or hand-edited documents still load.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedDocument {
    #[serde(default)]
    pub users: BTreeMap<Uuid, UserRecord>,
    #[serde(default)]
    pub conversations: BTreeMap<Uuid, Vec<ConversationEntry>>,
    #[serde(default)]
    pub avatar: Option<Blob>,
    #[serde(default)]
    pub resume: Option<ResumeBlob>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl SharedDocument {
    /// Parses stored content. Blank content is an empty document.
    ///
    /// Only content that is not a JSON object is an error. Users, log entries
    /// and blobs are read one by one: a record that still fails after field
    /// defaults is skipped with a warning and the rest of the document loads.
    pub fn parse(content: &str) -> Result<Self, serde_json::Error> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let stored: StoredDocument = serde_json::from_str(content)?;

        let mut document = Self {
            avatar: stored.avatar.and_then(|v| lenient("avatar", v)),
            resume: stored.resume.and_then(|v| lenient("résumé", v)),
            updated_at: stored.updated_at.and_then(|v| lenient("updated_at", v)),
            ..Self::default()
        };

        for (key, value) in stored.users {
            let Some(id) = record_id("user", &key) else {
                continue;
            };
            if let Some(mut user) = lenient::<UserRecord>(&format!("user {key}"), value) {
                user.id = id;
                document.users.insert(id, user);
            }
        }

        for (key, value) in stored.conversations {
            let Some(id) = record_id("conversation log", &key) else {
                continue;
            };
            let Value::Array(entries) = value else {
                warn!("Skipping conversation log {key} in shared document: not a list");
                continue;
            };
            let what = format!("log entry for {key}");
            let entries: Vec<ConversationEntry> =
                entries.into_iter().filter_map(|v| lenient(&what, v)).collect();
            document.conversations.insert(id, entries);
        }

        Ok(document)
    }

    pub fn message_count(&self) -> usize {
        self.conversations.values().map(Vec::len).sum()
    }
}

/// Top-level shape of the stored JSON, with every record left unparsed.
#[derive(Deserialize)]
struct StoredDocument {
    #[serde(default)]
    users: BTreeMap<String, Value>,
    #[serde(default)]
    conversations: BTreeMap<String, Value>,
    #[serde(default)]
    avatar: Option<Value>,
    #[serde(default)]
    resume: Option<Value>,
    #[serde(default)]
    updated_at: Option<Value>,
}

fn lenient<T: DeserializeOwned>(what: &str, value: Value) -> Option<T> {
    serde_json::from_value(value)
        .map_err(|e| warn!("Skipping unreadable {what} in shared document: {e}"))
        .ok()
}

fn record_id(what: &str, key: &str) -> Option<Uuid> {
    Uuid::parse_str(key)
        .map_err(|_| warn!("Skipping {what} with invalid id '{key}' in shared document"))
        .ok()
}

/// A binary file stored inline as base64.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Blob {
    #[serde(default)]
    pub file_name: String,
    #[serde(default = "octet_stream")]
    pub content_type: String,
    #[serde(default)]
    pub data_base64: String,
}

fn octet_stream() -> String {
    "application/octet-stream".to_string()
}

impl Blob {
    pub fn from_bytes(file_name: &str, content_type: &str, bytes: &[u8]) -> Self {
        Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            data_base64: STANDARD.encode(bytes),
        }
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        STANDARD.decode(self.data_base64.as_bytes())
    }
}

/// The uploaded résumé plus its extracted text, re-indexed on every startup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeBlob {
    #[serde(flatten)]
    pub file: Blob,
    #[serde(default)]
    pub text: String,
    #[serde(default = "Utc::now")]
    pub uploaded_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_content_is_default() {
        assert_eq!(SharedDocument::parse("  \n").unwrap(), SharedDocument::default());
    }

    #[test]
    fn test_garbage_content_is_an_error() {
        assert!(SharedDocument::parse("{not json").is_err());
        assert!(SharedDocument::parse("[1, 2]").is_err());
    }

    #[test]
    fn test_incomplete_records_keep_the_rest() {
        let good = Uuid::new_v4();
        let old = Uuid::new_v4();
        let broken = Uuid::new_v4();
        let raw = format!(
            r#"{{
                "users": {{
                    "{good}": {{"id": "{good}", "name": "Sam", "created_at": "2024-05-01T10:00:00Z"}},
                    "{old}": {{"name": "Kim"}},
                    "{broken}": {{"name": 42}},
                    "not-a-uuid": {{"name": "Lee"}}
                }},
                "conversations": {{
                    "{good}": [
                        {{"at": "2024-05-01T10:01:00Z", "user_message": "hi", "bot_reply": "hello"}},
                        {{"user_message": "no timestamp"}},
                        "garbage"
                    ]
                }},
                "resume": {{"file_name": "cv.pdf", "data_base64": "Y3Y=", "text": "cv"}}
            }}"#
        );
        let doc = SharedDocument::parse(&raw).unwrap();

        assert_eq!(doc.users.len(), 2);
        assert_eq!(doc.users[&good].name, "Sam");
        assert_eq!(doc.users[&old].name, "Kim");
        assert_eq!(doc.users[&old].id, old);
        assert_eq!(doc.conversations[&good].len(), 2);
        assert_eq!(doc.conversations[&good][1].user_message, "no timestamp");
        assert_eq!(doc.conversations[&good][1].intent, "general");

        let resume = doc.resume.unwrap();
        assert_eq!(resume.file.content_type, "application/octet-stream");
        assert_eq!(resume.file.decode().unwrap(), b"cv");
    }

    #[test]
    fn test_missing_sections_default() {
        let id = Uuid::new_v4();
        let raw = format!(
            r#"{{"users": {{"{id}": {{"id": "{id}", "name": "Sam", "created_at": "2024-05-01T10:00:00Z"}}}}}}"#
        );
        let doc = SharedDocument::parse(&raw).unwrap();
        assert_eq!(doc.users[&id].name, "Sam");
        assert!(doc.users[&id].email.is_none());
        assert!(doc.conversations.is_empty());
        assert!(doc.resume.is_none());
    }

    #[test]
    fn test_blob_decodes_to_original_bytes() {
        let blob = Blob::from_bytes("me.png", "image/png", &[0x89, b'P', b'N', b'G']);
        assert_eq!(blob.decode().unwrap(), vec![0x89, b'P', b'N', b'G']);
    }

    #[test]
    fn test_resume_blob_is_flat_in_json() {
        let resume = ResumeBlob {
            file: Blob::from_bytes("cv.txt", "text/plain", b"cv"),
            text: "cv".to_string(),
            uploaded_at: Utc::now(),
        };
        let value = serde_json::to_value(&resume).unwrap();
        assert_eq!(value["file_name"], "cv.txt");
        assert_eq!(value["text"], "cv");
    }

    #[test]
    fn test_message_count_sums_all_logs() {
        let mut doc = SharedDocument::default();
        let entry = ConversationEntry {
            at: Utc::now(),
            user_message: "q".to_string(),
            bot_reply: "a".to_string(),
            intent: "general".to_string(),
        };
        doc.conversations.insert(Uuid::new_v4(), vec![entry.clone(), entry.clone()]);
        doc.conversations.insert(Uuid::new_v4(), vec![entry]);
        assert_eq!(doc.message_count(), 3);
    }
}
