use anyhow::{Context, Result};
use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::store::SharedDocument;

/// Builds a `Content-Disposition` value. Quotes, backslashes, control and
/// non-ASCII characters in `file_name` become `_`.
pub fn content_disposition(kind: &str, file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .map(|c| match c {
            '"' | '\\' => '_',
            c if c.is_ascii_graphic() || c == ' ' => c,
            _ => '_',
        })
        .collect();
    let safe = if safe.trim().is_empty() { "download" } else { safe.trim() };
    format!("{kind}; filename=\"{safe}\"")
}

/// Wraps `body` as a file download.
pub fn attachment(content_type: &'static str, file_name: &str, body: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (
                header::CONTENT_DISPOSITION,
                content_disposition("attachment", file_name),
            ),
        ],
        body,
    )
        .into_response()
}

fn finish(writer: csv::Writer<Vec<u8>>) -> Result<Vec<u8>> {
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("Failed to flush CSV")
}

/// One row per visitor, oldest first.
pub fn users_csv(doc: &SharedDocument) -> Result<Vec<u8>> {
    let mut users: Vec<_> = doc.users.values().collect();
    users.sort_by_key(|u| u.created_at);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["id", "name", "email", "created_at", "last_active", "messages"])?;
    for user in users {
        let messages = doc.conversations.get(&user.id).map_or(0, Vec::len);
        writer.write_record([
            user.id.to_string(),
            user.name.clone(),
            user.email.clone().unwrap_or_default(),
            user.created_at.to_rfc3339(),
            user.last_active.to_rfc3339(),
            messages.to_string(),
        ])?;
    }
    finish(writer)
}

/// One row per logged exchange, in chronological order.
pub fn conversations_csv(doc: &SharedDocument) -> Result<Vec<u8>> {
    let mut rows: Vec<_> = doc
        .conversations
        .iter()
        .flat_map(|(user_id, entries)| entries.iter().map(move |e| (user_id, e)))
        .collect();
    rows.sort_by_key(|(_, e)| e.at);

    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(["user_id", "user_name", "at", "intent", "user_message", "bot_reply"])?;
    for (user_id, entry) in rows {
        let name = doc
            .users
            .get(user_id)
            .map(|u| u.name.as_str())
            .unwrap_or("(deleted)");
        writer.write_record([
            user_id.to_string().as_str(),
            name,
            entry.at.to_rfc3339().as_str(),
            entry.intent.as_str(),
            entry.user_message.as_str(),
            entry.bot_reply.as_str(),
        ])?;
    }
    finish(writer)
}

pub fn document_json(doc: &SharedDocument) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(doc).context("Failed to serialize shared document")
}
