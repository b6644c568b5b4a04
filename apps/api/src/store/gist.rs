use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, info};

use super::{DocumentBackend, SharedDocument, StoreError};
use crate::config::GistConfig;

const GITHUB_API_URL: &str = "https://api.github.com";
const GITHUB_API_VERSION: &str = "2022-11-28";
pub const DEFAULT_GIST_FILENAME: &str = "chatfolio_db.json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(20);

#[derive(Debug, Deserialize)]
struct GistResponse {
    #[serde(default)]
    files: HashMap<String, GistFile>,
}

#[derive(Debug, Deserialize)]
struct GistFile {
    #[serde(default)]
    content: Option<String>,
    #[serde(default)]
    truncated: bool,
    #[serde(default)]
    raw_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GithubError {
    message: String,
}

/// Where a gist file's content can be read from.
#[derive(Debug, PartialEq)]
enum FileContent {
    Missing,
    Inline(String),
    /// Gist responses cut file content at about 1 MB; the full file is at `raw_url`.
    Raw(String),
}

fn locate_content(mut gist: GistResponse, filename: &str) -> FileContent {
    let Some(file) = gist.files.remove(filename) else {
        return FileContent::Missing;
    };
    match (file.truncated, file.raw_url, file.content) {
        (true, Some(raw_url), _) => FileContent::Raw(raw_url),
        (_, _, Some(content)) => FileContent::Inline(content),
        _ => FileContent::Missing,
    }
}

/// Stores the shared document as one file of a GitHub gist.
pub struct GistBackend {
    client: Client,
    gist_url: String,
    token: String,
    filename: String,
}

impl GistBackend {
    pub fn new(config: &GistConfig) -> Result<Self, StoreError> {
        Ok(Self {
            client: Client::builder()
                .user_agent(concat!("chatfolio/", env!("CARGO_PKG_VERSION")))
                .timeout(REQUEST_TIMEOUT)
                .build()?,
            gist_url: format!("{GITHUB_API_URL}/gists/{}", config.gist_id),
            token: config.token.clone(),
            filename: config.filename.clone(),
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.token)
            .header("Accept", "application/vnd.github+json")
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, StoreError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<GithubError>(&body)
            .map(|e| e.message)
            .unwrap_or(body);
        Err(StoreError::Api {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl DocumentBackend for GistBackend {
    fn name(&self) -> &'static str {
        "gist"
    }

    async fn load(&self) -> Result<SharedDocument, StoreError> {
        let response = self.authorized(self.client.get(&self.gist_url)).send().await?;
        let gist: GistResponse = Self::check(response).await?.json().await?;

        let content = match locate_content(gist, &self.filename) {
            FileContent::Missing => {
                info!("Gist has no '{}' yet; starting from an empty document", self.filename);
                return Ok(SharedDocument::default());
            }
            FileContent::Inline(content) => content,
            FileContent::Raw(raw_url) => {
                debug!("Gist file is truncated, fetching {raw_url}");
                let response = self.authorized(self.client.get(&raw_url)).send().await?;
                Self::check(response).await?.text().await?
            }
        };

        SharedDocument::parse(&content).map_err(StoreError::Corrupt)
    }

    async fn save(&self, document: &SharedDocument) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(document)?;
        let body = json!({ "files": { &self.filename: { "content": content } } });

        let response = self
            .authorized(self.client.patch(&self.gist_url))
            .json(&body)
            .send()
            .await?;
        Self::check(response).await?;

        debug!("Saved shared document to gist ({} bytes)", content.len());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gist(raw: &str) -> GistResponse {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn test_inline_content_is_used() {
        let response = gist(r#"{"files": {"chatfolio_db.json": {"content": "{}", "truncated": false}}}"#);
        assert_eq!(
            locate_content(response, "chatfolio_db.json"),
            FileContent::Inline("{}".to_string())
        );
    }

    #[test]
    fn test_truncated_file_points_at_raw_url() {
        let response = gist(
            r#"{"files": {"db.json": {"content": "{\"us", "truncated": true, "raw_url": "https://gist.githubusercontent.com/raw/db.json"}}}"#,
        );
        assert_eq!(
            locate_content(response, "db.json"),
            FileContent::Raw("https://gist.githubusercontent.com/raw/db.json".to_string())
        );
    }

    #[test]
    fn test_other_files_are_ignored() {
        let response = gist(r#"{"files": {"notes.md": {"content": "hello"}}}"#);
        assert_eq!(locate_content(response, "db.json"), FileContent::Missing);
        assert_eq!(locate_content(gist("{}"), "db.json"), FileContent::Missing);
    }

    #[test]
    fn test_backend_targets_gist_url() {
        let backend = GistBackend::new(&GistConfig {
            gist_id: "abc123".to_string(),
            token: "t".to_string(),
            filename: DEFAULT_GIST_FILENAME.to_string(),
        })
        .unwrap();
        assert_eq!(backend.gist_url, "https://api.github.com/gists/abc123");
        assert_eq!(backend.name(), "gist");
    }
}
