use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::llm_client::{DEFAULT_API_URL, DEFAULT_MODEL};
use crate::store::gist::DEFAULT_GIST_FILENAME;

/// Application configuration loaded from environment variables.
/// Startup fails if a required variable is missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub admin_password: String,
    pub llm_api_key: Option<String>,
    pub llm_api_url: String,
    pub llm_model: String,
    pub gist: Option<GistConfig>,
    pub profile_path: Option<PathBuf>,
    pub knowledge_dir: Option<PathBuf>,
    pub chunk_size: usize,
    pub chunk_overlap: usize,
    pub session_ttl_minutes: i64,
    pub port: u16,
    pub rust_log: String,
}

/// Remote shared-document location. Only built when both id and token are set.
#[derive(Debug, Clone)]
pub struct GistConfig {
    pub gist_id: String,
    pub token: String,
    pub filename: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        let gist = match (optional_env("GIST_ID"), optional_env("GITHUB_TOKEN")) {
            (Some(gist_id), Some(token)) => Some(GistConfig {
                gist_id,
                token,
                filename: optional_env("GIST_FILENAME")
                    .unwrap_or_else(|| DEFAULT_GIST_FILENAME.to_string()),
            }),
            _ => None,
        };

        Ok(Config {
            admin_password: require_env("ADMIN_PASSWORD")?,
            llm_api_key: optional_env("LLM_API_KEY"),
            llm_api_url: optional_env("LLM_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            llm_model: optional_env("LLM_MODEL").unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            gist,
            profile_path: optional_env("PROFILE_PATH").map(PathBuf::from),
            knowledge_dir: optional_env("KNOWLEDGE_DIR").map(PathBuf::from),
            chunk_size: parse_env("CHUNK_SIZE", 200)?,
            chunk_overlap: parse_env("CHUNK_OVERLAP", 40)?,
            session_ttl_minutes: parse_env("SESSION_TTL_MINUTES", 120)?,
            port: parse_env("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

/// Returns `None` for unset and blank variables alike.
fn optional_env(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_env<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_env(key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("{key} must be a valid number, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    /// Config for router tests: in-memory store, LLM disabled.
    pub fn for_tests() -> Self {
        Config {
            admin_password: "letmein".to_string(),
            llm_api_key: None,
            llm_api_url: DEFAULT_API_URL.to_string(),
            llm_model: DEFAULT_MODEL.to_string(),
            gist: None,
            profile_path: None,
            knowledge_dir: None,
            chunk_size: 200,
            chunk_overlap: 40,
            session_ttl_minutes: 120,
            port: 0,
            rust_log: "info".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_env_uses_default_when_unset() {
        let value: usize = parse_env("CHATFOLIO_TEST_UNSET_VAR", 42).unwrap();
        assert_eq!(value, 42);
    }

    #[test]
    fn test_parse_env_rejects_garbage() {
        std::env::set_var("CHATFOLIO_TEST_BAD_NUMBER", "twelve");
        let err = parse_env::<u16>("CHATFOLIO_TEST_BAD_NUMBER", 8080).unwrap_err();
        assert!(err.to_string().contains("CHATFOLIO_TEST_BAD_NUMBER"));
    }

    #[test]
    fn test_blank_optional_env_is_none() {
        std::env::set_var("CHATFOLIO_TEST_BLANK", "   ");
        assert!(optional_env("CHATFOLIO_TEST_BLANK").is_none());
    }
}
