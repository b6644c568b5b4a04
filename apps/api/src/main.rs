mod admin;
mod chat;
mod config;
mod errors;
mod extraction;
mod fetcher;
mod intent;
mod knowledge;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::fetcher::SiteCrawler;
use crate::knowledge::loader::{index_directory, index_profile, index_resume};
use crate::llm_client::LlmClient;
use crate::models::profile::Profile;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::gist::GistBackend;
use crate::store::memory::MemoryBackend;
use crate::store::{DocumentBackend, SharedStore};

const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(10 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Chatfolio v{}", env!("CARGO_PKG_VERSION"));

    let profile = Profile::load(config.profile_path.as_deref())?;
    info!("Profile loaded for {}", profile.name);

    // Shared document: gist when configured, otherwise process memory
    let backend: Arc<dyn DocumentBackend> = match &config.gist {
        Some(gist) => {
            info!("Shared document stored in gist {} ({})", gist.gist_id, gist.filename);
            Arc::new(GistBackend::new(gist)?)
        }
        None => {
            warn!("GIST_ID/GITHUB_TOKEN not set; visitors and uploads are kept in memory only");
            Arc::new(MemoryBackend::default())
        }
    };
    let store = SharedStore::new(backend);

    let llm = LlmClient::new(
        config.llm_api_key.clone(),
        config.llm_api_url.clone(),
        config.llm_model.clone(),
    )?;
    if llm.is_enabled() {
        info!("LLM client initialized (model: {})", llm.model());
    } else {
        warn!("LLM_API_KEY not set; answers fall back to retrieved excerpts");
    }

    let state = AppState::new(config.clone(), profile, llm, store, SiteCrawler::new()?);
    build_knowledge(&state).await;
    spawn_session_sweeper(&state);

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Drops idle chat sessions even when no new sessions are being created.
fn spawn_session_sweeper(state: &AppState) {
    let sessions = state.sessions.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let purged = sessions.purge_expired(chrono::Utc::now()).await;
            if purged > 0 {
                debug!("Swept {purged} idle chat sessions");
            }
        }
    });
}

/// Indexes the profile, the stored résumé and every file in KNOWLEDGE_DIR.
/// Failures are logged; the service starts with whatever was indexed.
async fn build_knowledge(state: &AppState) {
    let resume = match state.store.read().await {
        Ok(doc) => doc.resume,
        Err(e) => {
            warn!("Could not load shared document at startup: {e}");
            None
        }
    };

    let mut kb = state.knowledge.write().await;
    index_profile(&mut kb, &state.profile);
    if let Some(resume) = &resume {
        let chunks = index_resume(&mut kb, resume);
        info!("Indexed stored résumé {} ({chunks} chunks)", resume.file.file_name);
    }
    if let Some(dir) = &state.config.knowledge_dir {
        match index_directory(&mut kb, dir) {
            Ok(files) => info!("Indexed {files} files from {}", dir.display()),
            Err(e) => warn!("{e:#}"),
        }
    }
    info!("Knowledge base ready: {} chunks", kb.len());
}
