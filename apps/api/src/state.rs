use std::sync::Arc;

use tokio::sync::RwLock;

use crate::chat::responder::Responder;
use crate::chat::session::SessionRegistry;
use crate::config::Config;
use crate::fetcher::SiteCrawler;
use crate::knowledge::KnowledgeBase;
use crate::llm_client::LlmClient;
use crate::models::profile::Profile;
use crate::store::SharedStore;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub profile: Arc<Profile>,
    /// Process-local chunks; rebuilt from the profile, stored résumé and KNOWLEDGE_DIR at startup.
    pub knowledge: Arc<RwLock<KnowledgeBase>>,
    pub responder: Responder,
    pub sessions: Arc<SessionRegistry>,
    /// Remote JSON document (gist) or the in-memory fallback.
    pub store: SharedStore,
    pub crawler: SiteCrawler,
}

impl AppState {
    pub fn new(
        config: Config,
        profile: Profile,
        llm: LlmClient,
        store: SharedStore,
        crawler: SiteCrawler,
    ) -> Self {
        let profile = Arc::new(profile);
        let knowledge = Arc::new(RwLock::new(KnowledgeBase::new(
            config.chunk_size,
            config.chunk_overlap,
        )));
        let responder = Responder::new(llm, profile.clone(), knowledge.clone());
        let sessions = Arc::new(SessionRegistry::new(config.session_ttl_minutes));

        Self {
            config,
            profile,
            knowledge,
            responder,
            sessions,
            store,
            crawler,
        }
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory store, LLM disabled, default profile.
    pub fn for_tests() -> Self {
        use crate::store::memory::MemoryBackend;

        Self::new(
            Config::for_tests(),
            Profile::default(),
            LlmClient::disabled(),
            SharedStore::new(Arc::new(MemoryBackend::default())),
            SiteCrawler::new().expect("crawler client"),
        )
    }
}
