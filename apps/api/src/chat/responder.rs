//! Response generator: canned answers, or retrieval + LLM with retrieval-only fallback.
//!
//! Flow: classify → canned? → search knowledge → build prompt → LLM (one attempt)
//!       → on failure, excerpt of the best chunk or a profile-based fallback.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::chat::prompts::{fallback_lead_in, intent_instruction, NO_ANSWER_FALLBACK};
use crate::chat::session::Exchange;
use crate::intent::{classify, Intent};
use crate::knowledge::{KnowledgeBase, SearchHit};
use crate::llm_client::prompts::{ASSISTANT_PERSONA, GROUNDING_INSTRUCTION, STYLE_INSTRUCTION};
use crate::llm_client::{ChatMessage, LlmClient};
use crate::models::profile::Profile;

/// Chunks retrieved per question.
const TOP_K: usize = 3;
/// Words of the best chunk quoted in a fallback reply.
const EXCERPT_WORDS: usize = 60;
pub const RESUME_DOWNLOAD_PATH: &str = "/api/v1/resume";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReplySource {
    Canned,
    Llm,
    Fallback,
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub text: String,
    pub intent: Intent,
    pub source: ReplySource,
    /// Origins (file names / URLs) of the chunks the reply drew on.
    pub references: Vec<String>,
}

/// Per-message inputs the responder cannot know on its own.
pub struct ReplyContext<'a> {
    pub message: &'a str,
    pub visitor_name: Option<&'a str>,
    pub history: &'a [Exchange],
    pub has_resume: bool,
}

#[derive(Clone)]
pub struct Responder {
    llm: LlmClient,
    profile: Arc<Profile>,
    knowledge: Arc<RwLock<KnowledgeBase>>,
}

impl Responder {
    pub fn new(llm: LlmClient, profile: Arc<Profile>, knowledge: Arc<RwLock<KnowledgeBase>>) -> Self {
        Self {
            llm,
            profile,
            knowledge,
        }
    }

    pub fn llm_enabled(&self) -> bool {
        self.llm.is_enabled()
    }

    pub async fn respond(&self, ctx: ReplyContext<'_>) -> Reply {
        let intent = classify(ctx.message);

        if intent.is_canned() {
            return Reply {
                text: canned_reply(intent, &self.profile, ctx.visitor_name, ctx.has_resume),
                intent,
                source: ReplySource::Canned,
                references: Vec::new(),
            };
        }

        // Clone the hits so the read lock is released before the LLM call.
        let hits = self.knowledge.read().await.search(ctx.message, TOP_K);
        let references = unique_origins(&hits);

        if self.llm.is_enabled() {
            let system = build_system_prompt(&self.profile, intent, &hits, ctx.visitor_name);
            let messages = build_messages(ctx.history, ctx.message);
            match self.llm.chat(&system, &messages).await {
                Ok(text) => {
                    info!(
                        "Answered {} question via {} ({} chunks)",
                        intent.label(),
                        self.llm.model(),
                        hits.len()
                    );
                    return Reply {
                        text,
                        intent,
                        source: ReplySource::Llm,
                        references,
                    };
                }
                Err(e) => warn!("LLM call failed, using fallback: {e}"),
            }
        }

        Reply {
            text: fallback_reply(intent, &self.profile, &hits),
            intent,
            source: ReplySource::Fallback,
            references,
        }
    }
}

fn unique_origins(hits: &[SearchHit]) -> Vec<String> {
    let mut origins: Vec<String> = Vec::new();
    for hit in hits {
        if !origins.contains(&hit.origin) {
            origins.push(hit.origin.clone());
        }
    }
    origins
}

fn greeting_suffix(visitor_name: Option<&str>) -> String {
    visitor_name.map(|n| format!(", {n}")).unwrap_or_default()
}

pub fn canned_reply(
    intent: Intent,
    profile: &Profile,
    visitor_name: Option<&str>,
    has_resume: bool,
) -> String {
    let owner = profile.first_name();
    let suffix = greeting_suffix(visitor_name);

    match intent {
        Intent::Greeting => format!(
            "Hello{suffix}! Ask me anything about {owner}'s skills, experience, projects or education."
        ),
        Intent::Thanks => {
            format!("You're welcome{suffix}! Anything else you'd like to know about {owner}?")
        }
        Intent::Farewell => {
            format!("Thanks for stopping by{suffix}! Feel free to come back any time.")
        }
        Intent::Contact => {
            let channels = profile.contact_channels();
            if channels.is_empty() {
                format!(
                    "{owner} hasn't listed contact details here, but since you shared your details in this chat, {owner} can follow up with you."
                )
            } else {
                let lines: Vec<String> = channels
                    .iter()
                    .map(|(label, value)| format!("- {label}: {value}"))
                    .collect();
                format!("You can reach {owner} via:\n{}", lines.join("\n"))
            }
        }
        Intent::Resume => {
            if has_resume {
                format!("You can download {owner}'s résumé here: {RESUME_DOWNLOAD_PATH}")
            } else {
                format!(
                    "A résumé hasn't been uploaded yet, but I can answer questions about {owner}'s experience, skills and education."
                )
            }
        }
        _ => NO_ANSWER_FALLBACK.to_string(),
    }
}

pub fn build_system_prompt(
    profile: &Profile,
    intent: Intent,
    hits: &[SearchHit],
    visitor_name: Option<&str>,
) -> String {
    let mut prompt = [ASSISTANT_PERSONA, GROUNDING_INSTRUCTION, STYLE_INSTRUCTION]
        .map(|part| part.replace("{name}", &profile.name))
        .join("\n\n");

    if let Some(visitor) = visitor_name {
        prompt.push_str(&format!("\n\nYou are talking with a visitor named {visitor}."));
    }

    prompt.push_str("\n\nINSTRUCTION: ");
    prompt.push_str(intent_instruction(intent));

    prompt.push_str("\n\nPROFILE FACTS:\n");
    prompt.push_str(&profile.facts());

    prompt.push_str("\n\nRETRIEVED CONTEXT:\n");
    if hits.is_empty() {
        prompt.push_str("(none)");
    } else {
        let blocks: Vec<String> = hits
            .iter()
            .enumerate()
            .map(|(i, hit)| {
                format!("[{}] ({}: {})\n{}", i + 1, hit.source.label(), hit.origin, hit.text)
            })
            .collect();
        prompt.push_str(&blocks.join("\n\n"));
    }

    prompt
}

pub fn build_messages(history: &[Exchange], message: &str) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(history.len() * 2 + 1);
    for exchange in history {
        messages.push(ChatMessage::user(exchange.question.as_str()));
        messages.push(ChatMessage::assistant(exchange.answer.as_str()));
    }
    messages.push(ChatMessage::user(message));
    messages
}

/// Retrieval-only reply: lead-in plus an excerpt of the best chunk, or a profile fact.
pub fn fallback_reply(intent: Intent, profile: &Profile, hits: &[SearchHit]) -> String {
    let owner = profile.first_name();

    if let Some(best) = hits.first() {
        return format!("{}\n\n{}", fallback_lead_in(intent, owner), excerpt(&best.text));
    }

    let from_profile = match intent {
        Intent::Skills if !profile.skills.is_empty() => Some(format!(
            "{owner}'s core skills include: {}.",
            profile.skills.join(", ")
        )),
        Intent::Location => profile
            .location
            .as_ref()
            .map(|l| format!("{owner} is based in {l}.")),
        Intent::Hiring => profile
            .availability
            .as_ref()
            .map(|a| format!("{owner}'s current availability: {a}.")),
        Intent::Hobbies if !profile.hobbies.is_empty() => Some(format!(
            "Outside work, {owner} enjoys {}.",
            profile.hobbies.join(", ")
        )),
        Intent::About if !profile.summary.is_empty() => Some(profile.summary.clone()),
        _ => None,
    };

    from_profile.unwrap_or_else(|| match profile.email.as_deref() {
        Some(email) => format!("{NO_ANSWER_FALLBACK} You can ask {owner} directly at {email}."),
        None => NO_ANSWER_FALLBACK.to_string(),
    })
}

fn excerpt(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    if words.len() <= EXCERPT_WORDS {
        words.join(" ")
    } else {
        format!("{}…", words[..EXCERPT_WORDS].join(" "))
    }
}
