// Intent-specific prompt text, lead-ins and fallbacks for the chat responder.

use crate::intent::Intent;

/// Extra instruction appended to the system prompt for the detected intent.
pub fn intent_instruction(intent: Intent) -> &'static str {
    match intent {
        Intent::Skills => {
            "The visitor asks about skills. Group technical skills by area and mention \
             where each was used when the context says so."
        }
        Intent::Experience => {
            "The visitor asks about work experience. Summarize roles most recent first \
             with company, title and one concrete highlight each."
        }
        Intent::Education => {
            "The visitor asks about education. List degrees, institutions and years \
             exactly as given."
        }
        Intent::Projects => {
            "The visitor asks about projects. Pick the most relevant projects and say \
             what was built, with which technologies, and the outcome."
        }
        Intent::Certifications => {
            "The visitor asks about certifications. List only certifications that \
             appear in the context, with issuer and year when known."
        }
        Intent::Achievements => {
            "The visitor asks about achievements. Highlight awards, publications and \
             measurable results that appear in the context."
        }
        Intent::Hiring => {
            "The visitor may be a recruiter. State availability and preferred roles if \
             known and invite them to leave their email or use the contact details."
        }
        Intent::Location => {
            "The visitor asks where the person is based. Answer with the location and \
             remote/relocation preferences if known."
        }
        Intent::Hobbies => {
            "The visitor asks about interests outside work. Keep it light and brief."
        }
        Intent::About => {
            "The visitor wants an overview. Give a short introduction: current role, \
             focus areas and what the person is known for."
        }
        Intent::Greeting
        | Intent::Farewell
        | Intent::Thanks
        | Intent::Contact
        | Intent::Resume
        | Intent::General => {
            "Answer the visitor's question as helpfully as the context allows."
        }
    }
}

/// Opening sentence of a retrieval-only reply.
pub fn fallback_lead_in(intent: Intent, owner: &str) -> String {
    match intent {
        Intent::Skills => format!("Here's what I found about {owner}'s skills:"),
        Intent::Experience => format!("Here's some of {owner}'s experience:"),
        Intent::Education => format!("Here's what I know about {owner}'s education:"),
        Intent::Projects => format!("Here's one of {owner}'s projects:"),
        Intent::Certifications => format!("Here's what I found about {owner}'s certifications:"),
        Intent::Achievements => format!("Here's a highlight from {owner}'s record:"),
        _ => format!("Here's what I found about {owner}:"),
    }
}

/// Used when the LLM is unavailable and nothing relevant was retrieved.
pub const NO_ANSWER_FALLBACK: &str = "I don't have details on that right now.";
