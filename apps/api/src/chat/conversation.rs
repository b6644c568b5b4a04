//! Conversation gate: collects the visitor's name and optional e-mail before free chat.
//!
//! ```text
//! AwaitingName ──valid name──▶ AwaitingEmailChoice ──yes──▶ AwaitingEmail ──valid/skip──▶ Chatting
//!                                       └──────────────no / e-mail given──────────────────▶ Chatting
//! ```
//!
//! Invalid or empty input never changes state; the current question is asked again.

use std::sync::OnceLock;

use regex::Regex;
use serde::Serialize;

const MAX_NAME_CHARS: usize = 60;
const NAME_PREFIXES: &[&str] = &[
    "my name is", "my name's", "i am", "i'm", "im", "this is", "call me", "it's", "its", "name:",
];
const YES_WORDS: &[&str] = &["yes", "y", "yeah", "yep", "yup", "sure", "ok", "okay", "of course"];
const NO_WORDS: &[&str] = &["no", "n", "nope", "nah", "skip", "later", "no thanks", "not now"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatState {
    AwaitingName,
    AwaitingEmailChoice,
    AwaitingEmail,
    Chatting,
}

/// What the caller must do with a visitor message.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    /// Reply with this text; no registration, no responder call.
    Prompt(String),
    /// Onboarding finished: persist the visitor, then reply with `reply`.
    Registered {
        name: String,
        email: Option<String>,
        reply: String,
    },
    /// Free chat: hand the trimmed message to the responder.
    Chat(String),
}

#[derive(Debug, Clone)]
pub struct Conversation {
    state: ChatState,
    owner: String,
    name: Option<String>,
    email: Option<String>,
}

impl Conversation {
    /// Starts at `AwaitingName` and returns the welcome prompt.
    pub fn start(owner_first_name: &str) -> (Self, String) {
        let conversation = Self {
            state: ChatState::AwaitingName,
            owner: owner_first_name.to_string(),
            name: None,
            email: None,
        };
        let welcome = format!(
            "Hi! I'm {}'s portfolio assistant. Before we chat, what's your name?",
            conversation.owner
        );
        (conversation, welcome)
    }

    pub fn state(&self) -> ChatState {
        self.state
    }

    pub fn visitor_name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn visitor_email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn handle(&mut self, input: &str) -> Step {
        let input = input.trim();
        if input.is_empty() {
            return Step::Prompt(self.repeat_question());
        }

        match self.state {
            ChatState::AwaitingName => match parse_name(input) {
                Some(name) => {
                    let reply = format!(
                        "Nice to meet you, {name}! Would you like to share your email so {} can follow up? (yes/no)",
                        self.owner
                    );
                    self.name = Some(name);
                    self.state = ChatState::AwaitingEmailChoice;
                    Step::Prompt(reply)
                }
                None => Step::Prompt(format!(
                    "Sorry, I didn't catch that. Please tell me your name (letters only, up to {MAX_NAME_CHARS} characters)."
                )),
            },
            ChatState::AwaitingEmailChoice => {
                if is_valid_email(input) {
                    return self.finish(Some(input.to_string()));
                }
                match parse_choice(input) {
                    Some(true) => {
                        self.state = ChatState::AwaitingEmail;
                        Step::Prompt("Great, what's your email address? (or type 'skip')".to_string())
                    }
                    Some(false) => self.finish(None),
                    None => Step::Prompt(self.repeat_question()),
                }
            }
            ChatState::AwaitingEmail => {
                if is_valid_email(input) {
                    self.finish(Some(input.to_string()))
                } else if parse_choice(input) == Some(false) {
                    self.finish(None)
                } else {
                    Step::Prompt(
                        "That doesn't look like a valid email address. Please try again, or type 'skip'."
                            .to_string(),
                    )
                }
            }
            ChatState::Chatting => Step::Chat(input.to_string()),
        }
    }

    fn finish(&mut self, email: Option<String>) -> Step {
        let name = self.name.clone().unwrap_or_default();
        self.email = email.clone();
        self.state = ChatState::Chatting;
        Step::Registered {
            reply: format!(
                "Thanks, {name}! Ask me anything about {}'s experience, skills, projects or education.",
                self.owner
            ),
            name,
            email,
        }
    }

    fn repeat_question(&self) -> String {
        match self.state {
            ChatState::AwaitingName => "Before we chat, what's your name?".to_string(),
            ChatState::AwaitingEmailChoice => {
                "Please answer yes or no: would you like to share your email?".to_string()
            }
            ChatState::AwaitingEmail => {
                "What's your email address? (or type 'skip')".to_string()
            }
            ChatState::Chatting => format!("Ask me anything about {}'s background!", self.owner),
        }
    }
}

/// Strips introductions like "my name is", validates and title-cases the rest.
pub fn parse_name(input: &str) -> Option<String> {
    let mut name = input.trim().trim_end_matches(['.', '!', ',']).trim();
    let lower = name.to_lowercase();
    let prefix = NAME_PREFIXES.iter().find(|p| {
        lower
            .strip_prefix(**p)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    });
    if let Some(prefix) = prefix {
        name = name.get(prefix.len()..).unwrap_or_default().trim();
    }

    let valid = !name.is_empty()
        && name.chars().count() <= MAX_NAME_CHARS
        && name.chars().any(char::is_alphabetic)
        && name
            .chars()
            .all(|c| c.is_alphabetic() || matches!(c, ' ' | '-' | '\'' | '.'));
    if !valid {
        return None;
    }

    Some(
        name.split_whitespace()
            .map(capitalize)
            .collect::<Vec<_>>()
            .join(" "),
    )
}

/// Title-cases a word, starting a new part after `-` and `'`.
fn capitalize(word: &str) -> String {
    let mut titled = String::with_capacity(word.len());
    let mut at_start = true;
    for c in word.chars() {
        if at_start {
            titled.extend(c.to_uppercase());
        } else {
            titled.extend(c.to_lowercase());
        }
        at_start = matches!(c, '-' | '\'');
    }
    titled
}

fn parse_choice(input: &str) -> Option<bool> {
    let answer = input
        .trim()
        .trim_end_matches(['.', '!'])
        .to_lowercase();
    if YES_WORDS.contains(&answer.as_str()) {
        Some(true)
    } else if NO_WORDS.contains(&answer.as_str()) {
        Some(false)
    } else {
        None
    }
}

pub fn is_valid_email(input: &str) -> bool {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    EMAIL
        .get_or_init(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[A-Za-z]{2,}$").ok())
        .as_ref()
        .map(|re| re.is_match(input.trim()))
        .unwrap_or(false)
}
