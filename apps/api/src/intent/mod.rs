//! Intent classifier: ordered keyword rules mapping a visitor message to a label.
//!
//! The first rule with a matching keyword wins. Social rules (thanks, farewell,
//! greeting) only apply to short messages so "hi, what are your skills?" still
//! routes to `Skills`.

use serde::{Deserialize, Serialize};

/// Social rules only fire on messages with at most this many words.
const SHORT_MESSAGE_WORDS: usize = 6;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Greeting,
    Farewell,
    Thanks,
    Contact,
    Resume,
    Skills,
    Experience,
    Education,
    Projects,
    Certifications,
    Achievements,
    Hiring,
    Location,
    Hobbies,
    About,
    General,
}

impl Intent {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Greeting => "greeting",
            Self::Farewell => "farewell",
            Self::Thanks => "thanks",
            Self::Contact => "contact",
            Self::Resume => "resume",
            Self::Skills => "skills",
            Self::Experience => "experience",
            Self::Education => "education",
            Self::Projects => "projects",
            Self::Certifications => "certifications",
            Self::Achievements => "achievements",
            Self::Hiring => "hiring",
            Self::Location => "location",
            Self::Hobbies => "hobbies",
            Self::About => "about",
            Self::General => "general",
        }
    }

    /// Intents answered from the profile without retrieval or the LLM.
    pub fn is_canned(&self) -> bool {
        matches!(
            self,
            Self::Greeting | Self::Farewell | Self::Thanks | Self::Contact | Self::Resume
        )
    }
}

struct Rule {
    intent: Intent,
    keywords: &'static [&'static str],
    short_only: bool,
}

const RULES: &[Rule] = &[
    Rule {
        intent: Intent::Resume,
        keywords: &["resume", "résumé", "cv", "curriculum vitae", "download"],
        short_only: false,
    },
    Rule {
        intent: Intent::Contact,
        keywords: &[
            "contact", "email", "e mail", "phone", "reach", "linkedin", "github", "get in touch",
            "call", "number", "message her", "message him",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Hiring,
        keywords: &[
            "hire", "hiring", "available", "availability", "open to work", "looking for work",
            "opportunity", "opportunities", "freelance", "contract", "salary", "rate", "relocate",
            "relocation", "notice period", "recruit", "recruiting", "remote",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Skills,
        keywords: &[
            "skill", "skills", "tech stack", "stack", "technology", "technologies", "programming",
            "language", "languages", "framework", "frameworks", "tools", "proficient",
            "expertise", "good at", "strengths",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Certifications,
        keywords: &[
            "certification", "certifications", "certified", "certificate", "certificates",
            "license", "licenses", "accreditation",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Education,
        keywords: &[
            "education", "degree", "degrees", "university", "college", "school", "study",
            "studied", "graduate", "graduated", "bachelor", "bachelors", "master", "masters",
            "phd", "major", "gpa", "course", "courses",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Projects,
        keywords: &[
            "project", "projects", "portfolio", "side project", "open source", "built", "build",
            "app", "apps", "demo",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Hobbies,
        keywords: &[
            "hobby", "hobbies", "interests", "free time", "spare time", "fun", "outside work",
            "passion", "passions", "weekend", "weekends",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Experience,
        keywords: &[
            "experience", "work", "worked", "working", "career", "employer", "employers",
            "employment", "company", "companies", "role", "roles", "position", "job", "jobs",
            "years", "internship", "internships",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Achievements,
        keywords: &[
            "achievement", "achievements", "award", "awards", "accomplishment",
            "accomplishments", "proud", "recognition", "publication", "publications", "patent",
            "patents", "won",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Location,
        keywords: &[
            "location", "located", "live", "lives", "based", "where", "city", "country",
            "timezone", "time zone",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::About,
        keywords: &[
            "about", "who", "yourself", "herself", "himself", "introduce", "background", "bio",
            "summary", "overview",
        ],
        short_only: false,
    },
    Rule {
        intent: Intent::Thanks,
        keywords: &["thanks", "thank", "thx", "ty", "appreciate", "appreciated", "cheers"],
        short_only: true,
    },
    Rule {
        intent: Intent::Farewell,
        keywords: &[
            "bye", "goodbye", "good bye", "see you", "see ya", "later", "farewell", "good night",
            "cya",
        ],
        short_only: true,
    },
    Rule {
        intent: Intent::Greeting,
        keywords: &[
            "hi", "hello", "hey", "hiya", "howdy", "yo", "greetings", "good morning",
            "good afternoon", "good evening", "sup",
        ],
        short_only: true,
    },
];

/// Lowercases and turns punctuation into spaces, padded so `" kw "` matches whole words.
fn normalize(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + 2);
    out.push(' ');
    for word in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
    {
        out.push_str(&word.to_lowercase());
        out.push(' ');
    }
    out
}

/// Classifies a visitor message. Returns `Intent::General` when no rule matches.
pub fn classify(text: &str) -> Intent {
    let normalized = normalize(text);
    let word_count = normalized.split_whitespace().count();
    if word_count == 0 {
        return Intent::General;
    }

    RULES
        .iter()
        .filter(|rule| !rule.short_only || word_count <= SHORT_MESSAGE_WORDS)
        .find(|rule| {
            rule.keywords
                .iter()
                .any(|kw| normalized.contains(&normalize(kw)))
        })
        .map(|rule| rule.intent)
        .unwrap_or(Intent::General)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_greetings() {
        assert_eq!(classify("Hi!"), Intent::Greeting);
        assert_eq!(classify("good morning"), Intent::Greeting);
        assert_eq!(classify("hey there"), Intent::Greeting);
    }

    #[test]
    fn test_greeting_prefix_does_not_hide_question() {
        assert_eq!(classify("hi, what are your skills?"), Intent::Skills);
        assert_eq!(classify("Hello! Where did she study?"), Intent::Education);
    }

    #[test]
    fn test_social_rules_ignore_long_messages() {
        assert_eq!(
            classify("hey I was wondering what she thinks of the weather today"),
            Intent::General
        );
    }

    #[test]
    fn test_whole_word_matching() {
        // "this" contains "hi", "height" contains "hi"; neither is a greeting.
        assert_eq!(classify("this"), Intent::General);
        assert_eq!(classify("height"), Intent::General);
    }

    #[test]
    fn test_phrases_match_across_punctuation() {
        assert_eq!(classify("How can I get in touch?"), Intent::Contact);
        assert_eq!(classify("Is she open-to-work?"), Intent::Hiring);
    }

    #[test]
    fn test_rule_order_resolves_overlaps() {
        // "resume" beats "experience"
        assert_eq!(classify("Can I download her resume of experience?"), Intent::Resume);
        // "where" + "study" → Education comes before Location
        assert_eq!(classify("where did she study"), Intent::Education);
        // "outside work" → Hobbies comes before Experience
        assert_eq!(classify("what does she do outside work"), Intent::Hobbies);
        assert_eq!(classify("Where is she based?"), Intent::Location);
    }

    #[test]
    fn test_topic_intents() {
        assert_eq!(classify("What projects has she built?"), Intent::Projects);
        assert_eq!(classify("Any AWS certifications?"), Intent::Certifications);
        assert_eq!(classify("Tell me about her career so far"), Intent::Experience);
        assert_eq!(classify("What awards has she won?"), Intent::Achievements);
        assert_eq!(classify("Who is she?"), Intent::About);
        assert_eq!(classify("Thank you so much"), Intent::Thanks);
        assert_eq!(classify("ok bye"), Intent::Farewell);
    }

    #[test]
    fn test_unmatched_and_empty_are_general() {
        assert_eq!(classify("What is the meaning of life?"), Intent::General);
        assert_eq!(classify("   ?!  "), Intent::General);
    }

    #[test]
    fn test_canned_intents() {
        assert!(Intent::Contact.is_canned());
        assert!(!Intent::Skills.is_canned());
        assert_eq!(Intent::Certifications.label(), "certifications");
    }
}
