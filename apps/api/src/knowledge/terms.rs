use std::collections::HashSet;

/// Tokens shorter than this never count as search terms.
const MIN_TERM_LEN: usize = 3;

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "are", "but", "not", "you", "your", "yours", "with", "this", "that",
    "these", "those", "from", "have", "has", "had", "was", "were", "will", "would", "could",
    "should", "can", "what", "which", "who", "whom", "whose", "when", "where", "why", "how",
    "does", "did", "doing", "about", "into", "over", "any", "all", "some", "more", "most",
    "other", "such", "than", "then", "too", "very", "just", "also", "her", "his", "him", "she",
    "they", "them", "their", "there", "here", "our", "out", "its", "been", "being", "tell",
    "please", "know", "like", "get", "got", "let", "may", "might", "must", "shall", "much",
    "many", "each", "few", "own", "same", "only", "yes", "okay",
];

/// Lowercased word tokens; `+` and `#` stay attached so `c++` and `c#` survive.
pub fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !(c.is_alphanumeric() || c == '+' || c == '#'))
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
}

fn is_term(token: &str) -> bool {
    token.chars().count() >= MIN_TERM_LEN && !STOP_WORDS.contains(&token)
}

/// Distinct search terms of a chunk.
pub fn term_set(text: &str) -> HashSet<String> {
    tokenize(text).filter(|t| is_term(t)).collect()
}

/// Distinct search terms of a query, in first-seen order.
pub fn query_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query)
        .filter(|t| is_term(t))
        .filter(|t| seen.insert(t.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_terms_drop_stopwords_and_short_tokens() {
        let terms = query_terms("What is her experience with AWS and Rust?");
        assert_eq!(terms, vec!["experience", "aws", "rust"]);
    }

    #[test]
    fn test_query_terms_are_deduplicated() {
        assert_eq!(query_terms("Rust rust RUST"), vec!["rust"]);
    }

    #[test]
    fn test_symbols_in_language_names_survive() {
        let terms = term_set("Wrote C++ and C# services");
        assert!(terms.contains("c++"));
        assert!(!terms.contains("c#"), "two-char tokens are too short");
        assert!(terms.contains("services"));
    }
}
