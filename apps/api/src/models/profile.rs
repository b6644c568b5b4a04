use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Static facts about the portfolio owner. Fed into every system prompt,
/// used for canned answers, and indexed as `ChunkSource::Profile`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub name: String,
    #[serde(default)]
    pub headline: String,
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub linkedin: Option<String>,
    #[serde(default)]
    pub github: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub availability: Option<String>,
    #[serde(default)]
    pub hobbies: Vec<String>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            name: "Alex Morgan".to_string(),
            headline: "Software Engineer".to_string(),
            summary: "Alex builds reliable backend services and developer tooling.".to_string(),
            email: Some("alex@example.com".to_string()),
            phone: None,
            location: Some("Remote".to_string()),
            linkedin: None,
            github: None,
            website: None,
            skills: vec![
                "Rust".to_string(),
                "Python".to_string(),
                "PostgreSQL".to_string(),
                "Kubernetes".to_string(),
            ],
            availability: Some("Open to new opportunities".to_string()),
            hobbies: Vec::new(),
        }
    }
}

impl Profile {
    /// Reads a profile JSON file, or returns the built-in default when no path is given.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Cannot read profile file {}", path.display()))?;
        let profile: Profile = serde_json::from_str(&raw)
            .with_context(|| format!("Invalid profile JSON in {}", path.display()))?;
        anyhow::ensure!(!profile.name.trim().is_empty(), "Profile name cannot be empty");
        Ok(profile)
    }

    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.name)
    }

    /// One fact per line, skipping empty fields.
    pub fn facts(&self) -> String {
        let mut lines = vec![format!("Name: {}", self.name)];
        let mut push = |label: &str, value: &str| {
            if !value.trim().is_empty() {
                lines.push(format!("{label}: {value}"));
            }
        };
        push("Headline", &self.headline);
        push("Summary", &self.summary);
        push("Location", self.location.as_deref().unwrap_or_default());
        push("Email", self.email.as_deref().unwrap_or_default());
        push("Phone", self.phone.as_deref().unwrap_or_default());
        push("LinkedIn", self.linkedin.as_deref().unwrap_or_default());
        push("GitHub", self.github.as_deref().unwrap_or_default());
        push("Website", self.website.as_deref().unwrap_or_default());
        push("Skills", &self.skills.join(", "));
        push("Availability", self.availability.as_deref().unwrap_or_default());
        push("Hobbies", &self.hobbies.join(", "));
        lines.join("\n")
    }

    /// Contact channels as `(label, value)` pairs, in display order.
    pub fn contact_channels(&self) -> Vec<(&'static str, &str)> {
        [
            ("Email", self.email.as_deref()),
            ("Phone", self.phone.as_deref()),
            ("LinkedIn", self.linkedin.as_deref()),
            ("GitHub", self.github.as_deref()),
            ("Website", self.website.as_deref()),
        ]
        .into_iter()
        .filter_map(|(label, value)| value.filter(|v| !v.trim().is_empty()).map(|v| (label, v)))
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_without_path_uses_default() {
        let profile = Profile::load(None).unwrap();
        assert_eq!(profile.first_name(), "Alex");
    }

    #[test]
    fn test_load_fills_missing_fields() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"name": "Jane Doe", "skills": ["Rust"]}"#).unwrap();
        let profile = Profile::load(Some(file.path())).unwrap();
        assert_eq!(profile.name, "Jane Doe");
        assert!(profile.email.is_none());
        assert!(profile.hobbies.is_empty());
    }

    #[test]
    fn test_blank_name_rejected() {
        let file = tempfile::NamedTempFile::new().unwrap();
        std::fs::write(file.path(), r#"{"name": "  "}"#).unwrap();
        assert!(Profile::load(Some(file.path())).is_err());
    }

    #[test]
    fn test_facts_skip_empty_fields() {
        let profile = Profile {
            name: "Jane Doe".to_string(),
            headline: String::new(),
            summary: "Builds things".to_string(),
            email: None,
            phone: None,
            location: None,
            linkedin: Some("linkedin.com/in/jane".to_string()),
            github: None,
            website: None,
            skills: vec![],
            availability: None,
            hobbies: vec![],
        };
        assert_eq!(
            profile.facts(),
            "Name: Jane Doe\nSummary: Builds things\nLinkedIn: linkedin.com/in/jane"
        );
        assert_eq!(profile.contact_channels(), vec![("LinkedIn", "linkedin.com/in/jane")]);
    }
}
