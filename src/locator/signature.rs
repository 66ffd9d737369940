//! User-link extraction from signature text.

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Namespace aliases that identify a user link in a signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignatureConfig {
    /// User and user-talk namespace names and aliases, matched case-sensitively
    #[serde(default = "default_user_namespaces")]
    pub user_namespaces: Vec<String>,

    /// Full titles of the contributions special page (`Special:Contributions`)
    #[serde(default = "default_contributions_pages")]
    pub contributions_pages: Vec<String>,

    /// How many characters before a timestamp may hold its signature links
    #[serde(default = "default_window_chars")]
    pub window_chars: usize,
}

fn default_user_namespaces() -> Vec<String> {
    vec!["User".to_string(), "User talk".to_string()]
}

fn default_contributions_pages() -> Vec<String> {
    vec!["Special:Contributions".to_string()]
}

fn default_window_chars() -> usize {
    255
}

impl Default for SignatureConfig {
    fn default() -> Self {
        Self {
            user_namespaces: default_user_namespaces(),
            contributions_pages: default_contributions_pages(),
            window_chars: default_window_chars(),
        }
    }
}

/// Collapse whitespace, trim, then use underscores for spaces
pub fn normalize_user(name: &str) -> String {
    name.split_whitespace().collect::<Vec<_>>().join("_")
}

/// A title written with spaces may appear with underscores or runs of either
fn title_pattern(title: &str) -> String {
    title
        .split(|c: char| c == ' ' || c == '_')
        .filter(|part| !part.is_empty())
        .map(|part| {
            // Allow whitespace around the namespace colon
            part.split(':').map(regex::escape).collect::<Vec<_>>().join(r"[ _]*:[ _]*")
        })
        .collect::<Vec<_>>()
        .join("[ _]+")
}

fn alternation(titles: &[String]) -> Option<String> {
    let parts: Vec<String> = titles
        .iter()
        .map(|t| title_pattern(t))
        .filter(|p| !p.is_empty())
        .collect();
    if parts.is_empty() {
        None
    } else {
        Some(format!("(?:{})", parts.join("|")))
    }
}

/// Compiled user-link recognizer
#[derive(Debug, Clone)]
pub struct UserLinkExtractor {
    regex: Option<Regex>,
}

impl UserLinkExtractor {
    pub fn new(config: &SignatureConfig) -> Result<Self, regex::Error> {
        let mut branches = Vec::new();
        if let Some(namespaces) = alternation(&config.user_namespaces) {
            branches.push(format!(r"{}[ _]*:[ _]*(?P<user>[^\[\]{{}}|#/<>\n]+)", namespaces));
        }
        if let Some(pages) = alternation(&config.contributions_pages) {
            branches.push(format!(r"{}/(?P<contrib>[^\[\]{{}}|#<>\n]+)", pages));
        }
        if branches.is_empty() {
            return Ok(Self { regex: None });
        }
        let regex = Regex::new(&format!(r"\[\[[ _]*:?[ _]*(?:{})", branches.join("|")))?;
        Ok(Self { regex: Some(regex) })
    }

    /// Normalized user names linked in `text`, in order of appearance
    pub fn users_in(&self, text: &str) -> Vec<String> {
        let Some(regex) = &self.regex else {
            return Vec::new();
        };
        regex
            .captures_iter(text)
            .filter_map(|caps| caps.name("user").or_else(|| caps.name("contrib")))
            .map(|m| normalize_user(m.as_str()))
            .filter(|name| !name.is_empty())
            .collect()
    }
}
