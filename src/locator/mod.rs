//! Comment locator
//!
//! Finds the signature timestamp of the comment a reader acted on. A page can
//! carry the same timestamp text many times (two replies in the same minute,
//! quoted examples, archives), so every literal occurrence is checked for a
//! user link in the text just before it, optionally filtered by author, and
//! finally disambiguated by a zero-based occurrence index.
//!
//! # Design Decisions
//!
//! - **Literal search**: the timestamp text is never interpreted as a pattern
//! - **Signature window**: user links must appear within `window_chars`
//!   characters before the timestamp (the on-wiki signature length limit)
//! - **Typed failures**: every way of not finding a comment is a distinct
//!   [`LocateError`] variant carrying what a caller needs for its message
//! - **Byte offsets**: positions are UTF-8 byte offsets into the page text
//! - **Reactions are not signatures**: timestamps inside a reaction template's
//!   `tsN=` values never count as occurrences

pub mod signature;

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::reaction::find_reaction_templates;

pub use signature::{normalize_user, SignatureConfig, UserLinkExtractor};

/// Default-convention locator used by [`find_comment_position`]
static DEFAULT_LOCATOR: OnceLock<Result<CommentLocator, String>> = OnceLock::new();

/// What to look for
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentTarget {
    /// Rendered signature timestamp, e.g. `12:30, 31 Dec 2025 (UTC)`
    pub timestamp: String,
    /// Expected author of the comment
    #[serde(default)]
    pub author: Option<String>,
    /// Zero-based index among the surviving candidates, in document order
    #[serde(default)]
    pub occurrence: Option<usize>,
}

impl CommentTarget {
    pub fn new(timestamp: impl Into<String>) -> Self {
        Self {
            timestamp: timestamp.into(),
            author: None,
            occurrence: None,
        }
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_occurrence(mut self, occurrence: usize) -> Self {
        self.occurrence = Some(occurrence);
        self
    }
}

/// A located comment signature
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentPosition {
    /// Byte offset of the timestamp in the page text
    pub offset: usize,
    /// Users linked in the signature window before the timestamp
    pub users: Vec<String>,
    /// Number of candidates the selection was made from
    pub candidates: usize,
}

/// Why a comment could not be located
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LocateError {
    #[error("Timestamp not found on page: {timestamp}")]
    TimestampNotFound { timestamp: String },

    #[error("Timestamp found {occurrences} time(s) but no recognizable user signature nearby")]
    NoSignatureNearby { occurrences: usize },

    #[error("No signature by {author} at this timestamp (signed by: {})", .found.join(", "))]
    AuthorMismatch { author: String, found: Vec<String> },

    #[error("Occurrence {index} out of range: only {candidates} candidate(s)")]
    OccurrenceOutOfRange { index: usize, candidates: usize },

    #[error("Timestamp matches {candidates} signed comments; an author or occurrence index is needed")]
    Ambiguous { candidates: usize },

    #[error("Invalid signature configuration: {message}")]
    InvalidSignatureConfig { message: String },
}

/// Locator configured with a site's signature conventions
#[derive(Debug, Clone)]
pub struct CommentLocator {
    extractor: UserLinkExtractor,
    window_chars: usize,
}

impl CommentLocator {
    pub fn new(config: &SignatureConfig) -> Result<Self, regex::Error> {
        Ok(Self {
            extractor: UserLinkExtractor::new(config)?,
            window_chars: config.window_chars,
        })
    }

    /// Start of the signature window ending at `offset`
    fn window_start(&self, page: &str, offset: usize) -> usize {
        if self.window_chars == 0 {
            return offset;
        }
        page[..offset]
            .char_indices()
            .rev()
            .nth(self.window_chars - 1)
            .map(|(i, _)| i)
            .unwrap_or(0)
    }

    /// Every occurrence of `timestamp` with the users linked just before it
    ///
    /// Occurrences inside a reaction template (its `tsN=` values) are not
    /// comment signatures and are skipped.
    pub fn occurrences(&self, page: &str, timestamp: &str) -> Vec<(usize, Vec<String>)> {
        if timestamp.is_empty() {
            return Vec::new();
        }
        page.match_indices(timestamp)
            .filter(|(offset, _)| !inside_reaction_template(page, *offset))
            .map(|(offset, _)| {
                let window = &page[self.window_start(page, offset)..offset];
                (offset, self.extractor.users_in(window))
            })
            .collect()
    }

    /// Resolve a target to a single timestamp offset
    pub fn locate(&self, page: &str, target: &CommentTarget) -> Result<CommentPosition, LocateError> {
        let occurrences = self.occurrences(page, &target.timestamp);
        if occurrences.is_empty() {
            return Err(LocateError::TimestampNotFound {
                timestamp: target.timestamp.clone(),
            });
        }

        let total = occurrences.len();
        let signed: Vec<_> = occurrences.into_iter().filter(|(_, users)| !users.is_empty()).collect();
        if signed.is_empty() {
            return Err(LocateError::NoSignatureNearby { occurrences: total });
        }

        let author = target.author.as_deref().map(normalize_user);
        let candidates: Vec<_> = match &author {
            Some(author) => {
                let matching: Vec<_> = signed
                    .iter()
                    .filter(|(_, users)| users.contains(author))
                    .cloned()
                    .collect();
                if matching.is_empty() {
                    let mut found: Vec<String> = Vec::new();
                    for (_, users) in &signed {
                        for user in users {
                            if !found.contains(user) {
                                found.push(user.clone());
                            }
                        }
                    }
                    return Err(LocateError::AuthorMismatch {
                        author: author.clone(),
                        found,
                    });
                }
                matching
            }
            None => signed,
        };

        debug!(
            timestamp = %target.timestamp,
            occurrences = total,
            candidates = candidates.len(),
            "Located timestamp candidates"
        );

        let count = candidates.len();
        let selected = match target.occurrence {
            Some(index) => candidates
                .into_iter()
                .nth(index)
                .ok_or(LocateError::OccurrenceOutOfRange {
                    index,
                    candidates: count,
                })?,
            // With an author filter the first matching signature wins
            None if count == 1 || author.is_some() => candidates
                .into_iter()
                .next()
                .ok_or(LocateError::Ambiguous { candidates: count })?,
            None => return Err(LocateError::Ambiguous { candidates: count }),
        };

        Ok(CommentPosition {
            offset: selected.0,
            users: selected.1,
            candidates: count,
        })
    }
}

/// Whether `offset` falls inside a reaction template on its line
fn inside_reaction_template(page: &str, offset: usize) -> bool {
    let line_start = page[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let line_end = page[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(page.len());
    let relative = offset - line_start;
    find_reaction_templates(&page[line_start..line_end])
        .iter()
        .any(|t| t.start < relative && relative < t.end)
}

/// Locate a comment with the default `User` / `User talk` conventions
pub fn find_comment_position(
    page: &str,
    timestamp: &str,
    author: Option<&str>,
    occurrence: Option<usize>,
) -> Result<CommentPosition, LocateError> {
    let target = CommentTarget {
        timestamp: timestamp.to_string(),
        author: author.map(str::to_string),
        occurrence,
    };
    default_locator()?.locate(page, &target)
}

/// Locator for the default conventions, compiled once per process
fn default_locator() -> Result<&'static CommentLocator, LocateError> {
    let result = DEFAULT_LOCATOR
        .get_or_init(|| CommentLocator::new(&SignatureConfig::default()).map_err(|e| e.to_string()));

    match result {
        Ok(locator) => Ok(locator),
        Err(message) => Err(LocateError::InvalidSignatureConfig {
            message: message.clone(),
        }),
    }
}
