//! Page-level reaction engine
//!
//! Ties the three parts together: the site's compiled timestamp format, the
//! comment locator and the line mutations. A host builds one engine per site
//! and feeds it whole pages.
//!
//! # Design Decisions
//!
//! - **Line scope**: a mutation only ever touches the line holding the located
//!   signature timestamp; the rest of the page is spliced back byte-for-byte
//! - **Shared cache**: the engine holds an `Arc<FormatCache>` handed in by the
//!   host, so several engines for the same site reuse one compiled format
//! - **Distinguishable failures**: [`ReactionError`] keeps locator, format and
//!   state-conflict failures apart for user-facing copy

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::SiteConfig;
use crate::locator::{CommentLocator, CommentPosition, CommentTarget, LocateError};
use crate::reaction::{apply_action, find_reaction_templates, ReactionAction, ReactionTemplate, StateConflict};
use crate::timestamp::{CompiledFormat, DateLocale, FormatCache, FormatError};

/// Prefix of edit summaries for additions
pub const ADD_PREFIX: &str = "+";

/// Prefix of edit summaries for removals (U+2212 MINUS SIGN)
pub const REMOVE_PREFIX: &str = "\u{2212}";

/// Errors from page-level reaction operations
#[derive(Debug, Error)]
pub enum ReactionError {
    #[error(transparent)]
    Format(#[from] FormatError),

    #[error(transparent)]
    Locate(#[from] LocateError),

    #[error(transparent)]
    Conflict(#[from] StateConflict),

    #[error("Invalid signature configuration: {0}")]
    Signature(#[from] regex::Error),
}

/// A reader's reaction request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRequest {
    pub action: ReactionAction,
    pub icon: String,
    /// Acting user
    pub user: String,
    /// Signature timestamp recorded for additions
    #[serde(default)]
    pub timestamp: Option<String>,
}

impl ReactionRequest {
    pub fn new(action: ReactionAction, icon: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            action,
            icon: icon.into(),
            user: user.into(),
            timestamp: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = Some(timestamp.into());
        self
    }
}

/// A successful page edit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PageEdit {
    /// Full page text after the edit
    pub text: String,
    /// Edit summary, `+ <icon>` or `− <icon>`
    pub summary: String,
}

/// Reactions on one located comment
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentReactions {
    pub position: CommentPosition,
    /// The comment's line, as in the page
    pub line: String,
    pub reactions: Vec<ReactionTemplate>,
}

/// Byte range of the line containing `offset`, line terminator excluded
pub fn line_bounds(text: &str, offset: usize) -> (usize, usize) {
    let start = text[..offset].rfind('\n').map(|i| i + 1).unwrap_or(0);
    let mut end = text[offset..]
        .find('\n')
        .map(|i| offset + i)
        .unwrap_or(text.len());
    if text[start..end].ends_with('\r') {
        end -= 1;
    }
    (start, end)
}

/// Edit summary for an action on an icon
pub fn edit_summary(action: ReactionAction, icon: &str) -> String {
    let prefix = if action.is_addition() {
        ADD_PREFIX
    } else {
        REMOVE_PREFIX
    };
    format!("{} {}", prefix, icon.trim())
}

/// Reaction engine for one site
#[derive(Debug, Clone)]
pub struct ReactionEngine {
    site: SiteConfig,
    locale: DateLocale,
    locator: CommentLocator,
    cache: Arc<FormatCache>,
}

impl ReactionEngine {
    /// Build an engine with its own format cache
    pub fn new(site: SiteConfig) -> Result<Self, ReactionError> {
        Self::with_cache(site, Arc::new(FormatCache::new()))
    }

    /// Build an engine sharing a host-owned format cache
    pub fn with_cache(site: SiteConfig, cache: Arc<FormatCache>) -> Result<Self, ReactionError> {
        let locator = CommentLocator::new(&site.signature)?;
        let locale = site.locale();
        Ok(Self {
            site,
            locale,
            locator,
            cache,
        })
    }

    pub fn site(&self) -> &SiteConfig {
        &self.site
    }

    /// The site's compiled timestamp format
    pub fn format(&self) -> Result<Arc<CompiledFormat>, FormatError> {
        self.cache
            .get_or_compile(&self.site.date_format, &self.locale, &self.site.timezone)
    }

    /// Render an instant as the site's signature timestamp
    pub fn signature_timestamp(&self, instant: DateTime<Utc>) -> Result<String, FormatError> {
        Ok(self.format()?.render(instant))
    }

    /// Locate the comment a target refers to
    pub fn locate(&self, page: &str, target: &CommentTarget) -> Result<CommentPosition, LocateError> {
        self.locator.locate(page, target)
    }

    /// Reaction templates on the located comment's line
    pub fn reactions_at(&self, page: &str, target: &CommentTarget) -> Result<CommentReactions, ReactionError> {
        let position = self.locate(page, target)?;
        let (start, end) = line_bounds(page, position.offset);
        let line = &page[start..end];
        Ok(CommentReactions {
            reactions: find_reaction_templates(line),
            line: line.to_string(),
            position,
        })
    }

    /// Apply a reaction to the located comment and return the edited page
    pub fn react(
        &self,
        page: &str,
        target: &CommentTarget,
        request: &ReactionRequest,
    ) -> Result<PageEdit, ReactionError> {
        self.check_target_timestamp(&target.timestamp)?;

        let position = self.locate(page, target)?;
        let (start, end) = line_bounds(page, position.offset);

        let edit = apply_action(
            &page[start..end],
            request.action,
            &request.icon,
            &request.user,
            request.timestamp.as_deref(),
        );
        let line = edit.into_result()?;

        info!(
            action = request.action.as_str(),
            icon = %request.icon,
            user = %request.user,
            offset = position.offset,
            "Applied reaction"
        );

        let mut text = String::with_capacity(page.len() + line.len());
        text.push_str(&page[..start]);
        text.push_str(&line);
        text.push_str(&page[end..]);

        Ok(PageEdit {
            text,
            summary: edit_summary(request.action, &request.icon),
        })
    }

    /// Log how the site format reads a target timestamp; only format errors fail
    fn check_target_timestamp(&self, timestamp: &str) -> Result<(), FormatError> {
        let format = self.format()?;
        match format.parse(timestamp) {
            Some(parsed) => {
                if let Some(warning) = parsed.warning {
                    warn!(timestamp, ?warning, "Target timestamp parsed with a warning");
                }
                debug!(timestamp, instant = %parsed.instant, "Target timestamp parsed");
            }
            None => debug!(timestamp, "Target timestamp does not match the site format"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PAGE: &str = "== Topic ==\n\
        Agreed. [[User:Example|Example]] 12:30, 31 Dec 2025 (UTC) {{Reaction|👍|Example|ts=12:30, 31 Dec 2025 (UTC)}}\n\
        :Reply. [[User:Other|Other]] 13:00, 31 Dec 2025 (UTC)\n";

    fn engine() -> ReactionEngine {
        ReactionEngine::new(SiteConfig::default()).unwrap()
    }

    #[test]
    fn test_line_bounds() {
        let text = "a\nbcd\r\ne";
        assert_eq!(line_bounds(text, 0), (0, 1));
        assert_eq!(line_bounds(text, 3), (2, 5));
        assert_eq!(line_bounds(text, 7), (7, 8));
        // End of text belongs to the last line
        assert_eq!(line_bounds(text, text.len()), (7, 8));
        assert_eq!(line_bounds("", 0), (0, 0));
    }

    #[test]
    fn test_summary_prefixes() {
        assert_eq!(edit_summary(ReactionAction::Upvote, "👍"), "+ 👍");
        assert_eq!(edit_summary(ReactionAction::RemoveAll, " 👍 "), "\u{2212} 👍");
    }

    #[test]
    fn test_react_touches_only_the_comment_line() {
        let target = CommentTarget::new("12:30, 31 Dec 2025 (UTC)").with_author("Example");
        let request = ReactionRequest::new(ReactionAction::Append, "🎉", "Other")
            .with_timestamp("14:00, 1 Jan 2026 (UTC)");
        let edit = engine().react(PAGE, &target, &request).unwrap();

        let lines: Vec<_> = edit.text.lines().collect();
        assert_eq!(lines[0], "== Topic ==");
        assert!(lines[1].ends_with("{{Reaction|icon=🎉|user1=Other|ts1=14:00, 1 Jan 2026 (UTC)}}"));
        assert_eq!(lines[2], ":Reply. [[User:Other|Other]] 13:00, 31 Dec 2025 (UTC)");
        assert!(edit.text.ends_with('\n'));
        assert_eq!(edit.summary, "+ 🎉");
    }

    #[test]
    fn test_react_conflict_is_typed() {
        let target = CommentTarget::new("12:30, 31 Dec 2025 (UTC)");
        let request = ReactionRequest::new(ReactionAction::Upvote, "👍", "Example");
        let err = engine().react(PAGE, &target, &request).unwrap_err();
        assert!(matches!(
            err,
            ReactionError::Conflict(StateConflict::AlreadyReacted { .. })
        ));
    }

    #[test]
    fn test_react_locate_error_is_typed() {
        let target = CommentTarget::new("00:00, 1 Jan 2000 (UTC)");
        let request = ReactionRequest::new(ReactionAction::Append, "👍", "A");
        let err = engine().react(PAGE, &target, &request).unwrap_err();
        assert!(matches!(err, ReactionError::Locate(LocateError::TimestampNotFound { .. })));
    }

    #[test]
    fn test_reactions_at() {
        let target = CommentTarget::new("12:30, 31 Dec 2025 (UTC)").with_author("Example");
        let found = engine().reactions_at(PAGE, &target).unwrap();
        assert_eq!(found.reactions.len(), 1);
        assert_eq!(found.reactions[0].data.participants[0].user, "Example");
        assert_eq!(found.position.users, vec!["Example".to_string()]);
    }

    #[test]
    fn test_signature_timestamp_round_trips_through_locator() {
        let engine = engine();
        let instant = Utc.with_ymd_and_hms(2024, 1, 1, 14, 0, 0).unwrap();
        let ts = engine.signature_timestamp(instant).unwrap();
        assert_eq!(ts, "14:00, 1 Jan 2024 (UTC)");
        assert_eq!(engine.format().unwrap().parse(&ts).unwrap().instant, instant);
    }

    #[test]
    fn test_engines_share_cache() {
        let cache = Arc::new(FormatCache::new());
        let a = ReactionEngine::with_cache(SiteConfig::default(), Arc::clone(&cache)).unwrap();
        let b = ReactionEngine::with_cache(SiteConfig::default(), Arc::clone(&cache)).unwrap();
        assert!(Arc::ptr_eq(&a.format().unwrap(), &b.format().unwrap()));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_unknown_timezone_is_format_error() {
        let site = SiteConfig {
            timezone: "Mars/Olympus".to_string(),
            ..SiteConfig::default()
        };
        let engine = ReactionEngine::new(site).unwrap();
        let target = CommentTarget::new("12:30, 31 Dec 2025 (UTC)");
        let request = ReactionRequest::new(ReactionAction::Append, "🎉", "A");
        let err = engine.react(PAGE, &target, &request).unwrap_err();
        assert!(matches!(err, ReactionError::Format(FormatError::UnknownTimezone { .. })));
    }
}
