//! reactwiki - Emoji reactions stored in wikitext
//!
//! Reactions to talk-page comments live in the page source itself, as
//! `{{Reaction|icon=👍|user1=...|ts1=...}}` templates on the comment's
//! signature line. This crate finds the comment a reader reacted to and
//! rewrites that line.
//!
//! # Architecture
//!
//! Three independent parts, joined by a small engine:
//! - Signature timestamps are matched and parsed with a format compiled from
//!   the site's date-format language and locale tables
//! - Comments are located by the literal timestamp plus the user links in the
//!   signature just before it
//! - Reaction templates on the located line are parsed, mutated and written
//!   back in canonical form
//!
//! # Modules
//!
//! - `timestamp`: Format compiler (matcher, parser, formatter, cache)
//! - `locator`: Comment locator (signature window, author filter)
//! - `reaction`: Reaction template engine (scan, parse, mutate, serialize)
//! - `engine`: Page-level facade (`ReactionEngine`)
//! - `config`: Site configuration
//! - `cli`: Command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Where is the comment?
//! reactwiki locate "12:30, 31 Dec 2025 (UTC)" --author Example -i page.wiki
//!
//! # React to it
//! reactwiki react upvote 👍 --user TestUser "12:30, 31 Dec 2025 (UTC)" -i page.wiki
//! ```

pub mod cli;
pub mod config;
pub mod engine;
pub mod locator;
pub mod reaction;
pub mod timestamp;

// Re-export main types at crate root for convenience
pub use config::SiteConfig;
pub use engine::{CommentReactions, PageEdit, ReactionEngine, ReactionError, ReactionRequest};
pub use locator::{find_comment_position, CommentLocator, CommentPosition, CommentTarget, LocateError};
pub use reaction::{LineEdit, ReactionAction, ReactionParticipant, ReactionTemplateData, StateConflict};
pub use timestamp::{CompiledFormat, DateLocale, FormatCache, FormatError, ParseWarning, ParsedTimestamp};
