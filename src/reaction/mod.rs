//! Reaction template engine
//!
//! Reaction state lives in the page text itself, as a `{{Reaction|...}}`
//! invocation on the comment's signature line. This module finds those
//! invocations, parses their parameters into [`ReactionTemplateData`], applies
//! mutations and writes them back in canonical form.
//!
//! # Design Decisions
//!
//! - **Single forward scan**: brace and bracket depth counters, no recursive parser
//! - **Two-pass parsing**: every parameter is classified into a [`ParamKind`]
//!   before assembly, so each dialect rule can be tested on its own
//! - **Canonical output**: re-serialized templates always use `icon=`,
//!   `userN=` and `tsN=`, numbered from 1, whatever dialect they were read in
//! - **Refusals are values**: state conflicts come back as [`StateConflict`]
//!   inside a [`LineEdit`] with the line untouched

pub mod mutate;
pub mod scan;
pub mod template;

pub use mutate::{
    append_reaction, apply_action, downvote_reaction, remove_all_reactions, upvote_reaction,
    LineEdit, ReactionAction, StateConflict,
};
pub use scan::{find_reaction_templates, split_params, ReactionTemplate};
pub use template::{
    assemble, classify_params, parse_params, serialize_reaction_template, ParamKind,
    ReactionParticipant, ReactionTemplateData, LEGACY_SEPARATORS,
};
