//! Line-level reaction mutations.
//!
//! Every mutation takes one line of wikitext and returns a [`LineEdit`]. A
//! refused mutation leaves the text byte-identical and says why.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::scan::{find_reaction_templates, ReactionTemplate};
use super::template::{serialize_reaction_template, ReactionParticipant, ReactionTemplateData};
use crate::locator::normalize_user;

/// A mutation a reader can request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReactionAction {
    /// Add a new template for an icon not yet on the line
    Append,
    /// Join an existing template
    Upvote,
    /// Leave a template (first entry of the user)
    Downvote,
    /// Remove every entry of the user from a template
    RemoveAll,
}

impl ReactionAction {
    /// Whether the action adds a participant
    pub fn is_addition(&self) -> bool {
        matches!(self, ReactionAction::Append | ReactionAction::Upvote)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReactionAction::Append => "append",
            ReactionAction::Upvote => "upvote",
            ReactionAction::Downvote => "downvote",
            ReactionAction::RemoveAll => "remove-all",
        }
    }
}

/// Why a mutation was refused
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StateConflict {
    #[error("A reaction with {icon} already exists on this comment")]
    IconAlreadyPresent { icon: String },

    #[error("No reaction with {icon} on this comment")]
    IconNotFound { icon: String },

    #[error("{user} already reacted with {icon}")]
    AlreadyReacted { user: String, icon: String },

    #[error("{user} has not reacted with {icon}")]
    NotReacted { user: String, icon: String },
}

/// Result of a line mutation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineEdit {
    /// The line after the mutation (unchanged when refused)
    pub text: String,
    /// Why the mutation was refused, if it was
    pub conflict: Option<StateConflict>,
}

impl LineEdit {
    fn modified(text: String) -> Self {
        Self { text, conflict: None }
    }

    fn refused(line: &str, conflict: StateConflict) -> Self {
        debug!(%conflict, "Reaction mutation refused");
        Self {
            text: line.to_string(),
            conflict: Some(conflict),
        }
    }

    pub fn was_modified(&self) -> bool {
        self.conflict.is_none()
    }

    /// Convert to a `Result`, refusals as errors
    pub fn into_result(self) -> Result<String, StateConflict> {
        match self.conflict {
            None => Ok(self.text),
            Some(conflict) => Err(conflict),
        }
    }
}

fn find_icon(line: &str, icon: &str) -> Option<ReactionTemplate> {
    find_reaction_templates(line)
        .into_iter()
        .find(|t| t.data.has_icon(icon))
}

fn same_user(a: &str, b: &str) -> bool {
    normalize_user(a) == normalize_user(b)
}

fn replace_range(line: &str, start: usize, end: usize, replacement: &str) -> String {
    format!("{}{}{}", &line[..start], replacement, &line[end..])
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Cut `start..end` out of a line, joining the rest with at most one space
fn excise(line: &str, start: usize, end: usize) -> String {
    let before = line[..start].trim_end_matches(is_blank);
    let after = line[end..].trim_start_matches(is_blank);
    if before.is_empty() || after.is_empty() {
        format!("{}{}", before, after)
    } else {
        format!("{} {}", before, after)
    }
}

/// Add a new reaction template for `icon` at the end of the line
pub fn append_reaction(line: &str, icon: &str, user: &str, timestamp: Option<&str>) -> LineEdit {
    if find_icon(line, icon).is_some() {
        return LineEdit::refused(
            line,
            StateConflict::IconAlreadyPresent {
                icon: icon.trim().to_string(),
            },
        );
    }

    let mut data = ReactionTemplateData::new(icon.trim());
    data.participants
        .push(ReactionParticipant::new(user, timestamp.map(str::to_string)));
    let template = serialize_reaction_template(&data);

    let text = if line.is_empty() || line.ends_with(char::is_whitespace) {
        format!("{}{}", line, template)
    } else {
        format!("{} {}", line, template)
    };
    LineEdit::modified(text)
}

/// Add `user` to the existing template for `icon`
pub fn upvote_reaction(line: &str, icon: &str, user: &str, timestamp: Option<&str>) -> LineEdit {
    let Some(template) = find_icon(line, icon) else {
        return LineEdit::refused(
            line,
            StateConflict::IconNotFound {
                icon: icon.trim().to_string(),
            },
        );
    };

    if template.data.participants.iter().any(|p| same_user(&p.user, user)) {
        return LineEdit::refused(
            line,
            StateConflict::AlreadyReacted {
                user: user.to_string(),
                icon: icon.trim().to_string(),
            },
        );
    }

    let mut data = template.data;
    data.participants
        .push(ReactionParticipant::new(user, timestamp.map(str::to_string)));
    LineEdit::modified(replace_range(
        line,
        template.start,
        template.end,
        &serialize_reaction_template(&data),
    ))
}

fn remove_reaction(line: &str, icon: &str, user: &str, every: bool) -> LineEdit {
    let Some(template) = find_icon(line, icon) else {
        return LineEdit::refused(
            line,
            StateConflict::IconNotFound {
                icon: icon.trim().to_string(),
            },
        );
    };

    let mut data = template.data;
    let before = data.participants.len();
    if every {
        data.participants.retain(|p| !same_user(&p.user, user));
    } else if let Some(pos) = data.participants.iter().position(|p| same_user(&p.user, user)) {
        data.participants.remove(pos);
    }

    if data.participants.len() == before {
        return LineEdit::refused(
            line,
            StateConflict::NotReacted {
                user: user.to_string(),
                icon: icon.trim().to_string(),
            },
        );
    }

    if data.participants.is_empty() {
        return LineEdit::modified(excise(line, template.start, template.end));
    }

    LineEdit::modified(replace_range(
        line,
        template.start,
        template.end,
        &serialize_reaction_template(&data),
    ))
}

/// Remove the first entry of `user` from the template for `icon`
pub fn downvote_reaction(line: &str, icon: &str, user: &str) -> LineEdit {
    remove_reaction(line, icon, user, false)
}

/// Remove every entry of `user` from the template for `icon`
pub fn remove_all_reactions(line: &str, icon: &str, user: &str) -> LineEdit {
    remove_reaction(line, icon, user, true)
}

/// Apply an action to a line
pub fn apply_action(
    line: &str,
    action: ReactionAction,
    icon: &str,
    user: &str,
    timestamp: Option<&str>,
) -> LineEdit {
    match action {
        ReactionAction::Append => append_reaction(line, icon, user, timestamp),
        ReactionAction::Upvote => upvote_reaction(line, icon, user, timestamp),
        ReactionAction::Downvote => downvote_reaction(line, icon, user),
        ReactionAction::RemoveAll => remove_all_reactions(line, icon, user),
    }
}
