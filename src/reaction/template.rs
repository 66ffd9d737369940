//! Reaction template data: classification, assembly and serialization.
//!
//! Two dialects are read:
//! - indexed: `{{Reaction|icon=👍|user1=A|ts1=...|user2=B}}`
//! - legacy positional: `{{Reaction|👍|A於<timestamp>|B}}`
//!
//! Only the indexed form is ever written.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::scan::split_named;

/// Separators between user and timestamp in legacy bare entries
pub const LEGACY_SEPARATORS: [char; 2] = ['於', '于'];

/// Name written for new and re-serialized templates
pub const CANONICAL_NAME: &str = "Reaction";

/// One user who reacted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionParticipant {
    pub user: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

impl ReactionParticipant {
    pub fn new(user: impl Into<String>, timestamp: Option<String>) -> Self {
        Self {
            user: user.into(),
            timestamp,
        }
    }
}

/// Parsed contents of one reaction template
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionTemplateData {
    pub icon: String,
    pub participants: Vec<ReactionParticipant>,
    /// Unrecognised `key=value` parameters, in original order
    pub extra_params: Vec<(String, String)>,
}

/// Classification of a single raw parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParamKind {
    Icon { value: String, positional: bool },
    User { index: usize, value: String },
    Timestamp { index: usize, value: String },
    Legacy { user: String, timestamp: Option<String> },
    Extra { key: String, value: String },
}

/// Index in `userN` / `tsN` style keys; a bare prefix means 1
fn indexed_key(key: &str, prefixes: &[&str]) -> Option<usize> {
    prefixes.iter().find_map(|prefix| {
        let rest = key.strip_prefix(prefix)?;
        if rest.is_empty() {
            return Some(1);
        }
        if !rest.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        rest.parse::<usize>().ok().filter(|&n| n >= 1)
    })
}

/// Split a legacy bare entry into user and optional timestamp
fn split_legacy(value: &str) -> (String, Option<String>) {
    match value.find(|c: char| LEGACY_SEPARATORS.contains(&c)) {
        Some(pos) => {
            let sep_len = value[pos..].chars().next().map(char::len_utf8).unwrap_or(0);
            let timestamp = value[pos + sep_len..].trim();
            (
                value[..pos].trim().to_string(),
                (!timestamp.is_empty()).then(|| timestamp.to_string()),
            )
        }
        None => (value.trim().to_string(), None),
    }
}

/// First pass: classify every raw parameter independently of the others
///
/// The only cross-parameter state is whether the first parameter was a
/// positional icon. If so, numbered keys shift down by one, `1=` overrides the
/// icon, and a later `icon=` is kept as an extra parameter.
pub fn classify_params(params: &[&str]) -> Vec<ParamKind> {
    let mut kinds = Vec::new();
    let mut icon_positional = false;

    for (i, raw) in params.iter().enumerate() {
        let Some((key, value)) = split_named(raw) else {
            let value = raw.trim();
            if i == 0 {
                icon_positional = true;
                kinds.push(ParamKind::Icon {
                    value: value.to_string(),
                    positional: true,
                });
            } else if !value.is_empty() {
                let (user, timestamp) = split_legacy(value);
                if !user.is_empty() {
                    kinds.push(ParamKind::Legacy { user, timestamp });
                }
            }
            continue;
        };

        let key = key.trim();
        let value = value.trim().to_string();

        let kind = if key == "icon" && icon_positional {
            // The first parameter already holds the icon
            ParamKind::Extra {
                key: key.to_string(),
                value,
            }
        } else if key == "icon" {
            ParamKind::Icon {
                value,
                positional: false,
            }
        } else if let Some(index) = indexed_key(key, &["user"]) {
            ParamKind::User { index, value }
        } else if let Some(index) = indexed_key(key, &["timestamp", "ts"]) {
            ParamKind::Timestamp { index, value }
        } else if let Some(n) = key.parse::<usize>().ok().filter(|_| key.bytes().all(|b| b.is_ascii_digit())) {
            let index = if icon_positional { n.saturating_sub(1) } else { n };
            if index == 0 && icon_positional && n == 1 {
                // `1=` names the first positional parameter, which is the icon
                ParamKind::Icon {
                    value,
                    positional: true,
                }
            } else if index == 0 {
                ParamKind::Extra {
                    key: key.to_string(),
                    value,
                }
            } else {
                ParamKind::User { index, value }
            }
        } else {
            ParamKind::Extra {
                key: key.to_string(),
                value,
            }
        };
        kinds.push(kind);
    }

    kinds
}

/// Second pass: build template data from classified parameters
///
/// Explicitly indexed users and timestamps are placed first; legacy entries
/// then take the lowest index with no user yet, in the order written.
pub fn assemble(kinds: Vec<ParamKind>) -> ReactionTemplateData {
    let mut positional_icon = None;
    let mut named_icon = None;
    let mut users: BTreeMap<usize, String> = BTreeMap::new();
    let mut stamps: BTreeMap<usize, String> = BTreeMap::new();
    let mut legacy = Vec::new();
    let mut extra_params = Vec::new();

    for kind in kinds {
        match kind {
            ParamKind::Icon { value, positional: true } => positional_icon = Some(value),
            ParamKind::Icon { value, positional: false } => {
                if named_icon.is_none() {
                    named_icon = Some(value);
                } else {
                    extra_params.push(("icon".to_string(), value));
                }
            }
            ParamKind::User { index, value } if !value.is_empty() => {
                users.insert(index, value);
            }
            ParamKind::Timestamp { index, value } if !value.is_empty() => {
                stamps.insert(index, value);
            }
            ParamKind::User { .. } | ParamKind::Timestamp { .. } => {}
            ParamKind::Legacy { user, timestamp } => legacy.push((user, timestamp)),
            ParamKind::Extra { key, value } => extra_params.push((key, value)),
        }
    }

    let mut next = 1;
    for (user, timestamp) in legacy {
        while users.contains_key(&next) {
            next += 1;
        }
        users.insert(next, user);
        if let Some(ts) = timestamp {
            stamps.entry(next).or_insert(ts);
        }
    }

    let indices: BTreeSet<usize> = users.keys().chain(stamps.keys()).copied().collect();
    let participants = indices
        .into_iter()
        // A timestamp with no user is dropped
        .filter_map(|i| {
            let user = users.remove(&i)?;
            Some(ReactionParticipant::new(user, stamps.remove(&i)))
        })
        .collect();

    ReactionTemplateData {
        icon: positional_icon.or(named_icon).unwrap_or_default(),
        participants,
        extra_params,
    }
}

/// Parse the parameters of a reaction template (name already removed)
pub fn parse_params(params: &[&str]) -> ReactionTemplateData {
    assemble(classify_params(params))
}

/// Canonical text: icon, extra parameters, then participants numbered from 1
pub fn serialize_reaction_template(data: &ReactionTemplateData) -> String {
    let mut out = format!("{{{{{}|icon={}", CANONICAL_NAME, data.icon);
    for (key, value) in &data.extra_params {
        out.push_str(&format!("|{}={}", key, value));
    }
    for (i, participant) in data.participants.iter().enumerate() {
        out.push_str(&format!("|user{}={}", i + 1, participant.user));
        if let Some(ts) = &participant.timestamp {
            out.push_str(&format!("|ts{}={}", i + 1, ts));
        }
    }
    out.push_str("}}");
    out
}

impl ReactionTemplateData {
    pub fn new(icon: impl Into<String>) -> Self {
        Self {
            icon: icon.into(),
            ..Default::default()
        }
    }

    /// Render as canonical wikitext
    pub fn to_wikitext(&self) -> String {
        serialize_reaction_template(self)
    }

    /// Whether this template is for `icon` (trimmed exact comparison)
    pub fn has_icon(&self, icon: &str) -> bool {
        self.icon.trim() == icon.trim()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reaction::scan::split_params;

    #[test]
    fn test_classify_kinds() {
        let kinds = classify_params(&["👍", "A於12:00", "user3=C", "ts3=t", "2=B", "note=x"]);
        assert_eq!(
            kinds,
            vec![
                ParamKind::Icon { value: "👍".into(), positional: true },
                ParamKind::Legacy { user: "A".into(), timestamp: Some("12:00".into()) },
                ParamKind::User { index: 3, value: "C".into() },
                ParamKind::Timestamp { index: 3, value: "t".into() },
                ParamKind::User { index: 1, value: "B".into() },
                ParamKind::Extra { key: "note".into(), value: "x".into() },
            ]
        );
    }

    #[test]
    fn test_numbered_positional_without_positional_icon() {
        let kinds = classify_params(&["icon=👍", "1=A"]);
        assert_eq!(kinds[1], ParamKind::User { index: 1, value: "A".into() });
    }

    #[test]
    fn test_timestamp_key_variants() {
        let kinds = classify_params(&["icon=x", "ts=a", "timestamp2=b", "ts10=c", "tsx=d"]);
        assert_eq!(kinds[1], ParamKind::Timestamp { index: 1, value: "a".into() });
        assert_eq!(kinds[2], ParamKind::Timestamp { index: 2, value: "b".into() });
        assert_eq!(kinds[3], ParamKind::Timestamp { index: 10, value: "c".into() });
        assert_eq!(kinds[4], ParamKind::Extra { key: "tsx".into(), value: "d".into() });
    }

    #[test]
    fn test_legacy_entries_fill_unused_indices() {
        let data = parse_params(&["👍", "user1=A", "B于10:00, 1 Jan 2024 (UTC)", "C"]);
        assert_eq!(data.icon, "👍");
        assert_eq!(
            data.participants,
            vec![
                ReactionParticipant::new("A", None),
                ReactionParticipant::new("B", Some("10:00, 1 Jan 2024 (UTC)".into())),
                ReactionParticipant::new("C", None),
            ]
        );
    }

    #[test]
    fn test_legacy_user_takes_bare_ts() {
        let data = parse_params(&["👍", "Example", "ts=12:30, 31 Dec 2025 (UTC)"]);
        assert_eq!(
            data.participants,
            vec![ReactionParticipant::new("Example", Some("12:30, 31 Dec 2025 (UTC)".into()))]
        );
    }

    #[test]
    fn test_later_named_icon_satisfies_icon_role() {
        let data = parse_params(&["user1=A", "icon=🎉"]);
        assert_eq!(data.icon, "🎉");
        assert_eq!(data.participants.len(), 1);
    }

    #[test]
    fn test_orphan_timestamp_dropped() {
        let data = parse_params(&["icon=👍", "user2=B", "ts1=lonely"]);
        assert_eq!(data.participants, vec![ReactionParticipant::new("B", None)]);
    }

    #[test]
    fn test_serialize_renumbers_and_keeps_extras() {
        let data = parse_params(&["icon=👍", "user5=A", "ts5=t5", "color=red", "user9=B"]);
        assert_eq!(
            serialize_reaction_template(&data),
            "{{Reaction|icon=👍|color=red|user1=A|ts1=t5|user2=B}}"
        );
    }

    #[test]
    fn test_has_icon_trims() {
        let data = ReactionTemplateData::new(" 👍 ");
        assert!(data.has_icon("👍"));
        assert!(!data.has_icon("👎"));
    }

    #[test]
    fn test_numbered_one_overrides_positional_icon() {
        let data = parse_params(&["👍", "1=🎉", "user1=A"]);
        assert_eq!(data.icon, "🎉");
        assert!(data.extra_params.is_empty());
        assert_eq!(data.participants, vec![ReactionParticipant::new("A", None)]);
    }

    #[test]
    fn test_positional_icon_wins_over_later_named_icon() {
        let data = parse_params(&["👍", "user1=A", "icon=🎉"]);
        assert_eq!(data.icon, "👍");
        assert_eq!(data.extra_params, vec![("icon".to_string(), "🎉".to_string())]);

        // Written back, the second icon stays an extra parameter
        let text = serialize_reaction_template(&data);
        let reparsed = parse_params(&split_params(&text[2..text.len() - 2])[1..]);
        assert_eq!(reparsed.icon, "👍");
        assert_eq!(reparsed.extra_params, data.extra_params);
    }
}
