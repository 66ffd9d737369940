//! Depth-aware scanning of template invocations on a line.
//!
//! A single forward pass with two depth counters, one for `{{`/`}}` and one
//! for `[[`/`]]`. Nested templates and links inside a parameter never end the
//! outer template or split its parameters.

use serde::Serialize;

use super::template::{parse_params, ReactionTemplateData};

/// Template names recognised as reactions (compared case-insensitively)
pub const TEMPLATE_NAMES: [&str; 2] = ["react", "reaction"];

/// A reaction template found on a line
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReactionTemplate {
    /// Byte offset of the opening `{{`
    pub start: usize,
    /// Byte offset just past the closing `}}`
    pub end: usize,
    /// The invocation as written
    pub raw: String,
    /// Parsed parameters
    pub data: ReactionTemplateData,
}

/// Offset just past the `}}` closing the template opened at `start`
fn matching_close(text: &str, start: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = start;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'{', b'{') => {
                depth += 1;
                i += 2;
            }
            (b'}', b'}') => {
                depth = depth.saturating_sub(1);
                i += 2;
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => i += 1,
        }
    }
    None
}

/// Split template contents on `|` at zero brace and bracket depth
///
/// The first piece is the template name.
pub fn split_params(inner: &str) -> Vec<&str> {
    let bytes = inner.as_bytes();
    let mut pieces = Vec::new();
    let mut braces = 0usize;
    let mut brackets = 0usize;
    let mut piece_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        let pair = bytes.get(i + 1).map(|&next| (bytes[i], next));
        match pair {
            Some((b'{', b'{')) => {
                braces += 1;
                i += 2;
                continue;
            }
            Some((b'}', b'}')) if braces > 0 => {
                braces -= 1;
                i += 2;
                continue;
            }
            Some((b'[', b'[')) => {
                brackets += 1;
                i += 2;
                continue;
            }
            Some((b']', b']')) if brackets > 0 => {
                brackets -= 1;
                i += 2;
                continue;
            }
            _ => {}
        }
        if bytes[i] == b'|' && braces == 0 && brackets == 0 {
            pieces.push(&inner[piece_start..i]);
            piece_start = i + 1;
        }
        i += 1;
    }
    pieces.push(&inner[piece_start..]);
    pieces
}

/// Split `key=value` on the first `=` at zero depth
pub fn split_named(param: &str) -> Option<(&str, &str)> {
    let bytes = param.as_bytes();
    let mut depth = 0isize;
    let mut i = 0;
    while i < bytes.len() {
        let pair = bytes.get(i + 1).map(|&next| (bytes[i], next));
        match pair {
            Some((b'{', b'{')) | Some((b'[', b'[')) => {
                depth += 1;
                i += 2;
                continue;
            }
            Some((b'}', b'}')) | Some((b']', b']')) => {
                depth -= 1;
                i += 2;
                continue;
            }
            _ => {}
        }
        if bytes[i] == b'=' && depth <= 0 {
            return Some((&param[..i], &param[i + 1..]));
        }
        i += 1;
    }
    None
}

/// Whether a template name refers to the reaction template
pub fn is_reaction_name(name: &str) -> bool {
    let name = name.trim();
    TEMPLATE_NAMES.iter().any(|n| name.eq_ignore_ascii_case(n))
}

/// All reaction templates on a line, in order
pub fn find_reaction_templates(line: &str) -> Vec<ReactionTemplate> {
    let mut found = Vec::new();
    let mut from = 0;

    while let Some(rel) = line[from..].find("{{") {
        let start = from + rel;
        let Some(end) = matching_close(line, start) else {
            // Unclosed: nothing after this can close a template either
            break;
        };

        let inner = &line[start + 2..end - 2];
        let params = split_params(inner);
        if is_reaction_name(params[0]) {
            found.push(ReactionTemplate {
                start,
                end,
                raw: line[start..end].to_string(),
                data: parse_params(&params[1..]),
            });
            from = end;
        } else {
            // Reaction templates nested inside another template are still found
            from = start + 2;
        }
    }

    found
}
