//! Identifier safety classifier.
//!
//! Decides, per distinct identifier name, whether every occurrence is safe to
//! rename. The decision is whole-name and conservative: a single occurrence
//! in a protecting context (member access, method-call sugar, bare table key)
//! protects the name for the entire run.

use std::collections::HashSet;

use tracing::debug;

use crate::names;
use crate::token::{next_significant, prev_significant, Token, TokenKind};

/// Result of a classification pass. The two sets are disjoint.
#[derive(Debug, Default)]
pub struct Classification {
    pub protected: HashSet<String>,
    pub renameable: HashSet<String>,
}

/// Classify every identifier in the stream. Context neighbors skip
/// whitespace and comment tokens.
pub fn classify(tokens: &[Token]) -> Classification {
    let mut protected: HashSet<String> = HashSet::new();
    let mut candidates: HashSet<String> = HashSet::new();

    for (i, token) in tokens.iter().enumerate() {
        if token.kind != TokenKind::Identifier {
            continue;
        }
        if occurrence_is_protected(tokens, i) {
            protected.insert(token.text.clone());
        } else {
            candidates.insert(token.text.clone());
        }
    }

    // Whole-name decision: any protected occurrence wins.
    let renameable: HashSet<String> = candidates
        .into_iter()
        .filter(|name| !protected.contains(name))
        .collect();

    debug!(
        protected = protected.len(),
        renameable = renameable.len(),
        "classified identifiers"
    );

    Classification {
        protected,
        renameable,
    }
}

/// Rules 1-4, first match wins; rule 5 (renameable) is the fallthrough.
fn occurrence_is_protected(tokens: &[Token], index: usize) -> bool {
    let name = tokens[index].text.as_str();

    // Rule 1: fixed keyword or builtin/global membership.
    if names::is_keyword(name) || names::is_builtin(name) {
        return true;
    }

    let prev = prev_significant(tokens, index).map(|i| tokens[i].text.as_str());
    let next = next_significant(tokens, index).map(|i| tokens[i].text.as_str());

    // Rule 2: member or method name after `.`/`:`.
    if matches!(prev, Some(".") | Some(":")) {
        return true;
    }

    // Rule 3: receiver of method-call sugar.
    if next == Some(":") {
        return true;
    }

    // Rule 4: bare key in table-constructor position, `{Name = v}` or
    // `{..., Name = v}`.
    if next == Some("=") && matches!(prev, Some(",") | Some("{")) {
        return true;
    }

    false
}

/// Per-occurrence recheck used when a substitution is applied: never after
/// `.`/`:`, never before `:`. Kept as an explicit guard on top of the
/// whole-name decision.
pub fn occurrence_is_safe(tokens: &[Token], index: usize) -> bool {
    let prev = prev_significant(tokens, index).map(|i| tokens[i].text.as_str());
    let next = next_significant(tokens, index).map(|i| tokens[i].text.as_str());
    !matches!(prev, Some(".") | Some(":")) && next != Some(":")
}
