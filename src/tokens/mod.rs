//! Pure utilities over the token model.
//!
//! Everything here is a read-only traversal of a [`TokenView`]. Assignments
//! in the dump always appear as a single `=` token at the AST root of their
//! statement, so the LHS/RHS split is defined by the first `=` in the
//! in-order sequence: the LHS excludes it, the RHS includes it, and both are
//! empty when no `=` exists.

use std::collections::HashSet;

use crate::dump::{TokenId, TokenView, VariableId};
use crate::error::{AnalysisError, Result};

/// In-order traversal of a token tree: `in_order(op1) ++ [t] ++ in_order(op2)`.
///
/// Empty when `token` is absent; a singleton when the token has no operands.
pub fn in_order(view: &TokenView<'_>, token: Option<TokenId>) -> Vec<TokenId> {
    let mut out = Vec::new();
    collect_in_order(view, token, &mut out);
    out
}

fn collect_in_order(view: &TokenView<'_>, token: Option<TokenId>, out: &mut Vec<TokenId>) {
    let Some(id) = token else { return };
    let tok = view.get(id);
    collect_in_order(view, tok.ast_op1, out);
    out.push(id);
    collect_in_order(view, tok.ast_op2, out);
}

/// Variables bound to the given tokens, in token order.
pub fn variables_in(view: &TokenView<'_>, tokens: &[TokenId]) -> Vec<VariableId> {
    tokens.iter().filter_map(|&t| view.get(t).variable).collect()
}

/// Tokens strictly before the first `=`, or empty when there is none.
pub fn lhs_of<'t>(view: &TokenView<'_>, tokens: &'t [TokenId]) -> &'t [TokenId] {
    match tokens.iter().position(|&t| view.text(t) == "=") {
        Some(idx) => &tokens[..idx],
        None => &[],
    }
}

/// Tokens from the first `=` (inclusive) on, or empty when there is none.
pub fn rhs_of<'t>(view: &TokenView<'_>, tokens: &'t [TokenId]) -> &'t [TokenId] {
    match tokens.iter().position(|&t| view.text(t) == "=") {
        Some(idx) => &tokens[idx..],
        None => &[],
    }
}

/// Walk AST parents until none remain.
pub fn root_of(view: &TokenView<'_>, mut token: TokenId) -> TokenId {
    while let Some(parent) = view.get(token).ast_parent {
        token = parent;
    }
    token
}

/// Textual rendering of a token sequence, space-joined.
pub fn tokens_to_text(view: &TokenView<'_>, tokens: &[TokenId]) -> String {
    let parts: Vec<&str> = tokens.iter().map(|&t| view.text(t)).collect();
    parts.join(" ")
}

/// Textual rendering of one statement via its root token.
pub fn statement_text(view: &TokenView<'_>, root: TokenId) -> String {
    tokens_to_text(view, &in_order(view, Some(root)))
}

/// Root tokens of every top-level statement between `start` and `end`,
/// sorted by line number (ties broken by source order).
///
/// Tokens with an AST parent contribute the root of their tree. Bare
/// `break`/`continue`/`return` tokens carry no AST links in the dump and are
/// included as their own roots so jump statements are not lost.
pub fn root_tokens(view: &TokenView<'_>, start: TokenId, end: TokenId) -> Result<Vec<TokenId>> {
    let mut seen = HashSet::new();
    let mut roots = Vec::new();

    let mut cur = view.get(start).next;
    loop {
        let id = cur.ok_or_else(|| {
            AnalysisError::MalformedDump(format!(
                "token walk ran past the end of the list before reaching `{}`",
                view.get(end).ext_id
            ))
        })?;
        if id == end {
            break;
        }
        let tok = view.get(id);
        if tok.ast_parent.is_some() {
            let root = root_of(view, id);
            if seen.insert(root) {
                roots.push(root);
            }
        } else if is_bare_jump(view, id) && seen.insert(id) {
            roots.push(id);
        }
        cur = tok.next;
    }

    roots.sort_by_key(|&t| (view.get(t).line, t));
    Ok(roots)
}

fn is_bare_jump(view: &TokenView<'_>, id: TokenId) -> bool {
    let tok = view.get(id);
    matches!(tok.text.as_str(), "break" | "continue" | "return")
        && tok.ast_op1.is_none()
        && tok.ast_op2.is_none()
}

/// Tokens strictly between `start` and `end` in source order, collected by a
/// `next`-walk. Used for scope membership tests; id comparison against the
/// dump's own id strings is not reliable, the walk is.
pub fn tokens_in_span(
    view: &TokenView<'_>,
    start: TokenId,
    end: TokenId,
) -> Result<HashSet<TokenId>> {
    let mut span = HashSet::new();
    let mut cur = view.get(start).next;
    loop {
        let id = cur.ok_or_else(|| {
            AnalysisError::MalformedDump("scope span walk ran past the end of the list".to_string())
        })?;
        if id == end {
            break;
        }
        span.insert(id);
        cur = view.get(id).next;
    }
    Ok(span)
}
