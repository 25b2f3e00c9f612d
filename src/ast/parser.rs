//! Dump-to-AST lifting.
//!
//! ## Algorithm
//!
//! 1. Collect the function's root tokens (one per top-level statement,
//!    sorted by line) and a deep copy of its scope tree.
//! 2. Repeatedly consume the head root token and dispatch on the text of
//!    its first AST operand: `if`/`while`/`for`/`switch` headers own the
//!    next scope-tree child; anything else is a plain block.
//! 3. Branch bodies are carved out of the root-token queue by scope span
//!    (a `next`-walk from the scope's `{` to its `}`), then parsed
//!    recursively under that scope's subtree.
//! 4. A trailing `break`/`continue` directly inside a scope is appended to
//!    the branch as its own block, since jump tokens carry no AST links.
//! 5. `for` and `switch` are desugared on the spot (see below); the
//!    emitted vocabulary is {block, if, while} only.
//!
//! ## Desugaring
//!
//! `for (I; C; U) B` becomes `I; while (C) { B; U; }`. Note that a
//! `continue` in the body therefore jumps to the `while` header and skips
//! `U`; tests pin this behavior down.
//!
//! `switch` is lowered in two passes: first fall-through is made explicit
//! by extending break-less cases with the following case's body (the last
//! case always terminates), then the chain is rewritten into a
//! right-leaning `if`/`else` over synthesized `==` comparisons of the
//! switch expression against each case label.
//!
//! Scope discipline: every non-root scope must be consumed exactly once;
//! leftovers indicate a malformed dump and fail the whole function.

use std::collections::VecDeque;

use crate::ast::model::{BlockStatement, FunctionDecl, IfStatement, Statement, WhileStatement};
use crate::dump::{Configuration, FunctionInfo, ScopeKind, Token, TokenId};
use crate::error::{AnalysisError, Result};
use crate::scopes::ScopeTree;
use crate::tokens::{root_tokens, tokens_in_span};

/// Converts dump functions into statement trees.
pub struct DumpToAst<'a> {
    config: &'a Configuration,
}

impl<'a> DumpToAst<'a> {
    /// New converter over a configuration.
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Convert a single function.
    pub fn convert(&self, function: &FunctionInfo) -> Result<FunctionDecl> {
        let scope_tree = ScopeTree::build(self.config, function.scope)?;
        let mut working = scope_tree.clone();

        let view = self.config.token_view();
        let mut roots: VecDeque<TokenId> =
            root_tokens(&view, function.start, function.end)?.into();

        let mut parser = Parser { config: self.config, synthetic: Vec::new() };
        let body = parser.parse(&mut roots, &mut working)?;

        if !working.is_empty() {
            return Err(AnalysisError::MalformedDump(format!(
                "function `{}` left {} unconsumed scope(s) after parsing",
                function.name,
                working.len() - 1
            )));
        }

        Ok(FunctionDecl {
            name: function.name.clone(),
            scope: function.scope,
            start: function.start,
            end: function.end,
            scope_tree,
            body,
            synthetic: parser.synthetic,
        })
    }

    /// Convert every function of the configuration, in scope-table order.
    /// Failures are reported per function; successes are unaffected.
    pub fn convert_all(&self) -> Vec<(FunctionInfo, Result<FunctionDecl>)> {
        self.config
            .functions()
            .into_iter()
            .map(|f| {
                let decl = self.convert(&f);
                (f, decl)
            })
            .collect()
    }
}

/// A case of a switch chain, before lowering. Never escapes the parser.
#[derive(Debug, Clone)]
struct SwitchCase {
    /// Label expression token; `None` for `default`.
    match_token: Option<TokenId>,

    /// Statements between this label and the next.
    body: Vec<Statement>,

    /// Whether the case span ends in an explicit terminator.
    has_break: bool,

    /// Whether this is the `default` label.
    is_default: bool,
}

struct Parser<'a> {
    config: &'a Configuration,
    synthetic: Vec<Token>,
}

impl<'a> Parser<'a> {
    fn parse(
        &mut self,
        roots: &mut VecDeque<TokenId>,
        tree: &mut ScopeTree,
    ) -> Result<Vec<Statement>> {
        let mut out = Vec::new();
        while let Some(t) = roots.pop_front() {
            let keyword = {
                let view = self.config.token_view();
                view.get(t).ast_op1.map(|op| view.text(op).to_string())
            };
            match keyword.as_deref() {
                Some("if") => out.push(self.parse_if(t, roots, tree)?),
                Some("while") => out.push(self.parse_while(t, roots, tree)?),
                Some("for") => out.extend(self.parse_for(t, roots, tree)?),
                Some("switch") => out.extend(self.parse_switch(t, roots, tree)?),
                _ => out.push(Statement::Block(BlockStatement { root: t })),
            }
        }
        Ok(out)
    }

    fn parse_if(
        &mut self,
        t: TokenId,
        roots: &mut VecDeque<TokenId>,
        tree: &mut ScopeTree,
    ) -> Result<Statement> {
        let condition = self.header_condition(t, "if")?;
        let mut if_scope = self.pop_scope(tree, ScopeKind::If, "if")?;
        let (start, end) = self.brackets(&if_scope)?;

        let mut true_body = self.parse_branch(roots, &mut if_scope, start, end)?;
        self.append_trailing_terminator(&mut true_body, &if_scope, start, end);

        let mut false_body = Vec::new();
        if tree.first_child_kind(self.config) == Some(ScopeKind::Else) {
            let mut else_scope = tree.pop_first_child().ok_or_else(|| {
                AnalysisError::InvariantFailure("else scope disappeared between peek and pop".into())
            })?;
            let (else_start, else_end) = self.brackets(&else_scope)?;
            false_body = self.parse_branch(roots, &mut else_scope, else_start, else_end)?;
            self.append_trailing_terminator(&mut false_body, &else_scope, else_start, else_end);
        }

        Ok(Statement::If(IfStatement { condition, true_body, false_body }))
    }

    fn parse_while(
        &mut self,
        t: TokenId,
        roots: &mut VecDeque<TokenId>,
        tree: &mut ScopeTree,
    ) -> Result<Statement> {
        let condition = self.header_condition(t, "while")?;
        let mut scope = self.pop_scope(tree, ScopeKind::While, "while")?;
        let (start, end) = self.brackets(&scope)?;

        let mut body = self.parse_branch(roots, &mut scope, start, end)?;
        self.append_trailing_terminator(&mut body, &scope, start, end);

        Ok(Statement::While(WhileStatement { condition, body }))
    }

    /// `for (I; C; U) B` desugars to `I; while (C) { B; U; }`.
    ///
    /// The header token's first operand is the initializer; its second
    /// operand splits into the continuation predicate and the update.
    fn parse_for(
        &mut self,
        t: TokenId,
        roots: &mut VecDeque<TokenId>,
        tree: &mut ScopeTree,
    ) -> Result<Vec<Statement>> {
        let header = self.header_condition(t, "for")?;
        let (init, predicate, update) = {
            let view = self.config.token_view();
            let head = view.get(header);
            let init = head
                .ast_op1
                .ok_or_else(|| malformed_header("for", "initializer"))?;
            let inner = head.ast_op2.ok_or_else(|| malformed_header("for", "condition"))?;
            let inner_tok = view.get(inner);
            let predicate =
                inner_tok.ast_op1.ok_or_else(|| malformed_header("for", "predicate"))?;
            let update = inner_tok.ast_op2.ok_or_else(|| malformed_header("for", "update"))?;
            (init, predicate, update)
        };

        let mut scope = self.pop_scope(tree, ScopeKind::For, "for")?;
        let (start, end) = self.brackets(&scope)?;
        let mut body = self.parse_branch(roots, &mut scope, start, end)?;
        self.append_trailing_terminator(&mut body, &scope, start, end);
        body.push(Statement::Block(BlockStatement { root: update }));

        Ok(vec![
            Statement::Block(BlockStatement { root: init }),
            Statement::While(WhileStatement { condition: predicate, body }),
        ])
    }

    fn parse_switch(
        &mut self,
        t: TokenId,
        roots: &mut VecDeque<TokenId>,
        tree: &mut ScopeTree,
    ) -> Result<Vec<Statement>> {
        let switch_expr = self.header_condition(t, "switch")?;
        let mut scope = self.pop_scope(tree, ScopeKind::Switch, "switch")?;
        let (start, end) = self.brackets(&scope)?;

        let labels = self.switch_labels(&scope, start, end)?;
        if labels.is_empty() {
            return Err(AnalysisError::MalformedDump(
                "switch body contains no case labels".into(),
            ));
        }

        // Carve the switch's root tokens out of the queue, then split them
        // across the labels by source order.
        let span = tokens_in_span(&self.config.token_view(), start, end)?;
        let mut partitions: Vec<VecDeque<TokenId>> = labels.iter().map(|_| VecDeque::new()).collect();
        while let Some(&front) = roots.front() {
            if !span.contains(&front) {
                break;
            }
            roots.pop_front();
            let idx = labels.iter().rposition(|l| l.token < front).ok_or_else(|| {
                AnalysisError::MalformedDump(
                    "switch statement precedes the first case label".into(),
                )
            })?;
            partitions[idx].push_back(front);
        }

        let mut cases = Vec::with_capacity(labels.len());
        for (i, label) in labels.iter().enumerate() {
            let mut partition = std::mem::take(&mut partitions[i]);
            let mut body = self.parse(&mut partition, &mut scope)?;

            let upper = labels.get(i + 1).map(|l| l.token).unwrap_or(end);
            let terminator = self.case_trailing_terminator(&scope, label.token, upper);
            if let Some(term) = terminator {
                if !contains_block(&body, term) {
                    body.push(Statement::Block(BlockStatement { root: term }));
                }
            }

            cases.push(SwitchCase {
                match_token: label.match_token,
                body,
                has_break: terminator.is_some(),
                is_default: label.is_default,
            });
        }

        if !scope.is_empty() {
            return Err(AnalysisError::MalformedDump(
                "switch body left unconsumed scope(s)".into(),
            ));
        }

        add_implicit_breaks(&mut cases);
        self.cases_to_if(&cases, switch_expr, 0)
    }

    /// Enumerate `case`/`default` labels directly nested in the switch
    /// scope. Deeper tokens belong to nested constructs; a nested `switch`
    /// anywhere in the span is rejected.
    fn switch_labels(
        &self,
        scope: &ScopeTree,
        start: TokenId,
        end: TokenId,
    ) -> Result<Vec<SwitchLabel>> {
        let view = self.config.token_view();
        let mut labels = Vec::new();
        let mut cur = view.get(start).next;
        loop {
            let id = cur.ok_or_else(|| {
                AnalysisError::MalformedDump("switch span walk ran past the end".into())
            })?;
            if id == end {
                break;
            }
            let tok = view.get(id);
            if tok.text == "switch" {
                return Err(AnalysisError::UnsupportedConstruct(
                    "switch nested inside a switch body".into(),
                ));
            }
            if tok.scope == scope.id {
                match tok.text.as_str() {
                    "case" => {
                        let match_token = tok.next.ok_or_else(|| {
                            AnalysisError::MalformedDump("case label at end of token list".into())
                        })?;
                        labels.push(SwitchLabel {
                            token: id,
                            match_token: Some(match_token),
                            is_default: false,
                        });
                    }
                    "default" => {
                        labels.push(SwitchLabel { token: id, match_token: None, is_default: true });
                    }
                    _ => {}
                }
            }
            cur = tok.next;
        }
        Ok(labels)
    }

    /// Lower a (break-terminated) case chain into a right-leaning if/else.
    fn cases_to_if(
        &mut self,
        cases: &[SwitchCase],
        switch_expr: TokenId,
        idx: usize,
    ) -> Result<Vec<Statement>> {
        let case = &cases[idx];
        if case.is_default {
            return Ok(self.strip_trailing_break(case.body.clone()));
        }

        let match_token = case.match_token.ok_or_else(|| {
            AnalysisError::InvariantFailure("non-default case without a match token".into())
        })?;
        let condition = self.synthesize_eq(switch_expr, match_token);
        let true_body = self.strip_trailing_break(case.body.clone());
        let false_body = match cases.get(idx + 1) {
            None => Vec::new(),
            Some(next) if next.is_default => self.strip_trailing_break(next.body.clone()),
            Some(_) => self.cases_to_if(cases, switch_expr, idx + 1)?,
        };

        Ok(vec![Statement::If(IfStatement { condition, true_body, false_body })])
    }

    /// Synthesize an `==` token comparing the switch expression against a
    /// case label. The token lives outside the dump, owned by the function.
    fn synthesize_eq(&mut self, op1: TokenId, op2: TokenId) -> TokenId {
        let id = TokenId((self.config.tokens.len() + self.synthetic.len()) as u32);
        let template = self.config.token_view().get(op2);
        let (line, scope) = (template.line, template.scope);
        self.synthetic.push(Token {
            ext_id: format!("synth-eq-{}", self.synthetic.len()),
            text: "==".to_string(),
            line,
            scope,
            ast_parent: None,
            ast_op1: Some(op1),
            ast_op2: Some(op2),
            prev: None,
            next: None,
            variable: None,
            is_arithmetic_op: false,
        });
        id
    }

    /// Pop the root tokens belonging to a scope's span off the queue and
    /// parse them under that scope's subtree, which must end up fully
    /// consumed.
    fn parse_branch(
        &mut self,
        roots: &mut VecDeque<TokenId>,
        scope: &mut ScopeTree,
        start: TokenId,
        end: TokenId,
    ) -> Result<Vec<Statement>> {
        let span = tokens_in_span(&self.config.token_view(), start, end)?;
        let mut branch_roots = VecDeque::new();
        while let Some(&front) = roots.front() {
            if !span.contains(&front) {
                break;
            }
            roots.pop_front();
            branch_roots.push_back(front);
        }

        let body = self.parse(&mut branch_roots, scope)?;
        if !scope.is_empty() {
            return Err(AnalysisError::MalformedDump(format!(
                "scope `{}` left unconsumed child scope(s)",
                self.config.scope(scope.scope).ext_id
            )));
        }
        Ok(body)
    }

    /// Scan backward from the scope's closing token, while still inside the
    /// scope by scope id, for a `break`/`continue` token. The scan crosses
    /// whole statements, so a mid-branch terminator is picked up too; that
    /// is long-standing upstream behavior and tests pin it down.
    fn trailing_terminator(
        &self,
        scope: &ScopeTree,
        start: TokenId,
        end: TokenId,
    ) -> Option<TokenId> {
        let view = self.config.token_view();
        let mut cur = view.get(end).prev;
        while let Some(id) = cur {
            if id == start {
                break;
            }
            let tok = view.get(id);
            if tok.scope != scope.id {
                break;
            }
            if matches!(tok.text.as_str(), "break" | "continue") {
                return Some(id);
            }
            cur = tok.prev;
        }
        None
    }

    /// Same backward scan, bounded to one case's span inside a switch.
    fn case_trailing_terminator(
        &self,
        scope: &ScopeTree,
        label: TokenId,
        upper: TokenId,
    ) -> Option<TokenId> {
        let view = self.config.token_view();
        let mut cur = view.get(upper).prev;
        while let Some(id) = cur {
            if id == label {
                break;
            }
            let tok = view.get(id);
            if tok.scope != scope.id {
                break;
            }
            if matches!(tok.text.as_str(), "break" | "continue") {
                return Some(id);
            }
            cur = tok.prev;
        }
        None
    }

    fn append_trailing_terminator(
        &self,
        body: &mut Vec<Statement>,
        scope: &ScopeTree,
        start: TokenId,
        end: TokenId,
    ) {
        if let Some(term) = self.trailing_terminator(scope, start, end) {
            if !contains_block(body, term) {
                body.push(Statement::Block(BlockStatement { root: term }));
            }
        }
    }

    fn strip_trailing_break(&self, mut body: Vec<Statement>) -> Vec<Statement> {
        let ends_in_break = matches!(
            body.last(),
            Some(Statement::Block(b)) if self.config.token_view().text(b.root) == "break"
        );
        if ends_in_break {
            body.pop();
        }
        body
    }

    fn header_condition(&self, t: TokenId, what: &str) -> Result<TokenId> {
        self.config
            .token_view()
            .get(t)
            .ast_op2
            .ok_or_else(|| malformed_header(what, "condition"))
    }

    fn pop_scope(
        &self,
        tree: &mut ScopeTree,
        expected: ScopeKind,
        what: &str,
    ) -> Result<ScopeTree> {
        let child = tree.pop_first_child().ok_or_else(|| {
            AnalysisError::MalformedDump(format!("no scope left for {what} body"))
        })?;
        let kind = child.kind(self.config);
        if kind != expected {
            return Err(AnalysisError::MalformedDump(format!(
                "expected {expected:?} scope for {what} body, found {kind:?}"
            )));
        }
        Ok(child)
    }

    fn brackets(&self, node: &ScopeTree) -> Result<(TokenId, TokenId)> {
        let scope = self.config.scope(node.scope);
        match (scope.start, scope.end) {
            (Some(start), Some(end)) => Ok((start, end)),
            _ => Err(AnalysisError::MalformedDump(format!(
                "scope `{}` lacks bracket tokens",
                scope.ext_id
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct SwitchLabel {
    token: TokenId,
    match_token: Option<TokenId>,
    is_default: bool,
}

/// The last case always terminates; break-less cases fall through into the
/// following case's body.
fn add_implicit_breaks(cases: &mut [SwitchCase]) {
    if let Some(last) = cases.last_mut() {
        last.has_break = true;
    }
    for i in (0..cases.len().saturating_sub(1)).rev() {
        if !cases[i].has_break {
            let follow = cases[i + 1].body.clone();
            cases[i].body.extend(follow);
            cases[i].has_break = true;
        }
    }
}

fn contains_block(body: &[Statement], token: TokenId) -> bool {
    body.iter().any(|s| matches!(s, Statement::Block(b) if b.root == token))
}

fn malformed_header(what: &str, part: &str) -> AnalysisError {
    AnalysisError::MalformedDump(format!("{what} header is missing its {part}"))
}
