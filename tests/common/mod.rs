//! Shared test fixtures.
//!
//! [`FunctionFixture`] assembles dump configurations for a single function
//! the same way the front-end emits them: tokens in source order with AST
//! links, bracketed scopes in declaration order (including the Else/Try
//! twin records), and a variable table. Tests describe programs
//! statement-by-statement instead of shipping dump files.

#![allow(dead_code)]

use std::collections::HashMap;

use physfix::analysis::{analyze_function, FunctionAnalysis};
use physfix::cfg::{CfgNodeId, CfgNodeKind, FunctionCfg};
use physfix::dump::{
    Configuration, ConfigurationBuilder, RawScope, RawToken, RawVariable, ScopeKind, TokenId,
};
use physfix::tokens::statement_text;

struct VarRecord {
    name: String,
    id: String,
    first_token: Option<String>,
    is_argument: bool,
}

struct OpenScope {
    scope_id: String,
    end_id: String,
}

/// Builds the dump configuration of one function.
pub struct FunctionFixture {
    builder: ConfigurationBuilder,
    next_token: u32,
    next_scope: u32,
    line: u32,
    scope_stack: Vec<String>,
    open: Vec<OpenScope>,
    vars: Vec<VarRecord>,
    var_index: HashMap<String, usize>,
    fn_scope: String,
    fn_open: String,
    fn_end: String,
}

impl FunctionFixture {
    /// A function with no arguments.
    pub fn new(name: &str) -> Self {
        Self::with_args(name, &[])
    }

    /// A function with the given argument names.
    pub fn with_args(name: &str, args: &[&str]) -> Self {
        let mut fixture = Self {
            builder: ConfigurationBuilder::new(),
            next_token: 0,
            next_scope: 2,
            line: 1,
            scope_stack: vec!["s1".to_string()],
            open: Vec::new(),
            vars: Vec::new(),
            var_index: HashMap::new(),
            fn_scope: "s1".to_string(),
            fn_open: String::new(),
            fn_end: String::new(),
        };
        fixture.builder.scope(RawScope::new("s0", ScopeKind::Global));

        // Argument name tokens sit in the signature, before the body.
        for arg in args {
            let id = fixture.next_token_id();
            let var_id = fixture.var_id(arg);
            fixture.mark_argument(arg);
            fixture.note_first_token(arg, &id);
            fixture.builder.token(RawToken::new(&id, arg, 1, "s0").variable(&var_id));
        }

        fixture.fn_open = fixture.next_token_id();
        fixture.fn_end = fixture.next_token_id();
        fixture.builder.scope(
            RawScope::new("s1", ScopeKind::Function)
                .named(name)
                .nested_in("s0")
                .brackets(&fixture.fn_open, &fixture.fn_end),
        );
        let open = fixture.fn_open.clone();
        fixture.push_plain_with_id(&open, "{");
        fixture.line += 1;
        fixture
    }

    /// Finish the function and resolve the configuration.
    pub fn finish(mut self) -> Configuration {
        let end = self.fn_end.clone();
        let scope = self.fn_scope.clone();
        let line = self.line;
        self.builder.token(RawToken::new(&end, "}", line, &scope));

        for var in &self.vars {
            let name_token = var
                .first_token
                .as_deref()
                .unwrap_or_else(|| panic!("variable `{}` was never used", var.name));
            let mut raw = RawVariable::new(&var.id, name_token, &self.fn_scope);
            if var.is_argument {
                raw = raw.argument();
            }
            self.builder.variable(raw);
        }

        self.builder.finish().expect("fixture configuration must resolve")
    }

    // ------------------------------------------------------------------
    // Statements
    // ------------------------------------------------------------------

    /// `lhs = rhs ;` where `rhs` is `[atom]` or `[a, op, b]`.
    /// Atoms starting with a letter are variables, anything else constants.
    pub fn assign(&mut self, lhs: &str, rhs: &[&str]) {
        match rhs {
            [atom] => {
                let lhs_id = self.next_token_id();
                let eq_id = self.next_token_id();
                let atom_id = self.next_token_id();
                self.push_operand_with_id(&lhs_id, lhs, &eq_id);
                self.push_linked(&eq_id, "=", Some(lhs_id.as_str()), Some(atom_id.as_str()), None, false);
                self.push_operand_with_id(&atom_id, atom, &eq_id);
            }
            [a, op, b] => {
                let lhs_id = self.next_token_id();
                let eq_id = self.next_token_id();
                let a_id = self.next_token_id();
                let op_id = self.next_token_id();
                let b_id = self.next_token_id();
                self.push_operand_with_id(&lhs_id, lhs, &eq_id);
                self.push_linked(&eq_id, "=", Some(lhs_id.as_str()), Some(op_id.as_str()), None, false);
                self.push_operand_with_id(&a_id, a, &op_id);
                self.push_linked(&op_id, op, Some(a_id.as_str()), Some(b_id.as_str()), Some(eq_id.as_str()), true);
                self.push_operand_with_id(&b_id, b, &op_id);
            }
            _ => panic!("assign expects [atom] or [a, op, b]"),
        }
        self.push_plain(";");
        self.line += 1;
    }

    /// `var op rhs ;` for compound assignments like `x += 1 ;`.
    pub fn compound_assign(&mut self, var: &str, op: &str, rhs: &str) {
        let var_id = self.next_token_id();
        let op_id = self.next_token_id();
        let rhs_id = self.next_token_id();
        self.push_operand_with_id(&var_id, var, &op_id);
        self.push_linked(&op_id, op, Some(var_id.as_str()), Some(rhs_id.as_str()), None, false);
        self.push_operand_with_id(&rhs_id, rhs, &op_id);
        self.push_plain(";");
        self.line += 1;
    }

    /// `var ++ ;`
    pub fn incr(&mut self, var: &str) {
        let var_id = self.next_token_id();
        let op_id = self.next_token_id();
        self.push_operand_with_id(&var_id, var, &op_id);
        self.push_linked(&op_id, "++", Some(var_id.as_str()), None, None, false);
        self.push_plain(";");
        self.line += 1;
    }

    /// `break ;`
    pub fn stmt_break(&mut self) {
        self.push_plain("break");
        self.push_plain(";");
        self.line += 1;
    }

    /// `continue ;`
    pub fn stmt_continue(&mut self) {
        self.push_plain("continue");
        self.push_plain(";");
        self.line += 1;
    }

    /// `return ;` or `return atom ;`
    pub fn stmt_return(&mut self, value: Option<&str>) {
        match value {
            None => {
                self.push_plain("return");
            }
            Some(atom) => {
                let ret_id = self.next_token_id();
                let atom_id = self.next_token_id();
                self.push_linked(&ret_id, "return", Some(atom_id.as_str()), None, None, false);
                self.push_operand_with_id(&atom_id, atom, &ret_id);
            }
        }
        self.push_plain(";");
        self.line += 1;
    }

    // ------------------------------------------------------------------
    // Control flow
    // ------------------------------------------------------------------

    /// `if ( a op b ) {`
    pub fn begin_if(&mut self, cond: &[&str]) {
        self.control_header("if", cond);
        self.open_scope(ScopeKind::If);
        self.line += 1;
    }

    /// Close an `if` body.
    pub fn end_if(&mut self) {
        self.close_scope();
    }

    /// `else {` — emits the Else record plus its vestigial Try twin, with
    /// body tokens carried by the twin, exactly like the front-end.
    pub fn begin_else(&mut self) {
        self.push_plain("else");
        let else_scope = self.next_scope_id();
        let try_scope = self.next_scope_id();
        let open_id = self.next_token_id();
        let end_id = self.next_token_id();
        let parent = self.current_scope().to_string();

        self.builder.scope(
            RawScope::new(&else_scope, ScopeKind::Else)
                .nested_in(&parent)
                .brackets(&open_id, &end_id),
        );
        self.builder.scope(
            RawScope::new(&try_scope, ScopeKind::Try)
                .nested_in(&parent)
                .brackets(&open_id, &end_id),
        );

        self.scope_stack.push(try_scope.clone());
        self.push_plain_with_id(&open_id, "{");
        self.open.push(OpenScope { scope_id: try_scope, end_id });
        self.line += 1;
    }

    /// Close an `else` body.
    pub fn end_else(&mut self) {
        self.close_scope();
    }

    /// `while ( a op b ) {`
    pub fn begin_while(&mut self, cond: &[&str]) {
        self.control_header("while", cond);
        self.open_scope(ScopeKind::While);
        self.line += 1;
    }

    /// Close a `while` body.
    pub fn end_while(&mut self) {
        self.close_scope();
    }

    /// `for ( var = init ; a op b ; update ++ ) {`
    pub fn begin_for(&mut self, var: &str, init: &str, cond: &[&str], update: &str) {
        let [a, op, b] = cond else { panic!("for condition expects [a, op, b]") };

        let kw_id = self.next_token_id();
        let paren_id = self.next_token_id();
        let init_var_id = self.next_token_id();
        let eq_id = self.next_token_id();
        let init_val_id = self.next_token_id();
        let semi1_id = self.next_token_id();
        let a_id = self.next_token_id();
        let cmp_id = self.next_token_id();
        let b_id = self.next_token_id();
        let semi2_id = self.next_token_id();
        let upd_var_id = self.next_token_id();
        let upd_op_id = self.next_token_id();

        self.push_linked(&kw_id, "for", None, None, Some(paren_id.as_str()), false);
        self.push_linked(&paren_id, "(", Some(kw_id.as_str()), Some(semi1_id.as_str()), None, false);
        self.push_operand_with_id(&init_var_id, var, &eq_id);
        self.push_linked(&eq_id, "=", Some(init_var_id.as_str()), Some(init_val_id.as_str()), Some(semi1_id.as_str()), false);
        self.push_operand_with_id(&init_val_id, init, &eq_id);
        self.push_linked(&semi1_id, ";", Some(eq_id.as_str()), Some(semi2_id.as_str()), Some(paren_id.as_str()), false);
        self.push_operand_with_id(&a_id, a, &cmp_id);
        self.push_linked(&cmp_id, op, Some(a_id.as_str()), Some(b_id.as_str()), Some(semi2_id.as_str()), false);
        self.push_operand_with_id(&b_id, b, &cmp_id);
        self.push_linked(&semi2_id, ";", Some(cmp_id.as_str()), Some(upd_op_id.as_str()), Some(semi1_id.as_str()), false);
        self.push_operand_with_id(&upd_var_id, update, &upd_op_id);
        self.push_linked(&upd_op_id, "++", Some(upd_var_id.as_str()), None, Some(semi2_id.as_str()), false);
        self.push_plain(")");

        self.open_scope(ScopeKind::For);
        self.line += 1;
    }

    /// Close a `for` body.
    pub fn end_for(&mut self) {
        self.close_scope();
    }

    /// `switch ( var ) {`
    pub fn begin_switch(&mut self, var: &str) {
        let kw_id = self.next_token_id();
        let paren_id = self.next_token_id();
        let var_id = self.next_token_id();
        self.push_linked(&kw_id, "switch", None, None, Some(paren_id.as_str()), false);
        self.push_linked(&paren_id, "(", Some(kw_id.as_str()), Some(var_id.as_str()), None, false);
        self.push_operand_with_id(&var_id, var, &paren_id);
        self.push_plain(")");
        self.open_scope(ScopeKind::Switch);
        self.line += 1;
    }

    /// `case value :`
    pub fn case(&mut self, value: &str) {
        self.push_plain("case");
        self.push_plain(value);
        self.push_plain(":");
        self.line += 1;
    }

    /// `default :`
    pub fn default_case(&mut self) {
        self.push_plain("default");
        self.push_plain(":");
        self.line += 1;
    }

    /// Close a `switch` body.
    pub fn end_switch(&mut self) {
        self.close_scope();
    }

    /// Register a scope record that no statement will ever consume.
    pub fn phantom_scope(&mut self, kind: ScopeKind) {
        let id = self.next_scope_id();
        let parent = self.current_scope().to_string();
        let (open, end) = (self.fn_open.clone(), self.fn_end.clone());
        self.builder.scope(RawScope::new(&id, kind).nested_in(&parent).brackets(&open, &end));
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn control_header(&mut self, keyword: &str, cond: &[&str]) {
        let [a, op, b] = cond else { panic!("condition expects [a, op, b]") };
        let kw_id = self.next_token_id();
        let paren_id = self.next_token_id();
        let a_id = self.next_token_id();
        let op_id = self.next_token_id();
        let b_id = self.next_token_id();

        self.push_linked(&kw_id, keyword, None, None, Some(paren_id.as_str()), false);
        self.push_linked(&paren_id, "(", Some(kw_id.as_str()), Some(op_id.as_str()), None, false);
        self.push_operand_with_id(&a_id, a, &op_id);
        self.push_linked(&op_id, op, Some(a_id.as_str()), Some(b_id.as_str()), Some(paren_id.as_str()), false);
        self.push_operand_with_id(&b_id, b, &op_id);
        self.push_plain(")");
    }

    fn open_scope(&mut self, kind: ScopeKind) {
        let scope_id = self.next_scope_id();
        let open_id = self.next_token_id();
        let end_id = self.next_token_id();
        let parent = self.current_scope().to_string();
        self.builder
            .scope(RawScope::new(&scope_id, kind).nested_in(&parent).brackets(&open_id, &end_id));
        self.scope_stack.push(scope_id.clone());
        self.push_plain_with_id(&open_id, "{");
        self.open.push(OpenScope { scope_id, end_id });
    }

    fn close_scope(&mut self) {
        let open = self.open.pop().expect("no open scope to close");
        let line = self.line;
        self.builder.token(RawToken::new(&open.end_id, "}", line, &open.scope_id));
        self.scope_stack.pop();
        self.line += 1;
    }

    fn current_scope(&self) -> &str {
        self.scope_stack.last().expect("scope stack is never empty")
    }

    fn next_token_id(&mut self) -> String {
        let id = format!("t{}", self.next_token);
        self.next_token += 1;
        id
    }

    fn next_scope_id(&mut self) -> String {
        let id = format!("s{}", self.next_scope);
        self.next_scope += 1;
        id
    }

    fn var_id(&mut self, name: &str) -> String {
        if let Some(&idx) = self.var_index.get(name) {
            return self.vars[idx].id.clone();
        }
        let id = format!("v{}", self.vars.len());
        self.var_index.insert(name.to_string(), self.vars.len());
        self.vars.push(VarRecord {
            name: name.to_string(),
            id: id.clone(),
            first_token: None,
            is_argument: false,
        });
        id
    }

    fn mark_argument(&mut self, name: &str) {
        let _ = self.var_id(name);
        let idx = self.var_index[name];
        self.vars[idx].is_argument = true;
    }

    fn note_first_token(&mut self, name: &str, token: &str) {
        let idx = self.var_index[name];
        if self.vars[idx].first_token.is_none() {
            self.vars[idx].first_token = Some(token.to_string());
        }
    }

    fn is_variable_atom(atom: &str) -> bool {
        atom.chars().next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_')
    }

    fn push_operand_with_id(&mut self, id: &str, atom: &str, parent: &str) {
        let line = self.line;
        let scope = self.current_scope().to_string();
        let mut token = RawToken::new(id, atom, line, &scope).parent(parent);
        if Self::is_variable_atom(atom) {
            let var_id = self.var_id(atom);
            self.note_first_token(atom, id);
            token = token.variable(&var_id);
        }
        self.builder.token(token);
    }

    fn push_linked(
        &mut self,
        id: &str,
        text: &str,
        op1: Option<&str>,
        op2: Option<&str>,
        parent: Option<&str>,
        arithmetic: bool,
    ) {
        let line = self.line;
        let scope = self.current_scope().to_string();
        let mut token = RawToken::new(id, text, line, &scope);
        if let Some(op1) = op1 {
            token = token.op1(op1);
        }
        if let Some(op2) = op2 {
            token = token.op2(op2);
        }
        if let Some(parent) = parent {
            token = token.parent(parent);
        }
        if arithmetic {
            token = token.arithmetic();
        }
        self.builder.token(token);
    }

    fn push_plain(&mut self, text: &str) {
        let id = self.next_token_id();
        self.push_plain_with_id(&id, text);
    }

    fn push_plain_with_id(&mut self, id: &str, text: &str) {
        let line = self.line;
        let scope = self.current_scope().to_string();
        self.builder.token(RawToken::new(id, text, line, &scope));
    }
}

// ----------------------------------------------------------------------
// Analysis helpers
// ----------------------------------------------------------------------

/// Analyze the configuration's first function, panicking on failure.
pub fn analyze_first(config: &Configuration) -> FunctionAnalysis {
    try_analyze_first(config).expect("analysis should succeed")
}

/// Analyze the configuration's first function.
pub fn try_analyze_first(config: &Configuration) -> physfix::Result<FunctionAnalysis> {
    let function = config.functions().into_iter().next().expect("fixture has a function");
    analyze_function(config, &function)
}

/// Reachable node ids of a given kind predicate.
pub fn reachable_where(
    cfg: &FunctionCfg,
    predicate: impl Fn(&CfgNodeKind) -> bool,
) -> Vec<CfgNodeId> {
    cfg.reachable.iter().copied().filter(|&id| predicate(&cfg.node(id).kind)).collect()
}

/// Reachable basic blocks, in BFS order.
pub fn basic_blocks(cfg: &FunctionCfg) -> Vec<CfgNodeId> {
    reachable_where(cfg, |k| matches!(k, CfgNodeKind::Basic { .. }))
}

/// Statement text of a basic block.
pub fn block_text(config: &Configuration, analysis: &FunctionAnalysis, id: CfgNodeId) -> String {
    let view = config.token_view_with(&analysis.decl.synthetic);
    match &analysis.cfg.node(id).kind {
        CfgNodeKind::Basic { token } => statement_text(&view, *token),
        CfgNodeKind::Conditional { condition, .. } => statement_text(&view, *condition),
        other => panic!("node has no statement: {other:?}"),
    }
}

/// Find the reachable basic block with the given statement text.
pub fn find_block(
    config: &Configuration,
    analysis: &FunctionAnalysis,
    text: &str,
) -> CfgNodeId {
    basic_blocks(&analysis.cfg)
        .into_iter()
        .find(|&id| block_text(config, analysis, id) == text)
        .unwrap_or_else(|| panic!("no basic block `{text}`"))
}

/// Root token of a reachable basic block with the given statement text.
pub fn find_statement_root(
    config: &Configuration,
    analysis: &FunctionAnalysis,
    text: &str,
) -> TokenId {
    let id = find_block(config, analysis, text);
    match &analysis.cfg.node(id).kind {
        CfgNodeKind::Basic { token } => *token,
        _ => unreachable!(),
    }
}

/// Dependency edges as (defining variable, defined variable) name pairs.
pub fn dependency_edges(
    config: &Configuration,
    analysis: &FunctionAnalysis,
) -> Vec<(String, String)> {
    let mut edges = Vec::new();
    for node in &analysis.dependencies.nodes {
        for &next in &node.next {
            let to = analysis.dependencies.node(next);
            edges.push((
                config.variable_name(node.variable).to_string(),
                config.variable_name(to.variable).to_string(),
            ));
        }
    }
    edges.sort();
    edges
}
