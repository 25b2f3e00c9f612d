//! Configuration assembly with id resolution.
//!
//! The dump document references tokens, scopes, and variables by opaque
//! string ids. The builder collects raw records in document order, then
//! resolves every reference to an arena index in one pass. A dangling
//! reference is a [`MalformedDump`](crate::AnalysisError::MalformedDump)
//! error, not a silent `None`.
//!
//! The builder doubles as the test-fixture surface: tests assemble
//! configurations programmatically instead of shipping dump files.

use std::collections::HashMap;

use crate::dump::model::{
    Configuration, Scope, ScopeId, ScopeKind, Token, TokenId, Variable, VariableId,
};
use crate::error::{AnalysisError, Result};

/// A token record before id resolution.
#[derive(Debug, Clone)]
pub struct RawToken {
    /// Document id.
    pub id: String,

    /// Token text.
    pub text: String,

    /// 1-based source line.
    pub line: u32,

    /// Document id of the owning scope.
    pub scope: String,

    /// Document id of the AST parent.
    pub ast_parent: Option<String>,

    /// Document id of the left AST operand.
    pub ast_op1: Option<String>,

    /// Document id of the right AST operand.
    pub ast_op2: Option<String>,

    /// Document id of the bound variable.
    pub variable: Option<String>,

    /// Arithmetic-operator flag.
    pub is_arithmetic_op: bool,
}

impl RawToken {
    /// A plain token with no links.
    pub fn new(id: &str, text: &str, line: u32, scope: &str) -> Self {
        Self {
            id: id.to_string(),
            text: text.to_string(),
            line,
            scope: scope.to_string(),
            ast_parent: None,
            ast_op1: None,
            ast_op2: None,
            variable: None,
            is_arithmetic_op: false,
        }
    }

    /// Set the AST parent id.
    pub fn parent(mut self, id: &str) -> Self {
        self.ast_parent = Some(id.to_string());
        self
    }

    /// Set the left operand id.
    pub fn op1(mut self, id: &str) -> Self {
        self.ast_op1 = Some(id.to_string());
        self
    }

    /// Set the right operand id.
    pub fn op2(mut self, id: &str) -> Self {
        self.ast_op2 = Some(id.to_string());
        self
    }

    /// Bind a variable id.
    pub fn variable(mut self, id: &str) -> Self {
        self.variable = Some(id.to_string());
        self
    }

    /// Mark as arithmetic operator.
    pub fn arithmetic(mut self) -> Self {
        self.is_arithmetic_op = true;
        self
    }
}

/// A scope record before id resolution.
#[derive(Debug, Clone)]
pub struct RawScope {
    /// Document id.
    pub id: String,

    /// Scope type tag.
    pub kind: ScopeKind,

    /// Scope name (function/class scopes).
    pub name: Option<String>,

    /// Document id of the opening token.
    pub start: Option<String>,

    /// Document id of the closing token.
    pub end: Option<String>,

    /// Document id of the enclosing scope.
    pub nested_in: Option<String>,
}

impl RawScope {
    /// A scope with the given kind and no links.
    pub fn new(id: &str, kind: ScopeKind) -> Self {
        Self { id: id.to_string(), kind, name: None, start: None, end: None, nested_in: None }
    }

    /// Set the scope name.
    pub fn named(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Set start/end bracket token ids.
    pub fn brackets(mut self, start: &str, end: &str) -> Self {
        self.start = Some(start.to_string());
        self.end = Some(end.to_string());
        self
    }

    /// Set the enclosing scope id.
    pub fn nested_in(mut self, id: &str) -> Self {
        self.nested_in = Some(id.to_string());
        self
    }
}

/// A variable record before id resolution.
#[derive(Debug, Clone)]
pub struct RawVariable {
    /// Document id.
    pub id: String,

    /// Document id of the declaration name token.
    pub name_token: Option<String>,

    /// Document id of the declaring scope.
    pub scope: Option<String>,

    /// Function-argument flag.
    pub is_argument: bool,
}

impl RawVariable {
    /// A local variable.
    pub fn new(id: &str, name_token: &str, scope: &str) -> Self {
        Self {
            id: id.to_string(),
            name_token: Some(name_token.to_string()),
            scope: Some(scope.to_string()),
            is_argument: false,
        }
    }

    /// Mark as function argument.
    pub fn argument(mut self) -> Self {
        self.is_argument = true;
        self
    }
}

/// Collects raw records and resolves them into a [`Configuration`].
#[derive(Debug, Default)]
pub struct ConfigurationBuilder {
    name: Option<String>,
    tokens: Vec<RawToken>,
    scopes: Vec<RawScope>,
    variables: Vec<RawVariable>,
}

impl ConfigurationBuilder {
    /// New empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the configuration name.
    pub fn name(&mut self, name: &str) {
        self.name = Some(name.to_string());
    }

    /// Append a token (document order is source order).
    pub fn token(&mut self, token: RawToken) {
        self.tokens.push(token);
    }

    /// Append a scope.
    pub fn scope(&mut self, scope: RawScope) {
        self.scopes.push(scope);
    }

    /// Append a variable.
    pub fn variable(&mut self, variable: RawVariable) {
        self.variables.push(variable);
    }

    /// Resolve all id references and produce the immutable configuration.
    pub fn finish(self) -> Result<Configuration> {
        let token_ids = index_ids(self.tokens.iter().map(|t| t.id.as_str()), "token")?;
        let scope_ids = index_ids(self.scopes.iter().map(|s| s.id.as_str()), "scope")?;
        let variable_ids = index_ids(self.variables.iter().map(|v| v.id.as_str()), "variable")?;

        let lookup_token = |id: &Option<String>, what: &str| -> Result<Option<TokenId>> {
            match id {
                None => Ok(None),
                Some(id) => token_ids
                    .get(id.as_str())
                    .map(|&idx| Some(TokenId(idx)))
                    .ok_or_else(|| dangling("token", id, what)),
            }
        };
        let lookup_scope = |id: &Option<String>, what: &str| -> Result<Option<ScopeId>> {
            match id {
                None => Ok(None),
                Some(id) => scope_ids
                    .get(id.as_str())
                    .map(|&idx| Some(ScopeId(idx)))
                    .ok_or_else(|| dangling("scope", id, what)),
            }
        };

        let mut tokens = Vec::with_capacity(self.tokens.len());
        for (idx, raw) in self.tokens.iter().enumerate() {
            let scope = scope_ids
                .get(raw.scope.as_str())
                .map(|&i| ScopeId(i))
                .ok_or_else(|| dangling("scope", &raw.scope, "token"))?;
            let variable = match &raw.variable {
                None => None,
                Some(id) => Some(
                    variable_ids
                        .get(id.as_str())
                        .map(|&i| VariableId(i))
                        .ok_or_else(|| dangling("variable", id, "token"))?,
                ),
            };
            tokens.push(Token {
                ext_id: raw.id.clone(),
                text: raw.text.clone(),
                line: raw.line,
                scope,
                ast_parent: lookup_token(&raw.ast_parent, "astParent")?,
                ast_op1: lookup_token(&raw.ast_op1, "astOperand1")?,
                ast_op2: lookup_token(&raw.ast_op2, "astOperand2")?,
                prev: if idx == 0 { None } else { Some(TokenId(idx as u32 - 1)) },
                next: if idx + 1 == self.tokens.len() {
                    None
                } else {
                    Some(TokenId(idx as u32 + 1))
                },
                variable,
                is_arithmetic_op: raw.is_arithmetic_op,
            });
        }

        let mut scopes = Vec::with_capacity(self.scopes.len());
        for raw in &self.scopes {
            scopes.push(Scope {
                ext_id: raw.id.clone(),
                kind: raw.kind,
                name: raw.name.clone(),
                start: lookup_token(&raw.start, "classStart")?,
                end: lookup_token(&raw.end, "classEnd")?,
                nested_in: lookup_scope(&raw.nested_in, "nestedIn")?,
            });
        }

        let mut variables = Vec::with_capacity(self.variables.len());
        for raw in &self.variables {
            variables.push(Variable {
                ext_id: raw.id.clone(),
                name_token: lookup_token(&raw.name_token, "nameToken")?,
                scope: lookup_scope(&raw.scope, "var scope")?,
                is_argument: raw.is_argument,
            });
        }

        Ok(Configuration { name: self.name, tokens, scopes, variables })
    }
}

fn index_ids<'a>(ids: impl Iterator<Item = &'a str>, what: &str) -> Result<HashMap<String, u32>> {
    let mut map = HashMap::new();
    for (idx, id) in ids.enumerate() {
        if map.insert(id.to_string(), idx as u32).is_some() {
            return Err(AnalysisError::MalformedDump(format!("duplicate {what} id `{id}`")));
        }
    }
    Ok(map)
}

fn dangling(kind: &str, id: &str, referenced_by: &str) -> AnalysisError {
    AnalysisError::MalformedDump(format!("unknown {kind} id `{id}` referenced by {referenced_by}"))
}
