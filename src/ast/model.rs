//! Statement tree model.
//!
//! Statements reference tokens by id only; the dump stays the single owner
//! of token data. Tokens synthesized while desugaring (the `==` comparisons
//! of lowered switches) are owned by the enclosing [`FunctionDecl`] and
//! resolved through
//! [`Configuration::token_view_with`](crate::dump::Configuration::token_view_with).

use crate::dump::{ScopeId, Token, TokenId};
use crate::scopes::ScopeTree;

/// A single top-level expression statement, identified by its root token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockStatement {
    /// AST root of the statement.
    pub root: TokenId,
}

/// An `if` with optional `else`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IfStatement {
    /// Root of the condition expression.
    pub condition: TokenId,

    /// Statements of the true branch.
    pub true_body: Vec<Statement>,

    /// Statements of the false branch; empty when there is no `else`.
    pub false_body: Vec<Statement>,
}

/// A `while` loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WhileStatement {
    /// Root of the loop condition.
    pub condition: TokenId,

    /// Loop body statements.
    pub body: Vec<Statement>,
}

/// A parsed statement.
///
/// This is the complete post-parse vocabulary; `for` and `switch` never
/// survive parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// Plain expression statement.
    Block(BlockStatement),

    /// Conditional.
    If(IfStatement),

    /// Loop.
    While(WhileStatement),
}

/// A parsed function.
#[derive(Debug, Clone)]
pub struct FunctionDecl {
    /// Function name.
    pub name: String,

    /// Body scope of the function.
    pub scope: ScopeId,

    /// Token opening the body.
    pub start: TokenId,

    /// Token closing the body.
    pub end: TokenId,

    /// The function's scope hierarchy (pristine; parsing consumed a copy).
    pub scope_tree: ScopeTree,

    /// Body statements.
    pub body: Vec<Statement>,

    /// Tokens synthesized during desugaring, resolved by ids at or past the
    /// dump's token count.
    pub synthetic: Vec<Token>,
}
