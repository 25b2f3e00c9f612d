//! Canonical serialization of statement trees.
//!
//! Shape: every statement is a single-key map `{ kind: { ...fields... } }`,
//! token trees are rendered by their in-order text, and recursion preserves
//! the tree. Used for golden-file assertions; not part of the pipeline's
//! normal operation.

use serde_json::{json, Value};

use crate::ast::model::{FunctionDecl, Statement};
use crate::dump::{Configuration, TokenView};
use crate::error::Result;
use crate::tokens::statement_text;

/// Canonical JSON value for one statement.
pub fn statement_to_value(view: &TokenView<'_>, statement: &Statement) -> Value {
    match statement {
        Statement::Block(block) => json!({
            "block": { "statement": statement_text(view, block.root) }
        }),
        Statement::If(s) => json!({
            "if": {
                "condition": statement_text(view, s.condition),
                "true": body_to_value(view, &s.true_body),
                "false": body_to_value(view, &s.false_body),
            }
        }),
        Statement::While(s) => json!({
            "while": {
                "condition": statement_text(view, s.condition),
                "body": body_to_value(view, &s.body),
            }
        }),
    }
}

fn body_to_value(view: &TokenView<'_>, body: &[Statement]) -> Value {
    Value::Array(body.iter().map(|s| statement_to_value(view, s)).collect())
}

/// Canonical JSON value for a whole function.
pub fn function_to_value(config: &Configuration, decl: &FunctionDecl) -> Value {
    let view = config.token_view_with(&decl.synthetic);
    json!({
        "function": {
            "name": decl.name,
            "body": body_to_value(&view, &decl.body),
        }
    })
}

/// YAML rendering of [`function_to_value`].
pub fn function_to_yaml(config: &Configuration, decl: &FunctionDecl) -> Result<String> {
    let value = function_to_value(config, decl);
    serde_yaml::to_string(&value)
        .map_err(|e| crate::AnalysisError::InvariantFailure(format!("yaml rendering failed: {e}")))
}
