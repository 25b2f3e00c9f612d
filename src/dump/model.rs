//! Arena model for dump contents.
//!
//! All collections use `Vec` with index ids for deterministic ordering and
//! O(1) identity comparison. The original string ids from the dump document
//! are retained (`ext_id`) because the downstream units report references
//! tokens and variables by those ids.

use serde::{Deserialize, Serialize};

/// Index of a token. Ordering of token ids follows source order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TokenId(pub u32);

/// Index of a scope in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScopeId(pub u32);

/// Index of a variable in a configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VariableId(pub u32);

/// A single token of the translation unit.
///
/// The `ast_*` links form a forest of expression trees; `prev`/`next` are
/// the linear source order over all tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Token {
    /// Id string from the dump document.
    pub ext_id: String,

    /// Textual form of the token.
    pub text: String,

    /// 1-based source line.
    pub line: u32,

    /// Scope this token belongs to.
    pub scope: ScopeId,

    /// AST parent, if the token participates in an expression tree.
    pub ast_parent: Option<TokenId>,

    /// First (left) AST operand.
    pub ast_op1: Option<TokenId>,

    /// Second (right) AST operand.
    pub ast_op2: Option<TokenId>,

    /// Previous token in source order.
    pub prev: Option<TokenId>,

    /// Next token in source order.
    pub next: Option<TokenId>,

    /// Variable bound to this token, if any.
    pub variable: Option<VariableId>,

    /// Whether the token is an arithmetic operator.
    pub is_arithmetic_op: bool,
}

/// Scope type tag as emitted by the front-end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScopeKind {
    /// Translation-unit scope.
    Global,

    /// Function body.
    Function,

    /// `if` branch body.
    If,

    /// `else` branch body.
    Else,

    /// `while` loop body.
    While,

    /// `for` loop body.
    For,

    /// `switch` body.
    Switch,

    /// `do`/`while` body.
    Do,

    /// `try` block (also emitted as a vestigial twin of `else` scopes).
    Try,

    /// `catch` block.
    Catch,

    /// Class body.
    Class,

    /// Struct body.
    Struct,

    /// Namespace body.
    Namespace,

    /// Enum body.
    Enum,

    /// Lambda body.
    Lambda,

    /// Bare `{ ... }` block.
    Unconditional,

    /// Anything the pipeline does not care about.
    Other,
}

impl ScopeKind {
    /// Map the dump's `type` attribute to a kind.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "Global" => ScopeKind::Global,
            "Function" => ScopeKind::Function,
            "If" => ScopeKind::If,
            "Else" => ScopeKind::Else,
            "While" => ScopeKind::While,
            "For" => ScopeKind::For,
            "Switch" => ScopeKind::Switch,
            "Do" => ScopeKind::Do,
            "Try" => ScopeKind::Try,
            "Catch" => ScopeKind::Catch,
            "Class" => ScopeKind::Class,
            "Struct" => ScopeKind::Struct,
            "Namespace" => ScopeKind::Namespace,
            "Enum" => ScopeKind::Enum,
            "Lambda" => ScopeKind::Lambda,
            "Unconditional" => ScopeKind::Unconditional,
            _ => ScopeKind::Other,
        }
    }
}

/// A `{ ... }` region of the translation unit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scope {
    /// Id string from the dump document.
    pub ext_id: String,

    /// Scope type tag.
    pub kind: ScopeKind,

    /// Name, for named scopes (function/class name).
    pub name: Option<String>,

    /// Token opening the scope (`{`).
    pub start: Option<TokenId>,

    /// Token closing the scope (`}`).
    pub end: Option<TokenId>,

    /// Enclosing scope.
    pub nested_in: Option<ScopeId>,
}

/// A declared variable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Variable {
    /// Id string from the dump document.
    pub ext_id: String,

    /// Token carrying the variable's name at its declaration.
    pub name_token: Option<TokenId>,

    /// Scope the variable is declared in.
    pub scope: Option<ScopeId>,

    /// Whether the variable is a function argument.
    pub is_argument: bool,
}

/// A function found in a configuration's scope table.
#[derive(Debug, Clone)]
pub struct FunctionInfo {
    /// The function's body scope.
    pub scope: ScopeId,

    /// Function name.
    pub name: String,

    /// Token opening the body.
    pub start: TokenId,

    /// Token closing the body.
    pub end: TokenId,

    /// Line of the opening token.
    pub line: u32,
}

/// One analyzed configuration of a translation unit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Configuration {
    /// Configuration name (preprocessor combination), if given.
    pub name: Option<String>,

    /// All tokens, in source order.
    pub tokens: Vec<Token>,

    /// All scopes, in declaration order.
    pub scopes: Vec<Scope>,

    /// All variables, in declaration order.
    pub variables: Vec<Variable>,
}

impl Configuration {
    /// View over the configuration's own tokens.
    pub fn token_view(&self) -> TokenView<'_> {
        TokenView { source: &self.tokens, synthetic: &[] }
    }

    /// View over the configuration's tokens extended with synthesized ones.
    pub fn token_view_with<'a>(&'a self, synthetic: &'a [Token]) -> TokenView<'a> {
        TokenView { source: &self.tokens, synthetic }
    }

    /// Look up a scope by id.
    pub fn scope(&self, id: ScopeId) -> &Scope {
        &self.scopes[id.0 as usize]
    }

    /// Look up a variable by id.
    pub fn variable(&self, id: VariableId) -> &Variable {
        &self.variables[id.0 as usize]
    }

    /// All functions with a complete body, in scope-table order.
    pub fn functions(&self) -> Vec<FunctionInfo> {
        let mut out = Vec::new();
        for (idx, s) in self.scopes.iter().enumerate() {
            if s.kind != ScopeKind::Function {
                continue;
            }
            let (start, end) = match (s.start, s.end) {
                (Some(start), Some(end)) => (start, end),
                _ => continue,
            };
            out.push(FunctionInfo {
                scope: ScopeId(idx as u32),
                name: s.name.clone().unwrap_or_default(),
                start,
                end,
                line: self.tokens[start.0 as usize].line,
            });
        }
        out
    }

    /// Argument variables of the function owning `scope`, in table order.
    pub fn arguments_of(&self, scope: ScopeId) -> Vec<VariableId> {
        let mut out = Vec::new();
        for (idx, v) in self.variables.iter().enumerate() {
            if v.is_argument && v.scope == Some(scope) {
                out.push(VariableId(idx as u32));
            }
        }
        out
    }

    /// Name of a variable, taken from its declaration token.
    pub fn variable_name(&self, id: VariableId) -> &str {
        self.variable(id)
            .name_token
            .map(|t| self.tokens[t.0 as usize].text.as_str())
            .unwrap_or("<anonymous>")
    }
}

/// Resolves [`TokenId`]s against a configuration plus a (possibly empty)
/// slice of synthesized tokens.
///
/// Ids below the source length index the dump; ids at or above it index the
/// synthesized slice. Synthesized tokens never take part in source-order
/// walks; they only appear as condition roots of desugared statements.
#[derive(Debug, Clone, Copy)]
pub struct TokenView<'a> {
    source: &'a [Token],
    synthetic: &'a [Token],
}

impl<'a> TokenView<'a> {
    /// Resolve a token id.
    pub fn get(&self, id: TokenId) -> &'a Token {
        let idx = id.0 as usize;
        if idx < self.source.len() {
            &self.source[idx]
        } else {
            &self.synthetic[idx - self.source.len()]
        }
    }

    /// Textual form of a token.
    pub fn text(&self, id: TokenId) -> &'a str {
        &self.get(id).text
    }

    /// Number of source tokens (synthesized ids start here).
    pub fn source_len(&self) -> usize {
        self.source.len()
    }
}

/// A parsed dump document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Dump {
    /// All configurations, in document order.
    pub configurations: Vec<Configuration>,
}

impl Dump {
    /// The configuration the pipeline analyzes (the document's first).
    pub fn primary(&self) -> Option<&Configuration> {
        self.configurations.first()
    }
}
