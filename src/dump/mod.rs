//! Read-only input model over an external analyzer dump.
//!
//! The dump is produced by a C/C++ front-end and describes a translation
//! unit as flat tables: tokens (with AST operand/parent links and linear
//! source order), scopes (typed, nested, bracketed by `{`/`}` tokens), and
//! variables. The model is an arena: every cross-reference is a stable
//! integer index, and token index order *is* source order.
//!
//! ## Ownership
//!
//! A [`Dump`] is built once and never mutated afterwards. Every later stage
//! (AST, CFG, dataflow, repair) holds shared references into it. Tokens
//! synthesized during desugaring live outside the dump, in the owning
//! function declaration, and are resolved through [`TokenView`].

pub mod builder;
pub mod model;
pub mod reader;

pub use builder::{ConfigurationBuilder, RawScope, RawToken, RawVariable};
pub use model::{
    Configuration, Dump, FunctionInfo, Scope, ScopeId, ScopeKind, Token, TokenId, TokenView,
    Variable, VariableId,
};
pub use reader::{parse_dump, read_dump};
