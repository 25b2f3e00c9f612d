//! PhysFix static-analysis pipeline.
//! Builds per-function ASTs, control-flow graphs, and data-dependency
//! graphs from an external C/C++ analyzer dump, and proposes rewrites for
//! statements with inconsistent physical units.
//!
//! ## Design Principles
//!
//! 1. **The dump is read-only** - One owner, shared references everywhere
//! 2. **Arenas, not pointers** - Graph edges are stable integer indices
//! 3. **Determinism is sacred** - Same dump always produces same graphs
//! 4. **Fail per function** - A malformed function is dropped, not patched
//!
//! ## Pipeline
//!
//! Per function, strictly in order:
//!
//! ```text
//! dump -> (root tokens, scope tree) -> AST -> CFG -> def/use -> reach -> deps
//! ```
//!
//! The AST stage desugars `for` and `switch`, so every later stage only
//! ever sees blocks, ifs, and whiles.

#![deny(unsafe_op_in_unsafe_fn)]
#![warn(missing_docs)]

pub mod analysis;
pub mod ast;
pub mod cfg;
pub mod config;
pub mod dataflow;
pub mod dump;
pub mod error;
pub mod scopes;
pub mod tokens;
pub mod units;

// Re-export public API
pub use analysis::{analyze_configuration, analyze_function, FunctionAnalysis};
pub use ast::{DumpToAst, FunctionDecl, Statement};
pub use cfg::{AstToCfg, CfgNodeId, CfgNodeKind, FunctionCfg};
pub use dataflow::{DefUseMap, DependencyGraph, ReachDef, ReachingDefinitions};
pub use dump::{read_dump, Configuration, Dump, ScopeId, TokenId, VariableId};
pub use error::{AnalysisError, Result};
pub use scopes::ScopeTree;
