//! Statement-level AST lifted from the dump.
//!
//! The parser consumes a function's root-token list together with a deep
//! copy of its scope tree and produces a statement tree whose vocabulary is
//! exactly {block, if, while}: `for` loops and `switch` statements are
//! desugared during parsing and cannot appear in the output by
//! construction.

pub mod model;
pub mod parser;
pub mod serialize;

pub use model::{BlockStatement, FunctionDecl, IfStatement, Statement, WhileStatement};
pub use parser::DumpToAst;
pub use serialize::{function_to_value, function_to_yaml, statement_to_value};
