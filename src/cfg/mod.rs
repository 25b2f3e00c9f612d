//! Control-flow graphs.
//!
//! One [`FunctionCfg`] per function. Nodes live in a flat arena owned by
//! the graph; edges are stable integer indices, so cycles (loop back-edges)
//! need no shared ownership and node identity is index identity.

pub mod builder;
pub mod model;

pub use builder::AstToCfg;
pub use model::{CfgNode, CfgNodeId, CfgNodeKind, FunctionCfg};
