//! Dataflow analyses over a function CFG.
//!
//! Strictly pipelined: def/use sets feed a reaching-definitions worklist,
//! whose fixpoint feeds the variable-level dependency graph. No stage
//! mutates the CFG.

pub mod def_use;
pub mod dependency;
pub mod reach;

pub use def_use::{DefUseMap, DefUsePair};
pub use dependency::{DepNodeId, DependencyGraph, DependencyNode};
pub use reach::{ReachDef, ReachingDefinitions};
