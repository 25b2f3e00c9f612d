//! Per-function analysis pipeline.
//!
//! Runs the stages strictly in order — AST, CFG, def/use, reaching
//! definitions, dependency graph — and bundles the results. A malformed
//! function is logged and dropped; the other functions are unaffected, and
//! no partial graph is ever kept for a failing one.
//!
//! Functions share only the immutable dump, so the outer loop is
//! trivially parallel (enable the `parallel` feature).

use crate::ast::{DumpToAst, FunctionDecl};
use crate::cfg::{AstToCfg, FunctionCfg};
use crate::dataflow::{DefUseMap, DependencyGraph, ReachingDefinitions};
use crate::dump::{Configuration, FunctionInfo};
use crate::error::Result;

/// Every pipeline product for one function.
#[derive(Debug, Clone)]
pub struct FunctionAnalysis {
    /// The parsed statement tree.
    pub decl: FunctionDecl,

    /// The control-flow graph.
    pub cfg: FunctionCfg,

    /// Define/use sets per CFG node.
    pub def_use: DefUseMap,

    /// Reaching-definitions fixpoint.
    pub reach: ReachingDefinitions,

    /// Variable-level dependency graph.
    pub dependencies: DependencyGraph,
}

/// Run the full pipeline for a single function.
pub fn analyze_function(
    config: &Configuration,
    function: &FunctionInfo,
) -> Result<FunctionAnalysis> {
    let decl = DumpToAst::new(config).convert(function)?;
    let cfg = AstToCfg::new(config).build(&decl)?;

    let view = config.token_view_with(&decl.synthetic);
    let def_use = DefUseMap::compute(&view, &cfg);
    let reach = ReachingDefinitions::solve(&cfg, &def_use);
    let dependencies = DependencyGraph::build(&cfg, &def_use, &reach)?;

    tracing::debug!(function = %decl.name, nodes = cfg.nodes.len(), "analyzed function");
    Ok(FunctionAnalysis { decl, cfg, def_use, reach, dependencies })
}

/// Analyze every function of a configuration, dropping the ones that fail.
pub fn analyze_configuration(config: &Configuration) -> Vec<FunctionAnalysis> {
    let functions = config.functions();

    #[cfg(feature = "parallel")]
    {
        use rayon::prelude::*;
        return functions.par_iter().filter_map(|f| run_or_drop(config, f)).collect();
    }

    #[cfg(not(feature = "parallel"))]
    {
        functions.iter().filter_map(|f| run_or_drop(config, f)).collect()
    }
}

fn run_or_drop(config: &Configuration, function: &FunctionInfo) -> Option<FunctionAnalysis> {
    match analyze_function(config, function) {
        Ok(analysis) => Some(analysis),
        Err(error) => {
            tracing::warn!(function = %function.name, %error, "dropping function from analysis");
            None
        }
    }
}
