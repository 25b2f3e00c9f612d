//! Reaching definitions.
//!
//! Classical forward monotone worklist dataflow over sets of
//! `(def_node, variable)` pairs:
//!
//! - meet: `reach_in[n] = ⋃ reach_out[p]` over predecessors,
//! - transfer: `reach_out[n] = gen[n] ∪ (reach_in[n] \ killed-by[n])`,
//!   where `gen[n] = {(n, v) | v ∈ define[n]}` and the kill set is
//!   `define[n]`; a node with an empty define set passes `reach_in`
//!   through unchanged.
//!
//! The worklist tracks membership so a pending node is never enqueued
//! twice; pop order does not affect the fixpoint because the transfer is
//! monotone over a finite lattice.

use std::collections::{BTreeSet, VecDeque};

use crate::cfg::model::{CfgNodeId, FunctionCfg};
use crate::dataflow::def_use::DefUseMap;
use crate::dump::VariableId;

/// A definition site paired with the variable it defines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReachDef {
    /// The defining CFG node.
    pub node: CfgNodeId,

    /// The defined variable.
    pub variable: VariableId,
}

/// Fixpoint of the reaching-definitions dataflow.
#[derive(Debug, Clone)]
pub struct ReachingDefinitions {
    reach_in: Vec<BTreeSet<ReachDef>>,
    reach_out: Vec<BTreeSet<ReachDef>>,
}

impl ReachingDefinitions {
    /// Run the worklist to fixpoint over the reachable nodes.
    pub fn solve(cfg: &FunctionCfg, def_use: &DefUseMap) -> Self {
        let n = cfg.nodes.len();
        let mut reach_in: Vec<BTreeSet<ReachDef>> = vec![BTreeSet::new(); n];
        let mut reach_out: Vec<BTreeSet<ReachDef>> = vec![BTreeSet::new(); n];

        let mut queue: VecDeque<CfgNodeId> = cfg.reachable.iter().copied().collect();
        let mut pending = vec![false; n];
        for &id in &queue {
            pending[id.0 as usize] = true;
        }

        while let Some(id) = queue.pop_back() {
            pending[id.0 as usize] = false;
            let idx = id.0 as usize;

            let mut incoming = BTreeSet::new();
            for &prev in &cfg.node(id).previous {
                incoming.extend(reach_out[prev.0 as usize].iter().copied());
            }

            let define = &def_use.pair(id).define;
            let outgoing = if define.is_empty() {
                incoming.clone()
            } else {
                let mut out: BTreeSet<ReachDef> = define
                    .iter()
                    .map(|&variable| ReachDef { node: id, variable })
                    .collect();
                out.extend(
                    incoming.iter().copied().filter(|rd| !define.contains(&rd.variable)),
                );
                out
            };

            reach_in[idx] = incoming;
            if outgoing != reach_out[idx] {
                reach_out[idx] = outgoing;
                for &next in &cfg.node(id).next {
                    if !pending[next.0 as usize] {
                        pending[next.0 as usize] = true;
                        queue.push_back(next);
                    }
                }
            }
        }

        Self { reach_in, reach_out }
    }

    /// Definitions reaching the entry of a node.
    pub fn reach_in(&self, id: CfgNodeId) -> &BTreeSet<ReachDef> {
        &self.reach_in[id.0 as usize]
    }

    /// Definitions leaving a node.
    pub fn reach_out(&self, id: CfgNodeId) -> &BTreeSet<ReachDef> {
        &self.reach_out[id.0 as usize]
    }
}
