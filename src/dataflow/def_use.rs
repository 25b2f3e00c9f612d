//! Per-node define/use sets.
//!
//! | kind        | define          | use                          |
//! |-------------|-----------------|------------------------------|
//! | Entry       | function args   | —                            |
//! | Basic       | LHS of `=`      | RHS (the `=` token included) |
//! | Conditional | —               | condition tree               |
//! | other       | —               | —                            |
//!
//! Nodes are visited once, by BFS from the entry; unreachable arena slots
//! keep empty sets.

use std::collections::{BTreeSet, VecDeque};

use crate::cfg::model::{CfgNodeId, CfgNodeKind, FunctionCfg};
use crate::dump::{TokenView, VariableId};
use crate::tokens::{in_order, lhs_of, rhs_of, variables_in};

/// Variables defined and used by one CFG node.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DefUsePair {
    /// Variables written by the node.
    pub define: BTreeSet<VariableId>,

    /// Variables read by the node.
    pub uses: BTreeSet<VariableId>,
}

/// Define/use sets for every node of one CFG.
#[derive(Debug, Clone)]
pub struct DefUseMap {
    pairs: Vec<DefUsePair>,
}

impl DefUseMap {
    /// Compute define/use sets for all reachable nodes.
    pub fn compute(view: &TokenView<'_>, cfg: &FunctionCfg) -> Self {
        let mut pairs = vec![DefUsePair::default(); cfg.nodes.len()];

        let mut seen = vec![false; cfg.nodes.len()];
        let mut queue = VecDeque::new();
        seen[cfg.entry.0 as usize] = true;
        queue.push_back(cfg.entry);

        while let Some(id) = queue.pop_front() {
            let pair = &mut pairs[id.0 as usize];
            match &cfg.node(id).kind {
                CfgNodeKind::Entry { args } => {
                    pair.define.extend(args.iter().copied());
                }
                CfgNodeKind::Basic { token } => {
                    let statement = in_order(view, Some(*token));
                    pair.define.extend(variables_in(view, lhs_of(view, &statement)));
                    pair.uses.extend(variables_in(view, rhs_of(view, &statement)));
                }
                CfgNodeKind::Conditional { condition, .. } => {
                    let tokens = in_order(view, Some(*condition));
                    pair.uses.extend(variables_in(view, &tokens));
                }
                CfgNodeKind::Exit | CfgNodeKind::Join | CfgNodeKind::Empty => {}
            }

            for &next in &cfg.node(id).next {
                if !seen[next.0 as usize] {
                    seen[next.0 as usize] = true;
                    queue.push_back(next);
                }
            }
        }

        Self { pairs }
    }

    /// Sets of one node.
    pub fn pair(&self, id: CfgNodeId) -> &DefUsePair {
        &self.pairs[id.0 as usize]
    }
}
