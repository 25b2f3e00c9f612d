//! Variable-level data-dependency graph.
//!
//! One node per `(cfg_node, defined variable)` pair. For every node `n`
//! with a non-empty define set, each reaching definition `(d, v)` with
//! `v ∈ use[n]` and `v ∉ define[n]` contributes edges from `(d, v)` to
//! every `(n, v')` with `v' ∈ define[n]`. Edges are mirrored
//! (`previous`/`next`), and component queries run over the undirected
//! projection.

use std::collections::{HashMap, VecDeque};

use sha2::{Digest, Sha256};

use crate::cfg::model::{CfgNodeId, FunctionCfg};
use crate::dataflow::def_use::DefUseMap;
use crate::dataflow::reach::ReachingDefinitions;
use crate::dump::VariableId;
use crate::error::{AnalysisError, Result};

/// Index of a dependency node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DepNodeId(pub u32);

/// A definition site of one variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DependencyNode {
    /// The defining CFG node.
    pub cfg_node: CfgNodeId,

    /// The variable defined there.
    pub variable: VariableId,

    /// Definitions that this one feeds, sorted by id.
    pub next: Vec<DepNodeId>,

    /// Definitions feeding this one, sorted by id.
    pub previous: Vec<DepNodeId>,
}

/// Data-dependency graph of one function.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// All dependency nodes, in (CFG BFS, variable) order.
    pub nodes: Vec<DependencyNode>,

    index: HashMap<(CfgNodeId, VariableId), DepNodeId>,
}

impl DependencyGraph {
    /// Derive the dependency graph from the reaching-definitions fixpoint.
    pub fn build(
        cfg: &FunctionCfg,
        def_use: &DefUseMap,
        reach: &ReachingDefinitions,
    ) -> Result<Self> {
        let mut graph = DependencyGraph::default();

        for &cfg_node in &cfg.reachable {
            for &variable in &def_use.pair(cfg_node).define {
                let id = DepNodeId(graph.nodes.len() as u32);
                graph.nodes.push(DependencyNode {
                    cfg_node,
                    variable,
                    next: Vec::new(),
                    previous: Vec::new(),
                });
                graph.index.insert((cfg_node, variable), id);
            }
        }

        for &cfg_node in &cfg.reachable {
            let pair = def_use.pair(cfg_node);
            if pair.define.is_empty() {
                continue;
            }
            for rd in reach.reach_in(cfg_node) {
                if !pair.uses.contains(&rd.variable) || pair.define.contains(&rd.variable) {
                    continue;
                }
                let from = graph.lookup(rd.node, rd.variable)?;
                for &defined in &pair.define {
                    let to = graph.lookup(cfg_node, defined)?;
                    graph.add_edge(from, to);
                }
            }
        }

        Ok(graph)
    }

    fn lookup(&self, cfg_node: CfgNodeId, variable: VariableId) -> Result<DepNodeId> {
        self.index.get(&(cfg_node, variable)).copied().ok_or_else(|| {
            AnalysisError::InvariantFailure(
                "reaching definition refers to an unmaterialized dependency node".into(),
            )
        })
    }

    fn add_edge(&mut self, from: DepNodeId, to: DepNodeId) {
        insert_sorted(&mut self.nodes[from.0 as usize].next, to);
        insert_sorted(&mut self.nodes[to.0 as usize].previous, from);
    }

    /// Node by id.
    pub fn node(&self, id: DepNodeId) -> &DependencyNode {
        &self.nodes[id.0 as usize]
    }

    /// Dependency node of a `(cfg_node, variable)` pair.
    pub fn node_for(&self, cfg_node: CfgNodeId, variable: VariableId) -> Option<DepNodeId> {
        self.index.get(&(cfg_node, variable)).copied()
    }

    /// First dependency node materialized for a CFG node, if any.
    pub fn first_node_for_cfg(&self, cfg_node: CfgNodeId) -> Option<DepNodeId> {
        self.nodes
            .iter()
            .position(|n| n.cfg_node == cfg_node)
            .map(|idx| DepNodeId(idx as u32))
    }

    /// Total number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.next.len()).sum()
    }

    /// Connected component of a node over the undirected projection,
    /// sorted by id.
    pub fn connected_component(&self, id: DepNodeId) -> Vec<DepNodeId> {
        let mut seen = vec![false; self.nodes.len()];
        let mut component = Vec::new();
        let mut queue = VecDeque::new();
        seen[id.0 as usize] = true;
        queue.push_back(id);
        while let Some(cur) = queue.pop_front() {
            component.push(cur);
            let node = &self.nodes[cur.0 as usize];
            for &neighbor in node.next.iter().chain(node.previous.iter()) {
                if !seen[neighbor.0 as usize] {
                    seen[neighbor.0 as usize] = true;
                    queue.push_back(neighbor);
                }
            }
        }
        component.sort();
        component
    }

    /// All connected components, each sorted by id, in first-node order.
    pub fn connected_components(&self) -> Vec<Vec<DepNodeId>> {
        let mut assigned = vec![false; self.nodes.len()];
        let mut components = Vec::new();
        for idx in 0..self.nodes.len() {
            if assigned[idx] {
                continue;
            }
            let component = self.connected_component(DepNodeId(idx as u32));
            for &member in &component {
                assigned[member.0 as usize] = true;
            }
            components.push(component);
        }
        components
    }

    /// Compute SHA-256 hash of the graph structure.
    ///
    /// **Deterministic**: Same graph → same hash.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.nodes.len().to_le_bytes());
        for node in &self.nodes {
            hasher.update(node.cfg_node.0.to_le_bytes());
            hasher.update(node.variable.0.to_le_bytes());
            for &next in &node.next {
                hasher.update(next.0.to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

fn insert_sorted(ids: &mut Vec<DepNodeId>, id: DepNodeId) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}
