//! CFG model.
//!
//! All nodes are stored in a `Vec` in creation order; `next`/`previous`
//! are small sorted index vectors kept mirrored by [`FunctionCfg::add_edge`].
//! Once linked, nodes are never relinked; edges are only added.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::dump::{ScopeId, TokenId, VariableId};

/// Index of a node inside its function's CFG arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CfgNodeId(pub u32);

/// The shape of a CFG node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CfgNodeKind {
    /// Function entry; defines the function arguments.
    Entry {
        /// Argument variables, in declaration order.
        args: Vec<VariableId>,
    },

    /// Function exit.
    Exit,

    /// One statement, identified by its root token.
    Basic {
        /// Root token of the wrapped statement.
        token: TokenId,
    },

    /// Two-way branch on a condition expression.
    Conditional {
        /// Root of the condition expression.
        condition: TokenId,

        /// Entry of the true branch (always set after building).
        true_target: Option<CfgNodeId>,

        /// Entry of the false branch (always set after building).
        false_target: Option<CfgNodeId>,
    },

    /// Merge point of branches.
    Join,

    /// Placeholder node: empty branches and the false target of loops.
    Empty,
}

impl CfgNodeKind {
    fn discriminant(&self) -> u8 {
        match self {
            CfgNodeKind::Entry { .. } => 0,
            CfgNodeKind::Exit => 1,
            CfgNodeKind::Basic { .. } => 2,
            CfgNodeKind::Conditional { .. } => 3,
            CfgNodeKind::Join => 4,
            CfgNodeKind::Empty => 5,
        }
    }
}

/// A node with its mirrored adjacency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CfgNode {
    /// Node shape.
    pub kind: CfgNodeKind,

    /// Successors, sorted by id.
    pub next: Vec<CfgNodeId>,

    /// Predecessors, sorted by id.
    pub previous: Vec<CfgNodeId>,
}

/// Control-flow graph of one function.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionCfg {
    /// Function name.
    pub name: String,

    /// Body scope of the function.
    pub scope: ScopeId,

    /// Node arena, in creation order.
    pub nodes: Vec<CfgNode>,

    /// The entry node.
    pub entry: CfgNodeId,

    /// The exit node.
    pub exit: CfgNodeId,

    /// Nodes reachable from entry, in BFS order. Nodes abandoned during
    /// construction (code after an unconditional jump) stay in the arena
    /// but are absent here.
    pub reachable: Vec<CfgNodeId>,
}

impl FunctionCfg {
    /// New graph containing only an entry and an exit node.
    pub fn new(name: &str, scope: ScopeId, args: Vec<VariableId>) -> Self {
        let mut cfg = Self {
            name: name.to_string(),
            scope,
            nodes: Vec::new(),
            entry: CfgNodeId(0),
            exit: CfgNodeId(0),
            reachable: Vec::new(),
        };
        cfg.entry = cfg.add_node(CfgNodeKind::Entry { args });
        cfg.exit = cfg.add_node(CfgNodeKind::Exit);
        cfg
    }

    /// Append a node and return its id.
    pub fn add_node(&mut self, kind: CfgNodeKind) -> CfgNodeId {
        let id = CfgNodeId(self.nodes.len() as u32);
        self.nodes.push(CfgNode { kind, next: Vec::new(), previous: Vec::new() });
        id
    }

    /// Add the edge `from → to`, mirrored into both adjacency sets.
    pub fn add_edge(&mut self, from: CfgNodeId, to: CfgNodeId) {
        insert_sorted(&mut self.nodes[from.0 as usize].next, to);
        insert_sorted(&mut self.nodes[to.0 as usize].previous, from);
    }

    /// Node by id.
    pub fn node(&self, id: CfgNodeId) -> &CfgNode {
        &self.nodes[id.0 as usize]
    }

    /// Recompute the reachable set by BFS from entry.
    pub fn recompute_reachable(&mut self) {
        let mut seen = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut queue = std::collections::VecDeque::new();
        seen[self.entry.0 as usize] = true;
        queue.push_back(self.entry);
        while let Some(id) = queue.pop_front() {
            order.push(id);
            for &next in &self.nodes[id.0 as usize].next {
                if !seen[next.0 as usize] {
                    seen[next.0 as usize] = true;
                    queue.push_back(next);
                }
            }
        }
        self.reachable = order;
    }

    /// Whether a node is in the reachable set.
    pub fn is_reachable(&self, id: CfgNodeId) -> bool {
        self.reachable.contains(&id)
    }

    /// Compute SHA-256 hash of the graph structure.
    ///
    /// **Deterministic**: Same graph → same hash.
    pub fn compute_hash(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.nodes.len().to_le_bytes());
        for node in &self.nodes {
            hasher.update([node.kind.discriminant()]);
            match &node.kind {
                CfgNodeKind::Entry { args } => {
                    for arg in args {
                        hasher.update(arg.0.to_le_bytes());
                    }
                }
                CfgNodeKind::Basic { token } => hasher.update(token.0.to_le_bytes()),
                CfgNodeKind::Conditional { condition, .. } => {
                    hasher.update(condition.0.to_le_bytes())
                }
                _ => {}
            }
            for &next in &node.next {
                hasher.update(next.0.to_le_bytes());
            }
        }
        format!("{:x}", hasher.finalize())
    }
}

fn insert_sorted(ids: &mut Vec<CfgNodeId>, id: CfgNodeId) {
    if let Err(pos) = ids.binary_search(&id) {
        ids.insert(pos, id);
    }
}
