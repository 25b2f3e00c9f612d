//! Per-function scope tree.
//!
//! A [`ScopeTree`] is the hierarchical view of one function's nested
//! `{ ... }` regions, built from the dump's flat scope table. Parsing
//! consumes the tree: each construct pops the child scope it corresponds
//! to, and a well-formed function consumes every non-root scope exactly
//! once.
//!
//! ## The Else/Try quirk
//!
//! The front-end emits every `Else` scope twice: the `Else` record itself,
//! immediately followed by a vestigial `Try` record that actually owns the
//! body tokens. Building the tree therefore rewrites each `Else` scope's id
//! to the id of the record that follows it and detaches that record's
//! parent link, so the pair collapses into a single tree node. This is
//! upstream behavior, reproduced verbatim.

use crate::dump::{Configuration, ScopeId, ScopeKind};
use crate::error::{AnalysisError, Result};

/// A node of the per-function scope hierarchy.
///
/// `scope` points at the original scope record (for kind, name, and bracket
/// tokens); `id` is the effective id that tokens reference, which differs
/// from the record's own id only for `Else` scopes (see module docs).
/// Children are in source order; `clone()` is a deep copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScopeTree {
    /// Original scope record.
    pub scope: ScopeId,

    /// Effective id, as carried by tokens inside the scope.
    pub id: ScopeId,

    /// Child scopes, in source order.
    pub children: Vec<ScopeTree>,
}

impl ScopeTree {
    /// Build the scope tree rooted at `root` from a configuration's scope
    /// table.
    pub fn build(config: &Configuration, root: ScopeId) -> Result<ScopeTree> {
        let n = config.scopes.len();
        let mut effective: Vec<ScopeId> = (0..n).map(|i| ScopeId(i as u32)).collect();
        let mut nested_in: Vec<Option<ScopeId>> =
            config.scopes.iter().map(|s| s.nested_in).collect();

        for i in 0..n {
            if config.scopes[i].kind == ScopeKind::Else {
                if i + 1 >= n {
                    return Err(AnalysisError::MalformedDump(format!(
                        "else scope `{}` has no trailing twin record",
                        config.scopes[i].ext_id
                    )));
                }
                effective[i] = ScopeId(i as u32 + 1);
                nested_in[i + 1] = None;
            }
        }

        let mut visited = vec![false; n];
        Self::collect(config, &effective, &nested_in, &mut visited, root.0 as usize)
    }

    fn collect(
        config: &Configuration,
        effective: &[ScopeId],
        nested_in: &[Option<ScopeId>],
        visited: &mut [bool],
        idx: usize,
    ) -> Result<ScopeTree> {
        if visited[idx] {
            return Err(AnalysisError::MalformedDump(format!(
                "scope nesting cycle through `{}`",
                config.scopes[idx].ext_id
            )));
        }
        visited[idx] = true;

        let id = effective[idx];
        let mut children = Vec::new();
        for j in 0..config.scopes.len() {
            if j != idx && nested_in[j] == Some(id) {
                children.push(Self::collect(config, effective, nested_in, visited, j)?);
            }
        }

        Ok(ScopeTree { scope: ScopeId(idx as u32), id, children })
    }

    /// Kind of this node's scope record.
    pub fn kind(&self, config: &Configuration) -> ScopeKind {
        config.scope(self.scope).kind
    }

    /// Remove the first node (DFS order) whose effective id matches.
    /// Returns whether a removal occurred. The root itself is never removed.
    pub fn remove_by_id(&mut self, id: ScopeId) -> bool {
        for i in 0..self.children.len() {
            if self.children[i].id == id {
                self.children.remove(i);
                return true;
            }
            if self.children[i].remove_by_id(id) {
                return true;
            }
        }
        false
    }

    /// Find a node (DFS order) by effective id.
    pub fn find_by_id(&self, id: ScopeId) -> Option<&ScopeTree> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.find_by_id(id))
    }

    /// Detach and return the first child, if any. Parsing consumes scopes in
    /// source order through this.
    pub fn pop_first_child(&mut self) -> Option<ScopeTree> {
        if self.children.is_empty() {
            None
        } else {
            Some(self.children.remove(0))
        }
    }

    /// Kind of the first child, if any.
    pub fn first_child_kind(&self, config: &Configuration) -> Option<ScopeKind> {
        self.children.first().map(|c| c.kind(config))
    }

    /// Total number of nodes in the tree (root included).
    pub fn len(&self) -> usize {
        1 + self.children.iter().map(ScopeTree::len).sum::<usize>()
    }

    /// Whether the tree is a lone root.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }
}
