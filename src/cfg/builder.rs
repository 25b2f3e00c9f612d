//! AST-to-CFG lowering.
//!
//! ## Algorithm
//!
//! Statements are lowered chain by chain with a cursor that starts unset
//! (no sentinel node is allocated; the chain head is an explicit optional).
//! A stack of frames records the enclosing constructs — `(kind, start,
//! exit)` with kind in {function, if, while} — and tells
//! `break`/`continue`/`return` where to jump:
//!
//! - `break` links the current basic block to the innermost while's join
//!   and halts the chain; the abandoned statements are unreachable.
//! - `continue` links to the innermost while's conditional.
//! - `return` links to the function exit; the outermost frame must be the
//!   function.
//!
//! Branch tails are found by a forward DFS that prunes at basic blocks
//! containing a jump (those are already threaded elsewhere) and stops at
//! the first successor-less node. Once linked, nodes are never relinked;
//! join nodes accumulate predecessors edge by edge.

use std::collections::HashSet;

use crate::ast::model::{FunctionDecl, Statement};
use crate::cfg::model::{CfgNodeId, CfgNodeKind, FunctionCfg};
use crate::dump::{Configuration, TokenId, TokenView};
use crate::error::{AnalysisError, Result};
use crate::tokens::in_order;

/// Converts statement trees into control-flow graphs.
pub struct AstToCfg<'a> {
    config: &'a Configuration,
}

impl<'a> AstToCfg<'a> {
    /// New converter over a configuration.
    pub fn new(config: &'a Configuration) -> Self {
        Self { config }
    }

    /// Lower one parsed function.
    pub fn build(&self, decl: &FunctionDecl) -> Result<FunctionCfg> {
        let args = self.config.arguments_of(decl.scope);
        let cfg = FunctionCfg::new(&decl.name, decl.scope, args);

        let mut builder = Builder { view: self.config.token_view_with(&decl.synthetic), cfg };
        let entry = builder.cfg.entry;
        let exit = builder.cfg.exit;

        let mut frames = vec![Frame { kind: FrameKind::Function, start: entry, exit }];
        let head = builder.chain(&decl.body, &mut frames)?;
        builder.cfg.add_edge(entry, head);
        builder.cfg.recompute_reachable();

        Ok(builder.cfg)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Function,
    If,
    While,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    start: CfgNodeId,
    exit: CfgNodeId,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Terminator {
    Break,
    Continue,
    Return,
}

struct Builder<'a> {
    view: TokenView<'a>,
    cfg: FunctionCfg,
}

impl<'a> Builder<'a> {
    /// Lower a statement list and return the chain's entry node. An empty
    /// chain yields a fresh `Empty` node.
    fn chain(&mut self, statements: &[Statement], frames: &mut Vec<Frame>) -> Result<CfgNodeId> {
        let mut head: Option<CfgNodeId> = None;
        let mut cur: Option<CfgNodeId> = None;
        let mut halted = false;

        for statement in statements {
            match statement {
                Statement::Block(block) => {
                    let node = self.cfg.add_node(CfgNodeKind::Basic { token: block.root });
                    self.attach(&mut head, &mut cur, node);
                    if let Some(term) = self.terminator_of(block.root) {
                        self.thread_terminator(node, term, frames)?;
                        halted = true;
                        break;
                    }
                }
                Statement::If(s) => {
                    let cond = self.cfg.add_node(CfgNodeKind::Conditional {
                        condition: s.condition,
                        true_target: None,
                        false_target: None,
                    });
                    self.attach(&mut head, &mut cur, cond);
                    let join = self.cfg.add_node(CfgNodeKind::Join);

                    frames.push(Frame { kind: FrameKind::If, start: cond, exit: join });
                    let true_head = self.chain(&s.true_body, frames)?;
                    let false_head = self.chain(&s.false_body, frames)?;
                    frames.pop();

                    self.set_branch_targets(cond, true_head, false_head)?;
                    self.cfg.add_edge(cond, true_head);
                    self.cfg.add_edge(cond, false_head);
                    if let Some(tail) = self.find_tail(true_head) {
                        self.cfg.add_edge(tail, join);
                    }
                    if let Some(tail) = self.find_tail(false_head) {
                        self.cfg.add_edge(tail, join);
                    }
                    cur = Some(join);
                }
                Statement::While(s) => {
                    let cond = self.cfg.add_node(CfgNodeKind::Conditional {
                        condition: s.condition,
                        true_target: None,
                        false_target: None,
                    });
                    self.attach(&mut head, &mut cur, cond);
                    let join = self.cfg.add_node(CfgNodeKind::Join);
                    let escape = self.cfg.add_node(CfgNodeKind::Empty);

                    frames.push(Frame { kind: FrameKind::While, start: cond, exit: join });
                    let body_head = self.chain(&s.body, frames)?;
                    frames.pop();

                    self.set_branch_targets(cond, body_head, escape)?;
                    self.cfg.add_edge(cond, body_head);
                    if let Some(tail) = self.find_tail(body_head) {
                        // loop back-edge
                        self.cfg.add_edge(tail, cond);
                    }
                    self.cfg.add_edge(cond, escape);
                    self.cfg.add_edge(escape, join);
                    cur = Some(join);
                }
            }
        }

        // The outermost chain falls through into the function exit.
        if !halted && frames.len() == 1 {
            let exit = frames[0].exit;
            let tail = match cur {
                Some(c) => c,
                None => {
                    let empty = self.cfg.add_node(CfgNodeKind::Empty);
                    head = Some(empty);
                    empty
                }
            };
            self.cfg.add_edge(tail, exit);
        }

        Ok(match head {
            Some(h) => h,
            None => self.cfg.add_node(CfgNodeKind::Empty),
        })
    }

    fn attach(&mut self, head: &mut Option<CfgNodeId>, cur: &mut Option<CfgNodeId>, node: CfgNodeId) {
        match *cur {
            Some(c) => self.cfg.add_edge(c, node),
            None => *head = Some(node),
        }
        *cur = Some(node);
    }

    fn thread_terminator(
        &mut self,
        node: CfgNodeId,
        terminator: Terminator,
        frames: &[Frame],
    ) -> Result<()> {
        match terminator {
            Terminator::Break => {
                let target = innermost_while(frames).ok_or_else(|| {
                    AnalysisError::ContextViolation("`break` with no enclosing while".into())
                })?;
                self.cfg.add_edge(node, target.exit);
            }
            Terminator::Continue => {
                let target = innermost_while(frames).ok_or_else(|| {
                    AnalysisError::ContextViolation("`continue` with no enclosing while".into())
                })?;
                self.cfg.add_edge(node, target.start);
            }
            Terminator::Return => {
                let outermost = frames.first().ok_or_else(|| {
                    AnalysisError::InvariantFailure("terminator threaded with empty frame stack".into())
                })?;
                if outermost.kind != FrameKind::Function {
                    return Err(AnalysisError::ContextViolation(
                        "`return` outside a function context".into(),
                    ));
                }
                self.cfg.add_edge(node, outermost.exit);
            }
        }
        Ok(())
    }

    fn terminator_of(&self, root: TokenId) -> Option<Terminator> {
        for token in in_order(&self.view, Some(root)) {
            match self.view.text(token) {
                "break" => return Some(Terminator::Break),
                "continue" => return Some(Terminator::Continue),
                "return" => return Some(Terminator::Return),
                _ => {}
            }
        }
        None
    }

    /// First successor-less node reachable from `head`, pruning at basic
    /// blocks that contain a jump (those are threaded elsewhere). `None`
    /// means every path out of the branch halted.
    fn find_tail(&self, head: CfgNodeId) -> Option<CfgNodeId> {
        let mut seen = HashSet::new();
        self.tail_from(head, &mut seen)
    }

    fn tail_from(&self, id: CfgNodeId, seen: &mut HashSet<CfgNodeId>) -> Option<CfgNodeId> {
        if !seen.insert(id) {
            return None;
        }
        if self.is_threaded_jump(id) {
            return None;
        }
        let node = self.cfg.node(id);
        if node.next.is_empty() {
            return Some(id);
        }
        for &next in &node.next {
            if let Some(tail) = self.tail_from(next, seen) {
                return Some(tail);
            }
        }
        None
    }

    fn is_threaded_jump(&self, id: CfgNodeId) -> bool {
        matches!(
            &self.cfg.node(id).kind,
            CfgNodeKind::Basic { token } if self.terminator_of(*token).is_some()
        )
    }

    fn set_branch_targets(
        &mut self,
        cond: CfgNodeId,
        true_head: CfgNodeId,
        false_head: CfgNodeId,
    ) -> Result<()> {
        match &mut self.cfg.nodes[cond.0 as usize].kind {
            CfgNodeKind::Conditional { true_target, false_target, .. } => {
                if true_target.is_some() || false_target.is_some() {
                    return Err(AnalysisError::InvariantFailure(
                        "conditional branch targets linked twice".into(),
                    ));
                }
                *true_target = Some(true_head);
                *false_target = Some(false_head);
                Ok(())
            }
            _ => Err(AnalysisError::InvariantFailure(
                "branch targets set on a non-conditional node".into(),
            )),
        }
    }
}

fn innermost_while(frames: &[Frame]) -> Option<Frame> {
    frames.iter().rev().copied().find(|f| f.kind == FrameKind::While)
}
