//! Addition/subtraction repair heuristic.
//!
//! ## Algorithm
//!
//! 1. Resolve each reported error to the function analysis and dependency
//!    node whose statement owns the reported root token.
//! 2. Compute the unit the offending operand *should* carry by walking
//!    from the error token up to the statement root and inverting the
//!    enclosing `*`, `/`, and `sqrt(...)` operations against the LHS unit.
//! 3. Pick the operand whose unit disagrees, descend through nested
//!    `+`/`-` to the fixable subterm, and search breadth-first (depth
//!    bounded) for multiply/divide chains of reaching-definition variables
//!    whose units bridge the gap.
//! 4. Emit every chain found as a rendered rewrite proposal.

use std::collections::BTreeSet;

use crate::analysis::FunctionAnalysis;
use crate::cfg::{CfgNodeId, CfgNodeKind};
use crate::dataflow::DepNodeId;
use crate::dump::{Configuration, TokenId, TokenView, VariableId};
use crate::error::{AnalysisError, Result};
use crate::tokens::{in_order, lhs_of, statement_text, variables_in};
use crate::units::algebra::UnitMap;
use crate::units::report::{UnitCatalog, UnitError};

/// Where a reported error lives in the analyzed program.
#[derive(Debug, Clone, Copy)]
pub struct ErrorSite {
    /// Index of the owning function in the analysis list.
    pub function: usize,

    /// Basic block owning the statement.
    pub cfg_node: CfgNodeId,

    /// Dependency node materialized for that block.
    pub dep_node: DepNodeId,

    /// Root token of the statement.
    pub root_token: TokenId,

    /// The reported operator token inside the statement, when found.
    pub error_token: Option<TokenId>,
}

/// One proposed rewrite: multiply/divide the fixable subterm by variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFix {
    /// Variables to multiply by.
    pub multiply: Vec<VariableId>,

    /// Variables to divide by.
    pub divide: Vec<VariableId>,

    /// Replacement expression text.
    pub rendered: String,
}

/// Resolve a reported error to its statement and dependency node.
///
/// Returns `None` when no analyzed function owns the root token, or when
/// the owning statement defines nothing (no dependency node exists).
pub fn locate_error(
    config: &Configuration,
    analyses: &[FunctionAnalysis],
    error: &UnitError,
) -> Option<ErrorSite> {
    for (function, analysis) in analyses.iter().enumerate() {
        let view = config.token_view_with(&analysis.decl.synthetic);
        for &cfg_node in &analysis.cfg.reachable {
            let CfgNodeKind::Basic { token } = &analysis.cfg.node(cfg_node).kind else {
                continue;
            };
            let token = *token;
            if view.get(token).ext_id != error.root_token_id {
                continue;
            }
            let dep_node = analysis.dependencies.first_node_for_cfg(cfg_node)?;
            let error_token = in_order(&view, Some(token))
                .into_iter()
                .find(|&t| view.get(t).ext_id == error.token_id);
            return Some(ErrorSite {
                function,
                cfg_node,
                dep_node,
                root_token: token,
                error_token,
            });
        }
    }
    None
}

/// Group error sites whose dependency nodes share a connected component.
/// Returns index sets into `sites`; connected errors can be repaired as a
/// batch.
pub fn connected_error_groups(
    analyses: &[FunctionAnalysis],
    sites: &[ErrorSite],
) -> Vec<Vec<usize>> {
    let mut grouped = vec![false; sites.len()];
    let mut groups = Vec::new();

    for i in 0..sites.len() {
        if grouped[i] {
            continue;
        }
        let component: BTreeSet<DepNodeId> = analyses[sites[i].function]
            .dependencies
            .connected_component(sites[i].dep_node)
            .into_iter()
            .collect();

        let mut group = Vec::new();
        for (j, site) in sites.iter().enumerate() {
            if !grouped[j]
                && site.function == sites[i].function
                && component.contains(&site.dep_node)
            {
                grouped[j] = true;
                group.push(j);
            }
        }
        groups.push(group);
    }
    groups
}

/// Unit an operand must carry for the statement's LHS unit to come out
/// right: walk from the token to the statement root, inverting `*`, `/`,
/// and `sqrt(...)` along the way.
pub fn inverse_unit(
    view: &TokenView<'_>,
    config: &Configuration,
    catalog: &UnitCatalog,
    lhs_unit: &UnitMap,
    token: TokenId,
) -> Result<UnitMap> {
    let mut unit = lhs_unit.clone();
    let mut cur = token;
    while let Some(parent) = view.get(cur).ast_parent {
        let parent_tok = view.get(parent);
        match parent_tok.text.as_str() {
            "*" => {
                let other = sibling_of(view, parent, cur)?;
                unit = unit.multiply(&operand_unit(view, config, catalog, other)?);
            }
            "/" => {
                let other = sibling_of(view, parent, cur)?;
                unit = unit.divide(&operand_unit(view, config, catalog, other)?);
            }
            "(" => {
                let callee = parent_tok.ast_op1;
                if callee.map(|c| view.text(c)) == Some("sqrt") {
                    unit = unit.pow(2.0);
                }
            }
            _ => {}
        }
        cur = parent;
    }
    Ok(unit)
}

/// Search for multiply/divide chains of reaching variables that transform
/// `current` into `target` at the given block. Breadth-first, bounded by
/// `depth` chain links.
pub fn apply_unit_multiplication(
    config: &Configuration,
    analysis: &FunctionAnalysis,
    cfg_node: CfgNodeId,
    token_to_fix: TokenId,
    current: &UnitMap,
    target: &UnitMap,
    catalog: &UnitCatalog,
    depth: usize,
) -> Vec<CandidateFix> {
    let view = config.token_view_with(&analysis.decl.synthetic);
    let reaching: Vec<VariableId> =
        analysis.reach.reach_in(cfg_node).iter().map(|rd| rd.variable).collect();

    let mut candidates: Vec<(Vec<VariableId>, Vec<VariableId>)> = Vec::new();
    let mut frontier: Vec<(Vec<VariableId>, Vec<VariableId>, UnitMap)> =
        vec![(Vec::new(), Vec::new(), current.clone())];

    for _ in 0..depth {
        let mut next_frontier = Vec::new();
        for (multiply, divide, unit) in &frontier {
            if unit == target && !(multiply.is_empty() && divide.is_empty()) {
                let mut key = (multiply.clone(), divide.clone());
                key.0.sort();
                key.1.sort();
                if !candidates.contains(&key) {
                    candidates.push(key);
                }
            }
            for &variable in &reaching {
                let ext_id = &config.variable(variable).ext_id;
                let Some(var_unit) = catalog.variable_unit(ext_id) else { continue };
                if var_unit.is_dimensionless() {
                    continue;
                }
                if !divide.contains(&variable) {
                    let mut m = multiply.clone();
                    m.push(variable);
                    next_frontier.push((m, divide.clone(), unit.multiply(var_unit)));
                }
                if !multiply.contains(&variable) {
                    let mut d = divide.clone();
                    d.push(variable);
                    next_frontier.push((multiply.clone(), d, unit.divide(var_unit)));
                }
            }
        }
        frontier = next_frontier;
    }

    candidates
        .into_iter()
        .map(|(multiply, divide)| {
            let rendered = render_fix(config, &view, token_to_fix, &multiply, &divide);
            CandidateFix { multiply, divide, rendered }
        })
        .collect()
}

fn render_fix(
    config: &Configuration,
    view: &TokenView<'_>,
    token: TokenId,
    multiply: &[VariableId],
    divide: &[VariableId],
) -> String {
    let base = statement_text(view, token);
    let mut parts: Vec<String> = Vec::new();

    if view.get(token).variable.is_some() {
        parts.push(base);
        for &v in multiply {
            parts.push("*".to_string());
            parts.push(config.variable_name(v).to_string());
        }
    } else {
        for &v in multiply {
            parts.push(config.variable_name(v).to_string());
            parts.push("*".to_string());
        }
        parts.push(base);
    }
    for &v in divide {
        parts.push("/".to_string());
        parts.push(config.variable_name(v).to_string());
    }
    parts.join(" ")
}

/// Propose rewrites for an addition/subtraction unit mismatch.
pub fn fix_addition_subtraction(
    config: &Configuration,
    analysis: &FunctionAnalysis,
    site: &ErrorSite,
    catalog: &UnitCatalog,
    depth: usize,
) -> Result<Vec<CandidateFix>> {
    let view = config.token_view_with(&analysis.decl.synthetic);
    let statement = in_order(&view, Some(site.root_token));

    let lhs_vars = variables_in(&view, lhs_of(&view, &statement));
    let &lhs_var = lhs_vars.first().ok_or_else(|| {
        AnalysisError::MalformedReport("error statement has no variable on its LHS".into())
    })?;
    let lhs_unit = catalog
        .variable_unit(&config.variable(lhs_var).ext_id)
        .ok_or_else(|| AnalysisError::MalformedReport("LHS variable has no inferred unit".into()))?
        .clone();

    let error_token = site.error_token.ok_or_else(|| {
        AnalysisError::MalformedReport("reported token is not part of the statement".into())
    })?;
    let target_unit = inverse_unit(&view, config, catalog, &lhs_unit, error_token)?;

    let error_tok = view.get(error_token);
    let (left, right) = match (error_tok.ast_op1, error_tok.ast_op2) {
        (Some(left), Some(right)) => (left, right),
        _ => {
            return Err(AnalysisError::MalformedReport(
                "reported operator token has no operands".into(),
            ))
        }
    };

    let left_unit = operand_unit(&view, config, catalog, left)?;
    let right_unit = operand_unit(&view, config, catalog, right)?;

    // Only one side is assumed wrong; when the right side disagrees we fix
    // it and descend along left operands, and symmetrically otherwise.
    let (mut cur, wrong_unit, descend_left) = if right_unit != target_unit {
        (right, right_unit, true)
    } else {
        (left, left_unit, false)
    };

    let token_to_fix = loop {
        let tok = view.get(cur);
        if tok.variable.is_some() {
            break cur;
        }
        match tok.text.as_str() {
            "(" | "*" | "/" => break cur,
            "+" | "-" => {
                let next = if descend_left { tok.ast_op1 } else { tok.ast_op2 };
                cur = next.ok_or_else(|| {
                    AnalysisError::MalformedReport("arithmetic token has a missing operand".into())
                })?;
            }
            other => {
                return Err(AnalysisError::MalformedReport(format!(
                    "cannot locate a fixable operand (stopped at `{other}`)"
                )))
            }
        }
    };

    Ok(apply_unit_multiplication(
        config,
        analysis,
        site.cfg_node,
        token_to_fix,
        &wrong_unit,
        &target_unit,
        catalog,
        depth,
    ))
}

fn sibling_of(view: &TokenView<'_>, parent: TokenId, child: TokenId) -> Result<TokenId> {
    let parent_tok = view.get(parent);
    let other = if parent_tok.ast_op2 == Some(child) { parent_tok.ast_op1 } else { parent_tok.ast_op2 };
    other.ok_or_else(|| {
        AnalysisError::MalformedReport("operator token is missing its other operand".into())
    })
}

fn operand_unit(
    view: &TokenView<'_>,
    config: &Configuration,
    catalog: &UnitCatalog,
    token: TokenId,
) -> Result<UnitMap> {
    let tok = view.get(token);
    let unit = match tok.variable {
        Some(variable) => catalog.variable_unit(&config.variable(variable).ext_id),
        None => catalog.token_unit(&tok.ext_id),
    };
    unit.cloned().ok_or_else(|| {
        AnalysisError::MalformedReport(format!("no unit known for token `{}`", tok.ext_id))
    })
}
