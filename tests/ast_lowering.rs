//! Dump-to-AST lifting and desugaring tests.
//!
//! Statement trees come out of the parser in the {block, if, while}
//! vocabulary only; these tests pin down the desugaring laws and the
//! scope-discipline failure modes.

mod common;

use common::*;
use physfix::ast::{function_to_value, Statement};
use physfix::dump::Configuration;
use physfix::tokens::statement_text;
use physfix::{AnalysisError, FunctionAnalysis};
use serde_json::json;

fn text_of(config: &Configuration, analysis: &FunctionAnalysis, stmt: &Statement) -> String {
    let view = config.token_view_with(&analysis.decl.synthetic);
    match stmt {
        Statement::Block(b) => statement_text(&view, b.root),
        Statement::If(s) => format!("if {}", statement_text(&view, s.condition)),
        Statement::While(s) => format!("while {}", statement_text(&view, s.condition)),
    }
}

#[test]
fn straight_line_body_is_a_block_list() {
    let mut f = FunctionFixture::new("straight");
    f.assign("vel_x", &["0"]);
    f.assign("ang_z", &["0"]);
    f.assign("err_x", &["0"]);
    f.assign("err_y", &["err_x", "+", "ang_z"]);
    let config = f.finish();

    let analysis = analyze_first(&config);
    let texts: Vec<String> =
        analysis.decl.body.iter().map(|s| text_of(&config, &analysis, s)).collect();
    assert_eq!(
        texts,
        vec!["vel_x = 0", "ang_z = 0", "err_x = 0", "err_y = err_x + ang_z"]
    );
}

#[test]
fn for_desugars_to_init_while_update() {
    let mut f = FunctionFixture::new("counted");
    f.assign("n", &["0"]);
    f.begin_for("i", "0", &["i", "<", "10"], "i");
    f.assign("n", &["n", "+", "i"]);
    f.end_for();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let body = &analysis.decl.body;
    assert_eq!(body.len(), 3, "n = 0; init; while");

    assert_eq!(text_of(&config, &analysis, &body[1]), "i = 0");
    let Statement::While(lowered) = &body[2] else {
        panic!("for must lower to a while, got {:?}", body[2]);
    };
    let view = config.token_view_with(&analysis.decl.synthetic);
    assert_eq!(statement_text(&view, lowered.condition), "i < 10");

    // The update runs at the end of every iteration.
    let texts: Vec<String> =
        lowered.body.iter().map(|s| text_of(&config, &analysis, s)).collect();
    assert_eq!(texts, vec!["n = n + i", "i ++"]);
}

#[test]
fn switch_fall_through_extends_breakless_cases() {
    let mut f = FunctionFixture::new("dispatch");
    f.assign("x", &["1"]);
    f.begin_switch("x");
    f.case("1");
    f.assign("a", &["1"]);
    f.case("2");
    f.assign("b", &["2"]);
    f.stmt_break();
    f.case("3");
    f.assign("c", &["3"]);
    f.stmt_break();
    f.end_switch();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let body = &analysis.decl.body;
    assert_eq!(body.len(), 2, "x = 1; lowered switch");

    // case 1 falls through into case 2's body, but not into case 3's.
    let Statement::If(level1) = &body[1] else { panic!("switch must lower to an if") };
    assert_eq!(text_of(&config, &analysis, &body[1]), "if x == 1");
    let texts: Vec<String> =
        level1.true_body.iter().map(|s| text_of(&config, &analysis, s)).collect();
    assert_eq!(texts, vec!["a = 1", "b = 2"]);

    // The chain is right-leaning: case 2 is the sole false statement.
    assert_eq!(level1.false_body.len(), 1);
    let Statement::If(level2) = &level1.false_body[0] else { panic!("chain must nest") };
    assert_eq!(
        level2.true_body.iter().map(|s| text_of(&config, &analysis, s)).collect::<Vec<_>>(),
        vec!["b = 2"]
    );

    let Statement::If(level3) = &level2.false_body[0] else { panic!("chain must nest") };
    assert_eq!(
        level3.true_body.iter().map(|s| text_of(&config, &analysis, s)).collect::<Vec<_>>(),
        vec!["c = 3"]
    );
    assert!(level3.false_body.is_empty());
}

#[test]
fn switch_default_becomes_the_final_false_branch() {
    let mut f = FunctionFixture::new("dispatch");
    f.assign("x", &["1"]);
    f.begin_switch("x");
    f.case("1");
    f.assign("a", &["1"]);
    f.stmt_break();
    f.default_case();
    f.assign("d", &["4"]);
    f.end_switch();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let Statement::If(lowered) = &analysis.decl.body[1] else { panic!("expected if") };
    assert_eq!(
        lowered.true_body.iter().map(|s| text_of(&config, &analysis, s)).collect::<Vec<_>>(),
        vec!["a = 1"]
    );
    assert_eq!(
        lowered.false_body.iter().map(|s| text_of(&config, &analysis, s)).collect::<Vec<_>>(),
        vec!["d = 4"]
    );
}

#[test]
fn else_if_nests_as_the_sole_false_statement() {
    let mut f = FunctionFixture::new("chained");
    f.assign("x", &["0"]);
    f.begin_if(&["x", "<", "0"]);
    f.assign("a", &["1"]);
    f.end_if();
    f.begin_else();
    f.begin_if(&["x", ">", "0"]);
    f.assign("b", &["2"]);
    f.end_if();
    f.begin_else();
    f.assign("c", &["3"]);
    f.end_else();
    f.end_else();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let Statement::If(outer) = &analysis.decl.body[1] else { panic!("expected if") };
    assert_eq!(outer.false_body.len(), 1, "else-if is the outer false branch's sole statement");

    let Statement::If(inner) = &outer.false_body[0] else { panic!("expected nested if") };
    assert_eq!(
        inner.true_body.iter().map(|s| text_of(&config, &analysis, s)).collect::<Vec<_>>(),
        vec!["b = 2"]
    );
    assert_eq!(
        inner.false_body.iter().map(|s| text_of(&config, &analysis, s)).collect::<Vec<_>>(),
        vec!["c = 3"]
    );
}

#[test]
fn nested_switch_is_rejected() {
    let mut f = FunctionFixture::new("nested");
    f.assign("x", &["1"]);
    f.begin_switch("x");
    f.case("1");
    f.begin_switch("x");
    f.case("2");
    f.assign("a", &["1"]);
    f.stmt_break();
    f.end_switch();
    f.stmt_break();
    f.end_switch();
    let config = f.finish();

    let err = try_analyze_first(&config).unwrap_err();
    assert!(matches!(err, AnalysisError::UnsupportedConstruct(_)), "got {err:?}");
}

#[test]
fn unconsumed_scope_fails_the_function() {
    let mut f = FunctionFixture::new("leftover");
    f.assign("x", &["0"]);
    f.phantom_scope(physfix::dump::ScopeKind::If);
    let config = f.finish();

    let err = try_analyze_first(&config).unwrap_err();
    assert!(matches!(err, AnalysisError::MalformedDump(_)), "got {err:?}");
}

#[test]
fn trailing_break_is_not_duplicated() {
    let mut f = FunctionFixture::new("loop_break");
    f.assign("i", &["0"]);
    f.begin_while(&["i", "<", "10"]);
    f.compound_assign("err_x", "+=", "1");
    f.stmt_break();
    f.end_while();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let Statement::While(lowered) = &analysis.decl.body[1] else { panic!("expected while") };
    let breaks = lowered
        .body
        .iter()
        .filter(|s| text_of(&config, &analysis, s) == "break")
        .count();
    assert_eq!(breaks, 1, "the terminator scan must not re-append a captured break");
}

#[test]
fn mid_body_break_keeps_source_order() {
    // The backward terminator scan crosses whole statements, so a break
    // that is not the structural tail is still found; the parsed body must
    // nevertheless keep source order with a single break statement.
    let mut f = FunctionFixture::new("early_break");
    f.assign("i", &["0"]);
    f.begin_while(&["i", "<", "10"]);
    f.compound_assign("err_x", "+=", "1");
    f.stmt_break();
    f.incr("i");
    f.end_while();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let Statement::While(lowered) = &analysis.decl.body[1] else { panic!("expected while") };
    let texts: Vec<String> =
        lowered.body.iter().map(|s| text_of(&config, &analysis, s)).collect();
    assert_eq!(texts, vec!["err_x += 1", "break", "i ++"]);
}

#[test]
fn canonical_serialization_shape() {
    let mut f = FunctionFixture::new("shaped");
    f.assign("x", &["0"]);
    f.begin_if(&["x", "<", "0"]);
    f.assign("x", &["1"]);
    f.end_if();
    let config = f.finish();

    let analysis = analyze_first(&config);
    let value = function_to_value(&config, &analysis.decl);
    assert_eq!(
        value,
        json!({
            "function": {
                "name": "shaped",
                "body": [
                    { "block": { "statement": "x = 0" } },
                    { "if": {
                        "condition": "x < 0",
                        "true": [ { "block": { "statement": "x = 1" } } ],
                        "false": [],
                    } },
                ],
            }
        })
    );

    // The YAML rendering round-trips to the same value.
    let yaml = physfix::ast::function_to_yaml(&config, &analysis.decl).unwrap();
    let back: serde_json::Value = serde_yaml::from_str(&yaml).unwrap();
    assert_eq!(back, value);
}
