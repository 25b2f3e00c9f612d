//! PhysFix CLI - wiring, not product
//!
//! Zero magic. Explicit config. Machine-readable output.

use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::PathBuf;
use std::process;

use physfix::analysis::{analyze_function, FunctionAnalysis};
use physfix::ast::function_to_yaml;
use physfix::cfg::CfgNodeKind;
use physfix::config::PhysfixConfig;
use physfix::dump::{read_dump, Configuration};
use physfix::tokens::statement_text;
use physfix::units::{
    connected_error_groups, fix_addition_subtraction, locate_error, UnitCatalog, UnitsReport,
};

/// Load config from file or use defaults
fn load_config(config_path: Option<PathBuf>) -> PhysfixConfig {
    if let Some(path) = config_path {
        PhysfixConfig::from_path(&path).unwrap_or_else(|e| {
            eprintln!(
                "{{\"status\":\"error\",\"message\":\"Failed to read config: {}\",\"fatal\":true}}",
                e
            );
            process::exit(1);
        })
    } else if PathBuf::from("./physfix.toml").exists() {
        PhysfixConfig::from_path("./physfix.toml").unwrap_or_default()
    } else {
        PhysfixConfig::default()
    }
}

#[derive(Parser)]
#[command(name = "physfix")]
#[command(about = "Dump-based control-flow and unit-consistency analysis")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a dump and print each function's statement tree
    Ast {
        /// Path to the dump file
        dump: PathBuf,

        /// Config file (default: ./physfix.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build and print control-flow graphs
    Cfg {
        /// Path to the dump file
        dump: PathBuf,

        /// Config file (default: ./physfix.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Build and print data-dependency graphs
    Deps {
        /// Path to the dump file
        dump: PathBuf,

        /// Config file (default: ./physfix.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Propose unit-consistency fixes from a units report
    Fix {
        /// Path to the dump file
        dump: PathBuf,

        /// Path to the units-analysis JSON report
        report: PathBuf,

        /// Config file (default: ./physfix.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ast { dump, config } => cmd_ast(dump, config),
        Commands::Cfg { dump, config } => cmd_cfg(dump, config),
        Commands::Deps { dump, config } => cmd_deps(dump, config),
        Commands::Fix { dump, report, config } => cmd_fix(dump, report, config),
    };

    match result {
        Ok(output) => {
            println!("{}", output);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{{\"status\":\"error\",\"message\":\"{}\",\"fatal\":true}}", e);
            process::exit(1);
        }
    }
}

/// Analyze the dump's primary configuration, reporting dropped functions
/// as JSON lines on stderr.
fn analyze(
    dump_path: &PathBuf,
    config: &PhysfixConfig,
) -> Result<(Configuration, Vec<FunctionAnalysis>), String> {
    let dump = read_dump(dump_path).map_err(|e| format!("Failed to read dump: {}", e))?;
    let configuration = dump
        .primary()
        .ok_or_else(|| "Dump contains no configuration".to_string())?
        .clone();

    let mut analyses = Vec::new();
    for function in configuration.functions() {
        if !config.wants_function(&function.name) {
            continue;
        }
        match analyze_function(&configuration, &function) {
            Ok(analysis) => analyses.push(analysis),
            Err(e) => eprintln!(
                "{{\"status\":\"error\",\"function\":\"{}\",\"message\":\"{}\",\"fatal\":false}}",
                function.name, e
            ),
        }
    }
    Ok((configuration, analyses))
}

fn render(config: &PhysfixConfig, value: &serde_json::Value) -> Result<String, String> {
    if config.output.format == "json" {
        serde_json::to_string_pretty(value).map_err(|e| e.to_string())
    } else {
        serde_yaml::to_string(value).map_err(|e| e.to_string())
    }
}

fn cmd_ast(dump: PathBuf, config: Option<PathBuf>) -> Result<String, String> {
    let config = load_config(config);
    let (configuration, analyses) = analyze(&dump, &config)?;

    let mut out = String::new();
    for analysis in &analyses {
        out.push_str(
            &function_to_yaml(&configuration, &analysis.decl).map_err(|e| e.to_string())?,
        );
    }
    Ok(out)
}

fn cmd_cfg(dump: PathBuf, config: Option<PathBuf>) -> Result<String, String> {
    let config = load_config(config);
    let (configuration, analyses) = analyze(&dump, &config)?;

    let functions: Vec<serde_json::Value> = analyses
        .iter()
        .map(|a| {
            let view = configuration.token_view_with(&a.decl.synthetic);
            let nodes: Vec<serde_json::Value> = a
                .cfg
                .reachable
                .iter()
                .map(|&id| {
                    let node = a.cfg.node(id);
                    let label = match &node.kind {
                        CfgNodeKind::Entry { .. } => "entry".to_string(),
                        CfgNodeKind::Exit => "exit".to_string(),
                        CfgNodeKind::Basic { token } => statement_text(&view, *token),
                        CfgNodeKind::Conditional { condition, .. } => {
                            format!("if {}", statement_text(&view, *condition))
                        }
                        CfgNodeKind::Join => "join".to_string(),
                        CfgNodeKind::Empty => "empty".to_string(),
                    };
                    json!({
                        "id": id.0,
                        "label": label,
                        "next": node.next.iter().map(|n| n.0).collect::<Vec<_>>(),
                    })
                })
                .collect();
            json!({ "function": a.cfg.name, "hash": a.cfg.compute_hash(), "nodes": nodes })
        })
        .collect();

    render(&config, &json!({ "cfgs": functions }))
}

fn cmd_deps(dump: PathBuf, config: Option<PathBuf>) -> Result<String, String> {
    let config = load_config(config);
    let (configuration, analyses) = analyze(&dump, &config)?;

    let functions: Vec<serde_json::Value> = analyses
        .iter()
        .map(|a| {
            let nodes: Vec<serde_json::Value> = a
                .dependencies
                .nodes
                .iter()
                .map(|n| {
                    json!({
                        "cfg_node": n.cfg_node.0,
                        "variable": configuration.variable_name(n.variable),
                        "next": n.next.iter().map(|d| d.0).collect::<Vec<_>>(),
                    })
                })
                .collect();
            json!({
                "function": a.cfg.name,
                "hash": a.dependencies.compute_hash(),
                "nodes": nodes,
                "components": a.dependencies.connected_components().len(),
            })
        })
        .collect();

    render(&config, &json!({ "dependency_graphs": functions }))
}

fn cmd_fix(dump: PathBuf, report: PathBuf, config: Option<PathBuf>) -> Result<String, String> {
    let config = load_config(config);
    let (configuration, analyses) = analyze(&dump, &config)?;

    let report = UnitsReport::from_path(&report).map_err(|e| format!("Failed to read report: {}", e))?;
    let catalog = UnitCatalog::new(&report);

    let mut sites = Vec::new();
    let mut proposals = Vec::new();
    for error in &report.errors {
        let Some(site) = locate_error(&configuration, &analyses, error) else {
            eprintln!(
                "{{\"status\":\"error\",\"message\":\"No statement owns token {}\",\"fatal\":false}}",
                error.root_token_id
            );
            continue;
        };
        let analysis = &analyses[site.function];
        let fixes = match fix_addition_subtraction(
            &configuration,
            analysis,
            &site,
            &catalog,
            config.analysis.max_fix_depth,
        ) {
            Ok(fixes) => fixes,
            Err(e) => {
                eprintln!(
                    "{{\"status\":\"error\",\"message\":\"{}\",\"fatal\":false}}",
                    e
                );
                continue;
            }
        };
        let view = configuration.token_view_with(&analysis.decl.synthetic);
        proposals.push(json!({
            "function": analysis.cfg.name,
            "statement": statement_text(&view, site.root_token),
            "error_type": error.error_type,
            "candidates": fixes.iter().map(|f| f.rendered.clone()).collect::<Vec<_>>(),
        }));
        sites.push(site);
    }

    let groups = connected_error_groups(&analyses, &sites);
    render(
        &config,
        &json!({ "proposals": proposals, "connected_groups": groups.len() }),
    )
}
