//! eval-desk: runner for the ISO 9001 evaluation workspace.
//!
//! Usage:
//!   eval-desk --data-dir ./data
//!   eval-desk --data-dir ./data --db eval.db --ipc-mode
//!   eval-desk --data-dir ./data --http 127.0.0.1:8080

mod http;
mod ipc;
mod llm;
mod views;

use anyhow::Result;
use evaluation_core::{
    analysis::DisabledAnalyzer,
    config::{AnalysisConfig, AppConfig},
    hierarchy::OrgNode,
    model::EdgeKind,
    workspace::Workspace,
};
use http::SharedAnalyzer;
use llm::LlmAnalyzer;
use std::env;
use std::net::SocketAddr;
use std::sync::Arc;
use views::TreeView;

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");
    let data_dir = flag_value(&args, "--data-dir").unwrap_or("./data");

    let mut config = AppConfig::load(data_dir)?;
    if let Some(db) = flag_value(&args, "--db") {
        config.db_path = db.to_string();
    }
    let http_addr = if args.iter().any(|a| a == "--http") {
        Some(
            flag_value(&args, "--http")
                .filter(|v| !v.starts_with("--"))
                .unwrap_or(config.http_addr.as_str())
                .to_string(),
        )
    } else {
        None
    };

    if !ipc_mode {
        println!("eval-desk: ISO 9001 employee evaluation");
        println!("  data_dir:  {data_dir}");
        println!("  db:        {}", config.db_path);
        println!("  analysis:  {}", if config.analysis.enabled { config.analysis.model.as_str() } else { "disabled" });
        println!();
    }

    // The blocking HTTP client must exist before any tokio runtime starts.
    let analyzer = build_analyzer(&config.analysis);
    let mut ws = Workspace::open(config, data_dir);

    if let Some(addr) = http_addr {
        let addr: SocketAddr = addr.parse()?;
        let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
        runtime.block_on(http::serve(ws, analyzer, addr))?;
    } else if ipc_mode {
        ipc::run_ipc_loop(&mut ws, analyzer.as_ref())?;
    } else {
        print_summary(&ws);
    }

    Ok(())
}

fn build_analyzer(config: &AnalysisConfig) -> SharedAnalyzer {
    if !config.enabled {
        return Arc::new(DisabledAnalyzer);
    }
    match LlmAnalyzer::from_config(config) {
        Ok(a) => Arc::new(a),
        Err(e) => {
            log::warn!("AI analysis unavailable ({e}); evaluations will use the fallback text");
            Arc::new(DisabledAnalyzer)
        }
    }
}

fn print_summary(ws: &Workspace) {
    let tree = TreeView::build(ws);
    let stats = ws.stats();

    println!("=== ORGANIZATION ({:?}) ===", ws.source());
    for root in &tree.roots {
        print_node(root, 1);
    }
    for orphan in &tree.orphaned_references {
        let role = match orphan.kind {
            EdgeKind::Primary => "primary role".to_string(),
            EdgeKind::Additional(i) => format!("additional role #{}", i + 1),
        };
        println!(
            "  ! {} ({role}) reports to missing {}",
            orphan.employee_id, orphan.missing_supervisor
        );
    }
    if !tree.unreachable.is_empty() {
        println!("  ! unreachable: {}", tree.unreachable.join(", "));
    }
    if !tree.orphaned_departments.is_empty() {
        println!("  ! unknown departments: {}", tree.orphaned_departments.join(", "));
    }

    println!();
    println!("=== EVALUATIONS ===");
    println!("  total:          {}", stats.total_evaluations);
    println!("  evaluated:      {}", stats.employees_evaluated);
    println!("  overall avg:    {}", fmt_score(stats.overall_average));
    println!(
        "  tiers:          high {} | mid {} | low {}",
        stats.tiers.high, stats.tiers.mid, stats.tiers.low
    );
    for (level, count) in &stats.compliance_levels {
        println!("  ISO {level:<12} {count}");
    }

    println!();
    println!("=== BY DEPARTMENT ===");
    for (dept, avg) in &stats.by_department {
        println!("  {dept:<16} {}", fmt_score(*avg));
    }

    if !stats.ranking.is_empty() {
        println!();
        println!("=== RANKING ===");
        for (i, r) in stats.ranking.iter().enumerate() {
            println!(
                "  {:>2}. {:<20} {:<14} {:.2} ({} evals)",
                i + 1,
                r.name,
                r.department,
                r.average,
                r.evaluations
            );
        }
    }
}

fn print_node(node: &OrgNode, depth: usize) {
    let marker = if node.dashed { "┄ " } else { "" };
    let titles: Vec<&str> = node.roles.iter().map(|r| r.job_title.as_str()).collect();
    let mut flags = String::new();
    if node.cycle {
        flags.push_str(" [cycle]");
    }
    if node.truncated {
        flags.push_str(" [truncated]");
    }
    println!(
        "{}{marker}{} ({}){flags}",
        "  ".repeat(depth),
        node.name,
        titles.join(" / ")
    );
    for child in &node.children {
        print_node(child, depth + 1);
    }
}

fn fmt_score(score: Option<f64>) -> String {
    score.map_or_else(|| "N/A".to_string(), |s| format!("{s:.2}"))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2).find(|w| w[0] == flag).map(|w| w[1].as_str())
}
