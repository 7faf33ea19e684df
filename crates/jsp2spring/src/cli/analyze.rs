//! `analyze` command: classification and planning only

use crate::cli::config::resolve;
use crate::cli::error::HelpfulError;
use crate::cli::output::{format_size, print_json, print_table};
use jsp2spring_core::{Analysis, Collision, Engine, FileCategory, ScanError, ScanStats};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

#[derive(Debug)]
pub struct AnalyzeArgs {
    pub path: PathBuf,
    pub json: bool,
    pub config: Option<PathBuf>,
}

/// Planned mapping for one task
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlannedTask {
    pub kind: &'static str,
    pub origin: String,
    pub target_path: String,
    pub colliding: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyzeReport {
    pub root: String,
    pub scan: ScanStats,
    pub categories: BTreeMap<&'static str, usize>,
    pub roles: BTreeMap<&'static str, usize>,
    pub tasks_by_kind: BTreeMap<&'static str, usize>,
    pub signals: BTreeMap<&'static str, usize>,
    pub needs_security: bool,
    pub collisions: Vec<Collision>,
    pub scan_errors: Vec<ScanError>,
    pub tasks: Vec<PlannedTask>,
}

impl AnalyzeReport {
    pub fn from_analysis(analysis: Analysis) -> Self {
        let categories = FileCategory::ALL
            .iter()
            .map(|c| (c.as_str(), analysis.structure.count(*c)))
            .collect();
        let roles = analysis
            .structure
            .role_counts()
            .into_iter()
            .map(|(role, count)| (role.as_str(), count))
            .collect();
        let signals = analysis
            .insights
            .signal_counts
            .iter()
            .map(|(signal, count)| (signal.as_str(), *count))
            .collect();
        let tasks_by_kind = analysis.plan.kind_counts();
        let tasks = analysis
            .plan
            .tasks
            .iter()
            .map(|t| PlannedTask {
                kind: t.kind.as_str(),
                origin: t.origin(),
                target_path: t.target_path.clone(),
                colliding: t.collision.is_some(),
            })
            .collect();

        Self {
            root: analysis.root.display().to_string(),
            scan: analysis.scan,
            categories,
            roles,
            tasks_by_kind,
            signals,
            needs_security: analysis.insights.needs_security,
            collisions: analysis.plan.collisions,
            scan_errors: analysis.scan_errors,
            tasks,
        }
    }
}

pub fn run(args: AnalyzeArgs) -> anyhow::Result<()> {
    let resolved = resolve(args.config.as_deref())?;
    let engine =
        Engine::new(resolved.config).map_err(|e| HelpfulError::from_engine(e, &args.path))?;
    let analysis = engine
        .analyze(&args.path)
        .map_err(|e| HelpfulError::from_engine(e, &args.path))?;
    let report = AnalyzeReport::from_analysis(analysis);

    if args.json {
        return print_json(&report);
    }
    print_report(&report);
    Ok(())
}

fn counts_rows(counts: &BTreeMap<&'static str, usize>) -> Vec<Vec<String>> {
    counts
        .iter()
        .map(|(name, count)| vec![name.to_string(), count.to_string()])
        .collect()
}

fn print_report(report: &AnalyzeReport) {
    println!("Analysis: {}", report.root);
    println!(
        "  {} files, {} ({} excluded) in {} ms",
        report.scan.files_discovered,
        format_size(report.scan.bytes_total),
        report.scan.files_excluded,
        report.scan.duration_ms
    );
    println!();

    print_table(&["Category", "Files"], counts_rows(&report.categories));
    if !report.roles.is_empty() {
        print_table(&["Handler role", "Files"], counts_rows(&report.roles));
    }
    print_table(&["Task kind", "Tasks"], counts_rows(&report.tasks_by_kind));

    if !report.signals.is_empty() {
        print_table(&["Signal", "Files"], counts_rows(&report.signals));
    }
    println!(
        "Security module: {}",
        if report.needs_security { "generated" } else { "not needed" }
    );

    if !report.collisions.is_empty() {
        println!();
        println!("Target path collisions ({}):", report.collisions.len());
        for collision in &report.collisions {
            println!("  {} <- {}", collision.target_path, collision.claimants.join(", "));
        }
    }
    if !report.scan_errors.is_empty() {
        println!();
        println!("Unreadable entries ({}):", report.scan_errors.len());
        for error in &report.scan_errors {
            println!("  {}: {}", error.path, error.message);
        }
    }
}
