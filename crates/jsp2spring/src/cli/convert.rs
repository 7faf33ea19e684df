//! `convert` command: the full pipeline

use crate::cli::config::resolve;
use crate::cli::error::HelpfulError;
use crate::cli::output::{print_json, print_table};
use jsp2spring_core::{ConvertOptions, Engine, RunReport};
use std::path::PathBuf;

#[derive(Debug)]
pub struct ConvertArgs {
    pub source: PathBuf,
    pub target: PathBuf,
    pub json: bool,
    pub dry_run: bool,
    pub config: Option<PathBuf>,
}

/// Returns whether every planned task succeeded
pub fn run(args: ConvertArgs) -> anyhow::Result<bool> {
    let resolved = resolve(args.config.as_deref())?;
    let engine =
        Engine::new(resolved.config).map_err(|e| HelpfulError::from_engine(e, &args.source))?;
    let report = engine
        .convert(
            &args.source,
            &args.target,
            ConvertOptions {
                dry_run: args.dry_run,
            },
        )
        .map_err(|e| HelpfulError::from_engine(e, &args.source))?;

    if args.json {
        print_json(&report)?;
    } else {
        print_report(&report);
    }
    Ok(report.summary.all_succeeded())
}

fn print_report(report: &RunReport) {
    let elapsed = report.finished_at - report.started_at;
    println!(
        "{} {} -> {}",
        if report.dry_run { "Dry run:" } else { "Converted" },
        report.source.display(),
        report.target.display()
    );
    println!(
        "  {} tasks, {} succeeded, {} failed ({} ms)",
        report.summary.total,
        report.summary.succeeded,
        report.summary.failed,
        elapsed.num_milliseconds()
    );
    println!();

    let rows = report
        .summary
        .by_kind
        .iter()
        .map(|(kind, (ok, failed))| vec![kind.clone(), ok.to_string(), failed.to_string()])
        .collect();
    print_table(&["Task kind", "Succeeded", "Failed"], rows);

    let t = &report.templates;
    println!(
        "Templates: {} structured tags, {} expressions, {} directives, {} forms; {} marked for review",
        t.structured_tags, t.expressions, t.directives, t.forms, t.review_markers
    );

    let failures: Vec<_> = report.failures().collect();
    if !failures.is_empty() {
        println!();
        println!("Failed tasks ({}):", failures.len());
        for result in failures {
            println!(
                "  {}: {}",
                result.task.origin(),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
    if !report.scan_errors.is_empty() {
        println!();
        println!("Skipped unreadable entries ({}):", report.scan_errors.len());
        for error in &report.scan_errors {
            println!("  {}: {}", error.path, error.message);
        }
    }
    if report.dry_run {
        println!();
        println!("Nothing was written. Re-run without --dry-run to convert.");
    }
}
