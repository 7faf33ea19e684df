//! Plan execution
//!
//! Runs tasks strictly in plan order. Every task ends as exactly one
//! [`ConversionResult`]; a failing task is recorded and the run moves on.
//! Colliding tasks fail up front and never reach storage.

use crate::analysis::ProjectInsights;
use crate::error::{EngineError, Result};
use crate::handler::HandlerTransformer;
use crate::scaffold::ScaffoldGenerator;
use crate::storage::Storage;
use crate::template::{TemplateReport, TemplateTransformer};
use crate::types::{ConversionResult, ConversionTask, RunSummary, SourceFile, TaskKind};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default)]
pub struct ExecutionReport {
    /// One result per task, in plan order
    pub results: Vec<ConversionResult>,
    /// Constructs found across every converted template
    pub templates: TemplateReport,
}

pub struct Executor<'a> {
    storage: &'a dyn Storage,
    templates: &'a TemplateTransformer<'a>,
    handlers: &'a HandlerTransformer<'a>,
    scaffold: ScaffoldGenerator<'a>,
    insights: &'a ProjectInsights,
    target_root: &'a Path,
}

impl<'a> Executor<'a> {
    pub fn new(
        storage: &'a dyn Storage,
        templates: &'a TemplateTransformer<'a>,
        handlers: &'a HandlerTransformer<'a>,
        scaffold: ScaffoldGenerator<'a>,
        insights: &'a ProjectInsights,
        target_root: &'a Path,
    ) -> Self {
        Self {
            storage,
            templates,
            handlers,
            scaffold,
            insights,
            target_root,
        }
    }

    pub fn execute(&self, tasks: Vec<ConversionTask>) -> ExecutionReport {
        let mut report = ExecutionReport::default();
        info!(tasks = tasks.len(), target = %self.target_root.display(), "Executing plan");

        for task in tasks {
            if let Some(others) = &task.collision {
                let mut claimants = vec![task.origin()];
                claimants.extend(others.iter().cloned());
                let err = EngineError::PathCollision {
                    target: task.target_path.clone(),
                    claimants,
                };
                warn!(task = task.id, source = %task.origin(), error = %err, "Task skipped");
                report.results.push(ConversionResult::failed(task, err));
                continue;
            }

            match self.run(&task, &mut report.templates) {
                Ok(()) => {
                    debug!(task = task.id, kind = task.kind.as_str(), target = %task.target_path, "Task done");
                    report.results.push(ConversionResult::succeeded(task));
                }
                Err(err) => {
                    warn!(task = task.id, source = %task.origin(), error = %err, "Task failed");
                    report.results.push(ConversionResult::failed(task, err));
                }
            }
        }

        let summary = RunSummary::from_results(&report.results);
        for (kind, (ok, failed)) in &summary.by_kind {
            info!(kind = %kind, succeeded = ok, failed = failed, "Task kind finished");
        }
        report
    }

    fn run(&self, task: &ConversionTask, stats: &mut TemplateReport) -> Result<()> {
        let target = self.target_root.join(&task.target_path);
        match task.kind {
            TaskKind::ConvertTemplate => {
                let source = required_source(task)?;
                let text = self.storage.read(&source.path)?;
                let (output, report) = self.templates.transform_with_report(&text);
                *stats += report;
                self.storage.write(&target, &output)
            }
            TaskKind::ConvertHandler => {
                let source = required_source(task)?;
                let text = self.storage.read(&source.path)?;
                self.storage.write(&target, &self.handlers.transform(&text))
            }
            TaskKind::CopyVerbatim => {
                let source = required_source(task)?;
                self.storage.copy(&source.path, &target)
            }
            TaskKind::GenerateScaffold(artifact) => {
                let text = self.scaffold.render(artifact, self.insights)?;
                self.storage.write(&target, &text)
            }
        }
    }
}

fn required_source(task: &ConversionTask) -> Result<&SourceFile> {
    task.source.as_ref().ok_or_else(|| {
        EngineError::InvalidPath(format!(
            "task {} ({}) has no source file",
            task.id,
            task.kind.as_str()
        ))
    })
}
