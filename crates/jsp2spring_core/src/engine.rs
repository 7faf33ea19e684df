//! Conversion engine
//!
//! Owns the configuration and the compiled rule tables for its whole
//! lifetime and wires the pipeline together:
//! scan → classify → plan → execute.

use crate::analysis::ProjectInsights;
use crate::classifier::Classifier;
use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::executor::Executor;
use crate::handler::HandlerTransformer;
use crate::path_mapper::PathMapper;
use crate::planner::{Collision, ConversionPlan, Planner};
use crate::roots::{source_root, target_root};
use crate::rules::{handler_rules, template_rules, RuleSet};
use crate::scaffold::ScaffoldGenerator;
use crate::scanner::{ScanError, ScanStats, Scanner};
use crate::storage::{DryRunStorage, FsStorage, Storage};
use crate::template::{TemplateReport, TemplateTransformer};
use crate::types::{ConversionResult, ProjectStructure, RunSummary};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// Everything known about a source tree before anything is written
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Analysis {
    pub root: PathBuf,
    pub scan: ScanStats,
    pub scan_errors: Vec<ScanError>,
    pub structure: ProjectStructure,
    pub insights: ProjectInsights,
    pub plan: ConversionPlan,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConvertOptions {
    /// Plan and transform, but record writes instead of performing them
    pub dry_run: bool,
}

/// Outcome of one `convert` run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    pub source: PathBuf,
    pub target: PathBuf,
    pub dry_run: bool,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub summary: RunSummary,
    pub results: Vec<ConversionResult>,
    pub templates: TemplateReport,
    pub collisions: Vec<Collision>,
    pub scan_errors: Vec<ScanError>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &ConversionResult> {
        self.results.iter().filter(|r| !r.success)
    }
}

pub struct Engine {
    config: EngineConfig,
    template_rules: RuleSet,
    handler_rules: RuleSet,
}

impl Engine {
    /// Validate the configuration and compile both rule tables
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        let template_rules = template_rules()?;
        let handler_rules = handler_rules()?;
        info!(
            template_rules = template_rules.len(),
            handler_rules = handler_rules.len(),
            "Rule tables compiled"
        );
        Ok(Self {
            config,
            template_rules,
            handler_rules,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Scan, classify and plan. Never writes.
    pub fn analyze(&self, source: &Path) -> Result<Analysis> {
        let root = source_root(source)?;
        let scan = Scanner::new(&self.config.scan).scan(&root)?;

        let storage = FsStorage::new();
        let structure = Classifier::new(&self.config.layout, &storage).classify_all(scan.files);
        let insights = ProjectInsights::from_structure(&structure);
        let plan = self.planner().plan(&structure, &insights);

        Ok(Analysis {
            root,
            scan: scan.stats,
            scan_errors: scan.errors,
            structure,
            insights,
            plan,
        })
    }

    /// Run the full pipeline from `source` into `target`.
    ///
    /// Only discovery problems are returned as errors; every task failure is
    /// recorded in the report and the run continues.
    pub fn convert(&self, source: &Path, target: &Path, options: ConvertOptions) -> Result<RunReport> {
        let started_at = Utc::now();
        let analysis = self.analyze(source)?;
        let target = target_root(target)?;
        if target == analysis.root {
            return Err(EngineError::InvalidPath(format!(
                "target {} is the source root",
                target.display()
            )));
        }
        info!(
            source = %analysis.root.display(),
            target = %target.display(),
            dry_run = options.dry_run,
            "Converting project"
        );

        let templates = TemplateTransformer::new(&self.template_rules);
        let handlers = HandlerTransformer::new(&self.handler_rules, &self.config.layout)?;
        let fs = FsStorage::new();
        let dry = DryRunStorage::new(&fs);
        let storage: &dyn Storage = if options.dry_run { &dry } else { &fs };

        let executor = Executor::new(
            storage,
            &templates,
            &handlers,
            ScaffoldGenerator::new(&self.config.scaffold),
            &analysis.insights,
            &target,
        );
        let execution = executor.execute(analysis.plan.tasks);
        let summary = RunSummary::from_results(&execution.results);
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Conversion finished"
        );

        Ok(RunReport {
            source: analysis.root,
            target,
            dry_run: options.dry_run,
            started_at,
            finished_at: Utc::now(),
            summary,
            results: execution.results,
            templates: execution.templates,
            collisions: analysis.plan.collisions,
            scan_errors: analysis.scan_errors,
        })
    }

    /// Convert one template text with the compiled rules
    pub fn transform_template(&self, text: &str) -> String {
        TemplateTransformer::new(&self.template_rules).transform(text)
    }

    /// Convert one handler source with the compiled rules and configured layout
    pub fn transform_handler(&self, source: &str) -> Result<String> {
        Ok(HandlerTransformer::new(&self.handler_rules, &self.config.layout)?.transform(source))
    }

    fn planner(&self) -> Planner<'_> {
        Planner::new(
            PathMapper::new(&self.config.layout),
            ScaffoldGenerator::new(&self.config.scaffold),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FileCategory;
    use tempfile::TempDir;

    fn engine() -> Engine {
        Engine::new(EngineConfig::default()).unwrap()
    }

    #[test]
    fn invalid_config_is_rejected_up_front() {
        let mut config = EngineConfig::default();
        config.layout.template_extensions.clear();
        assert!(matches!(Engine::new(config), Err(EngineError::Config(_))));
    }

    #[test]
    fn analyze_missing_root_is_fatal() {
        let temp = TempDir::new().unwrap();
        let err = engine().analyze(&temp.path().join("missing")).unwrap_err();
        assert!(matches!(err, EngineError::SourceRoot(_)));
    }

    #[test]
    fn convert_into_source_root_is_rejected() {
        let temp = TempDir::new().unwrap();
        std::fs::write(temp.path().join("index.jsp"), "<p>x</p>").unwrap();
        let err = engine()
            .convert(temp.path(), temp.path(), ConvertOptions::default())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidPath(_)));
    }

    #[test]
    fn analyze_reports_structure_and_plan() {
        let temp = TempDir::new().unwrap();
        let web = temp.path().join("src/main/webapp");
        std::fs::create_dir_all(&web).unwrap();
        std::fs::write(web.join("index.jsp"), "<p>${x}</p>").unwrap();
        std::fs::write(web.join("site.css"), "body {}").unwrap();

        let analysis = engine().analyze(temp.path()).unwrap();
        assert_eq!(analysis.structure.count(FileCategory::PageTemplate), 1);
        assert_eq!(analysis.structure.count(FileCategory::StaticAsset), 1);
        // two files plus entry point, manifest and runtime config
        assert_eq!(analysis.plan.tasks.len(), 5);
        assert!(!analysis.insights.needs_security);
    }

    #[test]
    fn transform_helpers_use_compiled_rules() {
        let engine = engine();
        assert!(engine
            .transform_template(r#"<c:out value="${post.title}"/>"#)
            .contains(r#"th:text="${post.title}""#));
        let controller = engine
            .transform_handler("public class AServlet extends HttpServlet {\n}\n")
            .unwrap();
        assert!(controller.contains("public class AController"));
    }
}
