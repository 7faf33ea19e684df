//! jsp2spring core - JSP/Servlet to Spring Boot/Thymeleaf conversion engine
//!
//! Migrates a legacy web application tree into a Spring Boot project by
//! textual, staged rewriting. No syntax tree is ever built: constructs the
//! rules cannot translate faithfully are flagged for manual review instead.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────┐   ┌────────────┐   ┌─────────┐   ┌──────────┐   ┌─────────────────────┐
//! │ Scanner │──▶│ Classifier │──▶│ Planner │──▶│ Executor │──▶│ Template | Handler  │
//! │(walkdir)│   │ (category) │   │ (tasks) │   │(best-eff)│   │ transformer | copy  │
//! └─────────┘   └────────────┘   └────┬────┘   └──────────┘   └─────────────────────┘
//!                                     │
//!                               PathMapper + Scaffold
//! ```
//!
//! # Core Concepts
//!
//! - **SourceFile**: a discovered file, relative path normalised to `/`
//! - **FileCategory**: exactly one label per file, `Unclassified` by default
//! - **RuleSet**: staged regex rewrite rules, compiled once per engine
//! - **ConversionTask**: one source (or scaffold artifact) to one target path
//! - **ConversionResult**: one per task; failures never abort the run

pub mod analysis;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod executor;
pub mod handler;
pub mod path_mapper;
pub mod planner;
pub mod roots;
pub mod rules;
pub mod scaffold;
pub mod scanner;
pub mod storage;
pub mod template;
pub mod tools;
pub mod types;

// Re-exports for convenience
pub use analysis::{ProjectInsights, Signal};
pub use classifier::Classifier;
pub use config::{EngineConfig, LayoutConfig, Rename, ScaffoldConfig, ScanConfig};
pub use engine::{Analysis, ConvertOptions, Engine, RunReport};
pub use error::{EngineError, Result};
pub use executor::{ExecutionReport, Executor};
pub use handler::HandlerTransformer;
pub use path_mapper::PathMapper;
pub use planner::{Collision, ConversionPlan, Planner};
pub use rules::{handler_rules, template_rules, HandlerStage, RuleSet, TemplateStage, TransformationRule};
pub use scaffold::ScaffoldGenerator;
pub use scanner::{ScanError, ScanOutcome, ScanStats, Scanner};
pub use storage::{DirEntryInfo, DryRunStorage, FsStorage, Storage};
pub use template::{TemplateReport, TemplateTransformer};
pub use tools::{invoke, ToolKind, ToolOutput, ToolRequest};
pub use types::{
    ClassifiedFile, ConversionResult, ConversionTask, FileCategory, HandlerRole, ProjectStructure,
    RunSummary, ScaffoldArtifact, SourceFile, TaskKind, TaskPriority,
};
