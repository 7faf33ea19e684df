//! Core types for the conversion engine
//!
//! Files flow through three shapes:
//! `SourceFile` (discovered) → `ClassifiedFile` (labelled) → `ConversionTask` (planned),
//! and each task ends as exactly one `ConversionResult`.

use crate::analysis::Signal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

// ============================================================================
// Discovery Types
// ============================================================================

/// A file discovered under the source root. Immutable once scanned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceFile {
    /// Full path to the file
    pub path: PathBuf,
    /// Relative path from the source root, always `/`-separated
    pub rel_path: String,
    /// Lowercased extension without the dot (empty when absent)
    pub extension: String,
    /// File size in bytes
    pub size: u64,
    /// blake3 hex digest, when hashing is enabled
    pub content_hash: Option<String>,
}

impl SourceFile {
    pub fn new(path: impl Into<PathBuf>, rel_path: impl Into<String>, size: u64) -> Self {
        let path = path.into();
        let rel_path = rel_path.into();
        let extension = Path::new(&rel_path)
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();
        Self {
            path,
            rel_path,
            extension,
            size,
            content_hash: None,
        }
    }

    pub fn with_hash(mut self, hash: String) -> Self {
        self.content_hash = Some(hash);
        self
    }

    /// Final path segment
    pub fn file_name(&self) -> &str {
        self.rel_path.rsplit('/').next().unwrap_or(&self.rel_path)
    }

    /// Directory segments of the relative path (file name excluded)
    pub fn dir_segments(&self) -> impl Iterator<Item = &str> {
        let dir = match self.rel_path.rfind('/') {
            Some(idx) => &self.rel_path[..idx],
            None => "",
        };
        dir.split('/').filter(|s| !s.is_empty())
    }
}

// ============================================================================
// Classification Types
// ============================================================================

/// Category assigned to every discovered file. Exactly one per file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FileCategory {
    PageTemplate,
    RequestHandler,
    StaticAsset,
    ConfigResource,
    Unclassified,
}

impl FileCategory {
    pub const ALL: [FileCategory; 5] = [
        Self::PageTemplate,
        Self::RequestHandler,
        Self::StaticAsset,
        Self::ConfigResource,
        Self::Unclassified,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PageTemplate => "page_template",
            Self::RequestHandler => "request_handler",
            Self::StaticAsset => "static_asset",
            Self::ConfigResource => "config_resource",
            Self::Unclassified => "unclassified",
        }
    }
}

/// Role of a handler-source class, from the fixed heuristic precedence
/// Controller > Strategy > Repository.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerRole {
    Controller,
    Strategy,
    Repository,
    Plain,
}

impl HandlerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Controller => "controller",
            Self::Strategy => "strategy",
            Self::Repository => "repository",
            Self::Plain => "plain",
        }
    }
}

/// A source file with its category label
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifiedFile {
    pub source: SourceFile,
    pub category: FileCategory,
    /// Set for handler-source files only
    pub role: Option<HandlerRole>,
    /// Handler-source file that should be copied rather than converted
    pub plain_handler: bool,
    /// Content signals found during classification (handler sources only)
    #[serde(default)]
    pub signals: Vec<Signal>,
}

/// Classified files grouped by category. Built once per scan; read-only thereafter.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectStructure {
    files: BTreeMap<FileCategory, Vec<ClassifiedFile>>,
}

impl ProjectStructure {
    pub fn from_files(files: impl IntoIterator<Item = ClassifiedFile>) -> Self {
        let mut grouped: BTreeMap<FileCategory, Vec<ClassifiedFile>> = BTreeMap::new();
        for file in files {
            grouped.entry(file.category).or_default().push(file);
        }
        for bucket in grouped.values_mut() {
            bucket.sort_by(|a, b| a.source.rel_path.cmp(&b.source.rel_path));
        }
        Self { files: grouped }
    }

    /// Files of one category, ordered by relative path
    pub fn files(&self, category: FileCategory) -> &[ClassifiedFile] {
        self.files.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn count(&self, category: FileCategory) -> usize {
        self.files(category).len()
    }

    pub fn total(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ClassifiedFile> {
        self.files.values().flatten()
    }

    /// Handler-source files grouped by role
    pub fn role_counts(&self) -> BTreeMap<HandlerRole, usize> {
        let mut counts = BTreeMap::new();
        for file in self.files(FileCategory::RequestHandler) {
            if let Some(role) = file.role {
                *counts.entry(role).or_insert(0) += 1;
            }
        }
        counts
    }
}

// ============================================================================
// Planning Types
// ============================================================================

/// Generated target-root artifact with no source counterpart
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaffoldArtifact {
    EntryPoint,
    Manifest,
    RuntimeConfig,
    SecurityConfig,
}

impl ScaffoldArtifact {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::EntryPoint => "entry_point",
            Self::Manifest => "manifest",
            Self::RuntimeConfig => "runtime_config",
            Self::SecurityConfig => "security_config",
        }
    }
}

/// What a task does
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    ConvertTemplate,
    ConvertHandler,
    CopyVerbatim,
    GenerateScaffold(ScaffoldArtifact),
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ConvertTemplate => "convert_template",
            Self::ConvertHandler => "convert_handler",
            Self::CopyVerbatim => "copy_verbatim",
            Self::GenerateScaffold(_) => "generate_scaffold",
        }
    }

    /// Plan ordering group: handlers and copies, then templates, then scaffold
    pub(crate) fn plan_group(&self) -> u8 {
        match self {
            Self::ConvertHandler | Self::CopyVerbatim => 0,
            Self::ConvertTemplate => 1,
            Self::GenerateScaffold(_) => 2,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

/// One unit of planned work. Created by the planner, consumed once by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionTask {
    /// Position in the plan
    pub id: usize,
    pub kind: TaskKind,
    /// None for scaffold tasks
    pub source: Option<SourceFile>,
    /// Target path relative to the target root, `/`-separated
    pub target_path: String,
    pub priority: TaskPriority,
    /// Other claimants of the same target path; a colliding task is never run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collision: Option<Vec<String>>,
}

impl ConversionTask {
    /// Human-readable origin: the source relative path or the scaffold artifact name
    pub fn origin(&self) -> String {
        match (&self.source, self.kind) {
            (Some(source), _) => source.rel_path.clone(),
            (None, TaskKind::GenerateScaffold(artifact)) => format!("<scaffold:{}>", artifact.as_str()),
            (None, kind) => format!("<{}>", kind.as_str()),
        }
    }
}

/// Outcome of one task. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub task: ConversionTask,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ConversionResult {
    pub fn succeeded(task: ConversionTask) -> Self {
        Self {
            task,
            success: true,
            error: None,
        }
    }

    pub fn failed(task: ConversionTask, error: impl ToString) -> Self {
        Self {
            task,
            success: false,
            error: Some(error.to_string()),
        }
    }
}

/// Aggregate counts over a result list
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// task kind -> (succeeded, failed)
    pub by_kind: BTreeMap<String, (usize, usize)>,
}

impl RunSummary {
    pub fn from_results(results: &[ConversionResult]) -> Self {
        let mut summary = Self::default();
        for result in results {
            summary.total += 1;
            let entry = summary
                .by_kind
                .entry(result.task.kind.as_str().to_string())
                .or_insert((0, 0));
            if result.success {
                summary.succeeded += 1;
                entry.0 += 1;
            } else {
                summary.failed += 1;
                entry.1 += 1;
            }
        }
        summary
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed == 0
    }
}
