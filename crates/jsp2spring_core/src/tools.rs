//! Storage tool registry
//!
//! A closed set of tools over the [`Storage`] surface. Names resolve through
//! a static table; an unknown name is an [`EngineError::UnknownTool`].

use crate::error::{EngineError, Result};
use crate::storage::{DirEntryInfo, Storage};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    ListDir,
    ReadFile,
    WriteFile,
}

const TOOL_TABLE: &[(&str, ToolKind)] = &[
    ("list_dir", ToolKind::ListDir),
    ("read_file", ToolKind::ReadFile),
    ("write_file", ToolKind::WriteFile),
];

impl ToolKind {
    pub const ALL: [ToolKind; 3] = [Self::ListDir, Self::ReadFile, Self::WriteFile];

    pub fn lookup(name: &str) -> Result<Self> {
        TOOL_TABLE
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| EngineError::UnknownTool {
                name: name.to_string(),
                available: TOOL_TABLE.iter().map(|(n, _)| *n).collect(),
            })
    }

    pub fn name(&self) -> &'static str {
        self.tool().name()
    }

    pub fn description(&self) -> &'static str {
        self.tool().description()
    }

    fn tool(&self) -> &'static dyn Tool {
        match self {
            Self::ListDir => &ListDir,
            Self::ReadFile => &ReadFile,
            Self::WriteFile => &WriteFile,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ToolRequest {
    pub path: PathBuf,
    /// Text to write; required by `write_file` only
    pub content: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ToolOutput {
    Entries { entries: Vec<DirEntryInfo> },
    Text { content: String },
    Written { path: String, bytes: usize },
}

pub trait Tool {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    fn invoke(&self, storage: &dyn Storage, request: &ToolRequest) -> Result<ToolOutput>;
}

struct ListDir;

impl Tool for ListDir {
    fn name(&self) -> &'static str {
        "list_dir"
    }

    fn description(&self) -> &'static str {
        "List the entries of a directory"
    }

    fn invoke(&self, storage: &dyn Storage, request: &ToolRequest) -> Result<ToolOutput> {
        Ok(ToolOutput::Entries {
            entries: storage.list(&request.path)?,
        })
    }
}

struct ReadFile;

impl Tool for ReadFile {
    fn name(&self) -> &'static str {
        "read_file"
    }

    fn description(&self) -> &'static str {
        "Read a text file"
    }

    fn invoke(&self, storage: &dyn Storage, request: &ToolRequest) -> Result<ToolOutput> {
        Ok(ToolOutput::Text {
            content: storage.read(&request.path)?,
        })
    }
}

struct WriteFile;

impl Tool for WriteFile {
    fn name(&self) -> &'static str {
        "write_file"
    }

    fn description(&self) -> &'static str {
        "Write a text file, creating parent directories"
    }

    fn invoke(&self, storage: &dyn Storage, request: &ToolRequest) -> Result<ToolOutput> {
        let content = request.content.as_deref().ok_or_else(|| EngineError::ToolInput {
            tool: self.name(),
            message: "content is required".to_string(),
        })?;
        storage.write(&request.path, content)?;
        Ok(ToolOutput::Written {
            path: request.path.display().to_string(),
            bytes: content.len(),
        })
    }
}

/// Run one tool against `storage`
pub fn invoke(storage: &dyn Storage, kind: ToolKind, request: &ToolRequest) -> Result<ToolOutput> {
    kind.tool().invoke(storage, request)
}
