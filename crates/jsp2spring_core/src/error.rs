//! Error types for the conversion engine

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Engine error type
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("IO error at {path}: {source}")]
    IoAt {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Walk error: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pattern error in rule '{rule}': {message}")]
    Pattern { rule: String, message: String },

    #[error("Rule '{rule}' (stage {stage}) is listed after a rule of stage {previous}")]
    RuleOrder {
        rule: String,
        stage: u8,
        previous: u8,
    },

    #[error("Source root unusable: {0}")]
    SourceRoot(String),

    #[error("Target path '{target}' is claimed by more than one task: {}", .claimants.join(", "))]
    PathCollision {
        target: String,
        claimants: Vec<String>,
    },

    #[error("Unknown tool: {name} (available: {})", .available.join(", "))]
    UnknownTool {
        name: String,
        available: Vec<&'static str>,
    },

    #[error("Invalid tool input for {tool}: {message}")]
    ToolInput { tool: &'static str, message: String },

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}

impl EngineError {
    /// Attach the offending path to an IO error
    pub fn io_at(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::IoAt {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EngineError>;
