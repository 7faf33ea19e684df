//! Helpful error types for CLI commands
//!
//! Every error includes:
//! - What went wrong
//! - Context about the situation
//! - Suggestions for how to fix it

use jsp2spring_core::EngineError;
use serde::Serialize;
use std::fmt;
use std::path::Path;

/// An error with helpful context and suggestions
#[derive(Debug, Serialize)]
pub struct HelpfulError {
    /// The main error message
    pub message: String,
    /// Additional context about what was happening
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    /// Suggestions for how to fix the error
    pub suggestions: Vec<String>,
}

impl HelpfulError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: None,
            suggestions: Vec::new(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    pub fn with_suggestions(mut self, suggestions: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.suggestions.extend(suggestions.into_iter().map(|s| s.into()));
        self
    }

    // === Common error constructors ===

    /// Source root missing, not a directory, or unreadable
    pub fn source_root(path: &Path, reason: &str) -> Self {
        Self::new(reason.to_string())
            .with_context(format!("Cannot scan source root {}", path.display()))
            .with_suggestions([
                format!("TRY: Check that the path exists: ls -la {}", path.display()),
                "TRY: Point at the application root (the directory holding src/ or WebContent/)".to_string(),
                "TRY: Verify you have read permissions for this path".to_string(),
            ])
    }

    /// Invalid configuration file or values
    pub fn invalid_config(reason: &str) -> Self {
        Self::new(format!("Invalid configuration: {}", reason))
            .with_context("The configuration was rejected before any file was read")
            .with_suggestions([
                "TRY: Show the defaults: jsp2spring config".to_string(),
                "TRY: Pass a different file with --config <file>".to_string(),
            ])
    }

    /// Unknown tool name
    pub fn unknown_tool(name: &str, available: &[&str]) -> Self {
        Self::new(format!("Unknown tool: {}", name))
            .with_context(format!("Available tools: {}", available.join(", ")))
            .with_suggestion("TRY: List tools: jsp2spring tool --list")
    }

    /// Engine failure mapped to the closest helpful error
    pub fn from_engine(err: EngineError, path: &Path) -> Self {
        match err {
            EngineError::SourceRoot(reason) => Self::source_root(path, &reason),
            EngineError::Config(reason) => Self::invalid_config(&reason),
            EngineError::UnknownTool { name, available } => Self::unknown_tool(&name, &available),
            EngineError::InvalidPath(reason) => Self::new(format!("Invalid path: {}", reason))
                .with_suggestion("TRY: Choose a target directory outside the source tree"),
            other => Self::new(other.to_string()),
        }
    }
}

impl fmt::Display for HelpfulError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ERROR: {}", self.message)?;

        if let Some(ctx) = &self.context {
            writeln!(f, "CONTEXT: {}", ctx)?;
        }

        if !self.suggestions.is_empty() {
            writeln!(f)?;
            for suggestion in &self.suggestions {
                writeln!(f, "  {}", suggestion)?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for HelpfulError {}

/// Human rendering: helpful errors as-is, anything else with its cause chain
pub fn render_error(err: &anyhow::Error) -> String {
    match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => helpful.to_string(),
        None => format!("ERROR: {:#}", err),
    }
}

/// Print `{ "error": { message, context?, suggestions } }` to stdout
pub fn print_json_error(err: &anyhow::Error) {
    let payload = match err.downcast_ref::<HelpfulError>() {
        Some(helpful) => serde_json::json!({ "error": helpful }),
        None => serde_json::json!({
            "error": { "message": format!("{:#}", err), "suggestions": [] }
        }),
    };
    match serde_json::to_string_pretty(&payload) {
        Ok(text) => println!("{}", text),
        Err(_) => println!("{{\"error\":{{\"message\":\"{}\"}}}}", err),
    }
}
