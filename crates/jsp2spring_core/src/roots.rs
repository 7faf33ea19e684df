//! Source and target roots given by the caller
//!
//! A source root must be an existing, listable directory; anything else is
//! fatal before a plan is built. A target root may not exist yet. Both accept
//! a leading `~`.

use crate::error::{EngineError, Result};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RootError {
    #[error("Path not found: {}", .0.display())]
    Missing(PathBuf),

    #[error("Not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("Directory cannot be listed: {}", .0.display())]
    Unlistable(PathBuf),
}

impl From<RootError> for EngineError {
    fn from(err: RootError) -> Self {
        EngineError::SourceRoot(err.to_string())
    }
}

fn home_relative(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Existing, listable directory
pub fn check_source_dir(path: &Path) -> std::result::Result<(), RootError> {
    let metadata = std::fs::metadata(path).map_err(|_| RootError::Missing(path.to_path_buf()))?;
    if !metadata.is_dir() {
        return Err(RootError::NotADirectory(path.to_path_buf()));
    }
    std::fs::read_dir(path).map_err(|_| RootError::Unlistable(path.to_path_buf()))?;
    Ok(())
}

/// Absolute, checked source root
pub fn source_root(path: &Path) -> std::result::Result<PathBuf, RootError> {
    let root = home_relative(path);
    check_source_dir(&root)?;
    Ok(root.canonicalize().unwrap_or(root))
}

/// Absolute target root; a missing one is resolved against the working directory
pub fn target_root(path: &Path) -> Result<PathBuf> {
    let root = home_relative(path);
    match std::fs::metadata(&root) {
        Ok(metadata) if !metadata.is_dir() => Err(EngineError::InvalidPath(format!(
            "target {} is not a directory",
            root.display()
        ))),
        Ok(_) => Ok(root.canonicalize().unwrap_or(root)),
        Err(_) if root.is_absolute() => Ok(root),
        Err(_) => Ok(std::env::current_dir()?.join(root)),
    }
}
