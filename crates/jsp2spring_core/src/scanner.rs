//! Source tree discovery
//!
//! Walks the source root with `walkdir`, skipping build output, VCS/IDE
//! metadata and superseded build manifests. Relative paths are normalised to
//! `/` so every later stage can split on a single separator.

use crate::config::ScanConfig;
use crate::error::Result;
use crate::roots::check_source_dir;
use crate::types::SourceFile;
use serde::Serialize;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

fn normalize_path_to_forward_slashes(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

/// A path the walk could not enter or read
#[derive(Debug, Clone, Serialize)]
pub struct ScanError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanStats {
    pub files_discovered: usize,
    pub files_excluded: usize,
    pub bytes_total: u64,
    pub duration_ms: u64,
}

#[derive(Debug, Clone)]
pub struct ScanOutcome {
    /// Discovered files, ordered by relative path
    pub files: Vec<SourceFile>,
    pub errors: Vec<ScanError>,
    pub stats: ScanStats,
}

pub struct Scanner<'a> {
    config: &'a ScanConfig,
}

impl<'a> Scanner<'a> {
    pub fn new(config: &'a ScanConfig) -> Self {
        Self { config }
    }

    fn is_hidden(entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry
                .file_name()
                .to_str()
                .map(|s| s.starts_with('.'))
                .unwrap_or(false)
    }

    fn is_excluded_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| self.config.excluded_dirs.iter().any(|d| d == name))
                .unwrap_or(false)
    }

    fn keep(&self, entry: &DirEntry) -> bool {
        if !self.config.include_hidden && Self::is_hidden(entry) {
            return false;
        }
        !self.is_excluded_dir(entry)
    }

    /// Walk `root` and return every regular file under it.
    ///
    /// An unusable root is fatal. Unreadable entries below the root are
    /// collected in [`ScanOutcome::errors`] and the walk continues.
    pub fn scan(&self, root: &Path) -> Result<ScanOutcome> {
        check_source_dir(root)?;
        let start = Instant::now();
        info!(root = %root.display(), "Scanning source tree");

        let mut files = Vec::new();
        let mut errors = Vec::new();
        let mut stats = ScanStats::default();

        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| self.keep(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e
                        .path()
                        .map(|p| p.display().to_string())
                        .unwrap_or_default();
                    warn!(path = %path, error = %e, "Skipping unreadable entry");
                    errors.push(ScanError {
                        path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy();
            if self.config.excluded_files.iter().any(|f| f == name.as_ref()) {
                debug!(file = %entry.path().display(), "Excluded by name");
                stats.files_excluded += 1;
                continue;
            }

            let rel = entry.path().strip_prefix(root).unwrap_or(entry.path());
            let rel_path = normalize_path_to_forward_slashes(rel);
            let size = match entry.metadata() {
                Ok(m) => m.len(),
                Err(e) => {
                    errors.push(ScanError {
                        path: rel_path,
                        message: e.to_string(),
                    });
                    continue;
                }
            };

            let mut file = SourceFile::new(entry.path(), rel_path, size);
            if self.config.compute_hash {
                match std::fs::read(entry.path()) {
                    Ok(bytes) => file = file.with_hash(blake3::hash(&bytes).to_hex().to_string()),
                    Err(e) => warn!(file = %file.rel_path, error = %e, "Could not hash file"),
                }
            }

            stats.bytes_total += size;
            files.push(file);
        }

        files.sort_by(|a, b| a.rel_path.cmp(&b.rel_path));
        stats.files_discovered = files.len();
        stats.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            discovered = stats.files_discovered,
            excluded = stats.files_excluded,
            errors = errors.len(),
            duration_ms = stats.duration_ms,
            "Scan complete"
        );

        Ok(ScanOutcome {
            files,
            errors,
            stats,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EngineError;
    use tempfile::TempDir;

    fn create_test_file(dir: &Path, name: &str, content: &str) {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp = TempDir::new().unwrap();
        let config = ScanConfig::default();
        let outcome = Scanner::new(&config).scan(temp.path()).unwrap();
        assert!(outcome.files.is_empty());
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_scan_discovers_sorted_relative_files() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "src/main/webapp/index.jsp", "<html></html>");
        create_test_file(temp.path(), "src/main/java/a/HomeServlet.java", "class A {}");
        create_test_file(temp.path(), "README.md", "readme");

        let config = ScanConfig::default();
        let outcome = Scanner::new(&config).scan(temp.path()).unwrap();
        let rels: Vec<_> = outcome.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(
            rels,
            vec![
                "README.md",
                "src/main/java/a/HomeServlet.java",
                "src/main/webapp/index.jsp"
            ]
        );
        assert_eq!(outcome.files[2].extension, "jsp");
        assert!(outcome.files[2].content_hash.is_none());
    }

    #[test]
    fn test_scan_skips_excluded_and_hidden() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "pom.xml", "<project/>");
        create_test_file(temp.path(), "target/classes/A.class", "");
        create_test_file(temp.path(), ".git/HEAD", "ref");
        create_test_file(temp.path(), ".hidden.jsp", "x");
        create_test_file(temp.path(), "web/index.jsp", "x");

        let config = ScanConfig::default();
        let outcome = Scanner::new(&config).scan(temp.path()).unwrap();
        let rels: Vec<_> = outcome.files.iter().map(|f| f.rel_path.as_str()).collect();
        assert_eq!(rels, vec!["web/index.jsp"]);
        assert_eq!(outcome.stats.files_excluded, 1);

        let with_hidden = ScanConfig {
            include_hidden: true,
            ..ScanConfig::default()
        };
        let outcome = Scanner::new(&with_hidden).scan(temp.path()).unwrap();
        assert!(outcome.files.iter().any(|f| f.rel_path == ".hidden.jsp"));
        assert!(outcome.files.iter().all(|f| !f.rel_path.starts_with(".git/")));
    }

    #[test]
    fn test_scan_hashes_when_enabled() {
        let temp = TempDir::new().unwrap();
        create_test_file(temp.path(), "a.css", "body {}");
        let config = ScanConfig {
            compute_hash: true,
            ..ScanConfig::default()
        };
        let outcome = Scanner::new(&config).scan(temp.path()).unwrap();
        let expected = blake3::hash(b"body {}").to_hex().to_string();
        assert_eq!(outcome.files[0].content_hash.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn test_scan_nonexistent_root_is_fatal() {
        let config = ScanConfig::default();
        let err = Scanner::new(&config)
            .scan(Path::new("/nonexistent/legacy/app"))
            .unwrap_err();
        assert!(matches!(err, EngineError::SourceRoot(_)));
    }
}
