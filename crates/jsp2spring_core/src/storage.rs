//! Storage access surface
//!
//! The engine touches the filesystem only through [`Storage`]. Writes create
//! missing parent directories. [`FsStorage`] writes through a temp file in the
//! destination directory and renames it into place, so a failed write never
//! leaves a partial target file behind. Reads never fail on encoding: text
//! that is not UTF-8 is decoded as ISO-8859-1.

use crate::error::{EngineError, Result};
use serde::Serialize;
use std::cell::RefCell;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

/// One entry of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntryInfo {
    pub name: String,
    pub is_dir: bool,
    pub size: u64,
}

pub trait Storage {
    /// Entries of `dir`, sorted by name
    fn list(&self, dir: &Path) -> Result<Vec<DirEntryInfo>>;

    fn read(&self, path: &Path) -> Result<String>;

    /// Write `text` to `path`, creating parent directories as needed
    fn write(&self, path: &Path, text: &str) -> Result<()>;

    /// Copy bytes from `from` to `to`, creating parent directories as needed
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;
}

/// Local filesystem storage
#[derive(Debug, Clone, Copy, Default)]
pub struct FsStorage;

impl FsStorage {
    pub fn new() -> Self {
        Self
    }

    fn write_atomic(&self, path: &Path, bytes: &[u8]) -> Result<()> {
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        std::fs::create_dir_all(parent).map_err(|e| EngineError::io_at(parent, e))?;

        let mut tmp = NamedTempFile::new_in(parent).map_err(|e| EngineError::io_at(parent, e))?;
        tmp.write_all(bytes).map_err(|e| EngineError::io_at(path, e))?;
        tmp.flush().map_err(|e| EngineError::io_at(path, e))?;
        tmp.persist(path)
            .map_err(|e| EngineError::io_at(path, e.error))?;
        Ok(())
    }
}

impl Storage for FsStorage {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntryInfo>> {
        let mut entries = Vec::new();
        for entry in std::fs::read_dir(dir).map_err(|e| EngineError::io_at(dir, e))? {
            let entry = entry.map_err(|e| EngineError::io_at(dir, e))?;
            let metadata = entry
                .metadata()
                .map_err(|e| EngineError::io_at(entry.path(), e))?;
            entries.push(DirEntryInfo {
                name: entry.file_name().to_string_lossy().to_string(),
                is_dir: metadata.is_dir(),
                size: if metadata.is_dir() { 0 } else { metadata.len() },
            });
        }
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn read(&self, path: &Path) -> Result<String> {
        let bytes = std::fs::read(path).map_err(|e| EngineError::io_at(path, e))?;
        Ok(decode_text(path, bytes))
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        self.write_atomic(path, text.as_bytes())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        let bytes = std::fs::read(from).map_err(|e| EngineError::io_at(from, e))?;
        self.write_atomic(to, &bytes)
    }
}

/// UTF-8 when valid, ISO-8859-1 otherwise
fn decode_text(path: &Path, bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(err) => {
            debug!(path = %path.display(), "Not UTF-8, decoding as ISO-8859-1");
            err.into_bytes().into_iter().map(char::from).collect()
        }
    }
}

/// Reads through to an inner storage, records writes and copies instead of
/// performing them
pub struct DryRunStorage<'a> {
    inner: &'a dyn Storage,
    planned: RefCell<Vec<PathBuf>>,
}

impl<'a> DryRunStorage<'a> {
    pub fn new(inner: &'a dyn Storage) -> Self {
        Self {
            inner,
            planned: RefCell::new(Vec::new()),
        }
    }

    /// Paths that would have been written, in order
    pub fn planned_writes(&self) -> Vec<PathBuf> {
        self.planned.borrow().clone()
    }
}

impl Storage for DryRunStorage<'_> {
    fn list(&self, dir: &Path) -> Result<Vec<DirEntryInfo>> {
        self.inner.list(dir)
    }

    fn read(&self, path: &Path) -> Result<String> {
        self.inner.read(path)
    }

    fn write(&self, path: &Path, text: &str) -> Result<()> {
        debug!(path = %path.display(), bytes = text.len(), "Dry run: skipping write");
        self.planned.borrow_mut().push(path.to_path_buf());
        Ok(())
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        // surface unreadable sources the way a real copy would
        std::fs::metadata(from).map_err(|e| EngineError::io_at(from, e))?;
        debug!(from = %from.display(), to = %to.display(), "Dry run: skipping copy");
        self.planned.borrow_mut().push(to.to_path_buf());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn write_creates_parents_and_overwrites() {
        let temp = TempDir::new().unwrap();
        let target = temp.path().join("a/b/c.html");
        let storage = FsStorage::new();

        storage.write(&target, "first").unwrap();
        storage.write(&target, "second").unwrap();
        assert_eq!(storage.read(&target).unwrap(), "second");

        // no temp files left next to the target
        let names: Vec<_> = storage
            .list(&temp.path().join("a/b"))
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["c.html"]);
    }

    #[test]
    fn write_under_a_file_fails_without_residue() {
        let temp = TempDir::new().unwrap();
        let blocker = temp.path().join("blocker");
        std::fs::write(&blocker, "not a dir").unwrap();

        let storage = FsStorage::new();
        let err = storage.write(&blocker.join("x.html"), "text").unwrap_err();
        assert!(matches!(err, EngineError::IoAt { .. }));
        assert_eq!(std::fs::read_to_string(&blocker).unwrap(), "not a dir");
    }

    #[test]
    fn copy_preserves_bytes() {
        let temp = TempDir::new().unwrap();
        let from = temp.path().join("logo.png");
        std::fs::write(&from, [0u8, 159, 146, 150]).unwrap();

        let storage = FsStorage::new();
        let to = temp.path().join("out/static/logo.png");
        storage.copy(&from, &to).unwrap();
        assert_eq!(std::fs::read(&to).unwrap(), vec![0u8, 159, 146, 150]);
    }

    #[test]
    fn list_sorts_and_flags_dirs() {
        let temp = TempDir::new().unwrap();
        std::fs::create_dir(temp.path().join("zdir")).unwrap();
        std::fs::write(temp.path().join("a.txt"), "abc").unwrap();

        let entries = FsStorage::new().list(temp.path()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0], DirEntryInfo { name: "a.txt".into(), is_dir: false, size: 3 });
        assert!(entries[1].is_dir);
    }

    #[test]
    fn read_decodes_latin1_text() {
        let temp = TempDir::new().unwrap();
        let legacy = temp.path().join("menu.jsp");
        std::fs::write(&legacy, b"<p>Caf\xe9 cr\xe8me</p>").unwrap();
        let utf8 = temp.path().join("menu_utf8.jsp");
        std::fs::write(&utf8, "<p>Caf\u{e9}</p>").unwrap();

        let storage = FsStorage::new();
        assert_eq!(storage.read(&legacy).unwrap(), "<p>Caf\u{e9} cr\u{e8}me</p>");
        assert_eq!(storage.read(&utf8).unwrap(), "<p>Caf\u{e9}</p>");
    }

    #[test]
    fn read_missing_reports_path() {
        let err = FsStorage::new().read(Path::new("/definitely/not/here.jsp")).unwrap_err();
        assert!(err.to_string().contains("/definitely/not/here.jsp"));
    }

    #[test]
    fn dry_run_records_instead_of_writing() {
        let temp = TempDir::new().unwrap();
        let source = temp.path().join("in.css");
        std::fs::write(&source, "body {}").unwrap();

        let fs = FsStorage::new();
        let dry = DryRunStorage::new(&fs);
        assert_eq!(dry.read(&source).unwrap(), "body {}");

        dry.write(&temp.path().join("out/a.html"), "x").unwrap();
        dry.copy(&source, &temp.path().join("out/in.css")).unwrap();
        assert!(dry.copy(&temp.path().join("missing.css"), &temp.path().join("out/m.css")).is_err());

        assert!(!temp.path().join("out").exists());
        assert_eq!(
            dry.planned_writes(),
            vec![temp.path().join("out/a.html"), temp.path().join("out/in.css")]
        );
    }
}
