//! File classification
//!
//! Every file gets exactly one [`FileCategory`] from a fixed decision order.
//! Handler-extension files also get a [`HandlerRole`] from a prioritized list
//! of independent predicates (Controller > Strategy > Repository); the first
//! match wins. Content is read at most once per file, only for handler
//! sources, and a failed read degrades to path-only heuristics.

use crate::analysis::detect_signals;
use crate::config::LayoutConfig;
use crate::storage::Storage;
use crate::types::{ClassifiedFile, FileCategory, HandlerRole, ProjectStructure, SourceFile};
use tracing::{debug, warn};

/// Role predicate over the file and its (optional) content
type RolePredicate = fn(&LayoutConfig, &SourceFile, Option<&str>) -> bool;

const ROLE_PREDICATES: &[(HandlerRole, RolePredicate)] = &[
    (HandlerRole::Controller, is_controller),
    (HandlerRole::Strategy, is_strategy),
    (HandlerRole::Repository, is_repository),
];

fn is_controller(layout: &LayoutConfig, file: &SourceFile, content: Option<&str>) -> bool {
    let in_handler_dir = file
        .dir_segments()
        .any(|segment| layout.controller_segment(segment).is_some());
    let has_marker = content
        .map(|text| layout.handler_markers.iter().any(|m| text.contains(m.as_str())))
        .unwrap_or(false);
    in_handler_dir || has_marker
}

fn is_strategy(layout: &LayoutConfig, file: &SourceFile, content: Option<&str>) -> bool {
    let name = file.file_name();
    layout
        .strategy_name_markers
        .iter()
        .any(|m| name.contains(m.as_str()))
        || content
            .map(|text| {
                layout
                    .strategy_content_markers
                    .iter()
                    .any(|m| text.contains(m.as_str()))
            })
            .unwrap_or(false)
}

fn is_repository(layout: &LayoutConfig, file: &SourceFile, _content: Option<&str>) -> bool {
    let name = file.file_name();
    layout
        .repository_name_markers
        .iter()
        .any(|m| name.contains(m.as_str()))
}

/// First matching role, `Plain` otherwise
pub fn handler_role(layout: &LayoutConfig, file: &SourceFile, content: Option<&str>) -> HandlerRole {
    ROLE_PREDICATES
        .iter()
        .find(|(_, predicate)| predicate(layout, file, content))
        .map(|(role, _)| *role)
        .unwrap_or(HandlerRole::Plain)
}

/// Category from the extension alone; never fails
pub fn category_for_extension(layout: &LayoutConfig, extension: &str) -> FileCategory {
    if layout.is_template_extension(extension) {
        FileCategory::PageTemplate
    } else if layout.is_handler_extension(extension) {
        FileCategory::RequestHandler
    } else if layout.is_static_extension(extension) {
        FileCategory::StaticAsset
    } else if layout.is_config_extension(extension) {
        FileCategory::ConfigResource
    } else {
        FileCategory::Unclassified
    }
}

pub struct Classifier<'a> {
    layout: &'a LayoutConfig,
    storage: &'a dyn Storage,
}

impl<'a> Classifier<'a> {
    pub fn new(layout: &'a LayoutConfig, storage: &'a dyn Storage) -> Self {
        Self { layout, storage }
    }

    /// Label one file
    pub fn classify(&self, file: SourceFile) -> ClassifiedFile {
        let category = category_for_extension(self.layout, &file.extension);
        if category != FileCategory::RequestHandler {
            return ClassifiedFile {
                source: file,
                category,
                role: None,
                plain_handler: false,
                signals: Vec::new(),
            };
        }

        let content = match self.storage.read(&file.path) {
            Ok(text) => Some(text),
            Err(e) => {
                warn!(file = %file.rel_path, error = %e, "Unreadable handler source, classifying by path");
                None
            }
        };
        let role = handler_role(self.layout, &file, content.as_deref());
        let signals = content.as_deref().map(detect_signals).unwrap_or_default();
        debug!(file = %file.rel_path, role = role.as_str(), "Classified handler source");

        ClassifiedFile {
            source: file,
            category,
            role: Some(role),
            plain_handler: role != HandlerRole::Controller,
            signals,
        }
    }

    /// Label every file and group by category
    pub fn classify_all(&self, files: impl IntoIterator<Item = SourceFile>) -> ProjectStructure {
        ProjectStructure::from_files(files.into_iter().map(|f| self.classify(f)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EngineError, Result};
    use crate::storage::DirEntryInfo;
    use std::collections::HashMap;
    use std::path::{Path, PathBuf};

    /// In-memory storage; paths absent from the map fail to read
    #[derive(Default)]
    struct MemStorage {
        files: HashMap<PathBuf, String>,
    }

    impl MemStorage {
        fn with(mut self, path: &str, text: &str) -> Self {
            self.files.insert(PathBuf::from(path), text.to_string());
            self
        }
    }

    impl Storage for MemStorage {
        fn list(&self, _dir: &Path) -> Result<Vec<DirEntryInfo>> {
            Ok(Vec::new())
        }
        fn read(&self, path: &Path) -> Result<String> {
            self.files.get(path).cloned().ok_or_else(|| {
                EngineError::io_at(path, std::io::Error::from(std::io::ErrorKind::NotFound))
            })
        }
        fn write(&self, _path: &Path, _text: &str) -> Result<()> {
            Ok(())
        }
        fn copy(&self, _from: &Path, _to: &Path) -> Result<()> {
            Ok(())
        }
    }

    fn file(rel: &str) -> SourceFile {
        SourceFile::new(format!("/src/{}", rel), rel, 1)
    }

    #[test]
    fn categories_follow_decision_order() {
        let layout = LayoutConfig::default();
        let storage = MemStorage::default();
        let classifier = Classifier::new(&layout, &storage);

        let cases = [
            ("src/main/webapp/index.jsp", FileCategory::PageTemplate),
            ("src/main/webapp/WEB-INF/tags/x.JSPX", FileCategory::PageTemplate),
            ("src/main/java/a/Util.java", FileCategory::RequestHandler),
            ("src/main/webapp/css/site.css", FileCategory::StaticAsset),
            ("src/main/webapp/index.html", FileCategory::StaticAsset),
            ("src/main/webapp/WEB-INF/web.xml", FileCategory::ConfigResource),
            ("src/main/resources/db.properties", FileCategory::ConfigResource),
            ("README", FileCategory::Unclassified),
            ("notes.txt", FileCategory::Unclassified),
        ];
        for (rel, expected) in cases {
            assert_eq!(classifier.classify(file(rel)).category, expected, "{rel}");
        }
    }

    #[test]
    fn controller_by_path_segment_or_marker() {
        let layout = LayoutConfig::default();
        let storage = MemStorage::default()
            .with("/src/src/main/java/a/web/Home.java", "@WebServlet(\"/\")\npublic class Home extends HttpServlet {}")
            .with("/src/src/main/java/a/model/Post.java", "public class Post {}");
        let classifier = Classifier::new(&layout, &storage);

        let by_path = classifier.classify(file("src/main/java/a/servlet/Unreadable.java"));
        assert_eq!(by_path.role, Some(HandlerRole::Controller));
        assert!(!by_path.plain_handler);
        assert!(by_path.signals.is_empty());

        let by_marker = classifier.classify(file("src/main/java/a/web/Home.java"));
        assert_eq!(by_marker.role, Some(HandlerRole::Controller));
        assert!(!by_marker.signals.is_empty());

        let plain = classifier.classify(file("src/main/java/a/model/Post.java"));
        assert_eq!(plain.role, Some(HandlerRole::Plain));
        assert!(plain.plain_handler);
        assert_eq!(plain.category, FileCategory::RequestHandler);
    }

    #[test]
    fn role_precedence_is_fixed() {
        let layout = LayoutConfig::default();
        // both a strategy and a repository name: strategy wins
        let both = file("src/main/java/a/dao/StrategyRepository.java");
        assert_eq!(handler_role(&layout, &both, None), HandlerRole::Strategy);

        // a servlet directory beats every naming convention
        let servlet = file("src/main/java/a/servlet/PostDao.java");
        assert_eq!(handler_role(&layout, &servlet, None), HandlerRole::Controller);

        let by_content = file("src/main/java/a/Sorting.java");
        assert_eq!(
            handler_role(&layout, &by_content, Some("class Sorting implements Strategy {}")),
            HandlerRole::Strategy
        );

        let repo = file("src/main/java/a/PostDAO.java");
        assert_eq!(handler_role(&layout, &repo, None), HandlerRole::Repository);
    }

    #[test]
    fn classify_all_groups_by_category() {
        let layout = LayoutConfig::default();
        let storage = MemStorage::default();
        let structure = Classifier::new(&layout, &storage).classify_all(vec![
            file("b.jsp"),
            file("a.jsp"),
            file("s.css"),
        ]);
        assert_eq!(structure.count(FileCategory::PageTemplate), 2);
        assert_eq!(structure.count(FileCategory::StaticAsset), 1);
        assert_eq!(structure.total(), 3);
    }
}
