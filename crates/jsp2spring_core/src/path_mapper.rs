//! Source → target path mapping
//!
//! Pure string work over `/`-separated relative paths. Legacy source roots are
//! renamed first; then the category decides the rest:
//!
//! - templates: the webapp segment becomes the templates root, leading
//!   `WEB-INF`/`jsp`/`views` segments are dropped, the extension becomes `html`
//! - converted handlers: handler segments become controller segments, the
//!   file-name infix is renamed, the package prefix rename moves the directory
//! - static assets and config resources: the webapp segment becomes the
//!   static or resources root
//! - plain handlers and everything else keep their path

use crate::config::LayoutConfig;
use crate::types::{ClassifiedFile, FileCategory};

/// Where templates land when the source has no webapp segment
const DEFAULT_SOURCE_ROOT: &str = "src/main";

pub struct PathMapper<'a> {
    layout: &'a LayoutConfig,
}

impl<'a> PathMapper<'a> {
    pub fn new(layout: &'a LayoutConfig) -> Self {
        Self { layout }
    }

    pub fn map_file(&self, file: &ClassifiedFile) -> String {
        self.map_path(&file.source.rel_path, file.category, file.plain_handler)
    }

    /// Target path relative to the target root
    pub fn map_path(&self, rel_path: &str, category: FileCategory, plain_handler: bool) -> String {
        let rooted = self.rename_legacy_root(rel_path);
        let mut segments: Vec<String> = rooted
            .split('/')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        let Some(file_name) = segments.pop() else {
            return rooted;
        };

        match category {
            FileCategory::PageTemplate => {
                let dirs = self.template_dirs(segments);
                let name = replace_extension(&file_name, &self.layout.output_template_extension);
                join(dirs, name)
            }
            FileCategory::RequestHandler if !plain_handler => {
                let dirs = self.controller_dirs(segments);
                let name = self.rename_infix(&file_name);
                join(dirs, name)
            }
            FileCategory::StaticAsset => {
                let dirs = self.replace_webapp(segments, &self.layout.static_root);
                join(dirs, file_name)
            }
            FileCategory::ConfigResource => {
                let dirs = self.replace_webapp(segments, &self.layout.resources_root);
                join(dirs, file_name)
            }
            _ => join(segments, file_name),
        }
    }

    fn rename_legacy_root(&self, rel_path: &str) -> String {
        for rename in &self.layout.legacy_roots {
            if rel_path == rename.from {
                return rename.to.clone();
            }
            if let Some(rest) = rel_path.strip_prefix(rename.from.as_str()) {
                if rest.starts_with('/') {
                    return format!("{}{}", rename.to, rest);
                }
            }
        }
        rel_path.to_string()
    }

    fn webapp_index(&self, segments: &[String]) -> Option<usize> {
        segments.iter().position(|s| *s == self.layout.webapp_segment)
    }

    fn replace_webapp(&self, mut segments: Vec<String>, root: &str) -> Vec<String> {
        if let Some(idx) = self.webapp_index(&segments) {
            let replacement = split_root(root);
            segments.splice(idx..=idx, replacement);
        }
        segments
    }

    fn template_dirs(&self, segments: Vec<String>) -> Vec<String> {
        let (mut head, tail) = match self.webapp_index(&segments) {
            Some(idx) => {
                let mut head = segments;
                let tail = head.split_off(idx + 1);
                head.pop();
                (head, tail)
            }
            None => (split_root(DEFAULT_SOURCE_ROOT), segments),
        };
        let kept = tail
            .into_iter()
            .skip_while(|s| self.layout.dropped_template_segments.iter().any(|d| d == s));
        head.extend(split_root(&self.layout.templates_root));
        head.extend(kept);
        head
    }

    fn controller_dirs(&self, segments: Vec<String>) -> Vec<String> {
        let mut segments = match &self.layout.package_rename {
            Some(rename) => replace_window(segments, &rename.from, &rename.to),
            None => segments,
        };
        for segment in segments.iter_mut() {
            if let Some(to) = self.layout.controller_segment(segment) {
                *segment = to.to_string();
            }
        }
        segments
    }

    fn rename_infix(&self, file_name: &str) -> String {
        let infix = &self.layout.handler_infix;
        if infix.from.is_empty() {
            return file_name.to_string();
        }
        match file_name.rsplit_once('.') {
            Some((stem, ext)) => format!("{}.{}", stem.replace(infix.from.as_str(), &infix.to), ext),
            None => file_name.replace(infix.from.as_str(), &infix.to),
        }
    }
}

fn split_root(root: &str) -> Vec<String> {
    root.split('/')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

fn join(mut dirs: Vec<String>, file_name: String) -> String {
    dirs.push(file_name);
    dirs.join("/")
}

fn replace_extension(file_name: &str, extension: &str) -> String {
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => format!("{}.{}", stem, extension),
        _ => format!("{}.{}", file_name, extension),
    }
}

/// Replace the first run of segments spelling package `from` with package `to`
fn replace_window(mut segments: Vec<String>, from: &str, to: &str) -> Vec<String> {
    let from: Vec<&str> = from.split('.').filter(|s| !s.is_empty()).collect();
    if from.is_empty() || from.len() > segments.len() {
        return segments;
    }
    let found = (0..=segments.len() - from.len()).find(|&start| {
        segments[start..start + from.len()]
            .iter()
            .zip(&from)
            .all(|(a, b)| a == b)
    });
    if let Some(start) = found {
        let to: Vec<String> = to
            .split('.')
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();
        segments.splice(start..start + from.len(), to);
    }
    segments
}
