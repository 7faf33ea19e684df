//! Engine configuration
//!
//! Every layout convention the classifier, path mapper and scaffold generator
//! rely on lives here, with defaults matching a conventional servlet/JSP tree.
//! Configuration is loaded from TOML; missing keys fall back to defaults.

use crate::error::{EngineError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A `from` → `to` rename (path segment, name infix or package prefix)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub from: String,
    pub to: String,
}

impl Rename {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub layout: LayoutConfig,
    #[serde(default)]
    pub scan: ScanConfig,
    #[serde(default)]
    pub scaffold: ScaffoldConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| EngineError::io_at(path, e))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self> {
        let config: EngineConfig =
            toml::from_str(content).map_err(|e| EngineError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| EngineError::io_at(path, e))?;
        Ok(())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| EngineError::Config(e.to_string()))
    }

    /// Reject settings that would make classification or mapping meaningless
    pub fn validate(&self) -> Result<()> {
        let layout = &self.layout;
        if layout.template_extensions.is_empty() {
            return Err(EngineError::Config(
                "layout.template_extensions must not be empty".to_string(),
            ));
        }
        if layout.handler_extension.is_empty() {
            return Err(EngineError::Config(
                "layout.handler_extension must not be empty".to_string(),
            ));
        }
        if layout.webapp_segment.is_empty() || layout.webapp_segment.contains('/') {
            return Err(EngineError::Config(format!(
                "layout.webapp_segment must be a single path segment, got '{}'",
                layout.webapp_segment
            )));
        }
        let ext_clash = layout
            .template_extensions
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(&layout.handler_extension));
        if ext_clash {
            return Err(EngineError::Config(format!(
                "'{}' cannot be both a template and a handler extension",
                layout.handler_extension
            )));
        }
        for rename in layout.handler_segments.iter().chain(&layout.legacy_roots) {
            if rename.from.is_empty() || rename.to.is_empty() {
                return Err(EngineError::Config(
                    "segment renames need a non-empty 'from' and 'to'".to_string(),
                ));
            }
        }
        if self.scaffold.base_package.split('.').any(str::is_empty) {
            return Err(EngineError::Config(format!(
                "scaffold.base_package '{}' is not a valid package name",
                self.scaffold.base_package
            )));
        }
        Ok(())
    }
}

// ============================================================================
// Layout
// ============================================================================

/// Source and target layout conventions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutConfig {
    /// Page-template extensions (lowercase, no dot)
    #[serde(default = "default_template_extensions")]
    pub template_extensions: Vec<String>,

    /// Extension written for converted templates
    #[serde(default = "default_output_template_extension")]
    pub output_template_extension: String,

    /// Handler-source extension
    #[serde(default = "default_handler_extension")]
    pub handler_extension: String,

    /// Handler directory segments and their controller counterparts
    #[serde(default = "default_handler_segments")]
    pub handler_segments: Vec<Rename>,

    /// Handler file/class name infix rename
    #[serde(default = "default_handler_infix")]
    pub handler_infix: Rename,

    /// Content markers identifying a request handler
    #[serde(default = "default_handler_markers")]
    pub handler_markers: Vec<String>,

    #[serde(default = "default_strategy_name_markers")]
    pub strategy_name_markers: Vec<String>,

    #[serde(default = "default_strategy_content_markers")]
    pub strategy_content_markers: Vec<String>,

    #[serde(default = "default_repository_name_markers")]
    pub repository_name_markers: Vec<String>,

    #[serde(default = "default_static_extensions")]
    pub static_extensions: Vec<String>,

    #[serde(default = "default_config_extensions")]
    pub config_extensions: Vec<String>,

    /// Leading-path renames from legacy source roots to the standard layout
    #[serde(default = "default_legacy_roots")]
    pub legacy_roots: Vec<Rename>,

    /// Directory segment marking the web application root
    #[serde(default = "default_webapp_segment")]
    pub webapp_segment: String,

    /// Replaces the webapp segment for templates
    #[serde(default = "default_templates_root")]
    pub templates_root: String,

    /// Replaces the webapp segment for static assets
    #[serde(default = "default_static_root")]
    pub static_root: String,

    /// Replaces the webapp segment for config resources
    #[serde(default = "default_resources_root")]
    pub resources_root: String,

    /// Leading segments after the webapp root dropped from template paths
    #[serde(default = "default_dropped_template_segments")]
    pub dropped_template_segments: Vec<String>,

    /// Package prefix rename for converted handlers
    #[serde(default)]
    pub package_rename: Option<Rename>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_template_extensions() -> Vec<String> {
    strings(&["jsp", "jspx"])
}

fn default_output_template_extension() -> String {
    "html".to_string()
}

fn default_handler_extension() -> String {
    "java".to_string()
}

fn default_handler_segments() -> Vec<Rename> {
    vec![
        Rename::new("servlet", "controller"),
        Rename::new("servlets", "controllers"),
    ]
}

fn default_handler_infix() -> Rename {
    Rename::new("Servlet", "Controller")
}

fn default_handler_markers() -> Vec<String> {
    strings(&["@WebServlet", "extends HttpServlet"])
}

fn default_strategy_name_markers() -> Vec<String> {
    strings(&["Strategy"])
}

fn default_strategy_content_markers() -> Vec<String> {
    strings(&["implements Strategy"])
}

fn default_repository_name_markers() -> Vec<String> {
    strings(&["Repository", "Dao", "DAO"])
}

fn default_static_extensions() -> Vec<String> {
    strings(&[
        "css", "js", "png", "jpg", "jpeg", "gif", "svg", "ico", "html", "htm", "woff", "woff2",
        "ttf", "eot", "map",
    ])
}

fn default_config_extensions() -> Vec<String> {
    strings(&["xml", "properties", "yml", "yaml"])
}

fn default_legacy_roots() -> Vec<Rename> {
    vec![
        Rename::new("WebContent", "src/main/webapp"),
        Rename::new("JavaSource", "src/main/java"),
    ]
}

fn default_webapp_segment() -> String {
    "webapp".to_string()
}

fn default_templates_root() -> String {
    "resources/templates".to_string()
}

fn default_static_root() -> String {
    "resources/static".to_string()
}

fn default_resources_root() -> String {
    "resources".to_string()
}

fn default_dropped_template_segments() -> Vec<String> {
    strings(&["WEB-INF", "jsp", "views"])
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            template_extensions: default_template_extensions(),
            output_template_extension: default_output_template_extension(),
            handler_extension: default_handler_extension(),
            handler_segments: default_handler_segments(),
            handler_infix: default_handler_infix(),
            handler_markers: default_handler_markers(),
            strategy_name_markers: default_strategy_name_markers(),
            strategy_content_markers: default_strategy_content_markers(),
            repository_name_markers: default_repository_name_markers(),
            static_extensions: default_static_extensions(),
            config_extensions: default_config_extensions(),
            legacy_roots: default_legacy_roots(),
            webapp_segment: default_webapp_segment(),
            templates_root: default_templates_root(),
            static_root: default_static_root(),
            resources_root: default_resources_root(),
            dropped_template_segments: default_dropped_template_segments(),
            package_rename: None,
        }
    }
}

impl LayoutConfig {
    pub fn is_template_extension(&self, ext: &str) -> bool {
        contains_ignore_case(&self.template_extensions, ext)
    }

    pub fn is_handler_extension(&self, ext: &str) -> bool {
        self.handler_extension.eq_ignore_ascii_case(ext)
    }

    pub fn is_static_extension(&self, ext: &str) -> bool {
        contains_ignore_case(&self.static_extensions, ext)
    }

    pub fn is_config_extension(&self, ext: &str) -> bool {
        contains_ignore_case(&self.config_extensions, ext)
    }

    /// Controller segment for a handler segment, if `segment` is one
    pub fn controller_segment(&self, segment: &str) -> Option<&str> {
        self.handler_segments
            .iter()
            .find(|r| r.from == segment)
            .map(|r| r.to.as_str())
    }
}

fn contains_ignore_case(list: &[String], value: &str) -> bool {
    !value.is_empty() && list.iter().any(|item| item.eq_ignore_ascii_case(value))
}

// ============================================================================
// Scanning
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Include dot-files and dot-directories
    #[serde(default)]
    pub include_hidden: bool,

    /// Directory names never descended into
    #[serde(default = "default_excluded_dirs")]
    pub excluded_dirs: Vec<String>,

    /// File names skipped entirely (superseded by generated scaffold)
    #[serde(default = "default_excluded_files")]
    pub excluded_files: Vec<String>,

    /// Compute a blake3 content hash per file
    #[serde(default)]
    pub compute_hash: bool,
}

fn default_excluded_dirs() -> Vec<String> {
    strings(&["target", "build", "node_modules", ".git", ".idea", ".settings"])
}

fn default_excluded_files() -> Vec<String> {
    strings(&["pom.xml", "build.gradle", "build.xml"])
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            include_hidden: false,
            excluded_dirs: default_excluded_dirs(),
            excluded_files: default_excluded_files(),
            compute_hash: false,
        }
    }
}

// ============================================================================
// Scaffold
// ============================================================================

/// Settings for the generated Spring Boot project skeleton
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScaffoldConfig {
    #[serde(default = "default_base_package")]
    pub base_package: String,

    #[serde(default = "default_main_class")]
    pub main_class: String,

    #[serde(default = "default_group_id")]
    pub group_id: String,

    #[serde(default = "default_artifact_id")]
    pub artifact_id: String,

    #[serde(default = "default_version")]
    pub version: String,

    #[serde(default = "default_java_version")]
    pub java_version: String,

    #[serde(default = "default_spring_boot_version")]
    pub spring_boot_version: String,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    #[serde(default)]
    pub context_path: String,

    #[serde(default = "default_database_url")]
    pub database_url: String,

    #[serde(default = "default_database_username")]
    pub database_username: String,

    #[serde(default)]
    pub database_password: String,

    #[serde(default = "default_database_driver")]
    pub database_driver: String,

    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_base_package() -> String {
    "com.example.app".to_string()
}

fn default_main_class() -> String {
    "Application".to_string()
}

fn default_group_id() -> String {
    "com.example".to_string()
}

fn default_artifact_id() -> String {
    "jsp-converted-app".to_string()
}

fn default_version() -> String {
    "1.0.0".to_string()
}

fn default_java_version() -> String {
    "17".to_string()
}

fn default_spring_boot_version() -> String {
    "3.2.0".to_string()
}

fn default_server_port() -> u16 {
    8080
}

fn default_database_url() -> String {
    "jdbc:h2:mem:testdb".to_string()
}

fn default_database_username() -> String {
    "sa".to_string()
}

fn default_database_driver() -> String {
    "org.h2.Driver".to_string()
}

fn default_log_level() -> String {
    "DEBUG".to_string()
}

impl Default for ScaffoldConfig {
    fn default() -> Self {
        Self {
            base_package: default_base_package(),
            main_class: default_main_class(),
            group_id: default_group_id(),
            artifact_id: default_artifact_id(),
            version: default_version(),
            java_version: default_java_version(),
            spring_boot_version: default_spring_boot_version(),
            server_port: default_server_port(),
            context_path: String::new(),
            database_url: default_database_url(),
            database_username: default_database_username(),
            database_password: String::new(),
            database_driver: default_database_driver(),
            log_level: default_log_level(),
        }
    }
}

impl ScaffoldConfig {
    /// Base package as a `/`-separated directory path
    pub fn package_dir(&self) -> String {
        self.base_package.replace('.', "/")
    }
}
