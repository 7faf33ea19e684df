//! Servlet → Spring MVC controller transformer
//!
//! Stage rules come from the handler [`RuleSet`]. The configured parts run as
//! fixed passes: the declared class rename closes the Annotations stage, the
//! Imports stage inserts the Spring imports, and the Packages stage rewrites
//! `package`/`import` statements with the layout's segment and prefix renames.
//! Method bodies are never touched.

use crate::config::{LayoutConfig, Rename};
use crate::error::{EngineError, Result};
use crate::rules::{HandlerStage, RuleSet};
use regex::{Captures, Regex};
use tracing::debug;

const SPRING_IMPORTS: &[&str] = &[
    "import org.springframework.stereotype.Controller;",
    "import org.springframework.web.bind.annotation.*;",
];

/// Imports under these prefixes never belong to the converted project
const EXTERNAL_PACKAGES: &[&str] = &["java.", "javax.", "jakarta.", "org.springframework."];

fn compile(name: &str, pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| EngineError::Pattern {
        rule: name.to_string(),
        message: e.to_string(),
    })
}

pub struct HandlerTransformer<'a> {
    rules: &'a RuleSet,
    layout: &'a LayoutConfig,
    class_decl: Regex,
    package_line: Regex,
    statement: Regex,
    servlet_base: Regex,
}

impl<'a> HandlerTransformer<'a> {
    pub fn new(rules: &'a RuleSet, layout: &'a LayoutConfig) -> Result<Self> {
        Ok(Self {
            rules,
            layout,
            class_decl: compile(
                "class_declaration",
                r"(?m)^([ \t]*)((?:public[ \t]+|final[ \t]+|abstract[ \t]+)*)class[ \t]+([A-Za-z_]\w*)",
            )?,
            package_line: compile("package_line", r"(?m)^[ \t]*package[ \t]+[\w.]+[ \t]*;[^\n]*\n?")?,
            statement: compile(
                "package_statements",
                r"(?m)^([ \t]*)(package|import)([ \t]+)(static[ \t]+)?([A-Za-z_][\w.]*?)(\.\*)?([ \t]*;)",
            )?,
            servlet_base: compile("servlet_base", r"\bextends\s+(?:[\w.]+\.)?HttpServlet\b")?,
        })
    }

    /// Convert a servlet class into a controller class
    pub fn transform(&self, source: &str) -> String {
        let was_servlet = source.contains("@WebServlet") || self.servlet_base.is_match(source);
        let mut out = source.to_string();
        for stage in HandlerStage::ALL {
            for rule in self.rules.stage(stage.number()) {
                out = rule.apply(&out);
            }
            out = match stage {
                HandlerStage::Annotations => {
                    let renamed = self.rename_class(&out);
                    if was_servlet {
                        self.ensure_controller_annotation(&renamed)
                    } else {
                        renamed
                    }
                }
                HandlerStage::LifecycleMethods => out,
                HandlerStage::Imports => self.insert_imports(&out),
                HandlerStage::Packages => self.rewrite_packages(&out),
            };
            debug!(stage = stage.as_str(), "Handler stage applied");
        }
        out
    }

    /// Apply the name infix rename to the declared class, everywhere it is used
    fn rename_class(&self, text: &str) -> String {
        let infix = &self.layout.handler_infix;
        let Some(caps) = self.class_decl.captures(text) else {
            return text.to_string();
        };
        let Some(name) = caps.get(3).map(|m| m.as_str()) else {
            return text.to_string();
        };
        if infix.from.is_empty() || !name.contains(infix.from.as_str()) {
            return text.to_string();
        }
        let renamed = name.replace(infix.from.as_str(), &infix.to);
        replace_word(text, name, &renamed)
    }

    /// A servlet mapped only in `web.xml` has no `@WebServlet`; annotate its class
    fn ensure_controller_annotation(&self, text: &str) -> String {
        if text.contains("@Controller") {
            return text.to_string();
        }
        match self.class_decl.find(text) {
            Some(decl) => {
                let indent: String = text[decl.start()..]
                    .chars()
                    .take_while(|c| *c == ' ' || *c == '\t')
                    .collect();
                format!(
                    "{}{}@Controller\n{}",
                    &text[..decl.start()],
                    indent,
                    &text[decl.start()..]
                )
            }
            None => text.to_string(),
        }
    }

    /// Insert missing Spring imports after the package line, or at the top
    fn insert_imports(&self, text: &str) -> String {
        let missing: Vec<&str> = SPRING_IMPORTS
            .iter()
            .copied()
            .filter(|import| !text.contains(import))
            .collect();
        if missing.is_empty() {
            return text.to_string();
        }
        let block = missing.join("\n");
        match self.package_line.find(text) {
            Some(line) => {
                let head = &text[..line.end()];
                let newline = if head.ends_with('\n') { "" } else { "\n" };
                format!("{}{}\n{}\n{}", head, newline, block, &text[line.end()..])
            }
            None => format!("{}\n\n{}", block, text),
        }
    }

    fn rewrite_packages(&self, text: &str) -> String {
        self.statement
            .replace_all(text, |caps: &Captures| self.rewrite_statement(caps))
            .into_owned()
    }

    fn rewrite_statement(&self, caps: &Captures) -> String {
        let group = |i: usize| caps.get(i).map(|m| m.as_str()).unwrap_or("");
        let keyword = group(2);
        let name = group(5);
        let wildcard = !group(6).is_empty();
        if keyword == "import" && EXTERNAL_PACKAGES.iter().any(|p| name.starts_with(p)) {
            return group(0).to_string();
        }
        let is_class_import = keyword == "import" && !wildcard;
        let rewritten = rewrite_package_name(self.layout, name, is_class_import);
        format!(
            "{}{}{}{}{}{}{}",
            group(1),
            keyword,
            group(3),
            group(4),
            rewritten,
            group(6),
            group(7)
        )
    }
}

/// Apply the package prefix rename, then handler segment renames. For a class
/// import out of a renamed handler package the class name infix is renamed too.
pub(crate) fn rewrite_package_name(layout: &LayoutConfig, name: &str, class_import: bool) -> String {
    let prefixed = match &layout.package_rename {
        Some(rename) => rename_prefix(name, rename),
        None => name.to_string(),
    };
    let mut segments: Vec<String> = prefixed.split('.').map(str::to_string).collect();
    let package_len = if class_import {
        segments.len().saturating_sub(1)
    } else {
        segments.len()
    };
    let mut handler_package = false;
    for segment in segments.iter_mut().take(package_len) {
        if let Some(to) = layout.controller_segment(segment) {
            *segment = to.to_string();
            handler_package = true;
        }
    }
    if class_import && handler_package {
        if let Some(class) = segments.last_mut() {
            let infix = &layout.handler_infix;
            if !infix.from.is_empty() {
                *class = class.replace(infix.from.as_str(), &infix.to);
            }
        }
    }
    segments.join(".")
}

fn rename_prefix(name: &str, rename: &Rename) -> String {
    if rename.from.is_empty() {
        return name.to_string();
    }
    if name == rename.from {
        return rename.to.clone();
    }
    match name.strip_prefix(rename.from.as_str()) {
        Some(rest) if rest.starts_with('.') => format!("{}{}", rename.to, rest),
        _ => name.to_string(),
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '$'
}

/// Replace whole-identifier occurrences of `word`
fn replace_word(text: &str, word: &str, with: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for (idx, _) in text.match_indices(word) {
        if idx < last {
            continue;
        }
        let end = idx + word.len();
        let before = text[..idx].chars().next_back();
        let after = text[end..].chars().next();
        if before.map_or(false, is_ident_char) || after.map_or(false, is_ident_char) {
            continue;
        }
        out.push_str(&text[last..idx]);
        out.push_str(with);
        last = end;
    }
    out.push_str(&text[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::handler_rules;

    const POST_SERVLET: &str = r#"package com.shpota.blog.servlet;

import com.shpota.blog.model.Post;
import com.shpota.blog.servlet.BaseServlet;
import javax.servlet.ServletException;
import javax.servlet.annotation.WebServlet;
import javax.servlet.http.HttpServlet;
import javax.servlet.http.HttpServletRequest;
import javax.servlet.http.HttpServletResponse;
import java.io.IOException;

@WebServlet("/posts/*")
public class PostServlet extends HttpServlet {
    private static final long serialVersionUID = 1L;

    @Override
    protected void doGet(HttpServletRequest request, HttpServletResponse response)
            throws ServletException, IOException {
        request.getRequestDispatcher("/posts.jsp").forward(request, response);
    }

    @Override
    protected void doPost(HttpServletRequest request, HttpServletResponse response)
            throws ServletException, IOException {
        PostServlet self = this;
        response.sendRedirect("/posts");
    }
}
"#;

    fn convert_with(layout: &LayoutConfig, source: &str) -> String {
        let rules = handler_rules().unwrap();
        HandlerTransformer::new(&rules, layout).unwrap().transform(source)
    }

    fn convert(source: &str) -> String {
        convert_with(&LayoutConfig::default(), source)
    }

    #[test]
    fn servlet_becomes_controller() {
        let out = convert(POST_SERVLET);
        assert!(out.contains("@Controller\n@RequestMapping(\"/posts\")\npublic class PostController {"), "{out}");
        assert!(!out.contains("HttpServlet {"));
        assert!(!out.contains("extends"));
        assert!(!out.contains("@WebServlet"));
        assert!(!out.contains("import javax.servlet.http.HttpServlet;"));
        assert!(!out.contains("import javax.servlet.annotation.WebServlet;"));
        assert!(out.contains("import javax.servlet.http.HttpServletRequest;"));
        assert!(out.contains("PostController self = this;"));
    }

    #[test]
    fn lifecycle_methods_become_mapped_actions() {
        let out = convert(POST_SERVLET);
        assert!(out.contains("    @GetMapping\n    public void get(HttpServletRequest request, HttpServletResponse response)"), "{out}");
        assert!(out.contains("    @PostMapping\n    public void post(HttpServletRequest request, HttpServletResponse response)"));
        assert!(!out.contains("doGet"));
        assert!(!out.contains("@Override"));
        // bodies and throws clauses survive
        assert!(out.contains("throws ServletException, IOException {"));
        assert!(out.contains("request.getRequestDispatcher(\"/posts.jsp\").forward(request, response);"));
    }

    #[test]
    fn spring_imports_follow_package_line() {
        let out = convert(POST_SERVLET);
        assert!(out.starts_with(
            "package com.shpota.blog.controller;\n\nimport org.springframework.stereotype.Controller;\nimport org.springframework.web.bind.annotation.*;\n"
        ), "{out}");
        assert_eq!(out.matches("import org.springframework.stereotype.Controller;").count(), 1);
    }

    #[test]
    fn same_project_imports_are_renamed() {
        let out = convert(POST_SERVLET);
        assert!(out.contains("import com.shpota.blog.controller.BaseController;"), "{out}");
        assert!(out.contains("import com.shpota.blog.model.Post;"));
        assert!(out.contains("import javax.servlet.ServletException;"));
    }

    #[test]
    fn package_prefix_rename_applies_to_package_and_imports() {
        let layout = LayoutConfig {
            package_rename: Some(Rename::new("com.shpota.blog", "com.example.app")),
            ..LayoutConfig::default()
        };
        let out = convert_with(&layout, POST_SERVLET);
        assert!(out.starts_with("package com.example.app.controller;"), "{out}");
        assert!(out.contains("import com.example.app.model.Post;"));
        assert!(!out.contains("com.shpota"));
    }

    #[test]
    fn missing_package_and_methods_are_tolerated() {
        let source = "public class HelloServlet extends HttpServlet {\n}\n";
        let out = convert(source);
        assert_eq!(
            out,
            "import org.springframework.stereotype.Controller;\nimport org.springframework.web.bind.annotation.*;\n\n@Controller\npublic class HelloController {\n}\n"
        );
    }

    #[test]
    fn web_servlet_without_pattern_maps_controller_only() {
        let out = convert("@WebServlet(name = \"legacy\")\npublic class Legacy extends HttpServlet {}\n");
        assert!(out.contains("@Controller\npublic class Legacy {}"), "{out}");
        assert!(!out.contains("@RequestMapping"));
    }

    #[test]
    fn existing_spring_imports_are_not_duplicated() {
        let source = "package a;\n\nimport org.springframework.stereotype.Controller;\n\n@Controller\npublic class Home {}\n";
        let out = convert(source);
        assert_eq!(out.matches("stereotype.Controller;").count(), 1);
        assert_eq!(out.matches("web.bind.annotation.*;").count(), 1);
    }

    #[test]
    fn put_and_delete_are_mapped() {
        let source = "public class ApiServlet extends HttpServlet {\n  public void doPut(HttpServletRequest q, HttpServletResponse r) {}\n  protected void doDelete(HttpServletRequest q, HttpServletResponse r) {}\n}\n";
        let out = convert(source);
        assert!(out.contains("  @PutMapping\n  public void put(HttpServletRequest q, HttpServletResponse r) {}"), "{out}");
        assert!(out.contains("  @DeleteMapping\n  public void delete(HttpServletRequest q, HttpServletResponse r) {}"));
    }

    #[test]
    fn helper_in_servlet_package_stays_unannotated() {
        let source = "package com.x.servlet;\n\nimport javax.servlet.http.HttpServletRequest;\n\npublic final class RequestUtils {\n    public static String param(HttpServletRequest r) {\n        return r.getParameter(\"id\");\n    }\n}\n";
        let out = convert(source);
        assert!(!out.contains("@Controller\n"), "{out}");
        assert!(out.contains("\npublic final class RequestUtils {"));
    }

    #[test]
    fn qualified_servlet_base_is_annotated() {
        let out = convert("public class Ping extends javax.servlet.http.HttpServlet {\n}\n");
        assert!(out.contains("@Controller\npublic class Ping"), "{out}");
    }

    #[test]
    fn whole_word_replacement() {
        assert_eq!(
            replace_word("PostServlet x = new PostServlet(); PostServletHelper h;", "PostServlet", "PostController"),
            "PostController x = new PostController(); PostServletHelper h;"
        );
    }
}
