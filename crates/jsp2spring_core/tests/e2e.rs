//! End-to-end tests for the conversion engine
//!
//! Each test writes a small legacy web application into a temp directory and
//! runs the full scan → classify → plan → execute pipeline against it.

use jsp2spring_core::{
    ConvertOptions, Engine, EngineConfig, EngineError, FileCategory, HandlerRole, Rename, TaskKind,
};
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

const POSTS_JSP: &str = r#"<%@ page contentType="text/html;charset=UTF-8" %>
<%@ taglib prefix="c" uri="http://java.sun.com/jsp/jstl/core" %>
<html>
<body>
<h1><c:out value="${post.title}"/></h1>
<c:forEach var="item" items="${items}">
<p><c:out value="${item.name}"/></p>
</c:forEach>
</body>
</html>
"#;

const POST_SERVLET: &str = r#"package com.shpota.blog.servlet;

import com.shpota.blog.model.Post;
import javax.servlet.ServletException;
import javax.servlet.annotation.WebServlet;
import javax.servlet.http.HttpServlet;
import javax.servlet.http.HttpServletRequest;
import javax.servlet.http.HttpServletResponse;
import java.io.IOException;

@WebServlet("/posts")
public class PostServlet extends HttpServlet {
    @Override
    protected void doGet(HttpServletRequest request, HttpServletResponse response)
            throws ServletException, IOException {
        request.getRequestDispatcher("/posts.jsp").forward(request, response);
    }

    @Override
    protected void doPost(HttpServletRequest request, HttpServletResponse response)
            throws ServletException, IOException {
        response.sendRedirect("/posts");
    }
}
"#;

const LOGIN_SERVLET: &str = r#"package com.shpota.blog.servlet;

public class LoginServlet extends HttpServlet {
    protected void doPost(HttpServletRequest request, HttpServletResponse response) {
        if (userService.login(request.getParameter("user"))) {
            request.getSession().setMaxInactiveInterval(600);
        }
    }
}
"#;

/// Create a test environment with temp directories
struct TestEnv {
    /// Temp directory (cleaned up on drop)
    _temp: TempDir,
    pub source_dir: PathBuf,
    pub target_dir: PathBuf,
}

impl TestEnv {
    fn new() -> Self {
        let temp = TempDir::new().expect("Failed to create temp dir");
        let source_dir = temp.path().join("legacy");
        let target_dir = temp.path().join("converted");
        fs::create_dir_all(&source_dir).expect("Failed to create source dir");

        Self {
            _temp: temp,
            source_dir,
            target_dir,
        }
    }

    fn write_file(&self, rel: &str, content: &str) -> PathBuf {
        let path = self.source_dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).ok();
        }
        fs::write(&path, content).expect("Failed to write file");
        path
    }

    /// A small but complete legacy application
    fn write_blog(&self) {
        self.write_file("src/main/webapp/WEB-INF/jsp/posts.jsp", POSTS_JSP);
        self.write_file("src/main/webapp/index.jsp", "<p>Welcome ${user.name}</p>\n");
        self.write_file("src/main/webapp/css/site.css", "body { margin: 0; }\n");
        self.write_file("src/main/webapp/WEB-INF/web.xml", "<web-app/>\n");
        self.write_file("src/main/java/com/shpota/blog/servlet/PostServlet.java", POST_SERVLET);
        self.write_file(
            "src/main/java/com/shpota/blog/model/Post.java",
            "package com.shpota.blog.model;\n\npublic class Post {}\n",
        );
        self.write_file("pom.xml", "<project/>\n");
        self.write_file("README.md", "legacy blog\n");
    }

    fn target(&self, rel: &str) -> PathBuf {
        self.target_dir.join(rel)
    }

    fn read_target(&self, rel: &str) -> String {
        fs::read_to_string(self.target(rel))
            .unwrap_or_else(|e| panic!("missing target {rel}: {e}"))
    }
}

fn engine() -> Engine {
    Engine::new(EngineConfig::default()).expect("default config is valid")
}

// ============================================================================
// Analysis
// ============================================================================

#[test]
fn test_analyze_classifies_and_plans_without_writing() {
    let env = TestEnv::new();
    env.write_blog();

    let analysis = engine().analyze(&env.source_dir).unwrap();

    assert_eq!(analysis.structure.count(FileCategory::PageTemplate), 2);
    assert_eq!(analysis.structure.count(FileCategory::RequestHandler), 2);
    assert_eq!(analysis.structure.count(FileCategory::StaticAsset), 1);
    assert_eq!(analysis.structure.count(FileCategory::ConfigResource), 1);
    // README.md is unclassified, pom.xml is excluded by name
    assert_eq!(analysis.structure.count(FileCategory::Unclassified), 1);
    assert_eq!(analysis.scan.files_excluded, 1);

    let roles = analysis.structure.role_counts();
    assert_eq!(roles.get(&HandlerRole::Controller), Some(&1));
    assert_eq!(roles.get(&HandlerRole::Plain), Some(&1));

    let counts = analysis.plan.kind_counts();
    assert_eq!(counts.get("convert_handler"), Some(&1));
    assert_eq!(counts.get("copy_verbatim"), Some(&3));
    assert_eq!(counts.get("convert_template"), Some(&2));
    assert_eq!(counts.get("generate_scaffold"), Some(&3));
    assert!(analysis.plan.collisions.is_empty());
    assert!(!env.target_dir.exists());
}

#[test]
fn test_plan_orders_handlers_then_templates_then_scaffold() {
    let env = TestEnv::new();
    env.write_blog();

    let plan = engine().analyze(&env.source_dir).unwrap().plan;
    let groups: Vec<u8> = plan
        .tasks
        .iter()
        .map(|t| match t.kind {
            TaskKind::ConvertHandler | TaskKind::CopyVerbatim => 0,
            TaskKind::ConvertTemplate => 1,
            TaskKind::GenerateScaffold(_) => 2,
        })
        .collect();
    let mut sorted = groups.clone();
    sorted.sort();
    assert_eq!(groups, sorted);
}

#[test]
fn test_missing_source_root_is_fatal() {
    let env = TestEnv::new();
    let err = engine()
        .convert(
            &env.source_dir.join("nope"),
            &env.target_dir,
            ConvertOptions::default(),
        )
        .unwrap_err();
    assert!(matches!(err, EngineError::SourceRoot(_)));
    assert!(!env.target_dir.exists());
}

// ============================================================================
// Conversion
// ============================================================================

#[test]
fn test_convert_full_project() {
    let env = TestEnv::new();
    env.write_blog();

    let report = engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();
    assert!(report.summary.all_succeeded(), "{:?}", report.failures().collect::<Vec<_>>());
    assert_eq!(report.summary.total, 9);

    let posts = env.read_target("src/main/resources/templates/posts.html");
    assert!(posts.contains(r#"xmlns:th="http://www.thymeleaf.org""#));
    assert!(posts.contains(r#"<span th:text="${post.title}"></span>"#));
    assert!(posts.contains("<!-- JSP Page Directive:"));
    assert!(!posts.contains("<%@"));

    let index = env.read_target("src/main/resources/templates/index.html");
    assert!(index.starts_with("<!DOCTYPE html>"));
    assert!(index.contains(r#"<span th:text="${user.name}"></span>"#));

    let controller =
        env.read_target("src/main/java/com/shpota/blog/controller/PostController.java");
    assert!(controller.starts_with("package com.shpota.blog.controller;"));
    assert!(controller.contains("@RequestMapping(\"/posts\")"));

    assert_eq!(
        env.read_target("src/main/resources/static/css/site.css"),
        "body { margin: 0; }\n"
    );
    assert!(env.target("src/main/resources/WEB-INF/web.xml").exists());
    assert!(env
        .target("src/main/java/com/shpota/blog/model/Post.java")
        .exists());
    assert!(env.target("pom.xml").exists());
    assert!(env.target("src/main/resources/application.yml").exists());
    assert!(env
        .target("src/main/java/com/example/app/Application.java")
        .exists());
    assert!(!env.target("README.md").exists());

    assert_eq!(report.templates.directives, 2);
    assert!(report.templates.structured_tags >= 3);
}

#[test]
fn test_for_each_binding_wraps_inner_expression() {
    let env = TestEnv::new();
    env.write_file(
        "src/main/webapp/list.jsp",
        r#"<c:forEach var="item" items="${items}"><c:out value="${item.name}"/></c:forEach>"#,
    );

    engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();
    let html = env.read_target("src/main/resources/templates/list.html");

    assert_eq!(html.matches("th:each").count(), 1);
    let open = html.find(r#"<div th:each="item : ${items}">"#).unwrap();
    let inner = html.find(r#"th:text="${item.name}""#).unwrap();
    let close = html.rfind("</div>").unwrap();
    assert!(open < inner && inner < close, "{html}");
}

#[test]
fn test_servlet_becomes_controller_with_mapped_actions() {
    let env = TestEnv::new();
    env.write_file("src/main/java/com/shpota/blog/servlet/PostServlet.java", POST_SERVLET);

    engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();
    let java = env.read_target("src/main/java/com/shpota/blog/controller/PostController.java");

    assert!(java.contains("@GetMapping\n    public void get("), "{java}");
    assert!(java.contains("@PostMapping\n    public void post("), "{java}");
    assert!(!java.contains("extends"));
    assert!(!java.contains("import javax.servlet.http.HttpServlet;"));
    assert!(!java.contains("@WebServlet"));
    assert!(java.contains("import org.springframework.stereotype.Controller;"));
    assert!(java.contains("import org.springframework.web.bind.annotation.*;"));
}

#[test]
fn test_package_rename_moves_controllers() {
    let env = TestEnv::new();
    env.write_file("src/main/java/com/shpota/blog/servlet/PostServlet.java", POST_SERVLET);

    let mut config = EngineConfig::default();
    config.layout.package_rename = Some(Rename::new("com.shpota.blog", "com.example.blog"));
    Engine::new(config)
        .unwrap()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();

    let java = env.read_target("src/main/java/com/example/blog/controller/PostController.java");
    assert!(java.starts_with("package com.example.blog.controller;"));
    assert!(java.contains("import com.example.blog.model.Post;"));
}

#[test]
fn test_configured_template_extension() {
    let env = TestEnv::new();
    env.write_file("app/webapp/pages/list.page", "<p>${x}</p>");

    let mut config = EngineConfig::default();
    config.layout.template_extensions = vec!["page".to_string()];
    Engine::new(config)
        .unwrap()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();

    assert!(env.target("app/resources/templates/pages/list.html").exists());
}

#[test]
fn test_collision_fails_both_claimants_and_writes_neither() {
    let env = TestEnv::new();
    env.write_file("src/main/webapp/WEB-INF/a.jsp", "<p>one</p>");
    env.write_file("src/main/webapp/a.jsp", "<p>two</p>");
    env.write_file("src/main/webapp/b.jsp", "<p>three</p>");

    let report = engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();

    assert_eq!(report.collisions.len(), 1);
    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 2);
    for result in &failed {
        let message = result.error.as_deref().unwrap();
        assert!(message.contains("src/main/webapp/WEB-INF/a.jsp"), "{message}");
        assert!(message.contains("src/main/webapp/a.jsp"), "{message}");
    }
    assert!(!env.target("src/main/resources/templates/a.html").exists());
    assert!(env.target("src/main/resources/templates/b.html").exists());
    assert!(!report.summary.all_succeeded());
}

#[test]
fn test_failed_task_does_not_stop_later_tasks() {
    let env = TestEnv::new();
    env.write_file("src/main/java/com/x/servlet/HomeServlet.java", POST_SERVLET);
    env.write_file("src/main/webapp/css/site.css", "body {}");
    env.write_file("src/main/webapp/index.jsp", "<p>${x}</p>");

    // a regular file where the static root directory has to go
    fs::create_dir_all(env.target("src/main/resources")).unwrap();
    fs::write(env.target("src/main/resources/static"), "blocker").unwrap();

    let report = engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();

    let outcome: Vec<(TaskKind, bool)> = report
        .results
        .iter()
        .take(3)
        .map(|r| (r.task.kind, r.success))
        .collect();
    assert_eq!(
        outcome,
        vec![
            (TaskKind::ConvertHandler, true),
            (TaskKind::CopyVerbatim, false),
            (TaskKind::ConvertTemplate, true),
        ]
    );
    assert_eq!(report.summary.failed, 1);
    let failed = report.failures().next().unwrap();
    assert_eq!(failed.task.origin(), "src/main/webapp/css/site.css");
    assert!(env.target("src/main/resources/templates/index.html").exists());
    assert_eq!(
        fs::read_to_string(env.target("src/main/resources/static")).unwrap(),
        "blocker"
    );
}

#[test]
fn test_dry_run_writes_nothing() {
    let env = TestEnv::new();
    env.write_blog();

    let report = engine()
        .convert(
            &env.source_dir,
            &env.target_dir,
            ConvertOptions { dry_run: true },
        )
        .unwrap();
    assert!(report.dry_run);
    assert!(report.summary.all_succeeded());
    assert!(!env.target_dir.exists());
}

// ============================================================================
// Scaffold
// ============================================================================

#[test]
fn test_security_signals_add_security_scaffold() {
    let env = TestEnv::new();
    env.write_file("src/main/java/com/shpota/blog/servlet/LoginServlet.java", LOGIN_SERVLET);

    let report = engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();
    assert!(report.summary.all_succeeded());

    let security = env.read_target("src/main/java/com/example/app/config/SecurityConfig.java");
    assert!(security.starts_with("package com.example.app.config;"));
    let pom = env.read_target("pom.xml");
    assert!(pom.contains("spring-boot-starter-security"));
    let yml = env.read_target("src/main/resources/application.yml");
    assert!(yml.contains("security:"));
}

#[test]
fn test_plain_project_has_no_security_scaffold() {
    let env = TestEnv::new();
    env.write_blog();

    engine()
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();
    assert!(!env
        .target("src/main/java/com/example/app/config/SecurityConfig.java")
        .exists());
    assert!(!env.read_target("pom.xml").contains("spring-boot-starter-security"));
}

#[test]
fn test_converted_output_is_stable_on_rerun() {
    let env = TestEnv::new();
    env.write_blog();
    let engine = engine();

    engine
        .convert(&env.source_dir, &env.target_dir, ConvertOptions::default())
        .unwrap();
    let first = env.read_target("src/main/resources/templates/posts.html");
    assert_eq!(engine.transform_template(&first), first);
}
