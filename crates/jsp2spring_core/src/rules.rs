//! Staged rewrite rules
//!
//! A rule is a compiled pattern plus a function building the replacement from
//! its captures. Rules are grouped into numbered stages; a [`RuleSet`] holds
//! them in stage order and refuses to be built from a misordered list.
//!
//! Template stages (each assumes the previous ones have run):
//!
//! | Stage | Precondition | Postcondition |
//! |---|---|---|
//! | 1 Namespace | raw JSP | root `<html>` carries `xmlns:th`, or the document is wrapped |
//! | 2 Directives | | no `<%-- --%>`, page/taglib directive or scriptlet remains; `<%@ include %>` kept |
//! | 3 StructuredTags | scriptlets gone | no `c:forEach/out/if/choose/when/otherwise`, `fmt:*`, `c:set`, `sql:*` tags |
//! | 4 Includes | | no `jsp:include/forward`, `c:import`, include directive |
//! | 5 Forms | | every form and named field carries a `th:` attribute |
//! | 6 Expressions | lines holding `th:` are already bound | no bare `${}` outside comments on unbound lines |
//! | 7 Normalize | | no blank lines, two-space indent by tag depth |
//!
//! Handler stages:
//!
//! | Stage | Postcondition |
//! |---|---|
//! | 1 Annotations | no `@WebServlet`, no `HttpServlet` base class or import; class renamed |
//! | 2 LifecycleMethods | `doGet/doPost/doPut/doDelete` replaced by mapped action methods |
//! | 3 Imports | Spring imports present after the package line |
//! | 4 Packages | handler segments and the legacy package prefix rewritten |

use crate::error::{EngineError, Result};
use regex::{Captures, Regex};
use std::fmt;

/// Replacement builder. Rules form a closed set, so plain function pointers suffice.
pub type BuildFn = fn(&Captures) -> String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum TemplateStage {
    Namespace = 1,
    Directives = 2,
    StructuredTags = 3,
    Includes = 4,
    Forms = 5,
    Expressions = 6,
    Normalize = 7,
}

impl TemplateStage {
    pub const ALL: [TemplateStage; 7] = [
        Self::Namespace,
        Self::Directives,
        Self::StructuredTags,
        Self::Includes,
        Self::Forms,
        Self::Expressions,
        Self::Normalize,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Directives => "directives",
            Self::StructuredTags => "structured_tags",
            Self::Includes => "includes",
            Self::Forms => "forms",
            Self::Expressions => "expressions",
            Self::Normalize => "normalize",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum HandlerStage {
    Annotations = 1,
    LifecycleMethods = 2,
    Imports = 3,
    Packages = 4,
}

impl HandlerStage {
    pub const ALL: [HandlerStage; 4] = [
        Self::Annotations,
        Self::LifecycleMethods,
        Self::Imports,
        Self::Packages,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Annotations => "annotations",
            Self::LifecycleMethods => "lifecycle_methods",
            Self::Imports => "imports",
            Self::Packages => "packages",
        }
    }
}

/// Where a rule is allowed to match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Anywhere in the document
    Document,
    /// Only on lines without a `th:` attribute, outside `<!-- -->` regions
    UnboundLines,
}

#[derive(Clone)]
pub struct TransformationRule {
    pub name: &'static str,
    pub stage: u8,
    pub scope: Scope,
    pub matcher: Regex,
    pub build: BuildFn,
}

impl fmt::Debug for TransformationRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformationRule")
            .field("name", &self.name)
            .field("stage", &self.stage)
            .field("scope", &self.scope)
            .field("matcher", &self.matcher.as_str())
            .finish()
    }
}

impl TransformationRule {
    pub fn new(name: &'static str, stage: u8, pattern: &str, build: BuildFn) -> Result<Self> {
        let matcher = Regex::new(pattern).map_err(|e| EngineError::Pattern {
            rule: name.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self {
            name,
            stage,
            scope: Scope::Document,
            matcher,
            build,
        })
    }

    pub fn scoped(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Rewrite every match in `text`
    pub fn apply(&self, text: &str) -> String {
        self.matcher
            .replace_all(text, |caps: &Captures| (self.build)(caps))
            .into_owned()
    }
}

/// Immutable, stage-ordered rule list
#[derive(Debug, Clone)]
pub struct RuleSet {
    rules: Vec<TransformationRule>,
}

impl RuleSet {
    /// Build a rule set. Stages must be non-decreasing in list order.
    pub fn new(rules: Vec<TransformationRule>) -> Result<Self> {
        let mut previous = 0u8;
        for rule in &rules {
            if rule.stage < previous {
                return Err(EngineError::RuleOrder {
                    rule: rule.name.to_string(),
                    stage: rule.stage,
                    previous,
                });
            }
            previous = rule.stage;
        }
        Ok(Self { rules })
    }

    /// Rules of one stage, in list order
    pub fn stage(&self, stage: u8) -> impl Iterator<Item = &TransformationRule> {
        self.rules.iter().filter(move |r| r.stage == stage)
    }

    pub fn rules(&self) -> &[TransformationRule] {
        &self.rules
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}

// ============================================================================
// Capture helpers
// ============================================================================

fn group<'t>(caps: &Captures<'t>, i: usize) -> &'t str {
    caps.get(i).map(|m| m.as_str()).unwrap_or("")
}

fn whole(caps: &Captures) -> String {
    group(caps, 0).to_string()
}

/// Value of a quoted attribute inside a tag's attribute text
pub(crate) fn attribute<'t>(attrs: &'t str, name: &str) -> Option<&'t str> {
    for (idx, _) in attrs.match_indices(name) {
        let before_ok = attrs[..idx]
            .chars()
            .next_back()
            .map(|c| c.is_whitespace())
            .unwrap_or(true);
        if !before_ok {
            continue;
        }
        let rest = attrs[idx + name.len()..].trim_start();
        let Some(rest) = rest.strip_prefix('=') else {
            continue;
        };
        let rest = rest.trim_start();
        let Some(quote) = rest.chars().next().filter(|c| *c == '"' || *c == '\'') else {
            continue;
        };
        let body = &rest[1..];
        if let Some(end) = body.find(quote) {
            return Some(&body[..end]);
        }
    }
    None
}

/// Inner text of `${...}`, or the value itself when it is not an EL expression
fn el_body(value: &str) -> &str {
    let v = value.trim();
    v.strip_prefix("${")
        .and_then(|s| s.strip_suffix('}'))
        .map(str::trim)
        .unwrap_or(v)
}

fn is_single_el(value: &str) -> bool {
    let v = value.trim();
    v.starts_with("${") && v.ends_with('}') && v.matches("${").count() == 1
}

/// `${x}` kept as is; anything else wrapped into an expression
fn as_expression(value: &str) -> String {
    if is_single_el(value) {
        value.trim().to_string()
    } else {
        format!("${{{}}}", value.trim())
    }
}

fn tag_attrs(raw: &str) -> &str {
    raw.trim().trim_end_matches('/').trim_end()
}

const CONTEXT_PATH: &str = "${pageContext.request.contextPath}";

/// Link target with the servlet context prefix dropped (Thymeleaf adds it back)
fn link_path(value: &str) -> String {
    let rest = value.trim().strip_prefix(CONTEXT_PATH).unwrap_or(value.trim());
    if rest.is_empty() {
        "/".to_string()
    } else {
        rest.to_string()
    }
}

/// Thymeleaf fragment name for an included page
fn fragment_name(page: &str) -> String {
    let mut name = page.trim().trim_start_matches('/');
    name = name.strip_prefix("WEB-INF/").unwrap_or(name);
    for dir in ["jsp/", "views/"] {
        if let Some(stripped) = name.strip_prefix(dir) {
            name = stripped;
            break;
        }
    }
    let lower = name.to_ascii_lowercase();
    for ext in [".jspx", ".jspf", ".jsp"] {
        if lower.len() > ext.len() && lower.ends_with(ext) {
            name = &name[..name.len() - ext.len()];
            break;
        }
    }
    name.to_string()
}

fn insert_fragment(page: &str) -> String {
    format!("<div th:insert=\"~{{{}}}\"></div>", fragment_name(page))
}

fn review_comment(label: &str, body: &str) -> String {
    format!("<!-- {} (review manually): {} -->", label, body.trim())
}

// ============================================================================
// Template rule builders
// ============================================================================

fn html_namespace(caps: &Captures) -> String {
    let attrs = group(caps, 1);
    if attrs.contains("xmlns:th") {
        return whole(caps);
    }
    format!(
        "<html{} xmlns:th=\"http://www.thymeleaf.org\">",
        attrs.trim_end()
    )
}

fn jsp_comment(caps: &Captures) -> String {
    format!("<!--{}-->", group(caps, 1))
}

fn page_directive(caps: &Captures) -> String {
    format!("<!-- JSP Page Directive: {} -->", group(caps, 1))
}

fn taglib_directive(caps: &Captures) -> String {
    format!("<!-- JSP Taglib Directive: {} -->", group(caps, 1))
}

fn scriptlet(caps: &Captures) -> String {
    let marker = group(caps, 1);
    if marker == "@" {
        return whole(caps);
    }
    let label = match marker {
        "=" => "JSP Expression",
        "!" => "JSP Declaration",
        _ => "JSP Scriptlet",
    };
    review_comment(label, group(caps, 2))
}

fn for_each_open(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    let var = attribute(attrs, "var");
    let items = attribute(attrs, "items");
    let begin = attribute(attrs, "begin");
    let end = attribute(attrs, "end");
    match (var, items, begin, end) {
        (Some(var), Some(items), _, _) => {
            format!("<div th:each=\"{} : ${{{}}}\">", var, el_body(items))
        }
        (Some(var), None, Some(begin), Some(end)) => format!(
            "<div th:each=\"{} : ${{#numbers.sequence({}, {})}}\">",
            var,
            el_body(begin),
            el_body(end)
        ),
        _ => format!("<div>{}", review_comment("JSTL c:forEach", attrs)),
    }
}

fn closing_div(_caps: &Captures) -> String {
    "</div>".to_string()
}

fn erase(_caps: &Captures) -> String {
    String::new()
}

fn c_out(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    match attribute(attrs, "value") {
        Some(value) if value.contains("${") => {
            format!("<span th:text=\"{}\"></span>", as_expression(value))
        }
        Some(literal) => format!("<span th:text=\"'{}'\"></span>", literal.replace('\'', "\\'")),
        None => review_comment("JSTL c:out", attrs),
    }
}

fn c_if_open(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    match attribute(attrs, "test") {
        Some(test) => format!("<div th:if=\"{}\">", as_expression(test)),
        None => format!("<div>{}", review_comment("JSTL c:if", attrs)),
    }
}

fn c_choose_open(_caps: &Captures) -> String {
    "<div th:switch=\"${true}\">".to_string()
}

fn c_when_open(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    match attribute(attrs, "test") {
        Some(test) => format!("<div th:case=\"{}\">", as_expression(test)),
        None => format!("<div>{}", review_comment("JSTL c:when", attrs)),
    }
}

fn c_otherwise_open(_caps: &Captures) -> String {
    "<div th:case=\"*\">".to_string()
}

fn fmt_message(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    match attribute(attrs, "key") {
        Some(key) => format!("<span th:text=\"#{{{}}}\"></span>", key),
        None => review_comment("JSTL fmt:message", attrs),
    }
}

fn fmt_format_date(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    let Some(value) = attribute(attrs, "value") else {
        return review_comment("JSTL fmt:formatDate", attrs);
    };
    match attribute(attrs, "pattern") {
        Some(pattern) => format!(
            "<span th:text=\"${{#dates.format({}, '{}')}}\"></span>",
            el_body(value),
            pattern
        ),
        None => format!(
            "<span th:text=\"${{#dates.format({})}}\"></span>",
            el_body(value)
        ),
    }
}

fn fmt_format_number(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    match attribute(attrs, "value") {
        Some(value) => format!(
            "<span th:text=\"${{#numbers.formatDecimal({}, 1, 2)}}\"></span>",
            el_body(value)
        ),
        None => review_comment("JSTL fmt:formatNumber", attrs),
    }
}

/// Context-relative URL, bound later as a link expression
fn c_url(caps: &Captures) -> String {
    let attrs = tag_attrs(group(caps, 1));
    match attribute(attrs, "value") {
        Some(value) if value.starts_with('/') => format!("{}{}", CONTEXT_PATH, value),
        Some(value) => value.to_string(),
        None => review_comment("JSTL c:url", attrs),
    }
}

fn jstl_review(caps: &Captures) -> String {
    review_comment(&format!("JSTL {}", group(caps, 1)), tag_attrs(group(caps, 2)))
}

fn jsp_include(caps: &Captures) -> String {
    match attribute(group(caps, 1), "page") {
        Some(page) => insert_fragment(page),
        None => review_comment("JSP include", tag_attrs(group(caps, 1))),
    }
}

fn include_directive(caps: &Captures) -> String {
    insert_fragment(group(caps, 1))
}

fn c_import(caps: &Captures) -> String {
    match attribute(group(caps, 1), "url") {
        Some(url) => insert_fragment(url),
        None => review_comment("JSTL c:import", tag_attrs(group(caps, 1))),
    }
}

fn jsp_forward(caps: &Captures) -> String {
    let page = attribute(group(caps, 1), "page").unwrap_or("?");
    format!("<!-- JSP Forward to {} - Handle in controller -->", page)
}

fn form_action(caps: &Captures) -> String {
    let attrs = group(caps, 1);
    if attrs.contains("th:") {
        return whole(caps);
    }
    let action = attribute(attrs, "action")
        .map(link_path)
        .unwrap_or_else(|| "/".to_string());
    format!("<form{} th:action=\"@{{{}}}\">", attrs.trim_end(), action)
}

fn field_binding(caps: &Captures) -> String {
    let tag = group(caps, 1);
    let attrs = group(caps, 2);
    if attrs.contains("th:") {
        return whole(caps);
    }
    match attribute(attrs, "name") {
        Some(name) if !name.is_empty() && !name.contains("${") => format!(
            "<{}{} th:field=\"*{{{}}}\"{}>",
            tag,
            attrs.trim_end(),
            name,
            group(caps, 3)
        ),
        _ => whole(caps),
    }
}

const LINK_ATTRIBUTES: &[&str] = &["href", "src", "action"];

fn bind_expression(caps: &Captures) -> String {
    if let Some(name) = caps.get(1) {
        let name = name.as_str();
        // keep the source quote
        let (quote, value) = match caps.get(2) {
            Some(double) => ('"', double.as_str()),
            None => ('\'', group(caps, 3)),
        };
        let bound = if is_single_el(value) && !value.trim().starts_with(CONTEXT_PATH) {
            value.trim().to_string()
        } else if LINK_ATTRIBUTES.contains(&name) {
            let path = link_path(value);
            if path.contains("${") {
                format!("|{}|", path)
            } else {
                format!("@{{{}}}", path)
            }
        } else {
            format!("|{}|", value)
        };
        return format!("th:{}={q}{}{q}", name, bound, q = quote);
    }
    format!("<span th:text=\"${{{}}}\"></span>", group(caps, 4).trim())
}

type RuleDef = (&'static str, u8, &'static str, BuildFn);

fn compile(defs: &[RuleDef]) -> Result<Vec<TransformationRule>> {
    defs
        .iter()
        .map(|(name, stage, pattern, build)| TransformationRule::new(*name, *stage, *pattern, *build))
        .collect()
}

/// Built-in JSP → Thymeleaf rule set
pub fn template_rules() -> Result<RuleSet> {
    use TemplateStage::*;
    let defs: &[RuleDef] = &[
        ("html_namespace", Namespace as u8, r"(?i)<html\b([^<>]*)>", html_namespace),
        ("jsp_comment", Directives as u8, r"(?s)<%--(.*?)--%>", jsp_comment),
        ("page_directive", Directives as u8, r"<%@\s*page\s+([^%>]*?)\s*%>", page_directive),
        ("taglib_directive", Directives as u8, r"<%@\s*taglib\s+([^%>]*?)\s*%>", taglib_directive),
        ("scriptlet", Directives as u8, r"(?s)<%([=!@]?)(.*?)%>", scriptlet),
        ("c_foreach_open", StructuredTags as u8, r"<c:forEach\b([^<>]*)>", for_each_open),
        ("c_foreach_close", StructuredTags as u8, r"</c:forEach\s*>", closing_div),
        ("c_out", StructuredTags as u8, r"<c:out\b([^<>]*)>", c_out),
        ("c_out_close", StructuredTags as u8, r"</c:out\s*>", erase),
        ("c_if_open", StructuredTags as u8, r"<c:if\b([^<>]*)>", c_if_open),
        ("c_if_close", StructuredTags as u8, r"</c:if\s*>", closing_div),
        ("c_choose_open", StructuredTags as u8, r"<c:choose\s*>", c_choose_open),
        ("c_choose_close", StructuredTags as u8, r"</c:choose\s*>", closing_div),
        ("c_when_open", StructuredTags as u8, r"<c:when\b([^<>]*)>", c_when_open),
        ("c_when_close", StructuredTags as u8, r"</c:when\s*>", closing_div),
        ("c_otherwise_open", StructuredTags as u8, r"<c:otherwise\s*>", c_otherwise_open),
        ("c_otherwise_close", StructuredTags as u8, r"</c:otherwise\s*>", closing_div),
        ("fmt_message", StructuredTags as u8, r"<fmt:message\b([^<>]*)>", fmt_message),
        ("fmt_format_date", StructuredTags as u8, r"<fmt:formatDate\b([^<>]*)>", fmt_format_date),
        ("fmt_format_number", StructuredTags as u8, r"<fmt:formatNumber\b([^<>]*)>", fmt_format_number),
        ("fmt_close", StructuredTags as u8, r"</fmt:(?:message|formatDate|formatNumber)\s*>", erase),
        ("c_url", StructuredTags as u8, r"<c:url\b([^<>]*)>", c_url),
        ("c_url_close", StructuredTags as u8, r"</c:url\s*>", erase),
        (
            "jstl_review",
            StructuredTags as u8,
            r"<(c:set|c:remove|c:redirect|c:catch|c:param|c:forTokens|fmt:[A-Za-z]+|sql:[A-Za-z]+)\b([^<>]*)>",
            jstl_review,
        ),
        (
            "jstl_review_close",
            StructuredTags as u8,
            r"</(?:c:set|c:remove|c:redirect|c:catch|c:param|c:forTokens|fmt:[A-Za-z]+|sql:[A-Za-z]+)\s*>",
            erase,
        ),
        ("jsp_include", Includes as u8, r"<jsp:include\b([^<>]*)>", jsp_include),
        ("jsp_include_close", Includes as u8, r"</jsp:include\s*>", erase),
        (
            "include_directive",
            Includes as u8,
            r#"<%@\s*include\s+file\s*=\s*["']([^"']+)["']\s*%>"#,
            include_directive,
        ),
        ("c_import", Includes as u8, r"<c:import\b([^<>]*)>", c_import),
        ("c_import_close", Includes as u8, r"</c:import\s*>", erase),
        ("jsp_forward", Includes as u8, r"<jsp:forward\b([^<>]*)>", jsp_forward),
        ("jsp_forward_close", Includes as u8, r"</jsp:forward\s*>", erase),
        ("form_action", Forms as u8, r"<form\b([^<>]*)>", form_action),
        (
            "field_binding",
            Forms as u8,
            r"<(input|select|textarea)\b([^<>]*?)(\s*/)?>",
            field_binding,
        ),
    ];
    let mut rules = compile(defs)?;
    rules.push(
        TransformationRule::new(
            "bind_expression",
            Expressions as u8,
            r#"([A-Za-z_][-A-Za-z0-9_:.]*)\s*=\s*(?:"([^"]*\$\{[^"]*)"|'([^']*\$\{[^']*)')|\$\{([^}]+)\}"#,
            bind_expression,
        )?
        .scoped(Scope::UnboundLines),
    );
    RuleSet::new(rules)
}

// ============================================================================
// Handler rule builders
// ============================================================================

/// First quoted `/...` pattern in the annotation arguments, without a trailing `/*`
fn first_url_pattern(args: &str) -> Option<String> {
    args.split('"')
        .skip(1)
        .step_by(2)
        .find(|s| s.starts_with('/'))
        .map(|s| {
            let trimmed = s.strip_suffix("/*").unwrap_or(s);
            if trimmed.is_empty() {
                "/".to_string()
            } else {
                trimmed.to_string()
            }
        })
}

fn web_servlet(caps: &Captures) -> String {
    let indent = group(caps, 1);
    match first_url_pattern(group(caps, 2)) {
        Some(url) => format!(
            "{indent}@Controller\n{indent}@RequestMapping(\"{url}\")\n",
            indent = indent,
            url = url
        ),
        None => format!("{}@Controller\n", indent),
    }
}

fn lifecycle_method(caps: &Captures) -> String {
    let indent = group(caps, 1);
    let verb = group(caps, 2);
    format!(
        "{indent}// Converted servlet {upper} handler: review request handling\n{indent}@{verb}Mapping\n{indent}public void {lower}(",
        indent = indent,
        verb = verb,
        upper = verb.to_uppercase(),
        lower = verb.to_lowercase()
    )
}

/// Built-in Servlet → Spring MVC rule set. Import insertion and package
/// rewriting are configured passes of the handler transformer.
pub fn handler_rules() -> Result<RuleSet> {
    use HandlerStage::*;
    let defs: &[RuleDef] = &[
        (
            "web_servlet",
            Annotations as u8,
            r"(?m)^([ \t]*)@WebServlet\b(\([^)]*\))?[ \t]*\r?\n?",
            web_servlet,
        ),
        (
            "servlet_base_class",
            Annotations as u8,
            r"[ \t]+extends[ \t]+(?:(?:javax|jakarta)\.servlet\.http\.)?HttpServlet\b",
            erase,
        ),
        (
            "servlet_imports",
            Annotations as u8,
            r"(?m)^[ \t]*import[ \t]+(?:javax|jakarta)\.servlet\.(?:http\.HttpServlet|annotation\.WebServlet)[ \t]*;[ \t]*\r?\n?",
            erase,
        ),
        (
            "lifecycle_methods",
            LifecycleMethods as u8,
            r"(?m)^([ \t]*)(?:@Override\s+)?(?:public|protected)[ \t]+void[ \t]+do(Get|Post|Put|Delete)[ \t]*\(",
            lifecycle_method,
        ),
    ];
    RuleSet::new(compile(defs)?)
}
