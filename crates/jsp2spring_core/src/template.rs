//! JSP → Thymeleaf template transformer
//!
//! Runs the template [`RuleSet`] stage by stage. Two stages carry a fixed pass
//! besides their rules: Namespace wraps a document that has no root `<html>`,
//! and Normalize re-indents by tag depth. The transformer never fails:
//! markup outside the rule coverage passes through, possibly marked for review.

use crate::rules::{RuleSet, Scope, TemplateStage, TransformationRule};
use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tracing::debug;

const THYMELEAF_NS: &str = "http://www.thymeleaf.org";

const VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Counts over a source template (what the conversion had to touch)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateReport {
    pub structured_tags: usize,
    pub expressions: usize,
    pub directives: usize,
    pub forms: usize,
    /// Review markers present in the output
    pub review_markers: usize,
}

impl AddAssign for TemplateReport {
    fn add_assign(&mut self, other: Self) {
        self.structured_tags += other.structured_tags;
        self.expressions += other.expressions;
        self.directives += other.directives;
        self.forms += other.forms;
        self.review_markers += other.review_markers;
    }
}

pub struct TemplateTransformer<'a> {
    rules: &'a RuleSet,
}

impl<'a> TemplateTransformer<'a> {
    pub fn new(rules: &'a RuleSet) -> Self {
        Self { rules }
    }

    /// Convert a JSP document. Idempotent on its own output.
    pub fn transform(&self, text: &str) -> String {
        let mut out = text.to_string();
        for stage in TemplateStage::ALL {
            out = self.run_stage(stage, out);
        }
        out
    }

    /// Convert and report what was found in the source
    pub fn transform_with_report(&self, text: &str) -> (String, TemplateReport) {
        let output = self.transform(text);
        let mut report = count_constructs(text);
        report.review_markers = output.matches("(review manually)").count();
        (output, report)
    }

    fn run_stage(&self, stage: TemplateStage, text: String) -> String {
        let number = stage.number();
        let mut out = match stage {
            TemplateStage::Namespace => {
                if !self.rules.stage(number).any(|r| r.matcher.is_match(&text)) {
                    debug!(stage = stage.as_str(), "No root element, wrapping document");
                    return wrap_document(&text);
                }
                text
            }
            _ => text,
        };

        for rule in self.rules.stage(number) {
            out = match rule.scope {
                Scope::Document => rule.apply(&out),
                Scope::UnboundLines => apply_unbound_lines(rule, &out),
            };
        }

        if stage == TemplateStage::Normalize {
            out = normalize(&out);
        }
        out
    }
}

fn wrap_document(text: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html xmlns:th=\"{}\">\n{}\n</html>",
        THYMELEAF_NS, text
    )
}

fn count_constructs(text: &str) -> TemplateReport {
    let structured_tags = ["<c:", "<fmt:", "<sql:"]
        .iter()
        .map(|p| text.matches(p).count())
        .sum();
    let expressions = text
        .match_indices("${")
        .filter(|(idx, _)| text[idx + 2..].contains('}'))
        .count();
    let directives = text.matches("<%@").count();
    let forms = text
        .match_indices("<form")
        .filter(|(idx, _)| {
            text[idx + 5..]
                .chars()
                .next()
                .map(|c| c.is_whitespace() || c == '>')
                .unwrap_or(false)
        })
        .count();
    TemplateReport {
        structured_tags,
        expressions,
        directives,
        forms,
        review_markers: 0,
    }
}

/// Regions a line-scoped rule never rewrites. Script regions start after the
/// opening tag, so its attributes are still rewritten.
#[derive(Clone, Copy)]
enum Skipped {
    Comment,
    Script,
}

impl Skipped {
    fn closer(self) -> &'static str {
        match self {
            Skipped::Comment => "-->",
            Skipped::Script => "</script",
        }
    }
}

/// Earliest skipped region opening in `lower`: (region, start offset)
fn next_skipped(lower: &str) -> Option<(Skipped, usize)> {
    let comment = lower.find("<!--").map(|i| (Skipped::Comment, i));
    let script = lower
        .match_indices("<script")
        .find(|(i, m)| {
            lower[i + m.len()..]
                .chars()
                .next()
                .map_or(true, |c| c == '>' || c == '/' || c.is_whitespace())
        })
        .map(|(i, _)| (Skipped::Script, i));
    match (comment, script) {
        (Some(c), Some(s)) => Some(if c.1 <= s.1 { c } else { s }),
        (c, s) => c.or(s),
    }
}

/// Apply `rule` line by line, leaving bound lines, comments and script bodies alone
fn apply_unbound_lines(rule: &TransformationRule, text: &str) -> String {
    let mut inside: Option<Skipped> = None;
    let mut lines = Vec::new();
    for line in text.split('\n') {
        let bound = line.contains("th:");
        let apply = |segment: &str| if bound { segment.to_string() } else { rule.apply(segment) };
        let mut rebuilt = String::with_capacity(line.len());
        let mut rest = line;
        while !rest.is_empty() {
            // ASCII lowercasing keeps byte offsets aligned with `rest`
            let lower = rest.to_ascii_lowercase();
            if let Some(region) = inside {
                let closer = region.closer();
                match lower.find(closer) {
                    Some(end) => {
                        rebuilt.push_str(&rest[..end + closer.len()]);
                        rest = &rest[end + closer.len()..];
                        inside = None;
                    }
                    None => {
                        rebuilt.push_str(rest);
                        rest = "";
                    }
                }
                continue;
            }
            match next_skipped(&lower) {
                None => {
                    rebuilt.push_str(&apply(rest));
                    rest = "";
                }
                Some((Skipped::Comment, start)) => {
                    rebuilt.push_str(&apply(&rest[..start]));
                    // keep the comment opener out of the closer search
                    rebuilt.push_str(&rest[start..start + 4]);
                    rest = &rest[start + 4..];
                    inside = Some(Skipped::Comment);
                }
                Some((Skipped::Script, start)) => {
                    let tag_end = lower[start..].find('>').map_or(rest.len(), |e| start + e + 1);
                    let tag = &rest[start..tag_end];
                    rebuilt.push_str(&apply(&rest[..tag_end]));
                    rest = &rest[tag_end..];
                    if !tag.ends_with("/>") {
                        inside = Some(Skipped::Script);
                    }
                }
            }
        }
        lines.push(rebuilt);
    }
    lines.join("\n")
}

/// Trim lines, drop blank ones and indent two spaces per open element.
///
/// A tag stack tracks open elements; void elements, self-closing tags,
/// comments and declarations never nest, and a closer without a matching
/// opener is ignored. Closers at the start of a line dedent that line.
fn normalize(text: &str) -> String {
    let mut stack: Vec<String> = Vec::new();
    let mut in_comment = false;
    let mut out = String::with_capacity(text.len());

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        let mut print_depth: Option<usize> = None;
        let mut rest = line;
        while !rest.is_empty() {
            if in_comment {
                match rest.find("-->") {
                    Some(end) => {
                        rest = &rest[end + 3..];
                        in_comment = false;
                    }
                    None => rest = "",
                }
                continue;
            }
            let Some(lt) = rest.find('<') else {
                if !rest.trim().is_empty() && print_depth.is_none() {
                    print_depth = Some(stack.len());
                }
                break;
            };
            if !rest[..lt].trim().is_empty() && print_depth.is_none() {
                print_depth = Some(stack.len());
            }
            let tag_text = &rest[lt..];
            if tag_text.starts_with("<!--") {
                print_depth.get_or_insert(stack.len());
                in_comment = true;
                rest = &tag_text[4..];
                continue;
            }
            let end = tag_text.find('>').map(|e| e + 1).unwrap_or(tag_text.len());
            let tag = &tag_text[..end];
            rest = &tag_text[end..];

            match parse_tag(tag) {
                Some(ParsedTag::Close(name)) => {
                    if let Some(pos) = stack.iter().rposition(|open| *open == name) {
                        stack.truncate(pos);
                    }
                }
                Some(ParsedTag::Open(name)) => {
                    print_depth.get_or_insert(stack.len());
                    stack.push(name);
                }
                Some(ParsedTag::Leaf) | None => {
                    print_depth.get_or_insert(stack.len());
                }
            }
        }

        let depth = print_depth.unwrap_or(stack.len());
        for _ in 0..depth {
            out.push_str("  ");
        }
        out.push_str(line);
        out.push('\n');
    }
    out
}

enum ParsedTag {
    Open(String),
    Close(String),
    /// Void, self-closing, declaration or processing instruction
    Leaf,
}

fn parse_tag(tag: &str) -> Option<ParsedTag> {
    let inner = tag.strip_prefix('<')?;
    if inner.starts_with('!') || inner.starts_with('?') {
        return Some(ParsedTag::Leaf);
    }
    let (closing, body) = match inner.strip_prefix('/') {
        Some(body) => (true, body),
        None => (false, inner),
    };
    let name: String = body
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || matches!(c, ':' | '-' | '_' | '.'))
        .collect::<String>()
        .to_ascii_lowercase();
    if name.is_empty() || !name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    if closing {
        return Some(ParsedTag::Close(name));
    }
    let self_closing = tag.trim_end_matches('>').trim_end().ends_with('/');
    if self_closing || VOID_ELEMENTS.contains(&name.as_str()) {
        return Some(ParsedTag::Leaf);
    }
    Some(ParsedTag::Open(name))
}
