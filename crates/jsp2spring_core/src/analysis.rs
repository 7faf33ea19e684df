//! Content signals for handler sources and project-wide insights.
//!
//! Signals are plain substring checks over the class text. They feed the
//! analyze report and decide whether the scaffold carries a security module.

use crate::types::{FileCategory, ProjectStructure};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    ServletAnnotation,
    HttpGet,
    HttpPost,
    RequestDispatcher,
    Redirect,
    SessionManagement,
    Authentication,
    Authorization,
    SessionSecurity,
}

impl Signal {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ServletAnnotation => "servlet_annotation",
            Self::HttpGet => "http_get",
            Self::HttpPost => "http_post",
            Self::RequestDispatcher => "request_dispatcher",
            Self::Redirect => "redirect",
            Self::SessionManagement => "session_management",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::SessionSecurity => "session_security",
        }
    }

    pub fn is_security(&self) -> bool {
        matches!(
            self,
            Self::Authentication | Self::Authorization | Self::SessionSecurity
        )
    }
}

/// Probe table: a signal fires when any of its needles occurs in the content
const PROBES: &[(Signal, &[&str])] = &[
    (Signal::ServletAnnotation, &["@WebServlet"]),
    (Signal::HttpGet, &["doGet"]),
    (Signal::HttpPost, &["doPost"]),
    (Signal::RequestDispatcher, &["RequestDispatcher"]),
    (Signal::Redirect, &["sendRedirect"]),
    (Signal::SessionManagement, &["HttpSession"]),
    (Signal::Authentication, &["login", "authenticate"]),
    (Signal::Authorization, &["role", "permission"]),
    (
        Signal::SessionSecurity,
        &["session.invalidate", "session.setMaxInactiveInterval"],
    ),
];

/// Detect signals in handler-source text, in table order
pub fn detect_signals(content: &str) -> Vec<Signal> {
    PROBES
        .iter()
        .filter(|(_, needles)| needles.iter().any(|n| content.contains(n)))
        .map(|(signal, _)| *signal)
        .collect()
}

/// Aggregate view over a classified project
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectInsights {
    /// signal -> number of files carrying it
    pub signal_counts: BTreeMap<Signal, usize>,
    /// Whether the generated scaffold includes a security module
    pub needs_security: bool,
}

impl ProjectInsights {
    pub fn from_structure(structure: &ProjectStructure) -> Self {
        let mut signal_counts = BTreeMap::new();
        for file in structure.files(FileCategory::RequestHandler) {
            for signal in &file.signals {
                *signal_counts.entry(*signal).or_insert(0) += 1;
            }
        }
        let needs_security = signal_counts.keys().any(Signal::is_security);
        Self {
            signal_counts,
            needs_security,
        }
    }
}
