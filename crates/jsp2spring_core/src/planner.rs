//! Conversion planning
//!
//! One task per classified file (Unclassified files are skipped), then the
//! scaffold tasks. Handler conversions and verbatim copies come first,
//! templates next, scaffold last. Every task whose target path is claimed by
//! another task is marked as colliding; the executor fails those without
//! touching storage.

use crate::analysis::ProjectInsights;
use crate::path_mapper::PathMapper;
use crate::scaffold::ScaffoldGenerator;
use crate::types::{
    ClassifiedFile, ConversionTask, FileCategory, ProjectStructure, TaskKind, TaskPriority,
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

/// A target path claimed by more than one task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Collision {
    pub target_path: String,
    pub claimants: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionPlan {
    pub tasks: Vec<ConversionTask>,
    pub collisions: Vec<Collision>,
}

impl ConversionPlan {
    /// Task count per kind name
    pub fn kind_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for task in &self.tasks {
            *counts.entry(task.kind.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

pub struct Planner<'a> {
    mapper: PathMapper<'a>,
    scaffold: ScaffoldGenerator<'a>,
}

impl<'a> Planner<'a> {
    pub fn new(mapper: PathMapper<'a>, scaffold: ScaffoldGenerator<'a>) -> Self {
        Self { mapper, scaffold }
    }

    pub fn plan(&self, structure: &ProjectStructure, insights: &ProjectInsights) -> ConversionPlan {
        let mut tasks: Vec<ConversionTask> = [
            FileCategory::RequestHandler,
            FileCategory::StaticAsset,
            FileCategory::ConfigResource,
            FileCategory::PageTemplate,
        ]
        .into_iter()
        .flat_map(|category| structure.files(category).iter().map(|f| self.file_task(f)))
        .collect();

        for artifact in self.scaffold.artifacts(insights) {
            tasks.push(ConversionTask {
                id: 0,
                kind: TaskKind::GenerateScaffold(artifact),
                source: None,
                target_path: self.scaffold.target_path(artifact),
                priority: TaskPriority::Medium,
                collision: None,
            });
        }

        // stable: the first group is ordered by source path, later groups keep scan order
        tasks.sort_by(|a, b| {
            let (group_a, group_b) = (a.kind.plan_group(), b.kind.plan_group());
            if group_a == 0 && group_b == 0 {
                a.origin().cmp(&b.origin())
            } else {
                group_a.cmp(&group_b)
            }
        });

        for (id, task) in tasks.iter_mut().enumerate() {
            task.id = id;
        }
        let collisions = mark_collisions(&mut tasks);

        info!(
            tasks = tasks.len(),
            collisions = collisions.len(),
            "Conversion plan built"
        );
        ConversionPlan { tasks, collisions }
    }

    fn file_task(&self, file: &ClassifiedFile) -> ConversionTask {
        let (kind, priority) = match file.category {
            FileCategory::PageTemplate => (TaskKind::ConvertTemplate, TaskPriority::Medium),
            FileCategory::RequestHandler if !file.plain_handler => {
                (TaskKind::ConvertHandler, TaskPriority::High)
            }
            _ => (TaskKind::CopyVerbatim, TaskPriority::Low),
        };
        ConversionTask {
            id: 0,
            kind,
            source: Some(file.source.clone()),
            target_path: self.mapper.map_file(file),
            priority,
            collision: None,
        }
    }
}

/// Mark every task sharing a target path with the other claimants' origins
fn mark_collisions(tasks: &mut [ConversionTask]) -> Vec<Collision> {
    let mut by_target: BTreeMap<String, Vec<usize>> = BTreeMap::new();
    for (idx, task) in tasks.iter().enumerate() {
        by_target.entry(task.target_path.clone()).or_default().push(idx);
    }

    let mut collisions = Vec::new();
    for (target_path, indices) in by_target {
        if indices.len() < 2 {
            continue;
        }
        let claimants: Vec<String> = indices.iter().map(|&i| tasks[i].origin()).collect();
        warn!(target = %target_path, claimants = ?claimants, "Target path collision");
        for &i in &indices {
            let origin = tasks[i].origin();
            tasks[i].collision = Some(
                claimants
                    .iter()
                    .filter(|c| **c != origin)
                    .cloned()
                    .collect(),
            );
        }
        collisions.push(Collision {
            target_path,
            claimants,
        });
    }
    collisions
}
