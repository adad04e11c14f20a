//! Per-file entry lookups with specificity ordering.
//!
//! Answers "which entries of these kinds are effective for this
//! translation unit": the project's cached resolved entries plus live
//! on-demand container results, ordered so that entries attached to the
//! file or its closest directories come before entries attached to
//! shallower ancestors, followed by the exported entries of referenced
//! projects, which are always least specific. Macro entries are then
//! collapsed by name, nearer scope shadowing outer scope.

use std::collections::{HashMap, HashSet, VecDeque};

use petgraph::graph::{DiGraph, NodeIndex};

use crate::core::{EntryKind, EntryPath, KindMask, PathEntry, ProjectId};
use crate::resolver::errors::ResolverError;
use crate::resolver::ResolverService;

/// Entries of the selected kinds effective for one translation unit.
pub(crate) fn entries_for(
    service: &ResolverService,
    project: &ProjectId,
    unit_path: &EntryPath,
    mask: KindMask,
) -> Result<Vec<PathEntry>, ResolverError> {
    let resolution = service.resolve(project)?;

    // Cached entries plus live on-demand container results; both take
    // part in the specificity ordering.
    let mut candidates: Vec<PathEntry> = resolution
        .entries
        .iter()
        .filter(|e| mask.selects(e.kind()))
        .cloned()
        .collect();
    for container in service.on_demand_containers(project) {
        candidates.extend(container.entries_for(unit_path, mask));
    }

    let mut ordered = order_by_specificity(unit_path, candidates);
    ordered.extend(exported_closure(service, project, mask));

    Ok(collapse_macros(ordered))
}

/// Order candidates by walking from the unit path up to the workspace
/// root, appending the entries attached exactly to each ancestor, in
/// candidate order within one level. Entries attached elsewhere do not
/// apply to this file and are dropped.
fn order_by_specificity(unit_path: &EntryPath, candidates: Vec<PathEntry>) -> Vec<PathEntry> {
    let n = unit_path.segment_count();
    let mut ordered = Vec::with_capacity(candidates.len());
    let mut used = vec![false; candidates.len()];

    for i in 0..=n {
        let ancestor = unit_path.truncate(n - i);
        for (idx, entry) in candidates.iter().enumerate() {
            if !used[idx] && entry.path == ancestor {
                used[idx] = true;
                ordered.push(entry.clone());
            }
        }
    }

    ordered
}

/// Matching-kind exported entries of every directly or transitively
/// referenced project, in reference-discovery order and each project's
/// own raw order.
///
/// Project references form a directed graph that may contain cycles; the
/// closure is built with a node map as visited-set guard so a cycle
/// contributes each project once and terminates.
fn exported_closure(
    service: &ResolverService,
    root: &ProjectId,
    mask: KindMask,
) -> Vec<PathEntry> {
    let mut graph: DiGraph<ProjectId, ()> = DiGraph::new();
    let mut nodes: HashMap<ProjectId, NodeIndex> = HashMap::new();
    let mut queue: VecDeque<ProjectId> = VecDeque::new();

    nodes.insert(*root, graph.add_node(*root));
    queue.push_back(*root);

    while let Some(current) = queue.pop_front() {
        let resolution = match service.resolve(&current) {
            Ok(resolution) => resolution,
            Err(e) => {
                // A broken referenced project contributes nothing; the
                // query for the root must still succeed.
                tracing::debug!("skipping referenced project `{}`: {}", current, e);
                continue;
            }
        };

        let current_node = nodes[&current];
        for entry in &resolution.entries {
            if entry.kind() != EntryKind::Project {
                continue;
            }
            let Some(referenced) = ProjectId::of_path(&entry.path) else {
                continue;
            };
            let node = *nodes.entry(referenced).or_insert_with(|| {
                queue.push_back(referenced);
                graph.add_node(referenced)
            });
            if !graph.contains_edge(current_node, node) {
                graph.add_edge(current_node, node, ());
            }
        }
    }

    // Node indices are assigned in discovery order, which is exactly the
    // breadth-first reference order with raw order within one project.
    let mut contributed = Vec::new();
    for node in graph.node_indices().skip(1) {
        let referenced = graph[node];
        let Ok(resolution) = service.resolve(&referenced) else {
            continue;
        };
        contributed.extend(
            resolution
                .entries
                .iter()
                .filter(|e| {
                    e.exported && e.kind() != EntryKind::Project && mask.selects(e.kind())
                })
                .cloned(),
        );
    }
    contributed
}

/// Collapse `Macro` entries by name: the first entry in the ordering
/// wins, later (less specific) definitions of the same name are dropped.
fn collapse_macros(ordered: Vec<PathEntry>) -> Vec<PathEntry> {
    let mut seen: HashSet<String> = HashSet::new();
    ordered
        .into_iter()
        .filter(|entry| match entry.macro_name() {
            Some(name) => seen.insert(name.to_string()),
            None => true,
        })
        .collect()
}
