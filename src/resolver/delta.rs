//! Delta classification between resolved snapshots.
//!
//! Compares a project's previous and next resolved lists and produces
//! the smallest set of change events that still tells consumers what to
//! invalidate: per-element added/removed deltas where an entry appeared
//! or vanished, and a single conservative reorder delta when only the
//! ordering (or a flagless kind) changed.

use crate::core::{Delta, DeltaFlags, EntryKind, PathEntry, ProjectId};
use crate::resolver::ResolverService;

/// Classify the difference between two resolved lists.
///
/// With no prior snapshot there is nothing to compare against and no
/// deltas are produced.
pub(crate) fn diff(
    service: &ResolverService,
    project: &ProjectId,
    old: Option<&[PathEntry]>,
    new: &[PathEntry],
) -> Vec<Delta> {
    let Some(old) = old else {
        return Vec::new();
    };

    let mut deltas = Vec::new();

    for entry in old {
        if !new.contains(entry) {
            if let Some(delta) = classify(service, project, entry, false) {
                deltas.push(delta);
            }
        }
    }
    for entry in new {
        if !old.contains(entry) {
            if let Some(delta) = classify(service, project, entry, true) {
                deltas.push(delta);
            }
        }
    }

    if deltas.is_empty() {
        let reordered = old.len() != new.len() || old.iter().zip(new).any(|(a, b)| a != b);
        if reordered {
            // One conservative event for the whole project; enumerating
            // positions would make invalidation proportional to list
            // size instead of to the change.
            deltas.push(Delta::for_project(*project, DeltaFlags::REORDERED));
        }
    }

    tracing::debug!("classified {} delta(s) for `{}`", deltas.len(), project);
    deltas
}

fn classify(
    service: &ResolverService,
    project: &ProjectId,
    entry: &PathEntry,
    added: bool,
) -> Option<Delta> {
    let flags = DeltaFlags::for_kind(entry.kind(), added)?;

    let delta = match entry.kind() {
        // No filesystem location to attach to.
        EntryKind::Library | EntryKind::Project => Delta::for_project(*project, flags),
        _ => match service.host().element_at(&entry.path) {
            Some(element) => Delta::for_element(*project, element, flags),
            None => Delta::for_project(*project, flags),
        },
    };
    Some(delta)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::core::{DeltaTarget, EntryPath};
    use crate::host::memory::{MemoryHost, MemorySink, MemoryStore};
    use crate::resolver::{ResolverBuilder, ResolverService};

    fn service() -> ResolverService {
        let host = MemoryHost::new()
            .with_open_project(ProjectId::new("app"))
            .with_workspace_path(EntryPath::parse("/app/src"));
        ResolverBuilder::new(Arc::new(MemoryStore::new()), Arc::new(host))
            .sink(Arc::new(MemorySink::new()))
            .build()
    }

    fn entries() -> (PathEntry, PathEntry, PathEntry) {
        (
            PathEntry::source(EntryPath::parse("/app/src")),
            PathEntry::include(
                EntryPath::parse("/app"),
                EntryPath::external("/usr/include"),
                true,
            ),
            PathEntry::library(EntryPath::parse("/app"), EntryPath::external("/usr/lib/libz.a")),
        )
    }

    #[test]
    fn no_prior_snapshot_means_no_deltas() {
        let service = service();
        let (a, _, _) = entries();
        assert!(diff(&service, &ProjectId::new("app"), None, &[a]).is_empty());
    }

    #[test]
    fn removal_yields_one_kind_tagged_delta() {
        let service = service();
        let proj = ProjectId::new("app");
        let (a, b, _) = entries();

        let deltas = diff(&service, &proj, Some(&[a.clone(), b]), &[a]);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].flags, DeltaFlags::INCLUDE_CHANGED);
    }

    #[test]
    fn library_delta_attaches_to_project() {
        let service = service();
        let proj = ProjectId::new("app");
        let (a, _, lib) = entries();

        let deltas = diff(&service, &proj, Some(&[a.clone()]), &[a, lib]);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].flags, DeltaFlags::LIBRARY_ADDED);
        assert_eq!(deltas[0].target, DeltaTarget::Project);
    }

    #[test]
    fn source_removal_attaches_to_element() {
        let service = service();
        let proj = ProjectId::new("app");
        let (a, b, _) = entries();

        let deltas = diff(&service, &proj, Some(&[a.clone(), b.clone()]), &[b]);
        assert_eq!(deltas.len(), 1);
        assert_eq!(deltas[0].flags, DeltaFlags::SOURCE_REMOVED);
        assert_eq!(
            deltas[0].target,
            DeltaTarget::Element(EntryPath::parse("/app/src"))
        );
    }

    #[test]
    fn pure_reorder_is_one_delta() {
        let service = service();
        let proj = ProjectId::new("app");
        let (a, b, c) = entries();

        let old = [a.clone(), b.clone(), c.clone()];
        let new = [a, c, b];
        let deltas = diff(&service, &proj, Some(&old), &new);

        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].is_reorder());
    }

    #[test]
    fn equal_lists_produce_nothing() {
        let service = service();
        let proj = ProjectId::new("app");
        let (a, b, _) = entries();

        let list = [a, b];
        assert!(diff(&service, &proj, Some(&list), &list).is_empty());
    }

    #[test]
    fn flagless_kind_difference_degrades_to_reorder() {
        let service = service();
        let proj = ProjectId::new("app");
        let (a, _, _) = entries();
        let out = PathEntry::output(EntryPath::parse("/app/build"));

        let deltas = diff(&service, &proj, Some(&[a.clone(), out]), &[a]);
        assert_eq!(deltas.len(), 1);
        assert!(deltas[0].is_reorder());
    }
}
