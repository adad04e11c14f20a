//! Structural validation of resolved entry lists.
//!
//! Validation never fails a resolution: every problem becomes a
//! diagnostic, offending duplicates are dropped, and the caller always
//! gets a usable (possibly smaller) list. Duplicate elimination keeps
//! the first occurrence in raw order, uniformly across all checks.

use std::collections::HashSet;

use crate::core::{EntryKind, EntryPath, PathEntry, ProjectId};
use crate::resolver::ResolverService;
use crate::util::diagnostic::{suggestions, Diagnostic};
use crate::util::patterns;

/// Outcome of validating one entry list: a keep-mask parallel to the
/// input plus the collected diagnostics.
pub(crate) struct ValidationReport {
    pub keep: Vec<bool>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ValidationReport {
    /// The surviving entries, in order.
    pub fn apply(&self, entries: &[PathEntry]) -> Vec<PathEntry> {
        entries
            .iter()
            .zip(&self.keep)
            .filter(|(_, keep)| **keep)
            .map(|(e, _)| e.clone())
            .collect()
    }
}

/// Run all structural checks over an entry list.
pub(crate) fn validate(
    service: &ResolverService,
    project: &ProjectId,
    entries: &[PathEntry],
    recurse_in_containers: bool,
) -> ValidationReport {
    let mut keep = vec![true; entries.len()];
    let mut diagnostics = Vec::new();

    check_exact_duplicates(entries, &mut keep, &mut diagnostics);
    check_path_duplicates(EntryKind::Source, entries, &mut keep, &mut diagnostics);
    check_path_duplicates(EntryKind::Output, entries, &mut keep, &mut diagnostics);
    check_nested_sources(entries, &keep, &mut diagnostics);

    if service.config().validation.check_existence {
        for (i, entry) in entries.iter().enumerate() {
            if !keep[i] {
                continue;
            }
            check_accessibility(service, project, entry, recurse_in_containers, &mut diagnostics);
        }
    }

    ValidationReport { keep, diagnostics }
}

/// Check (1): structurally equal entries. First occurrence wins.
fn check_exact_duplicates(
    entries: &[PathEntry],
    keep: &mut [bool],
    diagnostics: &mut Vec<Diagnostic>,
) {
    for i in 0..entries.len() {
        if !keep[i] {
            continue;
        }
        let duplicate = entries[..i]
            .iter()
            .enumerate()
            .any(|(j, earlier)| keep[j] && *earlier == entries[i]);
        if duplicate {
            keep[i] = false;
            diagnostics.push(
                Diagnostic::warning(format!("duplicate {}", entries[i]))
                    .with_location(entries[i].path.to_string())
                    .with_suggestion(suggestions::REMOVE_DUPLICATE),
            );
        }
    }
}

/// Checks (2) and (3): duplicate Source/Output entries by path.
fn check_path_duplicates(
    kind: EntryKind,
    entries: &[PathEntry],
    keep: &mut [bool],
    diagnostics: &mut Vec<Diagnostic>,
) {
    let mut seen: HashSet<&EntryPath> = HashSet::new();
    for (i, entry) in entries.iter().enumerate() {
        if !keep[i] || entry.kind() != kind {
            continue;
        }
        if !seen.insert(&entry.path) {
            keep[i] = false;
            diagnostics.push(
                Diagnostic::warning(format!("duplicate {} entry at `{}`", kind, entry.path))
                    .with_location(entry.path.to_string())
                    .with_suggestion(suggestions::REMOVE_DUPLICATE),
            );
        }
    }
}

/// Check (4): a source entry nested inside another source entry must be
/// carved out by the outer entry's exclusion patterns. The nested entry
/// is kept either way; rejecting it is the caller's decision.
fn check_nested_sources(entries: &[PathEntry], keep: &[bool], diagnostics: &mut Vec<Diagnostic>) {
    let sources: Vec<&PathEntry> = entries
        .iter()
        .zip(keep)
        .filter(|(e, k)| **k && e.kind() == EntryKind::Source)
        .map(|(e, _)| e)
        .collect();

    for outer in &sources {
        let compiled = patterns::compile(&outer.exclusions);
        for inner in &sources {
            if !outer.path.is_strict_prefix_of(&inner.path) {
                continue;
            }
            let relative = inner
                .path
                .relative_to(&outer.path)
                .unwrap_or_default();
            if !patterns::is_excluded(&compiled, &relative) {
                diagnostics.push(
                    Diagnostic::error(format!(
                        "source entry `{}` is nested inside `{}`",
                        inner.path, outer.path
                    ))
                    .with_location(inner.path.to_string())
                    .with_suggestion(suggestions::EXCLUDE_NESTED),
                );
            }
        }
    }
}

/// Check (5): per-entry existence and accessibility.
fn check_accessibility(
    service: &ResolverService,
    project: &ProjectId,
    entry: &PathEntry,
    recurse_in_containers: bool,
    diagnostics: &mut Vec<Diagnostic>,
) {
    match entry.kind() {
        EntryKind::Include | EntryKind::IncludeFile | EntryKind::Library | EntryKind::MacroFile => {
            if let Some(target) = entry.target_path() {
                // Raw entries handed to the public validation API may
                // still carry unanchored targets; only concrete paths
                // can be checked.
                if !target.is_relative() && !target_accessible(service, target) {
                    diagnostics.push(
                        Diagnostic::warning(format!("`{}` is not accessible", target))
                            .with_location(target.to_string())
                            .with_context(format!("required by {}", entry))
                            .with_suggestion(suggestions::CHECK_PATH),
                    );
                }
            }
        }

        EntryKind::Project => {
            let referenced = ProjectId::of_path(&entry.path);
            let open = referenced
                .map(|p| service.host().is_open_project(&p))
                .unwrap_or(false);
            if !open {
                diagnostics.push(
                    Diagnostic::warning(format!(
                        "referenced project `{}` is not open",
                        entry.path
                    ))
                    .with_location(entry.path.to_string())
                    .with_suggestion(suggestions::OPEN_PROJECT),
                );
            }
        }

        EntryKind::Container if recurse_in_containers => {
            let (container, _) = service.container_with_status(project, &entry.path);
            // One level deep only: contained entries are checked for
            // accessibility but their own containers are not entered.
            for contained in container.entries() {
                check_accessibility(service, project, &contained, false, diagnostics);
            }
        }

        _ => {}
    }
}

fn target_accessible(service: &ResolverService, target: &EntryPath) -> bool {
    if target.is_external() {
        service.host().exists_externally(target)
    } else {
        service.host().is_accessible(target)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::host::memory::{MemoryHost, MemorySink, MemoryStore};
    use crate::resolver::ResolverBuilder;
    use crate::util::ResolverConfig;

    fn lenient_service() -> ResolverService {
        let mut config = ResolverConfig::default();
        config.validation.check_existence = false;
        ResolverBuilder::new(Arc::new(MemoryStore::new()), Arc::new(MemoryHost::new()))
            .sink(Arc::new(MemorySink::new()))
            .config(config)
            .build()
    }

    fn checked_service(host: MemoryHost) -> ResolverService {
        ResolverBuilder::new(Arc::new(MemoryStore::new()), Arc::new(host))
            .sink(Arc::new(MemorySink::new()))
            .build()
    }

    #[test]
    fn exact_duplicate_dropped_once_diagnosed_once() {
        let service = lenient_service();
        let proj = ProjectId::new("app");
        let entry = PathEntry::source(EntryPath::parse("/app/src"));
        let entries = vec![entry.clone(), entry.clone()];

        let report = validate(&service, &proj, &entries, false);
        let cleaned = report.apply(&entries);

        assert_eq!(cleaned.len(), 1);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("duplicate"));
    }

    #[test]
    fn duplicate_source_path_keeps_first_occurrence() {
        let service = lenient_service();
        let proj = ProjectId::new("app");
        let first = PathEntry::source(EntryPath::parse("/app/src")).with_exclusions(["gen/*"]);
        let second = PathEntry::source(EntryPath::parse("/app/src"));

        let entries = vec![first.clone(), second];
        let report = validate(&service, &proj, &entries, false);
        let cleaned = report.apply(&entries);

        assert_eq!(cleaned, vec![first]);
        assert_eq!(report.diagnostics.len(), 1);
    }

    #[test]
    fn nested_source_needs_exclusion() {
        let service = lenient_service();
        let proj = ProjectId::new("app");

        let entries = vec![
            PathEntry::source(EntryPath::parse("/app/src")).with_exclusions(["gen/*"]),
            PathEntry::source(EntryPath::parse("/app/src/gen")),
            PathEntry::source(EntryPath::parse("/app/src/other")),
        ];

        let report = validate(&service, &proj, &entries, false);

        // `gen` is excluded by the outer entry; `other` is not.
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0]
            .message
            .contains("/app/src/other"));
        // Nested entries are never dropped here.
        assert_eq!(report.apply(&entries).len(), 3);
    }

    #[test]
    fn inaccessible_include_target_is_diagnosed() {
        let host = MemoryHost::new().with_external_path(EntryPath::external("/usr/include"));
        let service = checked_service(host);
        let proj = ProjectId::new("app");

        let entries = vec![
            PathEntry::include(
                EntryPath::parse("/app"),
                EntryPath::external("/usr/include"),
                true,
            ),
            PathEntry::include(
                EntryPath::parse("/app"),
                EntryPath::external("/nonexistent"),
                true,
            ),
        ];

        let report = validate(&service, &proj, &entries, false);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("/nonexistent"));
        // Accessibility problems do not drop entries.
        assert_eq!(report.apply(&entries).len(), 2);
    }

    #[test]
    fn closed_project_reference_is_diagnosed() {
        let host = MemoryHost::new().with_open_project(ProjectId::new("lib"));
        let service = checked_service(host);
        let proj = ProjectId::new("app");

        let entries = vec![
            PathEntry::project_ref(EntryPath::parse("/lib")),
            PathEntry::project_ref(EntryPath::parse("/closed")),
        ];

        let report = validate(&service, &proj, &entries, false);
        assert_eq!(report.diagnostics.len(), 1);
        assert!(report.diagnostics[0].message.contains("/closed"));
    }
}
