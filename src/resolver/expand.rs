//! Entry expansion - anchoring, variable substitution, base references.
//!
//! Expansion turns one raw entry into its resolved form: registered
//! `${VAR}` path variables are substituted in every path-valued field,
//! project-relative paths are anchored under the project root, and a
//! base reference is replaced by the concrete base path of the entry it
//! points at. Expansion has no side effects and no cache of its own; it
//! is safe to run concurrently and repeatedly.

use std::collections::HashMap;

use crate::core::{BaseLocation, EntryDetail, EntryKind, EntryPath, PathEntry, ProjectId};
use crate::resolver::errors::ExpandError;
use crate::resolver::ResolverService;
use crate::util::vars;

/// Expand one raw entry for a project.
///
/// Fails only with [`ExpandError::UnresolvedReference`]; the caller
/// decides whether to drop the entry or propagate.
pub(crate) fn expand_entry(
    service: &ResolverService,
    project: &ProjectId,
    entry: &PathEntry,
) -> Result<PathEntry, ExpandError> {
    let variables = &service.config().variables;
    let mut expanded = entry.clone();

    expanded.path = substitute_path(&entry.path, variables);
    expanded.detail = substitute_detail(&entry.detail, variables);

    expanded.base = match &entry.base {
        BaseLocation::Unset => BaseLocation::Unset,
        BaseLocation::Path(base) => BaseLocation::Path(substitute_path(base, variables)),
        BaseLocation::Reference(reference) => {
            let reference = substitute_path(reference, variables);
            match locate_base(service, project, &expanded, &reference)? {
                Some(base) => BaseLocation::Path(base),
                None => BaseLocation::Unset,
            }
        }
    };

    fold_base(&mut expanded);
    anchor(&mut expanded, project);

    Ok(expanded)
}

/// Substitute variables in a rendered path and re-root the result.
///
/// A relative path whose substitution turns absolute is rooted on the
/// external filesystem: variables overwhelmingly point at SDK and
/// toolchain locations outside the workspace.
fn substitute_path(path: &EntryPath, variables: &HashMap<String, String>) -> EntryPath {
    let rendered = path.to_string();
    let substituted = vars::substitute(&rendered, variables);
    if substituted == rendered {
        return path.clone();
    }

    if path.is_external() || (path.is_relative() && substituted.starts_with('/')) {
        EntryPath::external(&substituted)
    } else {
        EntryPath::parse(&substituted)
    }
}

fn substitute_detail(detail: &EntryDetail, variables: &HashMap<String, String>) -> EntryDetail {
    match detail {
        EntryDetail::Library { file } => EntryDetail::Library {
            file: substitute_path(file, variables),
        },
        EntryDetail::Include { dir, system } => EntryDetail::Include {
            dir: substitute_path(dir, variables),
            system: *system,
        },
        EntryDetail::IncludeFile { file } => EntryDetail::IncludeFile {
            file: substitute_path(file, variables),
        },
        EntryDetail::MacroFile { file } => EntryDetail::MacroFile {
            file: substitute_path(file, variables),
        },
        other => other.clone(),
    }
}

/// Locate the entry a base reference points at and return its concrete
/// base path, or `None` when the located entry needs no base (its target
/// is already absolute).
///
/// A workspace reference whose first segment names an open project is
/// searched in that project's resolved entries; anything else is treated
/// as a container path of the referencing project.
fn locate_base(
    service: &ResolverService,
    project: &ProjectId,
    entry: &PathEntry,
    reference: &EntryPath,
) -> Result<Option<EntryPath>, ExpandError> {
    let target = match entry.target_path() {
        Some(target) => target.clone(),
        // Base references only make sense for entries with a
        // kind-specific target path.
        None => {
            return Err(ExpandError::UnresolvedReference {
                reference: reference.clone(),
            })
        }
    };

    let unresolved = || ExpandError::UnresolvedReference {
        reference: reference.clone(),
    };

    let candidates: Vec<PathEntry> = if let Some(other) = referenced_project(service, reference) {
        match service.resolve(&other) {
            Ok(resolution) => resolution.entries.clone(),
            Err(e) => {
                tracing::debug!("base reference into unreadable project `{}`: {}", other, e);
                return Err(unresolved());
            }
        }
    } else {
        let (container, _) = service.container_with_status(project, reference);
        container.entries()
    };

    let found = candidates
        .iter()
        .find(|c| c.kind() == entry.kind() && c.target_path() == Some(&target))
        .ok_or_else(unresolved)?;

    match &found.base {
        BaseLocation::Path(base) => Ok(Some(base.clone())),
        _ => Ok(None),
    }
}

fn referenced_project(service: &ResolverService, reference: &EntryPath) -> Option<ProjectId> {
    let project = ProjectId::of_path(reference)?;
    service.host().is_open_project(&project).then_some(project)
}

/// Fold a concrete base path into the kind-specific target, leaving the
/// resolved entry base-free.
fn fold_base(entry: &mut PathEntry) {
    let base = match std::mem::take(&mut entry.base) {
        BaseLocation::Path(base) => base,
        other => {
            entry.base = other;
            return;
        }
    };

    let folded = |target: &EntryPath| {
        if target.is_relative() {
            base.join_path(target)
        } else {
            target.clone()
        }
    };

    entry.detail = match &entry.detail {
        EntryDetail::Library { file } => EntryDetail::Library { file: folded(file) },
        EntryDetail::Include { dir, system } => EntryDetail::Include {
            dir: folded(dir),
            system: *system,
        },
        EntryDetail::IncludeFile { file } => EntryDetail::IncludeFile { file: folded(file) },
        EntryDetail::MacroFile { file } => EntryDetail::MacroFile { file: folded(file) },
        other => other.clone(),
    };
}

/// Anchor remaining relative paths under the project root.
///
/// Container paths are provider identifiers, not resource locations, and
/// stay untouched; a relative project reference is re-rooted as a
/// workspace path since it names a project, not a folder.
fn anchor(entry: &mut PathEntry, project: &ProjectId) {
    match entry.kind() {
        EntryKind::Container => {}
        EntryKind::Project => {
            if entry.path.is_relative() {
                entry.path = EntryPath::workspace(entry.path.segments().to_vec());
            }
        }
        _ => {
            let root = project.root();
            entry.path = entry.path.anchor(&root);
            entry.detail = match &entry.detail {
                EntryDetail::Library { file } => EntryDetail::Library {
                    file: file.anchor(&root),
                },
                EntryDetail::Include { dir, system } => EntryDetail::Include {
                    dir: dir.anchor(&root),
                    system: *system,
                },
                EntryDetail::IncludeFile { file } => EntryDetail::IncludeFile {
                    file: file.anchor(&root),
                },
                EntryDetail::MacroFile { file } => EntryDetail::MacroFile {
                    file: file.anchor(&root),
                },
                other => other.clone(),
            };
        }
    }
}
