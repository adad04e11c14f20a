//! Containers - provider-supplied entry groups.
//!
//! A `Container`-kind path entry is an indirection: its concrete entries
//! are supplied by an externally registered provider. Static containers
//! enumerate a fixed list that the resolution pass flattens eagerly into
//! the cached result; on-demand containers answer per-file queries live
//! and are never flattened into a cached list.

use crate::core::entry::{KindMask, PathEntry};
use crate::core::path::EntryPath;

/// A group of path entries supplied by an external provider.
pub trait Container: Send + Sync {
    /// The container path this instance was registered for; its first
    /// segment is the provider identifier.
    fn path(&self) -> &EntryPath;

    /// Human-readable description for diagnostics.
    fn description(&self) -> String;

    /// The container's entries. On-demand containers may return an empty
    /// list here and answer only `entries_for`.
    fn entries(&self) -> Vec<PathEntry>;

    /// Whether the container must be queried per file instead of being
    /// flattened into the cached resolved list.
    fn on_demand(&self) -> bool {
        false
    }

    /// Entries of the selected kinds effective for one translation unit.
    fn entries_for(&self, path: &EntryPath, mask: KindMask) -> Vec<PathEntry> {
        let _ = path;
        self.entries()
            .into_iter()
            .filter(|e| mask.selects(e.kind()))
            .collect()
    }
}

/// A container with a fixed entry list, flattened eagerly at resolution.
pub struct StaticContainer {
    path: EntryPath,
    description: String,
    entries: Vec<PathEntry>,
}

impl StaticContainer {
    pub fn new(
        path: EntryPath,
        description: impl Into<String>,
        entries: Vec<PathEntry>,
    ) -> Self {
        StaticContainer {
            path,
            description: description.into(),
            entries,
        }
    }
}

impl Container for StaticContainer {
    fn path(&self) -> &EntryPath {
        &self.path
    }

    fn description(&self) -> String {
        self.description.clone()
    }

    fn entries(&self) -> Vec<PathEntry> {
        self.entries.clone()
    }
}

/// The designated empty container, returned when initialization failed,
/// no provider is registered, or a reentrant lookup must be broken.
pub struct EmptyContainer {
    path: EntryPath,
}

impl EmptyContainer {
    pub fn new(path: EntryPath) -> Self {
        EmptyContainer { path }
    }
}

impl Container for EmptyContainer {
    fn path(&self) -> &EntryPath {
        &self.path
    }

    fn description(&self) -> String {
        format!("empty container for `{}`", self.path)
    }

    fn entries(&self) -> Vec<PathEntry> {
        Vec::new()
    }
}
