//! In-memory reference implementations of the host traits.
//!
//! Suitable for embedding in tools that keep their path configuration in
//! memory, and used throughout the crate's own tests.

use std::collections::{HashMap, HashSet};

use anyhow::{bail, Result};
use parking_lot::{Mutex, RwLock};

use crate::core::{EntryPath, PathEntry, ProjectId};
use crate::host::{DiagnosticSink, EntryStore, WorkspaceHost};
use crate::util::Diagnostic;

/// An entry store backed by a map.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<ProjectId, Vec<PathEntry>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a project's raw entries.
    pub fn with_project(self, project: ProjectId, entries: Vec<PathEntry>) -> Self {
        self.entries.write().insert(project, entries);
        self
    }
}

impl EntryStore for MemoryStore {
    fn raw(&self, project: &ProjectId) -> Result<Vec<PathEntry>> {
        match self.entries.read().get(project) {
            Some(entries) => Ok(entries.clone()),
            None => bail!("no entries stored for project `{}`", project),
        }
    }

    fn set_raw(&self, project: &ProjectId, entries: Vec<PathEntry>) -> Result<()> {
        self.entries.write().insert(*project, entries);
        Ok(())
    }
}

/// A workspace host answering from explicit path and project sets.
#[derive(Default)]
pub struct MemoryHost {
    workspace_paths: RwLock<HashSet<EntryPath>>,
    external_paths: RwLock<HashSet<EntryPath>>,
    open_projects: RwLock<HashSet<ProjectId>>,
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark a workspace path (and all its ancestors) accessible.
    pub fn with_workspace_path(self, path: EntryPath) -> Self {
        {
            let mut paths = self.workspace_paths.write();
            let mut current = path;
            loop {
                paths.insert(current.clone());
                match current.parent() {
                    Some(parent) => current = parent,
                    None => break,
                }
            }
        }
        self
    }

    /// Mark an external path existing.
    pub fn with_external_path(self, path: EntryPath) -> Self {
        self.external_paths.write().insert(path);
        self
    }

    /// Mark a project open. Its root becomes accessible as well.
    pub fn with_open_project(self, project: ProjectId) -> Self {
        self.open_projects.write().insert(project);
        self.with_workspace_path(project.root())
    }
}

impl WorkspaceHost for MemoryHost {
    fn is_accessible(&self, path: &EntryPath) -> bool {
        self.workspace_paths.read().contains(path)
    }

    fn exists_externally(&self, path: &EntryPath) -> bool {
        self.external_paths.read().contains(path)
    }

    fn is_open_project(&self, project: &ProjectId) -> bool {
        self.open_projects.read().contains(project)
    }
}

/// A diagnostic sink collecting batches per project.
#[derive(Default)]
pub struct MemorySink {
    batches: Mutex<HashMap<ProjectId, Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// The last published batch for a project.
    pub fn batch(&self, project: &ProjectId) -> Vec<Diagnostic> {
        self.batches
            .lock()
            .get(project)
            .cloned()
            .unwrap_or_default()
    }
}

impl DiagnosticSink for MemorySink {
    fn replace_batch(&self, project: &ProjectId, batch: Vec<Diagnostic>) {
        self.batches.lock().insert(*project, batch);
    }
}
