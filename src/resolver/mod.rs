//! Build-path resolution.
//!
//! This module implements the resolution engine: expansion of raw
//! entries, lazy container initialization, the race-tolerant snapshot
//! cache, per-file ordered lookups, validation, and delta
//! classification. All state lives in an explicitly constructed
//! [`ResolverService`]; there is no ambient global registry.

pub mod cache;
pub mod errors;

mod containers;
mod delta;
mod expand;
mod lookup;
mod validate;

pub use cache::Resolution;
pub use errors::{ExpandError, ResolverError};

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{
    Container, Delta, EntryKind, EntryPath, KindMask, PathEntry, ProjectId, ResolveInfo,
};
use crate::host::sink::{DiagnosticQueue, LogSink};
use crate::host::{ContainerInitializer, DiagnosticSink, EntryStore, WorkspaceHost};
use crate::resolver::containers::ContainerRegistry;
use crate::resolver::cache::ResolutionCache;
use crate::util::{Diagnostic, ResolverConfig};

/// Builder for [`ResolverService`].
///
/// Container initializers are registered here, once, by the embedding
/// application; the service never discovers providers dynamically.
pub struct ResolverBuilder {
    store: Arc<dyn EntryStore>,
    host: Arc<dyn WorkspaceHost>,
    sink: Option<Arc<dyn DiagnosticSink>>,
    config: ResolverConfig,
    initializers: HashMap<String, Arc<dyn ContainerInitializer>>,
}

impl ResolverBuilder {
    pub fn new(store: Arc<dyn EntryStore>, host: Arc<dyn WorkspaceHost>) -> Self {
        ResolverBuilder {
            store,
            host,
            sink: None,
            config: ResolverConfig::default(),
            initializers: HashMap::new(),
        }
    }

    /// Use the given diagnostic sink instead of logging batches.
    pub fn sink(mut self, sink: Arc<dyn DiagnosticSink>) -> Self {
        self.sink = Some(sink);
        self
    }

    pub fn config(mut self, config: ResolverConfig) -> Self {
        self.config = config;
        self
    }

    /// Register a container initializer under its provider identifier.
    pub fn initializer(
        mut self,
        provider_id: impl Into<String>,
        initializer: Arc<dyn ContainerInitializer>,
    ) -> Self {
        self.initializers.insert(provider_id.into(), initializer);
        self
    }

    pub fn build(self) -> ResolverService {
        let sink = self.sink.unwrap_or_else(|| Arc::new(LogSink));
        ResolverService {
            store: self.store,
            host: self.host,
            diagnostics: DiagnosticQueue::new(sink),
            containers: ContainerRegistry::new(self.initializers),
            cache: ResolutionCache::new(),
            config: self.config,
        }
    }
}

/// The resolution engine.
///
/// One instance owns all guarded state (container slots, snapshots,
/// epochs) and is shared by reference between the embedder's threads;
/// every operation is safe under concurrent access.
pub struct ResolverService {
    store: Arc<dyn EntryStore>,
    host: Arc<dyn WorkspaceHost>,
    diagnostics: DiagnosticQueue,
    containers: ContainerRegistry,
    cache: ResolutionCache,
    config: ResolverConfig,
}

impl ResolverService {
    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    pub(crate) fn host(&self) -> &dyn WorkspaceHost {
        self.host.as_ref()
    }

    /// A project's raw entries, straight from the store.
    pub fn raw_entries(&self, project: &ProjectId) -> Result<Vec<PathEntry>, ResolverError> {
        self.store
            .raw(project)
            .map_err(|e| ResolverError::StoreUnavailable {
                project: *project,
                source: e,
            })
    }

    /// The project's resolved configuration, computed on first use.
    ///
    /// Concurrent callers may compute redundantly; the epoch protocol
    /// decides which result is published, and every caller gets a usable
    /// snapshot either way.
    pub fn resolve(&self, project: &ProjectId) -> Result<Arc<Resolution>, ResolverError> {
        if let Some(snapshot) = self.cache.get(project) {
            return Ok(snapshot);
        }

        let epoch = self.cache.begin(project);
        let (resolution, diagnostics) = self.compute(project)?;
        let resolution = Arc::new(resolution);

        self.diagnostics.publish(*project, diagnostics);
        self.cache.commit(project, epoch, resolution.clone());
        Ok(resolution)
    }

    /// The flattened resolved entries of a project.
    pub fn resolved_entries(&self, project: &ProjectId) -> Result<Vec<PathEntry>, ResolverError> {
        Ok(self.resolve(project)?.entries.clone())
    }

    /// The resolve trace: which raw entry produced which resolved ones.
    pub fn trace(&self, project: &ProjectId) -> Result<Vec<ResolveInfo>, ResolverError> {
        Ok(self.resolve(project)?.trace.clone())
    }

    /// Replace a project's raw entries and classify the change against
    /// the previous resolved snapshot.
    pub fn set_raw_entries(
        &self,
        project: &ProjectId,
        entries: Vec<PathEntry>,
    ) -> Result<Vec<Delta>, ResolverError> {
        let old = self.cache.get(project).map(|s| s.entries.clone());

        self.store
            .set_raw(project, entries)
            .map_err(|e| ResolverError::StoreUnavailable {
                project: *project,
                source: e,
            })?;
        self.cache.invalidate(project);

        let new = self.resolve(project)?;
        Ok(delta::diff(self, project, old.as_deref(), &new.entries))
    }

    /// Entries of the selected kinds effective for one translation unit,
    /// in specificity order. Never returns a partial or null result; an
    /// empty list means no entries apply.
    pub fn entries_for(
        &self,
        project: &ProjectId,
        unit_path: &EntryPath,
        mask: KindMask,
    ) -> Result<Vec<PathEntry>, ResolverError> {
        lookup::entries_for(self, project, unit_path, mask)
    }

    /// Include directories effective for one translation unit.
    pub fn include_entries(
        &self,
        project: &ProjectId,
        unit_path: &EntryPath,
    ) -> Result<Vec<PathEntry>, ResolverError> {
        self.entries_for(project, unit_path, KindMask::INCLUDE)
    }

    /// Macro definitions effective for one translation unit, already
    /// collapsed by name.
    pub fn macro_entries(
        &self,
        project: &ProjectId,
        unit_path: &EntryPath,
    ) -> Result<Vec<PathEntry>, ResolverError> {
        self.entries_for(project, unit_path, KindMask::MACRO)
    }

    /// Force-included files effective for one translation unit.
    pub fn include_file_entries(
        &self,
        project: &ProjectId,
        unit_path: &EntryPath,
    ) -> Result<Vec<PathEntry>, ResolverError> {
        self.entries_for(project, unit_path, KindMask::INCLUDE_FILE)
    }

    /// Macro files effective for one translation unit.
    pub fn macro_file_entries(
        &self,
        project: &ProjectId,
        unit_path: &EntryPath,
    ) -> Result<Vec<PathEntry>, ResolverError> {
        self.entries_for(project, unit_path, KindMask::MACRO_FILE)
    }

    /// The container bound to `(project, container_path)`, initializing
    /// it through the registered provider if needed. Never fails; a
    /// missing or failing provider yields the designated empty
    /// container.
    pub fn container(&self, project: &ProjectId, container_path: &EntryPath) -> Arc<dyn Container> {
        // An initializer failure was already logged at the registry
        // boundary; during a resolve pass it also lands in that pass's
        // diagnostic batch.
        let (container, _) = self.containers.get(self, project, container_path);
        container
    }

    pub(crate) fn container_with_status(
        &self,
        project: &ProjectId,
        container_path: &EntryPath,
    ) -> (Arc<dyn Container>, Option<ResolverError>) {
        self.containers.get(self, project, container_path)
    }

    pub(crate) fn on_demand_containers(&self, project: &ProjectId) -> Vec<Arc<dyn Container>> {
        self.containers
            .containers_for(project)
            .into_iter()
            .filter(|c| c.on_demand())
            .collect()
    }

    /// Bind a container for several projects at once, re-resolving each
    /// and classifying the change. A project whose resolution fails is
    /// skipped; one broken project must not block the others.
    pub fn set_container(
        &self,
        projects: &[ProjectId],
        container: Arc<dyn Container>,
    ) -> Vec<Delta> {
        let mut deltas = Vec::new();
        for project in projects {
            let old = self.cache.get(project).map(|s| s.entries.clone());
            self.containers.set(project, container.clone());
            self.cache.invalidate(project);

            match self.resolve(project) {
                Ok(new) => {
                    deltas.extend(delta::diff(self, project, old.as_deref(), &new.entries))
                }
                Err(e) => {
                    tracing::warn!("container change could not re-resolve `{}`: {}", project, e)
                }
            }
        }
        deltas
    }

    /// Drop the cached resolution; the next query recomputes.
    pub fn invalidate(&self, project: &ProjectId) {
        self.cache.invalidate(project);
    }

    /// The raw-entry store changed: drop the snapshot and tear down the
    /// project's containers so providers re-initialize against the new
    /// configuration.
    pub fn store_changed(&self, project: &ProjectId) {
        self.cache.invalidate(project);
        self.containers.remove_project(project);
    }

    /// The project was closed: tear everything down and retract its
    /// diagnostics.
    pub fn project_closed(&self, project: &ProjectId) {
        self.cache.invalidate(project);
        self.containers.remove_project(project);
        self.diagnostics.publish(*project, Vec::new());
    }

    /// Pre-flight validation of an entry list without touching the
    /// cache. With `recurse_in_containers`, container entries are
    /// validated one level deep.
    pub fn validate_entries(
        &self,
        project: &ProjectId,
        entries: &[PathEntry],
        recurse_in_containers: bool,
    ) -> Vec<Diagnostic> {
        validate::validate(self, project, entries, recurse_in_containers).diagnostics
    }

    /// Wait until all diagnostics produced so far reached the sink.
    pub fn flush_diagnostics(&self) {
        self.diagnostics.flush();
    }

    /// One full resolution pass: expand every raw entry, flatten static
    /// containers, validate, and assemble the trace. Runs with no lock
    /// held; may block on container initialization.
    fn compute(
        &self,
        project: &ProjectId,
    ) -> Result<(Resolution, Vec<Diagnostic>), ResolverError> {
        let raw = self.raw_entries(project)?;
        tracing::debug!("resolving {} raw entries for `{}`", raw.len(), project);

        let mut diagnostics = Vec::new();
        let mut flat: Vec<PathEntry> = Vec::new();
        // Raw index that produced each flat entry, for the trace.
        let mut produced_by: Vec<usize> = Vec::new();

        for (raw_idx, raw_entry) in raw.iter().enumerate() {
            let expanded = match expand::expand_entry(self, project, raw_entry) {
                Ok(expanded) => expanded,
                Err(e) => {
                    diagnostics.push(e.to_diagnostic());
                    continue;
                }
            };

            if expanded.kind() != EntryKind::Container {
                flat.push(expanded);
                produced_by.push(raw_idx);
                continue;
            }

            let (container, failure) = self.containers.get(self, project, &expanded.path);
            if let Some(err) = failure {
                diagnostics.push(err.to_diagnostic());
            }
            if container.on_demand() {
                // Queried live by the lookup engine; contributes nothing
                // to the cached list.
                continue;
            }
            for contributed in container.entries() {
                if contributed.kind() == EntryKind::Container {
                    tracing::warn!(
                        "container `{}` contributed a nested container entry, ignored",
                        expanded.path
                    );
                    continue;
                }
                match expand::expand_entry(self, project, &contributed) {
                    Ok(contributed) => {
                        flat.push(contributed);
                        produced_by.push(raw_idx);
                    }
                    Err(e) => diagnostics.push(e.to_diagnostic()),
                }
            }
        }

        let report = validate::validate(self, project, &flat, false);
        diagnostics.extend(report.diagnostics);

        let mut entries = Vec::with_capacity(flat.len());
        let mut buckets: Vec<Vec<PathEntry>> = vec![Vec::new(); raw.len()];
        for (i, entry) in flat.into_iter().enumerate() {
            if report.keep[i] {
                buckets[produced_by[i]].push(entry.clone());
                entries.push(entry);
            }
        }
        let trace = raw
            .into_iter()
            .zip(buckets)
            .map(|(raw, resolved)| ResolveInfo { raw, resolved })
            .collect();

        Ok((Resolution { entries, trace }, diagnostics))
    }
}
