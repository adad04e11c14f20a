//! External collaborators.
//!
//! The engine does not persist entries, walk the workspace, or render
//! diagnostics itself; the embedding application supplies those through
//! the traits in this module. In-memory reference implementations for
//! embedding and tests live in [`memory`]; the asynchronous diagnostic
//! queue lives in [`sink`].

pub mod memory;
pub mod sink;

use anyhow::Result;

use crate::core::{EntryPath, PathEntry, ProjectId};
use crate::resolver::ResolverService;
use crate::util::Diagnostic;

/// The external store owning each project's raw entry list.
///
/// Persistence format is the embedder's concern; the engine only needs
/// the logical records. Store-change notifications are delivered by the
/// embedder calling [`ResolverService::store_changed`].
pub trait EntryStore: Send + Sync {
    /// Read a project's raw entries.
    fn raw(&self, project: &ProjectId) -> Result<Vec<PathEntry>>;

    /// Replace a project's raw entries.
    fn set_raw(&self, project: &ProjectId, entries: Vec<PathEntry>) -> Result<()>;
}

/// Workspace knowledge the engine queries but does not own: path
/// existence, project state, and the consumer-visible element tree.
pub trait WorkspaceHost: Send + Sync {
    /// Whether a workspace path resolves to an accessible resource.
    fn is_accessible(&self, path: &EntryPath) -> bool;

    /// Whether an external-filesystem path exists.
    fn exists_externally(&self, path: &EntryPath) -> bool;

    /// Whether a project is open and of the expected type.
    fn is_open_project(&self, project: &ProjectId) -> bool;

    /// The consumer-visible element at a workspace path, used only to
    /// attach deltas to a concrete node. `None` attaches the delta to
    /// the project instead.
    fn element_at(&self, path: &EntryPath) -> Option<EntryPath> {
        if self.is_accessible(path) {
            Some(path.clone())
        } else {
            None
        }
    }
}

/// Receiver of project-scoped diagnostic batches.
///
/// Each batch replaces the previous one for that project. Sinks may do
/// slow I/O; the engine publishes through [`sink::DiagnosticQueue`] so a
/// slow sink never blocks a resolving caller.
pub trait DiagnosticSink: Send + Sync {
    fn replace_batch(&self, project: &ProjectId, batch: Vec<Diagnostic>);
}

/// A registered container provider.
///
/// `initialize` is expected to construct a [`crate::core::Container`]
/// and hand it to [`ResolverService::set_container`] for the requested
/// slot. It is invoked at most once per initialization cycle of a
/// `(project, container path)` slot and may re-enter the resolver.
pub trait ContainerInitializer: Send + Sync {
    fn initialize(
        &self,
        container_path: &EntryPath,
        project: &ProjectId,
        service: &ResolverService,
    ) -> Result<()>;
}
