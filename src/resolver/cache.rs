//! Resolution cache - published snapshots and the single-flight protocol.
//!
//! A project's resolved configuration is an immutable snapshot replaced
//! wholesale; readers hold an `Arc` and are never affected by later
//! recomputation. Commits are guarded by a per-project epoch: a
//! computation captures the epoch before it starts and its result is
//! published only if no invalidation bumped the epoch meanwhile.
//! Concurrent computations for the same project may run redundantly, but
//! a reader is never blocked behind one.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::core::{PathEntry, ProjectId, ResolveInfo};

/// One project's resolved configuration.
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    /// The flattened resolved entries, in raw order. Never contains a
    /// `Container`-kind entry.
    pub entries: Vec<PathEntry>,

    /// Which raw entry produced which resolved entries, in raw order.
    pub trace: Vec<ResolveInfo>,
}

/// Per-project snapshot table plus the epoch table backing the
/// single-flight commit protocol. Structural operations only; the
/// (possibly slow) computation itself runs elsewhere, with no lock held.
pub(crate) struct ResolutionCache {
    snapshots: RwLock<HashMap<ProjectId, Arc<Resolution>>>,
    epochs: Mutex<HashMap<ProjectId, u64>>,
}

impl ResolutionCache {
    pub(crate) fn new() -> Self {
        ResolutionCache {
            snapshots: RwLock::new(HashMap::new()),
            epochs: Mutex::new(HashMap::new()),
        }
    }

    /// The published snapshot, if any.
    pub(crate) fn get(&self, project: &ProjectId) -> Option<Arc<Resolution>> {
        self.snapshots.read().get(project).cloned()
    }

    /// Capture the current epoch before starting a computation.
    pub(crate) fn begin(&self, project: &ProjectId) -> u64 {
        *self.epochs.lock().entry(*project).or_insert(0)
    }

    /// Publish a computed snapshot if the captured epoch still stands.
    ///
    /// Returns false when a concurrent invalidation (or a newer cycle)
    /// supplanted the computation; the result is then discarded silently.
    pub(crate) fn commit(
        &self,
        project: &ProjectId,
        epoch: u64,
        resolution: Arc<Resolution>,
    ) -> bool {
        let epochs = self.epochs.lock();
        if epochs.get(project).copied().unwrap_or(0) != epoch {
            tracing::debug!("discarding stale resolution for `{}`", project);
            return false;
        }
        // Publish while still holding the epoch lock so an invalidation
        // cannot interleave between the check and the write.
        self.snapshots.write().insert(*project, resolution);
        true
    }

    /// Drop the snapshot and open a new epoch. Also serves project
    /// closure: the epoch entry survives so a computation that started
    /// before the closure can never commit into a later cycle.
    pub(crate) fn invalidate(&self, project: &ProjectId) {
        {
            let mut epochs = self.epochs.lock();
            *epochs.entry(*project).or_insert(0) += 1;
        }
        self.snapshots.write().remove(project);
        tracing::debug!("invalidated resolved entries for `{}`", project);
    }
}
