//! Container registry - lazy, at-most-once container initialization.
//!
//! Maps `(project, container path)` slots to live containers. A slot is
//! absent (empty), initializing, or ready. The registered initializer
//! for a slot runs outside the registry lock, at most once per
//! initialization cycle; concurrent callers for the same slot wait on
//! the slot's condition variable, and a caller that re-enters the
//! registry from inside its own initializer gets the designated empty
//! container instead of deadlocking.

use std::collections::HashMap;
use std::sync::Arc;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

use crate::core::{Container, EmptyContainer, EntryPath, ProjectId};
use crate::host::ContainerInitializer;
use crate::resolver::errors::ResolverError;
use crate::resolver::ResolverService;

type SlotKey = (ProjectId, EntryPath);

enum Slot {
    /// An initializer is running on `owner`; waiters park on `cond`.
    Initializing { owner: ThreadId, cond: Arc<Condvar> },
    Ready(Arc<dyn Container>),
}

/// Process-wide table of live containers, owned by the service.
pub(crate) struct ContainerRegistry {
    slots: Mutex<HashMap<SlotKey, Slot>>,
    initializers: HashMap<String, Arc<dyn ContainerInitializer>>,
}

impl ContainerRegistry {
    pub(crate) fn new(initializers: HashMap<String, Arc<dyn ContainerInitializer>>) -> Self {
        ContainerRegistry {
            slots: Mutex::new(HashMap::new()),
            initializers,
        }
    }

    /// Get the container for a slot, initializing it if needed.
    ///
    /// Never fails: a missing provider, a failed initializer, or a
    /// reentrant lookup all yield the designated empty container. The
    /// second return value reports an initializer failure so a resolve
    /// pass can record it in its diagnostic batch.
    pub(crate) fn get(
        &self,
        service: &ResolverService,
        project: &ProjectId,
        path: &EntryPath,
    ) -> (Arc<dyn Container>, Option<ResolverError>) {
        let key = (*project, path.clone());

        loop {
            let mut slots = self.slots.lock();
            match slots.get(&key) {
                Some(Slot::Ready(container)) => return (container.clone(), None),

                Some(Slot::Initializing { owner, cond }) => {
                    if *owner == thread::current().id() {
                        // This thread is inside the initializer for this
                        // very slot: break the cycle with an empty result.
                        tracing::debug!(
                            "reentrant container lookup for `{}` in `{}`",
                            path,
                            project
                        );
                        return (Arc::new(EmptyContainer::new(path.clone())), None);
                    }
                    let cond = cond.clone();
                    cond.wait(&mut slots);
                    // Slot transitioned; retry the whole lookup.
                }

                None => {
                    let cond = Arc::new(Condvar::new());
                    slots.insert(
                        key.clone(),
                        Slot::Initializing {
                            owner: thread::current().id(),
                            cond: cond.clone(),
                        },
                    );
                    drop(slots);

                    // The initializer may block, do I/O, or re-enter the
                    // resolver; it must run without the registry lock.
                    let failure = self.run_initializer(service, project, path);

                    let mut slots = self.slots.lock();
                    let result = match slots.get(&key) {
                        // The initializer registered a container for the
                        // slot through `set`.
                        Some(Slot::Ready(container)) => container.clone(),
                        // No registration: back to empty so a later call
                        // can retry a fixed provider.
                        _ => {
                            slots.remove(&key);
                            Arc::new(EmptyContainer::new(path.clone())) as Arc<dyn Container>
                        }
                    };
                    drop(slots);
                    cond.notify_all();
                    return (result, failure);
                }
            }
        }
    }

    fn run_initializer(
        &self,
        service: &ResolverService,
        project: &ProjectId,
        path: &EntryPath,
    ) -> Option<ResolverError> {
        let provider_id = match path.first_segment() {
            Some(id) => id.to_string(),
            None => {
                tracing::warn!("container path without provider identifier in `{}`", project);
                return None;
            }
        };

        let initializer = match self.initializers.get(&provider_id) {
            Some(init) => init.clone(),
            None => {
                tracing::debug!("no container provider registered for `{}`", provider_id);
                return None;
            }
        };

        tracing::debug!("initializing container `{}` for `{}`", path, project);
        match initializer.initialize(path, project, service) {
            Ok(()) => None,
            Err(e) => {
                let err = ResolverError::Provider {
                    provider: provider_id,
                    path: path.clone(),
                    source: e,
                };
                tracing::error!("{}", err);
                Some(err)
            }
        }
    }

    /// Bind a container to its slot, waking any waiters.
    pub(crate) fn set(&self, project: &ProjectId, container: Arc<dyn Container>) {
        let key = (*project, container.path().clone());
        let mut slots = self.slots.lock();
        let previous = slots.insert(key, Slot::Ready(container));
        drop(slots);
        if let Some(Slot::Initializing { cond, .. }) = previous {
            cond.notify_all();
        }
    }

    /// Ready containers of a project, in container-path order so queries
    /// over them are deterministic.
    pub(crate) fn containers_for(&self, project: &ProjectId) -> Vec<Arc<dyn Container>> {
        let slots = self.slots.lock();
        let mut containers: Vec<(EntryPath, Arc<dyn Container>)> = slots
            .iter()
            .filter_map(|((proj, path), slot)| match slot {
                Slot::Ready(container) if proj == project => {
                    Some((path.clone(), container.clone()))
                }
                _ => None,
            })
            .collect();
        containers.sort_by(|(a, _), (b, _)| a.cmp(b));
        containers.into_iter().map(|(_, c)| c).collect()
    }

    /// Drop every slot of a project (store change, project closure).
    pub(crate) fn remove_project(&self, project: &ProjectId) {
        let mut slots = self.slots.lock();
        let keys: Vec<SlotKey> = slots
            .keys()
            .filter(|(proj, _)| proj == project)
            .cloned()
            .collect();
        for key in keys {
            if let Some(Slot::Initializing { cond, .. }) = slots.remove(&key) {
                // Waiters retry and find the slot empty.
                cond.notify_all();
            }
        }
    }
}
