//! Change deltas between resolved snapshots.
//!
//! Deltas keep downstream invalidation proportional to the actual
//! configuration change rather than to list size: each delta carries the
//! smallest set of flags describing what happened at one target.

use bitflags::bitflags;

use crate::core::entry::EntryKind;
use crate::core::path::EntryPath;
use crate::core::project::ProjectId;

bitflags! {
    /// What changed, classified by entry kind.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct DeltaFlags: u16 {
        const SOURCE_ADDED = 1 << 0;
        const SOURCE_REMOVED = 1 << 1;
        const LIBRARY_ADDED = 1 << 2;
        const LIBRARY_REMOVED = 1 << 3;
        const PROJECT_REF_CHANGED = 1 << 4;
        const INCLUDE_CHANGED = 1 << 5;
        const MACRO_CHANGED = 1 << 6;
        const REORDERED = 1 << 7;
    }
}

impl DeltaFlags {
    /// The flag describing an added or removed entry of `kind`, if the
    /// kind participates in delta classification. `Output` and
    /// `Container` changes carry no flag of their own; they surface, if
    /// at all, through the conservative reorder delta.
    pub fn for_kind(kind: EntryKind, added: bool) -> Option<DeltaFlags> {
        match kind {
            EntryKind::Source => Some(if added {
                DeltaFlags::SOURCE_ADDED
            } else {
                DeltaFlags::SOURCE_REMOVED
            }),
            EntryKind::Library => Some(if added {
                DeltaFlags::LIBRARY_ADDED
            } else {
                DeltaFlags::LIBRARY_REMOVED
            }),
            EntryKind::Project => Some(DeltaFlags::PROJECT_REF_CHANGED),
            EntryKind::Include | EntryKind::IncludeFile => Some(DeltaFlags::INCLUDE_CHANGED),
            EntryKind::Macro | EntryKind::MacroFile => Some(DeltaFlags::MACRO_CHANGED),
            EntryKind::Output | EntryKind::Container => None,
        }
    }
}

/// What a delta is attached to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeltaTarget {
    /// The project itself, for kinds with no filesystem location or when
    /// no consumer-visible element exists at the entry's path.
    Project,
    /// The consumer-visible element at a workspace path.
    Element(EntryPath),
}

/// A minimal classified description of one configuration change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delta {
    pub project: ProjectId,
    pub target: DeltaTarget,
    pub flags: DeltaFlags,
}

impl Delta {
    pub fn for_project(project: ProjectId, flags: DeltaFlags) -> Self {
        Delta {
            project,
            target: DeltaTarget::Project,
            flags,
        }
    }

    pub fn for_element(project: ProjectId, path: EntryPath, flags: DeltaFlags) -> Self {
        Delta {
            project,
            target: DeltaTarget::Element(path),
            flags,
        }
    }

    pub fn is_reorder(&self) -> bool {
        self.flags.contains(DeltaFlags::REORDERED)
    }
}
