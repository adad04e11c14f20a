//! Fairway - build-path resolution for C/C++ project models
//!
//! This crate turns a project's raw path entries (source roots, output
//! folders, include paths, macros, libraries, project references and
//! container indirections) into the flattened resolved entry set a
//! compiler-model consumer needs, with cached race-tolerant resolution,
//! pluggable container providers, specificity-ordered per-file lookups,
//! structural validation and change-delta classification.

pub mod core;
pub mod host;
pub mod resolver;
pub mod util;

pub use crate::core::{
    BaseLocation, Container, Delta, DeltaFlags, DeltaTarget, EmptyContainer, EntryDetail,
    EntryKind, EntryPath, KindMask, PathEntry, PathRoot, ProjectId, ResolveInfo, StaticContainer,
};

pub use crate::host::{ContainerInitializer, DiagnosticSink, EntryStore, WorkspaceHost};
pub use crate::resolver::{Resolution, ResolverBuilder, ResolverError, ResolverService};
pub use crate::util::{Diagnostic, ResolverConfig};
