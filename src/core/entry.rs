//! Path entries - the raw and resolved configuration records.
//!
//! A `PathEntry` is one record of a project's build-path configuration:
//! a source root, an output folder, an include directory, a macro
//! definition, a library, a reference to another project, or an
//! indirection to a provider-supplied container. The same shape serves
//! raw (as stored) and resolved (expanded, anchored) entries; a resolved
//! list never contains a `Container` entry.

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

use crate::core::path::EntryPath;

/// The kind of a path entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryKind {
    Source,
    Output,
    Library,
    Project,
    Include,
    IncludeFile,
    Macro,
    MacroFile,
    Container,
}

impl std::fmt::Display for EntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            EntryKind::Source => "source",
            EntryKind::Output => "output",
            EntryKind::Library => "library",
            EntryKind::Project => "project",
            EntryKind::Include => "include",
            EntryKind::IncludeFile => "include-file",
            EntryKind::Macro => "macro",
            EntryKind::MacroFile => "macro-file",
            EntryKind::Container => "container",
        };
        write!(f, "{}", name)
    }
}

bitflags! {
    /// A set of entry kinds, used to filter queries.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct KindMask: u16 {
        const SOURCE = 1 << 0;
        const OUTPUT = 1 << 1;
        const LIBRARY = 1 << 2;
        const PROJECT = 1 << 3;
        const INCLUDE = 1 << 4;
        const INCLUDE_FILE = 1 << 5;
        const MACRO = 1 << 6;
        const MACRO_FILE = 1 << 7;
        const CONTAINER = 1 << 8;
    }
}

impl KindMask {
    /// The mask selecting exactly one kind.
    pub fn of(kind: EntryKind) -> KindMask {
        match kind {
            EntryKind::Source => KindMask::SOURCE,
            EntryKind::Output => KindMask::OUTPUT,
            EntryKind::Library => KindMask::LIBRARY,
            EntryKind::Project => KindMask::PROJECT,
            EntryKind::Include => KindMask::INCLUDE,
            EntryKind::IncludeFile => KindMask::INCLUDE_FILE,
            EntryKind::Macro => KindMask::MACRO,
            EntryKind::MacroFile => KindMask::MACRO_FILE,
            EntryKind::Container => KindMask::CONTAINER,
        }
    }

    /// Whether the mask selects the given kind.
    pub fn selects(&self, kind: EntryKind) -> bool {
        self.contains(KindMask::of(kind))
    }
}

/// Base-path indirection of an entry.
///
/// `Path` prepends a concrete base to the entry's kind-specific path;
/// `Reference` points at another entry (in another project or inside a
/// container) whose base is spliced in by the expander. The two are
/// mutually exclusive by construction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BaseLocation {
    #[default]
    Unset,
    Path(EntryPath),
    Reference(EntryPath),
}

impl BaseLocation {
    pub fn is_unset(&self) -> bool {
        matches!(self, BaseLocation::Unset)
    }
}

/// Kind-specific payload of a path entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryDetail {
    Source,
    Output,
    Library {
        /// The library file, relative to the base path or absolute.
        file: EntryPath,
    },
    Project,
    Include {
        /// The include directory, relative to the base path or absolute.
        dir: EntryPath,
        /// Whether the directory is searched as a system include.
        system: bool,
    },
    IncludeFile {
        file: EntryPath,
    },
    Macro {
        name: String,
        value: String,
    },
    MacroFile {
        file: EntryPath,
    },
    Container,
}

impl EntryDetail {
    pub fn kind(&self) -> EntryKind {
        match self {
            EntryDetail::Source => EntryKind::Source,
            EntryDetail::Output => EntryKind::Output,
            EntryDetail::Library { .. } => EntryKind::Library,
            EntryDetail::Project => EntryKind::Project,
            EntryDetail::Include { .. } => EntryKind::Include,
            EntryDetail::IncludeFile { .. } => EntryKind::IncludeFile,
            EntryDetail::Macro { .. } => EntryKind::Macro,
            EntryDetail::MacroFile { .. } => EntryKind::MacroFile,
            EntryDetail::Container => EntryKind::Container,
        }
    }
}

/// One build-path configuration record.
///
/// Structural equality (`PartialEq`) is the identity the validator and
/// the delta engine operate on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathEntry {
    /// The workspace location the entry is attached to. For `Project`
    /// entries this names the referenced project; for `Container`
    /// entries the first segment is the provider identifier.
    pub path: EntryPath,

    /// Whether the entry is contributed to referencing projects.
    pub exported: bool,

    /// Base-path indirection, if any.
    pub base: BaseLocation,

    /// Glob patterns excluding parts of the entry's subtree.
    pub exclusions: Vec<String>,

    /// Kind-specific payload.
    pub detail: EntryDetail,
}

impl PathEntry {
    fn new(path: EntryPath, detail: EntryDetail) -> Self {
        PathEntry {
            path,
            exported: false,
            base: BaseLocation::Unset,
            exclusions: Vec::new(),
            detail,
        }
    }

    /// A source root.
    pub fn source(path: EntryPath) -> Self {
        Self::new(path, EntryDetail::Source)
    }

    /// An output folder.
    pub fn output(path: EntryPath) -> Self {
        Self::new(path, EntryDetail::Output)
    }

    /// A library to link against.
    pub fn library(path: EntryPath, file: EntryPath) -> Self {
        Self::new(path, EntryDetail::Library { file })
    }

    /// A reference to another project; `path` names that project.
    pub fn project_ref(path: EntryPath) -> Self {
        Self::new(path, EntryDetail::Project)
    }

    /// An include directory effective under `path`.
    pub fn include(path: EntryPath, dir: EntryPath, system: bool) -> Self {
        Self::new(path, EntryDetail::Include { dir, system })
    }

    /// A file force-included into every translation unit under `path`.
    pub fn include_file(path: EntryPath, file: EntryPath) -> Self {
        Self::new(path, EntryDetail::IncludeFile { file })
    }

    /// A macro definition effective under `path`.
    pub fn macro_def(path: EntryPath, name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            path,
            EntryDetail::Macro {
                name: name.into(),
                value: value.into(),
            },
        )
    }

    /// A file of macro definitions effective under `path`.
    pub fn macro_file(path: EntryPath, file: EntryPath) -> Self {
        Self::new(path, EntryDetail::MacroFile { file })
    }

    /// An indirection to a provider-supplied container.
    pub fn container(path: EntryPath) -> Self {
        Self::new(path, EntryDetail::Container)
    }

    /// Mark the entry as exported to referencing projects.
    pub fn exported(mut self) -> Self {
        self.exported = true;
        self
    }

    /// Attach a concrete base path.
    pub fn with_base_path(mut self, base: EntryPath) -> Self {
        self.base = BaseLocation::Path(base);
        self
    }

    /// Attach a base reference to be spliced in by the expander.
    pub fn with_base_reference(mut self, reference: EntryPath) -> Self {
        self.base = BaseLocation::Reference(reference);
        self
    }

    /// Attach exclusion patterns.
    pub fn with_exclusions<I, S>(mut self, patterns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.exclusions = patterns.into_iter().map(Into::into).collect();
        self
    }

    pub fn kind(&self) -> EntryKind {
        self.detail.kind()
    }

    /// The macro name, for `Macro` entries.
    pub fn macro_name(&self) -> Option<&str> {
        match &self.detail {
            EntryDetail::Macro { name, .. } => Some(name),
            _ => None,
        }
    }

    /// The kind-specific target path (include dir, library file, ...),
    /// if the kind has one.
    pub fn target_path(&self) -> Option<&EntryPath> {
        match &self.detail {
            EntryDetail::Library { file }
            | EntryDetail::IncludeFile { file }
            | EntryDetail::MacroFile { file } => Some(file),
            EntryDetail::Include { dir, .. } => Some(dir),
            _ => None,
        }
    }
}

impl std::fmt::Display for PathEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} entry at `{}`", self.kind(), self.path)?;
        if let Some(target) = self.target_path() {
            write!(f, " -> `{}`", target)?;
        }
        if let EntryDetail::Macro { name, value } = &self.detail {
            write!(f, " ({}={})", name, value)?;
        }
        Ok(())
    }
}

/// Pairing of one raw entry with the resolved entries it produced.
///
/// The per-project resolve trace is the list of these, in raw order; the
/// lookup and delta engines consume it instead of recomputing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolveInfo {
    pub raw: PathEntry,
    pub resolved: Vec<PathEntry>,
}
