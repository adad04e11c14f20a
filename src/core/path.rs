//! Hierarchical entry locations.
//!
//! An `EntryPath` names a location either inside the workspace
//! (`/project/folder/...`), on the external filesystem (an absolute OS
//! path), or relative to a project root (raw entries are allowed to use
//! project-relative paths; the expander anchors them). Paths are stored
//! as normalized segment lists so the ordering engine can count, truncate
//! and compare them cheaply.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a path is rooted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PathRoot {
    /// Workspace-absolute: first segment is a project name.
    Workspace,
    /// Absolute location on the external filesystem.
    External,
    /// Not yet anchored; resolved against the project root on expansion.
    Relative,
}

/// A hierarchical location used by path entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntryPath {
    root: PathRoot,
    segments: Vec<String>,
}

impl EntryPath {
    /// Build a workspace-absolute path from segments.
    pub fn workspace<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        EntryPath {
            root: PathRoot::Workspace,
            segments: segments.into_iter().map(Into::into).collect(),
        }
    }

    /// Parse a workspace or relative path from its rendered form.
    ///
    /// A leading `/` makes the path workspace-absolute; otherwise it is
    /// project-relative until anchored.
    pub fn parse(text: &str) -> Self {
        let root = if text.starts_with('/') {
            PathRoot::Workspace
        } else {
            PathRoot::Relative
        };
        EntryPath {
            root,
            segments: split_segments(text),
        }
    }

    /// Parse an absolute external-filesystem path.
    pub fn external(text: &str) -> Self {
        EntryPath {
            root: PathRoot::External,
            segments: split_segments(text),
        }
    }

    pub fn root(&self) -> PathRoot {
        self.root
    }

    pub fn is_workspace(&self) -> bool {
        self.root == PathRoot::Workspace
    }

    pub fn is_external(&self) -> bool {
        self.root == PathRoot::External
    }

    pub fn is_relative(&self) -> bool {
        self.root == PathRoot::Relative
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Number of segments.
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn segment(&self, index: usize) -> Option<&str> {
        self.segments.get(index).map(String::as_str)
    }

    /// First segment; for workspace paths this is the project name, for
    /// container paths the provider identifier.
    pub fn first_segment(&self) -> Option<&str> {
        self.segment(0)
    }

    pub fn last_segment(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    /// Whether `self` is a (non-strict) ancestor of `other`.
    pub fn is_prefix_of(&self, other: &EntryPath) -> bool {
        self.root == other.root
            && self.segments.len() <= other.segments.len()
            && self.segments == other.segments[..self.segments.len()]
    }

    /// Whether `self` is a strict ancestor of `other`.
    pub fn is_strict_prefix_of(&self, other: &EntryPath) -> bool {
        self.is_prefix_of(other) && self.segments.len() < other.segments.len()
    }

    /// Keep only the first `n` segments.
    pub fn truncate(&self, n: usize) -> EntryPath {
        EntryPath {
            root: self.root,
            segments: self.segments[..n.min(self.segments.len())].to_vec(),
        }
    }

    /// The parent location, if any.
    pub fn parent(&self) -> Option<EntryPath> {
        if self.segments.is_empty() {
            None
        } else {
            Some(self.truncate(self.segments.len() - 1))
        }
    }

    /// Append one segment.
    pub fn join(&self, segment: impl AsRef<str>) -> EntryPath {
        let mut segments = self.segments.clone();
        segments.extend(split_segments(segment.as_ref()));
        EntryPath {
            root: self.root,
            segments,
        }
    }

    /// Append all segments of a (usually relative) path.
    pub fn join_path(&self, tail: &EntryPath) -> EntryPath {
        let mut segments = self.segments.clone();
        segments.extend(tail.segments.iter().cloned());
        EntryPath {
            root: self.root,
            segments,
        }
    }

    /// Render the path of `self` relative to `ancestor`, if `ancestor`
    /// is a prefix. Used for exclusion-pattern matching.
    pub fn relative_to(&self, ancestor: &EntryPath) -> Option<String> {
        if !ancestor.is_prefix_of(self) {
            return None;
        }
        Some(self.segments[ancestor.segments.len()..].join("/"))
    }

    /// Anchor a relative path under a project root; non-relative paths
    /// pass through unchanged.
    pub fn anchor(&self, project_root: &EntryPath) -> EntryPath {
        if self.is_relative() {
            project_root.join_path(self)
        } else {
            self.clone()
        }
    }
}

fn split_segments(text: &str) -> Vec<String> {
    let mut segments: Vec<String> = Vec::new();
    for part in text.split('/') {
        match part {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            seg => segments.push(seg.to_string()),
        }
    }
    segments
}

impl fmt::Display for EntryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.root {
            PathRoot::Relative => write!(f, "{}", self.segments.join("/")),
            PathRoot::Workspace | PathRoot::External => {
                write!(f, "/{}", self.segments.join("/"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_distinguishes_workspace_and_relative() {
        assert!(EntryPath::parse("/proj/src").is_workspace());
        assert!(EntryPath::parse("src/gen").is_relative());
        assert!(EntryPath::external("/usr/include").is_external());
    }

    #[test]
    fn normalization_drops_empty_and_dot_segments() {
        let p = EntryPath::parse("/proj//src/./gen");
        assert_eq!(p.segments(), ["proj", "src", "gen"]);

        let q = EntryPath::parse("src/../include");
        assert_eq!(q.segments(), ["include"]);
    }

    #[test]
    fn prefix_tests_respect_root() {
        let ws = EntryPath::parse("/proj/src");
        let file = EntryPath::parse("/proj/src/sub/a.c");
        let ext = EntryPath::external("/proj/src");

        assert!(ws.is_prefix_of(&file));
        assert!(ws.is_strict_prefix_of(&file));
        assert!(ws.is_prefix_of(&ws));
        assert!(!ws.is_strict_prefix_of(&ws));
        assert!(!ext.is_prefix_of(&file));
    }

    #[test]
    fn truncate_and_parent() {
        let file = EntryPath::parse("/proj/src/sub/a.c");
        assert_eq!(file.truncate(2), EntryPath::parse("/proj/src"));
        assert_eq!(file.parent().unwrap(), EntryPath::parse("/proj/src/sub"));
        assert_eq!(file.truncate(0).segment_count(), 0);
    }

    #[test]
    fn anchoring_relative_paths() {
        let root = EntryPath::parse("/proj");
        let rel = EntryPath::parse("src/gen");
        assert_eq!(rel.anchor(&root), EntryPath::parse("/proj/src/gen"));

        let abs = EntryPath::parse("/other/src");
        assert_eq!(abs.anchor(&root), abs);
    }

    #[test]
    fn relative_rendering() {
        let outer = EntryPath::parse("/proj/src");
        let inner = EntryPath::parse("/proj/src/gen/parser.c");
        assert_eq!(inner.relative_to(&outer).unwrap(), "gen/parser.c");
        assert_eq!(outer.relative_to(&inner), None);
    }

    #[test]
    fn display_round_trip() {
        let p = EntryPath::parse("/proj/src");
        assert_eq!(p.to_string(), "/proj/src");
        assert_eq!(EntryPath::parse(&p.to_string()), p);
    }
}
