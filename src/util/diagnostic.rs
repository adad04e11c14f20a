//! Project-scoped diagnostics.
//!
//! Structural problems in a path configuration never abort resolution;
//! they are collected into `Diagnostic` batches and handed to the
//! embedder's sink. Every diagnostic should tell the user what is wrong,
//! where, and what to do about it.

use std::fmt;

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Common suggestion messages for consistent wording across checks.
pub mod suggestions {
    /// Suggestion when an entry duplicates an earlier one.
    pub const REMOVE_DUPLICATE: &str =
        "help: Remove the duplicate entry from the project's path configuration";

    /// Suggestion when a source entry nests inside another.
    pub const EXCLUDE_NESTED: &str =
        "help: Add an exclusion pattern to the enclosing source entry";

    /// Suggestion when a referenced path does not exist.
    pub const CHECK_PATH: &str =
        "help: Check that the path exists and is spelled correctly";

    /// Suggestion when a referenced project is missing or closed.
    pub const OPEN_PROJECT: &str =
        "help: Open the referenced project or remove the project reference";

    /// Suggestion when a container provider failed.
    pub const CHECK_PROVIDER: &str =
        "help: Verify the container's provider is installed and configured";
}

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "error"),
            Severity::Warning => write!(f, "warning"),
            Severity::Note => write!(f, "note"),
        }
    }
}

/// A diagnostic message with optional context and suggestions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Primary message
    pub message: String,
    /// Severity level
    pub severity: Severity,
    /// Additional context lines
    pub context: Vec<String>,
    /// Suggested fixes
    pub suggestions: Vec<String>,
    /// Related location, rendered (`/proj/src`, `/usr/include`, ...)
    pub location: Option<String>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Error,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(message: impl Into<String>) -> Self {
        Diagnostic {
            message: message.into(),
            severity: Severity::Warning,
            context: Vec::new(),
            suggestions: Vec::new(),
            location: None,
        }
    }

    /// Add context to the diagnostic.
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context.push(context.into());
        self
    }

    /// Add a suggestion for fixing the issue.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestions.push(suggestion.into());
        self
    }

    /// Add a location.
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    /// Format the diagnostic for terminal output.
    pub fn format(&self) -> String {
        let mut output = String::new();

        output.push_str(&format!("{}: {}\n", self.severity, self.message));

        if let Some(ref location) = self.location {
            output.push_str(&format!("  --> {}\n", location));
        }

        for ctx in &self.context {
            output.push_str(&format!("  -> {}\n", ctx));
        }

        for suggestion in &self.suggestions {
            output.push_str(&format!("  {}\n", suggestion));
        }

        output
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}

/// Duplicate entry error, for embedders that want a typed error value
/// instead of a rendered diagnostic.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("duplicate path entry at `{path}`")]
#[diagnostic(
    code(fairway::validate::duplicate_entry),
    help("Remove the duplicate entry from the project's path configuration")
)]
pub struct DuplicateEntryError {
    pub path: String,
}

/// Nested source error.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("source entry `{inner}` is nested inside `{outer}`")]
#[diagnostic(
    code(fairway::validate::nested_source),
    help("Add an exclusion pattern covering the nested folder to the enclosing entry")
)]
pub struct NestedSourceError {
    pub outer: String,
    pub inner: String,
}

/// Unresolved base-reference error.
#[derive(Debug, Error, MietteDiagnostic)]
#[error("could not resolve base reference `{reference}`")]
#[diagnostic(
    code(fairway::expand::unresolved_reference),
    help("Check that the referenced project or container defines a matching entry")
)]
pub struct UnresolvedReferenceError {
    pub reference: String,
}
