//! Resolution error types and diagnostics.
//!
//! Only a store failure surfaces as a hard error; every structural or
//! provider problem is converted to a diagnostic and the caller still
//! receives a usable entry list.

use thiserror::Error;

use crate::core::{EntryPath, ProjectId};
use crate::util::diagnostic::{suggestions, Diagnostic};

/// Error during path-entry resolution.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// The raw-entry store could not be read. The only hard failure.
    #[error("path entry store unavailable for project `{project}`")]
    StoreUnavailable {
        project: ProjectId,
        #[source]
        source: anyhow::Error,
    },

    /// Duplicate, nested, or otherwise invalid entries.
    #[error("invalid path configuration in project `{project}`: {message}")]
    Configuration { project: ProjectId, message: String },

    /// A referenced project or path is missing, closed, or wrong-typed.
    #[error("`{path}` is not accessible")]
    NotAccessible { path: EntryPath },

    /// An external container initializer failed.
    #[error("container provider `{provider}` failed for `{path}`")]
    Provider {
        provider: String,
        path: EntryPath,
        #[source]
        source: anyhow::Error,
    },
}

impl ResolverError {
    /// Convert to a user-facing diagnostic.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ResolverError::StoreUnavailable { project, source } => {
                Diagnostic::error(format!(
                    "could not read path entries for project `{}`",
                    project
                ))
                .with_context(format!("{}", source))
            }

            ResolverError::Configuration { message, .. } => Diagnostic::warning(message.clone())
                .with_suggestion(suggestions::REMOVE_DUPLICATE),

            ResolverError::NotAccessible { path } => {
                Diagnostic::warning(format!("`{}` is not accessible", path))
                    .with_location(path.to_string())
                    .with_suggestion(suggestions::CHECK_PATH)
            }

            ResolverError::Provider {
                provider,
                path,
                source,
            } => Diagnostic::error(format!(
                "container provider `{}` failed for `{}`",
                provider, path
            ))
            .with_context(format!("{}", source))
            .with_suggestion(suggestions::CHECK_PROVIDER),
        }
    }
}

/// Error from expanding a single raw entry.
#[derive(Debug, Error)]
pub enum ExpandError {
    /// A base reference names an entry that cannot be located.
    #[error("unresolved base reference `{reference}`")]
    UnresolvedReference { reference: EntryPath },
}

impl ExpandError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            ExpandError::UnresolvedReference { reference } => {
                Diagnostic::warning(format!("could not resolve base reference `{}`", reference))
                    .with_location(reference.to_string())
                    .with_context("the entry was dropped from the resolved configuration")
            }
        }
    }
}
