//! Exclusion pattern matching.
//!
//! Source and output entries carry glob patterns that exclude parts of
//! their subtree. Patterns are matched against paths relative to the
//! entry they belong to (`gen/*` on `/proj/src` excludes
//! `/proj/src/gen/parser.c`).

use glob::Pattern;

/// Compile a list of raw glob patterns, skipping invalid ones.
///
/// Invalid patterns are user configuration mistakes; they are logged and
/// ignored rather than failing the whole entry.
pub fn compile(patterns: &[String]) -> Vec<Pattern> {
    let mut compiled = Vec::with_capacity(patterns.len());
    for raw in patterns {
        match Pattern::new(raw) {
            Ok(p) => compiled.push(p),
            Err(e) => {
                tracing::warn!("invalid exclusion pattern `{}`: {}", raw, e);
            }
        }
    }
    compiled
}

/// Check whether a relative path is excluded by any of the patterns.
///
/// A directory counts as excluded when a pattern covers its contents:
/// `gen/*` excludes the folder `gen` itself, so nested entries rooted at
/// an excluded folder are treated as carved out of the enclosing entry.
pub fn is_excluded(patterns: &[Pattern], relative: &str) -> bool {
    patterns.iter().any(|p| {
        p.matches(relative) || p.matches(&format!("{}/", relative))
    })
}

/// Convenience: compile and match in one step.
pub fn excludes(raw_patterns: &[String], relative: &str) -> bool {
    is_excluded(&compile(raw_patterns), relative)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_under_pattern_is_excluded() {
        let pats = compile(&["gen/*".to_string()]);
        assert!(is_excluded(&pats, "gen/parser.c"));
        assert!(!is_excluded(&pats, "main.c"));
    }

    #[test]
    fn folder_covered_by_pattern_is_excluded() {
        let pats = compile(&["gen/*".to_string()]);
        assert!(is_excluded(&pats, "gen"));
    }

    #[test]
    fn sibling_folder_is_not_excluded() {
        let pats = compile(&["gen/*".to_string()]);
        assert!(!is_excluded(&pats, "other"));
        assert!(!is_excluded(&pats, "other/util.c"));
    }

    #[test]
    fn invalid_pattern_is_skipped() {
        let pats = compile(&["[".to_string(), "*.tmp".to_string()]);
        assert_eq!(pats.len(), 1);
        assert!(is_excluded(&pats, "scratch.tmp"));
    }
}
