//! Path variable substitution.
//!
//! Raw entries may reference registered variables in `${NAME}` form
//! anywhere a path is expected. Substitution is textual and happens once
//! per resolution pass, before anchoring.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static VAR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap());

/// Substitute `${NAME}` references with registered variable values.
///
/// Unknown variables are left verbatim so that a typo shows up in the
/// resolved entry (and in its existence diagnostic) instead of silently
/// producing an empty path segment.
pub fn substitute(input: &str, variables: &HashMap<String, String>) -> String {
    if !input.contains("${") {
        return input.to_string();
    }

    VAR_RE
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match variables.get(name) {
                Some(value) => value.clone(),
                None => {
                    tracing::debug!("unregistered path variable `{}`", name);
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn substitutes_known_variables() {
        let v = vars(&[("SDK_HOME", "/opt/sdk")]);
        assert_eq!(substitute("${SDK_HOME}/include", &v), "/opt/sdk/include");
    }

    #[test]
    fn unknown_variable_left_verbatim() {
        let v = vars(&[]);
        assert_eq!(substitute("${MISSING}/lib", &v), "${MISSING}/lib");
    }

    #[test]
    fn multiple_occurrences() {
        let v = vars(&[("A", "x"), ("B", "y")]);
        assert_eq!(substitute("${A}/${B}/${A}", &v), "x/y/x");
    }

    #[test]
    fn plain_paths_pass_through() {
        let v = vars(&[("A", "x")]);
        assert_eq!(substitute("/usr/include", &v), "/usr/include");
    }
}
