//! Executable discovery
//!
//! The launcher probes an ordered list of interpreter names and takes the
//! first one the platform can find. Lookup is behind [`ExecutableResolver`]
//! so tests can substitute a fixed answer for the real `PATH`.

use std::collections::HashMap;
use std::path::PathBuf;

/// Looks up an executable name
pub trait ExecutableResolver: Send + Sync {
    /// Return the full path of `name`, or `None` if it cannot be run
    fn resolve(&self, name: &str) -> Option<PathBuf>;
}

impl<F> ExecutableResolver for F
where
    F: Fn(&str) -> Option<PathBuf> + Send + Sync,
{
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self(name)
    }
}

/// Resolves names against `PATH` (and `PATHEXT` on Windows)
#[derive(Debug, Clone, Copy, Default)]
pub struct PathResolver;

impl ExecutableResolver for PathResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        which::which(name).ok()
    }
}

/// Resolves only the names it was given
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    known: HashMap<String, PathBuf>,
}

impl StaticResolver {
    /// Create a resolver that knows no executables
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an executable
    pub fn with(mut self, name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        self.known.insert(name.into(), path.into());
        self
    }
}

impl ExecutableResolver for StaticResolver {
    fn resolve(&self, name: &str) -> Option<PathBuf> {
        self.known.get(name).cloned()
    }
}

/// Pick the first candidate the resolver can find, or `fallback` if none resolves
pub fn resolve_executable(
    candidates: &[String],
    fallback: &str,
    resolver: &dyn ExecutableResolver,
) -> String {
    for candidate in candidates {
        if let Some(path) = resolver.resolve(candidate) {
            tracing::debug!(candidate = %candidate, path = %path.display(), "Resolved executable");
            return candidate.clone();
        }
        tracing::trace!(candidate = %candidate, "Executable not found");
    }

    tracing::debug!(fallback = %fallback, "No candidate resolved, using fallback");
    fallback.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn python_candidates() -> Vec<String> {
        vec!["python".into(), "python3".into(), "py".into()]
    }

    #[test]
    fn test_only_python3_resolvable() {
        let resolver = StaticResolver::new().with("python3", "/usr/bin/python3");
        let chosen = resolve_executable(&python_candidates(), "python", &resolver);
        assert_eq!(chosen, "python3");
    }

    #[rstest]
    #[case(&["python", "python3", "py"], "python")]
    #[case(&["python3", "py"], "python3")]
    #[case(&["py"], "py")]
    fn test_first_resolvable_candidate_wins(#[case] available: &[&str], #[case] expected: &str) {
        let resolver = available
            .iter()
            .fold(StaticResolver::new(), |r, name| r.with(*name, format!("/bin/{name}")));
        assert_eq!(
            resolve_executable(&python_candidates(), "fallback", &resolver),
            expected
        );
    }

    #[test]
    fn test_fallback_when_nothing_resolves() {
        let chosen = resolve_executable(&python_candidates(), "python", &StaticResolver::new());
        assert_eq!(chosen, "python");
    }

    #[test]
    fn test_empty_candidate_list_uses_fallback() {
        let chosen = resolve_executable(&[], "py", &StaticResolver::new());
        assert_eq!(chosen, "py");
    }

    #[test]
    fn test_closure_resolver() {
        let resolver = |name: &str| (name == "py").then(|| PathBuf::from("C:\\py.exe"));
        assert_eq!(
            resolve_executable(&python_candidates(), "python", &resolver),
            "py"
        );
    }

    #[test]
    fn test_resolver_consulted_in_order() {
        let seen = std::sync::Mutex::new(Vec::new());
        let resolver = |name: &str| {
            seen.lock().unwrap().push(name.to_string());
            None::<PathBuf>
        };
        resolve_executable(&python_candidates(), "python", &resolver);
        assert_eq!(*seen.lock().unwrap(), python_candidates());
    }

    #[cfg(unix)]
    #[test]
    fn test_path_resolver_finds_sh() {
        assert!(PathResolver.resolve("sh").is_some());
        assert!(PathResolver.resolve("definitely-not-a-real-binary-4242").is_none());
    }
}
