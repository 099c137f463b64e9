//! Install the Python server files into an editor's extensions directory
//!
//! Installation is all-or-nothing with respect to preconditions: missing
//! source files or (without `overwrite`) existing target files are reported
//! before anything is copied.

use std::path::PathBuf;
use thiserror::Error;

/// Files that make up the server, relative to the source directory
pub const DEFAULT_MANIFEST: [&str; 4] = [
    "ncbi_mcp.py",
    "ncbi_client.py",
    "ncbi_datasets/client.py",
    "setup.py",
];

/// Extension directory name under the editor's extensions root
pub const EXTENSION_DIR: &str = "ncbi-mcp";

/// Errors that can occur while installing
#[derive(Debug, Error)]
pub enum InstallError {
    /// Source files listed in the manifest do not exist
    #[error("Missing source files in {}: {}", .source_dir.display(), display_list(.missing))]
    MissingSources {
        /// Directory that was searched
        source_dir: PathBuf,
        /// Manifest entries not found
        missing: Vec<PathBuf>,
    },

    /// Target files exist and overwriting was not requested
    #[error("Already installed (use --force to overwrite): {}", display_list(.existing))]
    AlreadyInstalled {
        /// Files that would be overwritten
        existing: Vec<PathBuf>,
    },

    /// No home directory to derive the default target from
    #[error("Cannot determine home directory; pass --target explicitly")]
    NoHomeDir,

    /// Copy failed
    #[error("Failed to write {}: {source}", .path.display())]
    Io {
        /// File being written
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },
}

fn display_list(paths: &[PathBuf]) -> String {
    paths
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Default install location: `~/.cursor/extensions/ncbi-mcp`
pub fn default_target() -> Result<PathBuf, InstallError> {
    dirs::home_dir()
        .map(|home| home.join(".cursor").join("extensions").join(EXTENSION_DIR))
        .ok_or(InstallError::NoHomeDir)
}

/// What an install did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    /// Directory the files were copied into
    pub target: PathBuf,

    /// Destination paths written, in manifest order
    pub copied: Vec<PathBuf>,

    /// Total bytes copied
    pub bytes: u64,
}

/// Copies manifest files from a source directory to a target directory
#[derive(Debug, Clone)]
pub struct Installer {
    source: PathBuf,
    target: PathBuf,
    files: Vec<PathBuf>,
    overwrite: bool,
}

impl Installer {
    /// Create an installer using [`DEFAULT_MANIFEST`]
    pub fn new(source: impl Into<PathBuf>, target: impl Into<PathBuf>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            files: DEFAULT_MANIFEST.iter().map(PathBuf::from).collect(),
            overwrite: false,
        }
    }

    /// Replace the manifest
    #[must_use]
    pub fn with_files<I, P>(mut self, files: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        self.files = files.into_iter().map(Into::into).collect();
        self
    }

    /// Allow replacing files that already exist in the target
    #[must_use]
    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// Manifest entries missing from the source directory
    pub fn missing_sources(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .filter(|file| !self.source.join(file).is_file())
            .cloned()
            .collect()
    }

    /// Target paths that already exist
    pub fn existing_targets(&self) -> Vec<PathBuf> {
        self.files
            .iter()
            .map(|file| self.target.join(file))
            .filter(|path| path.exists())
            .collect()
    }

    /// Copy every manifest file into the target directory
    pub fn install(&self) -> Result<InstallReport, InstallError> {
        let missing = self.missing_sources();
        if !missing.is_empty() {
            return Err(InstallError::MissingSources {
                source_dir: self.source.clone(),
                missing,
            });
        }

        if !self.overwrite {
            let existing = self.existing_targets();
            if !existing.is_empty() {
                return Err(InstallError::AlreadyInstalled { existing });
            }
        }

        let mut report = InstallReport {
            target: self.target.clone(),
            copied: Vec::with_capacity(self.files.len()),
            bytes: 0,
        };

        for file in &self.files {
            let from = self.source.join(file);
            let to = self.target.join(file);

            if let Some(parent) = to.parent() {
                std::fs::create_dir_all(parent).map_err(|source| InstallError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }

            let bytes = std::fs::copy(&from, &to).map_err(|source| InstallError::Io {
                path: to.clone(),
                source,
            })?;
            tracing::debug!(from = %from.display(), to = %to.display(), bytes, "Copied");

            report.bytes += bytes;
            report.copied.push(to);
        }

        tracing::info!(
            dir = %self.target.display(),
            files = report.copied.len(),
            "Installed server files"
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn populated_source() -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        for file in DEFAULT_MANIFEST {
            let path = dir.path().join(file);
            std::fs::create_dir_all(path.parent().unwrap()).unwrap();
            std::fs::write(&path, format!("# {file}\n")).unwrap();
        }
        dir
    }

    #[test]
    fn test_install_copies_manifest() {
        let source = populated_source();
        let target = tempfile::tempdir().unwrap();
        let dest = target.path().join("ncbi-mcp");

        let report = Installer::new(source.path(), &dest).install().unwrap();

        assert_eq!(report.copied.len(), DEFAULT_MANIFEST.len());
        assert_eq!(report.target, dest);
        for file in DEFAULT_MANIFEST {
            let copied = std::fs::read_to_string(dest.join(file)).unwrap();
            assert_eq!(copied, format!("# {file}\n"));
        }
        assert!(report.bytes > 0);
    }

    #[test]
    fn test_missing_source_copies_nothing() {
        let source = populated_source();
        std::fs::remove_file(source.path().join("ncbi_client.py")).unwrap();
        let target = tempfile::tempdir().unwrap();
        let dest = target.path().join("ncbi-mcp");

        let err = Installer::new(source.path(), &dest).install().unwrap_err();

        match err {
            InstallError::MissingSources { missing, .. } => {
                assert_eq!(missing, vec![PathBuf::from("ncbi_client.py")]);
            }
            other => panic!("expected MissingSources, got {other:?}"),
        }
        assert!(!dest.exists());
    }

    #[test]
    fn test_existing_install_requires_overwrite() {
        let source = populated_source();
        let target = tempfile::tempdir().unwrap();

        Installer::new(source.path(), target.path()).install().unwrap();
        std::fs::write(source.path().join("ncbi_mcp.py"), "# v2\n").unwrap();

        let err = Installer::new(source.path(), target.path())
            .install()
            .unwrap_err();
        assert!(matches!(err, InstallError::AlreadyInstalled { ref existing } if existing.len() == 4));
        assert!(err.to_string().contains("--force"));

        Installer::new(source.path(), target.path())
            .overwrite(true)
            .install()
            .unwrap();
        let updated = std::fs::read_to_string(target.path().join("ncbi_mcp.py")).unwrap();
        assert_eq!(updated, "# v2\n");
    }

    #[test]
    fn test_custom_manifest() {
        let source = tempfile::tempdir().unwrap();
        std::fs::write(source.path().join("server.py"), "pass\n").unwrap();
        let target = tempfile::tempdir().unwrap();

        let installer = Installer::new(source.path(), target.path()).with_files(["server.py"]);
        assert!(installer.missing_sources().is_empty());

        let report = installer.install().unwrap();
        assert_eq!(report.copied, vec![target.path().join("server.py")]);
        assert_eq!(report.bytes, 5);
    }

    #[test]
    fn test_default_target_ends_with_extension_dir() {
        if let Ok(target) = default_target() {
            assert!(target.ends_with(".cursor/extensions/ncbi-mcp"));
        }
    }
}
