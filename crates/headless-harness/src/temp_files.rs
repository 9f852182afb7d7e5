//! Temporary artifacts under the build directory.
//!
//! Test files are staged as `<buildDir>/<sha256(path)>.temp.<ext>`; the name
//! depends only on the original path, so a second run over the same file
//! targets the same artifact. Removal is advisory: its outcome is reported as
//! a [`CleanupOutcome`] and never fails the run.

use crate::result::{HarnessError, HarnessResult};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Extension marker for staged test files
pub const TEMP_TEST_EXTENSION: &str = "aff";

/// Hex SHA-256 of a file's logical identity (its path as given)
#[must_use]
pub fn identity_hash(identity: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(identity.as_os_str().as_encoded_bytes());
    let digest = hasher.finalize();
    format!("{digest:x}")
}

/// Staged name for a test file
#[must_use]
pub fn temp_test_path(build_dir: &Path, test_file: &Path) -> PathBuf {
    temp_path_with_ext(build_dir, test_file, TEMP_TEST_EXTENSION)
}

/// Staged name with an explicit extension
#[must_use]
pub fn temp_path_with_ext(build_dir: &Path, identity: &Path, ext: &str) -> PathBuf {
    build_dir.join(format!("{}.temp.{ext}", identity_hash(identity)))
}

/// Persisted path of an application unit (coverage is attributed to it)
#[must_use]
pub fn app_unit_path(build_dir: &Path, name: &str) -> PathBuf {
    build_dir.join(format!("{name}.js"))
}

/// Create a directory (and parents) or fail as a setup error
pub fn ensure_dir(dir: &Path) -> HarnessResult<()> {
    std::fs::create_dir_all(dir).map_err(|e| HarnessError::setup(dir, e.to_string()))
}

/// Write a file or fail as a setup error
pub fn write_artifact(path: &Path, contents: &[u8]) -> HarnessResult<()> {
    std::fs::write(path, contents).map_err(|e| HarnessError::setup(path, e.to_string()))
}

/// Result of removing one artifact
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CleanupOutcome {
    /// File was removed
    Removed(PathBuf),
    /// File did not exist (usually removed by a concurrent run)
    AlreadyGone(PathBuf),
    /// Removal failed for another reason
    Failed {
        /// Path that could not be removed
        path: PathBuf,
        /// Error message
        message: String,
    },
}

impl CleanupOutcome {
    /// Whether the file is gone after the attempt
    #[must_use]
    pub const fn is_gone(&self) -> bool {
        matches!(self, Self::Removed(_) | Self::AlreadyGone(_))
    }
}

/// Remove a file, classifying the outcome instead of failing
pub fn remove_advisory(path: &Path) -> CleanupOutcome {
    match std::fs::remove_file(path) {
        Ok(()) => CleanupOutcome::Removed(path.to_path_buf()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            CleanupOutcome::AlreadyGone(path.to_path_buf())
        }
        Err(e) => CleanupOutcome::Failed {
            path: path.to_path_buf(),
            message: e.to_string(),
        },
    }
}

/// A staged test file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TempFile {
    /// Path of the original test file
    pub original: PathBuf,
    /// Path of the staged copy
    pub path: PathBuf,
}

/// Every temp file of one run.
///
/// Files still tracked when the set is dropped are removed, so an aborted run
/// does not leave staged copies behind.
#[derive(Debug, Default)]
pub struct StagedFiles {
    files: Vec<TempFile>,
}

impl StagedFiles {
    /// Create an empty set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Write `injection + contents of original` to its derived name and track it
    pub fn stage(
        &mut self,
        build_dir: &Path,
        original: &Path,
        injection: &str,
    ) -> HarnessResult<&TempFile> {
        let body = std::fs::read(original).map_err(|e| {
            HarnessError::setup(original, format!("cannot read test file: {e}"))
        })?;
        let path = temp_test_path(build_dir, original);

        let mut contents = Vec::with_capacity(injection.len() + body.len());
        contents.extend_from_slice(injection.as_bytes());
        contents.extend_from_slice(&body);
        write_artifact(&path, &contents)?;

        tracing::debug!(original = %original.display(), staged = %path.display(), "staged test file");
        self.files.push(TempFile {
            original: original.to_path_buf(),
            path,
        });
        Ok(&self.files[self.files.len() - 1])
    }

    /// Staged paths in queue order
    #[must_use]
    pub fn paths(&self) -> Vec<PathBuf> {
        self.files.iter().map(|f| f.path.clone()).collect()
    }

    /// Staged files in queue order
    #[must_use]
    pub fn files(&self) -> &[TempFile] {
        &self.files
    }

    /// Number of staged files
    #[must_use]
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether nothing is staged
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Remove every staged file, reporting each outcome
    pub fn cleanup(&mut self) -> Vec<CleanupOutcome> {
        self.files
            .drain(..)
            .map(|file| {
                let outcome = remove_advisory(&file.path);
                tracing::debug!(?outcome, "temp file cleanup");
                outcome
            })
            .collect()
    }
}

impl Drop for StagedFiles {
    fn drop(&mut self) {
        if !self.files.is_empty() {
            let _ = self.cleanup();
        }
    }
}

/// Remove the staged copies a set of test files would produce
pub fn cleanup_for(build_dir: &Path, test_files: &[PathBuf]) -> Vec<CleanupOutcome> {
    test_files
        .iter()
        .map(|file| remove_advisory(&temp_test_path(build_dir, file)))
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[cfg(unix)]
    #[test]
    fn test_non_utf8_paths_get_distinct_names() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let build = Path::new("/tmp/build");
        let a = Path::new(OsStr::from_bytes(b"test/\xff.js"));
        let b = Path::new(OsStr::from_bytes(b"test/\xfe.js"));

        assert_eq!(a.to_string_lossy(), b.to_string_lossy());
        assert_ne!(temp_test_path(build, a), temp_test_path(build, b));
    }

    #[test]
    fn test_names_are_deterministic_and_distinct() {
        let build = Path::new("/tmp/build");
        let a1 = temp_test_path(build, Path::new("test/a.js"));
        let a2 = temp_test_path(build, Path::new("test/a.js"));
        let b = temp_test_path(build, Path::new("test/b.js"));

        assert_eq!(a1, a2);
        assert_ne!(a1, b);
        let name = a1.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.ends_with(".temp.aff"));
        assert_eq!(name.len(), 64 + ".temp.aff".len());
    }

    #[test]
    fn test_app_unit_path() {
        assert_eq!(
            app_unit_path(Path::new("/b"), "widgets"),
            PathBuf::from("/b/widgets.js")
        );
    }

    #[test]
    fn test_stage_prepends_injection_byte_for_byte() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("a.js");
        std::fs::write(&original, b"describe('a', function () {});\n").unwrap();

        let mut staged = StagedFiles::new();
        let file = staged
            .stage(dir.path(), &original, "var injected = true;\n")
            .unwrap()
            .clone();

        let written = std::fs::read(&file.path).unwrap();
        assert_eq!(
            written,
            b"var injected = true;\ndescribe('a', function () {});\n".to_vec()
        );
        assert_eq!(staged.len(), 1);
    }

    #[test]
    fn test_stage_missing_original_is_setup_error() {
        let dir = tempfile::tempdir().unwrap();
        let mut staged = StagedFiles::new();
        let err = staged
            .stage(dir.path(), &dir.path().join("missing.js"), "")
            .unwrap_err();
        assert!(err.is_setup_failure());
        assert!(staged.is_empty());
    }

    #[test]
    fn test_cleanup_tolerates_already_removed_files() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("a.js");
        std::fs::write(&original, "x").unwrap();

        let mut staged = StagedFiles::new();
        let path = staged.stage(dir.path(), &original, "").unwrap().path.clone();
        std::fs::remove_file(&path).unwrap();

        let outcomes = staged.cleanup();
        assert_eq!(outcomes, vec![CleanupOutcome::AlreadyGone(path)]);
        assert!(outcomes.iter().all(CleanupOutcome::is_gone));
    }

    #[test]
    fn test_drop_removes_staged_files() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("a.js");
        std::fs::write(&original, "x").unwrap();

        let path = {
            let mut staged = StagedFiles::new();
            let staged_path = staged.stage(dir.path(), &original, "").unwrap().path.clone();
            assert!(staged_path.exists());
            staged_path
        };
        assert!(!path.exists());
    }

    #[test]
    fn test_cleanup_for_recomputes_names() {
        let dir = tempfile::tempdir().unwrap();
        let original = dir.path().join("a.js");
        std::fs::write(&original, "x").unwrap();
        let staged_path = temp_test_path(dir.path(), &original);
        std::fs::write(&staged_path, "x").unwrap();

        let outcomes = cleanup_for(dir.path(), &[original]);
        assert_eq!(outcomes, vec![CleanupOutcome::Removed(staged_path.clone())]);
        assert!(!staged_path.exists());
    }

    proptest! {
        #[test]
        fn prop_distinct_paths_get_distinct_names(a in "[a-z]{1,12}\\.js", b in "[a-z]{1,12}\\.js") {
            prop_assume!(a != b);
            let build = Path::new("/build");
            prop_assert_ne!(
                temp_test_path(build, Path::new(&a)),
                temp_test_path(build, Path::new(&b))
            );
        }
    }
}
