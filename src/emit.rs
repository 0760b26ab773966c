//! Artifact emission. Each file is written whole or not at all.
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use thiserror::Error;

use crate::codegen::Artifact;

#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to create output directory {}", .path.display())]
    CreateDir { path: PathBuf, #[source] source: std::io::Error },
    #[error("failed to write artifact {}", .path.display())]
    Write { path: PathBuf, #[source] source: std::io::Error },
}

/// Write every artifact into `out_dir`, returning the paths that changed.
///
/// An artifact whose file already holds identical contents is left alone,
/// so build scripts do not trigger needless recompilation.
pub fn write_artifacts(out_dir: &Path, artifacts: &[Artifact]) -> Result<Vec<PathBuf>, EmitError> {
    std::fs::create_dir_all(out_dir).map_err(|source| EmitError::CreateDir {
        path: out_dir.to_path_buf(),
        source,
    })?;
    let mut written = Vec::new();
    for artifact in artifacts {
        let path = out_dir.join(&artifact.file_name);
        if std::fs::read_to_string(&path).is_ok_and(|existing| existing == artifact.contents) {
            tracing::debug!(path = %path.display(), "artifact unchanged");
            continue;
        }
        write_atomic(out_dir, &path, &artifact.contents)?;
        tracing::info!(path = %path.display(), bytes = artifact.contents.len(), "wrote artifact");
        written.push(path);
    }
    Ok(written)
}

/// Temp file in the destination directory, then rename over `path`.
pub fn write_atomic(dir: &Path, path: &Path, contents: &str) -> Result<(), EmitError> {
    let wrap = |source| EmitError::Write { path: path.to_path_buf(), source };
    let mut tmp = NamedTempFile::new_in(dir).map_err(wrap)?;
    tmp.write_all(contents.as_bytes()).map_err(wrap)?;
    tmp.as_file().sync_all().map_err(wrap)?;
    tmp.persist(path).map_err(|err| wrap(err.error))?;
    Ok(())
}

// ------------------------------- Tests ------------------------------------ //

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(name: &str, contents: &str) -> Artifact {
        Artifact { file_name: name.to_string(), contents: contents.to_string() }
    }

    #[test]
    fn writes_every_artifact_and_skips_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("gen");
        let arts = [artifact("a.rs", "// a\n"), artifact("b.rs", "// b\n")];

        let first = write_artifacts(&out, &arts).unwrap();
        assert_eq!(first.len(), 2);
        assert_eq!(std::fs::read_to_string(out.join("b.rs")).unwrap(), "// b\n");

        let second = write_artifacts(&out, &[artifact("a.rs", "// a\n"), artifact("b.rs", "// b2\n")]).unwrap();
        assert_eq!(second, vec![out.join("b.rs")]);
        assert_eq!(std::fs::read_to_string(out.join("b.rs")).unwrap(), "// b2\n");
    }

    #[test]
    fn no_temp_files_are_left_behind() {
        let dir = tempfile::tempdir().unwrap();
        write_artifacts(dir.path(), &[artifact("x.rs", "x")]).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
            .collect();
        assert_eq!(names, ["x.rs"]);
    }

    #[test]
    fn unwritable_destination_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "").unwrap();
        let err = write_artifacts(&blocker.join("sub"), &[artifact("x.rs", "x")]).unwrap_err();
        assert!(matches!(err, EmitError::CreateDir { .. }), "{err:?}");
    }
}
