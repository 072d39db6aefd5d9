use crate::error::{CodegenError, CodegenResult};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// A rendered file, not yet written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub file_name: String,
    pub contents: String,
}

impl Artifact {
    pub fn new(file_name: impl Into<String>, contents: impl Into<String>) -> Self {
        Artifact {
            file_name: file_name.into(),
            contents: contents.into(),
        }
    }
}

/// Writes `artifacts` into `output_dir`, creating the directory if needed.
///
/// Every file is first written to a temporary file inside `output_dir` and
/// only then renamed into place, so readers never observe a partially written
/// file. If renaming one artifact fails, the artifacts already renamed by this
/// call are rolled back: replaced files get their previous contents again and
/// new files are removed.
pub fn write_artifacts(output_dir: &Path, artifacts: &[Artifact]) -> CodegenResult<Vec<PathBuf>> {
    std::fs::create_dir_all(output_dir).map_err(|err| CodegenError::io(output_dir, err))?;

    let mut staged = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let mut file = NamedTempFile::new_in(output_dir).map_err(|err| CodegenError::io(output_dir, err))?;
        file.write_all(artifact.contents.as_bytes())
            .and_then(|_| file.flush())
            .map_err(|err| CodegenError::io(file.path(), err))?;
        staged.push((file, output_dir.join(&artifact.file_name)));
    }

    let mut written: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::with_capacity(staged.len());
    for (file, path) in staged {
        let previous = match std::fs::read(&path) {
            Ok(bytes) => Some(bytes),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                roll_back(&written);
                return Err(CodegenError::io(&path, err));
            }
        };
        if let Err(err) = file.persist(&path) {
            roll_back(&written);
            return Err(CodegenError::io(&path, err.error));
        }
        log::info!("wrote {}", path.display());
        written.push((path, previous));
    }
    Ok(written.into_iter().map(|(path, _)| path).collect())
}

/// Restores the state before `written` was persisted, newest first.
fn roll_back(written: &[(PathBuf, Option<Vec<u8>>)]) {
    for (path, previous) in written.iter().rev() {
        let result = match previous {
            Some(bytes) => std::fs::write(path, bytes),
            None => std::fs::remove_file(path),
        };
        match result {
            Ok(()) => log::warn!("rolled back {}", path.display()),
            Err(err) => log::error!("failed to roll back {}: {}", path.display(), err),
        }
    }
}
