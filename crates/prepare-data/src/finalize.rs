//! Moving finished files to their destination.
//!
//! Finalization is all-or-nothing across the whole output set. Every result
//! is first staged next to its destination, then all staged files are
//! renamed into place. A failed rename removes the destinations already
//! written, so no partial corpus is left behind.
use corpus_core::{CorpusError, Result, ScratchSpace};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// A finished file waiting in the destination's directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedOutput {
    pub staged: PathBuf,
    pub destination: PathBuf,
}

/// Puts the content of `source` into a scratch file beside `destination`.
/// Renames when possible and copies across filesystems. The staged file is
/// registered with `scratch`, so it is removed if the commit never happens.
pub fn stage_output(source: &Path, destination: &Path, scratch: &ScratchSpace) -> Result<StagedOutput> {
    if destination.is_dir() {
        return Err(CorpusError::io(
            destination,
            io::Error::new(io::ErrorKind::AlreadyExists, "destination is a directory"),
        ));
    }

    let dir = match destination.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let (mut file, staged) = scratch.acquire_in(dir)?.into_parts();

    if let Err(e) = fs::rename(source, &staged) {
        tracing::debug!(
            "rename {} → {} failed ({}), copying instead",
            source.display(),
            staged.display(),
            e
        );
        let mut input = File::open(source).map_err(|e| CorpusError::io(source, e))?;
        io::copy(&mut input, &mut file).map_err(|e| CorpusError::io(&staged, e))?;
        file.sync_all().map_err(|e| CorpusError::io(&staged, e))?;
    }

    Ok(StagedOutput {
        staged,
        destination: destination.to_path_buf(),
    })
}

/// Renames every staged file over its destination. On the first failure the
/// destinations renamed so far are removed and the error is returned.
pub fn commit_outputs(outputs: &[StagedOutput]) -> Result<()> {
    let mut placed: Vec<&Path> = Vec::with_capacity(outputs.len());

    for output in outputs {
        if let Err(e) = fs::rename(&output.staged, &output.destination) {
            rollback(&placed);
            return Err(CorpusError::io(&output.destination, e));
        }
        placed.push(&output.destination);
    }
    Ok(())
}

fn rollback(placed: &[&Path]) {
    for path in placed {
        match fs::remove_file(path) {
            Ok(()) => tracing::info!("removed {} after failed finalization", path.display()),
            Err(e) => tracing::warn!("could not remove {}: {}", path.display(), e),
        }
    }
}
