//! Scratch files owned by a single pipeline run.
//!
//! Every intermediate file of the run is created through [`ScratchSpace::acquire`]
//! and removed by [`ScratchSpace::release_all`]. The driver calls the latter on
//! every exit path; nothing here relies on `Drop`.
use crate::error::{CorpusError, Result};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

const SCRATCH_PREFIX: &str = "corpus-";

/// A freshly created, writable scratch file.
#[derive(Debug)]
pub struct ScratchFile {
    path: PathBuf,
    file: File,
}

impl ScratchFile {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Gives up the handle, keeping only the name for the next stage.
    pub fn into_path(self) -> PathBuf {
        self.path
    }

    pub fn into_parts(self) -> (File, PathBuf) {
        (self.file, self.path)
    }
}

pub struct ScratchSpace {
    dir: PathBuf,
    created: Mutex<Vec<PathBuf>>,
}

impl ScratchSpace {
    /// Scratch files in the system temporary directory.
    pub fn new() -> Self {
        Self::in_dir(std::env::temp_dir())
    }

    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            created: Mutex::new(Vec::new()),
        }
    }

    /// Creates `count` uniquely named scratch files and registers them for release.
    pub fn acquire(&self, count: usize) -> Result<Vec<ScratchFile>> {
        (0..count).map(|_| self.acquire_one()).collect()
    }

    /// Acquires a single scratch file.
    pub fn acquire_one(&self) -> Result<ScratchFile> {
        self.acquire_in(&self.dir)
    }

    /// Acquires a scratch file in `dir` rather than the scratch directory,
    /// for content that must later be renamed within `dir`.
    pub fn acquire_in(&self, dir: &Path) -> Result<ScratchFile> {
        let named = tempfile::Builder::new()
            .prefix(SCRATCH_PREFIX)
            .tempfile_in(dir)
            .map_err(|e| CorpusError::io(dir, e))?;

        let (file, path) = named.keep().map_err(|e| CorpusError::io(dir, e.error))?;

        self.registry().push(path.clone());
        Ok(ScratchFile { path, file })
    }

    /// Number of scratch files not yet released.
    pub fn outstanding(&self) -> usize {
        self.registry().len()
    }

    /// Deletes every scratch file created so far. Files that are already gone
    /// (moved to their destination, for instance) are skipped; other removal
    /// failures are logged and otherwise ignored. Returns the number removed.
    pub fn release_all(&self) -> usize {
        let paths: Vec<PathBuf> = std::mem::take(&mut *self.registry());
        let mut removed = 0;

        for path in paths {
            match std::fs::remove_file(&path) {
                Ok(()) => removed += 1,
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => {
                    tracing::warn!("could not remove scratch file {}: {}", path.display(), e);
                }
            }
        }

        tracing::debug!("released {} scratch files", removed);
        removed
    }

    fn registry(&self) -> std::sync::MutexGuard<'_, Vec<PathBuf>> {
        self.created.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ScratchSpace {
    fn default() -> Self {
        Self::new()
    }
}
