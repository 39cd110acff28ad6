//! Corpus naming: a corpus `X` with extensions `[a, b]` is the pair `X.a`, `X.b`.
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorpusRole {
    Dev,
    Test,
    Train,
}

impl CorpusRole {
    /// Processing order. Train comes last since it may be split into the others.
    pub const ALL: [CorpusRole; 3] = [CorpusRole::Dev, CorpusRole::Test, CorpusRole::Train];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Test => "test",
            Self::Train => "train",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "dev" => Some(Self::Dev),
            "test" => Some(Self::Test),
            "train" => Some(Self::Train),
            _ => None,
        }
    }

    fn index(&self) -> usize {
        match self {
            Self::Dev => 0,
            Self::Test => 1,
            Self::Train => 2,
        }
    }

    /// Destination base path: `out`, `out.dev` or `out.test`.
    pub fn output_base(&self, output_corpus: &Path) -> PathBuf {
        match self {
            Self::Train => output_corpus.to_path_buf(),
            role => with_suffix(output_corpus, role.name()),
        }
    }
}

impl fmt::Display for CorpusRole {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// `base` + `.` + `ext`, without touching dots already present in `base`.
pub fn with_suffix(base: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(base.as_os_str());
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// One path per extension, in extension order.
pub fn parallel_files(base: &Path, extensions: &[String]) -> Vec<PathBuf> {
    extensions.iter().map(|ext| with_suffix(base, ext)).collect()
}

/// Current files of every corpus of a run. `None` means "no such corpus".
#[derive(Debug, Clone, Default)]
pub struct CorpusSet {
    files: [Option<Vec<PathBuf>>; 3],
}

impl CorpusSet {
    pub fn get(&self, role: CorpusRole) -> Option<&[PathBuf]> {
        self.files[role.index()].as_deref()
    }

    pub fn set(&mut self, role: CorpusRole, files: Vec<PathBuf>) {
        self.files[role.index()] = Some(files);
    }

    pub fn iter(&self) -> impl Iterator<Item = (CorpusRole, &[PathBuf])> + '_ {
        CorpusRole::ALL
            .into_iter()
            .filter_map(move |role| self.get(role).map(|files| (role, files)))
    }
}
