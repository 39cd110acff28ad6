//! Unified Error Model
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorpusError {
    /// Rejected before any file is touched.
    #[error("CONFIG/{0}")]
    Config(String),

    #[error("INPUT/missing corpus file {}", .0.display())]
    MissingInput(PathBuf),

    #[error("IO/{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("SPAWN/{program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Terminal process of a chain exited non-zero. No stage attribution.
    #[error("CHAIN/processing {} failed ({status})", input.display())]
    ChainFailed { input: PathBuf, status: ExitStatus },

    #[error("STAGE/{stage} failed ({status})")]
    StageFailed { stage: String, status: ExitStatus },

    #[error("SERIALIZE/{0}")]
    Serialize(String),
}

impl CorpusError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Configuration problems are reported with their own exit code.
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

pub type Result<T> = std::result::Result<T, CorpusError>;
