//! Run Report: what a finished run wrote, with content hashes.
use crate::corpus::CorpusRole;
use crate::error::{CorpusError, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Stage chain applied to every file (ex: "copy→tokenize→lowercase").
    pub chain: String,
    pub outputs: Vec<OutputRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputRecord {
    pub role: CorpusRole,
    pub path: PathBuf,
    pub lines: usize,
    pub hash: String,
}

impl RunReport {
    pub fn start(chain: impl Into<String>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            started_at: Utc::now(),
            finished_at: None,
            chain: chain.into(),
            outputs: Vec::new(),
        }
    }

    /// Records a finalized output file.
    pub fn record(&mut self, role: CorpusRole, path: &Path, lines: usize) -> Result<()> {
        self.outputs.push(OutputRecord {
            role,
            path: path.to_path_buf(),
            lines,
            hash: hash_file(path)?,
        });
        Ok(())
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| CorpusError::Serialize(e.to_string()))
    }
}

pub fn hash_file(path: &Path) -> Result<String> {
    let mut file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
    let mut hasher = blake3::Hasher::new();
    std::io::copy(&mut file, &mut hasher).map_err(|e| CorpusError::io(path, e))?;
    Ok(format!("blake3:{}", hasher.finalize()))
}
