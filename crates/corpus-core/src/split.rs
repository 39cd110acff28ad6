//! Splitter: carves ordered, aligned partitions out of N parallel files.
//!
//! Partitions consume the shared readers strictly in request order, so the
//! single `Remainder` request (if any) has to come last.
use crate::error::{CorpusError, Result};
use crate::scratch::ScratchSpace;
use crate::text::{LineReader, LineWriter};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitSize {
    /// At most this many lines. `Lines(0)` means the partition does not exist.
    Lines(usize),
    /// Everything left after the previous partitions.
    Remainder,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitRequest {
    pub name: String,
    pub size: SplitSize,
}

impl SplitRequest {
    pub fn new(name: impl Into<String>, size: SplitSize) -> Self {
        Self {
            name: name.into(),
            size,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partition {
    pub name: String,
    /// One file per input, or `None` for a zero-sized request.
    pub files: Option<Vec<PathBuf>>,
}

/// Rejects request lists where a remainder is not the last entry.
pub fn validate_requests(requests: &[SplitRequest]) -> Result<()> {
    let remainders = requests
        .iter()
        .filter(|r| r.size == SplitSize::Remainder)
        .count();

    if remainders > 1 {
        return Err(CorpusError::Config(
            "at most one partition may take the remainder".to_string(),
        ));
    }

    if remainders == 1 && requests.last().map(|r| r.size) != Some(SplitSize::Remainder) {
        return Err(CorpusError::Config(
            "the remainder partition must be requested last".to_string(),
        ));
    }

    Ok(())
}

pub fn split(
    inputs: &[PathBuf],
    requests: &[SplitRequest],
    scratch: &ScratchSpace,
) -> Result<Vec<Partition>> {
    validate_requests(requests)?;

    let mut readers = inputs
        .iter()
        .map(|path| LineReader::open(path))
        .collect::<Result<Vec<_>>>()?;

    let mut partitions = Vec::with_capacity(requests.len());

    for request in requests {
        let limit = match request.size {
            SplitSize::Lines(0) => {
                partitions.push(Partition {
                    name: request.name.clone(),
                    files: None,
                });
                continue;
            }
            SplitSize::Lines(lines) => Some(lines),
            SplitSize::Remainder => None,
        };

        let outputs = scratch.acquire(readers.len())?;
        let mut files = Vec::with_capacity(outputs.len());

        for (reader, output) in readers.iter_mut().zip(outputs) {
            let (file, path) = output.into_parts();
            let mut writer = LineWriter::new(file, path);
            let mut taken = 0;

            while limit.map_or(true, |limit| taken < limit) {
                match reader.next_line()? {
                    Some(line) => writer.write_raw(&line)?,
                    None => break,
                }
                taken += 1;
            }

            tracing::debug!(
                "{}: {} lines from {}",
                request.name,
                taken,
                reader.path().display()
            );
            files.push(writer.finish()?);
        }

        partitions.push(Partition {
            name: request.name.clone(),
            files: Some(files),
        });
    }

    Ok(partitions)
}
