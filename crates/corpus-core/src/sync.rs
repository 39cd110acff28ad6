//! Parallel Corpus Synchronizer.
//!
//! The N files of a corpus are read as one sequence of aligned tuples. A
//! tuple survives only if every member passes the length filter, so files
//! never drift out of alignment. Shuffling permutes whole tuples.
use crate::config::LengthBounds;
use crate::error::{CorpusError, Result};
use crate::scratch::ScratchFile;
use crate::text::{token_count, trim_newline, LineReader, LineWriter};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use std::path::PathBuf;

/// One line per parallel file, newline stripped.
pub type Tuple = Vec<Vec<u8>>;

/// Output ordering of the synchronized tuples.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Order {
    /// Input order, streamed with constant memory.
    #[default]
    Preserve,
    /// Uniform random permutation. Requires the whole corpus in memory.
    Shuffle { seed: Option<u64> },
}

impl Order {
    pub fn from_flags(shuffle: bool, seed: Option<u64>) -> Self {
        if shuffle {
            Self::Shuffle { seed }
        } else {
            Self::Preserve
        }
    }
}

/// Lazily zipped lines of N files. Finite, not restartable; stops at the
/// end of the shortest file.
pub struct ParallelLines {
    readers: Vec<LineReader>,
    done: bool,
}

impl ParallelLines {
    pub fn open(paths: &[PathBuf]) -> Result<Self> {
        let readers = paths
            .iter()
            .map(|path| LineReader::open(path))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self {
            readers,
            done: false,
        })
    }

    pub fn width(&self) -> usize {
        self.readers.len()
    }
}

impl Iterator for ParallelLines {
    type Item = Result<Tuple>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.readers.is_empty() {
            return None;
        }

        let mut tuple = Vec::with_capacity(self.readers.len());
        for reader in &mut self.readers {
            match reader.next_line() {
                Ok(Some(line)) => tuple.push(trim_newline(&line).to_vec()),
                Ok(None) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
        Some(Ok(tuple))
    }
}

/// True iff every member of the tuple has a token count within `bounds`.
pub fn within_bounds(tuple: &[Vec<u8>], bounds: &LengthBounds) -> bool {
    tuple.iter().all(|line| bounds.contains(token_count(line)))
}

/// Filters and optionally shuffles `inputs`, writing one file per input into
/// `outputs` (same order). Returns the output paths and the tuple count.
pub fn synchronize(
    inputs: &[PathBuf],
    bounds: &LengthBounds,
    order: Order,
    outputs: Vec<ScratchFile>,
) -> Result<(Vec<PathBuf>, usize)> {
    if inputs.len() != outputs.len() {
        return Err(CorpusError::Config(format!(
            "{} inputs but {} outputs",
            inputs.len(),
            outputs.len()
        )));
    }

    let tuples = ParallelLines::open(inputs)?
        .filter(|item| match item {
            Ok(tuple) => within_bounds(tuple, bounds),
            Err(_) => true,
        });

    let mut writers: Vec<LineWriter> = outputs
        .into_iter()
        .map(|scratch| {
            let (file, path) = scratch.into_parts();
            LineWriter::new(file, path)
        })
        .collect();

    let written = match order {
        Order::Preserve => write_tuples(&mut writers, tuples)?,
        Order::Shuffle { seed } => {
            let mut all = tuples.collect::<Result<Vec<Tuple>>>()?;
            let mut rng = match seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_entropy(),
            };
            all.shuffle(&mut rng);
            write_tuples(&mut writers, all.into_iter().map(Ok))?
        }
    };

    let paths = writers
        .into_iter()
        .map(LineWriter::finish)
        .collect::<Result<Vec<_>>>()?;

    Ok((paths, written))
}

fn write_tuples(
    writers: &mut [LineWriter],
    tuples: impl Iterator<Item = Result<Tuple>>,
) -> Result<usize> {
    let mut written = 0;
    for tuple in tuples {
        for (line, writer) in tuple?.iter().zip(writers.iter_mut()) {
            writer.write_line(line)?;
        }
        written += 1;
    }
    Ok(written)
}
