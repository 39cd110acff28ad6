//! Vocabulary Builder & Filter.
//!
//! A vocabulary is computed per extension from the final training file and
//! used to rewrite that extension's train, dev and test files.
use crate::error::Result;
use crate::text::{tokens, trim_newline, LineReader, LineWriter};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Token counts in first-encounter order.
pub type FrequencyTable = IndexMap<Vec<u8>, usize>;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Vocabulary {
    words: HashSet<Vec<u8>>,
}

impl Vocabulary {
    pub fn from_tokens<I, T>(tokens: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: AsRef<[u8]>,
    {
        Self {
            words: tokens.into_iter().map(|t| t.as_ref().to_vec()).collect(),
        }
    }

    pub fn contains(&self, token: &[u8]) -> bool {
        self.words.contains(token)
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }
}

pub fn frequency_table(path: &Path) -> Result<FrequencyTable> {
    let mut counts = FrequencyTable::new();
    for line in LineReader::open(path)? {
        for token in tokens(&line?) {
            *counts.entry(token.to_vec()).or_insert(0) += 1;
        }
    }
    Ok(counts)
}

/// Tokens seen at least `min_count` times, capped to the `max_vocab_size`
/// most frequent when the cap is non-zero and exceeded.
///
/// Equal counts keep first-encounter order: the table is ordered by first
/// occurrence and the sort is stable.
pub fn select_vocabulary(counts: &FrequencyTable, min_count: usize, max_vocab_size: usize) -> Vocabulary {
    let mut words: Vec<(&Vec<u8>, usize)> = counts
        .iter()
        .filter(|(_, count)| **count >= min_count)
        .map(|(word, &count)| (word, count))
        .collect();

    if max_vocab_size > 0 && max_vocab_size < words.len() {
        words.sort_by(|a, b| b.1.cmp(&a.1));
        words.truncate(max_vocab_size);
    }

    Vocabulary::from_tokens(words.into_iter().map(|(word, _)| word))
}

pub fn build_vocabulary(path: &Path, min_count: usize, max_vocab_size: usize) -> Result<Vocabulary> {
    let counts = frequency_table(path)?;
    let vocab = select_vocabulary(&counts, min_count, max_vocab_size);

    tracing::info!(
        "vocabulary of {}: {} of {} distinct tokens kept",
        path.display(),
        vocab.len(),
        counts.len()
    );
    Ok(vocab)
}

/// Rewrites one line: tokens joined by single spaces, OOV tokens replaced.
pub fn filter_line(line: &[u8], vocab: &Vocabulary, unk_symbol: &str) -> Vec<u8> {
    let mut out = Vec::with_capacity(line.len());
    for (i, token) in tokens(line).enumerate() {
        if i > 0 {
            out.push(b' ');
        }
        if vocab.contains(token) {
            out.extend_from_slice(token);
        } else {
            out.extend_from_slice(unk_symbol.as_bytes());
        }
    }
    out
}

/// Rewrites `input` into `output` line by line. Returns the line count.
pub fn apply_vocabulary(
    input: &Path,
    mut output: LineWriter,
    vocab: &Vocabulary,
    unk_symbol: &str,
) -> Result<(PathBuf, usize)> {
    let mut lines = 0;
    for line in LineReader::open(input)? {
        let line = line?;
        output.write_line(&filter_line(trim_newline(&line), vocab, unk_symbol))?;
        lines += 1;
    }
    Ok((output.finish()?, lines))
}
