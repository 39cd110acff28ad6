//! Pipeline configuration: resolved once, immutable afterwards.
use crate::error::{CorpusError, Result};
use crate::split::{SplitRequest, SplitSize};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const DEFAULT_UNK_SYMBOL: &str = "<UNK>";
pub const DEFAULT_THREADS: usize = 16;
pub const DEFAULT_SCRIPTS_DIR: &str = "scripts";

/// Inclusive token-count bounds applied to every member of a tuple.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LengthBounds {
    pub min: usize,
    /// `None` means unbounded.
    pub max: Option<usize>,
}

impl LengthBounds {
    /// `max == 0` is the command-line spelling of "no limit".
    pub fn new(min: usize, max: usize) -> Self {
        Self {
            min,
            max: if max > 0 { Some(max) } else { None },
        }
    }

    pub fn contains(&self, tokens: usize) -> bool {
        tokens >= self.min && self.max.map_or(true, |max| tokens <= max)
    }
}

impl Default for LengthBounds {
    fn default() -> Self {
        Self { min: 1, max: None }
    }
}

/// What happens when a non-terminal stage of a chain exits non-zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StageFailurePolicy {
    /// Only the terminal process is awaited; upstream failures go unnoticed.
    #[default]
    Permissive,
    /// Every process is awaited and the first failing stage is reported.
    Strict,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterOptions {
    pub normalize_punk: bool,
    pub tokenize: bool,
    pub lowercase: bool,
    pub normalize_digits: bool,
    /// Tokenizer thread count.
    pub threads: usize,
    /// Directory holding the filter scripts; `None` resolves through `$PATH`.
    pub scripts: Option<PathBuf>,
}

impl Default for FilterOptions {
    fn default() -> Self {
        Self {
            normalize_punk: false,
            tokenize: false,
            lowercase: false,
            normalize_digits: false,
            threads: DEFAULT_THREADS,
            scripts: Some(PathBuf::from(DEFAULT_SCRIPTS_DIR)),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitSizes {
    /// `0` means no dev partition.
    pub dev: usize,
    /// `0` means no test partition.
    pub test: usize,
    /// `None` means the remainder of the file.
    pub train: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct VocabLimits {
    pub min_count: usize,
    /// `0` means no cap.
    pub max_vocab_size: usize,
    pub unk_symbol: String,
}

impl VocabLimits {
    pub fn is_active(&self) -> bool {
        self.min_count > 0 || self.max_vocab_size > 0
    }
}

impl Default for VocabLimits {
    fn default() -> Self {
        Self {
            min_count: 0,
            max_vocab_size: 0,
            unk_symbol: DEFAULT_UNK_SYMBOL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Training corpus, without extension.
    pub corpus: PathBuf,
    /// Destination corpus, without extension.
    pub output_corpus: PathBuf,
    pub extensions: Vec<String>,
    /// Language code per extension. Empty means "same as the extension".
    #[serde(default)]
    pub langs: Vec<String>,
    #[serde(default)]
    pub dev_corpus: Option<PathBuf>,
    #[serde(default)]
    pub test_corpus: Option<PathBuf>,
    #[serde(default)]
    pub filters: FilterOptions,
    #[serde(default)]
    pub bounds: LengthBounds,
    #[serde(default)]
    pub shuffle: bool,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub sizes: SplitSizes,
    #[serde(default)]
    pub vocab: VocabLimits,
    #[serde(default)]
    pub failure_policy: StageFailurePolicy,
}

impl PipelineConfig {
    pub fn new(
        corpus: impl Into<PathBuf>,
        output_corpus: impl Into<PathBuf>,
        extensions: Vec<String>,
    ) -> Self {
        Self {
            corpus: corpus.into(),
            output_corpus: output_corpus.into(),
            extensions,
            langs: Vec::new(),
            dev_corpus: None,
            test_corpus: None,
            filters: FilterOptions::default(),
            bounds: LengthBounds::default(),
            shuffle: false,
            seed: None,
            sizes: SplitSizes::default(),
            vocab: VocabLimits::default(),
            failure_policy: StageFailurePolicy::default(),
        }
    }

    /// Validates the options and fills in derived defaults.
    ///
    /// Everything rejected here is rejected before any file is opened.
    pub fn resolve(mut self) -> Result<Self> {
        if self.extensions.is_empty() {
            return Err(CorpusError::Config(
                "at least one extension is required".to_string(),
            ));
        }

        if self.langs.is_empty() {
            self.langs = self.extensions.clone();
        } else if self.langs.len() != self.extensions.len() {
            return Err(CorpusError::Config(format!(
                "wrong number of values for parameter --lang (expected {}, got {})",
                self.extensions.len(),
                self.langs.len()
            )));
        }

        if let Some(max) = self.bounds.max {
            if self.bounds.min > max {
                return Err(CorpusError::Config(format!(
                    "--min ({}) is greater than --max ({})",
                    self.bounds.min, max
                )));
            }
        }

        if self.sizes.train == Some(0) {
            return Err(CorpusError::Config(
                "--train-size must be positive (omit it to keep the remainder)".to_string(),
            ));
        }

        if self.vocab.unk_symbol.split_whitespace().count() != 1 {
            return Err(CorpusError::Config(format!(
                "--unk-symbol must be a single token, got {:?}",
                self.vocab.unk_symbol
            )));
        }

        Ok(self)
    }

    pub fn lang_for(&self, index: usize) -> &str {
        self.langs
            .get(index)
            .unwrap_or(&self.extensions[index])
    }

    /// Partitions carved out of the processed training corpus, in the order
    /// they must be consumed. `None` when no size was requested.
    ///
    /// A dev or test size is ignored when that corpus was given explicitly.
    pub fn split_requests(&self) -> Option<Vec<SplitRequest>> {
        let dev = if self.dev_corpus.is_none() { self.sizes.dev } else { 0 };
        let test = if self.test_corpus.is_none() { self.sizes.test } else { 0 };

        if dev == 0 && test == 0 && self.sizes.train.is_none() {
            return None;
        }

        let train = match self.sizes.train {
            Some(lines) => SplitSize::Lines(lines),
            None => SplitSize::Remainder,
        };

        Some(vec![
            SplitRequest::new("dev", SplitSize::Lines(dev)),
            SplitRequest::new("test", SplitSize::Lines(test)),
            SplitRequest::new("train", train),
        ])
    }

    pub fn from_yaml(yaml: &str) -> Result<Self> {
        serde_yaml::from_str(yaml).map_err(|e| CorpusError::Serialize(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).map_err(|e| CorpusError::Serialize(e.to_string()))
    }
}
