//! Command-line surface.
use clap::Parser;
use corpus_core::config::{
    FilterOptions, LengthBounds, SplitSizes, VocabLimits, DEFAULT_SCRIPTS_DIR, DEFAULT_THREADS,
    DEFAULT_UNK_SYMBOL,
};
use corpus_core::{CorpusError, PipelineConfig, Result, StageFailurePolicy};
use std::path::PathBuf;

/// Overrides the default scripts directory when `--scripts` is absent.
pub const SCRIPTS_ENV: &str = "PREPARE_DATA_SCRIPTS";

const LONG_ABOUT: &str = "\
Apply any number of those pre-processing steps to given corpus:
Tokenization, lowercasing, shuffling, filtering of lines according to length,
splitting into train/dev/test, punctuation and digit normalization.

A corpus `data/news` with extensions `en fr` is the pair of files
`data/news.en` and `data/news.fr`.";

/// Options a `--config` file already carries.
const PIPELINE_FLAGS: [&str; 20] = [
    "dev_corpus",
    "test_corpus",
    "scripts",
    "dev_size",
    "test_size",
    "train_size",
    "lang",
    "normalize_punk",
    "normalize_digits",
    "lowercase",
    "shuffle",
    "seed",
    "tokenize",
    "min",
    "max",
    "threads",
    "min_count",
    "max_vocab_size",
    "unk_symbol",
    "strict_stages",
];

#[derive(Parser, Debug)]
#[command(name = "prepare-data", version, about, long_about = LONG_ABOUT)]
pub struct Cli {
    /// Training corpus (path without extension)
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    pub corpus: Option<PathBuf>,

    /// Destination corpus (path without extension)
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    pub output_corpus: Option<PathBuf>,

    /// List of extensions
    #[arg(required_unless_present = "config", conflicts_with = "config")]
    pub extensions: Vec<String>,

    /// Development corpus
    #[arg(long)]
    pub dev_corpus: Option<PathBuf>,

    /// Test corpus
    #[arg(long)]
    pub test_corpus: Option<PathBuf>,

    /// Path to the filter script directory (empty to look up in $PATH)
    #[arg(long)]
    pub scripts: Option<String>,

    /// Size of the development corpus carved out of the training corpus
    #[arg(long, default_value_t = 0)]
    pub dev_size: usize,

    /// Size of the test corpus carved out of the training corpus
    #[arg(long, default_value_t = 0)]
    pub test_size: usize,

    /// Size of the training corpus (default: whatever remains)
    #[arg(long)]
    pub train_size: Option<usize>,

    /// Language codes, one per extension (when different from the extensions)
    #[arg(long, num_args = 1..)]
    pub lang: Vec<String>,

    /// Normalize punctuation
    #[arg(long)]
    pub normalize_punk: bool,

    /// Normalize digits (replace all digits with 0)
    #[arg(long)]
    pub normalize_digits: bool,

    /// Put everything to lowercase
    #[arg(long)]
    pub lowercase: bool,

    /// Shuffle the corpus
    #[arg(long)]
    pub shuffle: bool,

    /// Seed for --shuffle
    #[arg(long)]
    pub seed: Option<u64>,

    /// Tokenize the corpus
    #[arg(long)]
    pub tokenize: bool,

    /// Min number of tokens per line
    #[arg(long, default_value_t = 1)]
    pub min: usize,

    /// Max number of tokens per line (0 for no limit)
    #[arg(long, default_value_t = 0)]
    pub max: usize,

    /// Number of threads for the tokenizer
    #[arg(long, default_value_t = DEFAULT_THREADS)]
    pub threads: usize,

    /// Replace words seen fewer times than this in the training corpus
    #[arg(long, default_value_t = 0)]
    pub min_count: usize,

    /// Keep at most this many words per language (0 for no limit)
    #[arg(long, default_value_t = 0)]
    pub max_vocab_size: usize,

    /// Symbol replacing out-of-vocabulary words
    #[arg(long, default_value = DEFAULT_UNK_SYMBOL)]
    pub unk_symbol: String,

    /// Fail when any filter of a chain exits non-zero, not only the last one
    #[arg(long)]
    pub strict_stages: bool,

    /// Load the whole configuration from a YAML file
    #[arg(long, conflicts_with_all = PIPELINE_FLAGS)]
    pub config: Option<PathBuf>,

    /// Print the resolved configuration as YAML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Write a JSON report of the outputs to this path
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// Verbose mode (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

impl Cli {
    /// Builds the resolved configuration. Nothing is read besides `--config`.
    pub fn into_config(self) -> Result<PipelineConfig> {
        if let Some(path) = &self.config {
            let yaml = std::fs::read_to_string(path).map_err(|e| CorpusError::io(path, e))?;
            return PipelineConfig::from_yaml(&yaml)?.resolve();
        }

        let scripts = self
            .scripts
            .map(PathBuf::from)
            .or_else(|| std::env::var_os(SCRIPTS_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SCRIPTS_DIR));

        let (Some(corpus), Some(output_corpus)) = (self.corpus, self.output_corpus) else {
            return Err(CorpusError::Config(
                "corpus and output corpus are required".to_string(),
            ));
        };

        let config = PipelineConfig {
            corpus,
            output_corpus,
            extensions: self.extensions,
            langs: self.lang,
            dev_corpus: self.dev_corpus,
            test_corpus: self.test_corpus,
            filters: FilterOptions {
                normalize_punk: self.normalize_punk,
                tokenize: self.tokenize,
                lowercase: self.lowercase,
                normalize_digits: self.normalize_digits,
                threads: self.threads,
                scripts: if scripts.as_os_str().is_empty() {
                    None
                } else {
                    Some(scripts)
                },
            },
            bounds: LengthBounds::new(self.min, self.max),
            shuffle: self.shuffle,
            seed: self.seed,
            sizes: SplitSizes {
                dev: self.dev_size,
                test: self.test_size,
                train: self.train_size,
            },
            vocab: VocabLimits {
                min_count: self.min_count,
                max_vocab_size: self.max_vocab_size,
                unk_symbol: self.unk_symbol,
            },
            failure_policy: if self.strict_stages {
                StageFailurePolicy::Strict
            } else {
                StageFailurePolicy::Permissive
            },
        };

        config.resolve()
    }
}
