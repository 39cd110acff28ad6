//! Corpus Stages: the external text filters a chain can contain.
//!
//! # Chain Layout
//!
//! ```text
//! raw file → copy → [normalize-punk] → [tokenize] → [lowercase] → [normalize-digits] → output
//! ```
//!
//! Every filter is an external program reading stdin and writing one line
//! per input line on stdout. Only the language code differs between the
//! chains of a corpus's parallel files.

mod digits;
mod scripts;

pub use digits::NormalizeDigitsStage;
pub use scripts::{LowercaseStage, NormalizePunctuationStage, ScriptsDir, TokenizerStage};

use corpus_core::config::{FilterOptions, PipelineConfig};
use corpus_core::{ChainRunner, Stage};

/// Enabled filters for one file, in chain order. The passthrough stage is
/// added by the runner.
pub fn filter_stages(filters: &FilterOptions, lang: &str) -> Vec<Box<dyn Stage>> {
    let scripts = ScriptsDir::new(filters.scripts.as_deref());
    let mut stages: Vec<Box<dyn Stage>> = Vec::new();

    if filters.normalize_punk {
        stages.push(Box::new(NormalizePunctuationStage::new(&scripts, lang)));
    }
    if filters.tokenize {
        stages.push(Box::new(TokenizerStage::new(&scripts, lang, filters.threads)));
    }
    if filters.lowercase {
        stages.push(Box::new(LowercaseStage::new(&scripts)));
    }
    if filters.normalize_digits {
        stages.push(Box::new(NormalizeDigitsStage));
    }

    stages
}

/// Runner for the file of extension number `index`.
pub fn chain_for(config: &PipelineConfig, index: usize) -> ChainRunner {
    let lang = config.lang_for(index);
    let runner = ChainRunner::new(filter_stages(&config.filters, lang))
        .with_policy(config.failure_policy);

    tracing::debug!("chain for .{} ({}): {}", config.extensions[index], lang, runner.chain_id());
    runner
}
