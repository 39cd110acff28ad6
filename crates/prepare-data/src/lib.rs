//! prepare-data: turns raw parallel corpora into cleaned train/dev/test splits.
pub mod cli;
pub mod finalize;
pub mod logging;
pub mod pipeline;

pub use cli::Cli;
pub use pipeline::{Pipeline, RunState};

use corpus_core::{PipelineConfig, Result, RunReport};

/// Runs the whole pipeline for an already resolved configuration.
pub async fn run(config: PipelineConfig) -> Result<RunReport> {
    Pipeline::new(config)?.run().await
}
