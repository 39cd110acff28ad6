//! Corpus Core: stage chains, scratch space and the parallel corpus passes.
//!
//! Every pass keeps the N files of a corpus line-aligned: line *i* of each
//! file belongs to the same sentence group, before and after the pass.

pub mod config;
pub mod corpus;
pub mod error;
pub mod report;
pub mod runner;
pub mod scratch;
pub mod split;
pub mod stage;
pub mod sync;
pub mod text;
pub mod vocab;

pub use config::{LengthBounds, PipelineConfig, StageFailurePolicy};
pub use corpus::{CorpusRole, CorpusSet};
pub use error::{CorpusError, Result};
pub use report::RunReport;
pub use runner::ChainRunner;
pub use scratch::{ScratchFile, ScratchSpace};
pub use split::{split, Partition, SplitRequest, SplitSize};
pub use stage::{CommandStage, Passthrough, Stage};
pub use sync::{synchronize, Order, ParallelLines};
pub use vocab::{apply_vocabulary, build_vocabulary, Vocabulary};
