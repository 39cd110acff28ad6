//! Pipeline driver: one run from raw corpora to finalized outputs.
//!
//! ```text
//! Configured → Staged → Synchronized → [Split] → [VocabFiltered] → Finalized
//!                        any error → Failed
//! ```
//!
//! Every intermediate file lives in the run's [`ScratchSpace`], which is
//! released after the run body returns, whatever the outcome.
use crate::finalize::{commit_outputs, stage_output};
use corpus_core::corpus::{parallel_files, with_suffix};
use corpus_core::text::{count_lines, LineWriter};
use corpus_core::vocab::Vocabulary;
use corpus_core::{
    apply_vocabulary, build_vocabulary, split, synchronize, CorpusError, CorpusRole, CorpusSet,
    Order, PipelineConfig, Result, RunReport, ScratchSpace,
};
use corpus_stages::chain_for;
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Configured,
    Staged,
    Synchronized,
    Split,
    VocabFiltered,
    Finalized,
    Failed,
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Self::Configured => "CONFIGURED",
            Self::Staged => "STAGED",
            Self::Synchronized => "SYNCHRONIZED",
            Self::Split => "SPLIT",
            Self::VocabFiltered => "VOCAB-FILTERED",
            Self::Finalized => "FINALIZED",
            Self::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

pub struct Pipeline {
    config: PipelineConfig,
    scratch: ScratchSpace,
    state: RunState,
}

impl Pipeline {
    /// Validates `config`; nothing is read or written yet.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        Ok(Self {
            config: config.resolve()?,
            scratch: ScratchSpace::new(),
            state: RunState::Configured,
        })
    }

    /// Puts scratch files under `dir` instead of the system temp directory.
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch = ScratchSpace::in_dir(dir);
        self
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Runs every stage, then releases all scratch files.
    pub async fn run(&mut self) -> Result<RunReport> {
        let result = self.execute().await;

        if let Err(e) = &result {
            tracing::error!("run failed in state {}: {}", self.state, e);
            self.transition(RunState::Failed);
        }

        tracing::info!("removing temporary files");
        self.scratch.release_all();

        result
    }

    async fn execute(&mut self) -> Result<RunReport> {
        self.check_inputs()?;
        self.prepare_output_dir()?;

        let mut report = RunReport::start(chain_for(&self.config, 0).chain_id());
        tracing::info!("run {} started", report.run_id);

        let mut corpora = CorpusSet::default();
        for role in CorpusRole::ALL {
            if let Some(base) = self.input_base(role) {
                let files = self.process_corpus(role, &base).await?;
                corpora.set(role, files);
            }
        }

        if let Some(requests) = self.config.split_requests() {
            tracing::info!("splitting files");
            let train = corpora
                .get(CorpusRole::Train)
                .ok_or_else(|| CorpusError::Config("no training corpus to split".to_string()))?
                .to_vec();

            for partition in split(&train, &requests, &self.scratch)? {
                if let (Some(role), Some(files)) = (CorpusRole::from_name(&partition.name), partition.files) {
                    corpora.set(role, files);
                }
            }
            self.transition(RunState::Split);
        }

        if self.config.vocab.is_active() {
            corpora = self.filter_vocabulary(&corpora)?;
            self.transition(RunState::VocabFiltered);
        }

        self.finalize(&corpora, &mut report)?;
        report.finish();
        self.transition(RunState::Finalized);

        Ok(report)
    }

    fn transition(&mut self, next: RunState) {
        tracing::info!("{} → {}", self.state, next);
        self.state = next;
    }

    fn input_base(&self, role: CorpusRole) -> Option<PathBuf> {
        match role {
            CorpusRole::Train => Some(self.config.corpus.clone()),
            CorpusRole::Dev => self.config.dev_corpus.clone(),
            CorpusRole::Test => self.config.test_corpus.clone(),
        }
    }

    /// Every declared corpus file must exist before anything is spawned.
    fn check_inputs(&self) -> Result<()> {
        for role in CorpusRole::ALL {
            if let Some(base) = self.input_base(role) {
                for path in parallel_files(&base, &self.config.extensions) {
                    if !path.is_file() {
                        return Err(CorpusError::MissingInput(path));
                    }
                }
            }
        }
        Ok(())
    }

    fn prepare_output_dir(&self) -> Result<()> {
        match self.config.output_corpus.parent() {
            Some(dir) if !dir.as_os_str().is_empty() && !dir.exists() => {
                tracing::info!("creating directory {}", dir.display());
                std::fs::create_dir_all(dir).map_err(|e| CorpusError::io(dir, e))
            }
            _ => Ok(()),
        }
    }

    /// Chains every extension of one corpus, then synchronizes the results.
    async fn process_corpus(&mut self, role: CorpusRole, base: &Path) -> Result<Vec<PathBuf>> {
        let mut staged = Vec::with_capacity(self.config.extensions.len());

        for (index, ext) in self.config.extensions.iter().enumerate() {
            let input = with_suffix(base, ext);
            tracing::info!("processing {}", input.display());

            let output = self.scratch.acquire_one()?;
            staged.push(chain_for(&self.config, index).run(&input, output).await?);
        }
        self.transition(RunState::Staged);

        let outputs = self.scratch.acquire(staged.len())?;
        let order = Order::from_flags(self.config.shuffle, self.config.seed);
        let (files, kept) = synchronize(&staged, &self.config.bounds, order, outputs)?;

        tracing::info!("{} corpus: {} sentence groups kept", role, kept);
        self.transition(RunState::Synchronized);
        Ok(files)
    }

    /// Vocabularies come from the final training files, one per extension.
    fn filter_vocabulary(&self, corpora: &CorpusSet) -> Result<CorpusSet> {
        let limits = &self.config.vocab;
        let train = corpora
            .get(CorpusRole::Train)
            .ok_or_else(|| CorpusError::Config("no training corpus for vocabulary".to_string()))?;

        let vocabs = train
            .iter()
            .map(|path| build_vocabulary(path, limits.min_count, limits.max_vocab_size))
            .collect::<Result<Vec<Vocabulary>>>()?;

        let mut filtered = CorpusSet::default();
        for (role, files) in corpora.iter() {
            let mut outputs = Vec::with_capacity(files.len());
            for (input, vocab) in files.iter().zip(&vocabs) {
                let (file, path) = self.scratch.acquire_one()?.into_parts();
                let (path, _) = apply_vocabulary(
                    input,
                    LineWriter::new(file, path),
                    vocab,
                    &limits.unk_symbol,
                )?;
                outputs.push(path);
            }
            filtered.set(role, outputs);
        }

        Ok(filtered)
    }

    /// Stages every output beside its destination before renaming any of
    /// them, so a failure leaves none of the final paths written.
    fn finalize(&self, corpora: &CorpusSet, report: &mut RunReport) -> Result<()> {
        let mut staged = Vec::new();
        let mut roles = Vec::new();

        for (role, files) in corpora.iter() {
            let base = role.output_base(&self.config.output_corpus);
            let destinations = parallel_files(&base, &self.config.extensions);

            for (source, destination) in files.iter().zip(&destinations) {
                staged.push(stage_output(source, destination, &self.scratch)?);
                roles.push(role);
            }
        }

        commit_outputs(&staged)?;

        for (role, output) in roles.into_iter().zip(&staged) {
            let lines = count_lines(&output.destination)?;
            tracing::info!("wrote {} ({} lines)", output.destination.display(), lines);
            report.record(role, &output.destination, lines)?;
        }
        Ok(())
    }
}
