//! End-to-end runs of the pipeline on small corpora.
//!
//! Only `cat` and `sed` are spawned, so these tests need no filter scripts.

use corpus_core::config::LengthBounds;
use corpus_core::{CorpusError, CorpusRole, PipelineConfig};
use prepare_data::{Pipeline, RunState};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

struct Workspace {
    data: TempDir,
    scratch: TempDir,
}

impl Workspace {
    fn new() -> Self {
        Self {
            data: tempfile::tempdir().unwrap(),
            scratch: tempfile::tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.data.path().join(name)
    }

    fn write(&self, name: &str, lines: &[String]) {
        let mut content = lines.join("\n");
        content.push('\n');
        fs::write(self.path(name), content).unwrap();
    }

    fn config(&self, exts: &[&str]) -> PipelineConfig {
        let mut config = PipelineConfig::new(
            self.path("train"),
            self.path("out/corpus"),
            exts.iter().map(|e| e.to_string()).collect(),
        );
        config.filters.scripts = None;
        config
    }

    fn pipeline(&self, config: PipelineConfig) -> Pipeline {
        Pipeline::new(config)
            .unwrap()
            .with_scratch_dir(self.scratch.path())
    }

    fn scratch_is_empty(&self) -> bool {
        fs::read_dir(self.scratch.path()).unwrap().next().is_none()
    }
}

fn lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(str::to_string)
        .collect()
}

fn numbered(prefix: &str, n: usize) -> Vec<String> {
    (1..=n).map(|i| format!("{prefix} sentence {i}")).collect()
}

// =============================================================================
// Length filtering
// =============================================================================

#[tokio::test]
async fn test_length_filter_keeps_only_in_bounds_line() {
    let ws = Workspace::new();
    ws.write(
        "train.en",
        &[
            "one".to_string(),
            "one two three four five".to_string(),
            vec!["w"; 60].join(" "),
        ],
    );

    let mut config = ws.config(&["en"]);
    config.bounds = LengthBounds::new(2, 50);

    let mut pipeline = ws.pipeline(config);
    pipeline.run().await.unwrap();

    assert_eq!(lines(&ws.path("out/corpus.en")), vec!["one two three four five"]);
    assert_eq!(pipeline.state(), RunState::Finalized);
    assert!(ws.scratch_is_empty());
}

// =============================================================================
// Splitting
// =============================================================================

#[tokio::test]
async fn test_split_into_dev_test_train_stays_aligned() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("en", 100));
    ws.write("train.fr", &numbered("fr", 100));

    let mut config = ws.config(&["en", "fr"]);
    config.sizes.dev = 10;
    config.sizes.test = 5;

    let report = ws.pipeline(config).run().await.unwrap();

    for ext in ["en", "fr"] {
        let dev = lines(&ws.path(&format!("out/corpus.dev.{ext}")));
        let test = lines(&ws.path(&format!("out/corpus.test.{ext}")));
        let train = lines(&ws.path(&format!("out/corpus.{ext}")));

        assert_eq!(dev, numbered(ext, 10));
        assert_eq!(test, numbered(ext, 15)[10..].to_vec());
        assert_eq!(train, numbered(ext, 100)[15..].to_vec());
    }

    assert_eq!(report.outputs.len(), 6);
    let dev_lines: Vec<_> = report
        .outputs
        .iter()
        .filter(|o| o.role == CorpusRole::Dev)
        .map(|o| o.lines)
        .collect();
    assert_eq!(dev_lines, vec![10, 10]);
    assert!(ws.scratch_is_empty());
}

#[tokio::test]
async fn test_train_size_leaves_tail_unused() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("en", 30));

    let mut config = ws.config(&["en"]);
    config.sizes.dev = 5;
    config.sizes.train = Some(10);

    ws.pipeline(config).run().await.unwrap();

    assert_eq!(lines(&ws.path("out/corpus.dev.en")).len(), 5);
    assert_eq!(lines(&ws.path("out/corpus.en")), numbered("en", 15)[5..].to_vec());
    assert!(!ws.path("out/corpus.test.en").exists());
}

#[tokio::test]
async fn test_explicit_dev_corpus_is_processed_not_split() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("train", 20));
    ws.write("held.en", &numbered("held", 4));

    let mut config = ws.config(&["en"]);
    config.dev_corpus = Some(ws.path("held"));
    config.sizes.dev = 10;

    ws.pipeline(config).run().await.unwrap();

    assert_eq!(lines(&ws.path("out/corpus.dev.en")), numbered("held", 4));
    assert_eq!(lines(&ws.path("out/corpus.en")), numbered("train", 20));
}

// =============================================================================
// Shuffling
// =============================================================================

#[tokio::test]
async fn test_shuffle_keeps_sentence_pairs_together() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("en", 50));
    ws.write("train.fr", &numbered("fr", 50));

    let mut config = ws.config(&["en", "fr"]);
    config.shuffle = true;
    config.seed = Some(11);

    ws.pipeline(config).run().await.unwrap();

    let en = lines(&ws.path("out/corpus.en"));
    let fr = lines(&ws.path("out/corpus.fr"));
    assert_eq!(en.len(), 50);
    assert_ne!(en, numbered("en", 50));

    for (e, f) in en.iter().zip(&fr) {
        assert_eq!(e.trim_start_matches("en "), f.trim_start_matches("fr "));
    }
}

// =============================================================================
// Stage chains
// =============================================================================

#[tokio::test]
async fn test_digit_normalization_applies_to_every_corpus() {
    let ws = Workspace::new();
    ws.write("train.en", &["room 101".to_string(), "year 2014".to_string()]);
    ws.write("test.en", &["call 911".to_string()]);

    let mut config = ws.config(&["en"]);
    config.test_corpus = Some(ws.path("test"));
    config.filters.normalize_digits = true;

    ws.pipeline(config).run().await.unwrap();

    assert_eq!(lines(&ws.path("out/corpus.en")), vec!["room 000", "year 0000"]);
    assert_eq!(lines(&ws.path("out/corpus.test.en")), vec!["call 000"]);
}

#[tokio::test]
async fn test_no_filters_no_bounds_copies_corpus() {
    let ws = Workspace::new();
    let content = "first line\n\n  spaced  out  \nlast\n";
    fs::write(ws.path("train.en"), content).unwrap();

    let mut config = ws.config(&["en"]);
    config.bounds = LengthBounds::new(0, 0);

    ws.pipeline(config).run().await.unwrap();

    assert_eq!(fs::read_to_string(ws.path("out/corpus.en")).unwrap(), content);
}

// =============================================================================
// Vocabulary
// =============================================================================

#[tokio::test]
async fn test_vocabulary_from_train_applies_to_dev() {
    let ws = Workspace::new();
    ws.write(
        "train.en",
        &[
            "the cat sat".to_string(),
            "the cat ran".to_string(),
            "a dog sat".to_string(),
        ],
    );
    ws.write("train.fr", &["le chat".to_string(), "le chat".to_string(), "un chien".to_string()]);
    ws.write("dev.en", &["the bird sat".to_string()]);
    ws.write("dev.fr", &["le oiseau".to_string()]);

    let mut config = ws.config(&["en", "fr"]);
    config.dev_corpus = Some(ws.path("dev"));
    config.vocab.min_count = 2;

    let mut pipeline = ws.pipeline(config);
    pipeline.run().await.unwrap();

    assert_eq!(
        lines(&ws.path("out/corpus.en")),
        vec!["the cat sat", "the cat <UNK>", "<UNK> <UNK> sat"]
    );
    assert_eq!(
        lines(&ws.path("out/corpus.fr")),
        vec!["le chat", "le chat", "<UNK> <UNK>"]
    );
    assert_eq!(lines(&ws.path("out/corpus.dev.en")), vec!["the <UNK> sat"]);
    assert_eq!(lines(&ws.path("out/corpus.dev.fr")), vec!["le <UNK>"]);
    assert_eq!(pipeline.state(), RunState::Finalized);
}

#[tokio::test]
async fn test_custom_unk_symbol_and_cap() {
    let ws = Workspace::new();
    ws.write("train.en", &["b a a c c c".to_string()]);

    let mut config = ws.config(&["en"]);
    config.vocab.max_vocab_size = 1;
    config.vocab.unk_symbol = "<oov>".to_string();

    ws.pipeline(config).run().await.unwrap();

    assert_eq!(lines(&ws.path("out/corpus.en")), vec!["<oov> <oov> <oov> c c c"]);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test]
async fn test_missing_input_fails_and_cleans_up() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("en", 3));

    let mut pipeline = ws.pipeline(ws.config(&["en", "fr"]));
    let err = pipeline.run().await.unwrap_err();

    match err {
        CorpusError::MissingInput(path) => assert_eq!(path, ws.path("train.fr")),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(!ws.path("out/corpus.en").exists());
    assert!(ws.scratch_is_empty());
}

#[tokio::test]
async fn test_failing_chain_leaves_no_final_output() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("en", 3));

    let mut config = ws.config(&["en"]);
    config.filters.lowercase = true;
    config.filters.scripts = Some(ws.path("no-such-scripts-dir"));

    let mut pipeline = ws.pipeline(config);
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, CorpusError::Spawn { .. }));
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(!ws.path("out/corpus.en").exists());
    assert!(ws.scratch_is_empty());
}

#[tokio::test]
async fn test_unwritable_destination_leaves_no_partial_corpus() {
    let ws = Workspace::new();
    ws.write("train.en", &numbered("en", 5));
    ws.write("train.fr", &numbered("fr", 5));
    fs::create_dir_all(ws.path("out/corpus.fr")).unwrap();

    let mut pipeline = ws.pipeline(ws.config(&["en", "fr"]));
    let err = pipeline.run().await.unwrap_err();

    assert!(matches!(err, CorpusError::Io { .. }));
    assert_eq!(pipeline.state(), RunState::Failed);
    assert!(!ws.path("out/corpus.en").exists());

    let left: Vec<_> = fs::read_dir(ws.path("out"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name())
        .collect();
    assert_eq!(left, vec!["corpus.fr"]);
    assert!(ws.scratch_is_empty());
}

#[test]
fn test_lang_mismatch_rejected_before_run() {
    let ws = Workspace::new();
    let mut config = ws.config(&["en", "fr"]);
    config.langs = vec!["en".to_string(), "fr".to_string(), "de".to_string()];

    let err = Pipeline::new(config).err().unwrap();
    assert!(err.is_config());
    assert!(!ws.path("out").exists());
}
