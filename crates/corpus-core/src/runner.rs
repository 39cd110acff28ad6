//! Chain Runner: wires stages into one OS pipeline per input file.
//!
//! ```text
//! input file → cat → stage 1 → ... → stage k → output file
//! ```
//!
//! Waits carry no timeout: a filter that never exits blocks the run.
use crate::config::StageFailurePolicy;
use crate::error::{CorpusError, Result};
use crate::scratch::ScratchFile;
use crate::stage::{Passthrough, Stage};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::{Child, Command};

pub struct ChainRunner {
    stages: Vec<Box<dyn Stage>>,
    chain_id: String,
    policy: StageFailurePolicy,
}

impl ChainRunner {
    /// The passthrough stage is always prepended.
    pub fn new(filters: Vec<Box<dyn Stage>>) -> Self {
        let mut stages: Vec<Box<dyn Stage>> = Vec::with_capacity(filters.len() + 1);
        stages.push(Box::new(Passthrough));
        stages.extend(filters);

        let chain_id = stages
            .iter()
            .map(|s| s.id())
            .collect::<Vec<_>>()
            .join("→");

        Self {
            stages,
            chain_id,
            policy: StageFailurePolicy::default(),
        }
    }

    pub fn with_policy(mut self, policy: StageFailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn chain_id(&self) -> &str {
        &self.chain_id
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Runs the chain on `input`, writing into a scratch file whose path is returned.
    pub async fn run(&self, input: &Path, output: ScratchFile) -> Result<PathBuf> {
        let (file, path) = output.into_parts();
        self.run_into(input, file).await?;
        Ok(path)
    }

    /// Runs the chain on `input`, writing the terminal stage's stdout to `output`.
    pub async fn run_into(&self, input: &Path, output: File) -> Result<()> {
        if !input.is_file() {
            return Err(CorpusError::MissingInput(input.to_path_buf()));
        }
        let source = File::open(input).map_err(|e| CorpusError::io(input, e))?;

        tracing::debug!("running chain {} on {}", self.chain_id, input.display());

        let (upstream, terminal) = self
            .stages
            .split_at(self.stages.len().saturating_sub(1));
        let terminal = match terminal.first() {
            Some(stage) => stage,
            None => return Err(CorpusError::Config("empty stage chain".to_string())),
        };

        let mut children: Vec<(&dyn Stage, Child)> = Vec::with_capacity(self.stages.len());
        let mut stdin = Stdio::from(source);

        for stage in upstream {
            let mut child = spawn(stage.as_ref(), stdin, Stdio::piped())?;
            let stdout = child.stdout.take().ok_or_else(|| CorpusError::Spawn {
                program: stage.describe(),
                source: io::Error::new(io::ErrorKind::BrokenPipe, "stdout was not captured"),
            })?;
            stdin = stdout.try_into().map_err(|e| CorpusError::Spawn {
                program: stage.describe(),
                source: e,
            })?;
            children.push((stage.as_ref(), child));
        }

        let last = spawn(terminal.as_ref(), stdin, Stdio::from(output))?;
        children.push((terminal.as_ref(), last));

        match self.policy {
            StageFailurePolicy::Permissive => self.wait_terminal(input, children).await,
            StageFailurePolicy::Strict => self.wait_all(children).await,
        }
    }

    /// Only the last process is observed; upstream exits are left unchecked.
    async fn wait_terminal(&self, input: &Path, mut children: Vec<(&dyn Stage, Child)>) -> Result<()> {
        let Some((stage, mut child)) = children.pop() else {
            return Ok(());
        };
        let status = child.wait().await.map_err(|e| CorpusError::Spawn {
            program: stage.describe(),
            source: e,
        })?;

        if status.success() {
            Ok(())
        } else {
            Err(CorpusError::ChainFailed {
                input: input.to_path_buf(),
                status,
            })
        }
    }

    async fn wait_all(&self, children: Vec<(&dyn Stage, Child)>) -> Result<()> {
        let mut first_failure = None;

        for (stage, mut child) in children {
            let status = child.wait().await.map_err(|e| CorpusError::Spawn {
                program: stage.describe(),
                source: e,
            })?;

            if !status.success() && first_failure.is_none() {
                first_failure = Some(CorpusError::StageFailed {
                    stage: stage.id().to_string(),
                    status,
                });
            }
        }

        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn spawn(stage: &dyn Stage, stdin: Stdio, stdout: Stdio) -> Result<Child> {
    tracing::debug!("spawning {}", stage.describe());

    Command::new(stage.program())
        .args(stage.args())
        .stdin(stdin)
        .stdout(stdout)
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| CorpusError::Spawn {
            program: stage.describe(),
            source: e,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stage::CommandStage;
    use std::fs;

    fn write_input(dir: &Path, content: &str) -> PathBuf {
        let path = dir.join("input.txt");
        fs::write(&path, content).unwrap();
        path
    }

    #[tokio::test]
    async fn test_empty_chain_copies_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let content = "Hello World\n  spaced   line \n\nno newline at end";
        let input = write_input(dir.path(), content);
        let out_path = dir.path().join("out.txt");

        let runner = ChainRunner::new(Vec::new());
        assert_eq!(runner.len(), 1);
        assert_eq!(runner.chain_id(), "copy");

        runner
            .run_into(&input, File::create(&out_path).unwrap())
            .await
            .unwrap();

        assert_eq!(fs::read(&out_path).unwrap(), content.as_bytes());
    }

    #[tokio::test]
    async fn test_stages_run_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "Room 101\nFLOOR 7\n");
        let out_path = dir.path().join("out.txt");

        let runner = ChainRunner::new(vec![
            Box::new(CommandStage::new("lowercase", "tr", ["A-Z", "a-z"])),
            Box::new(CommandStage::new("digits", "sed", ["s/[[:digit:]]/0/g"])),
        ]);
        assert_eq!(runner.chain_id(), "copy→lowercase→digits");

        runner
            .run_into(&input, File::create(&out_path).unwrap())
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&out_path).unwrap(), "room 000\nfloor 0\n");
    }

    #[tokio::test]
    async fn test_missing_input_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let out = File::create(dir.path().join("out.txt")).unwrap();

        let err = ChainRunner::new(Vec::new())
            .run_into(&dir.path().join("nope.en"), out)
            .await
            .unwrap_err();

        assert!(matches!(err, CorpusError::MissingInput(_)));
    }

    #[tokio::test]
    async fn test_terminal_failure_is_generic() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a\n");
        let out = File::create(dir.path().join("out.txt")).unwrap();

        let err = ChainRunner::new(vec![Box::new(CommandStage::new(
            "fails",
            "sh",
            ["-c", "cat >/dev/null; exit 3"],
        ))])
        .run_into(&input, out)
        .await
        .unwrap_err();

        assert!(matches!(err, CorpusError::ChainFailed { .. }));
    }

    #[tokio::test]
    async fn test_upstream_failure_ignored_when_permissive() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a\n");
        let out_path = dir.path().join("out.txt");

        let runner = ChainRunner::new(vec![
            Box::new(CommandStage::new("broken", "sh", ["-c", "cat >/dev/null; exit 1"])),
            Box::new(CommandStage::new("lowercase", "tr", ["A-Z", "a-z"])),
        ]);

        runner
            .run_into(&input, File::create(&out_path).unwrap())
            .await
            .unwrap();

        assert_eq!(fs::read_to_string(&out_path).unwrap(), "");
    }

    #[tokio::test]
    async fn test_upstream_failure_attributed_when_strict() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a\n");
        let out = File::create(dir.path().join("out.txt")).unwrap();

        let runner = ChainRunner::new(vec![
            Box::new(CommandStage::new("broken", "sh", ["-c", "cat >/dev/null; exit 1"])),
            Box::new(CommandStage::new("lowercase", "tr", ["A-Z", "a-z"])),
        ])
        .with_policy(StageFailurePolicy::Strict);

        match runner.run_into(&input, out).await.unwrap_err() {
            CorpusError::StageFailed { stage, .. } => assert_eq!(stage, "broken"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_unknown_program_fails_to_spawn() {
        let dir = tempfile::tempdir().unwrap();
        let input = write_input(dir.path(), "a\n");
        let out = File::create(dir.path().join("out.txt")).unwrap();

        let err = ChainRunner::new(vec![Box::new(CommandStage::new(
            "ghost",
            "/definitely/not/a/filter",
            Vec::<String>::new(),
        ))])
        .run_into(&input, out)
        .await
        .unwrap_err();

        assert!(matches!(err, CorpusError::Spawn { .. }));
    }
}
