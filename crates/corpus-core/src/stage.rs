//! Stage Trait: one external line-oriented text filter.
//!
//! A stage reads a line-delimited stream on stdin and writes exactly one
//! output line per input line on stdout.
use std::ffi::OsString;
use std::fmt;

pub trait Stage: Send + Sync {
    /// Stable identifier used in logs and strict-mode errors (ex: "tokenize").
    fn id(&self) -> &str;

    /// Program to spawn, either a bare name looked up in `$PATH` or a path.
    fn program(&self) -> OsString;

    fn args(&self) -> Vec<OsString> {
        Vec::new()
    }

    /// Shell-like rendering for logs.
    fn describe(&self) -> String {
        std::iter::once(self.program())
            .chain(self.args())
            .map(|part| part.to_string_lossy().into_owned())
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl fmt::Debug for dyn Stage {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Stage({}: {})", self.id(), self.describe())
    }
}

/// Identity stage. Every chain starts with it, so a chain with no filters
/// still produces a byte-identical copy of its input.
#[derive(Debug, Default, Clone, Copy)]
pub struct Passthrough;

impl Stage for Passthrough {
    fn id(&self) -> &str {
        "copy"
    }

    fn program(&self) -> OsString {
        OsString::from("cat")
    }
}

/// Arbitrary program + arguments.
#[derive(Debug, Clone)]
pub struct CommandStage {
    id: String,
    program: OsString,
    args: Vec<OsString>,
}

impl CommandStage {
    pub fn new<I, S>(id: impl Into<String>, program: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            id: id.into(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }
}

impl Stage for CommandStage {
    fn id(&self) -> &str {
        &self.id
    }

    fn program(&self) -> OsString {
        self.program.clone()
    }

    fn args(&self) -> Vec<OsString> {
        self.args.clone()
    }
}
