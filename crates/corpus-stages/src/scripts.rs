use corpus_core::Stage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Where the filter scripts live. `None` leaves lookup to `$PATH`.
#[derive(Debug, Clone, Default)]
pub struct ScriptsDir(Option<PathBuf>);

impl ScriptsDir {
    pub fn new(dir: Option<&Path>) -> Self {
        Self(dir.map(Path::to_path_buf))
    }

    pub fn resolve(&self, script: &str) -> OsString {
        match &self.0 {
            Some(dir) => dir.join(script).into_os_string(),
            None => OsString::from(script),
        }
    }
}

/// `normalize-punctuation.perl -l <lang>`
#[derive(Debug, Clone)]
pub struct NormalizePunctuationStage {
    program: OsString,
    lang: String,
}

impl NormalizePunctuationStage {
    pub const SCRIPT: &'static str = "normalize-punctuation.perl";

    pub fn new(scripts: &ScriptsDir, lang: impl Into<String>) -> Self {
        Self {
            program: scripts.resolve(Self::SCRIPT),
            lang: lang.into(),
        }
    }
}

impl Stage for NormalizePunctuationStage {
    fn id(&self) -> &str {
        "normalize-punk"
    }

    fn program(&self) -> OsString {
        self.program.clone()
    }

    fn args(&self) -> Vec<OsString> {
        vec!["-l".into(), self.lang.clone().into()]
    }
}

/// `tokenizer.perl -l <lang> -threads <n>`
#[derive(Debug, Clone)]
pub struct TokenizerStage {
    program: OsString,
    lang: String,
    threads: usize,
}

impl TokenizerStage {
    pub const SCRIPT: &'static str = "tokenizer.perl";

    pub fn new(scripts: &ScriptsDir, lang: impl Into<String>, threads: usize) -> Self {
        Self {
            program: scripts.resolve(Self::SCRIPT),
            lang: lang.into(),
            threads,
        }
    }
}

impl Stage for TokenizerStage {
    fn id(&self) -> &str {
        "tokenize"
    }

    fn program(&self) -> OsString {
        self.program.clone()
    }

    fn args(&self) -> Vec<OsString> {
        vec![
            "-l".into(),
            self.lang.clone().into(),
            "-threads".into(),
            self.threads.to_string().into(),
        ]
    }
}

/// `lowercase.perl`
#[derive(Debug, Clone)]
pub struct LowercaseStage {
    program: OsString,
}

impl LowercaseStage {
    pub const SCRIPT: &'static str = "lowercase.perl";

    pub fn new(scripts: &ScriptsDir) -> Self {
        Self {
            program: scripts.resolve(Self::SCRIPT),
        }
    }
}

impl Stage for LowercaseStage {
    fn id(&self) -> &str {
        "lowercase"
    }

    fn program(&self) -> OsString {
        self.program.clone()
    }
}
