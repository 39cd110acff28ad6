//! Byte-level line and token helpers shared by the corpus passes.
//!
//! Corpora are handled as raw bytes: lines end at `\n`, tokens are separated
//! by ASCII whitespace (vertical tab included). Nothing here requires valid
//! UTF-8.
use crate::error::{CorpusError, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Space, `\t`, `\n`, `\x0b`, `\x0c` and `\r`.
pub fn is_separator(byte: u8) -> bool {
    byte.is_ascii_whitespace() || byte == b'\x0b'
}

/// Whitespace-delimited tokens of a line.
pub fn tokens(line: &[u8]) -> impl Iterator<Item = &[u8]> {
    line.split(|b| is_separator(*b))
        .filter(|token| !token.is_empty())
}

pub fn token_count(line: &[u8]) -> usize {
    tokens(line).count()
}

/// Line content without its `\n` terminator. A `\r` before it is content;
/// tokenization treats it as whitespace.
pub fn trim_newline(line: &[u8]) -> &[u8] {
    line.strip_suffix(b"\n").unwrap_or(line)
}

/// Reads raw lines, terminator included, from one file.
pub struct LineReader {
    path: PathBuf,
    inner: BufReader<File>,
}

impl LineReader {
    pub fn open(path: &Path) -> Result<Self> {
        if !path.is_file() {
            return Err(CorpusError::MissingInput(path.to_path_buf()));
        }
        let file = File::open(path).map_err(|e| CorpusError::io(path, e))?;
        Ok(Self {
            path: path.to_path_buf(),
            inner: BufReader::new(file),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Next raw line, or `None` at end of file.
    pub fn next_line(&mut self) -> Result<Option<Vec<u8>>> {
        let mut buf = Vec::new();
        let read = self
            .inner
            .read_until(b'\n', &mut buf)
            .map_err(|e| CorpusError::io(&self.path, e))?;
        Ok(if read == 0 { None } else { Some(buf) })
    }
}

impl Iterator for LineReader {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

/// Buffered writer that remembers its path for error reporting.
pub struct LineWriter {
    path: PathBuf,
    inner: BufWriter<File>,
}

impl LineWriter {
    pub fn new(file: File, path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            inner: BufWriter::new(file),
        }
    }

    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path).map_err(|e| CorpusError::io(path, e))?;
        Ok(Self::new(file, path))
    }

    /// Writes bytes as-is.
    pub fn write_raw(&mut self, bytes: &[u8]) -> Result<()> {
        self.inner
            .write_all(bytes)
            .map_err(|e| CorpusError::io(&self.path, e))
    }

    /// Writes `content` followed by a single `\n`.
    pub fn write_line(&mut self, content: &[u8]) -> Result<()> {
        self.write_raw(content)?;
        self.write_raw(b"\n")
    }

    /// Flushes and returns the path.
    pub fn finish(mut self) -> Result<PathBuf> {
        self.inner
            .flush()
            .map_err(|e| CorpusError::io(&self.path, e))?;
        Ok(self.path)
    }
}

/// Number of lines in a file (a final line without terminator counts).
pub fn count_lines(path: &Path) -> Result<usize> {
    let mut count = 0;
    for line in LineReader::open(path)? {
        line?;
        count += 1;
    }
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_split_on_any_ascii_whitespace() {
        let line = b"  hello\tworld \r\n";
        let tokens: Vec<_> = tokens(line).collect();
        assert_eq!(tokens, vec![&b"hello"[..], &b"world"[..]]);
        assert_eq!(token_count(b""), 0);
        assert_eq!(token_count(b"   \n"), 0);
    }

    #[test]
    fn test_vertical_tab_separates_tokens() {
        assert_eq!(token_count(b"a\x0bb\x0cc"), 3);
        assert_eq!(token_count(b"\x0b"), 0);
    }

    #[test]
    fn test_trim_newline() {
        assert_eq!(trim_newline(b"abc\n"), b"abc");
        assert_eq!(trim_newline(b"abc\r\n"), b"abc\r");
        assert_eq!(trim_newline(b"abc"), b"abc");
    }

    #[test]
    fn test_reader_keeps_terminators() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("f.txt");
        std::fs::write(&path, "a\nb\nc").unwrap();

        let lines: Vec<_> = LineReader::open(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(lines, vec![b"a\n".to_vec(), b"b\n".to_vec(), b"c".to_vec()]);
        assert_eq!(count_lines(&path).unwrap(), 3);
    }
}
