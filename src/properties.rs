//! Structured editing of properties-style configuration files.
//!
//! Neo4j configuration is a plain-text, line-oriented `key=value` format
//! with `#`/`!` comment lines. Mutation here is deliberately conservative:
//! the file is parsed into an ordered list of line records, exactly one
//! record is rewritten, and everything else is serialized back byte for
//! byte, including the original `\n`/`\r\n` terminators.
//!
//! - [`PropertiesFile`] - parsed in-memory representation
//! - [`ConfigStore`] - read-modify-write wrapper bound to a file path

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

const LF: &str = "\n";
const CRLF: &str = "\r\n";

/// Classification of a single config line.
#[derive(Debug, Clone, PartialEq, Eq)]
enum LineKind {
    /// Uncommented `key=value` with the key anchored at column zero.
    Assignment { key: String, value: String },
    /// First character is `#` or `!`.
    Comment,
    /// Blank lines and anything else.
    Other,
}

/// One line of the file: its text without terminator, plus the terminator
/// it originally carried (empty for a final unterminated line).
#[derive(Debug, Clone)]
struct Line {
    kind: LineKind,
    text: String,
    terminator: &'static str,
}

impl Line {
    fn new(text: String, terminator: &'static str) -> Self {
        let kind = if text.starts_with('#') || text.starts_with('!') {
            LineKind::Comment
        } else if let Some((key, value)) = text.split_once('=')
            && !key.is_empty()
        {
            LineKind::Assignment {
                key: key.to_string(),
                value: value.to_string(),
            }
        } else {
            LineKind::Other
        };

        Self {
            kind,
            text,
            terminator,
        }
    }

    fn matches(&self, key: &str) -> bool {
        matches!(&self.kind, LineKind::Assignment { key: k, .. } if k == key)
    }
}

/// A parsed properties file.
///
/// Serializing an unmodified `PropertiesFile` reproduces the input exactly.
#[derive(Debug, Clone, Default)]
pub struct PropertiesFile {
    lines: Vec<Line>,
}

impl PropertiesFile {
    /// Parse file contents into line records.
    pub fn parse(input: &str) -> Self {
        let mut lines = Vec::new();
        let mut rest = input;

        while !rest.is_empty() {
            let (text, terminator, tail) = match rest.find('\n') {
                Some(idx) if idx > 0 && rest.as_bytes()[idx - 1] == b'\r' => {
                    (&rest[..idx - 1], CRLF, &rest[idx + 1..])
                }
                Some(idx) => (&rest[..idx], LF, &rest[idx + 1..]),
                None => (rest, "", &rest[rest.len()..]),
            };

            lines.push(Line::new(text.to_string(), terminator));
            rest = tail;
        }

        Self { lines }
    }

    /// Serialize back to file contents.
    pub fn serialize(&self) -> String {
        let mut out = String::new();
        for line in &self.lines {
            out.push_str(&line.text);
            out.push_str(line.terminator);
        }
        out
    }

    /// Value of the first uncommented assignment for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KeyNotFound`] when no such assignment exists.
    /// Comment lines never match, even when the key appears after `#`/`!`.
    pub fn get(&self, key: &str) -> Result<&str> {
        self.lines
            .iter()
            .find_map(|line| match &line.kind {
                LineKind::Assignment { key: k, value } if k == key => Some(value.as_str()),
                _ => None,
            })
            .ok_or_else(|| Error::key_not_found(key))
    }

    /// Replace the value of the first assignment for `key` in place,
    /// preserving the line's terminator; append a new line in the file's
    /// dominant line-break style when the key is absent.
    pub fn set(&mut self, key: &str, value: &str) {
        if let Some(line) = self.lines.iter_mut().find(|line| line.matches(key)) {
            line.text = format!("{key}={value}");
            line.kind = LineKind::Assignment {
                key: key.to_string(),
                value: value.to_string(),
            };
            return;
        }

        let style = self.break_style();
        if let Some(last) = self.lines.last_mut()
            && last.terminator.is_empty()
        {
            // Terminate the final line before appending after it.
            last.terminator = style;
        }
        self.lines.push(Line::new(format!("{key}={value}"), ""));
    }

    /// Remove the first assignment for `key`, including its terminator.
    /// A no-op when the key is absent.
    pub fn delete(&mut self, key: &str) {
        if let Some(idx) = self.lines.iter().position(|line| line.matches(key)) {
            self.lines.remove(idx);
        }
    }

    /// The line-break style used for appended lines: the first terminator
    /// seen in the file, `\n` for empty or single unterminated files.
    fn break_style(&self) -> &'static str {
        self.lines
            .iter()
            .map(|line| line.terminator)
            .find(|term| !term.is_empty())
            .unwrap_or(LF)
    }
}

/// Read-modify-write access to a properties file on disk.
///
/// Every operation re-reads the file, so values are always fresh at the
/// cost of one I/O round trip per call. There is no cross-process locking;
/// concurrent external mutation of the file is undefined.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    /// Bind a store to a config file path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The bound config file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the value for `key`.
    pub async fn get(&self, key: &str) -> Result<String> {
        let file = self.load().await?;
        file.get(key).map(str::to_string)
    }

    /// Read the value for `key`, substituting `fallback` when the key is
    /// absent. I/O errors still propagate.
    pub async fn get_or(&self, key: &str, fallback: &str) -> Result<String> {
        match self.get(key).await {
            Ok(value) => Ok(value),
            Err(err) if err.is_key_not_found() => Ok(fallback.to_string()),
            Err(err) => Err(err),
        }
    }

    /// Write the value for `key`, replacing in place or appending.
    pub async fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut file = self.load().await?;
        file.set(key, value);
        self.save(&file).await
    }

    /// Remove the assignment for `key`; a no-op when absent.
    pub async fn delete(&self, key: &str) -> Result<()> {
        let mut file = self.load().await?;
        file.delete(key);
        self.save(&file).await
    }

    async fn load(&self) -> Result<PropertiesFile> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|err| Error::config_io(&self.path, err))?;
        Ok(PropertiesFile::parse(&content))
    }

    async fn save(&self, file: &PropertiesFile) -> Result<()> {
        tokio::fs::write(&self.path, file.serialize())
            .await
            .map_err(|err| Error::config_io(&self.path, err))
    }
}
