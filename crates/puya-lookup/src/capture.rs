//! Identifier capture: anything that yields zero or one code per interaction.

use std::collections::VecDeque;
use std::fmt;
use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Errors produced by a capture source.
#[derive(thiserror::Error, Debug)]
pub enum CaptureError {
    /// The source has nothing more to give (end of input).
    #[error("Capture source closed")]
    Closed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type CaptureResult<T> = Result<T, CaptureError>;

/// A source of product identifiers.
///
/// Each call is one user interaction and yields `Some(identifier)` or `None`
/// when nothing usable was captured. Implementations do not retry.
pub trait IdentifierSource {
    fn capture(&mut self) -> CaptureResult<Option<String>>;
}

impl<S: IdentifierSource + ?Sized> IdentifierSource for Box<S> {
    fn capture(&mut self) -> CaptureResult<Option<String>> {
        (**self).capture()
    }
}

/// Trim surrounding whitespace and control characters (scanner suffixes such
/// as `\r`). Interior characters, GS1 separators included, are kept. An empty
/// result means nothing was captured.
pub fn normalize_identifier(raw: &str) -> Option<String> {
    let trimmed = raw.trim_matches(|c: char| c.is_whitespace() || c.is_control());
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Reads one identifier per line, e.g. from stdin or a keyboard-wedge scanner.
pub struct LineSource<R> {
    reader: R,
    line: String,
}

impl<R: BufRead> LineSource<R> {
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            line: String::new(),
        }
    }
}

impl<R: BufRead> IdentifierSource for LineSource<R> {
    fn capture(&mut self) -> CaptureResult<Option<String>> {
        self.line.clear();
        if self.reader.read_line(&mut self.line)? == 0 {
            return Err(CaptureError::Closed);
        }
        Ok(normalize_identifier(&self.line))
    }
}

/// A fixed, pre-recorded sequence of identifiers.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    pending: VecDeque<String>,
}

impl ScriptedSource {
    pub fn new<I, S>(identifiers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            pending: identifiers.into_iter().map(Into::into).collect(),
        }
    }

    /// Load identifiers from a file: one per line, `#` starts a comment line.
    /// Blank lines are kept so they capture as `None`.
    pub fn from_file(path: &Path) -> CaptureResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let identifiers = content
            .lines()
            .filter(|line| !line.trim_start().starts_with('#'))
            .map(str::to_string);
        Ok(Self::new(identifiers))
    }

    pub fn remaining(&self) -> usize {
        self.pending.len()
    }
}

impl IdentifierSource for ScriptedSource {
    fn capture(&mut self) -> CaptureResult<Option<String>> {
        match self.pending.pop_front() {
            Some(raw) => Ok(normalize_identifier(&raw)),
            None => Err(CaptureError::Closed),
        }
    }
}

/// How identifiers are captured, chosen at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureMode {
    /// Interactive line editor.
    Prompt,
    /// Plain lines on standard input.
    Stdin,
    /// Identifiers listed in a file.
    File(PathBuf),
}

impl CaptureMode {
    /// Build the source for non-interactive modes. `Prompt` is driven by the
    /// caller's line editor, so it has no source here.
    pub fn open(&self) -> CaptureResult<Option<Box<dyn IdentifierSource>>> {
        match self {
            CaptureMode::Prompt => Ok(None),
            CaptureMode::Stdin => Ok(Some(Box::new(LineSource::new(
                std::io::stdin().lock(),
            )))),
            CaptureMode::File(path) => Ok(Some(Box::new(ScriptedSource::from_file(path)?))),
        }
    }
}

impl FromStr for CaptureMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "prompt" => Ok(CaptureMode::Prompt),
            "stdin" | "-" => Ok(CaptureMode::Stdin),
            other => match other.strip_prefix("file:") {
                Some(path) if !path.is_empty() => Ok(CaptureMode::File(PathBuf::from(path))),
                _ => Err(format!(
                    "unknown capture mode '{other}' (expected prompt, stdin or file:<path>)"
                )),
            },
        }
    }
}

impl fmt::Display for CaptureMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CaptureMode::Prompt => f.write_str("prompt"),
            CaptureMode::Stdin => f.write_str("stdin"),
            CaptureMode::File(path) => write!(f, "file:{}", path.display()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_normalize_identifier() {
        assert_eq!(
            normalize_identifier("  7501234567890\r\n"),
            Some("7501234567890".to_string())
        );
        assert_eq!(
            normalize_identifier("\u{2}0107501234567890\u{1d}10AB12\u{3}"),
            Some("0107501234567890\u{1d}10AB12".to_string())
        );
        assert_eq!(normalize_identifier("   "), None);
        assert_eq!(normalize_identifier(""), None);
    }

    #[test]
    fn test_line_source() {
        let input = b"7501234567890\n\n  000  \n";
        let mut source = LineSource::new(&input[..]);
        assert_eq!(source.capture().unwrap(), Some("7501234567890".to_string()));
        assert_eq!(source.capture().unwrap(), None);
        assert_eq!(source.capture().unwrap(), Some("000".to_string()));
        assert!(matches!(source.capture(), Err(CaptureError::Closed)));
    }

    #[test]
    fn test_scripted_source_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "# morning restock").unwrap();
        writeln!(file, "7501234567890").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "000").unwrap();

        let mut source = ScriptedSource::from_file(file.path()).unwrap();
        assert_eq!(source.remaining(), 3);
        assert_eq!(source.capture().unwrap(), Some("7501234567890".to_string()));
        assert_eq!(source.capture().unwrap(), None);
        assert_eq!(source.capture().unwrap(), Some("000".to_string()));
        assert!(matches!(source.capture(), Err(CaptureError::Closed)));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = ScriptedSource::from_file(Path::new("/nonexistent/codes.txt")).unwrap_err();
        assert!(matches!(err, CaptureError::Io(_)));
    }

    #[test]
    fn test_capture_mode_parse() {
        assert_eq!("prompt".parse::<CaptureMode>(), Ok(CaptureMode::Prompt));
        assert_eq!("stdin".parse::<CaptureMode>(), Ok(CaptureMode::Stdin));
        assert_eq!(
            "file:codes.txt".parse::<CaptureMode>(),
            Ok(CaptureMode::File(PathBuf::from("codes.txt")))
        );
        assert!("file:".parse::<CaptureMode>().is_err());
        assert!("camera".parse::<CaptureMode>().is_err());
        assert_eq!(CaptureMode::File(PathBuf::from("a.txt")).to_string(), "file:a.txt");
    }
}
