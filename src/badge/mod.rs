pub mod listener;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};

/// Black-box badge reader. Hardware drivers live behind this seam.
pub trait TokenReader: Send {
    /// Next token observation. `Ok(None)` is the expected steady state when
    /// no badge is present; the listener retries after a short delay.
    /// `Err` means the reader itself failed and the listener gives up.
    fn wait_for_token(&mut self) -> Result<Option<String>>;
}

/// Reads one token id per line, typically from stdin or a FIFO fed by the
/// badge-reader daemon. Blank lines are "no badge present"; end of stream is
/// a reader failure (the feed went away).
pub struct LineTokenReader<R> {
    reader: R,
}

impl LineTokenReader<BufReader<io::Stdin>> {
    pub fn stdin() -> Self {
        Self::new(BufReader::new(io::stdin()))
    }
}

impl LineTokenReader<BufReader<File>> {
    /// Open a badge feed file. Opening a FIFO blocks until the reader
    /// daemon connects, so call this off the runtime.
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("failed to open badge feed {}", path.display()))?;
        Ok(Self::new(BufReader::new(file)))
    }
}

impl<R: BufRead> LineTokenReader<R> {
    pub fn new(reader: R) -> Self {
        Self { reader }
    }
}

impl<R: BufRead + Send> TokenReader for LineTokenReader<R> {
    fn wait_for_token(&mut self) -> Result<Option<String>> {
        let mut line = String::new();
        let read = self
            .reader
            .read_line(&mut line)
            .context("failed to read from badge feed")?;
        if read == 0 {
            anyhow::bail!("badge feed closed");
        }

        let token = line.trim();
        if token.is_empty() {
            return Ok(None);
        }
        Ok(Some(token.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn yields_tokens_line_by_line() {
        let mut reader = LineTokenReader::new("04A1B2\n\n04C3D4\n".as_bytes());
        assert_eq!(reader.wait_for_token().unwrap(), Some("04A1B2".to_string()));
        assert_eq!(reader.wait_for_token().unwrap(), None);
        assert_eq!(reader.wait_for_token().unwrap(), Some("04C3D4".to_string()));
    }

    #[test]
    fn closed_feed_is_an_error() {
        let mut reader = LineTokenReader::new("".as_bytes());
        assert!(reader.wait_for_token().is_err());
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let mut reader = LineTokenReader::new("  04A1B2  \n".as_bytes());
        assert_eq!(reader.wait_for_token().unwrap(), Some("04A1B2".to_string()));
    }
}
