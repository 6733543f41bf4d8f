//! Evaluation sample lists.
//!
//! One sample per line: `<video id> <frame count> <label> ...`. Only the
//! position of a line matters for lookups; the text is echoed back with the
//! prediction and may carry a ground-truth label column.

use crate::{Error, Result};
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::Path;

/// One line of the sample list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SampleLine {
    /// 0-based position in the list, which is also the record index.
    pub index: usize,
    /// Line text without its trailing newline.
    pub raw: String,
}

impl SampleLine {
    pub fn new(index: usize, raw: impl Into<String>) -> Self {
        let mut raw = raw.into();
        while raw.ends_with('\n') || raw.ends_with('\r') {
            raw.pop();
        }
        Self { index, raw }
    }

    /// First whitespace-delimited token (the video identifier).
    pub fn id(&self) -> &str {
        self.column(0).unwrap_or("")
    }

    /// The `n`-th whitespace-delimited token, 0-based.
    pub fn column(&self, n: usize) -> Option<&str> {
        self.raw.split_whitespace().nth(n)
    }

    /// Parse the class label found in column `n`.
    pub fn ground_truth(&self, n: usize) -> Result<usize> {
        let token = self.column(n).ok_or_else(|| {
            Error::InvalidArgument(format!("line {} has no column {}", self.index, n))
        })?;
        token.parse().map_err(|_| {
            Error::InvalidArgument(format!(
                "line {} column {} is not a class label: {:?}",
                self.index, n, token
            ))
        })
    }
}

/// Lazy iterator over the lines of a sample list.
#[derive(Debug)]
pub struct SampleList<R> {
    lines: Lines<R>,
    next_index: usize,
}

impl SampleList<BufReader<File>> {
    /// Open a list file from disk.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            Error::IoError(std::io::Error::new(
                e.kind(),
                format!("failed to open sample list {}: {}", path.display(), e),
            ))
        })?;
        Ok(Self::from_reader(BufReader::new(file)))
    }
}

impl<R: BufRead> SampleList<R> {
    pub fn from_reader(reader: R) -> Self {
        Self { lines: reader.lines(), next_index: 0 }
    }
}

impl<R: BufRead> Iterator for SampleList<R> {
    type Item = Result<SampleLine>;

    fn next(&mut self) -> Option<Self::Item> {
        let line = self.lines.next()?;
        let index = self.next_index;
        self.next_index += 1;
        Some(line.map(|raw| SampleLine::new(index, raw)).map_err(Error::from))
    }
}
