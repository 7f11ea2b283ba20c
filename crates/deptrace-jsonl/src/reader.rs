//! JSONL reading operations.
//!
//! Records are read line by line through a buffered async reader. Line
//! numbers are tracked so decode failures point at the offending line, and
//! blank lines are skipped without counting as records.

use std::path::Path;

use futures::{Stream, TryStreamExt};
use serde::de::DeserializeOwned;
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

use crate::{Error, Result, Warning};

/// Async reader for JSONL (JSON Lines) data.
///
/// # Examples
///
/// ```no_run
/// use deptrace_jsonl::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("dep_graph.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(record) = reader.read_record::<serde_json::Value>().await? {
///     println!("{record}");
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    /// Buffered reader wrapping the underlying async reader.
    reader: BufReader<R>,
    /// 1-based number of the last line read, 0 before any line.
    line_number: usize,
    /// Holds the current line between reads.
    buf: String,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
            buf: String::new(),
        }
    }

    /// Returns the number of the last line read (0 before any read).
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    /// Moves to the next non-blank line. Returns `false` at end of input.
    async fn advance(&mut self) -> Result<bool> {
        loop {
            self.buf.clear();
            let read = self.reader.read_line(&mut self.buf).await?;
            if read == 0 {
                return Ok(false);
            }
            self.line_number += 1;
            if !self.buf.trim().is_empty() {
                return Ok(true);
            }
        }
    }

    /// Reads and decodes the next record.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] with the line number if the line is not a
    /// valid `T`, or [`Error::Io`] if reading fails.
    pub async fn read_record<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        if !self.advance().await? {
            return Ok(None);
        }
        let line_number = self.line_number;
        serde_json::from_str(self.buf.trim_end())
            .map(Some)
            .map_err(|source| Error::Parse {
                line_number,
                source,
            })
    }

    /// Reads the next record that decodes successfully.
    ///
    /// Lines that fail to decode are recorded in `warnings` and skipped.
    ///
    /// # Errors
    ///
    /// Only I/O failures are returned as errors.
    pub async fn read_record_resilient<T: DeserializeOwned>(
        &mut self,
        warnings: &mut Vec<Warning>,
    ) -> Result<Option<T>> {
        while self.advance().await? {
            match serde_json::from_str(self.buf.trim_end()) {
                Ok(value) => return Ok(Some(value)),
                Err(e) => {
                    tracing::debug!(line = self.line_number, error = %e, "skipping malformed JSONL line");
                    warnings.push(Warning::MalformedJson {
                        line_number: self.line_number,
                        error: e.to_string(),
                    });
                }
            }
        }
        Ok(None)
    }

    /// Converts the reader into a stream of decoded records.
    ///
    /// A decode error is yielded in place of the bad line and the stream
    /// continues with the following line.
    pub fn into_stream<T: DeserializeOwned>(self) -> impl Stream<Item = Result<T>> {
        futures::stream::unfold(self, |mut reader| async move {
            match reader.read_record::<T>().await {
                Ok(Some(value)) => Some((Ok(value), reader)),
                Ok(None) => None,
                Err(e) => Some((Err(e), reader)),
            }
        })
    }
}

/// Reads every record of a JSONL file, failing on the first bad line.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read, or if any line
/// fails to decode.
pub async fn read_jsonl<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    JsonlReader::new(file).into_stream().try_collect().await
}

/// Reads every decodable record of a JSONL file.
///
/// Returns the records together with a warning for each skipped line.
///
/// # Errors
///
/// Returns an error only if the file cannot be opened or read.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    let mut reader = JsonlReader::new(file);
    let mut records = Vec::new();
    let mut warnings = Vec::new();
    while let Some(record) = reader.read_record_resilient(&mut warnings).await? {
        records.push(record);
    }
    Ok((records, warnings))
}
