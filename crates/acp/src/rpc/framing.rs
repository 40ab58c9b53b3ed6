//! Newline-delimited JSON framing over an async byte stream (spec.md §4.1
//! "Framing").

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

/// Initial read buffer size. Large enough that the common case (a handful of
/// pending messages) never needs a second underlying read.
const DEFAULT_INITIAL_CAPACITY: usize = 1024 * 1024;
/// Hard cap on a single line's length. A line that grows past this without a
/// newline is a framing error, not an OOM risk.
const DEFAULT_MAX_LINE_LENGTH: usize = 10 * 1024 * 1024;

enum Frame {
    Line(Vec<u8>),
    Overflow,
}

/// Reads newline-delimited JSON values from `reader` until EOF. Blank lines
/// are skipped; a line that fails to parse as JSON is logged and dropped. A
/// line longer than `max_line_length` is logged and dropped without ever
/// being buffered in full — the reader resyncs at the next `\n`.
pub struct FramedReader<R> {
    reader: BufReader<R>,
    max_line_length: usize,
    line: Vec<u8>,
}

impl<R: AsyncRead + Unpin> FramedReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_limits(reader, DEFAULT_INITIAL_CAPACITY, DEFAULT_MAX_LINE_LENGTH)
    }

    pub fn with_limits(reader: R, initial_capacity: usize, max_line_length: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(initial_capacity, reader),
            max_line_length,
            line: Vec::new(),
        }
    }

    /// Returns the next decoded message, or `Ok(None)` on clean EOF.
    pub async fn next_message(&mut self) -> Result<Option<Value>> {
        loop {
            let Some(frame) = self.read_frame().await? else {
                return Ok(None);
            };
            let bytes = match frame {
                Frame::Line(bytes) => bytes,
                Frame::Overflow => {
                    tracing::warn!(
                        max_line_length = self.max_line_length,
                        "dropping oversized line and resyncing at next newline"
                    );
                    continue;
                }
            };
            let line = String::from_utf8_lossy(&bytes);
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str::<Value>(&line) {
                Ok(value) => return Ok(Some(value)),
                Err(error) => {
                    tracing::warn!(%error, %line, "dropping line that failed to parse as JSON");
                    continue;
                }
            }
        }
    }

    /// Reads up to the next `\n` (exclusive), enforcing `max_line_length`
    /// without ever holding more than one oversized chunk in memory at once.
    async fn read_frame(&mut self) -> Result<Option<Frame>> {
        self.line.clear();
        let mut overflowed = false;
        loop {
            let buf = self.reader.fill_buf().await?;
            if buf.is_empty() {
                if overflowed {
                    tracing::warn!(
                        max_line_length = self.max_line_length,
                        "dropping oversized trailing line at eof"
                    );
                    return Ok(None);
                }
                if self.line.is_empty() {
                    return Ok(None);
                }
                return Ok(Some(Frame::Line(std::mem::take(&mut self.line))));
            }

            if let Some(newline_at) = buf.iter().position(|&byte| byte == b'\n') {
                if !overflowed {
                    self.line.extend_from_slice(&buf[..newline_at]);
                }
                let consumed = newline_at + 1;
                self.reader.consume(consumed);
                return Ok(Some(if overflowed {
                    Frame::Overflow
                } else {
                    Frame::Line(std::mem::take(&mut self.line))
                }));
            }

            let chunk_len = buf.len();
            if !overflowed {
                if self.line.len() + chunk_len > self.max_line_length {
                    overflowed = true;
                    self.line.clear();
                } else {
                    self.line.extend_from_slice(buf);
                }
            }
            self.reader.consume(chunk_len);
        }
    }
}

/// Writes a single JSON value as one line, terminated by `\n`.
pub async fn write_message<W: AsyncWrite + Unpin>(writer: &mut W, value: &Value) -> Result<()> {
    let mut encoded = serde_json::to_vec(value).map_err(Error::Serialize)?;
    encoded.push(b'\n');
    writer.write_all(&encoded).await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_newline_delimited_values_and_skips_blank_lines() {
        let input = b"{\"a\":1}\n\n{\"b\":2}\n".to_vec();
        let mut reader = FramedReader::new(std::io::Cursor::new(input));
        assert_eq!(
            reader.next_message().await.unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
        assert_eq!(
            reader.next_message().await.unwrap(),
            Some(serde_json::json!({"b": 2}))
        );
        assert_eq!(reader.next_message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn skips_unparseable_lines() {
        let input = b"not json\n{\"a\":1}\n".to_vec();
        let mut reader = FramedReader::new(std::io::Cursor::new(input));
        assert_eq!(
            reader.next_message().await.unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
    }

    #[tokio::test]
    async fn oversized_line_is_dropped_and_the_reader_resyncs() {
        let oversized = vec![b'a'; 64];
        let mut input = oversized;
        input.push(b'\n');
        input.extend_from_slice(b"{\"a\":1}\n");
        let mut reader = FramedReader::with_limits(std::io::Cursor::new(input), 16, 16);
        assert_eq!(
            reader.next_message().await.unwrap(),
            Some(serde_json::json!({"a": 1}))
        );
    }

    #[tokio::test]
    async fn oversized_line_spanning_many_reads_still_resyncs() {
        let oversized = vec![b'b'; 200];
        let mut input = oversized;
        input.push(b'\n');
        input.extend_from_slice(b"{\"ok\":true}\n");
        let mut reader = FramedReader::with_limits(std::io::Cursor::new(input), 8, 32);
        assert_eq!(
            reader.next_message().await.unwrap(),
            Some(serde_json::json!({"ok": true}))
        );
    }

    #[tokio::test]
    async fn write_message_appends_trailing_newline() {
        let mut buf = Vec::new();
        write_message(&mut buf, &serde_json::json!({"a": 1}))
            .await
            .unwrap();
        assert_eq!(buf, b"{\"a\":1}\n");
    }
}
