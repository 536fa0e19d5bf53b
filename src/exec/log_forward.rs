// src/exec/log_forward.rs

//! Forward agent output into `tracing`.
//!
//! The agent writes arbitrary chunks; lines may be split across reads or
//! several may arrive at once. [`LineBuffer`] reassembles them and
//! [`LogForwarder`] emits each one at the fixed severity of its stream.

use std::io;

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::JoinHandle;
use tracing::{Level, debug, error, info};

use crate::types::OutputStream;

/// Longest line forwarded as one record. Longer output is split.
pub const MAX_LINE_BYTES: usize = 64 * 1024;

/// Buffers raw bytes until a newline and returns complete, trimmed lines.
///
/// Trailing `\n` / `\r` are stripped and empty lines are dropped. Invalid
/// UTF-8 is replaced lossily.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: Vec<u8>,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `bytes` and return every line completed by them.
    ///
    /// Output without a newline is cut into [`MAX_LINE_BYTES`] pieces, so at
    /// most that much is ever held back.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<String> {
        self.pending.extend_from_slice(bytes);

        let mut lines = Vec::new();
        loop {
            let cut = match self.pending.iter().position(|b| *b == b'\n') {
                Some(pos) if pos < MAX_LINE_BYTES => pos + 1,
                _ if self.pending.len() >= MAX_LINE_BYTES => MAX_LINE_BYTES,
                _ => break,
            };
            let raw: Vec<u8> = self.pending.drain(..cut).collect();
            if let Some(line) = trim_line(&raw) {
                lines.push(line);
            }
        }
        lines
    }

    /// Return the unterminated remainder, if any, and reset the buffer.
    pub fn finish(&mut self) -> Option<String> {
        let rest = std::mem::take(&mut self.pending);
        trim_line(&rest)
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }
}

fn trim_line(raw: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(raw);
    let trimmed = text.trim_end_matches(['\n', '\r']);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// `io::Write` adapter that logs every complete line at one severity.
#[derive(Debug)]
pub struct LogForwarder {
    stream: OutputStream,
    buffer: LineBuffer,
}

impl LogForwarder {
    pub fn new(stream: OutputStream) -> Self {
        Self {
            stream,
            buffer: LineBuffer::new(),
        }
    }

    pub fn level(&self) -> Level {
        self.stream.level()
    }

    /// Emit whatever is left in the buffer (output that did not end in a
    /// newline).
    pub fn finish(&mut self) {
        if let Some(line) = self.buffer.finish() {
            self.emit(&line);
        }
    }

    fn emit(&self, line: &str) {
        let stream = self.stream.as_str();
        match self.stream {
            OutputStream::Stdout => info!(target: "sidecar::agent", stream, "{line}"),
            OutputStream::Stderr => error!(target: "sidecar::agent", stream, "{line}"),
        }
    }
}

impl io::Write for LogForwarder {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        for line in self.buffer.push(buf) {
            self.emit(&line);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Drain `reader` into a [`LogForwarder`] on a background task until EOF.
pub fn spawn_output_pump<R>(mut reader: R, stream: OutputStream) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut forwarder = LogForwarder::new(stream);
        let mut chunk = [0u8; 4096];
        loop {
            match reader.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => {
                    let _ = io::Write::write_all(&mut forwarder, &chunk[..n]);
                }
                Err(e) => {
                    debug!(stream = stream.as_str(), error = %e, "agent output read failed");
                    break;
                }
            }
        }
        forwarder.finish();
        debug!(stream = stream.as_str(), "agent output pump ended");
    })
}
