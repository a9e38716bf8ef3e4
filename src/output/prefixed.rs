// ABOUTME: Writer adapter that tags every output line with a prefix.
// ABOUTME: Tracks only whether a line is in progress; content is never buffered.

use std::io::{self, Write};

/// Inserts `prefix` before the first byte of every line written through it.
///
/// Chunks may end mid-line; the next chunk continues that line without a
/// second prefix. Each call on the inner writer receives one contiguous
/// range: either the prefix or a run of input bytes.
///
/// If the inner writer fails, the current line is abandoned: the next
/// write starts a new prefixed line.
#[derive(Debug)]
pub struct Prefixed<W> {
    inner: W,
    prefix: String,
    line_started: bool,
}

impl<W: Write> Prefixed<W> {
    pub fn new(prefix: impl Into<String>, inner: W) -> Self {
        Self {
            inner,
            prefix: prefix.into(),
            line_started: false,
        }
    }

    /// True while a partial line is waiting for its terminator.
    pub fn line_started(&self) -> bool {
        self.line_started
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Prefixed<W> {
    fn write_lines(&mut self, buf: &[u8]) -> io::Result<()> {
        let mut rest = buf;

        while !rest.is_empty() {
            if !self.line_started {
                self.inner.write_all(self.prefix.as_bytes())?;
                self.line_started = true;
            }

            match rest.iter().position(|&b| b == b'\n') {
                Some(pos) => {
                    let (line, tail) = rest.split_at(pos + 1);
                    self.inner.write_all(line)?;
                    self.line_started = false;
                    rest = tail;
                }
                None => {
                    self.inner.write_all(rest)?;
                    break;
                }
            }
        }

        Ok(())
    }
}

impl<W: Write> Write for Prefixed<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if let Err(e) = self.write_lines(buf) {
            self.line_started = false;
            return Err(e);
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
