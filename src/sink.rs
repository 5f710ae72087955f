//! Buffered line output.

use std::io;
use std::io::prelude::*;

use bytesize::MIB;

/// Default output flush threshold (1 MiB).
pub const DEFAULT_FLUSH_THRESHOLD: usize = MIB as usize;

/// Line writer that accumulates output in memory and hands it to the underlying writer
/// whenever the accumulated size reaches the flush threshold.
///
/// Writes to the underlying writer block until it accepts the whole buffer, so a slow
/// destination suspends the producer instead of growing the buffer.
pub struct LineSink<W: Write> {
    writer: W,
    buffer: Vec<u8>,
    threshold: usize,
    lines_written: u64,
}

impl<W: Write> LineSink<W> {
    pub fn new(writer: W) -> Self {
        LineSink::with_threshold(writer, DEFAULT_FLUSH_THRESHOLD)
    }

    pub fn with_threshold(writer: W, threshold: usize) -> Self {
        LineSink {
            writer,
            buffer: Vec::with_capacity(threshold.min(DEFAULT_FLUSH_THRESHOLD)),
            threshold,
            lines_written: 0,
        }
    }

    /// Appends a line followed by a `\n` separator.
    pub fn push_line(&mut self, line: &str) -> io::Result<()> {
        self.buffer.extend_from_slice(line.as_bytes());
        self.buffer.push(b'\n');
        self.lines_written += 1;

        if self.buffer.len() >= self.threshold {
            self.write_buffer()?;
        }

        return Ok(());
    }

    /// Writes out everything buffered so far and flushes the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.write_buffer()?;
        self.writer.flush()
    }

    /// Number of bytes waiting to be written.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    /// Number of lines accepted by the sink.
    pub fn lines_written(&self) -> u64 {
        self.lines_written
    }

    /// Flushes the sink and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.flush()?;
        Ok(self.writer)
    }

    fn write_buffer(&mut self) -> io::Result<()> {
        if !self.buffer.is_empty() {
            self.writer.write_all(&self.buffer)?;
            self.buffer.clear();
        }

        return Ok(());
    }
}

#[cfg(test)]
mod test {
    use std::io::{self, ErrorKind, Write};

    use super::LineSink;

    /// Writer recording the size of every write call.
    #[derive(Default)]
    struct RecordingWriter {
        data: Vec<u8>,
        writes: Vec<usize>,
    }

    impl Write for RecordingWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.data.extend_from_slice(buf);
            self.writes.push(buf.len());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(ErrorKind::Other, "disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_flush_on_threshold() {
        let mut sink = LineSink::with_threshold(RecordingWriter::default(), 8);

        sink.push_line("abc").unwrap();
        assert_eq!(sink.buffered(), 4);
        sink.push_line("defg").unwrap();
        assert_eq!(sink.buffered(), 0);
        sink.push_line("h").unwrap();
        assert_eq!(sink.buffered(), 2);
        assert_eq!(sink.lines_written(), 3);

        let writer = sink.into_inner().unwrap();
        assert_eq!(writer.data, b"abc\ndefg\nh\n");
        assert_eq!(writer.writes, vec![9, 2]);
    }

    #[test]
    fn test_empty_sink() {
        let writer = LineSink::new(RecordingWriter::default()).into_inner().unwrap();
        assert!(writer.data.is_empty());
        assert!(writer.writes.is_empty());
    }

    #[test]
    fn test_write_error() {
        let mut sink = LineSink::with_threshold(FailingWriter, 4);
        sink.push_line("ab").unwrap();
        assert!(sink.push_line("cd").is_err());
    }
}
