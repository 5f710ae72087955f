//! Input splitting into sorted chunks.

use std::io;
use std::path::{Path, PathBuf};

use crate::buffer::{ChunkBuffer, ChunkBufferBuilder};
use crate::chunk::Chunk;
use crate::sort::SortError;

/// Result of the split phase.
#[derive(Debug)]
pub struct SplitOutput {
    /// Created chunks in creation order.
    pub chunks: Vec<Chunk>,
    /// Number of lines read from the input, blank ones included.
    pub lines_read: u64,
}

/// Splits an input line stream into individually sorted chunk files.
///
/// Lines are accumulated in a buffer until it reports being full; the buffer is then sorted and saved
/// as `chunk_<index>.txt` in the chunk directory. Blank and whitespace-only lines count toward the
/// buffer limit but are not saved.
pub struct Splitter<'a, B: ChunkBufferBuilder> {
    dir: &'a Path,
    buffer_builder: &'a B,
    rw_buf_size: Option<usize>,
    chunk_number: usize,
}

impl<'a, B: ChunkBufferBuilder> Splitter<'a, B> {
    /// Creates a new splitter.
    ///
    /// # Arguments
    /// * `dir` - Directory chunk files are created in
    /// * `buffer_builder` - Builder of the buffers lines are accumulated in
    /// * `rw_buf_size` - Chunk file write buffer size
    pub fn new(dir: &'a Path, buffer_builder: &'a B, rw_buf_size: Option<usize>) -> Self {
        Splitter {
            dir,
            buffer_builder,
            rw_buf_size,
            chunk_number: 0,
        }
    }

    /// Consumes the input and returns the created chunks. Aborts on the first input or chunk error.
    pub fn split<I>(&mut self, input: I) -> Result<SplitOutput, SortError>
    where
        I: IntoIterator<Item = io::Result<String>>,
    {
        let mut chunk_buf = self.buffer_builder.build();
        let mut chunks = Vec::new();
        let mut lines_read = 0;

        for line in input.into_iter() {
            chunk_buf.push(line.map_err(SortError::Input)?);
            lines_read += 1;

            if chunk_buf.is_full() {
                chunks.extend(self.create_chunk(chunk_buf)?);
                chunk_buf = self.buffer_builder.build();
            }
        }

        if !chunk_buf.is_empty() {
            chunks.extend(self.create_chunk(chunk_buf)?);
        }

        log::info!("lines read: {}, chunks created: {}", lines_read, chunks.len());

        return Ok(SplitOutput { chunks, lines_read });
    }

    fn create_chunk(&mut self, mut buffer: B::Buffer) -> Result<Option<Chunk>, SortError> {
        let buffered = buffer.len();
        let mem_size = buffer.mem_size();

        log::debug!("sorting chunk data ...");
        buffer.sort();

        let mut lines = buffer.into_iter().filter(|line| !line.trim().is_empty()).peekable();
        if lines.peek().is_none() {
            log::debug!("skipping chunk of {} blank lines", buffered);
            return Ok(None);
        }

        let path = self.chunk_path();
        self.chunk_number += 1;

        log::debug!("saving chunk data to {}", path.display());
        let chunk = Chunk::write(&path, lines, self.rw_buf_size).map_err(SortError::Chunk)?;
        log::debug!(
            "chunk {} saved (lines: {}, dropped: {}, size: {})",
            path.display(),
            chunk.lines(),
            buffered - chunk.lines(),
            bytesize::ByteSize(mem_size),
        );

        return Ok(Some(chunk));
    }

    fn chunk_path(&self) -> PathBuf {
        self.dir.join(format!("chunk_{}.txt", self.chunk_number))
    }
}
