//! Limited line buffer implementations.

use bytesize::MIB;

/// Default chunk memory limit (10 MiB).
pub const DEFAULT_CHUNK_SIZE: u64 = 10 * MIB;

/// Buffer builder.
pub trait ChunkBufferBuilder: Default {
    type Buffer: ChunkBuffer;

    /// Creates a new buffer.
    fn build(&self) -> Self::Buffer;
}

/// Base limited buffer interface.
pub trait ChunkBuffer: IntoIterator<Item = String> {
    /// Adds a new line to the buffer.
    fn push(&mut self, line: String);

    /// Returns buffer length
    fn len(&self) -> usize;

    /// Checks if the buffer holds no lines.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the number of bytes the buffered lines occupy once written, separators included.
    fn mem_size(&self) -> u64;

    /// Checks if the buffer reached the limit.
    fn is_full(&self) -> bool;

    /// Sorts buffered lines in byte-wise order.
    fn sort(&mut self);
}

/// Accounted size of a single line: its bytes plus one separator byte.
pub fn line_size(line: &str) -> u64 {
    line.len() as u64 + 1
}

pub struct LimitedBufferBuilder {
    buffer_limit: usize,
    preallocate: bool,
}

impl LimitedBufferBuilder {
    pub fn new(buffer_limit: usize, preallocate: bool) -> Self {
        LimitedBufferBuilder {
            buffer_limit,
            preallocate,
        }
    }
}

impl ChunkBufferBuilder for LimitedBufferBuilder {
    type Buffer = LimitedBuffer;

    fn build(&self) -> Self::Buffer {
        if self.preallocate {
            LimitedBuffer::with_capacity(self.buffer_limit)
        } else {
            LimitedBuffer::new(self.buffer_limit)
        }
    }
}

impl Default for LimitedBufferBuilder {
    fn default() -> Self {
        LimitedBufferBuilder {
            buffer_limit: usize::MAX,
            preallocate: false,
        }
    }
}

/// Buffer limited by lines count.
pub struct LimitedBuffer {
    limit: usize,
    current_size: u64,
    inner: Vec<String>,
}

impl LimitedBuffer {
    pub fn new(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::new(),
        }
    }

    pub fn with_capacity(limit: usize) -> Self {
        LimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::with_capacity(limit),
        }
    }
}

impl ChunkBuffer for LimitedBuffer {
    fn push(&mut self, line: String) {
        self.current_size += line_size(&line);
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn mem_size(&self) -> u64 {
        self.current_size
    }

    fn is_full(&self) -> bool {
        self.inner.len() >= self.limit
    }

    fn sort(&mut self) {
        self.inner.sort_unstable();
    }
}

impl IntoIterator for LimitedBuffer {
    type Item = String;
    type IntoIter = <Vec<String> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

pub struct MemoryLimitedBufferBuilder {
    buffer_limit: u64,
}

impl MemoryLimitedBufferBuilder {
    pub fn new(buffer_limit: u64) -> Self {
        MemoryLimitedBufferBuilder { buffer_limit }
    }

    pub fn limit(&self) -> u64 {
        self.buffer_limit
    }
}

impl ChunkBufferBuilder for MemoryLimitedBufferBuilder {
    type Buffer = MemoryLimitedBuffer;

    fn build(&self) -> Self::Buffer {
        MemoryLimitedBuffer::new(self.buffer_limit)
    }
}

impl Default for MemoryLimitedBufferBuilder {
    fn default() -> Self {
        MemoryLimitedBufferBuilder {
            buffer_limit: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Buffer limited by the bytes its lines take on disk.
pub struct MemoryLimitedBuffer {
    limit: u64,
    current_size: u64,
    inner: Vec<String>,
}

impl MemoryLimitedBuffer {
    pub fn new(limit: u64) -> Self {
        MemoryLimitedBuffer {
            limit,
            current_size: 0,
            inner: Vec::new(),
        }
    }
}

impl ChunkBuffer for MemoryLimitedBuffer {
    fn push(&mut self, line: String) {
        self.current_size += line_size(&line);
        self.inner.push(line);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn mem_size(&self) -> u64 {
        self.current_size
    }

    fn is_full(&self) -> bool {
        self.current_size >= self.limit
    }

    fn sort(&mut self) {
        self.inner.sort_unstable();
    }
}

impl IntoIterator for MemoryLimitedBuffer {
    type Item = String;
    type IntoIter = <Vec<String> as IntoIterator>::IntoIter;

    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}
