//! Sorted chunk files and their readers.

use std::error::Error;
use std::fmt;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

/// Chunk file error.
#[derive(Debug)]
pub enum ChunkError {
    /// Chunk file creation or write error.
    Write { path: PathBuf, source: io::Error },
    /// Chunk file opening or read error.
    Read { path: PathBuf, source: io::Error },
}

impl ChunkError {
    /// Returns the path of the chunk file the error occurred on.
    pub fn path(&self) -> &Path {
        match self {
            ChunkError::Write { path, .. } => path,
            ChunkError::Read { path, .. } => path,
        }
    }
}

impl Error for ChunkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ChunkError::Write { source, .. } => Some(source),
            ChunkError::Read { source, .. } => Some(source),
        }
    }
}

impl fmt::Display for ChunkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChunkError::Write { path, source } => write!(f, "chunk {} write error: {}", path.display(), source),
            ChunkError::Read { path, source } => write!(f, "chunk {} read error: {}", path.display(), source),
        }
    }
}

/// A sorted run of lines persisted to a file. Never modified once written.
#[derive(Debug, Clone)]
pub struct Chunk {
    path: PathBuf,
    lines: usize,
    size: u64,
}

impl Chunk {
    /// Writes lines to a new chunk file, each one terminated by `\n`.
    /// Lines are expected to be already sorted.
    ///
    /// # Arguments
    /// * `path` - Chunk file path
    /// * `lines` - Lines to be saved
    /// * `buf_size` - Write buffer size. If the parameter is [`None`] the default buffer size is used.
    pub fn write(
        path: &Path,
        lines: impl IntoIterator<Item = String>,
        buf_size: Option<usize>,
    ) -> Result<Chunk, ChunkError> {
        let write_err = |source| ChunkError::Write {
            path: path.to_path_buf(),
            source,
        };

        let file = fs::File::create(path).map_err(write_err)?;
        let mut chunk_writer = match buf_size {
            Some(buf_size) => io::BufWriter::with_capacity(buf_size, file),
            None => io::BufWriter::new(file),
        };

        let mut count = 0;
        let mut size = 0;
        for line in lines.into_iter() {
            chunk_writer.write_all(line.as_bytes()).map_err(write_err)?;
            chunk_writer.write_all(b"\n").map_err(write_err)?;
            count += 1;
            size += line.len() as u64 + 1;
        }

        chunk_writer.flush().map_err(write_err)?;

        return Ok(Chunk {
            path: path.to_path_buf(),
            lines: count,
            size,
        });
    }

    /// Opens a reader over the chunk lines.
    pub fn open(&self, buf_size: Option<usize>) -> Result<ChunkReader, ChunkError> {
        ChunkReader::open(&self.path, buf_size)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of lines stored in the chunk.
    pub fn lines(&self) -> usize {
        self.lines
    }

    /// Chunk file size in bytes.
    pub fn size(&self) -> u64 {
        self.size
    }
}

/// Pull-based cursor over a chunk file.
///
/// Records are split on `\n` only, every other byte (`\r` included) belongs to the line. At most one line
/// is buffered ahead of the caller. Once the file is exhausted, an I/O error occurs or
/// [`ChunkReader::close`] is called the underlying file is released and the reader yields nothing more.
pub struct ChunkReader {
    path: PathBuf,
    reader: Option<io::BufReader<fs::File>>,
    head: Option<String>,
}

impl ChunkReader {
    /// Opens a chunk file for reading.
    pub fn open(path: &Path, buf_size: Option<usize>) -> Result<Self, ChunkError> {
        let file = fs::File::open(path).map_err(|source| ChunkError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let reader = match buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, file),
            None => io::BufReader::new(file),
        };

        return Ok(ChunkReader {
            path: path.to_path_buf(),
            reader: Some(reader),
            head: None,
        });
    }

    /// Returns the next line without consuming it, or [`None`] if the chunk is exhausted.
    pub fn peek(&mut self) -> Result<Option<&str>, ChunkError> {
        if self.head.is_none() {
            self.head = self.pull()?;
        }

        return Ok(self.head.as_deref());
    }

    /// Consumes and returns the next line, or [`None`] if the chunk is exhausted.
    pub fn advance(&mut self) -> Result<Option<String>, ChunkError> {
        match self.head.take() {
            Some(line) => Ok(Some(line)),
            None => self.pull(),
        }
    }

    /// Releases the underlying file. Safe to call in any state.
    pub fn close(&mut self) {
        self.head = None;
        self.reader = None;
    }

    pub fn is_closed(&self) -> bool {
        self.reader.is_none() && self.head.is_none()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn pull(&mut self) -> Result<Option<String>, ChunkError> {
        let reader = match self.reader.as_mut() {
            Some(reader) => reader,
            None => return Ok(None),
        };

        let mut line = String::new();
        match reader.read_line(&mut line) {
            Ok(0) => {
                self.close();
                Ok(None)
            }
            Ok(_) => {
                if line.ends_with('\n') {
                    line.pop();
                }
                Ok(Some(line))
            }
            Err(err) => {
                self.close();
                Err(ChunkError::Read {
                    path: self.path.clone(),
                    source: err,
                })
            }
        }
    }
}

impl Iterator for ChunkReader {
    type Item = Result<String, ChunkError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.advance().transpose()
    }
}

#[cfg(test)]
mod test {
    use std::fs;

    use rstest::*;

    use super::{Chunk, ChunkError, ChunkReader};

    #[fixture]
    fn tmp_dir() -> tempfile::TempDir {
        tempfile::tempdir_in("./").unwrap()
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    #[rstest]
    fn test_chunk_roundtrip(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("chunk_0.txt");
        let saved = lines(&["apple", "apple", "banana", "cherry"]);

        let chunk = Chunk::write(&path, saved.clone(), None).unwrap();
        assert_eq!(chunk.lines(), 4);
        assert_eq!(chunk.size(), 26);
        assert_eq!(fs::read_to_string(&path).unwrap(), "apple\napple\nbanana\ncherry\n");

        let restored: Result<Vec<String>, ChunkError> = chunk.open(Some(16)).unwrap().collect();
        assert_eq!(restored.unwrap(), saved);
    }

    #[rstest]
    fn test_reader_peek_and_advance(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("chunk_0.txt");
        fs::write(&path, "a\nb\n").unwrap();

        let mut reader = ChunkReader::open(&path, None).unwrap();
        assert_eq!(reader.peek().unwrap(), Some("a"));
        assert_eq!(reader.peek().unwrap(), Some("a"));
        assert_eq!(reader.advance().unwrap(), Some("a".to_string()));
        assert_eq!(reader.advance().unwrap(), Some("b".to_string()));
        assert!(!reader.is_closed());
        assert_eq!(reader.advance().unwrap(), None);
        assert!(reader.is_closed());
        assert_eq!(reader.peek().unwrap(), None);
    }

    #[rstest]
    fn test_carriage_return_preserved(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("chunk_0.txt");
        let saved = lines(&["a\r", "a\r\r", "b", "\r"]);

        let chunk = Chunk::write(&path, saved.clone(), None).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"a\r\na\r\r\nb\n\r\n");

        let restored: Result<Vec<String>, ChunkError> = chunk.open(None).unwrap().collect();
        assert_eq!(restored.unwrap(), saved);
    }

    #[rstest]
    fn test_reader_close(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("chunk_0.txt");
        let chunk = Chunk::write(&path, lines(&["x", "y"]), None).unwrap();

        let mut reader = chunk.open(None).unwrap();
        assert_eq!(reader.peek().unwrap(), Some("x"));
        reader.close();
        assert!(reader.is_closed());
        assert_eq!(reader.advance().unwrap(), None);
        assert!(reader.next().is_none());
    }

    #[rstest]
    fn test_reader_invalid_data(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("chunk_0.txt");
        fs::write(&path, b"ok\n\xff\xfe\nnever\n").unwrap();

        let mut reader = ChunkReader::open(&path, None).unwrap();
        assert_eq!(reader.advance().unwrap(), Some("ok".to_string()));

        match reader.advance() {
            Err(ChunkError::Read { path: err_path, .. }) => assert_eq!(err_path, path),
            other => panic!("unexpected result: {:?}", other),
        }
        assert!(reader.is_closed());
        assert!(reader.next().is_none());
    }

    #[rstest]
    fn test_missing_chunk(tmp_dir: tempfile::TempDir) {
        let path = tmp_dir.path().join("missing.txt");
        let err = ChunkReader::open(&path, None).err().unwrap();
        assert_eq!(err.path(), path.as_path());
    }
}
