//! External line sorter.

use std::error::Error;
use std::fmt;
use std::fmt::Display;
use std::fs;
use std::io;
use std::io::prelude::*;
use std::path::{Path, PathBuf};

use bytesize::ByteSize;

use crate::chunk::{Chunk, ChunkError, ChunkReader};
use crate::heap::HeapError;
use crate::merger::{HeapMerger, MergeError};
use crate::sink::{LineSink, DEFAULT_FLUSH_THRESHOLD};
use crate::split::Splitter;
use crate::MemoryLimitedBufferBuilder;

/// Sorting error.
#[derive(Debug)]
pub enum SortError {
    /// Input file does not exist.
    InputMissing(PathBuf),
    /// Temporary directory or file creation error.
    TempDir(io::Error),
    /// Input data stream error.
    Input(io::Error),
    /// Chunk file write or read error.
    Chunk(ChunkError),
    /// Merge heap invariant violation.
    Heap(HeapError),
    /// Output stream error.
    Output(io::Error),
    /// Temporary directory removal error.
    Cleanup(io::Error),
}

impl Error for SortError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self {
            SortError::InputMissing(_) => None,
            SortError::TempDir(err) => Some(err),
            SortError::Input(err) => Some(err),
            SortError::Chunk(err) => Some(err),
            SortError::Heap(err) => Some(err),
            SortError::Output(err) => Some(err),
            SortError::Cleanup(err) => Some(err),
        }
    }
}

impl Display for SortError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self {
            SortError::InputMissing(path) => write!(f, "input file {} does not exist", path.display()),
            SortError::TempDir(err) => write!(f, "temporary directory or file not created: {}", err),
            SortError::Input(err) => write!(f, "input data stream error: {}", err),
            SortError::Chunk(err) => write!(f, "{}", err),
            SortError::Heap(err) => write!(f, "merge invariant violated: {}", err),
            SortError::Output(err) => write!(f, "output writing error: {}", err),
            SortError::Cleanup(err) => write!(f, "temporary directory not removed: {}", err),
        }
    }
}

impl From<MergeError<ChunkError>> for SortError {
    fn from(err: MergeError<ChunkError>) -> Self {
        match err {
            MergeError::Input(err) => SortError::Chunk(err),
            MergeError::Heap(err) => SortError::Heap(err),
        }
    }
}

/// Sorting statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortStats {
    /// Number of lines read from the input.
    pub lines_read: u64,
    /// Number of chunks the input was split into.
    pub chunks: usize,
    /// Number of lines written to the output.
    pub lines_written: u64,
}

/// Line sorter builder. Provides methods for [`LineSorter`] initialization.
#[derive(Clone, Debug)]
pub struct LineSorterBuilder {
    /// Directory the temporary work directory is created in.
    tmp_dir: Option<Box<Path>>,
    /// Chunk size limit in bytes.
    chunk_size: u64,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Output buffer flush threshold in bytes.
    flush_threshold: usize,
    /// Consecutive duplicate removal.
    dedup: bool,
}

impl LineSorterBuilder {
    /// Creates an instance of a builder with default parameters.
    pub fn new() -> Self {
        LineSorterBuilder::default()
    }

    /// Builds a [`LineSorter`] instance using provided configuration.
    pub fn build(self) -> LineSorter {
        LineSorter {
            tmp_dir: self.tmp_dir,
            buffer_builder: MemoryLimitedBufferBuilder::new(self.chunk_size.max(1)),
            rw_buf_size: self.rw_buf_size,
            flush_threshold: self.flush_threshold.max(1),
            dedup: self.dedup,
        }
    }

    /// Sets directory to be used to store temporary data.
    pub fn with_tmp_dir(mut self, path: &Path) -> LineSorterBuilder {
        self.tmp_dir = Some(path.into());
        return self;
    }

    /// Sets chunk size limit in bytes. Each line takes its length plus one separator byte.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> LineSorterBuilder {
        self.chunk_size = chunk_size;
        return self;
    }

    /// Sets chunk read/write buffer size.
    pub fn with_rw_buf_size(mut self, buf_size: usize) -> LineSorterBuilder {
        self.rw_buf_size = Some(buf_size);
        return self;
    }

    /// Sets the number of buffered output bytes that triggers a write to the output.
    pub fn with_flush_threshold(mut self, threshold: usize) -> LineSorterBuilder {
        self.flush_threshold = threshold;
        return self;
    }

    /// Enables or disables removal of consecutive duplicate lines.
    pub fn with_dedup(mut self, dedup: bool) -> LineSorterBuilder {
        self.dedup = dedup;
        return self;
    }
}

impl Default for LineSorterBuilder {
    fn default() -> Self {
        LineSorterBuilder {
            tmp_dir: None,
            chunk_size: crate::buffer::DEFAULT_CHUNK_SIZE,
            rw_buf_size: None,
            flush_threshold: DEFAULT_FLUSH_THRESHOLD,
            dedup: false,
        }
    }
}

/// External line sorter.
///
/// Sorting runs in two phases: the input is split into sorted chunk files, then the chunks are merged
/// into the output. The merge starts only after every chunk has been written. Chunk files live in a
/// temporary work directory which is removed on every exit path.
pub struct LineSorter {
    /// Directory the temporary work directory is created in.
    tmp_dir: Option<Box<Path>>,
    /// Chunk buffer builder.
    buffer_builder: MemoryLimitedBufferBuilder,
    /// Chunk file read/write buffer size.
    rw_buf_size: Option<usize>,
    /// Output buffer flush threshold in bytes.
    flush_threshold: usize,
    /// Consecutive duplicate removal.
    dedup: bool,
}

impl LineSorter {
    /// Sorts the lines of the `input` file into the `output` file.
    ///
    /// The output is written to a temporary file next to `output` which replaces `output` only when
    /// sorting succeeds. On failure the destination is left as it was. An existing destination keeps
    /// its permissions, a new one gets the same mode as any file created by the process.
    pub fn sort_file(&self, input: &Path, output: &Path) -> Result<SortStats, SortError> {
        if !input.is_file() {
            return Err(SortError::InputMissing(input.to_path_buf()));
        }

        log::info!("sorting {} into {}", input.display(), output.display());

        let input_file = fs::File::open(input).map_err(SortError::Input)?;
        let input_stream = match self.rw_buf_size {
            Some(buf_size) => io::BufReader::with_capacity(buf_size, input_file),
            None => io::BufReader::new(input_file),
        };

        let mut output_file = create_output_file(output)?;

        let stats = self.sort_to_writer(input_stream, output_file.as_file_mut())?;

        if let Ok(metadata) = fs::metadata(output) {
            output_file
                .as_file()
                .set_permissions(metadata.permissions())
                .map_err(SortError::Output)?;
        }
        output_file.as_file().sync_all().map_err(SortError::Output)?;
        output_file
            .persist(output)
            .map_err(|err| SortError::Output(err.error))?;

        log::info!("sorting done, {} created", output.display());

        return Ok(stats);
    }

    /// Sorts lines read from `input` and writes them to `output`, one line per `\n` terminated record.
    pub fn sort_to_writer<R, W>(&self, input: R, output: W) -> Result<SortStats, SortError>
    where
        R: BufRead,
        W: Write,
    {
        let work_dir = self.init_work_dir()?;

        let result = self.run(work_dir.path(), input, output);

        log::info!("removing temporary files ...");
        let work_dir_path = work_dir.path().to_path_buf();
        match (result, work_dir.close()) {
            (Ok(stats), Ok(())) => Ok(stats),
            (Ok(_), Err(err)) => Err(SortError::Cleanup(err)),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup_err)) => {
                log::warn!(
                    "temporary directory {} not removed: {}",
                    work_dir_path.display(),
                    cleanup_err
                );
                Err(err)
            }
        }
    }

    fn init_work_dir(&self) -> Result<tempfile::TempDir, SortError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("line-sort-");

        let work_dir = if let Some(tmp_path) = &self.tmp_dir {
            builder.tempdir_in(tmp_path)
        } else {
            builder.tempdir()
        }
        .map_err(SortError::TempDir)?;

        log::info!("using {} as a temporary directory", work_dir.path().display());

        return Ok(work_dir);
    }

    fn run<R, W>(&self, work_dir: &Path, input: R, output: W) -> Result<SortStats, SortError>
    where
        R: BufRead,
        W: Write,
    {
        log::info!("chunk size limit: {}", ByteSize(self.buffer_builder.limit()));
        let split = Splitter::new(work_dir, &self.buffer_builder, self.rw_buf_size).split(input.lines())?;

        log::info!("merging {} chunks ...", split.chunks.len());
        let lines_written = self.merge(&split.chunks, output)?;
        log::info!("lines written: {}", lines_written);

        return Ok(SortStats {
            lines_read: split.lines_read,
            chunks: split.chunks.len(),
            lines_written,
        });
    }

    fn merge<W: Write>(&self, chunks: &[Chunk], output: W) -> Result<u64, SortError> {
        let readers = chunks
            .iter()
            .map(|chunk| chunk.open(self.rw_buf_size))
            .collect::<Result<Vec<ChunkReader>, ChunkError>>()
            .map_err(SortError::Chunk)?;

        let mut sink = LineSink::with_threshold(output, self.flush_threshold);
        for line in HeapMerger::new(readers, self.dedup) {
            sink.push_line(&line?).map_err(SortError::Output)?;
        }
        log::debug!("flushing last {} of output", ByteSize(sink.buffered() as u64));
        sink.flush().map_err(SortError::Output)?;

        return Ok(sink.lines_written());
    }
}

/// Creates the temporary file the output is written to, in the destination directory so that it
/// can be renamed over the destination.
fn create_output_file(output: &Path) -> Result<tempfile::NamedTempFile, SortError> {
    let output_dir = match output.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut builder = tempfile::Builder::new();
    // narrowed by the umask like fs::File::create
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        builder.permissions(fs::Permissions::from_mode(0o666));
    }

    return builder.tempfile_in(output_dir).map_err(SortError::TempDir);
}
