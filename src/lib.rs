//! `line-sort` is an external sort for line-oriented text files.
//!
//! External sorting is a class of sorting algorithms that can handle massive amounts of data. External sorting
//! is required when the data being sorted do not fit into the main memory (RAM) of a computer and instead must be
//! resided in slower external memory, usually a hard disk drive. Sorting is achieved in two passes. During the
//! first pass it sorts chunks of data that each fit in RAM, during the second pass it merges the sorted chunks
//! together. For more information see [External Sorting](https://en.wikipedia.org/wiki/External_sorting).
//!
//! # Overview
//!
//! * **Bounded memory:**
//!   the input is split into chunks whose size (line bytes plus one separator byte per line) is limited
//!   by a configured threshold.
//! * **Deterministic order:**
//!   lines are compared byte-wise, never with locale-sensitive collation, so every chunk and the final merge
//!   agree on a single order.
//! * **Bounded merge:**
//!   chunks are merged with a fixed capacity min-heap holding at most one line per chunk; output is buffered
//!   and flushed once a threshold is reached.
//! * **Optional deduplication:**
//!   runs of equal lines can be collapsed into a single line.
//! * **Guaranteed cleanup:**
//!   chunk files live in a temporary work directory which is removed whether sorting succeeds or fails.
//!
//! Blank and whitespace-only lines are dropped.
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use bytesize::MIB;
//! use env_logger;
//! use log;
//!
//! use line_sort::LineSorterBuilder;
//!
//! fn main() {
//!     env_logger::Builder::new().filter_level(log::LevelFilter::Debug).init();
//!
//!     let sorter = LineSorterBuilder::new()
//!         .with_tmp_dir(Path::new("./"))
//!         .with_chunk_size(50 * MIB)
//!         .with_dedup(true)
//!         .build();
//!
//!     let stats = sorter.sort_file(Path::new("input.txt"), Path::new("output.txt")).unwrap();
//!     println!("{} lines written", stats.lines_written);
//! }
//! ```

pub mod buffer;
pub mod chunk;
pub mod heap;
pub mod merger;
pub mod sink;
pub mod sort;
pub mod split;

pub use buffer::{ChunkBuffer, ChunkBufferBuilder, LimitedBufferBuilder, MemoryLimitedBufferBuilder};
pub use chunk::{Chunk, ChunkError, ChunkReader};
pub use heap::{BoundedMinHeap, HeapEntry, HeapError};
pub use merger::{HeapMerger, MergeError};
pub use sink::LineSink;
pub use sort::{LineSorter, LineSorterBuilder, SortError, SortStats};
pub use split::{SplitOutput, Splitter};
