//! Bounded heap k-way merger.

use std::error::Error;
use std::fmt;

use crate::heap::{BoundedMinHeap, HeapError};

/// Merge error.
#[derive(Debug)]
pub enum MergeError<E: Error> {
    /// One of the merged inputs failed.
    Input(E),
    /// Heap invariant violation.
    Heap(HeapError),
}

impl<E: Error + 'static> Error for MergeError<E> {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(match self {
            MergeError::Input(err) => err,
            MergeError::Heap(err) => err,
        })
    }
}

impl<E: Error> fmt::Display for MergeError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergeError::Input(err) => write!(f, "merge input error: {}", err),
            MergeError::Heap(err) => write!(f, "merge heap error: {}", err),
        }
    }
}

impl<E: Error> From<HeapError> for MergeError<E> {
    fn from(err: HeapError) -> Self {
        MergeError::Heap(err)
    }
}

/// Bounded heap merger implementation.
/// Merges multiple sorted inputs into a single sorted output.
/// Time complexity is *m* \* log(*n*) in worst case where *m* is the number of items,
/// *n* is the number of chunks (inputs).
///
/// The heap holds at most one entry per input. An input that runs out of items is dropped,
/// which releases whatever resources it holds.
pub struct HeapMerger<T, E, C>
where
    T: Ord,
    E: Error,
    C: IntoIterator<Item = Result<T, E>>,
{
    items: BoundedMinHeap<T>,
    chunks: Vec<Option<C::IntoIter>>,
    dedup: bool,
    initiated: bool,
    failed: bool,
}

impl<T, E, C> HeapMerger<T, E, C>
where
    T: Ord,
    E: Error,
    C: IntoIterator<Item = Result<T, E>>,
{
    /// Creates an instance of a heap merger using chunks as inputs.
    /// Chunk items should be sorted in ascending order otherwise the result is undefined.
    ///
    /// # Arguments
    /// * `chunks` - Chunks to be merged in a single sorted one
    /// * `dedup` - Collapse runs of equal items into a single one
    pub fn new<I>(chunks: I, dedup: bool) -> Self
    where
        I: IntoIterator<Item = C>,
    {
        let chunks = Vec::from_iter(chunks.into_iter().map(|c| Some(c.into_iter())));
        let items = BoundedMinHeap::with_capacity(chunks.len());

        return HeapMerger {
            chunks,
            items,
            dedup,
            initiated: false,
            failed: false,
        };
    }

    /// Pulls the next item of the chunk `idx` into the heap. Exhausted chunks are released.
    fn refill(&mut self, idx: usize) -> Result<(), MergeError<E>> {
        let chunk = match self.chunks[idx].as_mut() {
            Some(chunk) => chunk,
            None => return Ok(()),
        };

        match chunk.next() {
            Some(Ok(item)) => self.items.insert(item, idx)?,
            Some(Err(err)) => {
                self.chunks[idx] = None;
                return Err(MergeError::Input(err));
            }
            None => self.chunks[idx] = None,
        }

        return Ok(());
    }

    fn next_item(&mut self) -> Result<Option<T>, MergeError<E>> {
        if !self.initiated {
            self.initiated = true;
            for idx in 0..self.chunks.len() {
                self.refill(idx)?;
            }
            log::debug!("merge heap initialized (entries: {})", self.items.len());
        }

        if self.items.is_empty() {
            return Ok(None);
        }

        let entry = self.items.extract_min()?;
        self.refill(entry.reader)?;

        if self.dedup {
            while self.items.peek().map_or(false, |next| next.key == entry.key) {
                let duplicate = self.items.extract_min()?;
                self.refill(duplicate.reader)?;
            }
        }

        return Ok(Some(entry.key));
    }
}

impl<T, E, C> Iterator for HeapMerger<T, E, C>
where
    T: Ord,
    E: Error,
    C: IntoIterator<Item = Result<T, E>>,
{
    type Item = Result<T, MergeError<E>>;

    /// Returns the next item from the inputs in ascending order.
    /// Nothing is returned after the first error.
    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        match self.next_item() {
            Ok(item) => item.map(Ok),
            Err(err) => {
                self.failed = true;
                self.chunks.clear();
                Some(Err(err))
            }
        }
    }
}
